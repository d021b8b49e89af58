//! Keyboard and paste input handling.
//!
//! Main table keys:
//!
//! | key | action |
//! |---|---|
//! | `Up`/`k`, `Down`/`j` | move the cursor |
//! | `Space` | toggle the row's checkbox |
//! | `Enter` | edit the row |
//! | `a` | add row |
//! | `K`, `J` (or `Shift`+arrows) | move up / move down |
//! | `d`, `Delete` | delete selected |
//! | `A` | select all / none |
//! | `1`..`8` | sort by column |
//! | `r` | refresh |
//! | `s` | save |
//! | `q`, `Esc` | quit |

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{MoveDirection, Overlay};

use super::app::{App, Popup};
use super::refresh::start_refresh;

pub fn handle_input(app: &mut App, key: KeyEvent) {
    // Global quit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.popup() {
        Popup::Notice => handle_notice_input(app, key),
        Popup::Confirm => handle_confirm_input(app, key),
        Popup::AddForm | Popup::EditForm => handle_form_input(app, key),
        Popup::None => handle_main_input(app, key),
    }
}

fn handle_notice_input(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
        app.notice = None;
    }
}

fn handle_confirm_input(app: &mut App, key: KeyEvent) {
    let answer = match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => true,
        KeyCode::Char('n' | 'N') | KeyCode::Esc => false,
        _ => return,
    };
    let removed = app.table.confirm(answer);
    if removed > 0 {
        app.status = format!("Deleted {removed} row(s)");
    }
    app.clamp_cursor();
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let adding = matches!(app.table.overlay(), Overlay::Add(_));
            match app.table.submit_overlay() {
                Ok(()) if adding => {
                    app.status = "Row added".to_string();
                    // Put the cursor on the new last row
                    let last = app.table.rows().len().checked_sub(1);
                    app.table_state.select(last);
                }
                Ok(()) => app.status = "Row updated".to_string(),
                Err(notice) => app.show(notice),
            }
        }
        KeyCode::Esc => app.table.close_overlay(),
        _ => {
            let (Overlay::Add(form) | Overlay::Edit(form)) = app.table.overlay_mut() else {
                return;
            };
            match key.code {
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Char(c) => form.active_value_mut().push(c),
                KeyCode::Backspace => {
                    form.active_value_mut().pop();
                }
                _ => {}
            }
        }
    }
}

fn handle_main_input(app: &mut App, key: KeyEvent) {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Up if shift => move_selected(app, MoveDirection::Up),
        KeyCode::Down if shift => move_selected(app, MoveDirection::Down),
        KeyCode::Char('K') => move_selected(app, MoveDirection::Up),
        KeyCode::Char('J') => move_selected(app, MoveDirection::Down),
        KeyCode::Up | KeyCode::Char('k') => {
            let len = app.table.rows().len();
            if len > 0 {
                let i = app.table_state.selected().unwrap_or(0);
                app.table_state
                    .select(Some(if i == 0 { len - 1 } else { i - 1 }));
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let len = app.table.rows().len();
            if len > 0 {
                let i = app.table_state.selected().unwrap_or(0);
                app.table_state.select(Some((i + 1) % len));
            }
        }
        KeyCode::Char(' ') => {
            if let Some(i) = app.cursor() {
                app.table.toggle_row(i);
            }
        }
        KeyCode::Enter => {
            if let Some(i) = app.cursor() {
                app.table.open_edit(i);
            }
        }
        KeyCode::Char('a') => app.table.add_row(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Err(notice) = app.table.delete_row() {
                app.show(notice);
            }
        }
        KeyCode::Char('A') => {
            let all = app.table.selected_indices().len() == app.table.rows().len();
            app.table.select_all(!all);
        }
        KeyCode::Char(c @ '1'..='8') => {
            let column = c.to_digit(10).map_or(0, |d| d as usize);
            if app.table.sort_table(column).is_some() {
                app.sorted_column = Some(column);
            }
        }
        KeyCode::Char('r') => start_refresh(app),
        KeyCode::Char('s') => {
            let notice = app.table.save();
            app.show(notice);
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        _ => {}
    }
}

fn move_selected(app: &mut App, direction: MoveDirection) {
    match app.table.move_row(direction) {
        Ok(Some(index)) => app.table_state.select(Some(index)),
        Ok(None) => {}
        Err(notice) => app.show(notice),
    }
}

pub fn handle_paste(app: &mut App, text: &str) {
    if let (Popup::AddForm | Popup::EditForm, Overlay::Add(form) | Overlay::Edit(form)) =
        (app.popup(), app.table.overlay_mut())
    {
        form.active_value_mut()
            .push_str(text.replace(['\n', '\r'], " ").trim());
    }
}
