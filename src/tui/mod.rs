//! Interactive terminal table for browsing and editing chemical records.

mod app;
mod draw;
mod event;
mod input;
mod refresh;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::Event;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::{Fetcher, TableController};

use self::app::App;
use self::draw::draw;
use self::event::DataEvent;
use self::input::{handle_input, handle_paste};
use self::refresh::{handle_data_event, start_refresh};

/// RAII guard that ensures terminal cleanup on drop.
/// Restores terminal to normal mode even if a panic occurs.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            crossterm::event::EnableBracketedPaste
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::event::DisableBracketedPaste,
            LeaveAlternateScreen
        );
    }
}

/// Run the interactive table.
///
/// The initial load is started in the background, so the table appears
/// immediately and fills in once the records arrive.
///
/// # Errors
/// Returns an error if terminal setup fails or TUI operations encounter I/O errors.
#[allow(clippy::unused_async)]
pub async fn run(table: TableController, fetcher: Arc<dyn Fetcher>) -> io::Result<()> {
    let _terminal_guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (data_tx, mut data_rx) = mpsc::unbounded_channel::<DataEvent>();
    let mut app = App::new(table, fetcher, data_tx);
    start_refresh(&mut app);

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Poll for events with 100ms timeout
        if crossterm::event::poll(Duration::from_millis(100))? {
            match crossterm::event::read()? {
                Event::Key(key) => handle_input(&mut app, key),
                Event::Paste(text) => handle_paste(&mut app, &text),
                _ => {}
            }
        }

        // Drain fetch results (non-blocking)
        while let Ok(event) = data_rx.try_recv() {
            handle_data_event(&mut app, event);
        }

        if app.should_quit {
            log::debug!("Leaving table with {} chemicals", app.table.store().len());
            break;
        }
    }

    // Show cursor before exit (terminal cleanup handled by RAII guard)
    terminal.show_cursor()?;

    Ok(())
}
