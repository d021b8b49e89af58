//! Application state model.

use std::sync::Arc;

use ratatui::widgets::TableState;
use tokio::sync::mpsc;

use crate::{Fetcher, Notice, Overlay, TableController};

use super::event::DataEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Notice,
    Confirm,
    AddForm,
    EditForm,
}

pub struct App {
    pub table: TableController,
    pub table_state: TableState,
    pub should_quit: bool,
    /// Modal message; every other input is ignored until it is dismissed.
    pub notice: Option<Notice>,
    // Status line
    pub status: String,
    /// Column most recently sorted, for the header arrow.
    pub sorted_column: Option<usize>,
    // Channels
    pub event_tx: mpsc::UnboundedSender<DataEvent>,
    pub fetcher: Arc<dyn Fetcher>,
}

impl App {
    pub fn new(
        table: TableController,
        fetcher: Arc<dyn Fetcher>,
        event_tx: mpsc::UnboundedSender<DataEvent>,
    ) -> Self {
        Self {
            table,
            table_state: TableState::default(),
            should_quit: false,
            notice: None,
            status: String::new(),
            sorted_column: None,
            event_tx,
            fetcher,
        }
    }

    /// The popup currently on top, if any.
    pub const fn popup(&self) -> Popup {
        if self.notice.is_some() {
            return Popup::Notice;
        }
        if self.table.pending_confirmation().is_some() {
            return Popup::Confirm;
        }
        match self.table.overlay() {
            Overlay::None => Popup::None,
            Overlay::Add(_) => Popup::AddForm,
            Overlay::Edit(_) => Popup::EditForm,
        }
    }

    /// Row under the cursor.
    pub fn cursor(&self) -> Option<usize> {
        self.table_state
            .selected()
            .filter(|&i| i < self.table.rows().len())
    }

    /// Keeps the cursor on a valid row after the row count changed.
    pub fn clamp_cursor(&mut self) {
        let len = self.table.rows().len();
        if len == 0 {
            self.table_state.select(None);
        } else {
            let i = self.table_state.selected().unwrap_or(0);
            self.table_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn show(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }
}
