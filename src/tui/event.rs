//! Event types for TUI mode.

use crate::{ChemicalRecord, Result};

/// Events sent from background tasks to the UI loop.
#[derive(Debug)]
pub enum DataEvent {
    /// A record fetch started by a refresh has finished.
    Loaded(Result<Vec<ChemicalRecord>>),
}
