//! chem-table - An in-memory editor for chemical-supply records.
//!
//! Records are fetched once from a JSON endpoint, optionally through an
//! offline asset cache, and then sorted, added, edited, deleted and
//! reordered entirely in memory. Nothing is ever written back.
//!
//! # Example
//!
//! ```no_run
//! use chem_table::{AppConfig, AssetCache, CacheEvent, HttpFetcher, TableController};
//!
//! # async fn example() -> chem_table::Result<()> {
//! let config = AppConfig::default();
//! let cache = AssetCache::new(&config.cache, HttpFetcher::new(&config.source)?);
//! cache.handle(CacheEvent::Install).await?;
//! cache.handle(CacheEvent::Activate).await?;
//!
//! let mut table = TableController::new(&config.source.url);
//! if let Some(notice) = table.initialize(&cache).await {
//!     eprintln!("{}", notice.message);
//! }
//! println!("{} rows", table.rows().len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod format;
pub mod record;
pub mod source;
pub mod store;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cache::{AssetCache, CacheEvent, CacheOutcome, CacheStorage};
pub use config::{AppConfig, CacheConfig, SourceConfig};
pub use controller::{LoadState, Notice, NoticeLevel, Overlay, SortDirection, TableController};
pub use error::{Error, Result};
pub use form::RecordForm;
pub use format::{format_bytes, format_elapsed, format_table};
pub use record::{ChemicalRecord, Column, Field};
pub use source::{Fetcher, HttpFetcher, Response, fetch_records};
pub use store::{MoveDirection, RecordStore};
