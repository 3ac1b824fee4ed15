//! Spreadsheet-backed table storage for birdbook
//!
//! A sheet range is treated as a table: the first row names the columns,
//! column A holds each record's id, and records are read, appended, updated
//! in place and deleted by rewriting the table without the removed rows.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use birdbook_sheet::{MemoryBackend, SheetStore, TableSpec, TableStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! const BIRDS: TableSpec = TableSpec::new("Birds", "B", "C");
//!
//! let backend = MemoryBackend::new().with_sheet("Birds", &["BirdID", "RingNo", "Species"]);
//! let store = SheetStore::new(Arc::new(backend));
//!
//! let id = store
//!     .insert(&BIRDS, vec!["R-01".to_string(), "Canary".to_string()])
//!     .await
//!     .unwrap();
//! assert_eq!(id, "B0001");
//!
//! let rows = store.read_all(&BIRDS).await.unwrap();
//! assert_eq!(rows[0]["Species"], "Canary");
//! # }
//! ```
//!
//! # Backends
//!
//! - [`MemoryBackend`] keeps the workbook in process; used for local runs and tests.
//! - [`GoogleSheetsBackend`] talks to the Sheets v4 REST API as a service account.

mod a1_notation;
mod backend;
mod error;
mod google;
mod memory;
mod table;

/// Re-export A1 helpers.
pub use a1_notation::{column_letters_to_index, format_range, parse_range, CellRange};
/// Re-export the backend seam.
pub use backend::{SheetBackend, Values};
/// Re-export store error types.
pub use error::{Result, StoreError};
/// Re-export the Google Sheets backend and its credentials.
pub use google::{
    GoogleSheetsBackend, ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenSource,
    SHEETS_API_BASE, SPREADSHEETS_SCOPE,
};
/// Re-export the in-memory backend.
pub use memory::MemoryBackend;
/// Re-export table types.
pub use table::{
    rows_to_records, Row, SheetStore, TableSpec, TableStore, DEFAULT_MAX_ROWS, ID_DIGITS,
};
