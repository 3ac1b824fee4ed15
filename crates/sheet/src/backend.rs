//! The value-range API a table store is built on.

use crate::error::Result;
use async_trait::async_trait;

/// Cell values as they travel to and from a backend: rows of strings.
pub type Values = Vec<Vec<String>>;

/// A spreadsheet value API addressed by sheet-qualified A1 ranges.
///
/// Each call is an independent remote operation. Implementations give no
/// atomicity across calls; callers that need it must serialize themselves.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Read a range. Trailing empty cells of each row and trailing empty rows
    /// are omitted, so rows may be shorter than the range is wide.
    async fn get_values(&self, range: &str) -> Result<Values>;

    /// Append rows after the last non-empty row of the table found in the
    /// range's columns.
    async fn append_rows(&self, range: &str, rows: Values) -> Result<()>;

    /// Overwrite cells starting at the top-left corner of `range`.
    async fn update_values(&self, range: &str, rows: Values) -> Result<()>;

    /// Blank every cell in `range`.
    async fn clear_values(&self, range: &str) -> Result<()>;
}
