//! A sheet range treated as a table of records.
//!
//! Row 1 is the header; its cell text names each column. Column A always
//! holds the record id. Rows whose id cell is blank are skipped on read.

use crate::a1_notation::format_range;
use crate::backend::{SheetBackend, Values};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One record, keyed by header text in header order.
pub type Row = IndexMap<String, String>;

/// Where a table lives and how its ids look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Sheet (tab) name.
    pub sheet: &'static str,
    /// Id prefix, e.g. `B` for `B0001`.
    pub id_prefix: &'static str,
    /// Last column of the table, e.g. `H` for `A:H`.
    pub last_column: &'static str,
    /// Rows covered by full-table reads, header included.
    pub max_rows: usize,
}

/// Rows read by full-table operations.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Width of the zero-padded numeric part of an id.
pub const ID_DIGITS: usize = 4;

impl TableSpec {
    pub const fn new(
        sheet: &'static str,
        id_prefix: &'static str,
        last_column: &'static str,
    ) -> Self {
        Self {
            sheet,
            id_prefix,
            last_column,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Header and data window, e.g. `Birds!A1:H1000`.
    pub fn window(&self) -> String {
        format_range(self.sheet, "A", Some(1), self.last_column, Some(self.max_rows))
    }

    /// The id column, e.g. `Birds!A:A`.
    pub fn id_column(&self) -> String {
        format_range(self.sheet, "A", None, "A", None)
    }

    /// Whole-column span used for appends, e.g. `Birds!A:H`.
    pub fn columns(&self) -> String {
        format_range(self.sheet, "A", None, self.last_column, None)
    }

    /// Format an id from its numeric part.
    pub fn format_id(&self, number: u64) -> String {
        format!("{}{:0width$}", self.id_prefix, number, width = ID_DIGITS)
    }

    /// Numeric part of `cell` if it carries this table's prefix.
    ///
    /// Leading digits after the prefix are used and anything after them is
    /// ignored, so `B12x` yields 12 and `Bx12` yields nothing.
    pub fn id_number(&self, cell: &str) -> Option<u64> {
        let rest = cell.trim().strip_prefix(self.id_prefix)?;
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..digits_end].parse().ok()
    }
}

fn first_cell(row: &[String]) -> &str {
    row.first().map_or("", |cell| cell.trim())
}

/// Turn a header + data block into records.
///
/// Rows with a blank id are skipped, missing cells become empty strings and
/// cells beyond the header are dropped.
pub fn rows_to_records(values: &Values) -> Vec<Row> {
    let Some((header, data)) = values.split_first() else {
        return Vec::new();
    };

    data.iter()
        .filter(|row| !first_cell(row).is_empty())
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Record storage keyed by an id in the first column.
///
/// The primitive operations are independent round-trips with no isolation
/// between them. `insert`, `replace` and `delete_and_compact` are the
/// composed operations request handlers should use; implementations may
/// serialize them.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every record with a non-blank id, in storage order.
    async fn read_all(&self, table: &TableSpec) -> Result<Vec<Row>>;

    /// The id after the largest numeric suffix currently stored.
    async fn next_id(&self, table: &TableSpec) -> Result<String>;

    /// Append one row of cells in header order, id first.
    async fn append(&self, table: &TableSpec, values: Vec<String>) -> Result<()>;

    /// 1-based storage row holding `id`, searching below the header.
    async fn find_row_position(&self, table: &TableSpec, id: &str) -> Result<Option<usize>>;

    /// Overwrite one storage row across the table's columns.
    async fn update(&self, table: &TableSpec, row: usize, values: Vec<String>) -> Result<()>;

    /// Remove every row whose id is `id` and shift the rest up.
    /// Returns `false`, having written nothing, when no row matched.
    async fn delete_and_compact(&self, table: &TableSpec, id: &str) -> Result<bool>;

    /// Allocate an id and append `cells` (every column after the id).
    async fn insert(&self, table: &TableSpec, cells: Vec<String>) -> Result<String> {
        allocate_and_append(self, table, cells).await
    }

    /// Overwrite the row holding `id`. Returns `false`, having written
    /// nothing, when `id` is absent.
    async fn replace(&self, table: &TableSpec, id: &str, cells: Vec<String>) -> Result<bool> {
        overwrite_by_id(self, table, id, cells).await
    }
}

async fn allocate_and_append<S>(store: &S, table: &TableSpec, cells: Vec<String>) -> Result<String>
where
    S: TableStore + ?Sized,
{
    let id = store.next_id(table).await?;
    let mut values = Vec::with_capacity(cells.len() + 1);
    values.push(id.clone());
    values.extend(cells);
    store.append(table, values).await?;
    Ok(id)
}

async fn overwrite_by_id<S>(
    store: &S,
    table: &TableSpec,
    id: &str,
    cells: Vec<String>,
) -> Result<bool>
where
    S: TableStore + ?Sized,
{
    let Some(row) = store.find_row_position(table, id).await? else {
        return Ok(false);
    };
    let mut values = Vec::with_capacity(cells.len() + 1);
    values.push(id.to_string());
    values.extend(cells);
    store.update(table, row, values).await?;
    Ok(true)
}

/// [`TableStore`] over a spreadsheet value API.
///
/// Composed operations on one table are serialized by a per-table lock, so
/// concurrent requests in this process cannot mint the same id or lose a
/// write across a compaction. Writers in other processes are not covered.
pub struct SheetStore {
    backend: Arc<dyn SheetBackend>,
    locks: Mutex<HashMap<&'static str, Arc<Mutex<()>>>>,
}

impl fmt::Debug for SheetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetStore").finish_non_exhaustive()
    }
}

impl SheetStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn table_lock(&self, table: &TableSpec) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(table.sheet)
            .or_default()
            .clone()
    }

    /// Overwrite columns `start_col..=end_col` of one storage row.
    pub async fn update_span(
        &self,
        table: &TableSpec,
        row: usize,
        start_col: &str,
        end_col: &str,
        values: Vec<String>,
    ) -> Result<()> {
        let range = format_range(table.sheet, start_col, Some(row), end_col, Some(row));
        self.backend.update_values(&range, vec![values]).await
    }

    async fn ids(&self, table: &TableSpec) -> Result<Values> {
        self.backend.get_values(&table.id_column()).await
    }
}

#[async_trait]
impl TableStore for SheetStore {
    async fn read_all(&self, table: &TableSpec) -> Result<Vec<Row>> {
        let values = self.backend.get_values(&table.window()).await?;
        Ok(rows_to_records(&values))
    }

    async fn next_id(&self, table: &TableSpec) -> Result<String> {
        let ids = self.ids(table).await?;
        let max = ids
            .iter()
            .skip(1)
            .filter_map(|row| row.first())
            .filter_map(|cell| table.id_number(cell))
            .max()
            .unwrap_or(0);
        let next = max
            .checked_add(1)
            .ok_or(StoreError::IdSpaceExhausted { sheet: table.sheet })?;
        Ok(table.format_id(next))
    }

    async fn append(&self, table: &TableSpec, values: Vec<String>) -> Result<()> {
        self.backend
            .append_rows(&table.columns(), vec![values])
            .await
    }

    async fn find_row_position(&self, table: &TableSpec, id: &str) -> Result<Option<usize>> {
        let id = id.trim();
        let ids = self.ids(table).await?;
        Ok(ids
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| first_cell(row) == id)
            .map(|(i, _)| i + 1))
    }

    async fn update(&self, table: &TableSpec, row: usize, values: Vec<String>) -> Result<()> {
        self.update_span(table, row, "A", table.last_column, values).await
    }

    async fn delete_and_compact(&self, table: &TableSpec, id: &str) -> Result<bool> {
        let lock = self.table_lock(table).await;
        let _guard = lock.lock().await;

        let id = id.trim();
        let window = table.window();
        let values = self.backend.get_values(&window).await?;
        let Some((header, data)) = values.split_first() else {
            return Ok(false);
        };

        let mut kept: Values = Vec::with_capacity(data.len() + 1);
        kept.push(header.clone());
        kept.extend(data.iter().filter(|row| first_cell(row) != id).cloned());

        if kept.len() == values.len() {
            return Ok(false);
        }

        // Two separate calls: anything written between them is lost.
        self.backend.clear_values(&window).await?;
        let rewrite = format_range(
            table.sheet,
            "A",
            Some(1),
            table.last_column,
            Some(kept.len()),
        );
        self.backend.update_values(&rewrite, kept).await?;

        tracing::debug!(sheet = table.sheet, id, "row deleted and table compacted");
        Ok(true)
    }

    async fn insert(&self, table: &TableSpec, cells: Vec<String>) -> Result<String> {
        let lock = self.table_lock(table).await;
        let _guard = lock.lock().await;
        allocate_and_append(self, table, cells).await
    }

    async fn replace(&self, table: &TableSpec, id: &str, cells: Vec<String>) -> Result<bool> {
        let lock = self.table_lock(table).await;
        let _guard = lock.lock().await;
        overwrite_by_id(self, table, id, cells).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIRDS: TableSpec = TableSpec::new("Birds", "B", "H");

    fn strings(rows: &[&[&str]]) -> Values {
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_ranges() {
        assert_eq!(BIRDS.window(), "Birds!A1:H1000");
        assert_eq!(BIRDS.id_column(), "Birds!A:A");
        assert_eq!(BIRDS.columns(), "Birds!A:H");
    }

    #[test]
    fn test_format_id() {
        assert_eq!(BIRDS.format_id(1), "B0001");
        assert_eq!(BIRDS.format_id(42), "B0042");
        assert_eq!(BIRDS.format_id(12345), "B12345");
    }

    #[test]
    fn test_id_number() {
        assert_eq!(BIRDS.id_number("B0007"), Some(7));
        assert_eq!(BIRDS.id_number(" B0010 "), Some(10));
        assert_eq!(BIRDS.id_number("B12x"), Some(12));
        assert_eq!(BIRDS.id_number("Bx12"), None);
        assert_eq!(BIRDS.id_number("P0003"), None);
        assert_eq!(BIRDS.id_number("B"), None);
    }

    #[test]
    fn test_rows_to_records() {
        let values = strings(&[
            &["BirdID", "RingNo", "Species"],
            &["B0001", "R1"],
            &["   ", "ghost"],
            &[],
            &["B0002", "R2", "Canary", "overflow"],
        ]);
        let records = rows_to_records(&values);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["BirdID"], "B0001");
        assert_eq!(records[0]["Species"], "");
        assert_eq!(records[1]["Species"], "Canary");
        assert_eq!(records[1].len(), 3);
        let keys: Vec<_> = records[0].keys().cloned().collect();
        assert_eq!(keys, vec!["BirdID", "RingNo", "Species"]);
    }

    #[test]
    fn test_sheet_store_debug_hides_backend() {
        let store = SheetStore::new(Arc::new(crate::MemoryBackend::new()));
        assert_eq!(format!("{store:?}"), "SheetStore { .. }");
    }

    #[test]
    fn test_rows_to_records_header_only() {
        assert!(rows_to_records(&strings(&[&["BirdID"]])).is_empty());
        assert!(rows_to_records(&Vec::new()).is_empty());
    }
}
