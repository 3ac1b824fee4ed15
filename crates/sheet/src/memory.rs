//! In-process workbook backend.

use crate::a1_notation::{parse_range, CellRange};
use crate::backend::{SheetBackend, Values};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A workbook held in memory: sheet name to a ragged grid of cells.
///
/// Behaves like the remote value API closely enough to stand in for it:
/// reads trim trailing blanks, appends land after the last non-empty row,
/// and unknown sheets are an error rather than an empty result.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sheets: RwLock<HashMap<String, Values>>,
}

impl MemoryBackend {
    /// Create an empty workbook with no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet whose first row holds `header`.
    #[must_use]
    pub fn with_sheet(mut self, name: &str, header: &[&str]) -> Self {
        let grid = vec![header.iter().map(|h| (*h).to_string()).collect()];
        self.sheets.get_mut().insert(name.to_string(), grid);
        self
    }

    /// Replace a sheet's full contents, header included.
    pub async fn put_sheet(&self, name: &str, grid: Values) {
        self.sheets.write().await.insert(name.to_string(), grid);
    }

    /// Copy of a sheet's raw grid, or `None` if the sheet does not exist.
    pub async fn snapshot(&self, name: &str) -> Option<Values> {
        self.sheets.read().await.get(name).cloned()
    }
}

fn locate<'a>(sheets: &'a HashMap<String, Values>, range: &CellRange) -> Result<&'a Values> {
    sheets.get(&range.sheet).ok_or_else(|| StoreError::MissingSheet {
        name: range.sheet.clone(),
    })
}

fn locate_mut<'a>(
    sheets: &'a mut HashMap<String, Values>,
    range: &CellRange,
) -> Result<&'a mut Values> {
    sheets
        .get_mut(&range.sheet)
        .ok_or_else(|| StoreError::MissingSheet {
            name: range.sheet.clone(),
        })
}

fn last_row(grid: &Values, range: &CellRange) -> usize {
    range
        .end_row
        .unwrap_or_else(|| grid.len().saturating_sub(1))
}

fn row_is_blank(row: &[String], range: &CellRange) -> bool {
    row.iter()
        .skip(range.start_col)
        .take(range.width())
        .all(|cell| cell.is_empty())
}

fn write_cell(grid: &mut Values, row: usize, col: usize, value: String) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize(col + 1, String::new());
    }
    cells[col] = value;
}

fn write_block(grid: &mut Values, top: usize, left: usize, rows: Values) {
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            write_cell(grid, top + r, left + c, value);
        }
    }
}

#[async_trait]
impl SheetBackend for MemoryBackend {
    async fn get_values(&self, range: &str) -> Result<Values> {
        let range = parse_range(range)?;
        let sheets = self.sheets.read().await;
        let grid = locate(&sheets, &range)?;

        let mut out: Values = Vec::new();
        if !grid.is_empty() {
            let end = last_row(grid, &range).min(grid.len() - 1);
            for row in grid.iter().take(end + 1).skip(range.first_row()) {
                let mut cells: Vec<String> = row
                    .iter()
                    .skip(range.start_col)
                    .take(range.width())
                    .cloned()
                    .collect();
                while cells.last().is_some_and(String::is_empty) {
                    cells.pop();
                }
                out.push(cells);
            }
        }
        while out.last().is_some_and(Vec::is_empty) {
            out.pop();
        }
        Ok(out)
    }

    async fn append_rows(&self, range: &str, rows: Values) -> Result<()> {
        let range = parse_range(range)?;
        let mut sheets = self.sheets.write().await;
        let grid = locate_mut(&mut sheets, &range)?;

        let start = range.first_row();
        let end = last_row(grid, &range).min(grid.len().saturating_sub(1));
        let target = (start..=end)
            .rev()
            .find(|&r| grid.get(r).is_some_and(|row| !row_is_blank(row, &range)))
            .map_or(start, |r| r + 1);

        write_block(grid, target, range.start_col, rows);
        Ok(())
    }

    async fn update_values(&self, range: &str, rows: Values) -> Result<()> {
        let parsed = parse_range(range)?;
        let height = parsed
            .end_row
            .map(|end| end + 1 - parsed.first_row());
        let too_tall = height.is_some_and(|h| rows.len() > h);
        let too_wide = rows.iter().any(|row| row.len() > parsed.width());
        if too_tall || too_wide {
            return Err(StoreError::InvalidRange(format!(
                "{range} cannot hold {} rows of up to {} cells",
                rows.len(),
                rows.iter().map(Vec::len).max().unwrap_or(0)
            )));
        }

        let mut sheets = self.sheets.write().await;
        let grid = locate_mut(&mut sheets, &parsed)?;
        write_block(grid, parsed.first_row(), parsed.start_col, rows);
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        let range = parse_range(range)?;
        let mut sheets = self.sheets.write().await;
        let grid = locate_mut(&mut sheets, &range)?;

        if grid.is_empty() {
            return Ok(());
        }
        let end = last_row(grid, &range).min(grid.len() - 1);
        for row in grid.iter_mut().take(end + 1).skip(range.first_row()) {
            for cell in row.iter_mut().skip(range.start_col).take(range.width()) {
                cell.clear();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(rows: &[&[&str]]) -> Values {
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_get_values_trims_trailing_blanks() {
        let backend = MemoryBackend::new();
        backend
            .put_sheet(
                "Birds",
                strings(&[&["BirdID", "RingNo", ""], &["B0001", "", ""], &["", ""]]),
            )
            .await;

        let values = backend.get_values("Birds!A1:H1000").await.unwrap();
        assert_eq!(values, strings(&[&["BirdID", "RingNo"], &["B0001"]]));
    }

    #[tokio::test]
    async fn test_get_values_column_slice() {
        let backend = MemoryBackend::new();
        backend
            .put_sheet("Pairs", strings(&[&["PairID", "MaleID"], &["P0001", "B0001"]]))
            .await;

        let ids = backend.get_values("Pairs!A:A").await.unwrap();
        assert_eq!(ids, strings(&[&["PairID"], &["P0001"]]));

        let males = backend.get_values("Pairs!B2:B2").await.unwrap();
        assert_eq!(males, strings(&[&["B0001"]]));
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_error() {
        let backend = MemoryBackend::new();
        let err = backend.get_values("Nope!A:A").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingSheet { .. }));
    }

    #[tokio::test]
    async fn test_append_after_last_row() {
        let backend = MemoryBackend::new().with_sheet("Birds", &["BirdID", "RingNo"]);
        backend
            .append_rows("Birds!A:B", strings(&[&["B0001", "R1"]]))
            .await
            .unwrap();
        backend
            .append_rows("Birds!A:B", strings(&[&["B0002", "R2"]]))
            .await
            .unwrap();

        let grid = backend.snapshot("Birds").await.unwrap();
        assert_eq!(
            grid,
            strings(&[&["BirdID", "RingNo"], &["B0001", "R1"], &["B0002", "R2"]])
        );
    }

    #[tokio::test]
    async fn test_append_fills_cleared_tail() {
        let backend = MemoryBackend::new();
        backend
            .put_sheet("Birds", strings(&[&["BirdID"], &["B0001"], &["B0002"]]))
            .await;
        backend.clear_values("Birds!A3:A3").await.unwrap();
        backend
            .append_rows("Birds!A:A", strings(&[&["B0003"]]))
            .await
            .unwrap();

        let values = backend.get_values("Birds!A:A").await.unwrap();
        assert_eq!(values, strings(&[&["BirdID"], &["B0001"], &["B0003"]]));
    }

    #[tokio::test]
    async fn test_update_writes_only_target_row() {
        let backend = MemoryBackend::new();
        backend
            .put_sheet(
                "Birds",
                strings(&[&["BirdID", "RingNo"], &["B0001", "R1"], &["B0002", "R2"]]),
            )
            .await;
        backend
            .update_values("Birds!A3:B3", strings(&[&["B0002", "R9"]]))
            .await
            .unwrap();

        let grid = backend.snapshot("Birds").await.unwrap();
        assert_eq!(grid[1], vec!["B0001", "R1"]);
        assert_eq!(grid[2], vec!["B0002", "R9"]);
    }

    #[tokio::test]
    async fn test_update_rejects_oversized_block() {
        let backend = MemoryBackend::new().with_sheet("Birds", &["BirdID"]);
        let err = backend
            .update_values("Birds!A2:A2", strings(&[&["B0001", "extra"]]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange(_)));
    }
}
