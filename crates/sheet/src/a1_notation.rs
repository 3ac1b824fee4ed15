use crate::error::{Result, StoreError};

/// A rectangular range on one sheet, 0-based and inclusive.
///
/// Rows are optional on either end so that whole-column ranges such as
/// `Birds!A:H` can be represented; an open end runs to the edge of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: String,
    pub start_col: usize,
    pub start_row: Option<usize>,
    pub end_col: usize,
    pub end_row: Option<usize>,
}

impl CellRange {
    /// First row covered by the range (0 when the range is open at the top).
    pub fn first_row(&self) -> usize {
        self.start_row.unwrap_or(0)
    }

    /// Number of columns the range spans.
    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

/// Parse a sheet-qualified range such as `Birds!A1:H1000`, `Birds!A:A`
/// or `Birds!A2:H2`.
pub fn parse_range(notation: &str) -> Result<CellRange> {
    let (sheet, cells) = notation
        .split_once('!')
        .ok_or_else(|| StoreError::InvalidRange(notation.to_string()))?;
    let sheet = sheet.trim_matches('\'');
    if sheet.is_empty() {
        return Err(StoreError::InvalidRange(notation.to_string()));
    }

    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (start_col, start_row) = split_cell(start)?;
    let (end_col, end_row) = split_cell(end)?;

    if end_col < start_col {
        return Err(StoreError::InvalidRange(notation.to_string()));
    }
    if let (Some(s), Some(e)) = (start_row, end_row) {
        if e < s {
            return Err(StoreError::InvalidRange(notation.to_string()));
        }
    }

    Ok(CellRange {
        sheet: sheet.to_string(),
        start_col,
        start_row,
        end_col,
        end_row,
    })
}

/// Build a sheet-qualified range string; rows are 1-based.
///
/// `format_range("Birds", "A", Some(2), "H", Some(2))` gives `Birds!A2:H2`,
/// `format_range("Birds", "A", None, "A", None)` gives `Birds!A:A`.
pub fn format_range(
    sheet: &str,
    start_col: &str,
    start_row: Option<usize>,
    end_col: &str,
    end_row: Option<usize>,
) -> String {
    let cell = |col: &str, row: Option<usize>| match row {
        Some(r) => format!("{col}{r}"),
        None => col.to_string(),
    };
    format!(
        "{sheet}!{}:{}",
        cell(start_col, start_row),
        cell(end_col, end_row)
    )
}

/// Split a cell reference into its 0-based column and optional 0-based row.
/// A bare column ("H") has no row.
fn split_cell(notation: &str) -> Result<(usize, Option<usize>)> {
    let notation = notation.trim().to_uppercase();
    let split_pos = notation
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(notation.len());

    let col_part = &notation[..split_pos];
    let row_part = &notation[split_pos..];

    if col_part.is_empty() {
        return Err(StoreError::InvalidRange(notation));
    }
    let col = column_letters_to_index(col_part)?;

    if row_part.is_empty() {
        return Ok((col, None));
    }

    let row = row_part
        .parse::<usize>()
        .map_err(|_| StoreError::InvalidRange(notation.clone()))?;

    // Rows are 1-based in A1 notation
    if row == 0 {
        return Err(StoreError::InvalidRange(notation));
    }

    Ok((col, Some(row - 1)))
}

/// Convert column letters to 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
pub fn column_letters_to_index(col_str: &str) -> Result<usize> {
    if col_str.is_empty() {
        return Err(StoreError::InvalidRange(col_str.to_string()));
    }

    let mut col = 0;
    for b in col_str.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return Err(StoreError::InvalidRange(col_str.to_string()));
        }
        col = col * 26 + (b - b'A') as usize + 1;
    }

    Ok(col - 1) // Convert to 0-based
}
