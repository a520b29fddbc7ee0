//! CSV table access by header name.

use csv::ReaderBuilder;

use crate::error::{HarvesterError, Result};

/// One data row.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// 1-based data row number (the header is row 0).
    pub number: usize,
    cells: Vec<String>,
}

impl TableRow {
    /// Non-empty cell in `column`.
    #[must_use]
    pub fn get(&self, column: Option<usize>) -> Option<&str> {
        column
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether every cell is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }
}

/// A decoded registry CSV export.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl Table {
    /// Decode a CSV document.
    ///
    /// Rows may have fewer or more cells than the header. Cell text is
    /// whitespace-collapsed, so multi-line cells become a single line.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader
            .byte_headers()?
            .iter()
            .map(collapse_cell)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (index, record) in reader.byte_records().enumerate() {
            let record = record?;
            rows.push(TableRow {
                number: index + 1,
                cells: record.iter().map(collapse_cell).collect(),
            });
        }

        Ok(Self { headers, rows })
    }

    /// Index of the first header matching one of `aliases`, ignoring case.
    #[must_use]
    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(alias))
        })
    }

    /// Like [`Table::column`] but a missing column is a parse error.
    pub fn require(&self, registry: &str, aliases: &[&str]) -> Result<usize> {
        self.column(aliases).ok_or_else(|| {
            HarvesterError::parse(
                registry,
                format!(
                    "missing column {} (found: {})",
                    aliases.join(" / "),
                    self.headers.join(", ")
                ),
            )
        })
    }

    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }
}

fn collapse_cell(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &str = "Number,Name,Reference\n\
        0,Reserved,[RFC7252]\n\
        1,If-Match,[RFC7252]\n\
        \"4\",\"ETag\n  (entity tag)\",[RFC7252]\n\
        9,\n";

    #[test]
    fn test_columns_case_insensitive() {
        let table = Table::from_csv(OPTIONS.as_bytes()).unwrap();
        assert_eq!(table.column(&["number"]), Some(0));
        assert_eq!(table.column(&["Label", "NAME"]), Some(1));
        assert_eq!(table.column(&["Applies to"]), None);
    }

    #[test]
    fn test_multiline_cell_collapsed() {
        let table = Table::from_csv(OPTIONS.as_bytes()).unwrap();
        let name = table.column(&["Name"]);
        assert_eq!(table.rows()[2].get(name), Some("ETag (entity tag)"));
        assert_eq!(table.rows()[2].number, 3);
    }

    #[test]
    fn test_short_row_and_empty_cell() {
        let table = Table::from_csv(OPTIONS.as_bytes()).unwrap();
        let name = table.column(&["Name"]);
        let reference = table.column(&["Reference"]);
        let row = &table.rows()[3];
        assert_eq!(row.get(name), None);
        assert_eq!(row.get(reference), None);
        assert!(!row.is_blank());
    }

    #[test]
    fn test_require_missing_column() {
        let table = Table::from_csv(OPTIONS.as_bytes()).unwrap();
        let err = table.require("coap-options", &["Tag"]).unwrap_err();
        assert!(matches!(err, HarvesterError::Parse { .. }));
        assert!(err.to_string().contains("missing column Tag"));
    }

    #[test]
    fn test_bom_stripped() {
        let table = Table::from_csv(b"\xEF\xBB\xBFValue,Semantics\n20,false\n").unwrap();
        assert_eq!(table.column(&["Value"]), Some(0));
    }
}
