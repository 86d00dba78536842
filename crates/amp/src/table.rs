use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::QueryError;

/// One result row: column name to scalar JSON value.
pub type Row = Map<String, Value>;

static NULL: Value = Value::Null;

/// Tabular result of a single query.
///
/// Columns are the keys of the first row in their original order, followed by
/// keys first seen in later rows. A row without a column reads as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// A table without columns or rows.
    pub const fn empty() -> Self {
        Self { columns: Vec::new(), rows: Vec::new() }
    }

    /// Build a table from parsed rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Parse a newline-delimited JSON body.
    ///
    /// Blank lines are skipped. Any other line must be a JSON object; the first
    /// one that is not rejects the whole body.
    pub fn from_jsonl(body: &str) -> Result<Self, QueryError> {
        let mut rows = Vec::new();
        for (idx, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)
                .map_err(|source| QueryError::Parse { line: idx + 1, source })?;
            match value {
                Value::Object(row) => rows.push(row),
                _ => return Err(QueryError::NotAnObject { line: idx + 1 }),
            }
        }
        Ok(Self::from_rows(rows))
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in response order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row`/`column`; `None` if the row does not exist, `null` if the
    /// row lacks the column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).map(|r| r.get(column).unwrap_or(&NULL))
    }

    /// Keep rows whose numeric `column` value is at least `threshold`.
    ///
    /// Numbers and numeric strings are compared; rows with a missing or
    /// non-numeric value are dropped. The column set is kept as is.
    pub fn filter_at_least(&self, column: &str, threshold: f64) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|r| r.get(column).and_then(as_f64).is_some_and(|v| v >= threshold))
            .cloned()
            .collect();
        Self { columns: self.columns.clone(), rows }
    }

    /// Decode every row into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, QueryError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, r)| {
                serde_json::from_value(Value::Object(r.clone()))
                    .map_err(|source| QueryError::Schema { row, source })
            })
            .collect()
    }
}

/// Read a JSON number or numeric string as `f64`.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn each_line_becomes_a_row() {
        let body = "{\"a\":1,\"b\":\"x\"}\n{\"a\":2,\"b\":\"y\"}\n{\"a\":3,\"b\":null}\n";
        let table = QueryResult::from_jsonl(body).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns(), ["a", "b"]);
        for row in table.rows() {
            assert_eq!(row.keys().collect::<Vec<_>>(), ["a", "b"]);
        }
        assert_eq!(table.get(1, "b"), Some(&json!("y")));
    }

    #[test]
    fn empty_body_is_empty_table() {
        assert!(QueryResult::from_jsonl("").unwrap().is_empty());
        assert!(QueryResult::from_jsonl("\n  \n\r\n").unwrap().is_empty());
    }

    #[test]
    fn blank_lines_and_crlf_are_ignored() {
        let body = "\r\n{\"a\":1}\r\n\r\n{\"a\":2}\r\n";
        let table = QueryResult::from_jsonl(body).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn malformed_line_rejects_whole_body() {
        let body = "{\"a\":1}\n{\"a\":\n{\"a\":3}";
        let err = QueryResult::from_jsonl(body).unwrap_err();
        assert!(matches!(err, QueryError::Parse { line: 2, .. }));
        assert!(err.is_parse());
    }

    #[test]
    fn non_object_line_is_rejected() {
        let err = QueryResult::from_jsonl("{\"a\":1}\n[1,2]").unwrap_err();
        assert!(matches!(err, QueryError::NotAnObject { line: 2 }));
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let table = QueryResult::from_jsonl("{\"b\":1,\"a\":2}\n{\"c\":3,\"a\":4}").unwrap();
        assert_eq!(table.columns(), ["b", "a", "c"]);
        assert_eq!(table.get(0, "c"), Some(&Value::Null));
        assert_eq!(table.get(5, "a"), None);
        assert_eq!(table.get(1, "c"), Some(&json!(3)));
    }

    #[test]
    fn filter_keeps_rows_at_or_above_threshold() {
        let body = "{\"from_address\":\"0xA\",\"eth_amount\":120.5}\n\
                    {\"from_address\":\"0xB\",\"eth_amount\":75.0}";
        let table = QueryResult::from_jsonl(body).unwrap();
        let whales = table.filter_at_least("eth_amount", 100.0);
        assert_eq!(whales.len(), 1);
        assert_eq!(whales.get(0, "from_address"), Some(&json!("0xA")));
        assert_eq!(whales.columns(), table.columns());
    }

    #[test]
    fn filter_boundary_is_inclusive_and_reads_strings() {
        let body = "{\"v\":\"100\"}\n{\"v\":100}\n{\"v\":99.99}\n{\"v\":null}\n{}";
        let table = QueryResult::from_jsonl(body).unwrap();
        assert_eq!(table.filter_at_least("v", 100.0).len(), 2);
    }

    #[test]
    fn decode_reports_failing_row() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Only {
            a: u64,
        }
        let table = QueryResult::from_jsonl("{\"a\":1}\n{\"a\":\"x\"}").unwrap();
        let err = table.decode::<Only>().unwrap_err();
        assert!(matches!(err, QueryError::Schema { row: 1, .. }));
    }
}
