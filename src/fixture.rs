//! CSV fixture loading.
//!
//! Fixtures are headerless two-column CSV files, one `key,value` record per
//! row. Loading inserts rows in file order and reads each one back right
//! away, so a fixture doubles as a smoke test of the tree.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::common::{Error, Result};
use crate::index::btree::{BPlusTree, Record};

/// Outcome of a successful fixture load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows inserted.
    pub rows: usize,
    /// Tree height after the last insert.
    pub height: usize,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn to_record(row: &StringRecord) -> Result<Record> {
    if row.len() != 2 {
        return Err(Error::MalformedRow {
            line: row.position().map_or(0, |p| p.line()),
            fields: row.len(),
        });
    }
    Ok(Record::new(&row[0], &row[1]))
}

/// Parse every row of a fixture without touching a tree.
///
/// # Errors
/// - `Error::Csv` if the input is not valid CSV
/// - `Error::MalformedRow` for a row without exactly two fields
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    csv_reader(reader)
        .records()
        .map(|row| to_record(&row?))
        .collect()
}

/// Insert every fixture row into `tree`, verifying each with a lookup.
///
/// Stops at the first failing row; rows before it stay inserted.
///
/// # Errors
/// - `Error::DuplicateKey` if a key repeats (in the fixture or the tree)
/// - `Error::InvariantViolation` if a just-inserted row reads back wrong
/// - `Error::Csv` / `Error::MalformedRow` for bad input
pub fn load_into<R: Read>(reader: R, tree: &mut BPlusTree) -> Result<LoadReport> {
    let mut rows = 0;

    for row in csv_reader(reader).records() {
        let record = to_record(&row?)?;
        tree.insert_record(record.clone())?;

        match tree.find(record.key())? {
            Some(found) if *found == record => {}
            other => {
                return Err(Error::corrupt(format!(
                    "read back {:?} right after inserting {}",
                    other, record
                )))
            }
        }
        rows += 1;
    }

    debug!(target: "bptindex::fixture", rows, height = tree.height(), "fixture loaded");
    Ok(LoadReport {
        rows,
        height: tree.height(),
    })
}

/// Open `path` and [`load_into`] the tree.
pub fn load_path(path: impl AsRef<Path>, tree: &mut BPlusTree) -> Result<LoadReport> {
    let path = path.as_ref();
    let report = load_into(File::open(path)?, tree)?;
    info!(
        target: "bptindex::fixture",
        path = %path.display(),
        rows = report.rows,
        "loaded fixture file"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records() {
        let data = "b,2\na,1\n\"c,with comma\",3\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("b", "2"),
                Record::new("a", "1"),
                Record::new("c,with comma", "3"),
            ]
        );
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let data = "a,1\nb\n";
        match read_records(data.as_bytes()) {
            Err(Error::MalformedRow { line, fields }) => {
                assert_eq!(line, 2);
                assert_eq!(fields, 1);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_load_into_tree() {
        let data: String = (0..50).map(|i| format!("key{:03},value{}\n", i, i)).collect();
        let mut tree = BPlusTree::new();

        let report = load_into(data.as_bytes(), &mut tree).unwrap();

        assert_eq!(report.rows, 50);
        assert_eq!(report.height, tree.height());
        assert_eq!(tree.len(), 50);
        assert_eq!(tree.find("key042").unwrap().unwrap().value(), "value42");
    }

    #[test]
    fn test_load_stops_at_duplicate() {
        let data = "a,1\nb,2\na,3\nc,4\n";
        let mut tree = BPlusTree::new();

        let err = load_into(data.as_bytes(), &mut tree).unwrap_err();

        assert!(matches!(err, Error::DuplicateKey(ref k) if k == "a"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find("a").unwrap().unwrap().value(), "1");
        assert!(tree.find("c").unwrap().is_none());
    }
}
