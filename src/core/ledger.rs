// Metadata ledger - `class_name,count` rows recorded on every normalization run

use crate::core::config::LedgerPolicy;
use crate::models::dataset::{ClassName, DatasetError, DatasetResult, LedgerRow};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header-less CSV of per-class sample counts. Single writer assumed.
pub struct MetadataLedger {
    path: PathBuf,
}

impl MetadataLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows in file order; a missing file is an empty ledger
    pub fn read(&self) -> DatasetResult<Vec<LedgerRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let mut rows = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            rows.push(self.parse_row(index + 1, line)?);
        }

        Ok(rows)
    }

    /// Append one row, leaving earlier rows for the class in place
    pub fn append(&self, row: &LedgerRow) -> DatasetResult<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{},{}", row.class_name, row.sample_count)?;

        Ok(())
    }

    /// Drop every earlier row for the class, then append `row`
    pub fn replace_class(&self, row: &LedgerRow) -> DatasetResult<()> {
        // Keep other classes' rows in file order
        let kept: Vec<LedgerRow> = self
            .read()?
            .into_iter()
            .filter(|existing| existing.class_name != row.class_name)
            .collect();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // New row goes last
        let mut contents = String::new();
        for existing in kept.iter().chain(std::iter::once(row)) {
            contents.push_str(&format!("{},{}\n", existing.class_name, existing.sample_count));
        }

        // replaced atomically via rename
        let tmp_path = self.path.with_extension("csv.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    pub fn record(&self, row: &LedgerRow, policy: LedgerPolicy) -> DatasetResult<()> {
        match policy {
            LedgerPolicy::Append => self.append(row),
            LedgerPolicy::ReplaceClass => self.replace_class(row),
        }
    }

    /// Sum of every row per class. Repeated rows for a class all count.
    pub fn totals(&self) -> DatasetResult<BTreeMap<ClassName, usize>> {
        let mut totals = BTreeMap::new();
        for row in self.read()? {
            *totals.entry(row.class_name).or_insert(0) += row.sample_count;
        }
        Ok(totals)
    }

    fn parse_row(&self, line: usize, content: &str) -> DatasetResult<LedgerRow> {
        let malformed = || DatasetError::InvalidLedgerRow {
            path: self.path.clone(),
            line,
            content: content.to_string(),
        };

        // Exactly two fields: class_name,count
        let mut fields = content.split(',');
        let (name, count) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(count), None) => (name.trim(), count.trim()),
            _ => return Err(malformed()),
        };

        let class_name = ClassName::parse(name).map_err(|_| malformed())?;
        let sample_count = count.parse::<usize>().map_err(|_| malformed())?;

        Ok(LedgerRow::new(class_name, sample_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(name: &str, count: usize) -> LedgerRow {
        LedgerRow::new(ClassName::parse(name).unwrap(), count)
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = MetadataLedger::new(dir.path().join("metadata.csv"));
        assert!(ledger.read().unwrap().is_empty());
        assert!(ledger.totals().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_duplicate_rows() {
        let dir = TempDir::new().unwrap();
        let ledger = MetadataLedger::new(dir.path().join("norm").join("metadata.csv"));

        ledger.record(&row("wave", 4), LedgerPolicy::Append).unwrap();
        ledger.record(&row("fist", 2), LedgerPolicy::Append).unwrap();
        ledger.record(&row("wave", 5), LedgerPolicy::Append).unwrap();

        let contents = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, "wave,4\nfist,2\nwave,5\n");

        let totals = ledger.totals().unwrap();
        assert_eq!(totals[&ClassName::parse("wave").unwrap()], 9);
        assert_eq!(totals[&ClassName::parse("fist").unwrap()], 2);
    }

    #[test]
    fn test_replace_class_keeps_one_row_per_class() {
        let dir = TempDir::new().unwrap();
        let ledger = MetadataLedger::new(dir.path().join("metadata.csv"));

        ledger.append(&row("wave", 4)).unwrap();
        ledger.append(&row("fist", 2)).unwrap();
        ledger.append(&row("wave", 4)).unwrap();
        ledger.record(&row("wave", 6), LedgerPolicy::ReplaceClass).unwrap();

        assert_eq!(ledger.read().unwrap(), vec![row("fist", 2), row("wave", 6)]);
        assert!(!dir.path().join("metadata.csv.tmp").exists());
    }

    #[test]
    fn test_malformed_rows_are_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.csv");
        let ledger = MetadataLedger::new(path.clone());

        for bad in ["wave", "wave,four", "wave,4,extra", "Wave,4", "wave,-1"] {
            std::fs::write(&path, format!("fist,2\n\n{}\n", bad)).unwrap();
            match ledger.read() {
                Err(DatasetError::InvalidLedgerRow { line, content, .. }) => {
                    assert_eq!(line, 3);
                    assert_eq!(content, bad);
                }
                other => panic!("'{}' should be rejected, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_whitespace_around_fields_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.csv");
        std::fs::write(&path, "wave , 3\r\n").unwrap();

        let ledger = MetadataLedger::new(path);
        assert_eq!(ledger.read().unwrap(), vec![row("wave", 3)]);
    }
}
