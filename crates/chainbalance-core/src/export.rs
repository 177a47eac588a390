//! Write classified results to text files, one `address: balance` per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::classify::ClassifiedResults;
use crate::error::ExportError;
use crate::types::DecimalBalance;

/// Paths of the artifacts written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifacts {
    pub with_balance: PathBuf,
    pub without_balance: PathBuf,
    /// Set only when a failed-address file was configured and written.
    pub failed: Option<PathBuf>,
}

/// Writes the balance groups to their files, replacing existing content.
#[derive(Debug, Clone)]
pub struct ResultExporter {
    with_balance_path: PathBuf,
    without_balance_path: PathBuf,
    failed_path: Option<PathBuf>,
}

impl Default for ResultExporter {
    fn default() -> Self {
        Self::new("with_balance.txt", "without_balance.txt")
    }
}

impl ResultExporter {
    pub fn new(with_balance: impl Into<PathBuf>, without_balance: impl Into<PathBuf>) -> Self {
        Self {
            with_balance_path: with_balance.into(),
            without_balance_path: without_balance.into(),
            failed_path: None,
        }
    }

    /// Also write addresses of exhausted batches, one per line.
    pub fn with_failed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.failed_path = Some(path.into());
        self
    }

    /// Write both balance groups. Any I/O error aborts the export.
    pub fn export(&self, results: &ClassifiedResults) -> Result<ExportedArtifacts, ExportError> {
        write_balances(&self.with_balance_path, &results.with_balance)?;
        write_balances(&self.without_balance_path, &results.without_balance)?;

        let failed = self.export_failed(&results.failed)?;

        info!(
            with_balance = results.with_balance.len(),
            without_balance = results.without_balance.len(),
            path = %self.with_balance_path.display(),
            "results exported"
        );

        Ok(ExportedArtifacts {
            with_balance: self.with_balance_path.clone(),
            without_balance: self.without_balance_path.clone(),
            failed,
        })
    }

    /// Write only the failed-address file, if one is configured and there
    /// is anything to write. Returns the path written.
    pub fn export_failed(&self, addresses: &[String]) -> Result<Option<PathBuf>, ExportError> {
        let Some(path) = self.failed_path.as_ref().filter(|_| !addresses.is_empty()) else {
            return Ok(None);
        };
        write_lines(path, addresses.iter().map(|a| format!("{a}\n")))?;
        Ok(Some(path.clone()))
    }
}

fn write_balances(path: &Path, rows: &[(String, DecimalBalance)]) -> Result<(), ExportError> {
    write_lines(
        path,
        rows.iter()
            .map(|(address, balance)| format!("{address}: {balance}\n")),
    )
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for line in lines {
        out.write_all(line.as_bytes()).map_err(io_err)?;
    }
    out.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn results() -> ClassifiedResults {
        ClassifiedResults {
            with_balance: vec![(
                "0xaa".into(),
                DecimalBalance::from_raw(U256::from(1_500_000_000_000_000_000u64)),
            )],
            without_balance: vec![
                ("0xbb".into(), DecimalBalance::from_raw(U256::ZERO)),
                ("0xcc".into(), DecimalBalance::from_raw(U256::ZERO)),
            ],
            failed: vec!["0xdd".into()],
            failed_batches: 1,
        }
    }

    #[test]
    fn writes_one_line_per_address() {
        let dir = tempfile::tempdir().unwrap();
        let with = dir.path().join("with.txt");
        let without = dir.path().join("without.txt");

        let artifacts = ResultExporter::new(&with, &without).export(&results()).unwrap();

        assert_eq!(std::fs::read_to_string(&with).unwrap(), "0xaa: 1.5\n");
        assert_eq!(
            std::fs::read_to_string(&without).unwrap(),
            "0xbb: 0.0\n0xcc: 0.0\n"
        );
        assert_eq!(artifacts.failed, None);
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let with = dir.path().join("with.txt");
        let without = dir.path().join("without.txt");
        std::fs::write(&with, "stale content that is longer\n").unwrap();

        ResultExporter::new(&with, &without)
            .export(&ClassifiedResults::default())
            .unwrap();

        assert_eq!(std::fs::read_to_string(&with).unwrap(), "");
        assert_eq!(std::fs::read_to_string(&without).unwrap(), "");
    }

    #[test]
    fn optional_failed_file() {
        let dir = tempfile::tempdir().unwrap();
        let failed = dir.path().join("failed.txt");
        let artifacts = ResultExporter::new(dir.path().join("w"), dir.path().join("wo"))
            .with_failed_path(&failed)
            .export(&results())
            .unwrap();

        assert_eq!(artifacts.failed.as_deref(), Some(failed.as_path()));
        assert_eq!(std::fs::read_to_string(&failed).unwrap(), "0xdd\n");
    }

    #[test]
    fn failed_file_alone_leaves_balance_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let with = dir.path().join("with.txt");
        let failed = dir.path().join("failed.txt");
        let exporter =
            ResultExporter::new(&with, dir.path().join("without.txt")).with_failed_path(&failed);

        assert_eq!(exporter.export_failed(&[]).unwrap(), None);
        assert!(!failed.exists());

        let written = exporter
            .export_failed(&["0xaa".to_string(), "0xbb".to_string()])
            .unwrap();
        assert_eq!(written.as_deref(), Some(failed.as_path()));
        assert_eq!(std::fs::read_to_string(&failed).unwrap(), "0xaa\n0xbb\n");
        assert!(!with.exists());
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("with.txt");

        let err = ResultExporter::new(&missing, dir.path().join("without.txt"))
            .export(&results())
            .unwrap_err();

        let ExportError::Io { path, .. } = err;
        assert_eq!(path, missing);
    }
}
