use std::fs::File;
use std::io::{self, BufRead as _, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::file_name::{ResultFileName, ResultKind};
use crate::point::{ResultTable, WorkloadPoint};

/// First line of every result file.
pub const RESULT_HEADER: &str = "n,t";

/// Reads and writes result files in a single output directory.
///
/// A result file is plain text: the [`RESULT_HEADER`] line followed by one `key,elapsed` line per
/// measurement. Writing is strict, reading is tolerant: rows that cannot be understood are
/// skipped with a warning so that a partially mangled file still yields its good rows.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path that [`ResultStore::write`] would use for a table.
    pub fn path_for(&self, kind: ResultKind, model: &str, backend: &str) -> PathBuf {
        self.dir
            .join(ResultFileName::new(kind, model, backend).to_string())
    }

    /// Write a table to its file in the store directory, creating the directory if needed.
    ///
    /// Any existing file for the same combination is replaced. Returns the written path.
    pub fn write(&self, table: &ResultTable, kind: ResultKind) -> Result<PathBuf, ResultStoreError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|source| ResultStoreError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;
        }

        let path = self.path_for(kind, table.model(), table.backend());
        let mut writer = BufWriter::new(File::create(&path)?);
        Self::write_table(&mut writer, table)?;
        writer.flush()?;

        log::debug!(
            "Wrote {} rows for {} on {} to {}",
            table.len(),
            table.model(),
            table.backend(),
            path.display()
        );

        Ok(path)
    }

    /// Serialize a table in the result file format.
    pub fn write_table<W>(mut writer: W, table: &ResultTable) -> io::Result<()>
    where
        W: Write,
    {
        writeln!(writer, "{RESULT_HEADER}")?;
        for point in table.points() {
            writeln!(
                writer,
                "{},{}",
                point.key,
                format_elapsed(point.elapsed_seconds)
            )?;
        }
        Ok(())
    }

    /// Read the measurements from a result file.
    pub fn read_from_file<P>(path: P) -> Result<Vec<WorkloadPoint>, ResultStoreError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read measurements in the result file format, skipping the header line.
    ///
    /// Rows that are not UTF-8, do not have exactly two comma separated fields, or whose fields
    /// are not numbers, are skipped with a warning.
    pub fn read<R>(reader: R) -> Result<Vec<WorkloadPoint>, ResultStoreError>
    where
        R: Read,
    {
        let mut points = Vec::new();
        for (index, bytes) in io::BufReader::new(reader).split(b'\n').enumerate().skip(1) {
            let bytes = bytes?;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                log::warn!("Skipping malformed row {row}: not valid UTF-8", row = index + 1);
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }

            let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
            if fields.len() != 2 {
                log::warn!(
                    "Skipping malformed row {row}: expected 2 fields but found {found}",
                    row = index + 1,
                    found = fields.len()
                );
                continue;
            }

            match (parse_key(fields[0]), fields[1].parse::<f64>()) {
                (Some(key), Ok(elapsed_seconds)) => {
                    points.push(WorkloadPoint::new(key, elapsed_seconds))
                }
                _ => {
                    log::warn!(
                        "Skipping malformed row {row}: '{line}' is not a key and a time",
                        row = index + 1
                    );
                }
            }
        }

        Ok(points)
    }
}

/// Format an elapsed time so that it always reads back as the same float and always carries a
/// decimal point, e.g. `1.0` rather than `1`.
pub fn format_elapsed(elapsed_seconds: f64) -> String {
    let formatted = elapsed_seconds.to_string();
    if elapsed_seconds.is_finite() && !formatted.contains('.') {
        format!("{formatted}.0")
    } else {
        formatted
    }
}

fn parse_key(field: &str) -> Option<u64> {
    field.parse::<u64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|key| key.is_finite() && *key >= 0.0 && key.fract() == 0.0)
            .map(|key| key as u64)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error("Failed to create result directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(points: &[(u64, f64)]) -> ResultTable {
        let mut table = ResultTable::new("c", "circle");
        for (key, elapsed) in points {
            table.push(WorkloadPoint::new(*key, *elapsed)).unwrap();
        }
        table
    }

    #[test]
    fn test_should_write_exact_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let path = store
            .write(
                &table(&[(250, 1.0), (500, 2.0), (1000, 4.0)]),
                ResultKind::SizeSweep,
            )
            .unwrap();

        assert_eq!(path, dir.path().join("bench_circle_c.txt"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "n,t\n250,1.0\n500,2.0\n1000,4.0\n"
        );
    }

    #[test]
    fn test_should_create_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results").join("2024");
        let store = ResultStore::new(&nested);

        let path = store
            .write(&table(&[(2, 0.25)]), ResultKind::ThreadScaling)
            .unwrap();

        assert_eq!(path, nested.join("scale_circle.txt"));
        assert!(path.is_file());
    }

    #[test]
    fn test_should_write_header_only_for_empty_table() {
        let mut buffer = Vec::new();
        ResultStore::write_table(&mut buffer, &table(&[])).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "n,t\n");
    }

    #[test]
    fn test_should_read_back_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let original = table(&[
            (250, 0.000123),
            (500, 1.5),
            (1000, 17.25),
            (2000, 0.1 + 0.2),
            (4000, 1e-9),
            (8000, 123456789.0),
        ]);

        let path = store.write(&original, ResultKind::SizeSweep).unwrap();
        let points = ResultStore::read_from_file(path).unwrap();

        assert_eq!(points, original.points());
    }

    #[test]
    fn test_should_skip_rows_with_wrong_field_count() {
        let content = "n,t\n250,1.5\n500,2.5,extra\n1000,4.5\n";

        let points = ResultStore::read(content.as_bytes()).unwrap();

        assert_eq!(
            points,
            vec![WorkloadPoint::new(250, 1.5), WorkloadPoint::new(1000, 4.5)]
        );
    }

    #[test]
    fn test_should_skip_unparseable_and_blank_rows() {
        let content = "n,t\n250,abc\n\n500,2.0\nonly-one-field\n1000.0,3.0\r\n";

        let points = ResultStore::read(content.as_bytes()).unwrap();

        assert_eq!(
            points,
            vec![WorkloadPoint::new(500, 2.0), WorkloadPoint::new(1000, 3.0)]
        );
    }

    #[test]
    fn test_should_skip_row_with_invalid_utf8() {
        let content: &[u8] = b"n,t\n250,1.0\n\xff\xfe,2.0\n1000,4.0\n";

        let points = ResultStore::read(content).unwrap();

        assert_eq!(
            points,
            vec![WorkloadPoint::new(250, 1.0), WorkloadPoint::new(1000, 4.0)]
        );
    }

    #[test]
    fn test_should_read_empty_file() {
        assert!(ResultStore::read("".as_bytes()).unwrap().is_empty());
        assert!(ResultStore::read("n,t\n".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_should_fail_to_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ResultStore::read_from_file(dir.path().join("bench_missing_c.txt"));

        assert!(matches!(result, Err(ResultStoreError::Io(_))));
    }

    #[test]
    fn test_should_format_elapsed_with_decimal_point() {
        assert_eq!(format_elapsed(1.0), "1.0");
        assert_eq!(format_elapsed(0.0), "0.0");
        assert_eq!(format_elapsed(0.125), "0.125");
        assert_eq!(format_elapsed(1e21), "1000000000000000000000.0");
    }
}
