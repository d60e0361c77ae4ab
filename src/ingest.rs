//! CSV ingestion of hardware platforms and workloads.
//!
//! Hardware rows are `name, peak_performance, peak_bandwidth, cost` where the
//! cost field may be left empty. Workload rows are
//! `name, arithmetic_intensity[, label, value]*`. Rows whose first field
//! starts with `#` are comments in both files.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::core::model::{MeasuredPoint, Platform, Workload};
use crate::error::IngestError;

pub const HARDWARE_CSV: &str = "HW CSV";
pub const WORKLOAD_CSV: &str = "SW CSV";

/// Parse hardware platforms from any reader. `origin` names the source in
/// error messages.
pub fn read_platforms<R: Read>(reader: R, origin: &str) -> Result<Vec<Platform>, IngestError> {
    let mut platforms = Vec::new();
    let mut names = HashSet::new();

    for_each_row(reader, origin, |record, line| {
        if record.len() != 4 {
            return Err(IngestError::Arity {
                origin: origin.to_string(),
                line,
                expected: "exactly 4",
                found: record.len(),
            });
        }

        let performance = parse_number(&record[1], "peak performance", origin, line)?;
        let bandwidth = parse_number(&record[2], "peak bandwidth", origin, line)?;
        let cost = if record[3].is_empty() {
            None
        } else {
            Some(parse_number(&record[3], "cost", origin, line)?)
        };

        let platform = Platform::new(&record[0], performance, bandwidth, cost)
            .map_err(|source| IngestError::Record {
                origin: origin.to_string(),
                line,
                source,
            })?;
        ensure_unique(&mut names, platform.name(), origin, line)?;

        debug!(
            name = platform.name(),
            peak_performance = platform.peak_performance(),
            peak_bandwidth = platform.peak_bandwidth(),
            cost = ?platform.cost(),
            "read platform"
        );
        platforms.push(platform);
        Ok(())
    })?;

    Ok(platforms)
}

/// Parse workloads from any reader.
pub fn read_workloads<R: Read>(reader: R, origin: &str) -> Result<Vec<Workload>, IngestError> {
    let mut workloads = Vec::new();
    let mut names = HashSet::new();

    for_each_row(reader, origin, |record, line| {
        if record.len() < 2 || record.len() % 2 != 0 {
            return Err(IngestError::Arity {
                origin: origin.to_string(),
                line,
                expected: "at least 2 fields and an even number of",
                found: record.len(),
            });
        }

        let intensity = parse_number(&record[1], "arithmetic intensity", origin, line)?;
        let fields: Vec<&str> = record.iter().skip(2).collect();
        let points = fields
            .chunks_exact(2)
            .map(|pair| -> Result<MeasuredPoint, IngestError> {
                Ok(MeasuredPoint {
                    label: pair[0].to_string(),
                    performance: parse_number(pair[1], "measured performance", origin, line)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let workload =
            Workload::new(&record[0], intensity, points).map_err(|source| IngestError::Record {
                origin: origin.to_string(),
                line,
                source,
            })?;
        ensure_unique(&mut names, workload.name(), origin, line)?;

        debug!(
            name = workload.name(),
            arithmetic_intensity = workload.arithmetic_intensity(),
            points = workload.points().len(),
            "read workload"
        );
        workloads.push(workload);
        Ok(())
    })?;

    Ok(workloads)
}

/// Read platforms from `path`, or from stdin when no path is given.
pub fn load_platforms(path: Option<&Path>) -> Result<Vec<Platform>, IngestError> {
    info!("Reading HW characteristics from {}", describe(path));
    match path {
        Some(path) => read_platforms(open(path)?, &format!("{HARDWARE_CSV} {}", path.display())),
        None => read_platforms(io::stdin().lock(), HARDWARE_CSV),
    }
}

/// Read workloads from `path`, or from stdin when no path is given.
pub fn load_workloads(path: Option<&Path>) -> Result<Vec<Workload>, IngestError> {
    info!("Reading applications intensities from {}", describe(path));
    match path {
        Some(path) => read_workloads(open(path)?, &format!("{WORKLOAD_CSV} {}", path.display())),
        None => read_workloads(io::stdin().lock(), WORKLOAD_CSV),
    }
}

/// Feed every non-comment row to `handle` with its 1-based physical line.
///
/// Rows never span lines, so each line is parsed as its own CSV record;
/// this keeps comment and blank lines in the line count.
fn for_each_row<R, F>(reader: R, origin: &str, mut handle: F) -> Result<(), IngestError>
where
    R: Read,
    F: FnMut(&StringRecord, u64) -> Result<(), IngestError>,
{
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(csv::Trim::All);

    let csv_error = |source: csv::Error| IngestError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut record = StringRecord::new();
    for (idx, text) in BufReader::new(reader).lines().enumerate() {
        let text = text.map_err(|e| csv_error(e.into()))?;
        if !builder
            .from_reader(text.as_bytes())
            .read_record(&mut record)
            .map_err(csv_error)?
        {
            continue;
        }
        if is_skipped(&record) {
            continue;
        }
        handle(&record, idx as u64 + 1)?;
    }
    Ok(())
}

/// Comment rows (first field starting with `#` after trimming) and rows with
/// only empty fields.
fn is_skipped(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|first| first.starts_with('#'))
        || record.iter().all(str::is_empty)
}

fn parse_number(
    value: &str,
    field: &'static str,
    origin: &str,
    line: u64,
) -> Result<f64, IngestError> {
    value.parse::<f64>().map_err(|_| IngestError::Number {
        origin: origin.to_string(),
        line,
        field,
        value: value.to_string(),
    })
}

fn ensure_unique(
    names: &mut HashSet<String>,
    name: &str,
    origin: &str,
    line: u64,
) -> Result<(), IngestError> {
    if !names.insert(name.to_string()) {
        return Err(IngestError::Duplicate {
            origin: origin.to_string(),
            line,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn describe(path: Option<&Path>) -> String {
    path.map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RooflineError;
    use std::io::Write;

    #[test]
    fn reads_platforms_and_skips_comments() {
        let csv = "\
# name, GFLOP/s, GB/s, cost
Xeon, 1200, 140, 3000

  # indented comment, 1, 1, 1
Jetson,665,204.8,
";
        let platforms = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap();
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].name(), "Xeon");
        assert_eq!(platforms[0].peak_performance(), 1200.0);
        assert_eq!(platforms[0].peak_bandwidth(), 140.0);
        assert_eq!(platforms[0].cost(), Some(3000.0));
        assert_eq!(platforms[1].peak_bandwidth(), 204.8);
        assert_eq!(platforms[1].cost(), None);
    }

    #[test]
    fn hardware_row_with_wrong_arity_fails() {
        let csv = "Xeon,1200,140,3000\nBroken,1,2\n";
        let err = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap_err();
        match err {
            IngestError::Arity {
                line,
                found,
                expected,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(found, 3);
                assert_eq!(expected, "exactly 4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_lines_count_comments_and_blank_lines() {
        let csv = "# name, GFLOP/s, GB/s, cost\n\nBroken,1,2\n";
        let err = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap_err();
        assert!(matches!(err, IngestError::Arity { line: 3, found: 3, .. }));

        let csv = "A,1,1,1\n#c\n  # d\n\r\nB,1,2\n";
        let err = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap_err();
        assert!(err.to_string().starts_with("HW CSV line 5:"), "{err}");

        let csv = "a,1\n,,\n#z\nb,2,x\n";
        let err = read_workloads(csv.as_bytes(), WORKLOAD_CSV).unwrap_err();
        assert!(matches!(err, IngestError::Arity { line: 4, found: 3, .. }));
    }

    #[test]
    fn crlf_input_is_accepted() {
        let csv = "# hw\r\nXeon,1200,140,3000\r\nJetson,665,204.8,\r\n";
        let platforms = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap();
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[1].cost(), None);
    }

    #[test]
    fn non_numeric_field_fails() {
        let err = read_platforms("Xeon,fast,140,1\n".as_bytes(), HARDWARE_CSV).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Number {
                field: "peak performance",
                ..
            }
        ));
        assert!(err.to_string().contains("'fast'"));
    }

    #[test]
    fn non_positive_platform_is_rejected() {
        let err = read_platforms("Xeon,0,140,1\n".as_bytes(), HARDWARE_CSV).unwrap_err();
        match err {
            IngestError::Record { source, .. } => {
                assert!(matches!(source, RooflineError::InvalidInput(_)))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_platform_is_rejected() {
        let csv = "A,1,1,1\nA,2,2,2\n";
        let err = read_platforms(csv.as_bytes(), HARDWARE_CSV).unwrap_err();
        assert!(matches!(err, IngestError::Duplicate { line: 2, .. }));
    }

    #[test]
    fn reads_workloads_with_measured_points() {
        let csv = "\
#app, FLOP/byte, label, GFLOP/s
stream, 0.0833
dgemm, 24, naive, 35.5, blocked, 410
";
        let workloads = read_workloads(csv.as_bytes(), WORKLOAD_CSV).unwrap();
        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].name(), "stream");
        assert!(workloads[0].points().is_empty());
        assert_eq!(workloads[1].arithmetic_intensity(), 24.0);
        assert_eq!(
            workloads[1].points(),
            [
                MeasuredPoint {
                    label: "naive".into(),
                    performance: 35.5
                },
                MeasuredPoint {
                    label: "blocked".into(),
                    performance: 410.0
                },
            ]
        );
    }

    #[test]
    fn workload_with_dangling_label_fails() {
        let err = read_workloads("dgemm,24,naive\n".as_bytes(), WORKLOAD_CSV).unwrap_err();
        assert!(matches!(err, IngestError::Arity { found: 3, .. }));
        assert!(err
            .to_string()
            .contains("at least 2 fields and an even number of entries, found 3"));
        let err = read_workloads("lonely\n".as_bytes(), WORKLOAD_CSV).unwrap_err();
        assert!(matches!(err, IngestError::Arity { found: 1, .. }));
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(read_platforms("".as_bytes(), HARDWARE_CSV).unwrap().is_empty());
        assert!(read_workloads("# only\n".as_bytes(), WORKLOAD_CSV)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GPU,19500,1555,10000").unwrap();
        let platforms = load_platforms(Some(file.path())).unwrap();
        assert_eq!(platforms[0].ridge_point(), 19500.0 / 1555.0);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let err = load_workloads(Some(&missing)).unwrap_err();
        assert!(matches!(err, IngestError::Open { .. }));
    }
}
