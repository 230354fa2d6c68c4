use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::extract::MetricRecord;

/// Write one batch's records as a CSV at `dir/psi_results_<label>.csv`,
/// header first, rows in accumulation order. An empty batch writes nothing
/// and returns `Ok(None)`. The file handle lives only for this call.
pub fn write_batch(
    dir: &Path,
    label: &str,
    records: &[MetricRecord],
) -> std::io::Result<Option<PathBuf>> {
    if records.is_empty() {
        eprintln!("[psi] no records for batch {label}, skipping output");
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(format!("psi_results_{label}.csv"));
    let mut file = fs::File::create(&path)?;

    writeln!(file, "{}", MetricRecord::header().join(","))?;
    for record in records {
        let cells: Vec<String> = record.row().iter().map(|cell| escape_csv(cell)).collect();
        writeln!(file, "{}", cells.join(","))?;
    }

    Ok(Some(path))
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Strategy;

    fn record(url: &str, status: &str) -> MetricRecord {
        MetricRecord {
            url: url.to_string(),
            strategy: Strategy::Mobile,
            performance_score: Some(88.0),
            fcp: Some("1.0 s".to_string()),
            lcp: None,
            cls: None,
            inp: None,
            tbt: None,
            crux_lcp_p75: Some(2.1),
            crux_cls_p75: None,
            crux_inp_p75: None,
            crux_fid_p75: None,
            cwv_status: None,
            needs_improvement: false,
            status: status.to_string(),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let records = vec![record("https://a.example/", "OK")];

        let path = write_batch(dir.path(), "urls_part_1", &records)
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "psi_results_urls_part_1.csv");

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], MetricRecord::header().join(","));
        assert!(lines[1].starts_with("https://a.example/,mobile,88,1.0 s,N/A"));
    }

    #[test]
    fn escapes_cells_containing_commas_and_quotes() {
        let dir = tempfile::TempDir::new().unwrap();
        let records = vec![record("https://a.example/", "request failed: error, \"odd\"")];

        let path = write_batch(dir.path(), "batch", &records).unwrap().unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"request failed: error, \"\"odd\"\"\""));
    }

    #[test]
    fn empty_batch_writes_no_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = write_batch(dir.path(), "empty", &[]).unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("psi_results_empty.csv").exists());
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("out").join("reports");
        let records = vec![record("https://a.example/", "OK")];

        let path = write_batch(&nested, "batch", &records).unwrap().unwrap();
        assert!(path.exists());
    }
}
