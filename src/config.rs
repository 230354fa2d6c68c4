use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::Strategy;

/// Everything the scan pipeline needs, fixed at build time. `api_key` is the
/// one value filled in from the environment (`PSI_API_KEY`) by `main`; an
/// empty key is passed through and rejected by the remote end.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// One batch per file; plain text, one URL per line, `#` comments allowed.
    pub input_files: Vec<PathBuf>,
    /// Device strategies tested for every URL, in order.
    pub strategies: Vec<Strategy>,
    /// Lighthouse categories requested from the API.
    pub categories: Vec<String>,
    pub api_key: String,
    /// Attempts per (URL, strategy) pair before giving up.
    pub retry_count: u32,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Fixed delay between retry attempts and between processed pairs.
    pub delay: Duration,
    /// Directory receiving one `psi_results_<batch>.csv` per input file.
    pub output_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            input_files: vec![
                PathBuf::from("urls_part_1.txt"),
                PathBuf::from("urls_part_2.txt"),
            ],
            strategies: vec![Strategy::Mobile, Strategy::Desktop],
            categories: vec!["performance".to_string()],
            api_key: String::new(),
            retry_count: 3,
            request_timeout: Duration::from_secs(30),
            delay: Duration::from_secs(5),
            output_dir: PathBuf::from("."),
        }
    }
}
