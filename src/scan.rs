use std::collections::HashMap;

use crate::config::ScanConfig;
use crate::fetch::{Fetcher, Transport};
use crate::{extract, sink, source};

/// Run the whole scan: for each batch file, fetch every (URL, strategy)
/// pair sequentially with fixed pacing, accumulate records, and flush one
/// CSV per batch. Individual fetch failures become sentinel rows; only a
/// failed write is fatal.
pub async fn run_scan<T: Transport>(
    config: &ScanConfig,
    fetcher: &Fetcher<T>,
) -> std::io::Result<()> {
    let mut label_uses: HashMap<String, u32> = HashMap::new();
    for input in &config.input_files {
        let urls = match source::load_targets(input) {
            Ok(urls) => urls,
            Err(e) => {
                eprintln!("[psi] skipping batch {}: {e}", input.display());
                continue;
            }
        };

        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("batch");

        // Two input files can share a stem (e.g. a/urls.txt and b/urls.txt);
        // suffix repeats so one batch never overwrites another's output.
        let uses = label_uses.entry(stem.to_string()).or_insert(0);
        *uses += 1;
        let label = if *uses == 1 {
            stem.to_string()
        } else {
            eprintln!("[psi] batch label {stem} already used, writing {stem}_{uses}");
            format!("{stem}_{uses}")
        };

        let mut records = Vec::with_capacity(urls.len() * config.strategies.len());
        for url in &urls {
            for &strategy in &config.strategies {
                eprintln!("[psi] scanning {url} [{strategy}]");
                let outcome = fetcher.fetch(url, strategy).await;
                records.push(extract::extract(url, strategy, outcome));
                tokio::time::sleep(config.delay).await;
            }
        }

        if let Some(path) = sink::write_batch(&config.output_dir, &label, &records)? {
            eprintln!("[psi] wrote {} rows to {}", records.len(), path.display());
        }
    }
    Ok(())
}
