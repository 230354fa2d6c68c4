mod config;
mod extract;
mod fetch;
mod scan;
mod sink;
mod source;

use config::ScanConfig;
use fetch::{Fetcher, HttpTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ScanConfig {
        api_key: std::env::var("PSI_API_KEY").unwrap_or_default(),
        ..ScanConfig::default()
    };

    let transport = HttpTransport::new(&config)?;
    let fetcher = Fetcher::new(transport, config.retry_count, config.delay);
    scan::run_scan(&config, &fetcher).await?;
    Ok(())
}
