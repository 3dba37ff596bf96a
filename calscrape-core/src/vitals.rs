use crate::batch::{BatchOptions, BatchPool};
use crate::config::AppConfig;
use crate::error::Result;
use crate::report::BatchSummary;
use crate::store::write_json_atomic;
use calscrape_scanner::{MissingVitals, PageHandler, ProgramEntry, extract_program_entries_from_html};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct VitalsScrape {
    pub entries: Vec<ProgramEntry>,
    pub pages_total: usize,
    pub pages_failed: usize,
    /// Fetched pages that yielded nothing, with the reason.
    pub pages_skipped: Vec<(String, MissingVitals)>,
}

/// Fetch program pages and build Major/Honours entries from their vitals
/// boxes, in input order.
pub async fn execute_vitals_scrape(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
) -> Result<VitalsScrape> {
    let batch = BatchPool::new(config, options, urls.len(), "Reading program vitals")?;
    let handler: PageHandler<std::result::Result<Vec<ProgramEntry>, MissingVitals>> =
        Arc::new(|url: &str, body: &str| extract_program_entries_from_html(body, url));

    let pages_total = urls.len();
    let results = batch.pool.run(urls, handler).await?;

    let mut scrape = VitalsScrape {
        pages_total,
        ..VitalsScrape::default()
    };
    for result in results {
        match result.value {
            Some(Ok(entries)) => {
                info!("{}: {} entries", result.url, entries.len());
                scrape.entries.extend(entries);
            }
            Some(Err(missing)) => {
                warn!("{}: {}", result.url, missing.as_str());
                scrape.pages_skipped.push((result.url, missing));
            }
            None => scrape.pages_failed += 1,
        }
    }

    batch.finish(&format!("{} entries from {} pages", scrape.entries.len(), pages_total));
    Ok(scrape)
}

pub async fn run_vitals_batch(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
    output: &Path,
) -> Result<BatchSummary> {
    let scrape = execute_vitals_scrape(config, options, urls).await?;
    write_json_atomic(output, &scrape.entries)?;

    let mut summary = BatchSummary {
        pages_total: scrape.pages_total,
        pages_failed: scrape.pages_failed,
        records_new: scrape.entries.len(),
        records_total: scrape.entries.len(),
        output: output.to_path_buf(),
        ..BatchSummary::default()
    };
    for (_, missing) in &scrape.pages_skipped {
        summary.count_status(missing.as_str());
    }
    Ok(summary)
}
