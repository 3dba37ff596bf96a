use crate::batch::{BatchOptions, BatchPool};
use crate::config::AppConfig;
use crate::error::Result;
use crate::report::BatchSummary;
use crate::store::{load_existing, write_json_atomic};
use calscrape_scanner::{PageExtractor, PageHandler, SectionRecord, faculty_from_url};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Sections scraped from a list of program pages.
#[derive(Debug, Default)]
pub struct ProgramScrape {
    pub sections: Vec<SectionRecord>,
    pub pages_total: usize,
    pub pages_failed: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub skipped: usize,
    pub backfilled: usize,
}

/// Fetch every page and split it into section records, in input order.
pub async fn execute_program_scrape(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
) -> Result<ProgramScrape> {
    let extractor = Arc::new(PageExtractor::new(config.extract.clone())?);
    let batch = BatchPool::new(config, options, urls.len(), "Scraping programs")?;

    let handler: PageHandler<Vec<SectionRecord>> =
        Arc::new(move |url: &str, body: &str| extractor.extract_sections_from_html(body, url));

    let pages_total = urls.len();
    let results = batch.pool.run(urls, handler).await?;

    let mut scrape = ProgramScrape {
        pages_total,
        ..ProgramScrape::default()
    };
    for result in results {
        match result.value {
            Some(sections) => {
                info!("{}: {} sections", result.url, sections.len());
                scrape.sections.extend(sections);
            }
            None => scrape.pages_failed += 1,
        }
    }

    batch.finish(&format!("{} sections from {} pages", scrape.sections.len(), pages_total));
    Ok(scrape)
}

/// Fold freshly scraped sections into earlier output. Known
/// `(program_url, specialization_name)` pairs are skipped, and existing
/// records without a faculty get one derived from their URL.
pub fn merge_sections(
    existing: &mut Vec<SectionRecord>,
    scraped: Vec<SectionRecord>,
    faculty_marker: &str,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for record in existing.iter_mut() {
        let missing = record.faculty.as_deref().is_none_or(|faculty| faculty.trim().is_empty());
        if missing
            && let Some(faculty) = faculty_from_url(&record.program_url, faculty_marker)
        {
            record.faculty = Some(faculty);
            stats.backfilled += 1;
        }
    }

    let mut seen: HashSet<(String, String)> = existing
        .iter()
        .map(|record| (record.program_url.clone(), record.specialization_name.clone()))
        .collect();

    for record in scraped {
        let key = (record.program_url.clone(), record.specialization_name.clone());
        if seen.insert(key) {
            existing.push(record);
            stats.added += 1;
        } else {
            stats.skipped += 1;
        }
    }

    stats
}

/// Scrape, merge with whatever is already at `output` and write the result.
pub async fn run_program_batch(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
    output: &Path,
) -> Result<BatchSummary> {
    let mut records: Vec<SectionRecord> = load_existing(output)?;
    info!("Loaded {} existing sections from {}", records.len(), output.display());

    let scrape = execute_program_scrape(config, options, urls).await?;
    if scrape.pages_failed > 0 {
        warn!("{} of {} pages failed", scrape.pages_failed, scrape.pages_total);
    }

    let stats = merge_sections(&mut records, scrape.sections, &config.extract.faculty_marker);
    write_json_atomic(output, &records)?;

    Ok(BatchSummary {
        pages_total: scrape.pages_total,
        pages_failed: scrape.pages_failed,
        records_new: stats.added,
        records_skipped: stats.skipped,
        records_backfilled: stats.backfilled,
        records_total: records.len(),
        status_counts: Vec::new(),
        output: output.to_path_buf(),
    })
}
