use crate::batch::{BatchOptions, BatchPool};
use crate::config::AppConfig;
use crate::error::Result;
use crate::report::BatchSummary;
use crate::store::write_courses_csv;
use calscrape_scanner::{CourseRecord, PageExtractor, PageHandler};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct CourseScrape {
    pub courses: Vec<CourseRecord>,
    pub pages_total: usize,
    pub pages_failed: usize,
}

/// Fetch subject pages and pull out their course entries, in input order.
pub async fn execute_course_scrape(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
) -> Result<CourseScrape> {
    let extractor = Arc::new(PageExtractor::new(config.extract.clone())?);
    let batch = BatchPool::new(config, options, urls.len(), "Scraping courses")?;

    let handler: PageHandler<Vec<CourseRecord>> =
        Arc::new(move |_url: &str, body: &str| extractor.extract_courses_from_html(body));

    let pages_total = urls.len();
    let results = batch.pool.run(urls, handler).await?;

    let mut scrape = CourseScrape {
        pages_total,
        ..CourseScrape::default()
    };
    for result in results {
        match result.value {
            Some(courses) => {
                info!("{}: {} courses", result.url, courses.len());
                scrape.courses.extend(courses);
            }
            None => scrape.pages_failed += 1,
        }
    }

    batch.finish(&format!("{} courses from {} pages", scrape.courses.len(), pages_total));
    Ok(scrape)
}

pub async fn run_course_batch(
    config: &AppConfig,
    options: &BatchOptions,
    urls: Vec<String>,
    output: &Path,
) -> Result<BatchSummary> {
    let scrape = execute_course_scrape(config, options, urls).await?;
    write_courses_csv(output, &scrape.courses)?;

    Ok(BatchSummary {
        pages_total: scrape.pages_total,
        pages_failed: scrape.pages_failed,
        records_new: scrape.courses.len(),
        records_total: scrape.courses.len(),
        output: output.to_path_buf(),
        ..BatchSummary::default()
    })
}
