use crate::batch::{BatchOptions, BatchPool};
use crate::config::AppConfig;
use crate::error::Result;
use crate::oracle::{Oracle, OracleRequest, Requirement};
use crate::report::BatchSummary;
use crate::store::{load_records, write_json_atomic};
use calscrape_scanner::{NamedSection, PageExtractor, PageHandler, SectionRecord, faculty_from_url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    /// The oracle returned structured requirements.
    Parsed,
    /// Raw lines only: no oracle, no lines, or the oracle failed.
    Unstructured,
    NoHeading,
    FetchFailed,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Unstructured => "unstructured",
            Self::NoHeading => "no_heading",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub program_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    pub specialization_name: String,
    pub requirements_raw: Vec<String>,
    #[serde(default)]
    pub requirements_parsed: Option<Vec<Requirement>>,
    pub status: RequirementStatus,
}

impl RequirementRecord {
    fn from_section(section: &SectionRecord, faculty_marker: &str) -> Self {
        Self {
            program_url: section.program_url.clone(),
            faculty: section
                .faculty
                .clone()
                .filter(|faculty| !faculty.trim().is_empty())
                .or_else(|| faculty_from_url(&section.program_url, faculty_marker)),
            specialization_name: section.specialization_name.clone(),
            requirements_raw: Vec::new(),
            requirements_parsed: None,
            status: RequirementStatus::FetchFailed,
        }
    }
}

/// Distinct URLs in first-seen order, each with the section names wanted
/// from it.
pub fn group_by_url(sections: &[SectionRecord]) -> (Vec<String>, HashMap<String, Vec<String>>) {
    let mut order = Vec::new();
    let mut names: HashMap<String, Vec<String>> = HashMap::new();
    for section in sections {
        let wanted = names.entry(section.program_url.clone()).or_insert_with(|| {
            order.push(section.program_url.clone());
            Vec::new()
        });
        if !wanted.contains(&section.specialization_name) {
            wanted.push(section.specialization_name.clone());
        }
    }
    (order, names)
}

/// Re-fetch each program page once, cut out every requested section and,
/// when an oracle is given, structure the lines. Output follows input order.
pub async fn execute_requirement_scrape(
    config: &AppConfig,
    options: &BatchOptions,
    sections: &[SectionRecord],
    oracle: Option<&Oracle>,
) -> Result<(Vec<RequirementRecord>, usize)> {
    let extractor = Arc::new(PageExtractor::new(config.extract.clone())?);
    let (urls, names) = group_by_url(sections);
    let names = Arc::new(names);
    let batch = BatchPool::new(config, options, urls.len(), "Scraping requirements")?;

    let handler: PageHandler<HashMap<String, NamedSection>> = Arc::new(move |url: &str, body: &str| {
        let wanted = names.get(url).map(Vec::as_slice).unwrap_or_default();
        extractor
            .extract_named_sections_from_html(body, url, wanted)
            .into_iter()
            .map(|found| (found.record.specialization_name.clone(), found))
            .collect()
    });

    let pages_total = urls.len();
    let results = batch.pool.run(urls, handler).await?;
    let pages_failed = results.iter().filter(|result| !result.is_ok()).count();
    let pages: HashMap<String, HashMap<String, NamedSection>> = results
        .into_iter()
        .filter_map(|result| result.value.map(|value| (result.url, value)))
        .collect();
    batch.finish(&format!("{} pages fetched", pages_total - pages_failed));

    let mut records = Vec::with_capacity(sections.len());
    for section in sections {
        let mut record = RequirementRecord::from_section(section, &config.extract.faculty_marker);

        let found = pages
            .get(&section.program_url)
            .and_then(|page| page.get(&section.specialization_name));
        let Some(found) = found else {
            records.push(record);
            continue;
        };

        if !found.found() {
            debug!("No heading for {} on {}", section.specialization_name, section.program_url);
            record.status = RequirementStatus::NoHeading;
            records.push(record);
            continue;
        }

        record.requirements_raw = found.record.raw_lines().map(str::to_string).collect();
        record.status = RequirementStatus::Unstructured;

        if let Some(oracle) = oracle
            && !record.requirements_raw.is_empty()
        {
            let request = OracleRequest {
                program_url: &record.program_url,
                specialization_name: &record.specialization_name,
                faculty: record.faculty.as_deref(),
                requirements_raw: &record.requirements_raw,
            };
            match oracle.structure(&request).await {
                Ok(parsed) => {
                    record.requirements_parsed = Some(parsed);
                    record.status = RequirementStatus::Parsed;
                }
                Err(e) => warn!("Oracle failed for {}: {}", record.specialization_name, e),
            }
        }

        records.push(record);
    }

    info!("Built {} requirement records", records.len());
    Ok((records, pages_failed))
}

/// Read sections from `input`, scrape their requirements and write them to
/// `output`.
pub async fn run_requirement_batch(
    config: &AppConfig,
    options: &BatchOptions,
    input: &Path,
    output: &Path,
    oracle: Option<&Oracle>,
) -> Result<BatchSummary> {
    let sections: Vec<SectionRecord> = load_records(input)?;
    let pages_total = group_by_url(&sections).0.len();

    let (records, pages_failed) = execute_requirement_scrape(config, options, &sections, oracle).await?;
    write_json_atomic(output, &records)?;

    let mut summary = BatchSummary {
        pages_total,
        pages_failed,
        records_new: records.len(),
        records_total: records.len(),
        output: output.to_path_buf(),
        ..BatchSummary::default()
    };
    for record in &records {
        summary.count_status(record.status.as_str());
    }
    Ok(summary)
}
