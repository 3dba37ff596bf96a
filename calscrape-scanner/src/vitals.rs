use crate::matcher::find_first_element;
use crate::normalize::element_text;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

static VITALS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#program-vitals").expect("vitals selector is valid"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").expect("li selector is valid"));
static STRONG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("strong selector is valid"));

static YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*(?:yr|yrs|year|years)").expect("years regex is valid"));
static MONTHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d.]+)\s*(?:mo|mos|month|months)").expect("months regex is valid")
});

pub const MAJOR_CREDITS: u32 = 120;
pub const HONOURS_CREDITS: u32 = 132;

/// Facts from a program page's `#program-vitals` box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramVitals {
    pub campus: Option<String>,
    pub faculty: Option<String>,
    pub degree: Option<String>,
    /// Program length in years.
    pub length: Option<f64>,
    pub co_op: Option<bool>,
    pub honours: Option<bool>,
}

/// One program variant built from the vitals box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub id: String,
    pub name: String,
    pub faculty: Option<String>,
    /// Degree name.
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "co-op")]
    pub co_op: Option<bool>,
    pub length: Option<f64>,
    pub campus: Option<String>,
    #[serde(rename = "totalCredits")]
    pub total_credits: u32,
}

/// Why a page produced no program entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingVitals {
    NoTitle,
    NoVitalsBox,
}

impl MissingVitals {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoTitle => "no_title",
            Self::NoVitalsBox => "no_vitals_box",
        }
    }
}

/// Length in years from text like "4 years", "1.5 yrs" or "16 months".
/// Months are converted and rounded to three decimals.
pub fn parse_length(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = YEARS.captures(&text) {
        return caps[1].parse::<f64>().ok();
    }
    let months = MONTHS.captures(&text)?[1].parse::<f64>().ok()?;
    Some((months / 12.0 * 1000.0).round() / 1000.0)
}

/// Read the vitals box. Items are matched by their label text; the value
/// is the item's `<strong>` text.
pub fn extract_vitals(document: &Html) -> Option<ProgramVitals> {
    let vitals = document.select(&VITALS).next()?;
    let mut info = ProgramVitals::default();

    for item in vitals.select(&ITEM) {
        let text = element_text(item);
        let value = item.select(&STRONG).next().map(element_text);
        let flag = |value: &Option<String>| value.as_ref().map(|v| v.eq_ignore_ascii_case("yes"));

        if text.contains("Campus") {
            info.campus = value;
        } else if text.contains("Faculty") {
            if let Some(value) = value {
                info.faculty = Some(value.replace("Degree:", "").trim().to_string());
            }
        } else if text.contains("Degree") {
            info.degree = value;
        } else if text.starts_with("Length") {
            if let Some(value) = value {
                info.length = parse_length(&value);
            }
        } else if text.contains("Co-op") && value.is_some() {
            info.co_op = flag(&value);
        } else if text.contains("Honours") && value.is_some() {
            info.honours = flag(&value);
        }
    }

    Some(info)
}

/// Last path segment of the page URL.
pub fn program_slug(page_url: &str) -> &str {
    page_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(page_url)
}

/// A Major entry, plus an Honours entry when the vitals say honours is
/// offered. `title` parentheticals like "(BSc)" are dropped from the name.
pub fn build_entries(page_url: &str, vitals: &ProgramVitals, title: &str) -> Vec<ProgramEntry> {
    let slug = program_slug(page_url);
    let base_name = title.split('(').next().unwrap_or(title).trim();

    let entry = |id: String, name: String, total_credits: u32| ProgramEntry {
        id,
        name,
        faculty: vitals.faculty.clone(),
        description: vitals.degree.clone(),
        requirements: Vec::new(),
        co_op: vitals.co_op,
        length: vitals.length,
        campus: vitals.campus.clone(),
        total_credits,
    };

    let mut entries = vec![entry(
        slug.to_string(),
        format!("Major in {base_name}"),
        MAJOR_CREDITS,
    )];
    if vitals.honours == Some(true) {
        entries.push(entry(
            format!("honours_{slug}"),
            format!("Honours in {base_name}"),
            HONOURS_CREDITS,
        ));
    }
    entries
}

/// Program entries for a page, from its `<h1>` title and vitals box.
pub fn extract_program_entries(
    document: &Html,
    page_url: &str,
) -> Result<Vec<ProgramEntry>, MissingVitals> {
    let title = find_first_element(document, "h1")
        .map(element_text)
        .filter(|title| !title.is_empty())
        .ok_or(MissingVitals::NoTitle)?;
    let vitals = extract_vitals(document).ok_or(MissingVitals::NoVitalsBox)?;

    let entries = build_entries(page_url, &vitals, &title);
    debug!(url = page_url, count = entries.len(), "program entries");
    Ok(entries)
}

pub fn extract_program_entries_from_html(
    html: &str,
    page_url: &str,
) -> Result<Vec<ProgramEntry>, MissingVitals> {
    extract_program_entries(&Html::parse_document(html), page_url)
}
