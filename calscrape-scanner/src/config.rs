use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};

/// Tunables for one page family. Every matcher, classifier and segmenter is
/// built from this value, so a different calendar site only needs a
/// different config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Heading tags that delimit sections on program pages.
    pub heading_tags: Vec<String>,
    /// Heading tags that introduce a course entry on subject pages.
    pub course_heading_tags: Vec<String>,
    /// Tag holding the page title for the whole-page fallback.
    pub title_tag: String,
    /// Name used when a page has neither a title node nor a `<title>`.
    pub fallback_name: String,
    /// Literal prefixes that mark a heading as a new named section.
    pub section_prefixes: Vec<String>,
    /// Whole-text regexes for year-of-study headings. Anchored on compile.
    pub year_patterns: Vec<String>,
    /// Path segment preceding the faculty slug in program URLs.
    pub faculty_marker: String,
    pub cell_separator: String,
    pub min_line_chars: usize,
    /// Keep lines seen before the first year heading as an unlabelled group.
    pub keep_ungrouped: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            heading_tags: strings(&["h2", "h3", "h4"]),
            course_heading_tags: strings(&["h3"]),
            title_tag: "h1".to_string(),
            fallback_name: "Program".to_string(),
            section_prefixes: strings(&[
                "Major",
                "Honours",
                "Combined Major",
                "Combined Honours",
                "Minor",
                "Specialization",
                "Specializations",
                "Major Programs",
                "Honours Programs",
            ]),
            year_patterns: strings(&[
                "First Year",
                "Second Year",
                "Third Year",
                "Fourth Year",
                "Third and Fourth Years",
                "Years 2 and 3",
                "Fourth and Fifth Years",
                "First-Year Curriculum",
                "First Year Curriculum",
                "Second Year Program",
                "Third Year Program",
                "Fourth Year Program",
            ]),
            faculty_marker: "faculties-colleges-and-schools".to_string(),
            cell_separator: " | ".to_string(),
            min_line_chars: 3,
            keep_ungrouped: true,
        }
    }
}

impl ExtractConfig {
    /// Reject configs that would make every walk degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.heading_tags.is_empty() {
            return Err(ScanError::InvalidConfig(
                "heading_tags must name at least one tag".to_string(),
            ));
        }
        if self.course_heading_tags.is_empty() {
            return Err(ScanError::InvalidConfig(
                "course_heading_tags must name at least one tag".to_string(),
            ));
        }
        if self.title_tag.trim().is_empty() {
            return Err(ScanError::InvalidConfig("title_tag is empty".to_string()));
        }
        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
