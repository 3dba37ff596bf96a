use serde::{Deserialize, Serialize};
use url::Url;

/// Lines of one year-of-study block. `year_label` is `None` for lines that
/// came before the first year heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_label: Option<String>,
    pub raw_lines: Vec<String>,
}

/// One program variant found on a calendar page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub program_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    pub specialization_name: String,
    #[serde(default)]
    pub years_raw: Vec<SubGroup>,
}

impl SectionRecord {
    /// Identity used when merging with earlier output.
    pub fn key(&self) -> (&str, &str) {
        (&self.program_url, &self.specialization_name)
    }

    /// Every line in order, across sub-groups.
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.years_raw
            .iter()
            .flat_map(|group| group.raw_lines.iter().map(String::as_str))
    }

    pub fn line_count(&self) -> usize {
        self.years_raw.iter().map(|group| group.raw_lines.len()).sum()
    }
}

/// Build the output record for one section.
pub fn assemble(
    section_name: &str,
    sub_groups: Vec<SubGroup>,
    page_url: &str,
    faculty_marker: &str,
) -> SectionRecord {
    SectionRecord {
        program_url: page_url.to_string(),
        faculty: faculty_from_url(page_url, faculty_marker),
        specialization_name: section_name.to_string(),
        years_raw: sub_groups,
    }
}

/// Path segment right after `marker`, e.g. `science` in
/// `/faculties-colleges-and-schools/science/...`.
pub fn faculty_from_url(page_url: &str, marker: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    segments.find(|segment| *segment == marker)?;
    segments.next().map(str::to_string)
}
