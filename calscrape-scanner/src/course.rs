use crate::normalize::collapse_whitespace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `CPSC_V 110 (4) Computation, Programs, and Programming`
static COURSE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+)(_V)?\s+(\d+[A-Z]?)\s+\(([\d.]+(?:-[\d.]+)?)\)\s+(.*)$")
        .expect("course heading regex is valid")
});

const PREREQUISITE: &str = "Prerequisite:";
const COREQUISITE: &str = "Corequisite:";
const EXCLUSION_PHRASES: [&str; 2] = [
    "Credit will only be granted for one of",
    "Credit will be granted for only one of",
];

/// Fields of a course heading. A heading the pattern cannot read keeps its
/// whole text as `title` with everything else empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CourseHeading {
    pub subject: Option<String>,
    pub campus_suffix: Option<String>,
    pub number: Option<String>,
    pub credits: Option<String>,
    pub title: String,
}

pub fn parse_course_heading(text: &str) -> CourseHeading {
    let text = collapse_whitespace(text);
    let Some(caps) = COURSE_HEADING.captures(&text) else {
        return CourseHeading {
            title: text,
            ..CourseHeading::default()
        };
    };

    let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
    CourseHeading {
        subject: group(1),
        campus_suffix: group(2),
        number: group(3),
        credits: group(4),
        title: group(5).unwrap_or_default(),
    }
}

/// One row of the course CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub subject: Option<String>,
    pub campus_suffix: Option<String>,
    pub course_number: Option<String>,
    pub credits: Option<String>,
    pub title: String,
    pub description: String,
    pub prerequisite_raw: Option<String>,
    pub corequisite_raw: Option<String>,
    pub exclusion_raw: Option<String>,
}

impl CourseRecord {
    /// Build a record from a course heading and its block lines. Returns
    /// `None` when the heading carries no course number.
    pub fn from_block<S: AsRef<str>>(heading_text: &str, lines: &[S]) -> Option<Self> {
        let heading = parse_course_heading(heading_text);
        let course_number = heading.number?;

        let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        Some(Self {
            subject: heading.subject,
            campus_suffix: heading.campus_suffix,
            course_number: Some(course_number),
            credits: heading.credits,
            title: heading.title,
            description: lines.join(" "),
            prerequisite_raw: text_after_last(&lines, PREREQUISITE),
            corequisite_raw: text_after_last(&lines, COREQUISITE),
            exclusion_raw: lines
                .iter()
                .rev()
                .find(|line| EXCLUSION_PHRASES.iter().any(|phrase| line.contains(phrase)))
                .map(|line| line.to_string()),
        })
    }

    pub fn code(&self) -> String {
        format!(
            "{}{} {}",
            self.subject.as_deref().unwrap_or_default(),
            self.campus_suffix.as_deref().unwrap_or_default(),
            self.course_number.as_deref().unwrap_or_default()
        )
    }
}

/// Trimmed text after `marker` in the last line containing it.
fn text_after_last(lines: &[&str], marker: &str) -> Option<String> {
    lines.iter().rev().find_map(|line| {
        line.find(marker)
            .map(|at| line[at + marker.len()..].trim().to_string())
    })
}
