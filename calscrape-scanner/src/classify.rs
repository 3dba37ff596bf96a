use crate::config::ExtractConfig;
use crate::error::{Result, ScanError};
use regex::Regex;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBoundaryKind {
    YearOfStudy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionBoundary {
    /// Starts a new program variant ("Major in ...", "Honours ...").
    NewNamedSection,
    /// Starts a sub-group inside the current section.
    SubBoundary(SubBoundaryKind),
    /// Ends the current walk without starting anything.
    Terminator,
    Irrelevant,
}

/// How a walk treats headings and the end of a sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// One section among several: siblings only, any other heading stops.
    Sections,
    /// Whole page is one section: climbs out of wrappers, never stops early.
    WholePage,
}

pub struct SectionClassifier {
    prefixes: Vec<String>,
    year_patterns: Vec<Regex>,
    heading_tags: HashSet<String>,
}

impl SectionClassifier {
    pub fn new<P, Y, T>(prefixes: P, year_patterns: Y, heading_tags: T) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Y: IntoIterator,
        Y::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let year_patterns = year_patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                    ScanError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            year_patterns,
            heading_tags: heading_tags
                .into_iter()
                .map(|tag| tag.as_ref().to_ascii_lowercase())
                .collect(),
        })
    }

    /// Classifier for program pages.
    pub fn for_programs(config: &ExtractConfig) -> Result<Self> {
        Self::new(
            config.section_prefixes.iter().cloned(),
            &config.year_patterns,
            &config.heading_tags,
        )
    }

    /// Classifier for subject pages: no named sections, no years, every
    /// course heading terminates the previous course.
    pub fn for_courses(config: &ExtractConfig) -> Result<Self> {
        Self::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            &config.course_heading_tags,
        )
    }

    pub fn is_heading_tag(&self, tag: &str) -> bool {
        self.heading_tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn is_year_heading(&self, text: &str) -> bool {
        let text = text.trim();
        self.year_patterns.iter().any(|re| re.is_match(text))
    }

    pub fn is_named_section(&self, text: &str) -> bool {
        let text = text.trim();
        self.prefixes.iter().any(|prefix| text.starts_with(prefix.as_str()))
    }

    /// Classify heading text on its own. Never returns `Terminator`; that
    /// needs the walk context, see [`classify_node`](Self::classify_node).
    pub fn classify(&self, heading_text: &str) -> SectionBoundary {
        if self.is_named_section(heading_text) {
            SectionBoundary::NewNamedSection
        } else if self.is_year_heading(heading_text) {
            SectionBoundary::SubBoundary(SubBoundaryKind::YearOfStudy)
        } else {
            SectionBoundary::Irrelevant
        }
    }

    /// Classify an element met during a walk. Named sections only come from
    /// heading tags; year boundaries from any element whose whole text
    /// matches.
    pub fn classify_node(&self, tag: &str, text: &str, mode: WalkMode) -> SectionBoundary {
        let heading = self.is_heading_tag(tag);
        match self.classify(text) {
            SectionBoundary::NewNamedSection if heading => SectionBoundary::NewNamedSection,
            SectionBoundary::SubBoundary(kind) => SectionBoundary::SubBoundary(kind),
            _ if heading && mode == WalkMode::Sections => SectionBoundary::Terminator,
            _ => SectionBoundary::Irrelevant,
        }
    }
}
