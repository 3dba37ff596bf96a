use crate::classify::{SectionBoundary, SectionClassifier, WalkMode};
use crate::config::ExtractConfig;
use crate::course::CourseRecord;
use crate::error::Result;
use crate::matcher::{Heading, collect_headings, find_first_element, find_heading};
use crate::normalize::element_text;
use crate::record::{SectionRecord, assemble};
use crate::segment::{Segmenter, Start};
use scraper::Html;
use tracing::debug;

/// Result of looking up one section by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSection {
    pub record: SectionRecord,
    /// Text of the heading the name resolved to, if any.
    pub matched_heading: Option<String>,
}

impl NamedSection {
    pub fn found(&self) -> bool {
        self.matched_heading.is_some()
    }
}

/// Turns parsed pages into records. Built once per batch from an
/// [`ExtractConfig`] and shared by every worker.
pub struct PageExtractor {
    config: ExtractConfig,
    classifier: SectionClassifier,
    course_classifier: SectionClassifier,
}

impl PageExtractor {
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        let classifier = SectionClassifier::for_programs(&config)?;
        let course_classifier = SectionClassifier::for_courses(&config)?;
        Ok(Self {
            config,
            classifier,
            course_classifier,
        })
    }

    /// One record per named section heading, or one record for the whole
    /// page when it has none.
    pub fn extract_sections(&self, document: &Html, page_url: &str) -> Vec<SectionRecord> {
        let segmenter = Segmenter::new(&self.classifier, &self.config);
        let headings = collect_headings(document, &self.config.heading_tags);

        let sections: Vec<&Heading<'_>> = headings
            .iter()
            .filter(|heading| {
                self.classifier.classify(&heading.text) == SectionBoundary::NewNamedSection
            })
            .collect();

        if sections.is_empty() {
            debug!(url = page_url, "no named sections, using whole page");
            return vec![self.whole_page(document, page_url, &segmenter)];
        }

        sections
            .into_iter()
            .map(|heading| {
                let groups = segmenter.segment(Start::After(*heading.element), WalkMode::Sections);
                assemble(&heading.text, groups, page_url, &self.config.faculty_marker)
            })
            .collect()
    }

    pub fn extract_sections_from_html(&self, html: &str, page_url: &str) -> Vec<SectionRecord> {
        self.extract_sections(&Html::parse_document(html), page_url)
    }

    fn whole_page(&self, document: &Html, page_url: &str, segmenter: &Segmenter<'_>) -> SectionRecord {
        let title = find_first_element(document, &self.config.title_tag)
            .filter(|element| !element_text(*element).is_empty());

        let name = title
            .or_else(|| find_first_element(document, "title"))
            .map(element_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.config.fallback_name.clone());

        let start = match title {
            Some(element) => Some(Start::After(*element)),
            None => match find_first_element(document, "body") {
                Some(body) => body.first_child().map(Start::At),
                None => Some(Start::At(*document.root_element())),
            },
        };

        let groups = start
            .map(|start| segmenter.segment(start, WalkMode::WholePage))
            .unwrap_or_default();
        assemble(&name, groups, page_url, &self.config.faculty_marker)
    }

    /// Section for a caller-supplied name. Lines before the first year
    /// heading are always kept here. No match is not an error: the record
    /// just has no lines.
    pub fn extract_named_section(&self, document: &Html, page_url: &str, name: &str) -> NamedSection {
        let headings = collect_headings(document, &self.config.heading_tags);
        let Some(heading) = find_heading(&headings, name) else {
            debug!(url = page_url, section = name, "no heading matches");
            return NamedSection {
                record: assemble(name, Vec::new(), page_url, &self.config.faculty_marker),
                matched_heading: None,
            };
        };

        let groups = Segmenter::new(&self.classifier, &self.config)
            .with_ungrouped(true)
            .segment(Start::After(*heading.element), WalkMode::Sections);

        NamedSection {
            record: assemble(name, groups, page_url, &self.config.faculty_marker),
            matched_heading: Some(heading.text.clone()),
        }
    }

    /// [`extract_named_section`](Self::extract_named_section) for several
    /// names on one page, parsing it once.
    pub fn extract_named_sections_from_html<S: AsRef<str>>(
        &self,
        html: &str,
        page_url: &str,
        names: &[S],
    ) -> Vec<NamedSection> {
        let document = Html::parse_document(html);
        names
            .iter()
            .map(|name| self.extract_named_section(&document, page_url, name.as_ref()))
            .collect()
    }

    /// Course entries of a subject page, in page order.
    pub fn extract_courses(&self, document: &Html) -> Vec<CourseRecord> {
        let segmenter = Segmenter::new(&self.course_classifier, &self.config);

        collect_headings(document, &self.config.course_heading_tags)
            .iter()
            .filter(|heading| heading.text.chars().any(|c| c.is_ascii_digit()))
            .filter_map(|heading| {
                let lines = segmenter.lines(Start::After(*heading.element), WalkMode::Sections);
                CourseRecord::from_block(&heading.text, &lines)
            })
            .collect()
    }

    pub fn extract_courses_from_html(&self, html: &str) -> Vec<CourseRecord> {
        self.extract_courses(&Html::parse_document(html))
    }
}
