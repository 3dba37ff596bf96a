use scraper::ElementRef;
use std::collections::HashSet;

/// Collapse every whitespace run (newlines, tabs, nbsp) to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matching form of a string: collapsed and lower-cased. Idempotent.
pub fn normalize(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

/// Flattened text of an element, text nodes joined by a single space.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Admits lines that are long enough and not yet seen in the current block.
#[derive(Debug, Default)]
pub struct LineFilter {
    seen: HashSet<String>,
    min_chars: usize,
}

impl LineFilter {
    pub fn new(min_chars: usize) -> Self {
        Self {
            seen: HashSet::new(),
            min_chars,
        }
    }

    pub fn admit(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.chars().count() < self.min_chars || self.seen.contains(line) {
            return None;
        }
        self.seen.insert(line.to_string());
        Some(line.to_string())
    }
}

/// Drop short lines and exact duplicates, keeping the first occurrence.
pub fn dedup_lines<I, S>(lines: I, min_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut filter = LineFilter::new(min_chars);
    lines
        .into_iter()
        .filter_map(|line| filter.admit(line.as_ref()))
        .collect()
}
