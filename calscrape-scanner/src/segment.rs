use crate::classify::{SectionBoundary, SectionClassifier, WalkMode};
use crate::config::ExtractConfig;
use crate::normalize::{LineFilter, dedup_lines, element_text};
use crate::record::SubGroup;
use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Node};
use std::collections::{HashSet, VecDeque};

/// Tags whose whole flattened text is one line.
const CONTAINER_TAGS: [&str; 8] = [
    "p",
    "div",
    "section",
    "article",
    "blockquote",
    "li",
    "dd",
    "dt",
];

/// Tags a whole-page walk never descends into: non-content and site chrome.
const OPAQUE_TAGS: [&str; 8] = [
    "script", "style", "noscript", "template", "svg", "nav", "aside", "footer",
];

/// Where a walk begins.
#[derive(Clone, Copy)]
pub enum Start<'a> {
    /// Begin with the node following this one (the usual case: a heading).
    After(NodeRef<'a, Node>),
    /// Begin with this node itself.
    At(NodeRef<'a, Node>),
}

/// One emitted line. `group` increases at every sub-boundary, so two
/// sub-groups with the same label stay apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLine {
    pub group: usize,
    pub label: Option<String>,
    pub text: String,
}

pub struct Segmenter<'c> {
    classifier: &'c SectionClassifier,
    cell_separator: String,
    min_line_chars: usize,
    keep_ungrouped: bool,
}

impl<'c> Segmenter<'c> {
    pub fn new(classifier: &'c SectionClassifier, config: &ExtractConfig) -> Self {
        Self {
            classifier,
            cell_separator: config.cell_separator.clone(),
            min_line_chars: config.min_line_chars,
            keep_ungrouped: config.keep_ungrouped,
        }
    }

    pub fn with_ungrouped(mut self, keep_ungrouped: bool) -> Self {
        self.keep_ungrouped = keep_ungrouped;
        self
    }

    /// Lazy walk from `start`. Nothing is read until the iterator is polled.
    pub fn walk<'a>(&self, start: Start<'a>, mode: WalkMode) -> Segments<'a, '_> {
        let (cursor, visited) = match start {
            Start::At(node) => (Some(node), HashSet::new()),
            Start::After(node) => {
                let mut visited = HashSet::new();
                visited.insert(node.id());
                (advance(node, mode), visited)
            }
        };

        Segments {
            classifier: self.classifier,
            cell_separator: &self.cell_separator,
            mode,
            cursor,
            visited,
            group: 0,
            label: None,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Walk and fold into cleaned sub-groups.
    pub fn segment(&self, start: Start<'_>, mode: WalkMode) -> Vec<SubGroup> {
        collect_groups(self.walk(start, mode), self.min_line_chars, self.keep_ungrouped)
    }

    /// Walk and keep only the cleaned lines, ignoring sub-group structure.
    pub fn lines(&self, start: Start<'_>, mode: WalkMode) -> Vec<String> {
        dedup_lines(self.walk(start, mode).map(|line| line.text), self.min_line_chars)
    }
}

pub struct Segments<'a, 'c> {
    classifier: &'c SectionClassifier,
    cell_separator: &'c str,
    mode: WalkMode,
    cursor: Option<NodeRef<'a, Node>>,
    visited: HashSet<NodeId>,
    group: usize,
    label: Option<String>,
    pending: VecDeque<String>,
    done: bool,
}

impl<'a> Segments<'a, '_> {
    /// Handle one element. Returns true when a whole-page walk should step
    /// into the element's children instead of over it.
    fn visit(&mut self, element: ElementRef<'a>) -> bool {
        let tag = element.value().name();
        let text = element_text(element);

        match self.classifier.classify_node(tag, &text, self.mode) {
            SectionBoundary::NewNamedSection | SectionBoundary::Terminator
                if self.mode == WalkMode::Sections =>
            {
                self.done = true;
                return false;
            }
            SectionBoundary::SubBoundary(_) => {
                self.group += 1;
                self.label = Some(text);
                return false;
            }
            _ => {}
        }

        if self.classifier.is_heading_tag(tag) {
            return false;
        }

        match tag {
            "ul" | "ol" => {
                for item in element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "li")
                {
                    self.push(element_text(item));
                }
            }
            "table" => {
                for row in element
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|node| node.value().name() == "tr")
                {
                    let cells: Vec<String> = row
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                        .map(element_text)
                        .filter(|cell| !cell.is_empty())
                        .collect();
                    self.push(cells.join(self.cell_separator));
                }
            }
            tag if CONTAINER_TAGS.contains(&tag) => self.push(text),
            tag => {
                return self.mode == WalkMode::WholePage && !OPAQUE_TAGS.contains(&tag);
            }
        }
        false
    }

    fn push(&mut self, line: String) {
        if !line.is_empty() {
            self.pending.push_back(line);
        }
    }
}

impl Iterator for Segments<'_, '_> {
    type Item = SegmentLine;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(text) = self.pending.pop_front() {
                return Some(SegmentLine {
                    group: self.group,
                    label: self.label.clone(),
                    text,
                });
            }
            if self.done {
                return None;
            }

            let Some(node) = self.cursor else {
                self.done = true;
                continue;
            };
            self.cursor = advance(node, self.mode);

            if !self.visited.insert(node.id()) {
                self.done = true;
                continue;
            }
            if let Some(element) = ElementRef::wrap(node)
                && self.visit(element)
                && let Some(child) = node.first_child()
            {
                self.cursor = Some(child);
            }
        }
    }
}

/// Next node in walk order. Section walks stay among siblings; whole-page
/// walks continue with the nearest ancestor's next sibling, which also
/// brings a walk back out of a wrapper it stepped into.
fn advance<'a>(node: NodeRef<'a, Node>, mode: WalkMode) -> Option<NodeRef<'a, Node>> {
    if let Some(sibling) = node.next_sibling() {
        return Some(sibling);
    }
    if mode == WalkMode::Sections {
        return None;
    }

    let mut ancestor = node.parent();
    while let Some(parent) = ancestor {
        if let Some(sibling) = parent.next_sibling() {
            return Some(sibling);
        }
        ancestor = parent.parent();
    }
    None
}

/// Fold a walk into sub-groups: short lines and repeats within the block
/// are dropped, groups left empty are discarded, and lines before the first
/// sub-boundary form an unlabelled group only when `keep_ungrouped` is set.
pub fn collect_groups<I>(segments: I, min_chars: usize, keep_ungrouped: bool) -> Vec<SubGroup>
where
    I: IntoIterator<Item = SegmentLine>,
{
    let mut filter = LineFilter::new(min_chars);
    let mut groups: Vec<(usize, SubGroup)> = Vec::new();

    for line in segments {
        if line.label.is_none() && !keep_ungrouped {
            continue;
        }
        let Some(text) = filter.admit(&line.text) else {
            continue;
        };

        match groups.last_mut() {
            Some((group, sub_group)) if *group == line.group => sub_group.raw_lines.push(text),
            _ => groups.push((
                line.group,
                SubGroup {
                    year_label: line.label,
                    raw_lines: vec![text],
                },
            )),
        }
    }

    groups.into_iter().map(|(_, sub_group)| sub_group).collect()
}
