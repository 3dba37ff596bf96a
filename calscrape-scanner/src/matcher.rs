use crate::normalize::{element_text, normalize};
use scraper::{ElementRef, Html};

/// A heading-level element plus its text in display and matching form.
#[derive(Debug, Clone)]
pub struct Heading<'a> {
    pub element: ElementRef<'a>,
    pub tag: String,
    pub text: String,
    pub normalized: String,
}

impl<'a> Heading<'a> {
    pub fn from_element(element: ElementRef<'a>) -> Self {
        let text = element_text(element);
        Self {
            element,
            tag: element.value().name().to_string(),
            normalized: normalize(&text),
            text,
        }
    }
}

/// All elements whose tag is in `tags`, in document order.
pub fn collect_headings<'a, S: AsRef<str>>(document: &'a Html, tags: &[S]) -> Vec<Heading<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| {
            let name = element.value().name();
            tags.iter().any(|tag| tag.as_ref().eq_ignore_ascii_case(name))
        })
        .map(Heading::from_element)
        .collect()
}

/// First element named `tag` in document order.
pub fn find_first_element<'a>(document: &'a Html, tag: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name().eq_ignore_ascii_case(tag))
}

/// Best heading for `target_label`: equal, containing or contained (after
/// normalization), preferring the smallest length difference. Ties go to the
/// earliest heading.
pub fn find_heading<'h, 'a>(headings: &'h [Heading<'a>], target_label: &str) -> Option<&'h Heading<'a>> {
    let target = normalize(target_label);
    if target.is_empty() {
        return None;
    }
    let target_len = target.chars().count();

    let mut best: Option<(&'h Heading<'a>, usize)> = None;
    for heading in headings {
        let text = heading.normalized.as_str();
        if text.is_empty() {
            continue;
        }
        if text != target && !text.contains(&target) && !target.contains(text) {
            continue;
        }

        let score = text.chars().count().abs_diff(target_len);
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((heading, score));
        }
    }

    best.map(|(heading, _)| heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    const TAGS: [&str; 3] = ["h2", "h3", "h4"];

    #[test]
    fn substring_match_finds_qualified_heading() {
        let html = doc("<h3>Major in Computer Science</h3><h3>Minor in Statistics</h3>");
        let headings = collect_headings(&html, &TAGS);

        let found = find_heading(&headings, "Computer Science").unwrap();
        assert_eq!(found.text, "Major in Computer Science");
    }

    #[test]
    fn smaller_length_delta_wins() {
        let html = doc(
            "<h3>Honours in Computer Science and Mathematics</h3>\
             <h3>Major in Computer Science</h3>",
        );
        let headings = collect_headings(&html, &TAGS);

        let found = find_heading(&headings, "computer science").unwrap();
        assert_eq!(found.text, "Major in Computer Science");
    }

    #[test]
    fn ties_resolve_to_first_heading() {
        let html = doc("<h3>Major in Biology</h3><h4>Minor in Biology</h4>");
        let headings = collect_headings(&html, &TAGS);

        let found = find_heading(&headings, "Biology").unwrap();
        assert_eq!(found.text, "Major in Biology");
    }

    #[test]
    fn heading_contained_in_target_matches() {
        let html = doc("<h2>Overview</h2><h3>Physics</h3>");
        let headings = collect_headings(&html, &TAGS);

        let found = find_heading(&headings, "Honours in   PHYSICS").unwrap();
        assert_eq!(found.text, "Physics");
    }

    #[test]
    fn no_match_and_empty_target_return_none() {
        let html = doc("<h3>Major in Biology</h3><h3>  </h3>");
        let headings = collect_headings(&html, &TAGS);

        assert!(find_heading(&headings, "Chemistry").is_none());
        assert!(find_heading(&headings, "   ").is_none());
    }

    #[test]
    fn collect_respects_tag_set_and_order() {
        let html = doc("<h1>Title</h1><h4>B</h4><div><h2>A</h2></div><h5>C</h5>");
        let headings = collect_headings(&html, &TAGS);

        let texts: Vec<_> = headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["B", "A"]);
        assert_eq!(headings[1].tag, "h2");
    }
}
