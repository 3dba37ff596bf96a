// End-to-end segmentation tests through the public API

use calscrape_scanner::{
    ExtractConfig, PageExtractor, SectionClassifier, Segmenter, Start, SubGroup, WalkMode,
    collect_headings, find_heading,
};
use calscrape_scanner::normalize::normalize;
use scraper::Html;

const URL: &str = "https://www.calendar.ubc.ca/vancouver/faculties-colleges-and-schools/science/bachelor-science/computer-science";

fn extractor() -> PageExtractor {
    PageExtractor::new(ExtractConfig::default()).unwrap()
}

fn page(body: &str) -> String {
    format!("<html><head><title>UBC Calendar</title></head><body>{body}</body></html>")
}

// ============================================================================
// Normalizer Tests
// ============================================================================

#[test]
fn test_normalize_idempotent_on_calendar_text() {
    for s in ["Third\u{a0}and Fourth  Years", "\n  MAJOR in CPSC\t", ""] {
        assert_eq!(normalize(&normalize(s)), normalize(s));
    }
}

// ============================================================================
// Heading Matcher Tests
// ============================================================================

#[test]
fn test_heading_match_prefers_containing_heading() {
    let html = Html::parse_document(&page(
        "<h3>Major in Computer Science</h3><h3>Minor in Statistics</h3>",
    ));
    let headings = collect_headings(&html, &["h2", "h3", "h4"]);

    let found = find_heading(&headings, "Computer Science").unwrap();
    assert_eq!(found.text, "Major in Computer Science");
}

// ============================================================================
// Segmenter Tests
// ============================================================================

#[test]
fn test_section_boundary_does_not_consume_next_section() {
    let html = Html::parse_document(&page(
        "<h3>Major in X</h3><h4>First Year</h4><p>line1</p><h3>Major in Y</h3><p>line2</p>",
    ));
    let config = ExtractConfig::default();
    let classifier = SectionClassifier::for_programs(&config).unwrap();
    let segmenter = Segmenter::new(&classifier, &config);
    let headings = collect_headings(&html, &config.heading_tags);

    let x = headings.iter().find(|h| h.text == "Major in X").unwrap();
    let groups = segmenter.segment(Start::After(*x.element), WalkMode::Sections);
    assert_eq!(
        groups,
        vec![SubGroup {
            year_label: Some("First Year".to_string()),
            raw_lines: vec!["line1".to_string()],
        }]
    );

    // "Major in Y" is still available as its own section.
    let records = extractor().extract_sections(&html, URL);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].specialization_name, "Major in Y");
    assert_eq!(records[1].raw_lines().collect::<Vec<_>>(), vec!["line2"]);
}

#[test]
fn test_table_rows_flatten_with_separator() {
    let html = page(
        "<h3>Major in Computer Science</h3><h4>First Year</h4>\
         <table><tr><td>CPSC 110</td><td></td><td>3</td></tr>\
         <tr><td>MATH 100</td><td></td><td>3</td></tr></table>",
    );
    let records = extractor().extract_sections_from_html(&html, URL);

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].years_raw[0].raw_lines,
        vec!["CPSC 110 | 3", "MATH 100 | 3"]
    );
}

#[test]
fn test_custom_separator_and_min_length() {
    let config = ExtractConfig {
        cell_separator: "; ".to_string(),
        min_line_chars: 8,
        ..ExtractConfig::default()
    };
    let html = page(
        "<h3>Major in X</h3><table><tr><td>CPSC 110</td><td>3</td></tr></table><p>Short</p>",
    );
    let records = PageExtractor::new(config)
        .unwrap()
        .extract_sections_from_html(&html, URL);

    assert_eq!(records[0].raw_lines().collect::<Vec<_>>(), vec!["CPSC 110; 3"]);
}

// ============================================================================
// Strategy Tests
// ============================================================================

#[test]
fn test_fallback_record_for_page_without_sections() {
    let html = page("<h1>Bachelor of Arts</h1><p>120 credits required</p>");
    let records = extractor().extract_sections_from_html(&html, URL);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.specialization_name, "Bachelor of Arts");
    assert_eq!(record.faculty.as_deref(), Some("science"));
    assert_eq!(record.years_raw.len(), 1);
    assert_eq!(record.years_raw[0].year_label, None);
    assert_eq!(record.years_raw[0].raw_lines, vec!["120 credits required"]);
}

#[test]
fn test_fallback_drops_ungrouped_lines_when_configured() {
    let config = ExtractConfig {
        keep_ungrouped: false,
        ..ExtractConfig::default()
    };
    let html = page(
        "<h1>Bachelor of Arts</h1><p>120 credits required</p>\
         <h3>First Year</h3><p>ENGL 100</p>",
    );
    let records = PageExtractor::new(config)
        .unwrap()
        .extract_sections_from_html(&html, URL);

    assert_eq!(records[0].years_raw.len(), 1);
    assert_eq!(records[0].years_raw[0].year_label.as_deref(), Some("First Year"));
    assert_eq!(records[0].years_raw[0].raw_lines, vec!["ENGL 100"]);
}

#[test]
fn test_custom_heading_tags() {
    let config = ExtractConfig {
        heading_tags: vec!["h5".to_string()],
        ..ExtractConfig::default()
    };
    let html = page("<h5>Major in Geology</h5><p>EOSC 110</p><h3>Major in Ignored</h3><p>x y z</p>");
    let records = PageExtractor::new(config)
        .unwrap()
        .extract_sections_from_html(&html, URL);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].specialization_name, "Major in Geology");
    assert_eq!(
        records[0].raw_lines().collect::<Vec<_>>(),
        vec!["EOSC 110", "x y z"]
    );
}

#[test]
fn test_sections_serialize_to_output_shape() {
    let html = page("<h3>Major in X</h3><h4>First Year</h4><p>MATH 100</p>");
    let records = extractor().extract_sections_from_html(&html, "https://x.edu/programs/x");

    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "program_url": "https://x.edu/programs/x",
            "specialization_name": "Major in X",
            "years_raw": [{ "year_label": "First Year", "raw_lines": ["MATH 100"] }]
        }])
    );
}

// ============================================================================
// Course Tests
// ============================================================================

#[test]
fn test_course_page_extraction() {
    let html = page(
        "<h3>MATH_V 100 (3) Differential Calculus with Applications</h3>\
         <p>Derivatives of elementary functions.</p>\
         <p>Prerequisite: High-school calculus.</p>\
         <h3>MATH_V 101 (3) Integral Calculus</h3><p>Integration.</p>",
    );
    let courses = extractor().extract_courses_from_html(&html);

    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].code(), "MATH_V 100");
    assert_eq!(courses[0].prerequisite_raw.as_deref(), Some("High-school calculus."));
    assert_eq!(courses[1].description, "Integration.");
    assert_eq!(courses[1].prerequisite_raw, None);
}
