// Tests for the program, course and requirement batch jobs

use calscrape_core::batch::{BatchOptions, BatchPool};
use calscrape_core::config::AppConfig;
use calscrape_core::courses::run_course_batch;
use calscrape_core::oracle::Oracle;
use calscrape_core::programs::{merge_sections, run_program_batch};
use calscrape_core::requirements::{group_by_url, run_requirement_batch};
use calscrape_core::store::{load_records, write_json_atomic};
use calscrape_core::vitals::run_vitals_batch;
use calscrape_core::{RequirementRecord, RequirementStatus};
use calscrape_scanner::{PageHandler, ProgramEntry, SectionRecord};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROGRAM_PAGE: &str = "<html><body><h1>Bachelor of Science</h1>\
    <h3>Major in Computer Science</h3><h4>First Year</h4><p>CPSC 110</p><p>MATH 100</p>\
    <h4>Second Year</h4><table><tr><td>CPSC 210</td><td>4</td></tr></table>\
    <h3>Honours in Computer Science</h3><p>CPSC 449</p>\
    </body></html>";

const VITALS_PAGE: &str = "<html><body><h1>Computer Science (BSc)</h1>\
    <div id=\"program-vitals\"><ul>\
    <li>Campus: <strong>Vancouver</strong></li>\
    <li>Faculty: <strong>Faculty of Science</strong></li>\
    <li>Length: <strong>4 years</strong></li>\
    <li>Honours: <strong>Yes</strong></li>\
    </ul></div></body></html>";

const COURSE_PAGE: &str = "<html><body>\
    <h3>CPSC_V 110 (4) Computation, Programs, and Programming</h3><p>Fundamental design.</p>\
    <h3>CPSC_V 121 (4) Models of Computation</h3><p>Logic and proof.</p><p>Corequisite: CPSC 110.</p>\
    </body></html>";

fn options() -> BatchOptions {
    BatchOptions {
        workers: 2,
        delay: Duration::ZERO,
        show_progress_bars: false,
    }
}

fn section(url: &str, name: &str, faculty: Option<&str>) -> SectionRecord {
    SectionRecord {
        program_url: url.to_string(),
        faculty: faculty.map(str::to_string),
        specialization_name: name.to_string(),
        years_raw: Vec::new(),
    }
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_skips_known_sections_and_backfills_faculty() {
    let marker = "faculties-colleges-and-schools";
    let url = "https://x.edu/faculties-colleges-and-schools/science/cs";
    let mut existing = vec![
        section(url, "Major in Computer Science", None),
        section(url, "Minor in Computer Science", Some("  ")),
        section("https://x.edu/other", "Major in Art", None),
    ];

    let stats = merge_sections(
        &mut existing,
        vec![
            section(url, "Major in Computer Science", Some("science")),
            section(url, "Honours in Computer Science", Some("science")),
        ],
        marker,
    );

    assert_eq!(stats.added, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.backfilled, 2);
    assert_eq!(existing.len(), 4);
    assert_eq!(existing[0].faculty.as_deref(), Some("science"));
    assert_eq!(existing[1].faculty.as_deref(), Some("science"));
    assert_eq!(existing[2].faculty, None);
    assert_eq!(existing[3].specialization_name, "Honours in Computer Science");
}

// ============================================================================
// Program Batch Tests
// ============================================================================

#[tokio::test]
async fn test_program_batch_writes_and_merges() {
    let server = MockServer::start().await;
    serve(&server, "/faculties-colleges-and-schools/science/cs", PROGRAM_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("sections.json");
    let page_url = format!("{}/faculties-colleges-and-schools/science/cs", server.uri());
    let urls = vec![page_url.clone(), format!("{}/broken", server.uri())];

    let summary = run_program_batch(&AppConfig::default(), &options(), urls.clone(), &output)
        .await
        .unwrap();

    assert_eq!(summary.pages_total, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.records_new, 2);
    assert_eq!(summary.records_total, 2);

    let written: Vec<SectionRecord> = load_records(&output).unwrap();
    assert_eq!(written[0].specialization_name, "Major in Computer Science");
    assert_eq!(written[0].faculty.as_deref(), Some("science"));
    assert_eq!(written[0].years_raw.len(), 2);
    assert_eq!(written[0].years_raw[1].raw_lines, vec!["CPSC 210 | 4"]);
    assert_eq!(written[1].raw_lines().collect::<Vec<_>>(), vec!["CPSC 449"]);

    // A second run only reports duplicates.
    let again = run_program_batch(&AppConfig::default(), &options(), urls, &output)
        .await
        .unwrap();
    assert_eq!(again.records_new, 0);
    assert_eq!(again.records_skipped, 2);
    assert_eq!(again.records_total, 2);
}

// ============================================================================
// Course Batch Tests
// ============================================================================

#[tokio::test]
async fn test_course_batch_writes_csv() {
    let server = MockServer::start().await;
    serve(&server, "/courses/CPSC", COURSE_PAGE).await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("courses.csv");

    let summary = run_course_batch(
        &AppConfig::default(),
        &options(),
        vec![format!("{}/courses/CPSC", server.uri())],
        &output,
    )
    .await
    .unwrap();

    assert_eq!(summary.records_total, 2);
    let csv = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("CPSC,_V,110,4,"));
    assert!(rows[2].ends_with(",CPSC 110.,"));
}

// ============================================================================
// Requirement Batch Tests
// ============================================================================

#[test]
fn test_group_by_url_keeps_first_seen_order() {
    let sections = vec![
        section("b", "Major", None),
        section("a", "Minor", None),
        section("b", "Honours", None),
        section("b", "Major", None),
    ];
    let (urls, names) = group_by_url(&sections);

    assert_eq!(urls, vec!["b", "a"]);
    assert_eq!(names["b"], vec!["Major", "Honours"]);
}

#[tokio::test]
async fn test_requirement_batch_statuses_without_oracle() {
    let server = MockServer::start().await;
    serve(&server, "/cs", PROGRAM_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sections.json");
    let output = temp_dir.path().join("requirements.json");
    let cs = format!("{}/cs", server.uri());
    let gone = format!("{}/gone", server.uri());
    write_json_atomic(
        &input,
        &vec![
            section(&cs, "Computer Science", Some("science")),
            section(&cs, "Chemistry", None),
            section(&gone, "Major in Art", None),
            section(&gone, "Minor in Art", None),
        ],
    )
    .unwrap();

    let summary = run_requirement_batch(&AppConfig::default(), &options(), &input, &output, None)
        .await
        .unwrap();

    assert_eq!(summary.pages_total, 2);
    assert_eq!(summary.pages_failed, 1);

    let records: Vec<RequirementRecord> = load_records(&output).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].status, RequirementStatus::Unstructured);
    assert_eq!(records[0].requirements_raw, vec!["CPSC 110", "MATH 100", "CPSC 210 | 4"]);
    assert_eq!(records[0].requirements_parsed, None);
    assert_eq!(records[1].status, RequirementStatus::NoHeading);
    assert!(records[1].requirements_raw.is_empty());
    assert_eq!(records[2].status, RequirementStatus::FetchFailed);
    assert_eq!(records[3].status, RequirementStatus::FetchFailed);

    assert_eq!(
        summary.status_counts,
        vec![
            ("unstructured".to_string(), 1),
            ("no_heading".to_string(), 1),
            ("fetch_failed".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_requirement_batch_with_oracle() {
    let server = MockServer::start().await;
    serve(&server, "/cs", PROGRAM_PAGE).await;
    let reply = serde_json::json!({
        "choices": [{ "message": { "content": "{\"requirements\":[{\"type\":\"meta\",\"label\":\"Total\",\"min_credits\":120}]}" } }]
    });
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sections.json");
    let output = temp_dir.path().join("requirements.json");
    write_json_atomic(
        &input,
        &vec![section(&format!("{}/cs", server.uri()), "Honours in Computer Science", None)],
    )
    .unwrap();

    let oracle = Oracle::new(&format!("{}/chat", server.uri()), "gpt-4o-mini", "k", 5).unwrap();
    let summary = run_requirement_batch(&AppConfig::default(), &options(), &input, &output, Some(&oracle))
        .await
        .unwrap();

    let records: Vec<RequirementRecord> = load_records(&output).unwrap();
    assert_eq!(records[0].status, RequirementStatus::Parsed);
    assert_eq!(records[0].requirements_raw, vec!["CPSC 449"]);
    assert_eq!(records[0].requirements_parsed.as_ref().map(Vec::len), Some(1));
    assert_eq!(summary.status_counts, vec![("parsed".to_string(), 1)]);
}

#[tokio::test]
async fn test_oracle_failure_keeps_raw_lines_and_batch_continues() {
    let server = MockServer::start().await;
    serve(&server, "/cs", PROGRAM_PAGE).await;
    let chat = |content: &str| {
        serde_json::json!({ "choices": [{ "message": { "content": content } }] })
    };
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("Major in Computer Science"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat("not json")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_string_contains("Honours in Computer Science"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat(r#"{"requirements":[{"type":"course_list","courses":["CPSC 449"]}]}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sections.json");
    let output = temp_dir.path().join("requirements.json");
    let cs = format!("{}/cs", server.uri());
    write_json_atomic(
        &input,
        &vec![
            section(&cs, "Major in Computer Science", None),
            section(&cs, "Honours in Computer Science", None),
        ],
    )
    .unwrap();

    let oracle = Oracle::new(&format!("{}/chat", server.uri()), "gpt-4o-mini", "k", 5).unwrap();
    let summary = run_requirement_batch(&AppConfig::default(), &options(), &input, &output, Some(&oracle))
        .await
        .unwrap();

    let records: Vec<RequirementRecord> = load_records(&output).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, RequirementStatus::Unstructured);
    assert_eq!(records[0].requirements_raw, vec!["CPSC 110", "MATH 100", "CPSC 210 | 4"]);
    assert_eq!(records[0].requirements_parsed, None);
    assert_eq!(records[1].status, RequirementStatus::Parsed);
    assert_eq!(records[1].requirements_raw, vec!["CPSC 449"]);
    assert_eq!(
        summary.status_counts,
        vec![("unstructured".to_string(), 1), ("parsed".to_string(), 1)]
    );
}

// ============================================================================
// Vitals Batch Tests
// ============================================================================

#[tokio::test]
async fn test_vitals_batch_writes_entries_and_counts_missing_boxes() {
    let server = MockServer::start().await;
    serve(&server, "/programs/computer-science", VITALS_PAGE).await;
    serve(&server, "/programs/arts", "<html><body><h1>Arts</h1><p>No box here</p></body></html>").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("programs.json");
    let urls = vec![
        format!("{}/programs/computer-science", server.uri()),
        format!("{}/programs/arts", server.uri()),
    ];

    let summary = run_vitals_batch(&AppConfig::default(), &options(), urls, &output)
        .await
        .unwrap();

    assert_eq!(summary.pages_total, 2);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.records_total, 2);
    assert_eq!(summary.status_counts, vec![("no_vitals_box".to_string(), 1)]);

    let entries: Vec<ProgramEntry> = load_records(&output).unwrap();
    assert_eq!(entries[0].id, "computer-science");
    assert_eq!(entries[0].campus.as_deref(), Some("Vancouver"));
    assert_eq!(entries[0].length, Some(4.0));
    assert_eq!(entries[1].name, "Honours in Computer Science");
    assert_eq!(entries[1].total_credits, 132);
}

// ============================================================================
// Progress Tests
// ============================================================================

#[tokio::test]
async fn test_progress_bar_reaches_total_before_finish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let opts = BatchOptions {
        show_progress_bars: true,
        ..options()
    };
    let urls: Vec<String> = (0..3).map(|i| format!("{}/p{i}", server.uri())).collect();
    let batch = BatchPool::new(&AppConfig::default(), &opts, urls.len(), "Testing").unwrap();
    let handler: PageHandler<()> = Arc::new(|_url: &str, _body: &str| ());

    batch.pool.run(urls, handler).await.unwrap();

    let pb = batch.progress_bar.as_ref().unwrap();
    assert_eq!(pb.position(), 3);
}
