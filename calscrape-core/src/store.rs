// JSON and CSV persistence

use crate::error::{CoreError, Result};
use calscrape_scanner::CourseRecord;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

const COURSE_HEADER: [&str; 9] = [
    "subject",
    "campus_suffix",
    "course_number",
    "credits",
    "title",
    "description",
    "prerequisite_raw",
    "corequisite_raw",
    "exclusion_raw",
];

/// Read a JSON array of records.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| CoreError::json(path, e))
}

/// Like [`load_records`], but a missing file is an empty list.
pub fn load_existing<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!("No existing output at {}", path.display());
        return Ok(Vec::new());
    }
    load_records(path)
}

/// Pretty JSON, written to a sibling temp file and renamed into place.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_sibling(path);
    std::fs::write(&tmp, contents).map_err(|e| CoreError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        CoreError::io(path, e)
    })?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Quote a CSV field when it holds a comma, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn courses_to_csv(courses: &[CourseRecord]) -> String {
    let mut out = COURSE_HEADER.join(",");
    out.push_str("\r\n");

    for course in courses {
        let fields = [
            course.subject.as_deref(),
            course.campus_suffix.as_deref(),
            course.course_number.as_deref(),
            course.credits.as_deref(),
            Some(course.title.as_str()),
            Some(course.description.as_str()),
            course.prerequisite_raw.as_deref(),
            course.corequisite_raw.as_deref(),
            course.exclusion_raw.as_deref(),
        ];
        let row: Vec<String> = fields
            .into_iter()
            .map(|field| csv_field(field.unwrap_or_default()))
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn write_courses_csv(path: &Path, courses: &[CourseRecord]) -> Result<()> {
    write_atomic(path, courses_to_csv(courses).as_bytes())
}
