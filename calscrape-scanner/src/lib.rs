pub mod classify;
pub mod config;
pub mod course;
pub mod error;
pub mod fetcher;
pub mod matcher;
pub mod normalize;
pub mod record;
pub mod result;
pub mod segment;
pub mod strategy;
pub mod vitals;

pub use classify::{SectionBoundary, SectionClassifier, SubBoundaryKind, WalkMode};
pub use config::ExtractConfig;
pub use course::{CourseHeading, CourseRecord, parse_course_heading};
pub use error::ScanError;
pub use fetcher::{DEFAULT_USER_AGENT, PageHandler, PagePool, ProgressCallback};
pub use matcher::{Heading, collect_headings, find_heading};
pub use record::{SectionRecord, SubGroup, assemble, faculty_from_url};
pub use result::PageResult;
pub use segment::{SegmentLine, Segmenter, Segments, Start, collect_groups};
pub use strategy::{NamedSection, PageExtractor};
pub use vitals::{
    MissingVitals, ProgramEntry, ProgramVitals, extract_program_entries,
    extract_program_entries_from_html, parse_length,
};
