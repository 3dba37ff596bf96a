pub mod batch;
pub mod config;
pub mod courses;
pub mod error;
pub mod oracle;
pub mod programs;
pub mod report;
pub mod requirements;
pub mod store;
pub mod vitals;

pub use batch::BatchOptions;
pub use config::AppConfig;
pub use error::{CoreError, Result};
pub use oracle::{Oracle, OracleConfig, OracleError, Requirement, RequirementKind};
pub use report::BatchSummary;
pub use requirements::{RequirementRecord, RequirementStatus};
