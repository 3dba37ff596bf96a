// Plain-text summaries of batch runs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub pages_total: usize,
    pub pages_failed: usize,
    /// Records added by this run.
    pub records_new: usize,
    /// Records dropped because an earlier run already produced them.
    pub records_skipped: usize,
    /// Existing records whose faculty was filled in from the URL.
    pub records_backfilled: usize,
    /// Records in the written output.
    pub records_total: usize,
    /// Count per record status, in first-seen order.
    pub status_counts: Vec<(String, usize)>,
    pub output: PathBuf,
}

impl BatchSummary {
    pub fn pages_ok(&self) -> usize {
        self.pages_total.saturating_sub(self.pages_failed)
    }

    pub fn count_status(&mut self, status: &str) {
        match self.status_counts.iter_mut().find(|(name, _)| name == status) {
            Some((_, count)) => *count += 1,
            None => self.status_counts.push((status.to_string(), 1)),
        }
    }
}

pub fn generate_text_summary(title: &str, summary: &BatchSummary) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("{}\n", title.to_uppercase()));
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Pages fetched:    {}\n", summary.pages_ok()));
    report.push_str(&format!("Pages failed:     {}\n", summary.pages_failed));
    report.push_str(&format!("New records:      {}\n", summary.records_new));
    if summary.records_skipped > 0 {
        report.push_str(&format!("Skipped (known):  {}\n", summary.records_skipped));
    }
    if summary.records_backfilled > 0 {
        report.push_str(&format!("Faculty filled:   {}\n", summary.records_backfilled));
    }
    report.push_str(&format!("Records written:  {}\n", summary.records_total));

    if !summary.status_counts.is_empty() {
        report.push_str("\nBy status:\n");
        for (status, count) in &summary.status_counts {
            report.push_str(&format!("  {status:<14}{count}\n"));
        }
    }

    report.push_str(&format!("\nOutput: {}\n", summary.output.display()));
    report
}
