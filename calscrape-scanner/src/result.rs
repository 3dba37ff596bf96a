use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of fetching and handling one page. `index` is the page's position
/// in the input list, so results can be put back in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub index: usize,
    pub url: String,
    pub status_code: u16,
    pub response_time: Duration,
    pub value: Option<T>,
    pub error: Option<String>,
}

impl<T> PageResult<T> {
    pub fn new(index: usize, url: String, status_code: u16, response_time: Duration, value: T) -> Self {
        Self {
            index,
            url,
            status_code,
            response_time,
            value: Some(value),
            error: None,
        }
    }

    pub fn with_error(index: usize, url: String, error: String) -> Self {
        Self {
            index,
            url,
            status_code: 0,
            response_time: Duration::from_secs(0),
            value: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
