use crate::error::{Result, ScanError};
use crate::result::PageResult;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Turns a fetched page (`url`, `body`) into a value. Runs synchronously on
/// the worker, so parsed documents never live across an await.
pub type PageHandler<T> = Arc<dyn Fn(&str, &str) -> T + Send + Sync>;

pub const DEFAULT_USER_AGENT: &str = "calscrape/0.1 (+https://github.com/calscrape/calscrape)";

/// Fixed-size worker pool that fetches a list of pages politely.
pub struct PagePool {
    client: Client,
    workers: usize,
    delay: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl PagePool {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            workers: 8,
            delay: Duration::from_millis(500),
            progress_callback: None,
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// GET `url`, returning status and body. Non-2xx statuses are errors.
    async fn fetch_page(client: &Client, url: &str) -> Result<(u16, String)> {
        debug!("Fetching {}", url);
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok((status.as_u16(), response.text().await?))
    }

    /// Fetch every URL and run `handler` on each body. Results come back in
    /// input order; failed fetches are kept as error results.
    pub async fn run<T>(&self, urls: Vec<String>, handler: PageHandler<T>) -> Result<Vec<PageResult<T>>>
    where
        T: Send + 'static,
    {
        let total = urls.len();
        let workers = self.workers.min(total).max(1);
        info!("Fetching {} pages with {} workers", total, workers);

        let queue: Arc<Mutex<VecDeque<(usize, String)>>> =
            Arc::new(Mutex::new(urls.into_iter().enumerate().collect()));
        let results: Arc<Mutex<Vec<PageResult<T>>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let mut worker_handles = Vec::new();
        for worker_id in 0..workers {
            let client = self.client.clone();
            let queue = queue.clone();
            let results = results.clone();
            let handler = handler.clone();
            let progress_cb = self.progress_callback.clone();
            let delay = self.delay;

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    let Some((index, url)) = queue.lock().await.pop_front() else {
                        break;
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    let start = Instant::now();
                    let result = match Self::fetch_page(&client, &url).await {
                        Ok((status_code, body)) => {
                            let response_time = start.elapsed();
                            let value = handler(&url, &body);
                            PageResult::new(index, url, status_code, response_time, value)
                        }
                        Err(e) => {
                            warn!("Fetch error for {}: {}", url, e);
                            PageResult::with_error(index, url, e.to_string())
                        }
                    };
                    results.lock().await.push(result);

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                debug!("Worker {} finished", worker_id);
            });
            worker_handles.push(handle);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let mut results = std::mem::take(&mut *results.lock().await);
        results.sort_by_key(|result| result.index);
        info!(
            "Fetch complete: {} ok, {} failed",
            results.iter().filter(|r| r.is_ok()).count(),
            results.iter().filter(|r| !r.is_ok()).count()
        );
        Ok(results)
    }
}
