use crate::config::AppConfig;
use crate::error::Result;
use calscrape_scanner::{PagePool, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Options shared by every batch job.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub delay: Duration,
    pub show_progress_bars: bool,
}

impl BatchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            workers: config.workers,
            delay: Duration::from_millis(config.delay_ms),
            show_progress_bars: true,
        }
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        if let Some(workers) = workers {
            self.workers = workers;
        }
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: Option<u64>) -> Self {
        if let Some(delay_ms) = delay_ms {
            self.delay = Duration::from_millis(delay_ms);
        }
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_progress_bars = !quiet;
        self
    }
}

/// Page pool plus the bar its workers report to, if bars are enabled.
pub struct BatchPool {
    pub pool: PagePool,
    pub progress_bar: Option<Arc<ProgressBar>>,
}

impl BatchPool {
    pub fn new(config: &AppConfig, options: &BatchOptions, total: usize, label: &str) -> Result<Self> {
        let progress_bar = options.show_progress_bars.then(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            pb.set_message(format!("{label}..."));
            Arc::new(pb)
        });

        let mut pool = PagePool::new(&config.user_agent, config.timeout_secs)?
            .with_workers(options.workers)
            .with_delay(options.delay);

        if let Some(pb) = progress_bar.clone() {
            let processed = Arc::new(AtomicUsize::new(0));
            let label = label.to_string();
            let callback: ProgressCallback = Arc::new(move |_worker_id: usize, url: String| {
                let started = processed.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_position(started as u64);
                pb.set_message(format!("{label}: {url}"));
            });
            pool = pool.with_progress_callback(callback);
        }

        Ok(Self { pool, progress_bar })
    }

    pub fn finish(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}
