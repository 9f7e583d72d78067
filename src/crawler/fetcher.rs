//! HTTP fetching and the bounded worker pool that drives one BFS level.
//!
//! Grounded in the teacher's `RateLimitedFetcher`: same `reqwest::Client`
//! construction (timeout, redirect policy, gzip, connection pooling). Rate
//! limiting is dropped — the spec scopes a single site per run and polite
//! pacing is the validator/operator's concern, not the fetcher's.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::crawler::parser;
use crate::models::PageRecord;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("non-success status {0}")]
    BadStatus(u16),
}

/// Thin wrapper around a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .pool_max_idle_per_host(20)
            .build()
            .expect("failed to build HTTP client");
        Fetcher { client }
    }

    /// Fetch `url`, returning the final (post-redirect) URL and body.
    pub async fn fetch(&self, url: &str) -> Result<(String, String), FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }
        let body = response.text().await?;
        Ok((final_url, body))
    }
}

/// Fixed-size pool of workers that fetch-and-parse a single BFS wavefront.
///
/// Lifetime of the pool is exactly one level: `crawl_level` spawns
/// `num_workers` tasks draining a shared task channel, each producing a
/// `PageRecord` (or the empty sentinel on fetch failure) onto a result
/// channel, and returns once exactly `urls.len()` results are collected.
pub struct WorkerPool {
    fetcher: Fetcher,
    num_workers: usize,
}

impl WorkerPool {
    pub fn new(fetcher: Fetcher, num_workers: usize) -> Self {
        WorkerPool {
            fetcher,
            num_workers: num_workers.max(1),
        }
    }

    pub async fn crawl_level(&self, urls: Vec<String>) -> Vec<PageRecord> {
        let total = urls.len();
        if total == 0 {
            return Vec::new();
        }

        let (task_tx, task_rx) = mpsc::channel::<String>(total);
        let (result_tx, mut result_rx) = mpsc::channel::<PageRecord>(total);
        let task_rx = std::sync::Arc::new(tokio::sync::Mutex::new(task_rx));

        for url in urls {
            let _ = task_tx.send(url).await;
        }
        drop(task_tx);

        for worker_id in 0..self.num_workers {
            let fetcher = self.fetcher.clone();
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            tokio::spawn(async move {
                loop {
                    let url = {
                        let mut rx = task_rx.lock().await;
                        rx.recv().await
                    };
                    let Some(url) = url else { break };
                    tracing::debug!(worker = worker_id, url = %url, "fetching");
                    let record = match fetcher.fetch(&url).await {
                        Ok((final_url, body)) => parser::parse(&body, &final_url),
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "fetch failed");
                            PageRecord::empty()
                        }
                    };
                    if result_tx.send(record).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while results.len() < total {
            match result_rx.recv().await {
                Some(record) => results.push(record),
                None => break,
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_builds_without_panicking() {
        let _ = Fetcher::new(30, "test-agent/1.0");
    }

    #[tokio::test]
    async fn crawl_level_of_zero_urls_returns_empty() {
        let pool = WorkerPool::new(Fetcher::new(5, "test-agent/1.0"), 4);
        let results = pool.crawl_level(Vec::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn crawl_level_collects_one_result_per_unreachable_url() {
        // Unreachable ports fail fast and fall back to the empty sentinel,
        // exercising the "collect exactly |urls| results" contract without
        // a live server.
        let pool = WorkerPool::new(Fetcher::new(1, "test-agent/1.0"), 2);
        let urls = vec![
            "http://127.0.0.1:1/a".to_string(),
            "http://127.0.0.1:1/b".to_string(),
            "http://127.0.0.1:1/c".to_string(),
        ];
        let results = pool.crawl_level(urls).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_empty()));
    }
}
