//! Shared data types: the page/level record produced by the crawl engine,
//! and the task/estimator types exchanged with the persistence layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One fetched-and-parsed page. Either "empty" (a failed fetch bubbled
/// through the worker pool) or has a non-empty `url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub h1: String,
    pub links: Vec<String>,
    pub hreflang_map: HashMap<String, String>,
    pub imgs: Vec<String>,
    pub canonical_url: String,
    pub no_index: bool,
}

impl PageRecord {
    /// The sentinel empty record placed into the result channel when a
    /// fetch fails or returns a non-200 status.
    pub fn empty() -> Self {
        PageRecord::default()
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }
}

/// One BFS depth level: `{level_num, pages}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(rename = "levelNum")]
    pub level_num: u32,
    #[serde(rename = "crawledPages")]
    pub pages: Vec<PageRecordJson>,
}

/// `PageRecord` under the field names the result-file contract (§6) requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecordJson {
    pub url: String,
    pub h1: String,
    pub title: String,
    pub links: Vec<String>,
    #[serde(rename = "hreflangUrlMap")]
    pub hreflang_url_map: HashMap<String, String>,
    pub imgs: Vec<String>,
    #[serde(rename = "canonicalUrl")]
    pub canonical_url: String,
    #[serde(rename = "noIndex")]
    pub no_index: bool,
}

impl From<&PageRecord> for PageRecordJson {
    fn from(p: &PageRecord) -> Self {
        PageRecordJson {
            url: p.url.clone(),
            h1: p.h1.clone(),
            title: p.title.clone(),
            links: p.links.clone(),
            hreflang_url_map: p.hreflang_map.clone(),
            imgs: p.imgs.clone(),
            canonical_url: p.canonical_url.clone(),
            no_index: p.no_index,
        }
    }
}

/// Task status lifecycle (§3 "Crawling task").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum TaskStatus {
    InQueue,
    InProgress,
    Done,
}

/// A queued crawl request, as stored in `crawling_task`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CrawlingTask {
    pub id: i64,
    pub id_estimator: i64,
    pub url: String,
    pub include_subdomains: bool,
    pub status: TaskStatus,
    pub hidden: bool,
    pub exceptions: Option<String>,
    pub allowances: Option<String>,
}

/// A per-service cost profile, as stored in `estimator_settings`.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct EstimatorSetting {
    pub id: i64,
    pub service_name: String,
    pub design: Option<f64>,
    pub markup: Option<f64>,
    pub development: Option<f64>,
    pub content_m: Option<f64>,
    pub testing: Option<f64>,
    pub management: Option<f64>,
    pub hidden: bool,
}

/// One per-link estimation row, as inserted into `crawled_link_estimation`.
#[derive(Debug, Clone)]
pub struct LinkEstimation {
    pub crawling_task_id: i64,
    pub link: Option<String>,
    pub type_id: Option<i64>,
    pub design: Option<f64>,
    pub markup: Option<f64>,
    pub development: Option<f64>,
    pub content_m: Option<f64>,
    pub testing: Option<f64>,
    pub management: Option<f64>,
}

/// The fields written back to `estimator` once a crawl completes.
#[derive(Debug, Clone)]
pub struct EstimatorResultUpdate {
    pub estimator_id: i64,
    pub pages_num: u32,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub duration_ms: i64,
}
