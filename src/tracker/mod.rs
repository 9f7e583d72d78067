//! Task tracker: polls the store for queued crawl requests and drives each
//! one through fetch → crawl → persist → report.
//!
//! Grounded in the teacher's `JobManager` poll/dispatch shape (§4.G), minus
//! the HMAC completion callback — this tracker's "caller" is the
//! `estimator` row it writes back to, not an external webhook.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;

use crate::crawler::{self, is_image_suffixed, is_junk_link, CrawlOptions};
use crate::models::{CrawlingTask, EstimatorResultUpdate, EstimatorSetting, LinkEstimation};
use crate::results;
use crate::storage::{Store, StoreError};
use crate::url_utils::{add_trailing_slash, strip_fragment};
use crate::validator::UrlValidator;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to write results: {0}")]
    Results(#[from] results::ResultsError),
}

/// Poll interval used by `run_forever` when the queue is empty.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Run the poll loop forever, processing one queued task at a time.
pub async fn run_forever<S: Store>(
    store: &S,
    crawl_options: &CrawlOptions,
    results_dir: &Path,
) -> ! {
    loop {
        match process_next(store, crawl_options, results_dir).await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(POLL_INTERVAL).await,
            Err(e) => {
                tracing::error!(error = %e, "tracker iteration failed");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}

/// Process at most one queued task. Returns `Ok(false)` when the queue was
/// empty, so the caller knows whether to keep polling without sleeping.
///
/// Steps, per task:
/// 1. fetch the next `in_queue` task
/// 2. mark it `in_progress`
/// 3. validate the task URL; if invalid, mark it `done` and skip crawling
/// 4. build a `UrlValidator` from its exception/allowance rules
/// 5. seed from the sitemap ∪ the task URL, filtered before dispatch
/// 6. run the BFS crawl
/// 7. write the result files to disk
/// 8. derive one `LinkEstimation` row per unique crawled page, costed from
///    the default `estimator_settings` row
/// 9. insert those rows, write back the `estimator` summary row, mark done
pub async fn process_next<S: Store>(
    store: &S,
    crawl_options: &CrawlOptions,
    results_dir: &Path,
) -> Result<bool, TrackerError> {
    let Some(task) = store.fetch_next_queued_task().await? else {
        return Ok(false);
    };

    store.mark_task_in_progress(task.id).await?;

    let Some(domain) = crate::url_utils::extract_domain(&task.url) else {
        tracing::warn!(task_id = task.id, url = %task.url, "invalid task url, skipping crawl");
        store.mark_task_done(task.id).await?;
        return Ok(true);
    };

    let validator = UrlValidator::from_newline_separated(
        task.exceptions.as_deref(),
        task.allowances.as_deref(),
    );

    let sitemap_links = crawler::sitemap::get_links_from_sitemap(&task.url).await;
    let seed_urls = build_seed_urls(&task.url, &sitemap_links, &validator);

    let started = Instant::now();
    let levels = crawler::crawl(
        &seed_urls,
        task.include_subdomains,
        &validator,
        crawl_options,
    )
    .await;
    let elapsed = started.elapsed();

    results::write_results(results_dir, &domain, &levels, Utc::now())?;

    let estimator_setting = store.load_default_estimator_setting().await?;
    let estimations = build_link_estimations(&task, &levels, &estimator_setting);
    store.insert_link_estimations(&estimations).await?;

    let pages_num = estimations.len() as u32;
    store
        .update_estimator(&EstimatorResultUpdate {
            estimator_id: task.id_estimator,
            pages_num,
            end_time: Utc::now(),
            duration_ms: elapsed.as_millis() as i64,
        })
        .await?;

    store.mark_task_done(task.id).await?;

    Ok(true)
}

/// The crawl's seed set: the task URL itself plus whatever the site's
/// sitemap offers, junk/image/validator-filtered before dispatch (§4.G
/// step 4). The task URL is always seeded, even if the sitemap is empty or
/// unreachable.
fn build_seed_urls(task_url: &str, sitemap_links: &[String], validator: &UrlValidator) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut seeds = Vec::new();

    let task_url = add_trailing_slash(task_url);
    seen.insert(task_url.clone());
    seeds.push(task_url);

    for link in sitemap_links {
        if is_junk_link(link) {
            continue;
        }
        let candidate = add_trailing_slash(&strip_fragment(link));
        if is_image_suffixed(&candidate) {
            continue;
        }
        if !validator.is_valid(&candidate) {
            continue;
        }
        if seen.insert(candidate.clone()) {
            seeds.push(candidate);
        }
    }

    seeds
}

/// One `LinkEstimation` per unique, non-empty final URL crawled, sorted
/// ascending (§4.G step 6), costed from the default estimator setting's
/// cost vector (§4.G step 7).
fn build_link_estimations(
    task: &CrawlingTask,
    levels: &[crate::models::LevelRecord],
    setting: &EstimatorSetting,
) -> Vec<LinkEstimation> {
    let mut urls: Vec<String> = levels
        .iter()
        .flat_map(|level| &level.pages)
        .map(|page| page.url.clone())
        .filter(|url| !url.is_empty())
        .collect();
    urls.sort();
    urls.dedup();

    urls.into_iter()
        .map(|url| LinkEstimation {
            crawling_task_id: task.id,
            link: Some(url),
            type_id: None,
            design: setting.design,
            markup: setting.markup,
            development: setting.development,
            content_m: setting.content_m,
            testing: setting.testing,
            management: setting.management,
        })
        .collect()
}
