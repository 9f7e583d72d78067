//! Persistence layer: a `Store` trait over the crawling-task / estimator
//! schema, backed by a Postgres `PgStore`.
//!
//! Grounded in the teacher's `StorageClient`: a single pooled client wrapped
//! in a handful of named, narrowly-scoped methods, constructed once from a
//! config struct and shared via `Arc`. Swapped from the teacher's S3 client
//! for a `sqlx::PgPool`, since the collaborator here is relational, not
//! object storage.

use thiserror::Error;

use crate::models::{CrawlingTask, EstimatorResultUpdate, EstimatorSetting, LinkEstimation};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("no default estimator setting configured")]
    NoDefaultEstimatorSetting,
}

/// The five operations the task tracker needs from persistence (§1, §4.G).
#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync {
    async fn fetch_next_queued_task(&self) -> Result<Option<CrawlingTask>, StoreError>;
    async fn mark_task_in_progress(&self, task_id: i64) -> Result<(), StoreError>;
    async fn mark_task_done(&self, task_id: i64) -> Result<(), StoreError>;
    async fn insert_link_estimations(
        &self,
        estimations: &[LinkEstimation],
    ) -> Result<(), StoreError>;
    async fn update_estimator(&self, update: &EstimatorResultUpdate) -> Result<(), StoreError>;
    /// The first non-hidden `estimator_settings` row, used as the cost
    /// vector for every `crawled_link_estimation` row a crawl produces.
    async fn load_default_estimator_setting(&self) -> Result<EstimatorSetting, StoreError>;
}

/// Configuration needed to create a `PgStore`.
pub struct StorageConfig {
    pub database_url: String,
}

/// Postgres-backed `Store`.
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub async fn connect(config: StorageConfig) -> Result<Self, StoreError> {
        let pool = sqlx::PgPool::connect(&config.database_url).await?;
        Ok(PgStore { pool })
    }

    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        PgStore { pool }
    }
}

impl Store for PgStore {
    async fn fetch_next_queued_task(&self) -> Result<Option<CrawlingTask>, StoreError> {
        let task = sqlx::query_as::<_, CrawlingTask>(
            r#"
            SELECT id, id_estimator, url, include_subdomains, status, hidden, exceptions, allowances
            FROM crawling_task
            WHERE status = 'in_queue' AND hidden = false
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn mark_task_in_progress(&self, task_id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE crawling_task SET status = 'in_progress' WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_task_done(&self, task_id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE crawling_task SET status = 'done' WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_link_estimations(
        &self,
        estimations: &[LinkEstimation],
    ) -> Result<(), StoreError> {
        for e in estimations {
            sqlx::query(
                r#"
                INSERT INTO crawled_link_estimation
                    (crawling_task_id, link, type_id, design, markup, development, content_m, testing, management)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(e.crawling_task_id)
            .bind(&e.link)
            .bind(e.type_id)
            .bind(e.design)
            .bind(e.markup)
            .bind(e.development)
            .bind(e.content_m)
            .bind(e.testing)
            .bind(e.management)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn update_estimator(&self, update: &EstimatorResultUpdate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE estimator
            SET pages_num = $2, end_time = $3, duration_ms = $4
            WHERE id = $1
            "#,
        )
        .bind(update.estimator_id)
        .bind(update.pages_num as i64)
        .bind(update.end_time)
        .bind(update.duration_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_default_estimator_setting(&self) -> Result<EstimatorSetting, StoreError> {
        let setting = sqlx::query_as::<_, EstimatorSetting>(
            r#"
            SELECT id, service_name, design, markup, development, content_m, testing, management, hidden
            FROM estimator_settings
            WHERE hidden = false
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        setting.ok_or(StoreError::NoDefaultEstimatorSetting)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::TaskStatus;

    #[test]
    fn task_status_values_are_distinct() {
        assert_eq!(TaskStatus::InQueue, TaskStatus::InQueue);
        assert_ne!(TaskStatus::InQueue, TaskStatus::Done);
    }
}
