use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use thiserror::Error;

use crate::core::{PreferenceStore, StoreError};
use crate::models::{ActionKind, AppliedPreference, MatchOutcome, PreferenceAction, UserPair};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Database enum mirroring `ActionKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "swipe_action", rename_all = "snake_case")]
pub enum SwipeAction {
    Like,
    Pass,
    SuperLike,
}

impl From<ActionKind> for SwipeAction {
    fn from(value: ActionKind) -> Self {
        match value {
            ActionKind::Like => SwipeAction::Like,
            ActionKind::Pass => SwipeAction::Pass,
            ActionKind::SuperLike => SwipeAction::SuperLike,
        }
    }
}

impl From<SwipeAction> for ActionKind {
    fn from(value: SwipeAction) -> Self {
        match value {
            SwipeAction::Like => ActionKind::Like,
            SwipeAction::Pass => ActionKind::Pass,
            SwipeAction::SuperLike => ActionKind::SuperLike,
        }
    }
}

/// PostgreSQL-backed preference store
///
/// Swipes are upserted on `(actor_id, target_id)`. Each call to
/// `apply_preference` runs in one transaction holding an advisory lock on
/// the unordered pair, so two simultaneous mutual likes cannot both miss
/// each other. The unique index on `matches (user_low, user_high)` keeps
/// a single outcome per pair.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn upsert_swipe(
        tx: &mut Transaction<'_, Postgres>,
        actor_id: &str,
        target_id: &str,
        action: ActionKind,
    ) -> Result<PreferenceAction, sqlx::Error> {
        let query = r#"
            INSERT INTO swipes (actor_id, target_id, action, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (actor_id, target_id)
            DO UPDATE SET
                action = EXCLUDED.action,
                created_at = EXCLUDED.created_at
            RETURNING actor_id, target_id, action, created_at
        "#;

        let row = sqlx::query(query)
            .bind(actor_id)
            .bind(target_id)
            .bind(SwipeAction::from(action))
            .fetch_one(&mut **tx)
            .await?;

        swipe_from_row(&row)
    }

    async fn insert_match(
        tx: &mut Transaction<'_, Postgres>,
        pair: &UserPair,
    ) -> Result<MatchOutcome, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO matches (user_low, user_high, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_low, user_high) DO NOTHING
            "#,
        )
        .bind(&pair.user_low)
        .bind(&pair.user_high)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT id, user_low, user_high, created_at
            FROM matches
            WHERE user_low = $1 AND user_high = $2
            "#,
        )
        .bind(&pair.user_low)
        .bind(&pair.user_high)
        .fetch_one(&mut **tx)
        .await?;

        match_from_row(&row)
    }
}

fn swipe_from_row(row: &PgRow) -> Result<PreferenceAction, sqlx::Error> {
    let action: SwipeAction = row.try_get("action")?;
    Ok(PreferenceAction {
        actor_id: row.try_get("actor_id")?,
        target_id: row.try_get("target_id")?,
        action: action.into(),
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchOutcome, sqlx::Error> {
    Ok(MatchOutcome {
        id: row.try_get("id")?,
        pair: UserPair {
            user_low: row.try_get("user_low")?,
            user_high: row.try_get("user_high")?,
        },
        is_reciprocal: true,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PreferenceStore for PostgresStore {
    async fn apply_preference(
        &self,
        actor_id: &str,
        target_id: &str,
        action: ActionKind,
    ) -> Result<AppliedPreference, StoreError> {
        if actor_id == target_id {
            return Err(StoreError::InvalidInput("actor and target are the same user".into()));
        }

        let pair = UserPair::new(actor_id, target_id);
        let mut tx = self.pool.begin().await?;

        // Serialise concurrent swipes on the same pair until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(pair.key())
            .execute(&mut *tx)
            .await?;

        let recorded = Self::upsert_swipe(&mut tx, actor_id, target_id, action).await?;

        let outcome = if action.is_positive() {
            let reciprocal = sqlx::query(
                r#"
                SELECT 1
                FROM swipes
                WHERE actor_id = $1 AND target_id = $2
                  AND action IN ('like', 'super_like')
                "#,
            )
            .bind(target_id)
            .bind(actor_id)
            .fetch_optional(&mut *tx)
            .await?;

            match reciprocal {
                Some(_) => Some(Self::insert_match(&mut tx, &pair).await?),
                None => None,
            }
        } else {
            None
        };

        tx.commit().await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} ({})",
            actor_id,
            target_id,
            action
        );

        Ok(AppliedPreference { action: recorded, outcome })
    }

    async fn find_reciprocal(
        &self,
        actor_id: &str,
        target_id: &str,
    ) -> Result<Option<PreferenceAction>, StoreError> {
        let query = r#"
            SELECT actor_id, target_id, action, created_at
            FROM swipes
            WHERE actor_id = $1 AND target_id = $2
              AND action IN ('like', 'super_like')
        "#;

        let row = sqlx::query(query)
            .bind(actor_id)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(swipe_from_row).transpose()?)
    }

    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT target_id FROM swipes WHERE actor_id = $1")
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        let targets = rows
            .iter()
            .map(|row| row.try_get("target_id"))
            .collect::<Result<Vec<String>, _>>()?;

        tracing::debug!("User {} has acted on {} profiles", actor_id, targets.len());

        Ok(targets)
    }

    async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchOutcome>, StoreError> {
        let query = r#"
            SELECT id, user_low, user_high, created_at
            FROM matches
            WHERE user_low = $1 OR user_high = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
