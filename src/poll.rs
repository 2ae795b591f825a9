// src/poll.rs
use std::collections::HashSet;
use std::future::Future;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::identifier::PollUrl;
use crate::models::{Ballot, BallotOutcome, NewPoll, Poll, PollOption, PollWithOptions};

/// Creation attempts before giving up on identifier collisions.
pub const MAX_CREATE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOrder {
    /// Order of submission at creation time.
    Created,
    /// Highest vote count first, ties by creation order.
    MostVotes,
}

/// Storage behind the handlers. Each method is one logical operation and
/// is atomic on its own.
pub trait PollStore: Clone + Send + Sync + 'static {
    /// Writes the poll and all its options, or nothing at all.
    /// `Ok(None)` means `url` is already taken.
    fn insert_poll(
        &self,
        url: &PollUrl,
        new: &NewPoll,
    ) -> impl Future<Output = Result<Option<Poll>, sqlx::Error>> + Send;

    fn fetch_poll(
        &self,
        url: &PollUrl,
        order: OptionOrder,
    ) -> impl Future<Output = Result<Option<PollWithOptions>, sqlx::Error>> + Send;

    /// `Ok(None)` means no poll has this identifier.
    fn apply_ballot(
        &self,
        url: &PollUrl,
        ballot: &Ballot,
    ) -> impl Future<Output = Result<Option<BallotOutcome>, sqlx::Error>> + Send;
}

/// Creates a poll under a fresh identifier, drawing a new one on collision.
pub async fn create_poll<S: PollStore>(store: &S, new: &NewPoll) -> Result<Poll, AppError> {
    if new.title.trim().is_empty() {
        return Err(AppError::MissingField("title"));
    }

    for attempt in 1..=MAX_CREATE_ATTEMPTS {
        let url = PollUrl::generate();
        match store.insert_poll(&url, new).await? {
            Some(poll) => {
                info!(
                    url = %poll.url,
                    options = new.options.len(),
                    "Created poll {:?}",
                    poll.name
                );
                return Ok(poll);
            }
            None => warn!(%url, attempt, "Poll identifier already taken"),
        }
    }

    Err(AppError::IdentifierExhausted)
}

pub async fn load_poll<S: PollStore>(
    store: &S,
    url: &PollUrl,
    order: OptionOrder,
) -> Result<PollWithOptions, AppError> {
    store
        .fetch_poll(url, order)
        .await?
        .ok_or(AppError::PollNotFound)
}

/// Applies a voter's ranked choices to the poll addressed by `url`.
pub async fn cast_ballot<S: PollStore>(
    store: &S,
    url: &PollUrl,
    ballot: &Ballot,
) -> Result<BallotOutcome, AppError> {
    let outcome = store
        .apply_ballot(url, ballot)
        .await?
        .ok_or(AppError::PollNotFound)?;

    if !outcome.unmatched.is_empty() {
        warn!(%url, unmatched = ?outcome.unmatched, "Ignored ballot entries with no matching option");
    }
    info!(%url, updated = outcome.updated, "Ballot applied");

    Ok(outcome)
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PollStore for PgStore {
    async fn insert_poll(&self, url: &PollUrl, new: &NewPoll) -> Result<Option<Poll>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Poll>(
            "INSERT INTO poll (url, name, description, email) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(url.as_str())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.email)
        .fetch_one(&mut *tx)
        .await;

        let poll = match inserted {
            Ok(poll) => poll,
            // Dropping the transaction rolls it back
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => return Ok(None),
            Err(err) => return Err(err),
        };

        // Insert options in submission order so ids follow it
        for text in &new.options {
            sqlx::query("INSERT INTO option (poll_id, text, votes) VALUES ($1, $2, 0)")
                .bind(poll.id)
                .bind(text)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(poll_id = poll.id, "Committed poll with {} options", new.options.len());
        Ok(Some(poll))
    }

    async fn fetch_poll(
        &self,
        url: &PollUrl,
        order: OptionOrder,
    ) -> Result<Option<PollWithOptions>, sqlx::Error> {
        let Some(poll) = sqlx::query_as::<_, Poll>("SELECT * FROM poll WHERE url = $1")
            .bind(url.as_str())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let sql = match order {
            OptionOrder::Created => {
                "SELECT option.id, option.poll_id, option.text, option.votes \
                 FROM option JOIN poll ON option.poll_id = poll.id \
                 WHERE poll.url = $1 \
                 ORDER BY option.id"
            }
            OptionOrder::MostVotes => {
                "SELECT option.id, option.poll_id, option.text, option.votes \
                 FROM option JOIN poll ON option.poll_id = poll.id \
                 WHERE poll.url = $1 \
                 ORDER BY option.votes DESC, option.id"
            }
        };

        let options = sqlx::query_as::<_, PollOption>(sql)
            .bind(url.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(PollWithOptions { poll, options }))
    }

    async fn apply_ballot(
        &self,
        url: &PollUrl,
        ballot: &Ballot,
    ) -> Result<Option<BallotOutcome>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(poll_id) = sqlx::query_scalar::<_, i32>("SELECT id FROM poll WHERE url = $1")
            .bind(url.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let (texts, weights): (Vec<String>, Vec<i32>) = ballot.weights().into_iter().unzip();

        // Match submitted texts against this poll's own options
        let touched: Vec<String> = sqlx::query_scalar(
            "UPDATE option SET votes = option.votes + ballot.weight \
             FROM UNNEST($2::text[], $3::int4[]) AS ballot(text, weight) \
             WHERE option.poll_id = $1 AND option.text = ballot.text \
             RETURNING option.text",
        )
        .bind(poll_id)
        .bind(&texts)
        .bind(&weights)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let matched: HashSet<&str> = touched.iter().map(String::as_str).collect();
        let unmatched = texts
            .iter()
            .filter(|text| !matched.contains(text.as_str()))
            .cloned()
            .collect();

        Ok(Some(BallotOutcome {
            updated: touched.len() as u64,
            unmatched,
        }))
    }
}
