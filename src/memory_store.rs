// src/memory_store.rs
//! In-process [`PollStore`] for tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::identifier::PollUrl;
use crate::models::{Ballot, BallotOutcome, NewPoll, Poll, PollOption, PollWithOptions};
use crate::poll::{OptionOrder, PollStore};

#[derive(Debug, Default)]
struct Tables {
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    next_id: i32,
    /// Inserts still to be reported as identifier collisions.
    collisions: usize,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn poll_by_url(&self, url: &PollUrl) -> Option<&Poll> {
        self.polls.iter().find(|poll| poll.url == url.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Reports the next `collisions` inserts as taken identifiers.
    pub fn with_collisions(collisions: usize) -> Self {
        let store = Self::default();
        store.tables.lock().unwrap().collisions = collisions;
        store
    }

    pub fn poll_count(&self) -> usize {
        self.tables.lock().unwrap().polls.len()
    }
}

impl PollStore for MemoryStore {
    async fn insert_poll(&self, url: &PollUrl, new: &NewPoll) -> Result<Option<Poll>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.collisions > 0 {
            tables.collisions -= 1;
            return Ok(None);
        }
        if tables.poll_by_url(url).is_some() {
            return Ok(None);
        }

        let poll = Poll {
            id: tables.next_id(),
            url: url.to_string(),
            name: new.title.clone(),
            description: new.description.clone(),
            email: new.email.clone(),
            created_at: Utc::now(),
        };
        for text in &new.options {
            let option = PollOption {
                id: tables.next_id(),
                poll_id: poll.id,
                text: text.clone(),
                votes: 0,
            };
            tables.options.push(option);
        }
        tables.polls.push(poll.clone());

        Ok(Some(poll))
    }

    async fn fetch_poll(
        &self,
        url: &PollUrl,
        order: OptionOrder,
    ) -> Result<Option<PollWithOptions>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let Some(poll) = tables.poll_by_url(url).cloned() else {
            return Ok(None);
        };

        let mut options: Vec<PollOption> = tables
            .options
            .iter()
            .filter(|option| option.poll_id == poll.id)
            .cloned()
            .collect();
        match order {
            OptionOrder::Created => options.sort_by_key(|option| option.id),
            OptionOrder::MostVotes => {
                options.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.id.cmp(&b.id)))
            }
        }

        Ok(Some(PollWithOptions { poll, options }))
    }

    async fn apply_ballot(
        &self,
        url: &PollUrl,
        ballot: &Ballot,
    ) -> Result<Option<BallotOutcome>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let Some(poll_id) = tables.poll_by_url(url).map(|poll| poll.id) else {
            return Ok(None);
        };

        let mut outcome = BallotOutcome::default();
        let mut matched = HashSet::new();
        for (text, weight) in ballot.weights() {
            for option in tables
                .options
                .iter_mut()
                .filter(|option| option.poll_id == poll_id && option.text == text)
            {
                option.votes += weight;
                outcome.updated += 1;
                matched.insert(text.clone());
            }
            if !matched.contains(&text) {
                outcome.unmatched.push(text);
            }
        }

        Ok(Some(outcome))
    }
}
