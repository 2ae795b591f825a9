// models.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Poll {
    pub id: i32,
    pub url: String,
    pub name: String,
    pub description: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: i32,
    pub poll_id: i32,
    pub text: String,
    pub votes: i32,
}

/// A poll together with its options, in the order the store returned them.
#[derive(Debug, Clone)]
pub struct PollWithOptions {
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

/// Body of `POST /create`, as JSON or as an urlencoded form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPoll {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "options[]")]
    pub options: Vec<String>,
}

/// Body of `POST /vote`, as JSON or as an urlencoded form.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "randomURL")]
    pub random_url: String,
    #[serde(default, alias = "option[]")]
    pub option: Selection,
}

/// HTML forms send a lone checkbox as a plain string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    One(String),
    Many(Vec<String>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Many(Vec::new())
    }
}

impl Selection {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Selection::One(text) => vec![text],
            Selection::Many(texts) => texts,
        }
    }
}

/// The ordered option texts one voter submitted, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot(Vec<String>);

impl Ballot {
    pub fn new(choices: Vec<String>) -> Result<Self, AppError> {
        if choices.is_empty() {
            return Err(AppError::EmptyBallot);
        }
        Ok(Self(choices))
    }

    /// Increment owed to each distinct text. Position `i` of `n` is worth
    /// `n - i`; a text submitted twice collects both weights.
    pub fn weights(&self) -> Vec<(String, i32)> {
        let n = self.0.len();
        let mut index = HashMap::new();
        let mut weights: Vec<(String, i32)> = Vec::with_capacity(n);

        for (i, text) in self.0.iter().enumerate() {
            let weight = i32::try_from(n - i).unwrap_or(i32::MAX);
            match index.get(text.as_str()) {
                Some(&slot) => {
                    let entry: &mut (String, i32) = &mut weights[slot];
                    entry.1 = entry.1.saturating_add(weight);
                }
                None => {
                    index.insert(text.as_str(), weights.len());
                    weights.push((text.clone(), weight));
                }
            }
        }

        weights
    }
}

/// Result of applying one ballot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotOutcome {
    /// Option rows whose counter moved.
    pub updated: u64,
    /// Submitted texts that matched no option of the poll.
    pub unmatched: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionEntry {
    pub text: String,
}

/// What voters see at `GET /{id}`.
#[derive(Debug, Serialize)]
pub struct PollPage {
    pub url: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub options: Vec<OptionEntry>,
}

impl From<PollWithOptions> for PollPage {
    fn from(PollWithOptions { poll, options }: PollWithOptions) -> Self {
        Self {
            url: poll.url,
            name: poll.name,
            description: poll.description,
            created_at: poll.created_at,
            options: options
                .into_iter()
                .map(|option| OptionEntry { text: option.text })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionTally {
    pub text: String,
    pub votes: i32,
}

/// Ranked results at `GET /{id}/admin`.
#[derive(Debug, Serialize)]
pub struct AdminPage {
    pub url: String,
    pub name: String,
    pub description: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub options: Vec<OptionTally>,
}

impl From<PollWithOptions> for AdminPage {
    fn from(PollWithOptions { poll, options }: PollWithOptions) -> Self {
        Self {
            url: poll.url,
            name: poll.name,
            description: poll.description,
            email: poll.email,
            created_at: poll.created_at,
            options: options
                .into_iter()
                .map(|option| OptionTally {
                    text: option.text,
                    votes: option.votes,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(texts: &[&str]) -> Ballot {
        Ballot::new(texts.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn earlier_choices_weigh_more() {
        assert_eq!(
            ballot(&["A", "B", "C"]).weights(),
            vec![("A".into(), 3), ("B".into(), 2), ("C".into(), 1)]
        );
    }

    #[test]
    fn repeated_choices_add_up() {
        assert_eq!(
            ballot(&["A", "B", "A"]).weights(),
            vec![("A".into(), 4), ("B".into(), 2)]
        );
    }

    #[test]
    fn empty_ballot_is_rejected() {
        assert!(matches!(Ballot::new(Vec::new()), Err(AppError::EmptyBallot)));
    }

    #[test]
    fn vote_option_accepts_scalar_or_list() {
        let one: VoteRequest =
            serde_json::from_str(r#"{"randomURL": "abc123", "option": "Pizza"}"#).unwrap();
        assert_eq!(one.random_url, "abc123");
        assert_eq!(one.option.into_vec(), vec!["Pizza"]);

        let many: VoteRequest =
            serde_json::from_str(r#"{"randomURL": "abc123", "option": ["Tacos", "Pizza"]}"#)
                .unwrap();
        assert_eq!(many.option.into_vec(), vec!["Tacos", "Pizza"]);

        let none: VoteRequest = serde_json::from_str(r#"{"randomURL": "abc123"}"#).unwrap();
        assert!(none.option.into_vec().is_empty());
    }
}
