// handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use http::header::LOCATION;
use serde_json::json;

use crate::error::AppError;
use crate::extract::Payload;
use crate::identifier::PollUrl;
use crate::models::{AdminPage, Ballot, NewPoll, PollPage, VoteRequest};
use crate::poll::{self, OptionOrder, PollStore};

/// Landing page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Create a poll and send its creator to the results page
pub async fn create_poll<S: PollStore>(
    State(store): State<S>,
    Payload(new_poll): Payload<NewPoll>,
) -> Result<Response, AppError> {
    let poll = poll::create_poll(&store, &new_poll).await?;
    let location = format!("/{}/admin", poll.url);

    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

/// Voting page: the poll and its options in creation order
pub async fn show_poll<S: PollStore>(
    State(store): State<S>,
    Path(id): Path<String>,
) -> Result<Json<PollPage>, AppError> {
    let url = PollUrl::from_path(&id)?;
    let poll = poll::load_poll(&store, &url, OptionOrder::Created).await?;
    Ok(Json(poll.into()))
}

/// Results page: options ranked by votes
pub async fn show_admin<S: PollStore>(
    State(store): State<S>,
    Path(id): Path<String>,
) -> Result<Json<AdminPage>, AppError> {
    let url = PollUrl::from_path(&id)?;
    let poll = poll::load_poll(&store, &url, OptionOrder::MostVotes).await?;
    Ok(Json(poll.into()))
}

/// Record one ranked ballot
pub async fn vote<S: PollStore>(
    State(store): State<S>,
    Payload(vote_data): Payload<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let url = PollUrl::parse(&vote_data.random_url)?;
    let ballot = Ballot::new(vote_data.option.into_vec())?;
    let outcome = poll::cast_ballot(&store, &url, &ballot).await?;

    Ok(Json(json!({
        "status": "Vote recorded",
        "updated": outcome.updated
    })))
}
