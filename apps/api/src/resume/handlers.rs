//! Axum route handlers for the resume document API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use futures::{future, stream, Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::resume::editor::{apply_edits, ResumeEdit};
use crate::resume::lifecycle::{duplicate, new_resume_template};
use crate::resume::live::{refresh, CollectionSnapshot, Subscription};
use crate::resume::preview::render_print_html;
use crate::resume::text::full_resume_text;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EditBatch {
    pub edits: Vec<ResumeEdit>,
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(state.store.list(params.user_id).await?))
}

/// GET /api/v1/resumes/template
pub async fn handle_template() -> Json<Resume> {
    Json(new_resume_template())
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(draft): Json<Resume>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let saved = state.store.create(params.user_id, &draft).await?;
    refresh(&state.feed, state.store.as_ref(), params.user_id).await;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Resume>, AppError> {
    Ok(Json(state.store.get(params.user_id, id).await?))
}

/// PUT /api/v1/resumes/:id
///
/// Whole-document save. Concurrent saves are last-write-wins.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(draft): Json<Resume>,
) -> Result<Json<Resume>, AppError> {
    let saved = state.store.save(params.user_id, id, &draft).await?;
    refresh(&state.feed, state.store.as_ref(), params.user_id).await;
    Ok(Json(saved))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.store.delete(params.user_id, id).await?;
    refresh(&state.feed, state.store.as_ref(), params.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/duplicate
pub async fn handle_duplicate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let original = state.store.get(params.user_id, id).await?;
    let copy = state.store.create(params.user_id, &duplicate(&original)).await?;
    refresh(&state.feed, state.store.as_ref(), params.user_id).await;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /api/v1/resumes/:id/edits
///
/// Applies a batch of editor operations in order and saves the result. An
/// invalid operation rejects the whole batch.
pub async fn handle_apply_edits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(batch): Json<EditBatch>,
) -> Result<Json<Resume>, AppError> {
    let current = state.store.get(params.user_id, id).await?;
    let edited = apply_edits(&current, &batch.edits)?;
    let saved = state.store.save(params.user_id, id, &edited).await?;
    refresh(&state.feed, state.store.as_ref(), params.user_id).await;
    Ok(Json(saved))
}

/// GET /api/v1/resumes/:id/text
pub async fn handle_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<String, AppError> {
    let resume = state.store.get(params.user_id, id).await?;
    Ok(full_resume_text(Some(&resume)))
}

/// GET /api/v1/resumes/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Html<String>, AppError> {
    let resume = state.store.get(params.user_id, id).await?;
    Ok(Html(render_print_html(&resume)?))
}

/// GET /api/v1/resumes/live
///
/// Streams the user's collection: the current state first, then a fresh
/// snapshot after every write. Closing the connection releases the subscription.
pub async fn handle_live_collection(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    // Subscribe before reading so no write can fall between the two.
    let subscription = state.feed.subscribe(params.user_id);
    let current = Arc::new(CollectionSnapshot {
        user_id: params.user_id,
        resumes: state.store.list(params.user_id).await?,
    });

    let events = stream::once(future::ready(current))
        .chain(snapshots(subscription))
        .map(|snapshot| Event::default().event("snapshot").json_data(&*snapshot));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/resumes/:id/live
///
/// Streams one document. Emits a final `deleted` event and ends if the
/// document disappears from the collection.
pub async fn handle_live_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let subscription = state.feed.subscribe(params.user_id);
    let current = state.store.get(params.user_id, id).await?;

    let updates = stream::unfold(Some(subscription), move |subscription| async move {
        let mut subscription = subscription?;
        let snapshot = subscription.next().await?;
        match snapshot.find(id) {
            Some(resume) => Some((document_event(resume), Some(subscription))),
            None => Some((
                Ok(Event::default().event("deleted").data(id.to_string())),
                None,
            )),
        }
    });

    let events = stream::once(future::ready(document_event(&current))).chain(updates);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn document_event(resume: &Resume) -> Result<Event, axum::Error> {
    Event::default().event("snapshot").json_data(resume)
}

fn snapshots(subscription: Subscription) -> impl Stream<Item = Arc<CollectionSnapshot>> {
    stream::unfold(subscription, |mut subscription| async move {
        subscription
            .next()
            .await
            .map(|snapshot| (snapshot, subscription))
    })
}
