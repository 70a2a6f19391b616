use crate::errors::AppError;
use crate::models::{Client, ClientQuery, Id, StatsResponse};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::store::{self, Resource};
use crate::ui::{render_dashboard, render_screen};
use crate::views::{render_table, EntityView, FormValues};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use tracing::info;

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<R::Query>,
) -> Json<Vec<R>> {
    let data = state.read().await;
    Json(store::list::<R>(&data, &query))
}

pub async fn fetch<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<R>, AppError> {
    let data = state.read().await;
    Ok(Json(store::get::<R>(&data, id)?))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Json(input): Json<R::New>,
) -> Result<(StatusCode, Json<R>), AppError> {
    let record = state.mutate(|data| store::create::<R>(data, input)).await?;
    info!(id = record.id(), "{} created", R::NAME);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(patch): Json<R::Patch>,
) -> Result<Json<R>, AppError> {
    let record = state.mutate(|data| store::update::<R>(data, id, patch)).await?;
    info!(id, "{} updated", R::NAME);
    Ok(Json(record))
}

pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<StatusCode, AppError> {
    state.mutate(|data| store::delete::<R>(data, id)).await?;
    info!(id, "{} deleted", R::NAME);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let data = state.read().await;
    Json(build_stats(&data))
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let data = state.read().await;
    Html(render_dashboard(&build_stats(&data)))
}

pub async fn screen<E: Resource + EntityView>(
    State(state): State<AppState>,
    Query(query): Query<E::Query>,
) -> Html<String> {
    let data = state.read().await;
    let clients = store::list::<Client>(&data, &ClientQuery::default());
    let items = store::list::<E>(&data, &query);
    Html(render_screen::<E>(&render_table(&items, &clients), &clients))
}

/// The list fragment the page script swaps in after every change.
pub async fn table<E: Resource + EntityView>(
    State(state): State<AppState>,
    Query(query): Query<E::Query>,
) -> Html<String> {
    let data = state.read().await;
    let items = store::list::<E>(&data, &query);
    Html(render_table(&items, &data.clients.rows))
}

pub async fn form<E: Resource + EntityView>(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<FormValues>, AppError> {
    let data = state.read().await;
    let record = store::get::<E>(&data, id)?;
    Ok(Json(record.form_values()))
}
