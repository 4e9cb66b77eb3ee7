// web/routes/tasks.rs — Paginated task list views.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::view::form::render_task_form;
use crate::view::model::{ListViewModel, TaskDto};
use crate::AppContext;

/// Requests may exceed the configured page size, but not without bound.
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 0-based page number.
    #[serde(default)]
    pub page: i64,
    /// Page size; defaults to the configured page size.
    pub size: Option<i64>,
}

type ViewError = (StatusCode, Json<Value>);

pub async fn index(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, ViewError> {
    render_list(ctx, params, None).await
}

pub async fn task_list(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, ViewError> {
    render_list(ctx, params, None).await
}

pub async fn task_list_with_selection(
    State(ctx): State<Arc<AppContext>>,
    Path(key): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, ViewError> {
    render_list(ctx, params, Some(key)).await
}

async fn render_list(
    ctx: Arc<AppContext>,
    params: PageParams,
    selected: Option<i64>,
) -> Result<Html<String>, ViewError> {
    let page = params.page.max(0);
    let size = params
        .size
        .unwrap_or(ctx.config.page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let count = ctx.storage.count().await.map_err(internal_error)?;
    let rows = ctx
        .storage
        .list_page(page, size)
        .await
        .map_err(internal_error)?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut tasks: Vec<TaskDto> = rows.iter().map(|r| TaskDto::from_row(r, now_ms)).collect();

    let mut selected_task = None;
    let mut task_form = None;

    if let Some(key) = selected {
        for dto in &mut tasks {
            dto.active = dto.key == key;
        }
        if let Some(row) = ctx.storage.find(key).await.map_err(internal_error)? {
            if !tasks.iter().any(|t| t.active) {
                debug!(key, page, "selected task is outside the current page");
            }
            task_form = Some(render_task_form(&ctx.templates, &row));

            let mut dto = TaskDto::from_row(&row, now_ms);
            // The selected task is active even when its row is off-page.
            dto.active = true;
            selected_task = Some(dto);
        }
    }

    let mut model = ListViewModel::new(tasks, count, page, size);
    model.task = selected_task;
    model.task_form = task_form;

    let html = ctx.templates.render_list(&model).map_err(internal_error)?;
    Ok(Html(html))
}

fn internal_error<E: std::fmt::Display>(err: E) -> ViewError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}
