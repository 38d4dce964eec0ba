use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use pageflow_shared::{
    listing::{self, ArchiveEntry, CategoryCount},
    ListingContext, Post, PostFilter, PostSummary, YearMonth,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    read_stats::{read_cookie_header, ReadCount},
    state::AppState,
};

/// Raw query pairs; the `page` value is normalized by the paginator, never
/// rejected.
pub type QueryPairs = Vec<(String, String)>;

/// The last `page` value wins when the parameter is repeated.
fn requested_page(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .rev()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: Post,
    /// The next newer post.
    pub previous_post: Option<PostSummary>,
    /// The next older post.
    pub next_post: Option<PostSummary>,
    pub reads: ReadCount,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct ArchivesResponse {
    pub archives: Vec<ArchiveEntry>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Internal(&'static str),
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ViewError::NotFound {
                entity,
                id,
            } => {
                tracing::debug!(entity = *entity, id = %id, "lookup missed");
                StatusCode::NOT_FOUND
            },
            ViewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code: status.as_u16(),
            }),
        )
            .into_response()
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<ListingContext>, ViewError> {
    let context = build_listing(&state, &PostFilter::All, requested_page(&params))?;
    Ok(Json(context))
}

pub async fn list_category_posts(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<ListingContext>, ViewError> {
    let category = state
        .store()
        .category(&category_id)
        .map_err(|e| internal_error("Failed to fetch category", e))?
        .ok_or(ViewError::NotFound {
            entity: "Category",
            id: category_id,
        })?;

    let filter = PostFilter::Category(category.id.clone());
    let context = build_listing(&state, &filter, requested_page(&params))?.with_category(category);
    Ok(Json(context))
}

pub async fn list_month_posts(
    State(state): State<AppState>,
    Path((raw_year, raw_month)): Path<(String, String)>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<ListingContext>, ViewError> {
    let month = parse_month(&raw_year, &raw_month).ok_or_else(|| ViewError::NotFound {
        entity: "Month",
        id: format!("{raw_year}-{raw_month}"),
    })?;

    let context = build_listing(&state, &PostFilter::Month(month), requested_page(&params))?
        .with_month_label(month.label());
    Ok(Json(context))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ViewError> {
    let store = state.store();
    let post = store
        .post(&id)
        .map_err(|e| internal_error("Failed to fetch post", e))?
        .ok_or(ViewError::NotFound {
            entity: "Post",
            id,
        })?;

    let read_cookie_key = state.read_stats().once_read(&headers, &post.id);

    let previous_post = store
        .newer_neighbor(&post)
        .map_err(|e| internal_error("Failed to fetch previous post", e))?;
    let next_post = store
        .older_neighbor(&post)
        .map_err(|e| internal_error("Failed to fetch next post", e))?;
    let reads = state.read_stats().count(&post.id);

    let mut response = Json(PostDetailResponse {
        post,
        previous_post,
        next_post,
        reads,
    })
    .into_response();

    // 阅读 cookie 标记
    if let Some(cookie) = read_cookie_header(&read_cookie_key) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ViewError> {
    let categories = listing::category_counts(state.store())
        .map_err(|e| internal_error("Failed to count categories", e))?;
    Ok(Json(CategoriesResponse {
        categories,
    }))
}

pub async fn list_archives(
    State(state): State<AppState>,
) -> Result<Json<ArchivesResponse>, ViewError> {
    let archives =
        listing::archive(state.store()).map_err(|e| internal_error("Failed to build archive", e))?;
    Ok(Json(ArchivesResponse {
        archives,
    }))
}

fn parse_month(raw_year: &str, raw_month: &str) -> Option<YearMonth> {
    let year = raw_year.parse::<i32>().ok()?;
    let month = raw_month.parse::<u32>().ok()?;
    YearMonth::new(year, month)
}

fn build_listing(
    state: &AppState,
    filter: &PostFilter,
    page: Option<&str>,
) -> Result<ListingContext, ViewError> {
    let store = state.store();
    let posts = store
        .posts(filter)
        .map_err(|e| internal_error("Failed to fetch posts", e))?;

    state
        .listing()
        .build(store, posts, page)
        .map_err(|e| internal_error("Failed to build listing", e))
}

fn internal_error(message: &'static str, err: anyhow::Error) -> ViewError {
    tracing::error!("{}: {:#}", message, err);
    ViewError::Internal(message)
}
