//! HTTP request handlers.

use crate::auth::NewUser;
use crate::book::{BookRequest, BookResponse, BorrowedBookResponse};
use crate::db;
use crate::error::{AppError, Result};
use crate::feedback::{FeedbackRequest, FeedbackResponse};
use crate::page::{DEFAULT_PAGE_SIZE, PageRequest, PageResponse};
use crate::server::AppState;
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

/// Service name and version.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    title: String,
    version: &'static str,
}

/// Index: configured service title and crate version.
pub async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        title: state.config.server.title.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

// ============================================================================
// AUTH API
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    token: String,
    user_id: String,
    full_name: String,
}

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    firstname: String,
    lastname: String,
    email: String,
    password: String,
}

/// Auth login.
pub async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.auth.login(&req.email, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        full_name: user.full_name(),
        user_id: user.id,
    }))
}

/// Auth register.
pub async fn auth_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>)> {
    state.auth.register(NewUser {
        firstname: &req.firstname,
        lastname: &req.lastname,
        email: &req.email,
        password: &req.password,
    })?;
    let (user, token) = state.auth.login(&req.email, &req.password)?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            full_name: user.full_name(),
            user_id: user.id,
        }),
    ))
}

/// Auth logout.
pub async fn auth_logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token)?;
    }
    Ok(StatusCode::OK)
}

/// Get current user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<db::User>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(user))
}

// ============================================================================
// BOOKS API
// ============================================================================

/// Paging query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PageParams {
    fn request(&self) -> Result<PageRequest> {
        PageRequest::new(self.page, self.size)
    }
}

/// Save a new book owned by the caller.
pub async fn book_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<i64>)> {
    let user = get_authenticated_user(&state, &headers).await?;
    let id = state.books.save(req, &user)?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Get one book.
pub async fn book_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>> {
    get_authenticated_user(&state, &headers).await?;
    let books = state.books.clone();
    Ok(Json(blocking(move || books.find_by_id(id)).await?))
}

/// Books the caller may borrow.
pub async fn book_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<BookResponse>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let req = params.request()?;
    let books = state.books.clone();
    Ok(Json(
        blocking(move || books.find_all_books(req, &user)).await?,
    ))
}

/// Books owned by the caller.
pub async fn book_list_owned(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<BookResponse>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    let req = params.request()?;
    let books = state.books.clone();
    Ok(Json(
        blocking(move || books.find_all_books_by_owner(req, &user)).await?,
    ))
}

/// Books the caller has borrowed.
pub async fn book_list_borrowed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<BorrowedBookResponse>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(
        state
            .books
            .find_all_borrowed_books(params.request()?, &user)?,
    ))
}

/// Loans of the caller's books.
pub async fn book_list_returned(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<BorrowedBookResponse>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(
        state
            .books
            .find_all_returned_books(params.request()?, &user)?,
    ))
}

/// Toggle shareable.
pub async fn book_toggle_shareable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<i64>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.books.toggle_shareable(id, &user)?))
}

/// Toggle archived.
pub async fn book_toggle_archived(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<i64>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.books.toggle_archived(id, &user)?))
}

/// Borrow a book.
pub async fn book_borrow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<i64>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.books.borrow(id, &user)?))
}

/// Return a borrowed book.
pub async fn book_return(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<i64>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.books.return_book(id, &user)?))
}

/// Approve a return.
pub async fn book_approve_return(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<i64>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.books.approve_return(id, &user)?))
}

/// Cover upload parameters.
#[derive(Debug, Deserialize)]
pub struct CoverParams {
    filename: Option<String>,
}

/// Upload a cover (raw request body).
pub async fn book_upload_cover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<CoverParams>,
    body: Bytes,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers).await?;
    let file_name = params.filename.unwrap_or_default();
    state.books.upload_cover(id, &body, &file_name, &user)?;
    Ok(StatusCode::ACCEPTED)
}

/// Stream a stored cover.
pub async fn book_cover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response<Body>> {
    get_authenticated_user(&state, &headers).await?;

    let path = state
        .books
        .cover_path(id)?
        .ok_or_else(|| AppError::NotFound(format!("Book {} has no cover", id)))?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::warn!(path = %path, error = %e, "Cover file missing");
        AppError::NotFound(format!("Cover of book {} is unavailable", id))
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image_mime_type(&path))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn image_mime_type(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// FEEDBACK API
// ============================================================================

/// Leave feedback.
pub async fn feedback_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<i64>)> {
    let user = get_authenticated_user(&state, &headers).await?;
    let id = state.feedback.save(req, &user)?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Feedback on a book.
pub async fn feedback_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<FeedbackResponse>>> {
    let user = get_authenticated_user(&state, &headers).await?;
    Ok(Json(state.feedback.find_all_by_book(
        book_id,
        params.request()?,
        &user,
    )?))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Run a service call that reads cover files off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Extract token from Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Get authenticated user from token.
async fn get_authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<db::User> {
    let token = extract_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    state
        .auth
        .validate_token(&token)?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
}
