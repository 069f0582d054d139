use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domain::model::{Collection, Product, ProductDraft};
use crate::domain::ports::{AdminUser, ImageUpload, Session};
use crate::domain::view::{HomePage, ProductCard, ProductDetail, SearchResults};
use crate::server::auth::IdToken;
use crate::server::state::AppState;
use crate::utils::error::{KyoError, Result};

pub async fn healthz() -> &'static str {
    "ok"
}

// Storefront

pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    Ok(Json(state.catalog.home().await?))
}

pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<ProductCard>>> {
    Ok(Json(state.catalog.banners().await?))
}

pub async fn new_arrivals(State(state): State<AppState>) -> Result<Json<Vec<ProductCard>>> {
    Ok(Json(state.catalog.new_arrivals().await?))
}

pub async fn all_categories(State(state): State<AppState>) -> Result<Json<Vec<ProductCard>>> {
    Ok(Json(state.catalog.all_categories().await?))
}

pub async fn product(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<ProductDetail>> {
    let collection: Collection = collection.parse()?;
    Ok(Json(state.catalog.product(collection, &id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>> {
    Ok(Json(state.catalog.search(&query.q).await?))
}

// Sessions

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>> {
    let session = state.identity.sign_in(&request.email, &request.password).await?;
    Ok(Json(session))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Session>> {
    Ok(Json(state.identity.refresh(&request.refresh_token).await?))
}

pub async fn me(Extension(user): Extension<AdminUser>) -> Json<AdminUser> {
    Json(user)
}

// Admin

#[derive(Debug, Serialize)]
pub struct RecordId {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub urls: Vec<String>,
}

pub async fn admin_list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let collection: Collection = collection.parse()?;
    Ok(Json(state.admin.list(collection).await?))
}

pub async fn admin_create(
    State(state): State<AppState>,
    Extension(IdToken(token)): Extension<IdToken>,
    Path(collection): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<impl IntoResponse> {
    let collection: Collection = collection.parse()?;
    let id = state.admin.create(collection, &draft, &token).await?;
    Ok((StatusCode::CREATED, Json(RecordId { id })))
}

pub async fn admin_draft(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<ProductDraft>> {
    let collection: Collection = collection.parse()?;
    Ok(Json(state.admin.draft(collection, &id).await?))
}

pub async fn admin_update(
    State(state): State<AppState>,
    Extension(IdToken(token)): Extension<IdToken>,
    Path((collection, id)): Path<(String, String)>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<RecordId>> {
    let collection: Collection = collection.parse()?;
    state.admin.update(collection, &id, &draft, &token).await?;
    Ok(Json(RecordId { id }))
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Extension(IdToken(token)): Extension<IdToken>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let collection: Collection = collection.parse()?;
    state.admin.delete(collection, &id, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepts one or more `file` parts; other parts are ignored.
pub async fn admin_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Uploaded>> {
    let limit = state.admin.limits().body_limit();
    let rejected = |e: MultipartError| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => KyoError::PayloadTooLarge { limit },
        _ => KyoError::validation(e.body_text()),
    };
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(rejected)?;

        files.push(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let urls = state.admin.upload_images(files).await?;
    Ok(Json(Uploaded { urls }))
}
