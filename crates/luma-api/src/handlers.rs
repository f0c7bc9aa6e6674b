//! # luma-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the content store.
//! The caller's identity comes from the `X-Luma-User` header, which the auth
//! layer in front of us is trusted to set.

use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use luma_core::{ContentStore, CurrentUser, NewDraft, NewPost, PostPatch};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_HEADER: &str = "X-Luma-User";
pub const DISPLAY_NAME_HEADER: &str = "X-Luma-Display-Name";

/// State shared across all Actix-web workers.
///
/// One store serves every user; each call names the acting user.
pub struct AppState {
    pub store: Arc<ContentStore>,
}

/// The user the request acts on behalf of.
pub struct SignedIn(pub CurrentUser);

impl FromRequest for SignedIn {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(signed_in_user(req).map(SignedIn))
    }
}

fn signed_in_user(req: &HttpRequest) -> Result<CurrentUser, ApiError> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let id = header(USER_HEADER).ok_or(ApiError::MissingUser(USER_HEADER))?;
    Ok(CurrentUser {
        id,
        display_name: header(DISPLAY_NAME_HEADER),
        avatar_url: None,
    })
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct StoriesQuery {
    pub author: Option<String>,
}

// ── Feed ────────────────────────────────────────────────────────────────────

pub async fn public_feed(data: web::Data<AppState>, _user: SignedIn) -> HttpResponse {
    HttpResponse::Ok().json(data.store.public_posts().await)
}

pub async fn refresh_feed(data: web::Data<AppState>, _user: SignedIn) -> HttpResponse {
    data.store.refresh_feed().await;
    HttpResponse::Ok().json(data.store.public_posts().await)
}

pub async fn user_posts(
    data: web::Data<AppState>,
    _user: SignedIn,
    path: web::Path<String>,
) -> HttpResponse {
    let posts = data.store.user_posts(&path).await;
    HttpResponse::Ok().json(posts)
}

pub async fn my_posts(data: web::Data<AppState>, user: SignedIn) -> HttpResponse {
    HttpResponse::Ok().json(data.store.my_posts(&user.0).await)
}

pub async fn my_stats(data: web::Data<AppState>, user: SignedIn) -> HttpResponse {
    HttpResponse::Ok().json(data.store.feed_stats(&user.0).await)
}

// ── Posts ───────────────────────────────────────────────────────────────────

pub async fn create_post(
    data: web::Data<AppState>,
    user: SignedIn,
    body: web::Json<NewPost>,
) -> HttpResponse {
    let post = data.store.create_post(&user.0, body.into_inner()).await;
    HttpResponse::Created().json(post)
}

pub async fn get_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .post(&user.0, id)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn update_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
    body: web::Json<PostPatch>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .update_post(&user.0, id, body.into_inner())
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if data.store.delete_post(&user.0, id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found("Post", id))
    }
}

pub async fn pin_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .pin_post(&user.0, id)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn unpin_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .unpin_post(&user.0, id)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn share_post(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .share_post(&user.0, id)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

/// Unknown or hidden posts report all-zero stats rather than 404.
pub async fn post_stats(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> HttpResponse {
    let stats = data.store.post_stats(&user.0, path.into_inner()).await;
    HttpResponse::Ok().json(stats)
}

pub async fn add_reaction(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, kind) = path.into_inner();
    let post = data
        .store
        .add_reaction(&user.0, id, &kind)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn remove_reaction(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, kind) = path.into_inner();
    let post = data
        .store
        .remove_reaction(&user.0, id, &kind)
        .await
        .ok_or_else(|| ApiError::not_found("Post", id))?;
    Ok(HttpResponse::Ok().json(post))
}

// ── Comments ────────────────────────────────────────────────────────────────

pub async fn add_comment(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let CommentRequest { content, parent_id } = body.into_inner();
    let comment = data
        .store
        .add_comment(&user.0, post_id, &content, parent_id)
        .await
        .ok_or_else(|| match parent_id {
            Some(parent_id) => ApiError::not_found("Comment", parent_id),
            None => ApiError::not_found("Post", post_id),
        })?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn delete_comment(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if data.store.delete_comment(&user.0, id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found("Comment", id))
    }
}

// ── Stories ─────────────────────────────────────────────────────────────────

pub async fn create_story(
    data: web::Data<AppState>,
    user: SignedIn,
    body: web::Json<NewPost>,
) -> HttpResponse {
    let story = data.store.create_story(&user.0, body.into_inner()).await;
    HttpResponse::Created().json(story)
}

pub async fn active_stories(
    data: web::Data<AppState>,
    _user: SignedIn,
    query: web::Query<StoriesQuery>,
) -> HttpResponse {
    let stories = data
        .store
        .active_stories(query.author.as_deref())
        .await;
    HttpResponse::Ok().json(stories)
}

// ── Drafts ──────────────────────────────────────────────────────────────────

pub async fn list_drafts(data: web::Data<AppState>, user: SignedIn) -> HttpResponse {
    HttpResponse::Ok().json(data.store.drafts(&user.0).await)
}

pub async fn save_draft(
    data: web::Data<AppState>,
    user: SignedIn,
    body: web::Json<NewDraft>,
) -> HttpResponse {
    let draft = data.store.save_draft(&user.0, body.into_inner()).await;
    HttpResponse::Created().json(draft)
}

pub async fn update_draft(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
    body: web::Json<NewDraft>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let draft = data
        .store
        .update_draft(&user.0, id, body.into_inner())
        .await
        .ok_or_else(|| ApiError::not_found("Draft", id))?;
    Ok(HttpResponse::Ok().json(draft))
}

pub async fn delete_draft(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if data.store.delete_draft(&user.0, id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found("Draft", id))
    }
}

pub async fn publish_draft(
    data: web::Data<AppState>,
    user: SignedIn,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let post = data
        .store
        .publish_draft(&user.0, id)
        .await
        .ok_or_else(|| ApiError::not_found("Draft", id))?;
    Ok(HttpResponse::Created().json(post))
}
