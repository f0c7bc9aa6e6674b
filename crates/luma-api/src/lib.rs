//! # luma-api
//!
//! The JSON routing and orchestration layer for the Luma content store.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use handlers::AppState;

/// Configures the routes for the content API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Feed and derived views
            .route("/feed", web::get().to(handlers::public_feed))
            .route("/feed/refresh", web::post().to(handlers::refresh_feed))
            .route("/users/{user_id}/posts", web::get().to(handlers::user_posts))
            .route("/me/posts", web::get().to(handlers::my_posts))
            .route("/me/stats", web::get().to(handlers::my_stats))
            // Posts
            .route("/posts", web::post().to(handlers::create_post))
            .route("/posts/{id}", web::get().to(handlers::get_post))
            .route("/posts/{id}", web::patch().to(handlers::update_post))
            .route("/posts/{id}", web::delete().to(handlers::delete_post))
            .route("/posts/{id}/pin", web::post().to(handlers::pin_post))
            .route("/posts/{id}/unpin", web::post().to(handlers::unpin_post))
            .route("/posts/{id}/share", web::post().to(handlers::share_post))
            .route("/posts/{id}/stats", web::get().to(handlers::post_stats))
            .route("/posts/{id}/reactions/{kind}", web::post().to(handlers::add_reaction))
            .route("/posts/{id}/reactions/{kind}", web::delete().to(handlers::remove_reaction))
            // Comments
            .route("/posts/{id}/comments", web::post().to(handlers::add_comment))
            .route("/comments/{id}", web::delete().to(handlers::delete_comment))
            // Stories
            .route("/stories", web::post().to(handlers::create_story))
            .route("/stories", web::get().to(handlers::active_stories))
            // Drafts
            .route("/drafts", web::get().to(handlers::list_drafts))
            .route("/drafts", web::post().to(handlers::save_draft))
            .route("/drafts/{id}", web::patch().to(handlers::update_draft))
            .route("/drafts/{id}", web::delete().to(handlers::delete_draft))
            .route("/drafts/{id}/publish", web::post().to(handlers::publish_draft)),
    );
}
