pub mod auth;
pub mod error;
pub mod feed;
pub mod middleware;
pub mod posts;
pub mod state;
pub mod suggest;
pub mod users;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hushpost_types::api::{Empty, Envelope};

pub use state::{AppState, AppStateInner};

/// Build the full HTTP surface.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/check-username", get(users::check_username))
        .route("/users/{username}/posts", get(users::user_posts))
        .route("/posts/explore", get(feed::explore))
        .route("/posts/{post_id}", get(posts::get_public_post))
        .route("/posts/{post_id}/replies", post(posts::append_reply))
        .route("/suggest-messages", post(suggest::suggest_messages));

    let owner_routes = Router::new()
        .route("/posts", get(posts::list_own_posts).post(posts::create_post))
        .route("/posts/{post_id}", delete(posts::delete_post))
        .route("/posts/{post_id}/toggle-messages", patch(posts::toggle_messages))
        .route("/posts/{post_id}/replies/{reply_id}", delete(posts::remove_reply))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(owner_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<Envelope<Empty>> {
    Json(Envelope::ok(Empty {}))
}
