use axum::routing::get;
use axum::Router;

mod error;
pub mod images;

pub use error::ApiError;

use super::ServerState;

pub fn router(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route(
            "/images/:group",
            get(images::list_handler).post(images::upload_handler),
        )
        .route("/images/:group/:name", get(images::get_handler))
        .route("/images/:group/:name/meta", get(images::meta_handler))
        .with_state(state)
}
