use axum::routing::get;
use axum::Router;

mod livez;

use super::ServerState;

pub fn router(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route("/livez", get(livez::handler))
        .with_state(state)
}
