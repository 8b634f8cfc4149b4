//! HTTP server protected by read/write scope authorization
//!
//! Demonstrates:
//! - OAuth 2 bearer tokens with `read`, `write` and `read+write` scopes
//! - An OAuth 1 token bound to a read-only resource
//! - `AuthenticationLayer` + `ReadWriteScopeLayer` on an axum router
//!
//! Run with: cargo run --example read_write_server
//!
//! Test with curl:
//!
//! ```bash
//! # No token: 401
//! curl -i http://localhost:3000/notes
//!
//! # Read scope can list but not create
//! curl -i http://localhost:3000/notes -H "Authorization: Bearer reader"
//! curl -i -X POST http://localhost:3000/notes -H "Authorization: Bearer reader"   # 403
//!
//! # Read+write scope can do both
//! curl -i -X POST http://localhost:3000/notes -H "Authorization: Bearer editor"
//!
//! # The token may also travel in a form body
//! curl -i -X POST http://localhost:3000/notes -d "access_token=editor"
//!
//! # OAuth 1 token on a read-only resource
//! curl -i http://localhost:3000/notes -H 'Authorization: OAuth oauth_token="archive"'
//! ```

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower::ServiceBuilder;
use tower_rw_scope::oauth::{
    AuthenticationLayer, LegacyToken, ReadWriteScopeLayer, Resource, Scope, ScopedToken,
    StaticTokenProvider, Token,
};
use tower_rw_scope::{BoxError, OAuthConfig};

type Notes = Arc<Mutex<Vec<String>>>;

async fn list_notes(State(notes): State<Notes>) -> Json<Vec<String>> {
    let notes = notes.lock().map(|n| n.clone()).unwrap_or_default();
    Json(notes)
}

async fn create_note(State(notes): State<Notes>, Extension(token): Extension<Token>) -> String {
    let author = token.user().unwrap_or("anonymous").to_string();
    if let Ok(mut notes) = notes.lock() {
        notes.push(format!("note by {}", author));
    }
    format!("created by {}\n", author)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tower_rw_scope=debug".parse()?)
                .add_directive("read_write_server=debug".parse()?),
        )
        .init();

    let provider = StaticTokenProvider::new()
        .token(ScopedToken::new("reader", Scope::READ).user("alice"))
        .token(ScopedToken::new("writer", Scope::WRITE).user("bob"))
        .token(ScopedToken::new("editor", Scope::READ_WRITE).user("carol"))
        .token(LegacyToken::new("archive", Resource::new("notes").read_only()).user("dave"));

    let config = OAuthConfig::new().realm("notes");

    let app = Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .with_state(Notes::default())
        .layer(
            ServiceBuilder::new()
                .layer(AuthenticationLayer::new(provider).config(config.clone()))
                .layer(ReadWriteScopeLayer::new().config(config)),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Listening on http://127.0.0.1:3000");
    axum::serve(listener, app).await?;
    Ok(())
}
