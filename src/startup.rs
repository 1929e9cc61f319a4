//! Application Startup
//!
//! Application building and server initialization.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::domain::{MessageRepository, RoomRepository, UserRepository};
use crate::infrastructure::assistant::{CompletionClient, OpenAiCompletionClient};
use crate::infrastructure::broker::{Broker, RedisBroker};
use crate::infrastructure::database;
use crate::infrastructure::media::{LocalMediaStore, MediaStore};
use crate::infrastructure::repositories::{
    PgMessageRepository, PgRoomRepository, PgUserRepository,
};
use crate::presentation::websocket::create_router;

/// Application state shared across handlers.
///
/// Everything the relay consumes is behind a trait object so tests can
/// swap in the in-memory broker and mocked repositories.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<dyn Broker>,
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub media: Arc<dyn MediaStore>,
    pub assistant: Arc<dyn CompletionClient>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        // Connect the pub/sub broker
        let broker = RedisBroker::connect(&settings.redis).await?;
        tracing::info!("Broker connection established");

        // Create app state
        let state = AppState {
            broker: Arc::new(broker),
            users: Arc::new(PgUserRepository::new(db.clone())),
            rooms: Arc::new(PgRoomRepository::new(db.clone())),
            messages: Arc::new(PgMessageRepository::new(db)),
            media: Arc::new(LocalMediaStore::new(&settings.media)),
            assistant: Arc::new(OpenAiCompletionClient::new(settings.assistant.clone())),
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = create_router(state).layer(TraceLayer::new_for_http());

        // Bind to address
        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
