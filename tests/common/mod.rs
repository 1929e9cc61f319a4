//! Common Test Utilities
//!
//! Fixtures, repository mocks and a channel-backed socket harness for
//! driving relay sessions without a real WebSocket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message;
use chrono::Utc;
use futures::channel::mpsc;
use futures::StreamExt;
use mockall::mock;
use mockall::predicate::eq;
use tokio::time::timeout;

use chat_relay::config::{
    AssistantSettings, DatabaseSettings, MediaSettings, RedisSettings, ServerSettings, Settings,
};
use chat_relay::domain::{
    ChatStatus, MessageRepository, NewMessage, Room, RoomMember, RoomRepository, User,
    UserRepository,
};
use chat_relay::infrastructure::assistant::{ChunkStream, CompletionClient};
use chat_relay::infrastructure::broker::{Broker, MemoryBroker, Subscription};
use chat_relay::infrastructure::media::MediaStore;
use chat_relay::presentation::websocket::{run_session, ChannelKind};
use chat_relay::shared::AppError;
use chat_relay::startup::AppState;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

mock! {
    pub Users {}

    #[async_trait]
    impl UserRepository for Users {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
        async fn update_chat_status(&self, id: i64, status: ChatStatus) -> Result<(), AppError>;
    }
}

mock! {
    pub Rooms {}

    #[async_trait]
    impl RoomRepository for Rooms {
        async fn find_by_name(&self, room_name: &str) -> Result<Option<Room>, AppError>;
        async fn find_admin(
            &self,
            user_id: i64,
            room_id: i64,
        ) -> Result<Option<RoomMember>, AppError>;
        async fn ban_member(
            &self,
            admin_id: i64,
            target_email: &str,
            room_name: &str,
        ) -> Result<(), AppError>;
        async fn unban_member(
            &self,
            admin_id: i64,
            target_email: &str,
            room_name: &str,
        ) -> Result<(), AppError>;
    }
}

mock! {
    pub Messages {}

    #[async_trait]
    impl MessageRepository for Messages {
        async fn create(&self, message: &NewMessage) -> Result<(), AppError>;
    }
}

mock! {
    pub Media {}

    #[async_trait]
    impl MediaStore for Media {
        async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError>;
    }
}

mock! {
    pub Assistant {}

    #[async_trait]
    impl CompletionClient for Assistant {
        async fn stream_completion(&self, prompt: &str) -> Result<ChunkStream, AppError>;
    }
}

/// Test user fixture.
pub fn user(id: i64, first_name: &str, email: &str) -> User {
    User {
        id,
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: email.to_string(),
        phone_number: None,
        bio: None,
        chat_status: ChatStatus::Offline,
        created_at: Utc::now(),
    }
}

/// Test room fixture.
pub fn room(id: i64, room_name: &str) -> Room {
    Room {
        id,
        room_name: room_name.to_string(),
        description: None,
        created_at: Utc::now(),
    }
}

/// Users mock resolving the given (id, first_name, email) triples and
/// accepting any presence update.
pub fn happy_users(specs: &[(i64, &str, &str)]) -> MockUsers {
    let mut users = MockUsers::new();
    for &(id, first_name, email) in specs {
        let fixture = user(id, first_name, email);
        users
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(fixture.clone())));
    }
    users.expect_update_chat_status().returning(|_, _| Ok(()));
    users
}

/// Rooms mock resolving every name to `room_id` and treating `admins`
/// as the room's admin set.
pub fn happy_rooms(room_id: i64, admins: Vec<i64>) -> MockRooms {
    let mut rooms = MockRooms::new();
    rooms
        .expect_find_by_name()
        .returning(move |name| Ok(Some(room(room_id, name))));
    rooms.expect_find_admin().returning(move |user_id, room_id| {
        Ok(admins.contains(&user_id).then(|| RoomMember {
            room_id,
            member_id: user_id,
            banned: false,
            admin: true,
        }))
    });
    rooms
}

/// Messages mock accepting every persistence call.
pub fn happy_messages() -> MockMessages {
    let mut messages = MockMessages::new();
    messages.expect_create().returning(|_| Ok(()));
    messages
}

/// Assemble an AppState around a shared in-memory broker.
pub fn app_state(
    broker: Arc<MemoryBroker>,
    users: MockUsers,
    rooms: MockRooms,
    messages: MockMessages,
    media: MockMedia,
    assistant: MockAssistant,
) -> AppState {
    AppState {
        broker,
        users: Arc::new(users),
        rooms: Arc::new(rooms),
        messages: Arc::new(messages),
        media: Arc::new(media),
        assistant: Arc::new(assistant),
        settings: Arc::new(test_settings()),
    }
}

/// Settings fixture; nothing network-facing is dialed in tests.
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://localhost/test".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 1,
        },
        redis: RedisSettings {
            url: "redis://localhost:6379".to_string(),
        },
        media: MediaSettings {
            root_dir: "/tmp".to_string(),
            base_path: "/media".to_string(),
        },
        assistant: AssistantSettings {
            api_key: String::new(),
            model: "test-model".to_string(),
            base_url: "http://localhost".to_string(),
        },
        environment: "test".to_string(),
    }
}

/// A session driven over in-process channels instead of a WebSocket.
pub struct TestClient {
    pub to_server: mpsc::UnboundedSender<Result<Message, axum::Error>>,
    pub from_server: mpsc::UnboundedReceiver<Message>,
    pub session: tokio::task::JoinHandle<Result<(), AppError>>,
}

/// Spawn a session for `sender_id` on `channel`.
pub fn connect(state: &AppState, sender_id: i64, channel: ChannelKind) -> TestClient {
    let (to_server, reader) = mpsc::unbounded();
    let (writer, from_server) = mpsc::unbounded();
    let state = state.clone();
    let session = tokio::spawn(async move {
        run_session(reader, writer, &state, sender_id, channel).await
    });
    TestClient {
        to_server,
        from_server,
        session,
    }
}

impl TestClient {
    /// Send a raw JSON text frame to the session.
    pub fn send_json(&self, json: &str) {
        self.to_server
            .unbounded_send(Ok(Message::Text(json.into())))
            .expect("session reader dropped");
    }

    /// Receive the next text frame, decoded as JSON. Skips non-text frames.
    pub async fn next_envelope(&mut self) -> serde_json::Value {
        loop {
            let frame = timeout(RECV_TIMEOUT, self.from_server.next())
                .await
                .expect("timed out waiting for frame")
                .expect("socket closed while waiting for frame");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("frame is not JSON");
            }
        }
    }
}

/// Open an observer subscription directly on the broker.
pub async fn observe(broker: &MemoryBroker, topic: &str) -> Box<dyn Subscription> {
    broker.subscribe(topic).await.expect("subscribe failed")
}

/// Next published payload on an observer subscription, decoded as JSON.
pub async fn next_published(subscription: &mut Box<dyn Subscription>) -> serde_json::Value {
    let payload = timeout(RECV_TIMEOUT, subscription.next_message())
        .await
        .expect("timed out waiting for publish")
        .expect("subscription closed");
    serde_json::from_str(&payload).expect("published payload is not JSON")
}
