//! Wire envelope.
//!
//! The JSON message unit exchanged over the live connection, discriminated
//! by the `type` field. Decoding is strict: a frame whose `type` matches no
//! variant fails to decode and is dropped by the inbound relay instead of
//! being routed as ordinary text.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatStatus, User};

/// Synthetic identity attached to assistant replies.
const ASSISTANT_ID: i64 = 100_000_000_000_000_000;
const ASSISTANT_EMAIL: &str = "assistant@chat-relay.net";

/// Sender profile snapshot attached server-side to every fanned-out
/// envelope. `admin` is only populated on room topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub chat_status: ChatStatus,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

impl UserSnapshot {
    /// Snapshot a user's profile.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            chat_status: user.chat_status,
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            admin: None,
        }
    }

    /// Attach the room admin flag.
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = Some(admin);
        self
    }

    /// The synthetic assistant persona used for streamed completions.
    pub fn assistant() -> Self {
        Self {
            id: ASSISTANT_ID,
            first_name: "Assistant".to_string(),
            last_name: String::new(),
            bio: None,
            chat_status: ChatStatus::Online,
            email: ASSISTANT_EMAIL.to_string(),
            phone_number: None,
            admin: None,
        }
    }
}

/// The wire message, tagged by `type`.
///
/// `online`/`offline` are synthesized by the session itself (presence
/// announcements), never authored by a client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    /// Ordinary chat message
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Media message: inbound carries base64 in `content`; after storage
    /// `media` holds the stored address and `content` is cleared.
    Media {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preview: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Client-initiated disconnect; terminal for the session
    Leave {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Ban a member (sender must be room admin); target addressed by email
    Ban {
        receiver: String,
        room_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Lift a ban
    Unban {
        receiver: String,
        room_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Streaming assistant exchange: inbound carries the prompt; outbound
    /// envelopes carry the accumulated reply, one per chunk
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<UserSnapshot>,
    },

    /// Presence announcement (server-synthesized)
    Online {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_name: Option<String>,
        user: UserSnapshot,
    },

    /// Presence announcement (server-synthesized)
    Offline {
        content: String,
        user: UserSnapshot,
    },
}

impl Envelope {
    /// Decode a client frame. Fails on malformed JSON or an unknown `type`.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode for publishing.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Wire-level type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Envelope::Text { .. } => "text",
            Envelope::Media { .. } => "media",
            Envelope::Leave { .. } => "leave",
            Envelope::Ban { .. } => "ban",
            Envelope::Unban { .. } => "unban",
            Envelope::Assistant { .. } => "assistant",
            Envelope::Online { .. } => "online",
            Envelope::Offline { .. } => "offline",
        }
    }

    /// Attach the sender snapshot (no-op for presence announcements,
    /// which carry a mandatory snapshot already).
    pub fn attach_user(&mut self, snapshot: UserSnapshot) {
        match self {
            Envelope::Text { user, .. }
            | Envelope::Media { user, .. }
            | Envelope::Leave { user }
            | Envelope::Ban { user, .. }
            | Envelope::Unban { user, .. }
            | Envelope::Assistant { user, .. } => *user = Some(snapshot),
            Envelope::Online { .. } | Envelope::Offline { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_text_frame() {
        let envelope = Envelope::decode(r#"{"type":"text","content":"hi"}"#).unwrap();
        assert_eq!(
            envelope,
            Envelope::Text {
                content: "hi".to_string(),
                room_name: None,
                receiver: None,
                user: None,
            }
        );
    }

    #[test]
    fn test_decode_ban_frame() {
        let envelope = Envelope::decode(
            r#"{"type":"ban","receiver":"troll@example.com","room_name":"nerds"}"#,
        )
        .unwrap();
        assert_eq!(envelope.type_name(), "ban");
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(Envelope::decode(r#"{"type":"wat","content":"hi"}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(Envelope::decode("not json at all").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_required_fields() {
        // ban without a target is not a valid frame
        assert!(Envelope::decode(r#"{"type":"ban"}"#).is_err());
    }

    #[test]
    fn test_encode_tags_variant() {
        let envelope = Envelope::Leave { user: None };
        assert_eq!(envelope.encode().unwrap(), r#"{"type":"leave"}"#);
    }

    #[test]
    fn test_attach_user_sets_snapshot() {
        let mut envelope = Envelope::decode(r#"{"type":"text","content":"hi"}"#).unwrap();
        let snapshot = UserSnapshot::assistant();
        envelope.attach_user(snapshot.clone());
        match envelope {
            Envelope::Text { user, .. } => assert_eq!(user, Some(snapshot)),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_admin_flag_only_serialized_when_set() {
        let plain = UserSnapshot::assistant();
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("admin"));

        let flagged = plain.with_admin(true);
        let json = serde_json::to_string(&flagged).unwrap();
        assert!(json.contains("\"admin\":true"));
    }
}
