//! Commons Core - Conversation Sync and Messaging
//!
//! This crate provides the realtime messaging core of the Commons
//! community marketplace: conversation discovery, participant
//! bootstrapping, live message subscriptions, and deduplicated
//! message rendering over a SurrealDB backend.

pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod id;
pub mod profile;
pub mod session;

// Macros are automatically available at crate root due to #[macro_export]

pub use chat::{
    ChatMessage, ChatView, ConversationSummary, FeedState, LiveMessages, MessageComposer,
    MessageFeed, SendOutcome,
};
pub use config::CommonsConfig;
pub use error::{CoreError, Result};
pub use id::{ConversationId, Id, IdType, MessageId, UserId};
pub use profile::Profile;
pub use session::{AuthProvider, ConfigAuth, Session};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AuthProvider, ChatMessage, ChatView, CommonsConfig, ConversationId, ConversationSummary,
        CoreError, FeedState, Id, IdType, LiveMessages, MessageComposer, MessageFeed, MessageId,
        Profile, Result, SendOutcome, Session, UserId,
    };
}
