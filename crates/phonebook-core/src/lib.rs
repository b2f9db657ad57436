pub mod api;
pub mod cache;
pub mod config;
pub mod conversation;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod gate;
pub mod images;
pub mod mode;
pub mod payload;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use api::ApiClient;
pub use cache::{ConversationCache, Snapshot};
pub use config::Config;
pub use conversation::{Conversation, Request, Ticket};
pub use dashboard::{DashboardFeed, FeedState};
pub use error::{ApiError, GateError};
pub use gate::Gate;
pub use mode::Mode;
pub use payload::{Article, Body, CompanyProfile, ImageBatch, NewsDigest, PersonProfile};
pub use state::{Message, MessageId, Sender};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, SharedStorage};
