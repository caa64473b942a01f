//! In-process response cache and conversation history.

pub mod cache;
pub mod context;

pub use cache::{CacheStats, ResponseCache};
pub use context::{ConversationContext, ConversationTurn};
