pub mod broadcaster;
pub mod messages;

pub use broadcaster::TokenBroadcaster;
pub use messages::{ClientMessage, ServerMessage, SubscribeFilters, TokenUpdate};
