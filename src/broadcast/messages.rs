use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::server::PaginationConfig;
use crate::error::{Error, Result};
use crate::types::{QueryOptions, SortField, SortOrder, TimePeriod, TokenRecord};
use crate::utils::helper::current_timestamp_ms;

pub const SUBSCRIBE_EVENT: &str = "subscribe:tokens";
pub const UNSUBSCRIBE_EVENT: &str = "unsubscribe:tokens";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenUpdate {
    pub tokens: Vec<TokenRecord>,
    pub timestamp: u64,
}

/// Frames pushed to a subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "tokens:update")]
    Update(TokenUpdate),
    #[serde(rename = "tokens:error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn update(tokens: Vec<TokenRecord>) -> Self {
        ServerMessage::Update(TokenUpdate {
            tokens,
            timestamp: current_timestamp_ms(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }
}

/// View requested by a subscriber for its first page.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeFilters {
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub time_period: Option<String>,
}

impl SubscribeFilters {
    /// Unset filters inherit from `defaults`; the limit is clamped like a
    /// REST request.
    pub fn to_query(&self, defaults: &QueryOptions, pagination: &PaginationConfig) -> QueryOptions {
        QueryOptions {
            limit: pagination.clamp(self.limit.or(Some(defaults.limit))),
            cursor: None,
            sort_by: self.sort_by.as_deref().map(SortField::parse).unwrap_or(defaults.sort_by),
            sort_order: self.sort_order.as_deref().map(SortOrder::parse).unwrap_or(defaults.sort_order),
            time_period: self.time_period.as_deref()
                .and_then(TimePeriod::parse)
                .or(defaults.time_period),
        }
    }
}

/// Control frames sent by a client.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    Subscribe(SubscribeFilters),
    Unsubscribe,
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let frame: RawFrame = serde_json::from_str(text)?;

        match frame.event.as_str() {
            SUBSCRIBE_EVENT => {
                let filters = match frame.data {
                    None | Some(Value::Null) => SubscribeFilters::default(),
                    Some(data) => serde_json::from_value(data)?,
                };
                Ok(ClientMessage::Subscribe(filters))
            }
            UNSUBSCRIBE_EVENT => Ok(ClientMessage::Unsubscribe),
            other => Err(Error::InvalidQuery(format!("Unknown event: {}", other))),
        }
    }
}
