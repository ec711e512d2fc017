use serde::{Deserialize, Serialize};
use std::fmt;
use crate::types::token::TokenRecord;

pub const DEFAULT_PAGE_LIMIT: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortField {
    #[default]
    #[serde(rename = "volume_sol")]
    Volume,
    #[serde(rename = "price_1hr_change")]
    PriceChange1h,
    #[serde(rename = "market_cap_sol")]
    MarketCap,
    #[serde(rename = "liquidity_sol")]
    Liquidity,
}

impl SortField {
    /// Unknown names fall back to trading volume.
    pub fn parse(s: &str) -> Self {
        match s {
            "price_1hr_change" => SortField::PriceChange1h,
            "market_cap_sol" => SortField::MarketCap,
            "liquidity_sol" => SortField::Liquidity,
            _ => SortField::Volume,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Volume => "volume_sol",
            SortField::PriceChange1h => "price_1hr_change",
            SortField::MarketCap => "market_cap_sol",
            SortField::Liquidity => "liquidity_sol",
        }
    }

    pub fn value_of(&self, token: &TokenRecord) -> f64 {
        match self {
            SortField::Volume => token.volume_sol,
            SortField::PriceChange1h => token.price_1hr_change,
            SortField::MarketCap => token.market_cap_sol,
            SortField::Liquidity => token.liquidity_sol,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than "asc" is descending.
    pub fn parse(s: &str) -> Self {
        if s == "asc" { SortOrder::Asc } else { SortOrder::Desc }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive only: carried through a query but does not change the fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
}

impl TimePeriod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(TimePeriod::OneHour),
            "24h" => Some(TimePeriod::TwentyFourHours),
            "7d" => Some(TimePeriod::SevenDays),
            _ => None,
        }
    }
}

/// Options for a single `get_tokens` call.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    pub limit: i64,
    pub cursor: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub time_period: Option<TimePeriod>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            limit: DEFAULT_PAGE_LIMIT,
            cursor: None,
            sort_by: SortField::Volume,
            sort_order: SortOrder::Desc,
            time_period: Some(TimePeriod::TwentyFourHours),
        }
    }
}

impl QueryOptions {
    pub fn new(limit: i64, sort_by: SortField, sort_order: SortOrder) -> Self {
        QueryOptions {
            limit,
            sort_by,
            sort_order,
            ..Default::default()
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_time_period(mut self, time_period: Option<TimePeriod>) -> Self {
        self.time_period = time_period;
        self
    }

    /// Absolute start offset encoded in the cursor; absent or unparsable is 0.
    pub fn offset(&self) -> usize {
        self.cursor
            .as_deref()
            .and_then(|c| c.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T = TokenRecord> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
