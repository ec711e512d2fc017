pub mod ids;
pub mod query;
pub mod token;

pub use ids::ConnectionId;
pub use query::{PaginatedResult, Pagination, QueryOptions, SortField, SortOrder, TimePeriod};
pub use token::TokenRecord;
