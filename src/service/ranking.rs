use crate::types::{PaginatedResult, Pagination, SortField, SortOrder, TokenRecord};

/// Stable numeric sort on one field. Equal keys keep their input order in
/// both directions.
pub fn sort_tokens(tokens: &mut [TokenRecord], field: SortField, order: SortOrder) {
    tokens.sort_by(|a, b| {
        let ord = field.value_of(a).total_cmp(&field.value_of(b));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Slice `[offset, offset + limit)` out of `tokens`.
///
/// A non-positive limit yields an empty page; a limit past the end yields the
/// remainder. `has_more` is `offset + limit < total` and the next cursor is
/// the decimal end offset, present only when `has_more`.
pub fn paginate(tokens: &[TokenRecord], offset: usize, limit: i64) -> PaginatedResult {
    let total = tokens.len() as i64;
    let start = i64::try_from(offset).unwrap_or(i64::MAX);
    let end = start.saturating_add(limit);

    let data = if limit <= 0 || start >= total {
        Vec::new()
    } else {
        tokens[start as usize..end.min(total) as usize].to_vec()
    };

    let has_more = end < total;
    PaginatedResult {
        data,
        pagination: Pagination {
            limit,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        },
    }
}
