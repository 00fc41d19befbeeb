use crate::api::errors::ApiError;
use crate::store::Page;

pub(crate) const fn default_limit() -> i64 {
    Page::DEFAULT_LIMIT
}

/// Bounds checks for list endpoints: non-negative skip, limit within
/// (0, 1000]. A limit of zero is rejected rather than treated as unlimited.
pub(crate) fn validate_page(skip: i64, limit: i64) -> Result<Page, ApiError> {
    if skip < 0 {
        return Err(ApiError::BadRequest("skip must be non-negative".to_string()));
    }
    if limit <= 0 || limit > Page::MAX_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            Page::MAX_LIMIT
        )));
    }
    Ok(Page { skip, limit })
}
