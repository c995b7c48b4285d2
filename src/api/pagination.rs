use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 500;

pub(crate) const fn default_limit() -> i64 {
    100
}

/// Query string shared by back-office list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    #[serde(alias = "includeDisabled")]
    pub(crate) include_disabled: bool,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl ListQuery {
    /// `(skip, limit)` with negative values zeroed and the limit capped.
    pub(crate) fn window(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(0, MAX_LIMIT))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}
