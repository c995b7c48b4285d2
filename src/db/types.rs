use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Lifecycle of one exam attempt. Only moves forward out of `Answering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "resultstatus", rename_all = "snake_case")]
pub(crate) enum ResultStatus {
    Answering,
    TimeUp,
    Finished,
}

impl ResultStatus {
    /// Numeric code used by reports (`0` answering, `1` time up, `2` finished).
    pub(crate) fn code(self) -> i16 {
        match self {
            Self::Answering => 0,
            Self::TimeUp => 1,
            Self::Finished => 2,
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        !matches!(self, Self::Answering)
    }
}
