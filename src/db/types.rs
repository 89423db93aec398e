use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Attempt lifecycle. A row only exists once the student has started, so
/// the pre-registration state has no database representation; submission
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptstatus", rename_all = "snake_case")]
pub(crate) enum AttemptStatus {
    InProgress,
    Submitted,
}
