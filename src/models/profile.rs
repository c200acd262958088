use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The locally remembered user. Purely cosmetic: nothing checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub signed_in_at: Option<DateTime<Utc>>,
}
