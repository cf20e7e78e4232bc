use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    /// Subject issued by the identity provider.
    pub external_id: String,
    pub email: String,
    pub credits: i32,
    pub credits_reset_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSessionRow {
    pub id: Uuid,
    pub used_free_credit: bool,
    pub created_at: DateTime<Utc>,
}
