use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A site within a client. Group membership is by name; group admin scopes
/// are snapshotted from the group's sites at grant time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(rename = "siteGroup", default)]
    pub site_group_name: String,
    #[serde(default)]
    pub number_of_users: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
