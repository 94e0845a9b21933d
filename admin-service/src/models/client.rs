use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::Status;

/// A tenant. Contacts are embedded snapshots; admin user ids are tracked so
/// the per-client admin cap can be enforced without a collection scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-facing sequential number, unique per deployment.
    pub uid: i64,
    pub name: String,
    pub status: Status,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub number_of_sites: i64,
    #[serde(default)]
    pub number_of_users: i64,
    #[serde(default)]
    pub number_of_alerts: i64,
    #[serde(default)]
    pub admin_user_ids: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Embedded contact snapshot on a client document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
}

impl Client {
    pub fn is_live(&self) -> bool {
        self.status != Status::Archive
    }
}
