use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::{Permission, Status, roles};

/// A login-capable account. Admin users, site users and client contacts all
/// live in one collection; the `admin_user_type` / `site_user_type` fields
/// decide which kind a given document is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "password", default)]
    pub password_hash: String,
    pub status: Status,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub activation_code: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    /// "email" or "phone"; phone requires a phone number on file.
    #[serde(default)]
    pub contact_preference: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub admin_user_type: String,
    #[serde(default)]
    pub site_user_type: String,
    #[serde(rename = "siteUserGroup", default)]
    pub site_group_name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        with = "optional_chrono_datetime_as_bson_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login_at: Option<DateTime<Utc>>,
}

pub mod optional_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match val {
            Some(date) => {
                mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime::serialize(
                    date, serializer,
                )
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapper(
            #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
            DateTime<Utc>,
        );

        let wrapper = Option::<Wrapper>::deserialize(deserializer)?;
        Ok(wrapper.map(|w| w.0))
    }
}

/// Which flavor of account a document represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Admin,
    Site,
    Contact,
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        if !self.admin_user_type.is_empty() {
            AccountKind::Admin
        } else if !self.site_user_type.is_empty() {
            AccountKind::Site
        } else {
            AccountKind::Contact
        }
    }

    /// The primary role tag of this account: admin type, site type, or CC
    /// for contacts.
    pub fn role_tag(&self) -> &str {
        if !self.admin_user_type.is_empty() {
            &self.admin_user_type
        } else if !self.site_user_type.is_empty() {
            &self.site_user_type
        } else {
            roles::CLIENT_CONTACT
        }
    }

    pub fn has_role(&self, tag: &str) -> bool {
        self.permissions.iter().any(|p| p.role.is(tag))
            || self.role_tag().eq_ignore_ascii_case(tag)
    }

    /// Contacts and the reserved role never log in, so they never go
    /// through activation.
    pub fn is_confirmable(&self) -> bool {
        let tag = self.role_tag();
        !tag.eq_ignore_ascii_case(roles::CLIENT_CONTACT)
            && !tag.eq_ignore_ascii_case(roles::RESERVED)
    }
}
