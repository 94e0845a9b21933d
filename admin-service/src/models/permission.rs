use serde::{Deserialize, Serialize};

/// Role tags stored on accounts and carried inside permission grants.
pub mod roles {
    pub const SUPER_ADMIN: &str = "SA";
    pub const ACCOUNT_MANAGER: &str = "AM";
    pub const CLIENT_ADMIN: &str = "CSA";
    pub const GROUP_ADMIN: &str = "GA";
    pub const SITE_MANAGER: &str = "SM";
    pub const SITE_USER: &str = "SU";
    pub const CLIENT_CONTACT: &str = "CC";
    pub const RESERVED: &str = "SS";
}

/// Resource types a scope may name.
pub mod resource_types {
    pub const CLIENT: &str = "client";
    pub const SITE: &str = "site";
    pub const USER: &str = "user";
}

/// A role tag. Comparison is case-insensitive so that tokens minted by
/// older systems with lowercased tags keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    pub fn new(tag: impl Into<String>) -> Self {
        Role(tag.into())
    }

    pub fn is(&self, tag: &str) -> bool {
        self.0.eq_ignore_ascii_case(tag)
    }
}

impl From<&str> for Role {
    fn from(tag: &str) -> Self {
        Role(tag.to_string())
    }
}

/// One grant inside a permission: a set of resource types paired with the
/// concrete resource ids the grant covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scope {
    #[serde(rename = "resources", default)]
    pub resource_types: Vec<String>,
    #[serde(default)]
    pub ids: Vec<String>,
}

impl Scope {
    pub fn new(resource_types: Vec<String>, ids: Vec<String>) -> Self {
        Scope {
            resource_types,
            ids,
        }
    }

    /// Whether this scope names the given resource type.
    pub fn covers(&self, resource_type: &str) -> bool {
        self.resource_types
            .iter()
            .any(|r| r.eq_ignore_ascii_case(resource_type))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// A scope with a resource type but no ids grants nothing; both sides
    /// must be non-empty for the scope to participate in evaluation.
    pub fn is_well_formed(&self) -> bool {
        !self.resource_types.is_empty() && !self.ids.is_empty()
    }
}

/// A role and the scopes it was granted under. An account carries a list of
/// these; evaluation is the union over every permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub role: Role,
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

impl Permission {
    pub fn new(role: impl Into<String>, scopes: Vec<Scope>) -> Self {
        Permission {
            role: Role::new(role),
            scopes,
        }
    }

    /// Super admins are unscoped: the role alone grants everything.
    pub fn grants_all(&self) -> bool {
        self.role.is(roles::SUPER_ADMIN)
    }

    /// Ids this permission grants for the given resource type.
    pub fn ids_for<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.scopes
            .iter()
            .filter(move |s| s.is_well_formed() && s.covers(resource_type))
            .flat_map(|s| s.ids.iter().map(String::as_str))
    }
}

/// Kind of resource an access check targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Client,
    Site,
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Client => resource_types::CLIENT,
            ResourceKind::Site => resource_types::SITE,
            ResourceKind::User => resource_types::USER,
        }
    }
}

/// JWT claim set. `exp` is validated by the session layer, not by the
/// decoder, so that an expired token yields its own error code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(rename = "clientId", default)]
    pub client_id: String,
    #[serde(rename = "siteId", default)]
    pub site_id: String,
    #[serde(default)]
    pub iat: i64,
    /// Unique per issued token, so that two logins in the same second still
    /// mint distinct token strings.
    #[serde(default)]
    pub jti: String,
    pub exp: i64,
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Active,
    Inactive,
    NoAccess,
    Archive,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
            Status::NoAccess => "noAccess",
            Status::Archive => "archive",
        }
    }
}
