use serde::Deserialize;

use crate::models::account::{Account, AccountKind};
use crate::models::client::Client;
use crate::models::permission::{Permission, Status, resource_types, roles};

/// Sortable fields for user searches; anything else falls back to the
/// default.
pub const USER_SORT_FIELDS: &[&str] = &["email", "status"];
pub const DEFAULT_USER_SORT: &str = "status";

/// Sortable fields for client searches.
pub const CLIENT_SORT_FIELDS: &[&str] = &[
    "uid",
    "name",
    "numberOfSites",
    "numberOfUsers",
    "numberOfAlerts",
];
pub const DEFAULT_CLIENT_SORT: &str = "uid";

/// The visibility predicate derived from a caller's permissions. This stays
/// a plain value everywhere above the store; only the store boundary turns
/// it into a database filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeFilter {
    /// Super admins: no restriction.
    All,
    /// Everyone else: union of the ids their grants cover.
    Scoped {
        client_ids: Vec<String>,
        site_ids: Vec<String>,
        /// Group admins also see the contacts of their own client.
        contacts_of_client: Option<String>,
    },
}

impl ScopeFilter {
    /// Build the filter for a caller. Any super-admin grant short-circuits
    /// to `All`; a group-admin grant pins visibility to the site ids frozen
    /// into that grant plus the caller's own client's contacts; otherwise
    /// the client and site ids of every grant are accumulated.
    pub fn for_permissions(permissions: &[Permission], own_client_id: Option<&str>) -> Self {
        if permissions.iter().any(Permission::grants_all) {
            return ScopeFilter::All;
        }

        if let Some(ga) = permissions.iter().find(|p| p.role.is(roles::GROUP_ADMIN)) {
            let site_ids: Vec<String> = ga
                .ids_for(resource_types::SITE)
                .map(str::to_string)
                .collect();
            return ScopeFilter::Scoped {
                client_ids: vec![],
                site_ids,
                contacts_of_client: own_client_id
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            };
        }

        let mut client_ids: Vec<String> = vec![];
        let mut site_ids: Vec<String> = vec![];
        for permission in permissions {
            for id in permission.ids_for(resource_types::CLIENT) {
                if !client_ids.iter().any(|c| c == id) {
                    client_ids.push(id.to_string());
                }
            }
            for id in permission.ids_for(resource_types::SITE) {
                if !site_ids.iter().any(|s| s == id) {
                    site_ids.push(id.to_string());
                }
            }
        }

        ScopeFilter::Scoped {
            client_ids,
            site_ids,
            contacts_of_client: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ScopeFilter::All => false,
            ScopeFilter::Scoped {
                client_ids,
                site_ids,
                contacts_of_client,
            } => client_ids.is_empty() && site_ids.is_empty() && contacts_of_client.is_none(),
        }
    }

    /// Whether an account is visible under this filter. This is the one
    /// definition of membership; the mongo translation mirrors it.
    pub fn matches_account(&self, account: &Account) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Scoped {
                client_ids,
                site_ids,
                contacts_of_client,
            } => {
                if !account.client_id.is_empty() && client_ids.iter().any(|c| *c == account.client_id)
                {
                    return true;
                }
                if !account.site_id.is_empty() && site_ids.iter().any(|s| *s == account.site_id) {
                    return true;
                }
                if let Some(contact_client) = contacts_of_client {
                    if account.kind() == AccountKind::Contact
                        && account.client_id == *contact_client
                    {
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Whether a client is visible under this filter. Site grants do not
    /// widen client visibility.
    pub fn matches_client(&self, client: &Client) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Scoped { client_ids, .. } => {
                client_ids.iter().any(|c| *c == client.id)
            }
        }
    }
}

/// Paging, sorting and filtering knobs for a search. Sorting defaults to
/// descending; only an explicit "asc" flips it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQuery {
    pub page: Option<u64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    pub status: Option<Status>,
    pub role: Option<String>,
    pub keyword: Option<String>,
}

impl SearchQuery {
    pub fn page(&self) -> u64 {
        match self.page {
            Some(p) if p >= 1 => p,
            _ => 1,
        }
    }

    pub fn size(&self) -> u64 {
        match self.page_size {
            Some(s) if s >= 1 => s,
            _ => 20,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1) * self.size()
    }

    pub fn ascending(&self) -> bool {
        self.sort_order.as_deref() == Some("asc")
    }

    /// The sort field, validated against an allow-list.
    pub fn sort_field(&self, allowed: &[&str], default: &'static str) -> String {
        match self.sort_by.as_deref() {
            Some(field) if allowed.contains(&field) => field.to_string(),
            _ => default.to_string(),
        }
    }

    /// Keyword search matches any whitespace-separated token as well as the
    /// whole phrase.
    pub fn keyword_tokens(&self) -> Vec<String> {
        let Some(keyword) = self.keyword.as_deref() else {
            return vec![];
        };
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return vec![];
        }
        let mut tokens: Vec<String> = keyword.split_whitespace().map(str::to_string).collect();
        if tokens.len() > 1 {
            tokens.push(keyword.to_string());
        }
        tokens
    }
}
