pub mod account;
pub mod client;
pub mod permission;
pub mod site;

pub use account::{Account, AccountKind};
pub use client::{Client, Contact};
pub use permission::{Claims, Permission, ResourceKind, Role, Scope, Status};
pub use site::Site;

use serde::Serialize;

/// One page of search results plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> PagedList<T> {
    pub fn empty(page: u64, size: u64) -> Self {
        PagedList {
            items: vec![],
            total: 0,
            page,
            size,
        }
    }
}
