pub mod access;
pub mod auth;
pub mod clients;
pub mod error;
pub mod notify;
pub mod scope;
pub mod token;
pub mod users;
