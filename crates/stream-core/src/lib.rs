pub mod config;
pub mod context;
pub mod error;
pub mod formats;
pub mod health;
pub mod models;
pub mod registry;
pub mod search;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
