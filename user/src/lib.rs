//! # Shoply User Service
//!
//! User-management: registration, login (JWT issuance), and user CRUD
//! over a relational store. Token *validation* is the concern of whatever
//! gateway sits in front of the services and is deliberately absent here.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

pub use config::UserConfig;
pub use error::UserError;
pub use service::UserService;
pub use store::{InMemoryUserStore, PgUserStore, UserStore};
