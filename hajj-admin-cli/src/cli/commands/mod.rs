pub mod auth;
pub mod config;
pub mod entities;
pub mod import;
pub mod records;
