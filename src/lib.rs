pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod integrations;
pub mod models;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
