pub mod config;
pub mod environment;
pub mod errors;
pub mod id;
pub mod mime_type;
pub mod normalization;
pub mod record;
pub mod routes;
pub mod store;
