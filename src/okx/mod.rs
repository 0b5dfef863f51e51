//! OKX module - Client implementation for the OKX v5 REST API

pub mod auth;
pub mod messages;
pub mod rest;

pub use rest::OkxRestClient;
