#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, authentication mechanisms, dynamic query"]
#![doc = "construction, routing configuration, and error handling for the TodoForge API."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
