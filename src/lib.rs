#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, validation, authentication (JWT + bcrypt), the owner/admin"]
#![doc = "task access rules, routing configuration, and error handling for the"]
#![doc = "Taskboard API. The binary (`main.rs`) assembles these into a running server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod validation;
