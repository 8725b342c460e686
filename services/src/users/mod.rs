//! The user resource: data model, in-memory store, and HTTP handlers.

pub mod routes;
pub mod storage;
pub mod types;
