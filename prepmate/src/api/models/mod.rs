//! Request and response types for the HTTP API.

pub mod accounts;
pub mod ask;
pub mod auth;
pub mod history;
pub mod pagination;
pub mod payments;
pub mod resume;
