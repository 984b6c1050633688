//! HTTP API: routing, handlers, and request/response models.

pub mod handlers;
pub mod models;
