//! Huddle estimation room server.
//!
//! - `domain`: value objects, entities, repository and pusher traits
//! - `usecase`: room coordinator, session ledger, statistics aggregator
//! - `infrastructure`: in-memory stores, WebSocket pusher, DTOs
//! - `ui`: axum router and handlers

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
