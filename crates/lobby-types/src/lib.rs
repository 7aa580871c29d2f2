//! Wire types shared by the lobby HTTP API and the server binary.

pub mod api;
pub mod models;
