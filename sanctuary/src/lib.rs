#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod assets;
pub mod config;
pub mod entitlement;
pub mod link;
pub mod model;
pub mod payload;
pub mod render;
pub mod schedule;
pub mod validation;
