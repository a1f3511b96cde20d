//! HTTP handlers for the waxeye service

pub mod health;
pub mod pipeline;
pub mod setup;
pub mod ui;

pub use health::health_routes;
pub use pipeline::run_pipeline;
pub use setup::{auth_callback, begin_auth, player_options, player_select, setup_page};
