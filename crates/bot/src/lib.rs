pub mod health;
pub mod metrics;
pub mod oauth;
pub mod orchestrator;
pub mod poster;
pub mod twitter;

pub use orchestrator::Bot;
