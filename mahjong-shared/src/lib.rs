// Re-export any crates that we also want to use on the server side. This has the
// dual benefits of making it so that we don't need to declare the dependency twice,
// and ensuring that both crates use the same versions of any shared dependencies.
pub use anyhow;
pub use strum;

pub mod ai;
pub mod claim;
pub mod config;
pub mod error;
pub mod match_state;
pub mod meld;
pub mod messages;
pub mod player;
pub mod projection;
pub mod round;
pub mod rules;
pub mod scoring;
pub mod timer;
pub mod tile;
