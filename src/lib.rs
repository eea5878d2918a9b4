//! Desktop agent that watches which application has focus and reports the activity of the ones
//! the user opted into as heartbeats, through an external reporting tool.
//!
//! The daemon collects window snapshots, [classifier] turns them into entities and categories,
//! and [heartbeat] throttles what actually gets reported. Both read their configuration through
//! [settings], which sits on the line oriented store in [config].

pub mod apps;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod context;
pub mod daemon;
pub mod filter;
pub mod heartbeat;
pub mod settings;
pub mod utils;
pub mod window_api;
