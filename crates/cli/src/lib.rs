//! Public library modules for the CLI crate
pub mod serve;
pub mod session;
pub mod watch;
