//! Built-in agents.

pub mod mock;

pub use mock::MockAgent;
