//! Core queue model and persistence for hopper.

pub mod config;
pub mod error;
pub mod item;
pub mod resolve;
pub mod skills;
pub mod store;
pub mod titler;
pub mod transition;

pub use error::{QueueError, Result};
pub use item::{Item, ItemStatus};
pub use store::{ItemStore, ListFilter};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::version;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
