//! Policy acquisition and persistence.
//!
//! - Locating a site's privacy policy page and extracting its paragraphs
//! - Saving and reloading extracted policy text

pub mod fetch;
pub mod html;
pub mod store;

// Re-export commonly used types
pub use fetch::{logical_name, PolicyFetcher};
pub use store::{PolicyStore, SavedPolicy};
