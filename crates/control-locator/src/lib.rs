//! Control locator - text path based control location
//!
//! This crate finds the control a human means by a short textual path such
//! as `Login form > Username`:
//! - Linear text projection of a page with per-node spans
//! - Search patterns with wildcards and position-aware queries
//! - Matching strategies weighing ids, names, labels, images and table cells
//! - Deterministic ranking of all candidates

pub mod config;
pub mod control;
pub mod dom;
pub mod errors;
pub mod finder;
pub mod identifier;
pub mod locator;
pub mod matchers;
pub mod node;
pub mod page_index;
pub mod pattern;
pub mod types;
pub mod weighted;
pub mod wpath;

pub use config::*;
pub use control::*;
pub use dom::*;
pub use errors::*;
pub use finder::*;
pub use identifier::*;
pub use locator::*;
pub use matchers::*;
pub use node::*;
pub use page_index::*;
pub use pattern::*;
pub use types::*;
pub use weighted::*;
pub use wpath::*;
