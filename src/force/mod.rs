//! Force descriptor tree
//!
//! - `node`: constraints and results of a single force node
//! - `tree`: arena owning nodes and officers
//! - `naming`: position indices and name templates
//! - `listing`: text and serializable order of battle listings

pub mod listing;
pub mod naming;
pub mod node;
pub mod tree;

pub use listing::{render_listing, ListingEntry};
pub use naming::{assign_positions, description, parse_name};
pub use node::{ForceNode, Officer};
pub use tree::ForceTree;
