//! Domain models for nexus-er

pub mod comparison;
pub mod merge;
pub mod node_info;

pub use comparison::{canonical_key, canonicalize_pair, Comparison, Confidence, UserDecision};
pub use merge::{Merge, MergedBy};
pub use node_info::{field_text, AttrValue, NodeInfo};
