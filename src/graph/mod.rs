mod build;
mod partition;

pub use build::{BuiltGraph, FALLBACK_THEME_COLOR, GraphLink, GraphNode, build, build_from_data};
pub use partition::partition;
