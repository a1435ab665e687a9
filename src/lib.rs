#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod directory;
pub mod dump;
pub mod error;
pub mod graph;
pub mod layout;
pub mod model;
pub mod resolve;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutAlgorithm, LayoutConfig, load_config};
pub use directory::Directory;
pub use dump::{ChartDump, write_chart_dump};
pub use error::{DirectoryError, SnapshotError};
pub use graph::{EdgeKind, NodeData, NodeKind, OrgEdge, OrgGraph, OrgNode};
pub use layout::{
    DagreStrategy, EdgeLayout, LayeredStrategy, Layout, LayoutStrategy, NodeLayout,
    compute_layout, compute_layout_with,
};
pub use model::{Availability, Department, Person, Reference, Snapshot};
pub use resolve::{department_node_id, resolve, resolve_snapshot};
pub use theme::Theme;

/// Resolves a snapshot and lays it out in one call.
pub fn build_chart(snapshot: &Snapshot, config: &LayoutConfig) -> Layout {
    let graph = resolve_snapshot(snapshot);
    compute_layout(&graph, config)
}
