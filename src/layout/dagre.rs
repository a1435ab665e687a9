use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::config::LayoutConfig;

use super::{LayoutInput, LayoutStrategy};

/// Sugiyama-style placement delegated to `dagre_rust`, top to bottom.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreStrategy;

impl LayoutStrategy for DagreStrategy {
    fn name(&self) -> &'static str {
        "dagre"
    }

    fn place(&self, input: &LayoutInput, config: &LayoutConfig) -> Option<Vec<(f32, f32)>> {
        if input.sizes.is_empty() {
            return Some(Vec::new());
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some("tb".to_string());
        graph_config.nodesep = Some(config.node_spacing);
        graph_config.ranksep = Some(config.rank_spacing);
        graph_config.marginx = Some(config.margin);
        graph_config.marginy = Some(config.margin);
        dagre_graph.set_graph(graph_config);

        let keys: Vec<String> = (0..input.sizes.len()).map(dagre_key).collect();
        for (key, (width, height)) in keys.iter().zip(&input.sizes) {
            let mut node = DagreNode::default();
            node.width = *width;
            node.height = *height;
            dagre_graph.set_node(key.clone(), Some(node));
        }

        for (from, to) in &input.edges {
            let mut edge_label = DagreEdge::default();
            edge_label.minlen = Some(1.0);
            let _ = dagre_graph.set_edge(&keys[*from], &keys[*to], Some(edge_label), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        let mut centers = Vec::with_capacity(keys.len());
        for key in &keys {
            let dagre_node = dagre_graph.node(key)?;
            centers.push((dagre_node.x, dagre_node.y));
        }
        Some(centers)
    }
}

// Zero-padded so lexical and input order agree.
fn dagre_key(idx: usize) -> String {
    format!("n{idx:08}")
}
