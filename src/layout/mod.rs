//! Layered top-to-bottom placement of an [`OrgGraph`].
//!
//! The engine breaks cycles, hands the remaining rank-constraining edges to a
//! [`LayoutStrategy`], then converts the strategy's node centers into
//! top-left corners, shifted so the drawing starts at the configured margin.

mod acyclic;
mod dagre;
mod ranking;

pub use dagre::DagreStrategy;
pub use ranking::LayeredStrategy;

use crate::config::{LayoutAlgorithm, LayoutConfig};
use crate::graph::{EdgeKind, NodeData, NodeKind, OrgGraph};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const RANK_EPSILON: f32 = 0.5;
const SPACING_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub kind: NodeKind,
    pub data: NodeData,
    /// Top-left corner.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
}

impl NodeLayout {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    /// False for edges ignored by layering because they close a cycle.
    pub constraining: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
    /// Strategy that actually produced the positions.
    pub algorithm: LayoutAlgorithm,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// What a strategy sees: node boxes by index and the acyclic,
/// de-duplicated edges it must respect.
#[derive(Debug, Clone, Default)]
pub struct LayoutInput {
    pub sizes: Vec<(f32, f32)>,
    pub edges: Vec<(usize, usize)>,
}

pub trait LayoutStrategy {
    fn name(&self) -> &'static str;

    /// Center point of every node, in input order. `None` when the graph
    /// could not be placed.
    fn place(&self, input: &LayoutInput, config: &LayoutConfig) -> Option<Vec<(f32, f32)>>;
}

pub fn compute_layout(graph: &OrgGraph, config: &LayoutConfig) -> Layout {
    match config.algorithm {
        LayoutAlgorithm::Dagre => compute_layout_with(graph, config, &DagreStrategy),
        LayoutAlgorithm::Layered => compute_layout_with(graph, config, &LayeredStrategy),
    }
}

pub fn compute_layout_with(
    graph: &OrgGraph,
    config: &LayoutConfig,
    strategy: &dyn LayoutStrategy,
) -> Layout {
    let requested = algorithm_of(strategy);
    if graph.nodes.is_empty() {
        return Layout {
            nodes: Vec::new(),
            edges: Vec::new(),
            width: 0.0,
            height: 0.0,
            algorithm: requested,
        };
    }

    let mut node_index: HashMap<&str, usize> = HashMap::with_capacity(graph.nodes.len());
    for (idx, node) in graph.nodes.iter().enumerate() {
        node_index.entry(node.id.as_str()).or_insert(idx);
    }
    let sizes: Vec<(f32, f32)> = graph
        .nodes
        .iter()
        .map(|node| config.node_size(node.kind))
        .collect();

    let mut kept_edges = Vec::with_capacity(graph.edges.len());
    let mut pairs = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (Some(from), Some(to)) = (
            node_index.get(edge.source.as_str()),
            node_index.get(edge.target.as_str()),
        ) else {
            debug!(edge = %edge.id, "skipping edge with unknown endpoint");
            continue;
        };
        kept_edges.push(edge);
        pairs.push((*from, *to));
    }

    let back = acyclic::back_edges(graph.nodes.len(), &pairs);
    let mut input = LayoutInput {
        sizes,
        edges: Vec::with_capacity(pairs.len()),
    };
    let mut edges = Vec::with_capacity(kept_edges.len());
    for ((edge, pair), is_back) in kept_edges.iter().zip(&pairs).zip(&back) {
        if *is_back {
            debug!(edge = %edge.id, "edge closes a cycle; ignored for ranking");
        } else if !input.edges.contains(pair) {
            input.edges.push(*pair);
        }
        edges.push(EdgeLayout {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind,
            constraining: !*is_back,
        });
    }

    let (centers, algorithm) = match strategy.place(&input, config) {
        Some(centers)
            if is_complete(&centers, input.sizes.len())
                && satisfies_contract(&input, &centers, config) =>
        {
            (centers, requested)
        }
        _ => {
            warn!(
                strategy = strategy.name(),
                "strategy could not place the graph; using layered fallback"
            );
            (
                ranking::layered_centers(&input, config),
                LayoutAlgorithm::Layered,
            )
        }
    };

    let ranks = ranks_from_centers(&centers);
    let min_x = centers
        .iter()
        .zip(&input.sizes)
        .map(|((cx, _), (w, _))| cx - w / 2.0)
        .fold(f32::INFINITY, f32::min);
    let min_y = centers
        .iter()
        .zip(&input.sizes)
        .map(|((_, cy), (_, h))| cy - h / 2.0)
        .fold(f32::INFINITY, f32::min);
    let shift_x = config.margin - min_x;
    let shift_y = config.margin - min_y;

    let mut nodes = Vec::with_capacity(graph.nodes.len());
    let mut width: f32 = 0.0;
    let mut height: f32 = 0.0;
    for (idx, node) in graph.nodes.iter().enumerate() {
        let (cx, cy) = centers[idx];
        let (w, h) = input.sizes[idx];
        let x = cx - w / 2.0 + shift_x;
        let y = cy - h / 2.0 + shift_y;
        width = width.max(x + w);
        height = height.max(y + h);
        nodes.push(NodeLayout {
            id: node.id.clone(),
            kind: node.kind,
            data: node.data.clone(),
            x,
            y,
            width: w,
            height: h,
            rank: ranks[idx],
        });
    }

    Layout {
        nodes,
        edges,
        width: width + config.margin,
        height: height + config.margin,
        algorithm,
    }
}

fn algorithm_of(strategy: &dyn LayoutStrategy) -> LayoutAlgorithm {
    match strategy.name() {
        "dagre" => LayoutAlgorithm::Dagre,
        _ => LayoutAlgorithm::Layered,
    }
}

fn is_complete(centers: &[(f32, f32)], expected: usize) -> bool {
    centers.len() == expected && centers.iter().all(|(x, y)| x.is_finite() && y.is_finite())
}

/// Checks rank order along every constraining edge, sibling spacing within a
/// rank and the gap between consecutive ranks.
fn satisfies_contract(input: &LayoutInput, centers: &[(f32, f32)], config: &LayoutConfig) -> bool {
    if let Some((from, to)) = input
        .edges
        .iter()
        .find(|(from, to)| centers[*to].1 - centers[*from].1 < RANK_EPSILON)
    {
        debug!(from, to, "edge target not below its source");
        return false;
    }

    let ranks = ranks_from_centers(centers);
    let mut rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, rank) in ranks.iter().enumerate() {
        rows.entry(*rank).or_default().push(idx);
    }

    let mut previous_bottom: Option<f32> = None;
    for row in rows.values_mut() {
        row.sort_by(|a, b| centers[*a].0.total_cmp(&centers[*b].0));
        for pair in row.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let gap = (centers[right].0 - input.sizes[right].0 / 2.0)
                - (centers[left].0 + input.sizes[left].0 / 2.0);
            if gap + SPACING_TOLERANCE < config.node_spacing {
                debug!(left, right, gap, "siblings closer than node spacing");
                return false;
            }
        }
        let top = row
            .iter()
            .map(|idx| centers[*idx].1 - input.sizes[*idx].1 / 2.0)
            .fold(f32::INFINITY, f32::min);
        let bottom = row
            .iter()
            .map(|idx| centers[*idx].1 + input.sizes[*idx].1 / 2.0)
            .fold(f32::NEG_INFINITY, f32::max);
        if let Some(previous) = previous_bottom {
            if top - previous + SPACING_TOLERANCE < config.rank_spacing {
                debug!(gap = top - previous, "ranks closer than rank spacing");
                return false;
            }
        }
        previous_bottom = Some(bottom);
    }
    true
}

/// Nodes sharing a center line form one rank; ranks count from the top.
fn ranks_from_centers(centers: &[(f32, f32)]) -> Vec<usize> {
    let mut levels: Vec<f32> = centers.iter().map(|(_, y)| *y).collect();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup_by(|a, b| (*a - *b).abs() < RANK_EPSILON);
    centers
        .iter()
        .map(|(_, y)| levels.partition_point(|level| *level < *y - RANK_EPSILON))
        .collect()
}
