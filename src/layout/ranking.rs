use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::config::LayoutConfig;

use super::{LayoutInput, LayoutStrategy};

/// Longest-path layering with median ordering and packed rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredStrategy;

impl LayoutStrategy for LayeredStrategy {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn place(&self, input: &LayoutInput, config: &LayoutConfig) -> Option<Vec<(f32, f32)>> {
        Some(layered_centers(input, config))
    }
}

pub(super) fn layered_centers(input: &LayoutInput, config: &LayoutConfig) -> Vec<(f32, f32)> {
    let node_count = input.sizes.len();
    if node_count == 0 {
        return Vec::new();
    }

    let ranks = longest_path_ranks(node_count, &input.edges);
    let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut rank_nodes: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (idx, rank) in ranks.iter().enumerate() {
        rank_nodes[*rank].push(idx);
    }
    order_rank_nodes(&mut rank_nodes, &input.edges, node_count, config.order_passes);

    let mut row_widths = Vec::with_capacity(rank_count);
    for bucket in &rank_nodes {
        let widths: f32 = bucket.iter().map(|idx| input.sizes[*idx].0).sum();
        let gaps = bucket.len().saturating_sub(1) as f32 * config.node_spacing;
        row_widths.push(widths + gaps);
    }
    let max_row_width = row_widths.iter().copied().fold(0.0_f32, f32::max);

    let mut centers = vec![(0.0, 0.0); node_count];
    let mut y_cursor = 0.0_f32;
    for (rank_idx, bucket) in rank_nodes.iter().enumerate() {
        let row_height = bucket
            .iter()
            .map(|idx| input.sizes[*idx].1)
            .fold(0.0_f32, f32::max);
        let center_y = y_cursor + row_height / 2.0;
        let mut x_cursor = (max_row_width - row_widths[rank_idx]) / 2.0;
        for idx in bucket {
            let width = input.sizes[*idx].0;
            centers[*idx] = (x_cursor + width / 2.0, center_y);
            x_cursor += width + config.node_spacing;
        }
        y_cursor += row_height + config.rank_spacing;
    }
    centers
}

/// Rank of every node: one more than its deepest predecessor. Expects an
/// acyclic edge list; nodes left over by a cycle stay on rank 0.
pub(super) fn longest_path_ranks(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indeg = vec![0usize; node_count];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (from, to) in edges {
        adj[*from].push(*to);
        indeg[*to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..node_count).filter(|idx| indeg[*idx] == 0).collect();
    let mut ranks = vec![0usize; node_count];
    while let Some(node) = queue.pop_front() {
        for next in &adj[node] {
            ranks[*next] = ranks[*next].max(ranks[node] + 1);
            indeg[*next] -= 1;
            if indeg[*next] == 0 {
                queue.push_back(*next);
            }
        }
    }
    ranks
}

/// Reorders each rank by the median position of its neighbours, sweeping
/// down then up `passes` times. Ties keep the current order, then input order.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<usize>],
    edges: &[(usize, usize)],
    node_count: usize,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (from, to) in edges {
        outgoing[*from].push(*to);
        incoming[*to].push(*from);
    }

    let mut positions = vec![0usize; node_count];
    let update_positions = |rank_nodes: &[Vec<usize>], positions: &mut Vec<usize>| {
        for bucket in rank_nodes {
            for (pos, node) in bucket.iter().enumerate() {
                positions[*node] = pos;
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<usize>, neighbors: &[Vec<usize>], positions: &[usize]| {
        bucket.sort_by(|a, b| {
            let a_score = median_position(*a, neighbors, positions);
            let b_score = median_position(*b, neighbors, positions);
            match a_score.partial_cmp(&b_score) {
                Some(Ordering::Equal) | None => match positions[*a].cmp(&positions[*b]) {
                    Ordering::Equal => a.cmp(b),
                    other => other,
                },
                Some(ordering) => ordering,
            }
        });
    };

    let passes = passes.max(1);
    for _ in 0..passes {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

fn median_position(node: usize, neighbors: &[Vec<usize>], positions: &[usize]) -> f32 {
    let list = &neighbors[node];
    if list.is_empty() {
        return positions[node] as f32;
    }
    let mut values: Vec<f32> = list.iter().map(|n| positions[*n] as f32).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}
