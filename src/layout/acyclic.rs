/// Flags the edges that close a cycle.
///
/// Nodes are ordered by a depth-first search from every unvisited node in
/// index order, following out-edges in input order. An edge whose source does
/// not come strictly before its target in that ordering (self loops included)
/// is a back edge. Dropping all flagged edges leaves a DAG.
pub(super) fn back_edges(node_count: usize, edges: &[(usize, usize)]) -> Vec<bool> {
    let ordering = dfs_ordering(node_count, edges);
    let mut position = vec![0usize; node_count];
    for (pos, node) in ordering.iter().enumerate() {
        position[*node] = pos;
    }

    edges
        .iter()
        .map(|(from, to)| from == to || position[*from] > position[*to])
        .collect()
}

/// Reverse post-order of an iterative depth-first search.
fn dfs_ordering(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (from, to) in edges {
        adjacency[*from].push(*to);
    }

    let mut visited = vec![false; node_count];
    let mut finished = Vec::with_capacity(node_count);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..node_count {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let Some(&target) = adjacency[node].get(next) else {
                finished.push(node);
                stack.pop();
                continue;
            };
            top.1 += 1;
            if !visited[target] {
                visited[target] = true;
                stack.push((target, 0));
            }
        }
    }

    finished.reverse();
    finished
}
