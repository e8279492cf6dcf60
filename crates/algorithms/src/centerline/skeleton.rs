//! Skeleton line graph
//!
//! Surviving Voronoi edges are loaded into a planar graph whose nodes are
//! coordinates merged on a fine grid. Chains are maximal runs through nodes
//! of degree 2; they are what the extractor prunes, snaps and extends.

use std::collections::{HashMap, HashSet};

use geo::{Coord, Distance, Euclidean, Line, LineString};

use crate::vector::{ray_hit, segment_intersection};

type NodeKey = (i64, i64);

/// Undirected graph of line segments with grid-merged nodes
#[derive(Debug, Clone)]
pub(crate) struct LineGraph {
    quantum: f64,
    coords: Vec<Coord<f64>>,
    index: HashMap<NodeKey, usize>,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

impl LineGraph {
    /// `quantum` is the grid size below which coordinates become one node.
    pub fn new(quantum: f64) -> Self {
        Self {
            quantum,
            coords: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
        }
    }

    pub fn from_chains(chains: &[Vec<Coord<f64>>], quantum: f64) -> Self {
        let mut graph = Self::new(quantum);
        for chain in chains {
            for w in chain.windows(2) {
                graph.add_segment(w[0], w[1]);
            }
        }
        graph
    }

    fn key(&self, c: Coord<f64>) -> NodeKey {
        grid_key(c, self.quantum)
    }

    fn node(&mut self, c: Coord<f64>) -> usize {
        let key = self.key(c);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.coords.len();
        self.coords.push(c);
        self.adjacency.push(Vec::new());
        self.index.insert(key, id);
        id
    }

    /// Add a segment; segments collapsing onto a single node are ignored.
    pub fn add_segment(&mut self, a: Coord<f64>, b: Coord<f64>) {
        let na = self.node(a);
        let nb = self.node(b);
        if na == nb {
            return;
        }
        let id = self.edges.len();
        self.edges.push((na, nb));
        self.adjacency[na].push(id);
        self.adjacency[nb].push(id);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Degree of the node at `c`, zero when `c` is not a node.
    pub fn degree_at(&self, c: Coord<f64>) -> usize {
        self.index
            .get(&self.key(c))
            .map_or(0, |&id| self.adjacency[id].len())
    }

    fn other(&self, edge: usize, node: usize) -> usize {
        let (a, b) = self.edges[edge];
        if a == node { b } else { a }
    }

    /// Split the graph into chains broken at every node of degree other than 2.
    ///
    /// Closed loops made only of degree-2 nodes come out as closed chains.
    pub fn chains(&self) -> Vec<Vec<Coord<f64>>> {
        let mut visited = vec![false; self.edges.len()];
        let mut chains = Vec::new();

        for node in 0..self.coords.len() {
            if self.adjacency[node].len() == 2 {
                continue;
            }
            for &edge in &self.adjacency[node] {
                if !visited[edge] {
                    chains.push(self.walk(node, edge, &mut visited));
                }
            }
        }

        for edge in 0..self.edges.len() {
            if !visited[edge] {
                chains.push(self.walk(self.edges[edge].0, edge, &mut visited));
            }
        }

        chains
            .into_iter()
            .map(|ids| ids.into_iter().map(|id| self.coords[id]).collect())
            .collect()
    }

    fn walk(&self, start: usize, first_edge: usize, visited: &mut [bool]) -> Vec<usize> {
        let mut path = vec![start];
        let mut current = start;
        let mut edge = first_edge;

        loop {
            visited[edge] = true;
            let next = self.other(edge, current);
            path.push(next);
            if next == start || self.adjacency[next].len() != 2 {
                break;
            }
            match self.adjacency[next].iter().copied().find(|&e| !visited[e]) {
                Some(e) => {
                    current = next;
                    edge = e;
                }
                None => break,
            }
        }

        path
    }
}

fn grid_key(c: Coord<f64>, quantum: f64) -> NodeKey {
    ((c.x / quantum).round() as i64, (c.y / quantum).round() as i64)
}

/// Snap dangling chain ends onto the nearest vertex of another chain.
///
/// Targets are taken from the chains as they were before any snapping, so a
/// snap never cascades. Ends already joined to other chains stay put, and so
/// does an end that another end has just been snapped onto.
pub(crate) fn snap_dangling_ends(
    chains: &[Vec<Coord<f64>>],
    tolerance: f64,
    quantum: f64,
) -> Vec<Vec<Coord<f64>>> {
    let graph = LineGraph::from_chains(chains, quantum);
    let mut snapped: Vec<Vec<Coord<f64>>> = chains.to_vec();
    let mut joined: HashSet<NodeKey> = HashSet::new();

    for (ci, chain) in chains.iter().enumerate() {
        if chain.len() < 2 {
            continue;
        }
        for end in [0, chain.len() - 1] {
            let p = chain[end];
            if graph.degree_at(p) != 1 || joined.contains(&grid_key(p, quantum)) {
                continue;
            }
            let target = chains
                .iter()
                .enumerate()
                .filter(|(oi, _)| *oi != ci)
                .flat_map(|(_, other)| other.iter().copied())
                .map(|v| (v, Euclidean::distance(p, v)))
                .filter(|(_, d)| *d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((v, _)) = target {
                snapped[ci][end] = v;
                joined.insert(grid_key(v, quantum));
            }
        }
    }

    snapped
}

/// Extend every dangling end of every part along its terminal segment to the
/// first hit on `outline` or on another part.
pub(crate) fn extend_dangling_ends(
    parts: &[Vec<Coord<f64>>],
    outline: &[Line<f64>],
    quantum: f64,
) -> Vec<Vec<Coord<f64>>> {
    let graph = LineGraph::from_chains(parts, quantum);

    parts
        .iter()
        .enumerate()
        .map(|(pi, part)| {
            if part.len() < 2 {
                return part.clone();
            }
            let mut targets: Vec<Line<f64>> = outline.to_vec();
            for (oi, other) in parts.iter().enumerate() {
                if oi != pi {
                    targets.extend(other.windows(2).map(|w| Line::new(w[0], w[1])));
                }
            }

            let n = part.len();
            let mut extended = part.clone();
            if graph.degree_at(part[n - 1]) == 1 {
                if let Some(hit) = extension(part[n - 2], part[n - 1], &targets, quantum) {
                    extended.push(hit);
                }
            }
            if graph.degree_at(part[0]) == 1 {
                if let Some(hit) = extension(part[1], part[0], &targets, quantum) {
                    extended.insert(0, hit);
                }
            }
            extended
        })
        .collect()
}

fn extension(prev: Coord<f64>, end: Coord<f64>, targets: &[Line<f64>], quantum: f64) -> Option<Coord<f64>> {
    let len = Euclidean::distance(prev, end);
    if len == 0.0 {
        return None;
    }
    let unit = (end - prev) / len;
    ray_hit(end, unit, targets, quantum).map(|(hit, _)| hit)
}

/// `true` when the segment crosses or touches any of `outline`.
pub(crate) fn touches_any(edge: &Line<f64>, outline: &[Line<f64>]) -> bool {
    outline.iter().any(|seg| segment_intersection(edge, seg).is_some())
}

/// Orient a part so that it starts at its lexicographically smaller end.
pub(crate) fn canonical_orientation(mut part: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    if let (Some(first), Some(last)) = (part.first(), part.last()) {
        let ordering = first.x.total_cmp(&last.x).then(first.y.total_cmp(&last.y));
        if ordering.is_gt() {
            part.reverse();
        }
    }
    part
}

pub(crate) fn to_line_string(part: Vec<Coord<f64>>) -> LineString<f64> {
    LineString::new(part)
}
