//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Load-to-root path discovery over the segment graph."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::{HashSet, VecDeque};

use petgraph::{algo::astar, visit::Bfs};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::topology::{RootSet, SegmentGraph};

/// Rule used when more than one route reaches a root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathTieBreak {
    /// Breadth-first: fewest segments, then input order of the edge list.
    #[default]
    FirstDiscovered,
    /// Smallest summed cable length.
    ShortestLength,
}

impl std::str::FromStr for PathTieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first-discovered" | "first" | "bfs" => Ok(PathTieBreak::FirstDiscovered),
            "shortest-length" | "shortest" => Ok(PathTieBreak::ShortestLength),
            other => Err(format!("unknown path tie-break: {}", other)),
        }
    }
}

/// Route from a starting bus to a root. Segments are indices into the analysed edge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredPath {
    pub start_bus: String,
    pub root_bus: String,
    pub segments: Vec<usize>,
    pub segment_ids: Vec<String>,
    pub total_length_m: f64,
    pub total_load_kw: f64,
    pub valid: bool,
}

impl DiscoveredPath {
    fn from_trace(
        graph: &SegmentGraph<'_>,
        roots: &RootSet,
        start: &str,
        segments: Vec<usize>,
    ) -> Self {
        let root_key = segments
            .last()
            .map(|&index| graph.segment(index).destination_key())
            .unwrap_or_default();
        let root_bus = roots
            .label(&root_key)
            .map(str::to_owned)
            .unwrap_or_else(|| graph.label(&root_key).to_owned());
        let members = segments.iter().map(|&index| graph.segment(index));
        let total_length_m = members.clone().map(|s| s.length_m).sum();
        let total_load_kw = members.clone().map(|s| s.power_kw).sum();
        let segment_ids = members.map(|s| s.id.clone()).collect();
        Self {
            start_bus: graph.label(start).to_owned(),
            valid: roots.contains(&root_key),
            root_bus,
            segments,
            segment_ids,
            total_length_m,
            total_load_kw,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreachableReason {
    NoOutgoingSegment,
    FrontierExhausted,
}

/// A bus whose trace never reached a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreachableLoad {
    pub bus: String,
    pub reason: UnreachableReason,
    pub explored_buses: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathDiscovery {
    pub paths: Vec<DiscoveredPath>,
    pub unreachable: Vec<UnreachableLoad>,
}

enum Trace {
    Found(Vec<usize>),
    Unreachable { reason: UnreachableReason, explored: usize },
}

/// Traces every non-root origin bus to a root.
///
/// Leaf loads (origins that are never a destination) always report their path; an
/// intermediate bus reports its own path only when no reported path already runs
/// through it. Every traced bus that fails is reported as unreachable.
pub fn discover_paths(
    graph: &SegmentGraph<'_>,
    roots: &RootSet,
    tie_break: PathTieBreak,
    parallel: bool,
) -> PathDiscovery {
    let candidates: Vec<&String> = graph
        .origins()
        .iter()
        .filter(|bus| !roots.contains(bus))
        .collect();

    let trace_one = |bus: &&String| trace(graph, roots, bus, tie_break);
    let traces: Vec<Trace> = if parallel {
        trace_parallel(&candidates, trace_one)
    } else {
        candidates.iter().map(trace_one).collect()
    };

    let mut covered: HashSet<String> = HashSet::new();
    let mut leaf_paths: Vec<Option<DiscoveredPath>> = Vec::with_capacity(candidates.len());
    for (bus, outcome) in candidates.iter().zip(&traces) {
        let is_leaf = !graph.is_destination(bus);
        match outcome {
            Trace::Found(segments) if is_leaf => {
                for &index in segments {
                    covered.insert(graph.segment(index).origin_key());
                }
                leaf_paths.push(Some(DiscoveredPath::from_trace(
                    graph,
                    roots,
                    bus,
                    segments.clone(),
                )));
            }
            _ => leaf_paths.push(None),
        }
    }

    let mut discovery = PathDiscovery::default();
    for ((bus, outcome), leaf_path) in candidates.iter().zip(traces).zip(leaf_paths) {
        match (outcome, leaf_path) {
            (_, Some(path)) => discovery.paths.push(path),
            (Trace::Found(segments), None) => {
                if !covered.contains(bus.as_str()) {
                    discovery
                        .paths
                        .push(DiscoveredPath::from_trace(graph, roots, bus, segments));
                }
            }
            (Trace::Unreachable { reason, explored }, None) => {
                let label = graph.label(bus).to_owned();
                let message = match reason {
                    UnreachableReason::NoOutgoingSegment => {
                        format!("bus {} has no outgoing segment", label)
                    }
                    UnreachableReason::FrontierExhausted => format!(
                        "bus {} explored {} bus(es) without reaching a root",
                        label, explored
                    ),
                };
                warn!(bus = %label, explored, "unreachable load: {}", message);
                discovery.unreachable.push(UnreachableLoad {
                    bus: label,
                    reason,
                    explored_buses: explored,
                    message,
                });
            }
        }
    }

    info!(
        candidates = candidates.len(),
        paths = discovery.paths.len(),
        unreachable = discovery.unreachable.len(),
        ?tie_break,
        "path discovery complete"
    );
    discovery
}

#[cfg(feature = "parallel")]
fn trace_parallel<'c, F>(candidates: &[&'c String], trace_one: F) -> Vec<Trace>
where
    F: Fn(&&'c String) -> Trace + Sync + Send,
{
    use rayon::prelude::*;
    candidates.par_iter().map(trace_one).collect()
}

#[cfg(not(feature = "parallel"))]
fn trace_parallel<'c, F>(candidates: &[&'c String], trace_one: F) -> Vec<Trace>
where
    F: Fn(&&'c String) -> Trace,
{
    candidates.iter().map(trace_one).collect()
}

fn trace(
    graph: &SegmentGraph<'_>,
    roots: &RootSet,
    start: &str,
    tie_break: PathTieBreak,
) -> Trace {
    if graph.outgoing(start).is_empty() {
        return Trace::Unreachable {
            reason: UnreachableReason::NoOutgoingSegment,
            explored: 0,
        };
    }
    match tie_break {
        PathTieBreak::FirstDiscovered => breadth_first(graph, roots, start),
        PathTieBreak::ShortestLength => shortest_length(graph, roots, start),
    }
}

fn breadth_first(graph: &SegmentGraph<'_>, roots: &RootSet, start: &str) -> Trace {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_owned());
    let mut frontier: VecDeque<(String, Vec<usize>)> = VecDeque::new();
    frontier.push_back((start.to_owned(), Vec::new()));

    while let Some((bus, path)) = frontier.pop_front() {
        for &index in graph.outgoing(&bus) {
            let destination = graph.segment(index).destination_key();
            let mut extended = path.clone();
            extended.push(index);
            if roots.contains(&destination) {
                return Trace::Found(extended);
            }
            if visited.insert(destination.clone()) {
                frontier.push_back((destination, extended));
            }
        }
    }

    Trace::Unreachable {
        reason: UnreachableReason::FrontierExhausted,
        explored: visited.len(),
    }
}

fn segment_cost(length_m: f64) -> f64 {
    if length_m.is_finite() {
        length_m.max(0.0)
    } else {
        0.0
    }
}

fn shortest_length(graph: &SegmentGraph<'_>, roots: &RootSet, start: &str) -> Trace {
    let Some(start_node) = graph.node(start) else {
        return Trace::Unreachable {
            reason: UnreachableReason::NoOutgoingSegment,
            explored: 0,
        };
    };
    let g = graph.graph();
    let found = astar(
        g,
        start_node,
        |node| roots.contains(&g[node]),
        |edge| segment_cost(graph.segment(*edge.weight()).length_m),
        |_| 0.0,
    );

    let Some((_cost, nodes)) = found else {
        let mut bfs = Bfs::new(g, start_node);
        let mut explored = 0;
        while bfs.next(g).is_some() {
            explored += 1;
        }
        return Trace::Unreachable {
            reason: UnreachableReason::FrontierExhausted,
            explored,
        };
    };

    let mut segments = Vec::with_capacity(nodes.len().saturating_sub(1));
    for window in nodes.windows(2) {
        let cheapest = g
            .edges_connecting(window[0], window[1])
            .map(|edge| *edge.weight())
            .min_by(|a, b| {
                segment_cost(graph.segment(*a).length_m)
                    .total_cmp(&segment_cost(graph.segment(*b).length_m))
                    .then(a.cmp(b))
            });
        if let Some(index) = cheapest {
            segments.push(index);
        }
    }
    Trace::Found(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::CableSegment, topology::detect_roots};

    fn seg(id: &str, from: &str, to: &str, length: f64) -> CableSegment {
        CableSegment::new(id, from, to, 415.0, 10.0, length)
    }

    fn run(segments: &[CableSegment], tie_break: PathTieBreak) -> PathDiscovery {
        let graph = SegmentGraph::build(segments);
        let roots = detect_roots(&graph, &["TRF".to_owned()])
            .into_result()
            .unwrap()
            .roots;
        discover_paths(&graph, &roots, tie_break, false)
    }

    #[test]
    fn chain_yields_single_path_from_the_leaf() {
        let segments = vec![
            seg("C1", "LOAD", "PANEL", 50.0),
            seg("C2", "PANEL", "PANEL2", 50.0),
            seg("C3", "PANEL2", "TRF", 50.0),
        ];
        let discovery = run(&segments, PathTieBreak::FirstDiscovered);
        assert_eq!(discovery.paths.len(), 1);
        let path = &discovery.paths[0];
        assert_eq!(path.start_bus, "LOAD");
        assert_eq!(path.root_bus, "TRF");
        assert_eq!(path.segments, vec![0, 1, 2]);
        assert_eq!(path.segment_ids, vec!["C1", "C2", "C3"]);
        assert_eq!(path.total_length_m, 150.0);
        assert_eq!(path.total_load_kw, 30.0);
        assert!(path.valid);
        assert!(discovery.unreachable.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive_and_trimmed() {
        let segments = vec![
            seg("C1", "m-1", " MCC ", 10.0),
            seg("C2", "mcc", "Trf-1", 10.0),
        ];
        let discovery = run(&segments, PathTieBreak::FirstDiscovered);
        assert_eq!(discovery.paths.len(), 1);
        assert_eq!(discovery.paths[0].segments, vec![0, 1]);
        assert_eq!(discovery.paths[0].root_bus, "Trf-1");
    }

    #[test]
    fn branches_report_each_leaf() {
        let segments = vec![
            seg("C1", "M1", "MCC", 10.0),
            seg("C2", "M2", "MCC", 10.0),
            seg("C3", "MCC", "TRF", 10.0),
        ];
        let discovery = run(&segments, PathTieBreak::FirstDiscovered);
        let starts: Vec<_> = discovery.paths.iter().map(|p| p.start_bus.as_str()).collect();
        assert_eq!(starts, vec!["M1", "M2"]);
    }

    #[test]
    fn first_discovered_prefers_fewest_hops_then_input_order() {
        let segments = vec![
            seg("LONG-A", "LOAD", "A", 5.0),
            seg("LONG-B", "A", "TRF", 5.0),
            seg("DIRECT", "LOAD", "TRF", 500.0),
        ];
        let discovery = run(&segments, PathTieBreak::FirstDiscovered);
        assert_eq!(discovery.paths[0].segment_ids, vec!["DIRECT"]);
    }

    #[test]
    fn shortest_length_prefers_shorter_route() {
        let segments = vec![
            seg("LONG-A", "LOAD", "A", 5.0),
            seg("LONG-B", "A", "TRF", 5.0),
            seg("DIRECT", "LOAD", "TRF", 500.0),
        ];
        let discovery = run(&segments, PathTieBreak::ShortestLength);
        let load_path = discovery
            .paths
            .iter()
            .find(|p| p.start_bus == "LOAD")
            .unwrap();
        assert_eq!(load_path.segment_ids, vec!["LONG-A", "LONG-B"]);
        assert_eq!(load_path.total_length_m, 10.0);
    }

    #[test]
    fn cycle_beside_valid_chain_is_reported_unreachable() {
        let segments = vec![
            seg("C1", "LOAD", "TRF", 10.0),
            seg("X1", "A", "B", 10.0),
            seg("X2", "B", "A", 10.0),
        ];
        let discovery = run(&segments, PathTieBreak::FirstDiscovered);
        assert_eq!(discovery.paths.len(), 1);
        let buses: Vec<_> = discovery.unreachable.iter().map(|u| u.bus.as_str()).collect();
        assert_eq!(buses, vec!["A", "B"]);
        assert!(discovery
            .unreachable
            .iter()
            .all(|u| u.reason == UnreachableReason::FrontierExhausted));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let segments: Vec<_> = (1..=40)
            .map(|i| seg(&format!("C{i}"), &format!("from_{i}"), &format!("to_{i}"), 10.0))
            .collect();
        let graph = SegmentGraph::build(&segments);
        let roots = detect_roots(&graph, &["TRF".to_owned()])
            .into_result()
            .unwrap()
            .roots;
        let sequential = discover_paths(&graph, &roots, PathTieBreak::FirstDiscovered, false);
        let parallel = discover_paths(&graph, &roots, PathTieBreak::FirstDiscovered, true);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.paths.len(), 40);
    }

    #[test]
    fn tie_break_parses_from_text() {
        assert_eq!(
            "Shortest-Length".parse::<PathTieBreak>().unwrap(),
            PathTieBreak::ShortestLength
        );
        assert!("random".parse::<PathTieBreak>().is_err());
    }
}
