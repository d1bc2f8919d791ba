//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Segment graph index and root bus inference."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::{algo::tarjan_scc, graph::NodeIndex, Graph};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::{CalcEngineError, Result},
    model::{bus_key, CableSegment},
};

/// Directed view of the edge list. Edges point from the load side to the supply side and
/// carry the index of the segment in the caller's slice. Marker rows and rows with a blank
/// bus are left out.
#[derive(Debug)]
pub struct SegmentGraph<'a> {
    segments: &'a [CableSegment],
    graph: Graph<String, usize>,
    nodes: HashMap<String, NodeIndex>,
    outgoing: HashMap<String, Vec<usize>>,
    labels: IndexMap<String, String>,
    origins: Vec<String>,
    destinations: HashSet<String>,
    power_segments: usize,
    skipped_rows: usize,
}

impl<'a> SegmentGraph<'a> {
    pub fn build(segments: &'a [CableSegment]) -> Self {
        let mut graph = Graph::<String, usize>::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        let mut labels: IndexMap<String, String> = IndexMap::new();
        let mut origins = Vec::new();
        let mut seen_origins = HashSet::new();
        let mut destinations = HashSet::new();
        let mut power_segments = 0;
        let mut skipped_rows = 0;

        for (index, segment) in segments.iter().enumerate() {
            if !segment.carries_power() {
                skipped_rows += 1;
                continue;
            }
            power_segments += 1;
            let origin = segment.origin_key();
            let destination = segment.destination_key();

            for (key, raw) in [
                (&origin, &segment.origin_bus),
                (&destination, &segment.destination_bus),
            ] {
                labels
                    .entry(key.clone())
                    .or_insert_with(|| raw.trim().to_owned());
                nodes
                    .entry(key.clone())
                    .or_insert_with(|| graph.add_node(key.clone()));
            }

            graph.add_edge(nodes[&origin], nodes[&destination], index);
            outgoing.entry(origin.clone()).or_default().push(index);
            destinations.insert(destination);
            if seen_origins.insert(origin.clone()) {
                origins.push(origin);
            }
        }

        Self {
            segments,
            graph,
            nodes,
            outgoing,
            labels,
            origins,
            destinations,
            power_segments,
            skipped_rows,
        }
    }

    pub fn segments(&self) -> &'a [CableSegment] {
        self.segments
    }

    pub fn segment(&self, index: usize) -> &'a CableSegment {
        &self.segments[index]
    }

    pub fn graph(&self) -> &Graph<String, usize> {
        &self.graph
    }

    pub fn node(&self, key: &str) -> Option<NodeIndex> {
        self.nodes.get(key).copied()
    }

    /// Segment indices leaving `key`, in input order.
    pub fn outgoing(&self, key: &str) -> &[usize] {
        self.outgoing.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Display label for a normalized bus key (first spelling seen in the input).
    pub fn label<'k>(&'k self, key: &'k str) -> &'k str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Distinct origin buses in order of first appearance.
    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn is_origin(&self, key: &str) -> bool {
        self.outgoing.contains_key(key)
    }

    pub fn is_destination(&self, key: &str) -> bool {
        self.destinations.contains(key)
    }

    pub fn power_segment_count(&self) -> usize {
        self.power_segments
    }

    /// Marker rows and rows with a blank bus.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Strongly connected components that contain a cycle.
    pub fn cyclic_component_count(&self) -> usize {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .count()
    }
}

/// Buses treated as the source of the hierarchy, keyed by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootSet {
    buses: IndexMap<String, String>,
}

impl RootSet {
    fn insert(&mut self, key: String, label: String) {
        self.buses.entry(key).or_insert(label);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buses.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buses.keys().map(String::as_str)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.buses.values().map(String::as_str)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.buses.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootStrategy {
    ExplicitMarker,
    StructuralInference,
}

/// Diagnostics for an edge list from which no root could be derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedTopology {
    pub power_segments: usize,
    pub cyclic_components: usize,
    pub reason: String,
}

/// Outcome of root detection; the first strategy that yields a bus wins.
#[derive(Debug, Clone, PartialEq)]
pub enum RootDetection {
    ExplicitMarker(RootSet),
    StructuralInference(RootSet),
    Unresolved(UnresolvedTopology),
}

/// Roots together with the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoots {
    pub strategy: RootStrategy,
    pub roots: RootSet,
}

impl RootDetection {
    pub fn strategy(&self) -> Option<RootStrategy> {
        match self {
            RootDetection::ExplicitMarker(_) => Some(RootStrategy::ExplicitMarker),
            RootDetection::StructuralInference(_) => Some(RootStrategy::StructuralInference),
            RootDetection::Unresolved(_) => None,
        }
    }

    pub fn roots(&self) -> Option<&RootSet> {
        match self {
            RootDetection::ExplicitMarker(roots) | RootDetection::StructuralInference(roots) => {
                Some(roots)
            }
            RootDetection::Unresolved(_) => None,
        }
    }

    /// Converts an unresolved outcome into a structural error.
    pub fn into_result(self) -> Result<ResolvedRoots> {
        match self {
            RootDetection::ExplicitMarker(roots) => Ok(ResolvedRoots {
                strategy: RootStrategy::ExplicitMarker,
                roots,
            }),
            RootDetection::StructuralInference(roots) => Ok(ResolvedRoots {
                strategy: RootStrategy::StructuralInference,
                roots,
            }),
            RootDetection::Unresolved(details) if details.power_segments == 0 => {
                Err(CalcEngineError::EmptyTopology)
            }
            RootDetection::Unresolved(details) => Err(CalcEngineError::NoRootReachable {
                reason: details.reason,
            }),
        }
    }
}

/// Infers the root buses of the hierarchy.
///
/// 1. Destinations whose name contains one of `markers` (case-insensitive).
/// 2. Destinations that never appear as an origin.
/// 3. Otherwise unresolved, with cycle diagnostics.
pub fn detect_roots(graph: &SegmentGraph<'_>, markers: &[String]) -> RootDetection {
    let markers: Vec<String> = markers
        .iter()
        .map(|marker| bus_key(marker))
        .filter(|marker| !marker.is_empty())
        .collect();

    let mut explicit = RootSet::default();
    let mut structural = RootSet::default();
    for segment in graph.segments().iter().filter(|s| s.carries_power()) {
        let destination = segment.destination_key();
        if markers.iter().any(|marker| destination.contains(marker.as_str())) {
            explicit.insert(destination.clone(), graph.label(&destination).to_owned());
        }
        if !graph.is_origin(&destination) {
            structural.insert(destination.clone(), graph.label(&destination).to_owned());
        }
    }

    if !explicit.is_empty() {
        info!(
            roots = explicit.len(),
            strategy = "explicit-marker",
            "root buses matched by marker"
        );
        return RootDetection::ExplicitMarker(explicit);
    }
    if !structural.is_empty() {
        info!(
            roots = structural.len(),
            strategy = "structural-inference",
            "no marker matched; root buses inferred from edge direction"
        );
        return RootDetection::StructuralInference(structural);
    }

    let power_segments = graph.power_segment_count();
    let cyclic_components = graph.cyclic_component_count();
    let reason = if power_segments == 0 {
        format!(
            "edge list holds no power-carrying segments ({} marker or blank rows)",
            graph.skipped_rows()
        )
    } else {
        format!(
            "no destination matched markers {:?} and every destination of {} segments is also an origin ({} cyclic component(s))",
            markers, power_segments, cyclic_components
        )
    };
    warn!(power_segments, cyclic_components, "{}", reason);
    RootDetection::Unresolved(UnresolvedTopology {
        power_segments,
        cyclic_components,
        reason,
    })
}
