//! Graph statistics over a relationship set.
//!
//! Schemas are nodes and every relationship is an undirected edge, so several
//! relationships between the same two schemas count as several edges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Relationship, RelationshipType};
use crate::model::Schema;

/// Degree above which a schema is reported as a hub.
pub const HUB_DEGREE: usize = 3;

/// Summary of the relationship graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub node_count: usize,
    pub edge_count: usize,
    /// Schemas with degree greater than [`HUB_DEGREE`], by name
    pub hubs: Vec<String>,
    /// Schemas without any relationship, by name
    pub isolated: Vec<String>,
    pub average_degree: f64,
    pub degrees: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<RelationshipType, usize>,
    pub connected_components: usize,
}

impl RelationshipGraph {
    pub fn degree(&self, schema: &str) -> usize {
        self.degrees.get(schema).copied().unwrap_or(0)
    }

    pub fn is_hub(&self, schema: &str) -> bool {
        self.degree(schema) > HUB_DEGREE
    }
}

/// Aggregates relationships into graph statistics.
///
/// Only schemas that appear in some relationship become nodes, so the
/// isolated list is empty. Use [`analyze_with_schemas`] to account for
/// schemas without relationships.
pub fn analyze_relationship_graph(relationships: &[Relationship]) -> RelationshipGraph {
    build_graph(std::iter::empty(), relationships)
}

/// Aggregates relationships, treating every given schema as a node.
pub fn analyze_with_schemas(
    schemas: &[Schema],
    relationships: &[Relationship],
) -> RelationshipGraph {
    build_graph(schemas.iter().map(|s| s.name.as_str()), relationships)
}

fn build_graph<'a>(
    nodes: impl Iterator<Item = &'a str>,
    relationships: &'a [Relationship],
) -> RelationshipGraph {
    let mut degrees: BTreeMap<String, usize> = nodes.map(|n| (n.to_string(), 0)).collect();
    let mut edges_by_type: BTreeMap<RelationshipType, usize> = BTreeMap::new();

    for relationship in relationships {
        *degrees.entry(relationship.source_schema.clone()).or_default() += 1;
        *degrees.entry(relationship.target_schema.clone()).or_default() += 1;
        *edges_by_type.entry(relationship.relationship_type).or_default() += 1;
    }

    let node_count = degrees.len();
    let edge_count = relationships.len();
    let average_degree = if node_count == 0 {
        0.0
    } else {
        degrees.values().sum::<usize>() as f64 / node_count as f64
    };

    let hubs = degrees
        .iter()
        .filter(|(_, degree)| **degree > HUB_DEGREE)
        .map(|(name, _)| name.clone())
        .collect();
    let isolated = degrees
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| name.clone())
        .collect();
    let connected_components = count_components(&degrees, relationships);

    RelationshipGraph {
        node_count,
        edge_count,
        hubs,
        isolated,
        average_degree,
        degrees,
        edges_by_type,
        connected_components,
    }
}

/// Union-find over node positions in the degree map.
fn count_components(degrees: &BTreeMap<String, usize>, relationships: &[Relationship]) -> usize {
    let index: BTreeMap<&str, usize> = degrees
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let mut parent: Vec<usize> = (0..index.len()).collect();

    fn find(parent: &mut [usize], mut node: usize) -> usize {
        while parent[node] != node {
            parent[node] = parent[parent[node]];
            node = parent[node];
        }
        node
    }

    for relationship in relationships {
        let (Some(&a), Some(&b)) = (
            index.get(relationship.source_schema.as_str()),
            index.get(relationship.target_schema.as_str()),
        ) else {
            continue;
        };
        let (root_a, root_b) = (find(&mut parent, a), find(&mut parent, b));
        if root_a != root_b {
            parent[root_a] = root_b;
        }
    }

    (0..parent.len())
        .filter(|&node| find(&mut parent, node) == node)
        .count()
}
