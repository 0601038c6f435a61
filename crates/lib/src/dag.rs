//! Dependency DAG over a stack's declared resources.
//!
//! The orchestration engine provisions resources in dependency order. This
//! module builds that graph from a manifest, verifies it and groups the
//! resources into deployment waves.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::construct::LogicalId;
use crate::manifest::StackManifest;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  /// A resource references a logical id that is not in the manifest.
  #[error("{from} depends on unknown resource {to}")]
  UnknownDependency { from: LogicalId, to: LogicalId },

  /// Two resources share a logical id.
  #[error("logical id {0} appears more than once")]
  DuplicateNode(LogicalId),

  #[error("dependency cycle detected")]
  CycleDetected,
}

/// A DAG of resource dependencies.
///
/// Edges run from a dependency to its dependent. Node indices follow manifest
/// order, which is used to break ties within a wave.
pub struct DeclarationDag {
  graph: DiGraph<LogicalId, ()>,
  nodes: HashMap<LogicalId, NodeIndex>,
}

impl DeclarationDag {
  /// Build the DAG from a manifest.
  ///
  /// # Errors
  ///
  /// Returns `UnknownDependency` for dangling references, `DuplicateNode` for
  /// repeated logical ids and `CycleDetected` if the references loop.
  pub fn from_manifest(manifest: &StackManifest) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for entry in &manifest.resources {
      let idx = graph.add_node(entry.logical_id.clone());
      if nodes.insert(entry.logical_id.clone(), idx).is_some() {
        return Err(GraphError::DuplicateNode(entry.logical_id.clone()));
      }
    }

    for entry in &manifest.resources {
      let dependent = nodes[&entry.logical_id];
      for reference in entry.resource.references() {
        let Some(&dependency) = nodes.get(reference) else {
          return Err(GraphError::UnknownDependency {
            from: entry.logical_id.clone(),
            to: reference.clone(),
          });
        };
        graph.update_edge(dependency, dependent, ());
      }
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic()?;
    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|_| GraphError::CycleDetected)?;
    Ok(())
  }

  /// Resources grouped into waves.
  ///
  /// Every resource in a wave depends only on resources in earlier waves, so
  /// a wave can be provisioned in parallel. Within a wave resources keep
  /// manifest order.
  pub fn waves(&self) -> Result<Vec<Vec<LogicalId>>, GraphError> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();
    let mut placed = vec![false; in_degree.len()];
    let mut waves = Vec::new();

    while placed.iter().any(|p| !p) {
      let ready: Vec<NodeIndex> = self
        .graph
        .node_indices()
        .filter(|idx| !placed[idx.index()] && in_degree[idx.index()] == 0)
        .collect();

      if ready.is_empty() {
        return Err(GraphError::CycleDetected);
      }

      for &idx in &ready {
        placed[idx.index()] = true;
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          in_degree[neighbor.index()] = in_degree[neighbor.index()].saturating_sub(1);
        }
      }

      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
    }

    Ok(waves)
  }

  /// Resources in a valid provisioning order.
  pub fn topological_order(&self) -> Result<Vec<LogicalId>, GraphError> {
    Ok(self.waves()?.into_iter().flatten().collect())
  }

  /// Wave index of every resource.
  pub fn wave_index(&self) -> Result<HashMap<LogicalId, usize>, GraphError> {
    let mut index = HashMap::new();
    for (wave, ids) in self.waves()?.into_iter().enumerate() {
      for id in ids {
        index.insert(id, wave);
      }
    }
    Ok(index)
  }

  /// Direct dependencies of a resource, in manifest order.
  pub fn dependencies(&self, id: &LogicalId) -> Vec<LogicalId> {
    self.neighbors(id, Direction::Incoming)
  }

  /// Resources that directly depend on `id`, in manifest order.
  pub fn dependents(&self, id: &LogicalId) -> Vec<LogicalId> {
    self.neighbors(id, Direction::Outgoing)
  }

  fn neighbors(&self, id: &LogicalId, direction: Direction) -> Vec<LogicalId> {
    let Some(&idx) = self.nodes.get(id) else {
      return Vec::new();
    };
    let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
    found.sort();
    found.into_iter().map(|n| self.graph[n].clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}
