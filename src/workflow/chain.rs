// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Linear chain builder for check ordering
//!
//! The workflow is a totally ordered chain: check N+1 starts only after
//! check N succeeds. Declaration order is authoritative; declared
//! dependencies are validated against it rather than defining a second
//! ordering mechanism.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::errors::SmokeflowError;
use crate::workflow::Workflow;

/// Builder for the check execution chain
pub struct ChainBuilder {
    graph: DiGraph<usize, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
}

impl ChainBuilder {
    /// Create a new chain builder
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_index: HashMap::new(),
            index_to_name: HashMap::new(),
        }
    }

    /// Build the chain from a workflow
    pub fn build(workflow: &Workflow) -> Result<Self, SmokeflowError> {
        let mut builder = Self::new();

        // Add all checks as nodes
        for (idx, check) in workflow.checks.iter().enumerate() {
            let node = builder.graph.add_node(idx);
            builder.name_to_index.insert(check.name.clone(), node);
            builder.index_to_name.insert(node, check.name.clone());
        }

        // Implicit edge from each check to its successor
        for window in workflow.checks.windows(2) {
            let prev = builder.name_to_index[&window[0].name];
            let next = builder.name_to_index[&window[1].name];
            builder.graph.add_edge(prev, next, ());
        }

        // Declared dependencies must agree with declaration order
        for (idx, check) in workflow.checks.iter().enumerate() {
            let check_node = builder.name_to_index[&check.name];

            for dep_name in &check.depends_on {
                let dep_node = builder.name_to_index.get(dep_name).ok_or_else(|| {
                    SmokeflowError::UnknownDependency {
                        check: check.name.clone(),
                        dependency: dep_name.clone(),
                    }
                })?;

                let dep_idx = builder.graph[*dep_node];
                if dep_idx >= idx {
                    return Err(SmokeflowError::ChainOrderConflict {
                        check: check.name.clone(),
                        dependency: dep_name.clone(),
                    });
                }

                if !builder.graph.contains_edge(*dep_node, check_node) {
                    builder.graph.add_edge(*dep_node, check_node, ());
                }
            }
        }

        // Order-conflict detection above makes a cycle unreachable through
        // depends_on, but keep the guard for future edge sources.
        builder.validate_acyclic()?;

        Ok(builder)
    }

    fn validate_acyclic(&self) -> Result<(), SmokeflowError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(SmokeflowError::CircularDependency {
                checks: vec![self.index_to_name[&cycle.node_id()].clone()],
            }),
        }
    }

    /// Get check indices in execution order
    ///
    /// Equals declaration order once the chain validates.
    pub fn execution_order(&self) -> Result<Vec<usize>, SmokeflowError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|cycle| SmokeflowError::CircularDependency {
                checks: vec![self.index_to_name[&cycle.node_id()].clone()],
            })
    }

    /// Get check names in execution order
    pub fn execution_order_names(&self) -> Result<Vec<String>, SmokeflowError> {
        toposort(&self.graph, None)
            .map(|nodes| {
                nodes
                    .into_iter()
                    .map(|n| self.index_to_name[&n].clone())
                    .collect()
            })
            .map_err(|cycle| SmokeflowError::CircularDependency {
                checks: vec![self.index_to_name[&cycle.node_id()].clone()],
            })
    }

    /// Get the checks that must run before the named one
    pub fn predecessors(&self, check_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(check_name)?;
        let preds: Vec<String> = self
            .graph
            .neighbors_directed(*node, petgraph::Direction::Incoming)
            .map(|n| self.index_to_name[&n].clone())
            .collect();
        Some(preds)
    }

    /// Check if A runs after B (directly or transitively)
    pub fn runs_after(&self, check_a: &str, check_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(check_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(check_b) else {
            return false;
        };

        petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Generate a text representation of the execution plan
    pub fn to_text(&self, workflow: &Workflow) -> Result<String, SmokeflowError> {
        let order = self.execution_order()?;
        let mut out = String::new();

        for (i, idx) in order.iter().enumerate() {
            let check = &workflow.checks[*idx];
            out.push_str(&format!(
                "{}. {} ({}) [profile: {}]\n",
                i + 1,
                check.name,
                check.target_name(),
                check.profile
            ));
        }

        Ok(out)
    }

    /// Generate a Mermaid diagram of the chain
    pub fn to_mermaid(&self, workflow: &Workflow) -> Result<String, SmokeflowError> {
        let order = self.execution_order_names()?;
        let mut out = String::from("graph TD\n");

        for name in &order {
            let check = workflow.get_check(name).ok_or_else(|| {
                SmokeflowError::CheckNotFound { check: name.clone() }
            })?;
            out.push_str(&format!("    {}[\"{} ({})\"]\n", name, name, check.target_name()));
        }

        for window in order.windows(2) {
            out.push_str(&format!("    {} --> {}\n", window[0], window[1]));
        }

        Ok(out)
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
