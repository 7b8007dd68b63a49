//! Model dependency graph
//!
//! Staging models depend on nothing inside the project; every mart depends
//! on the staging model it reads. The runner walks the graph in topological
//! order and skips everything downstream of a failed model.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use serde::{Deserialize, Serialize};

use crate::mart::MartModel;
use crate::staging::StagingModel;

/// A node of the model graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "layer", content = "model", rename_all = "snake_case")]
pub enum ModelRef {
    Staging(StagingModel),
    Mart(MartModel),
}

impl ModelRef {
    pub fn name(self) -> &'static str {
        match self {
            ModelRef::Staging(model) => model.name(),
            ModelRef::Mart(model) => model.name(),
        }
    }

    /// Look up a model by its name in either layer
    pub fn from_name(name: &str) -> Option<Self> {
        StagingModel::from_name(name)
            .map(ModelRef::Staging)
            .or_else(|| MartModel::from_name(name).map(ModelRef::Mart))
    }

    /// Every model of the project
    pub fn all() -> Vec<ModelRef> {
        StagingModel::ALL
            .into_iter()
            .map(ModelRef::Staging)
            .chain(MartModel::ALL.into_iter().map(ModelRef::Mart))
            .collect()
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Directed graph of model dependencies; edges point downstream
#[derive(Debug, Clone)]
pub struct ModelGraph {
    graph: DiGraph<ModelRef, ()>,
    nodes: HashMap<ModelRef, NodeIndex>,
}

impl Default for ModelGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGraph {
    /// Graph of all project models
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for model in ModelRef::all() {
            nodes.insert(model, graph.add_node(model));
        }
        for mart in MartModel::ALL {
            let from = nodes[&ModelRef::Staging(mart.upstream())];
            let to = nodes[&ModelRef::Mart(mart)];
            graph.add_edge(from, to, ());
        }

        Self { graph, nodes }
    }

    /// Models in dependency order
    pub fn execution_order(&self) -> Vec<ModelRef> {
        match toposort(&self.graph, None) {
            Ok(order) => order.into_iter().map(|idx| self.graph[idx]).collect(),
            // The project graph is built acyclic
            Err(_) => ModelRef::all(),
        }
    }

    /// Models feeding `model`, transitively
    pub fn upstream(&self, model: ModelRef) -> BTreeSet<ModelRef> {
        let reversed = Reversed(&self.graph);
        self.reachable(model, |start, found| {
            let mut dfs = Dfs::new(reversed, start);
            while let Some(idx) = dfs.next(reversed) {
                found.insert(self.graph[idx]);
            }
        })
    }

    /// Models fed by `model`, transitively
    pub fn downstream(&self, model: ModelRef) -> BTreeSet<ModelRef> {
        self.reachable(model, |start, found| {
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                found.insert(self.graph[idx]);
            }
        })
    }

    fn reachable<F>(&self, model: ModelRef, walk: F) -> BTreeSet<ModelRef>
    where
        F: Fn(NodeIndex, &mut BTreeSet<ModelRef>),
    {
        let mut found = BTreeSet::new();
        if let Some(&start) = self.nodes.get(&model) {
            walk(start, &mut found);
            found.remove(&model);
        }
        found
    }

    /// Execution order restricted to `selected` and their upstream models
    pub fn plan(&self, selected: &[ModelRef]) -> Vec<ModelRef> {
        if selected.is_empty() {
            return self.execution_order();
        }
        let mut included: BTreeSet<ModelRef> = selected.iter().copied().collect();
        for model in selected {
            included.extend(self.upstream(*model));
        }
        self.execution_order()
            .into_iter()
            .filter(|m| included.contains(m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[ModelRef], model: ModelRef) -> usize {
        order.iter().position(|m| *m == model).unwrap()
    }

    #[test]
    fn test_staging_runs_before_marts() {
        let graph = ModelGraph::new();
        let order = graph.execution_order();
        assert_eq!(order.len(), 8);
        for mart in MartModel::ALL {
            assert!(
                position(&order, ModelRef::Staging(mart.upstream()))
                    < position(&order, ModelRef::Mart(mart))
            );
        }
    }

    #[test]
    fn test_downstream_of_details() {
        let graph = ModelGraph::new();
        let downstream = graph.downstream(ModelRef::Staging(StagingModel::CampsiteDetails));
        assert_eq!(downstream.len(), 4);
        assert!(downstream.contains(&ModelRef::Mart(MartModel::Facilities)));
        assert!(!downstream.contains(&ModelRef::Mart(MartModel::Alerts)));
    }

    #[test]
    fn test_plan_pulls_in_upstream() {
        let graph = ModelGraph::new();
        let plan = graph.plan(&[ModelRef::Mart(MartModel::Alerts)]);
        assert_eq!(
            plan,
            vec![
                ModelRef::Staging(StagingModel::CampsiteAlerts),
                ModelRef::Mart(MartModel::Alerts)
            ]
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            ModelRef::from_name("campsite_landscape"),
            Some(ModelRef::Mart(MartModel::Landscape))
        );
        assert_eq!(
            ModelRef::from_name("stg_doc_campsites"),
            Some(ModelRef::Staging(StagingModel::Campsites))
        );
        assert_eq!(ModelRef::from_name("unknown"), None);
    }
}
