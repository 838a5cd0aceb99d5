use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    fmt::Debug,
};

use rand::seq::SliceRandom;
use tracing::Dispatch;

use crate::{
    errors::RegisterError,
    lifecycle::LifecycleState,
    node::Node,
    types::NodeId,
};

/// The graph of all known nodes
///
/// Nodes live in an index-addressed arena, so nodes created while populating can be appended
/// during the traversal that creates them. Unnamed nodes are identified by their type, named
/// nodes by their name.
#[derive(Default)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    /// Unnamed nodes in insertion order
    pub(crate) unnamed: Vec<NodeId>,
    unnamed_types: HashSet<TypeId>,
    named: HashMap<String, NodeId>,
    /// Named nodes in insertion order
    pub(crate) named_order: Vec<NodeId>,

    pub(crate) started: Vec<NodeId>,
    pub(crate) state: LifecycleState,

    logger: Option<Dispatch>,
}

impl Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for node in &self.nodes {
            map.entry(&node.to_string(), &node.dependencies.len());
        }
        map.finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes all events of this graph to the given dispatcher
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Dispatch>) {
        self.logger = logger;
    }

    /// Runs `op` with the graph's logger as the default dispatcher, if one is set
    pub(crate) fn logged<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        match self.logger.clone() {
            Some(logger) => tracing::dispatcher::with_default(&logger, || op(self)),
            None => op(self),
        }
    }

    /// Adds nodes to the graph
    ///
    /// Stops at the first node which can't be added, nodes before it stay registered.
    pub fn register(
        &mut self,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<Vec<NodeId>, RegisterError> {
        self.logged(|graph| {
            nodes
                .into_iter()
                .map(|node| graph.register_one(node))
                .collect()
        })
    }

    pub(crate) fn register_one(&mut self, node: Node) -> Result<NodeId, RegisterError> {
        if !node.dependencies.is_empty() {
            return Err(RegisterError::DependenciesSupplied(node.to_string()));
        }

        let id = NodeId(self.nodes.len());
        match &node.name {
            None => {
                if !node.is_component() {
                    return Err(RegisterError::NotAggregate(node.type_info()));
                }

                let info = node.type_info();
                if !self.unnamed_types.insert(info.type_id) {
                    return Err(RegisterError::DuplicateType(info));
                }
                self.unnamed.push(id);
            }
            Some(name) => {
                if self.named.contains_key(name) {
                    return Err(RegisterError::DuplicateName(name.clone()));
                }
                self.named.insert(name.clone(), id);
                self.named_order.push(id);
            }
        }

        match node.created {
            true => tracing::debug!("created {node}"),
            false => tracing::debug!("provided {node}"),
        }
        self.nodes.push(node);

        Ok(id)
    }

    pub fn lookup_named(&self, name: &str) -> Option<&Node> {
        self.named.get(name).map(|id| &self.nodes[id.0])
    }

    pub(crate) fn named_id(&self, name: &str) -> Option<NodeId> {
        self.named.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All known nodes, named as well as unnamed
    ///
    /// The order is shuffled on every call, so callers can't come to rely on it.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.shuffle(&mut rand::thread_rng());
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Nodes whose hooks succeeded during the last start, in start order
    pub fn started(&self) -> impl Iterator<Item = &Node> {
        self.started.iter().map(|id| &self.nodes[id.0])
    }
}
