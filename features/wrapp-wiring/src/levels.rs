use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Display,
};

use crate::{graph::Graph, types::NodeId};

/// One step of a cycle: the slot on a node which leads to the next node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub slot: String,
    pub node: String,
}

/// A chain of dependencies leading back to where it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath {
    pub hops: Vec<Hop>,
}
impl Display for CyclePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [first, ..] = self.hops.as_slice() else {
            return f.write_str("circular reference detected");
        };

        if self.hops.len() == 1 {
            return write!(
                f,
                "circular reference detected from slot '{}' in {} to itself",
                first.slot, first.node
            );
        }

        let mut display = vec!["circular reference detected from".to_string()];
        for hop in self.hops.iter().chain([first]) {
            display.push(format!("slot '{}' in {}", hop.slot, hop.node));
        }
        f.write_str(&display.join("\n"))
    }
}

impl Graph {
    /// Groups the nodes with lifecycle hooks by how many such nodes they transitively depend on
    ///
    /// Levels are sorted descending - the most dependent nodes come first.
    /// Fails if two hooked nodes sit on the same cycle, or a hooked node depends on itself.
    pub(crate) fn levels(&self, ids: &[NodeId]) -> Result<Vec<Vec<NodeId>>, CyclePath> {
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            for dependency in &node.dependencies {
                dependents
                    .entry(dependency.target)
                    .or_default()
                    .push(NodeId(index));
            }
        }

        let mut levels: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for &id in ids {
            if !self.nodes[id.0].has_hooks() {
                continue;
            }

            if let Some(cycle) = self.find_cycle(id, &dependents) {
                return Err(cycle);
            }

            let hooked_dependencies = self
                .reachable(id)
                .into_iter()
                .filter(|dependency| self.nodes[dependency.0].has_hooks())
                .count();

            tracing::trace!("{} is on level {hooked_dependencies}", self.nodes[id.0]);
            levels.entry(hooked_dependencies).or_default().push(id);
        }

        Ok(levels.into_values().rev().collect())
    }

    /// All nodes `from` transitively depends on, without `from` itself
    fn reachable(&self, from: NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut pending = vec![from];
        while let Some(id) = pending.pop() {
            for dependency in &self.nodes[id.0].dependencies {
                if dependency.target != from && seen.insert(dependency.target) {
                    pending.push(dependency.target);
                }
            }
        }
        seen
    }

    /// Walks the paths from `root` back to itself
    ///
    /// Every node other than root is expanded at most once per root, so the walk stays linear in
    /// the number of edges. Returns the first path which is a direct self reference or passes more
    /// than one hooked node.
    fn find_cycle(
        &self,
        root: NodeId,
        dependents: &HashMap<NodeId, Vec<NodeId>>,
    ) -> Option<CyclePath> {
        // Only nodes which can lead back to root are worth walking into
        let mut leads_back = HashSet::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            for dependent in dependents.get(&id).into_iter().flatten() {
                if leads_back.insert(*dependent) {
                    pending.push(*dependent);
                }
            }
        }
        if !leads_back.contains(&root) {
            return None;
        }

        let mut path = Vec::new();
        let mut visited = HashSet::new();
        return walk(self, root, root, &leads_back, &mut path, &mut visited);

        fn walk<'g>(
            graph: &'g Graph,
            root: NodeId,
            from: NodeId,
            leads_back: &HashSet<NodeId>,
            path: &mut Vec<(&'g str, NodeId)>,
            visited: &mut HashSet<NodeId>,
        ) -> Option<CyclePath> {
            for dependency in &graph.nodes[from.0].dependencies {
                path.push((dependency.slot.as_str(), from));

                if dependency.target == root {
                    let hooked = path
                        .iter()
                        .filter(|(_, id)| graph.nodes[id.0].has_hooks())
                        .count();

                    // A cycle only matters for start/stop if it orders two hooked nodes
                    if path.len() == 1 || hooked > 1 {
                        return Some(graph.cycle_path(path));
                    }
                } else if leads_back.contains(&dependency.target)
                    && visited.insert(dependency.target)
                {
                    if let Some(cycle) =
                        walk(graph, root, dependency.target, leads_back, path, visited)
                    {
                        return Some(cycle);
                    }
                }

                path.pop();
            }

            None
        }
    }

    fn cycle_path(&self, path: &[(&str, NodeId)]) -> CyclePath {
        CyclePath {
            hops: path
                .iter()
                .map(|(slot, id)| Hop {
                    slot: slot.to_string(),
                    node: self.nodes[id.0].to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_self_reference() {
        let path = CyclePath {
            hops: vec![Hop {
                slot: "me".to_string(),
                node: "app::A".to_string(),
            }],
        };
        assert_eq!(
            path.to_string(),
            "circular reference detected from slot 'me' in app::A to itself"
        );
    }

    #[test]
    fn formats_a_longer_cycle_back_to_its_start() {
        let path = CyclePath {
            hops: vec![
                Hop {
                    slot: "b".to_string(),
                    node: "app::A".to_string(),
                },
                Hop {
                    slot: "a".to_string(),
                    node: "app::B".to_string(),
                },
            ],
        };
        assert_eq!(
            path.to_string(),
            "circular reference detected from\nslot 'b' in app::A\nslot 'a' in app::B\nslot 'b' in app::A"
        );
    }
}
