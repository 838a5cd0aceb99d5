use crate::{
    descriptor::{SlotKind, SlotMeta},
    errors::ResolveError,
    graph::Graph,
    node::{Node, SlotSpec},
    types::{Dependency, NodeId},
    wiring::Wiring,
};

impl Graph {
    /// Fills the unset slots of every incomplete node
    ///
    /// Concrete slots are resolved in a first pass, capability slots in a second one, so every
    /// component created on demand exists before capabilities are matched.
    /// On error the graph stays partially populated.
    pub fn populate(&mut self) -> Result<(), ResolveError> {
        self.logged(|graph| graph.try_populate())
    }

    fn try_populate(&mut self) -> Result<(), ResolveError> {
        tracing::debug!(
            "Populating graph with {} named and {} unnamed nodes",
            self.named_order.len(),
            self.unnamed.len()
        );

        for id in self.named_order.clone() {
            if !self.nodes[id.0].complete {
                self.populate_explicit(id)?;
            }
        }

        // Nodes created on demand are appended to `unnamed` while we walk it
        let mut index = 0;
        while index < self.unnamed.len() {
            let id = self.unnamed[index];
            index += 1;

            if !self.nodes[id.0].complete {
                self.populate_explicit(id)?;
            }
        }

        let order: Vec<NodeId> = self
            .named_order
            .iter()
            .chain(&self.unnamed)
            .copied()
            .collect();
        for id in order {
            if self.nodes[id.0].complete {
                continue;
            }
            self.populate_capabilities(id)?;
            self.nodes[id.0].complete = true;
        }

        Ok(())
    }

    /// First pass - everything except auto-matched capability slots
    fn populate_explicit(&mut self, id: NodeId) -> Result<(), ResolveError> {
        let node = self.nodes[id.0].clone();
        if !node.is_component() {
            return Ok(());
        }

        for slot in node.specs.keys() {
            if !node.slots().iter().any(|meta| meta.name == slot) {
                tracing::warn!("ignoring spec for unknown slot '{slot}' in {node}");
            }
        }

        for (index, meta) in node.slots().iter().enumerate() {
            let Some(spec) = node.specs.get(meta.name) else {
                continue;
            };

            if meta.kind == SlotKind::Private {
                return Err(ResolveError::PrivateSlot {
                    slot: meta.name.to_string(),
                    node: node.to_string(),
                });
            }

            // Never overwrite
            if !node.value.is_default(index) {
                continue;
            }

            if let Some(target) = &spec.target {
                let target = self.require_named(&node, meta, target)?;
                self.wire(id, index, meta, Wiring::One(&self.nodes[target.0]), target)?;
                tracing::debug!(
                    "assigned {} to slot '{}' in {node}",
                    self.nodes[target.0],
                    meta.name
                );
                self.record(id, meta, [target]);
                continue;
            }

            match meta.kind {
                // Handled in the second pass
                SlotKind::Capability => continue,
                SlotKind::Sequence => self.populate_sequence(id, &node, index, meta, spec)?,
                SlotKind::Map => self.populate_map(id, &node, index, meta, spec)?,
                SlotKind::Reference => self.populate_reference(id, &node, index, meta)?,
                SlotKind::Value | SlotKind::Private => {
                    return Err(ResolveError::UnsupportedSlot {
                        slot: meta.name.to_string(),
                        node: node.to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    fn populate_sequence(
        &mut self,
        id: NodeId,
        node: &Node,
        index: usize,
        meta: &SlotMeta,
        spec: &SlotSpec,
    ) -> Result<(), ResolveError> {
        let mut targets = Vec::with_capacity(spec.elements.len());
        for element in &spec.elements {
            targets.push(self.require_element(node, index, meta, &element.target)?);
        }

        let elements: Vec<&Node> = targets.iter().map(|target| &self.nodes[target.0]).collect();
        if !node.value.wire(index, Wiring::Sequence(&elements)).unwrap_or(false) {
            return Err(self.mismatch(node, meta, targets.first().copied()));
        }

        tracing::debug!(
            "made sequence of {} for slot '{}' in {node}",
            targets.len(),
            meta.name
        );
        self.record(id, meta, targets);
        Ok(())
    }

    fn populate_map(
        &mut self,
        id: NodeId,
        node: &Node,
        index: usize,
        meta: &SlotMeta,
        spec: &SlotSpec,
    ) -> Result<(), ResolveError> {
        let mut targets = Vec::with_capacity(spec.elements.len());
        for element in &spec.elements {
            node.value
                .check_key(index, &element.key)
                .map_err(|source| ResolveError::KeyCoercion {
                    key: element.key.clone(),
                    slot: meta.name.to_string(),
                    node: node.to_string(),
                    source,
                })?;
            let target = self.require_element(node, index, meta, &element.target)?;
            targets.push((element.key.as_str(), target));
        }

        let entries: Vec<(&str, &Node)> = targets
            .iter()
            .map(|(key, target)| (*key, &self.nodes[target.0]))
            .collect();
        if !node.value.wire(index, Wiring::Map(&entries)).unwrap_or(false) {
            let first = targets.first().map(|(_, target)| *target);
            return Err(self.mismatch(node, meta, first));
        }

        tracing::debug!(
            "made map of {} for slot '{}' in {node}",
            targets.len(),
            meta.name
        );
        self.record(id, meta, targets.into_iter().map(|(_, target)| target));
        Ok(())
    }

    /// Wires the first unnamed node of the slot's type, creating one if there is none
    fn populate_reference(
        &mut self,
        id: NodeId,
        node: &Node,
        index: usize,
        meta: &SlotMeta,
    ) -> Result<(), ResolveError> {
        let existing = self
            .unnamed
            .iter()
            .copied()
            .find(|candidate| node.value.accepts(index, &self.nodes[candidate.0]));

        let (target, created) = match existing {
            Some(target) => (target, false),
            None => {
                let created = node.value.synthesize(index).ok_or_else(|| {
                    ResolveError::UnsupportedSlot {
                        slot: meta.name.to_string(),
                        node: node.to_string(),
                    }
                })?;
                (self.register_one(created)?, true)
            }
        };

        self.wire(id, index, meta, Wiring::One(&self.nodes[target.0]), target)?;
        match created {
            true => tracing::debug!(
                "assigned newly created {} to slot '{}' in {node}",
                self.nodes[target.0],
                meta.name
            ),
            false => tracing::debug!(
                "assigned existing {} to slot '{}' in {node}",
                self.nodes[target.0],
                meta.name
            ),
        }
        self.record(id, meta, [target]);
        Ok(())
    }

    /// Second pass - exactly one unnamed node has to satisfy each capability slot
    fn populate_capabilities(&mut self, id: NodeId) -> Result<(), ResolveError> {
        let node = self.nodes[id.0].clone();
        if !node.is_component() {
            return Ok(());
        }

        for (index, meta) in node.slots().iter().enumerate() {
            if meta.kind != SlotKind::Capability {
                continue;
            }
            let Some(spec) = node.specs.get(meta.name) else {
                continue;
            };
            if spec.target.is_some() || !node.value.is_default(index) {
                continue;
            }

            let mut found: Option<NodeId> = None;
            for &candidate in &self.unnamed {
                if !node.value.accepts(index, &self.nodes[candidate.0]) {
                    continue;
                }
                if let Some(first) = found {
                    return Err(ResolveError::Ambiguous {
                        slot: meta.name.to_string(),
                        node: node.to_string(),
                        first: self.nodes[first.0].to_string(),
                        second: self.nodes[candidate.0].to_string(),
                    });
                }
                found = Some(candidate);
            }

            let Some(target) = found else {
                return Err(ResolveError::NoCandidate {
                    slot: meta.name.to_string(),
                    node: node.to_string(),
                });
            };

            self.wire(id, index, meta, Wiring::One(&self.nodes[target.0]), target)?;
            tracing::debug!(
                "assigned existing {} to capability slot '{}' in {node}",
                self.nodes[target.0],
                meta.name
            );
            self.record(id, meta, [target]);
        }

        Ok(())
    }

    fn require_named(
        &self,
        node: &Node,
        meta: &SlotMeta,
        name: &str,
    ) -> Result<NodeId, ResolveError> {
        self.named_id(name)
            .ok_or_else(|| ResolveError::MissingNamed {
                name: name.to_string(),
                slot: meta.name.to_string(),
                node: node.to_string(),
            })
    }

    /// Looks up a collection element and checks it fits the element type
    fn require_element(
        &self,
        node: &Node,
        index: usize,
        meta: &SlotMeta,
        name: &str,
    ) -> Result<NodeId, ResolveError> {
        let target = self.require_named(node, meta, name)?;
        if !node.value.accepts(index, &self.nodes[target.0]) {
            return Err(self.mismatch(node, meta, Some(target)));
        }
        Ok(target)
    }

    fn wire(
        &self,
        id: NodeId,
        index: usize,
        meta: &SlotMeta,
        wiring: Wiring<'_>,
        target: NodeId,
    ) -> Result<(), ResolveError> {
        let node = &self.nodes[id.0];
        match node.value.wire(index, wiring) {
            Ok(true) => Ok(()),
            _ => Err(self.mismatch(node, meta, Some(target))),
        }
    }

    fn mismatch(&self, node: &Node, meta: &SlotMeta, target: Option<NodeId>) -> ResolveError {
        let target = target.map(|target| &self.nodes[target.0]);
        ResolveError::TypeMismatch {
            name: target
                .and_then(|target| target.name.clone())
                .unwrap_or_default(),
            actual: target.map_or(meta.target, Node::type_info),
            expected: meta.target,
            slot: meta.name.to_string(),
            node: node.to_string(),
        }
    }

    fn record(&mut self, id: NodeId, meta: &SlotMeta, targets: impl IntoIterator<Item = NodeId>) {
        let dependencies = &mut self.nodes[id.0].dependencies;
        for target in targets {
            dependencies.push(Dependency {
                slot: meta.name.to_string(),
                target,
            });
        }
    }
}
