use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{Debug, Display},
    sync::Arc,
};

use crate::{
    descriptor::{Component, Descriptor, SlotMeta},
    errors::{AssignError, CoerceError},
    lifecycle::Hook,
    types::{Dependency, DynError, Injectable, Shared, TypeInfo},
    wiring::Wiring,
};

/// How the resolver should fill one slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSpec {
    /// Name of the node to assign - None auto-matches by type or capability
    pub target: Option<String>,
    /// Elements for sequence and map slots
    pub elements: Vec<Element>,
}

/// One element of a collection slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Map key in textual form, unused for sequences
    pub key: String,
    /// Name of the node to put at this position
    pub target: String,
}

impl SlotSpec {
    /// Match by type, or by capability for capability slots
    pub fn auto() -> Self {
        Self::default()
    }

    /// Assign the node registered under `name`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            target: Some(name.into()),
            elements: Vec::new(),
        }
    }

    /// Build a sequence from named nodes, in the given order
    pub fn sequence<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: None,
            elements: targets
                .into_iter()
                .map(|target| Element {
                    key: String::new(),
                    target: target.into(),
                })
                .collect(),
        }
    }

    /// Build a map from `(key, node name)` pairs
    pub fn entries<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        Self {
            target: None,
            elements: entries
                .into_iter()
                .map(|(key, target)| Element {
                    key: key.into(),
                    target: target.into(),
                })
                .collect(),
        }
    }
}

/// A value known to the graph, named or identified by its type
#[derive(Clone)]
pub struct Node {
    pub(crate) value: Arc<dyn DynValue>,
    pub(crate) name: Option<String>,
    pub(crate) complete: bool,
    pub(crate) specs: HashMap<String, SlotSpec>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) created: bool,
}

impl Node {
    /// A component node - the graph may fill its slots
    pub fn new<T: Component>(component: Shared<T>) -> Self {
        Self::from_value(Arc::new(Bound::new(component)))
    }

    /// A plain value, only usable as a named constant
    pub fn constant<V: Injectable>(value: V) -> Self {
        Self::from_value(Arc::new(Constant { value }))
    }

    fn from_value(value: Arc<dyn DynValue>) -> Self {
        Node {
            value,
            name: None,
            complete: false,
            specs: HashMap::new(),
            dependencies: Vec::new(),
            created: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into()).filter(|name: &String| !name.is_empty());
        self
    }

    /// Marks the node as pre-built, it will never be scanned for slots
    pub fn complete(mut self) -> Self {
        self.complete = true;
        self
    }

    /// Attaches a wiring spec to one of the component's slots
    pub fn slot(mut self, slot: impl Into<String>, spec: SlotSpec) -> Self {
        self.specs.insert(slot.into(), spec);
        self
    }

    pub(crate) fn created(mut self) -> Self {
        self.created = true;
        self
    }
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn type_info(&self) -> TypeInfo {
        self.value.info()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True if the graph created this node to fill a slot
    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_component(&self) -> bool {
        self.value.is_component()
    }

    /// Edges recorded while populating, in resolution order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn specs(&self) -> &HashMap<String, SlotSpec> {
        &self.specs
    }

    pub fn slots(&self) -> &[SlotMeta] {
        self.value.slots()
    }

    /// The shared handle of a component node of type `T`
    pub fn get<T: Injectable>(&self) -> Option<Shared<T>> {
        self.handle().downcast_ref::<Shared<T>>().cloned()
    }

    /// The value of a constant node of type `V`
    pub fn constant_ref<V: Injectable>(&self) -> Option<&V> {
        self.value.constant()?.downcast_ref::<V>()
    }

    /// Coerces `raw` into the `value` slot called `slot`
    pub fn assign_value(&self, slot: &str, raw: &str) -> Result<(), AssignError> {
        self.assign(slot, Wiring::Raw(raw))
    }

    /// Coerces every element into the `values` slot called `slot`, keeping their order
    pub fn assign_values(&self, slot: &str, raw: &[&str]) -> Result<(), AssignError> {
        self.assign(slot, Wiring::RawList(raw))
    }

    /// Coerces keys and values into the `value_map` slot called `slot`
    pub fn assign_entries(&self, slot: &str, raw: &[(&str, &str)]) -> Result<(), AssignError> {
        self.assign(slot, Wiring::RawEntries(raw))
    }

    fn assign(&self, slot: &str, wiring: Wiring<'_>) -> Result<(), AssignError> {
        let index = self
            .slots()
            .iter()
            .position(|meta| meta.name == slot)
            .ok_or_else(|| AssignError::UnknownSlot {
                slot: slot.to_string(),
                node: self.to_string(),
            })?;

        match self.value.wire(index, wiring)? {
            true => Ok(()),
            false => Err(AssignError::NotScalar {
                slot: slot.to_string(),
                node: self.to_string(),
            }),
        }
    }

    pub(crate) fn handle(&self) -> &(dyn Any + Send + Sync) {
        self.value.handle()
    }

    pub(crate) fn cast(&self, handle: TypeId) -> Option<Box<dyn Any + Send + Sync>> {
        self.value.cast(handle)
    }

    /// Eligible for start/stop ordering
    pub fn has_hooks(&self) -> bool {
        Hook::ALL.into_iter().any(|hook| self.value.has_hook(hook))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value.info())?;
        if let Some(name) = &self.name {
            write!(f, " named {name}")?;
        }
        Ok(())
    }
}
impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.value.info().type_name)
            .field("name", &self.name)
            .field("complete", &self.complete)
            .field("created", &self.created)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Wrapper Trait for node values, allowing the graph to handle any component
pub(crate) trait DynValue: Send + Sync {
    fn info(&self) -> TypeInfo;

    /// `Shared<T>` for components, the value itself for constants
    fn handle(&self) -> &(dyn Any + Send + Sync);

    fn is_component(&self) -> bool;

    fn constant(&self) -> Option<&(dyn Any + Send + Sync)> {
        None
    }

    fn slots(&self) -> &[SlotMeta] {
        &[]
    }

    fn cast(&self, handle: TypeId) -> Option<Box<dyn Any + Send + Sync>> {
        let _ = handle;
        None
    }

    fn has_hook(&self, hook: Hook) -> bool {
        let _ = hook;
        false
    }

    /// Runs the hook if the value exposes it
    fn run_hook(&self, hook: Hook) -> Option<Result<(), DynError>> {
        let _ = hook;
        None
    }

    fn is_default(&self, slot: usize) -> bool {
        let _ = slot;
        false
    }

    fn accepts(&self, slot: usize, node: &Node) -> bool {
        let _ = (slot, node);
        false
    }

    fn check_key(&self, slot: usize, raw: &str) -> Result<(), CoerceError> {
        let _ = (slot, raw);
        Ok(())
    }

    fn wire(&self, slot: usize, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let _ = (slot, wiring);
        Ok(false)
    }

    fn synthesize(&self, slot: usize) -> Option<Node> {
        let _ = slot;
        None
    }
}

/// A component together with its descriptor
struct Bound<T: Component> {
    handle: Shared<T>,
    descriptor: Descriptor<T>,
    meta: Vec<SlotMeta>,
}
impl<T: Component> Bound<T> {
    fn new(handle: Shared<T>) -> Self {
        let descriptor = Descriptor::<T>::of();
        let meta = descriptor.slots().copied().collect();
        Bound {
            handle,
            descriptor,
            meta,
        }
    }
}

impl<T: Component> DynValue for Bound<T> {
    fn info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn handle(&self) -> &(dyn Any + Send + Sync) {
        &self.handle
    }

    fn is_component(&self) -> bool {
        true
    }

    fn slots(&self) -> &[SlotMeta] {
        &self.meta
    }

    fn cast(&self, handle: TypeId) -> Option<Box<dyn Any + Send + Sync>> {
        self.descriptor
            .casts
            .iter()
            .find(|cast| cast.handle == handle)
            .map(|cast| (cast.cast)(&self.handle))
    }

    fn has_hook(&self, hook: Hook) -> bool {
        self.descriptor.hooks.get(hook).is_some()
    }

    fn run_hook(&self, hook: Hook) -> Option<Result<(), DynError>> {
        let run = self.descriptor.hooks.get(hook)?;
        let mut component = self.handle.write();
        Some(run(&mut component))
    }

    fn is_default(&self, slot: usize) -> bool {
        let Some(slot) = self.descriptor.slots.get(slot) else {
            return false;
        };
        let mut component = self.handle.write();
        slot.access.is_default(&mut component)
    }

    fn accepts(&self, slot: usize, node: &Node) -> bool {
        self.descriptor
            .slots
            .get(slot)
            .is_some_and(|slot| slot.access.accepts(node))
    }

    fn check_key(&self, slot: usize, raw: &str) -> Result<(), CoerceError> {
        match self.descriptor.slots.get(slot) {
            Some(slot) => slot.access.check_key(raw),
            None => Ok(()),
        }
    }

    fn wire(&self, slot: usize, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let Some(slot) = self.descriptor.slots.get(slot) else {
            return Ok(false);
        };
        let mut component = self.handle.write();
        slot.access.wire(&mut component, wiring)
    }

    fn synthesize(&self, slot: usize) -> Option<Node> {
        self.descriptor.slots.get(slot)?.access.synthesize()
    }
}

/// A named plain value
struct Constant<V> {
    value: V,
}
impl<V: Injectable> DynValue for Constant<V> {
    fn info(&self) -> TypeInfo {
        TypeInfo::of::<V>()
    }

    fn handle(&self) -> &(dyn Any + Send + Sync) {
        &self.value
    }

    fn is_component(&self) -> bool {
        false
    }

    fn constant(&self) -> Option<&(dyn Any + Send + Sync)> {
        Some(&self.value)
    }
}
