use std::{
    any::{Any, TypeId},
    collections::HashMap,
    hash::Hash,
};

use crate::{
    errors::CoerceError,
    lifecycle::{Close, Hook, Open, Start, Stop},
    node::Node,
    types::{shared, DynError, Injectable, Shared, TypeInfo},
    wiring::{scalar::Scalar, Wireable, Wiring},
};

/// A type which can take part in the graph as an aggregate
///
/// The descriptor lists the injectable slots in declaration order, the capabilities the type
/// satisfies and the lifecycle hooks it exposes.
///
/// # Example
/// ```rust
/// use wrapp_wiring::{Component, Descriptor, DynError, Shared, Start};
///
/// pub trait Answerable: Send + Sync {
///     fn answer(&self) -> i64;
/// }
///
/// #[derive(Default)]
/// struct Oracle {
///     ans: i64,
/// }
/// impl Answerable for Oracle {
///     fn answer(&self) -> i64 {
///         self.ans
///     }
/// }
/// impl Component for Oracle {
///     fn describe(d: &mut Descriptor<Self>) {
///         d.value("ans", |s| &mut s.ans)
///             .implements::<dyn Answerable>(|oracle| oracle);
///     }
/// }
///
/// #[derive(Default)]
/// struct Checker {
///     answer: Option<Shared<dyn Answerable>>,
/// }
/// impl Start for Checker {
///     fn start(&mut self) -> Result<(), DynError> {
///         Ok(())
///     }
/// }
/// impl Component for Checker {
///     fn describe(d: &mut Descriptor<Self>) {
///         d.capability("answer", |s| &mut s.answer).starts();
///     }
/// }
/// ```
pub trait Component: Injectable + Sized {
    /// Declares slots, capabilities and hooks - leaf components can keep the default
    fn describe(descriptor: &mut Descriptor<Self>) {
        let _ = descriptor;
    }
}

/// The shape of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// `Option<Shared<U>>` to a concrete component, created on demand when nothing matches
    Reference,
    /// `Option<Shared<dyn Capability>>`, matched in the second pass
    Capability,
    /// `Vec<E>` assembled from named nodes in declared order
    Sequence,
    /// `HashMap<K, E>` assembled from named nodes, keys coerced from text
    Map,
    /// A plain scalar, or a list or map of them, only fillable from a named constant or from text
    Value,
    /// Storage the graph may not touch
    Private,
}

/// Public information about one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMeta {
    pub name: &'static str,
    pub kind: SlotKind,
    /// Type a node needs to fill the slot - the element type for collections
    pub target: TypeInfo,
}

type HookFn<T> = fn(&mut T) -> Result<(), DynError>;
type CastFn<T> = Box<dyn Fn(&Shared<T>) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Per-type table of slots, capabilities and hooks
pub struct Descriptor<T> {
    pub(crate) slots: Vec<Slot<T>>,
    pub(crate) casts: Vec<Cast<T>>,
    pub(crate) hooks: Hooks<T>,
}

pub(crate) struct Slot<T> {
    pub(crate) meta: SlotMeta,
    pub(crate) access: Box<dyn SlotAccess<T>>,
}

pub(crate) struct Cast<T> {
    /// TypeId of the produced `Shared<dyn Capability>`
    pub(crate) handle: TypeId,
    pub(crate) cast: CastFn<T>,
}

pub(crate) struct Hooks<T> {
    pub(crate) open: Option<HookFn<T>>,
    pub(crate) start: Option<HookFn<T>>,
    pub(crate) stop: Option<HookFn<T>>,
    pub(crate) close: Option<HookFn<T>>,
}
impl<T> Hooks<T> {
    pub(crate) fn get(&self, hook: Hook) -> Option<HookFn<T>> {
        match hook {
            Hook::Open => self.open,
            Hook::Start => self.start,
            Hook::Stop => self.stop,
            Hook::Close => self.close,
        }
    }
}

impl<T: Component> Descriptor<T> {
    /// Builds the descriptor of a component type
    pub fn of() -> Self {
        let mut descriptor = Descriptor {
            slots: Vec::new(),
            casts: Vec::new(),
            hooks: Hooks {
                open: None,
                start: None,
                stop: None,
                close: None,
            },
        };
        T::describe(&mut descriptor);
        descriptor
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotMeta> {
        self.slots.iter().map(|slot| &slot.meta)
    }

    fn push(
        &mut self,
        name: &'static str,
        kind: SlotKind,
        target: TypeInfo,
        access: impl SlotAccess<T> + 'static,
    ) -> &mut Self {
        self.slots.push(Slot {
            meta: SlotMeta { name, kind, target },
            access: Box::new(access),
        });
        self
    }

    /// A slot pointing at another concrete component
    pub fn reference<U: Component + Default>(
        &mut self,
        name: &'static str,
        field: fn(&mut T) -> &mut Option<Shared<U>>,
    ) -> &mut Self {
        let access = HandleSlot {
            field,
            synthesize: Some(|| Node::new(shared(U::default())).created()),
        };
        self.push(name, SlotKind::Reference, TypeInfo::of::<U>(), access)
    }

    /// A slot pointing at anything that declared capability `C`
    pub fn capability<C: ?Sized + Injectable>(
        &mut self,
        name: &'static str,
        field: fn(&mut T) -> &mut Option<Shared<C>>,
    ) -> &mut Self {
        let access = HandleSlot {
            field,
            synthesize: None,
        };
        self.push(name, SlotKind::Capability, TypeInfo::of::<C>(), access)
    }

    pub fn sequence<E: Wireable>(
        &mut self,
        name: &'static str,
        field: fn(&mut T) -> &mut Vec<E>,
    ) -> &mut Self {
        self.push(name, SlotKind::Sequence, E::target(), SequenceSlot { field })
    }

    pub fn map<K, E>(
        &mut self,
        name: &'static str,
        field: fn(&mut T) -> &mut HashMap<K, E>,
    ) -> &mut Self
    where
        K: Scalar + Eq + Hash + Clone + Injectable,
        E: Wireable,
    {
        self.push(name, SlotKind::Map, E::target(), MapSlot { field })
    }

    pub fn value<V>(&mut self, name: &'static str, field: fn(&mut T) -> &mut V) -> &mut Self
    where
        V: Scalar + Clone + Default + PartialEq + Injectable,
    {
        self.push(name, SlotKind::Value, TypeInfo::of::<V>(), ValueSlot { field })
    }

    /// A list of scalars, filled from a named constant `Vec<V>` or from inline text
    pub fn values<V>(&mut self, name: &'static str, field: fn(&mut T) -> &mut Vec<V>) -> &mut Self
    where
        V: Scalar + Clone + Injectable,
    {
        self.push(name, SlotKind::Value, TypeInfo::of::<V>(), ValuesSlot { field })
    }

    /// A map of scalars, filled from a named constant `HashMap<K, V>` or from inline text
    pub fn value_map<K, V>(
        &mut self,
        name: &'static str,
        field: fn(&mut T) -> &mut HashMap<K, V>,
    ) -> &mut Self
    where
        K: Scalar + Eq + Hash + Clone + Injectable,
        V: Scalar + Clone + Injectable,
    {
        self.push(name, SlotKind::Value, TypeInfo::of::<V>(), ValueMapSlot { field })
    }

    /// Storage that exists on the type but must never be injected
    pub fn private(&mut self, name: &'static str) -> &mut Self {
        self.push(name, SlotKind::Private, TypeInfo::of::<()>(), PrivateSlot)
    }

    /// Declares that this type satisfies capability `C`
    ///
    /// The cast is usually just `|this| this` - the unsizing happens in the signature.
    pub fn implements<C: ?Sized + Injectable>(
        &mut self,
        cast: fn(Shared<T>) -> Shared<C>,
    ) -> &mut Self {
        self.casts.push(Cast {
            handle: TypeId::of::<Shared<C>>(),
            cast: Box::new(move |this: &Shared<T>| -> Box<dyn Any + Send + Sync> {
                Box::new(cast(this.clone()))
            }),
        });
        self
    }

    pub fn opens(&mut self) -> &mut Self
    where
        T: Open,
    {
        self.hooks.open = Some(<T as Open>::open);
        self
    }

    pub fn starts(&mut self) -> &mut Self
    where
        T: Start,
    {
        self.hooks.start = Some(<T as Start>::start);
        self
    }

    pub fn stops(&mut self) -> &mut Self
    where
        T: Stop,
    {
        self.hooks.stop = Some(<T as Stop>::stop);
        self
    }

    pub fn closes(&mut self) -> &mut Self
    where
        T: Close,
    {
        self.hooks.close = Some(<T as Close>::close);
        self
    }
}

/// Type erased access to one field of `T`
pub(crate) trait SlotAccess<T>: Send + Sync {
    fn is_default(&self, component: &mut T) -> bool;

    /// Whether the node can fill the slot - or one element of it for collections
    fn accepts(&self, node: &Node) -> bool;

    fn check_key(&self, raw: &str) -> Result<(), CoerceError> {
        let _ = raw;
        Ok(())
    }

    /// Writes the wiring into the field
    ///
    /// Returns false if the wiring does not fit this slot
    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError>;

    /// A fresh node able to fill the slot
    fn synthesize(&self) -> Option<Node> {
        None
    }
}

struct HandleSlot<T, E> {
    field: fn(&mut T) -> &mut Option<E>,
    synthesize: Option<fn() -> Node>,
}
impl<T: Injectable, E: Wireable> SlotAccess<T> for HandleSlot<T, E> {
    fn is_default(&self, component: &mut T) -> bool {
        (self.field)(component).is_none()
    }

    fn accepts(&self, node: &Node) -> bool {
        E::wire(node).is_some()
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let Wiring::One(node) = wiring else {
            return Ok(false);
        };
        let Some(handle) = E::wire(node) else {
            return Ok(false);
        };
        *(self.field)(component) = Some(handle);
        Ok(true)
    }

    fn synthesize(&self) -> Option<Node> {
        self.synthesize.map(|create| create())
    }
}

struct SequenceSlot<T, E> {
    field: fn(&mut T) -> &mut Vec<E>,
}
impl<T: Injectable, E: Wireable> SlotAccess<T> for SequenceSlot<T, E> {
    fn is_default(&self, component: &mut T) -> bool {
        (self.field)(component).is_empty()
    }

    fn accepts(&self, node: &Node) -> bool {
        E::wire(node).is_some()
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let sequence = match wiring {
            // A named constant holding the whole sequence
            Wiring::One(node) => match node.constant_ref::<Vec<E>>() {
                Some(sequence) => sequence.clone(),
                None => return Ok(false),
            },
            Wiring::Sequence(nodes) => {
                let mut sequence = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let Some(element) = E::wire(node) else {
                        return Ok(false);
                    };
                    sequence.push(element);
                }
                sequence
            }
            _ => return Ok(false),
        };
        *(self.field)(component) = sequence;
        Ok(true)
    }
}

struct MapSlot<T, K, E> {
    field: fn(&mut T) -> &mut HashMap<K, E>,
}
impl<T, K, E> SlotAccess<T> for MapSlot<T, K, E>
where
    T: Injectable,
    K: Scalar + Eq + Hash + Clone + Injectable,
    E: Wireable,
{
    fn is_default(&self, component: &mut T) -> bool {
        (self.field)(component).is_empty()
    }

    fn accepts(&self, node: &Node) -> bool {
        E::wire(node).is_some()
    }

    fn check_key(&self, raw: &str) -> Result<(), CoerceError> {
        K::coerce(raw).map(|_| ())
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let map = match wiring {
            Wiring::One(node) => match node.constant_ref::<HashMap<K, E>>() {
                Some(map) => map.clone(),
                None => return Ok(false),
            },
            Wiring::Map(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (raw_key, node) in entries {
                    let Some(element) = E::wire(node) else {
                        return Ok(false);
                    };
                    map.insert(K::coerce(raw_key)?, element);
                }
                map
            }
            _ => return Ok(false),
        };
        *(self.field)(component) = map;
        Ok(true)
    }
}

struct ValueSlot<T, V> {
    field: fn(&mut T) -> &mut V,
}
impl<T, V> SlotAccess<T> for ValueSlot<T, V>
where
    T: Injectable,
    V: Scalar + Clone + Default + PartialEq + Injectable,
{
    fn is_default(&self, component: &mut T) -> bool {
        *(self.field)(component) == V::default()
    }

    fn accepts(&self, node: &Node) -> bool {
        node.constant_ref::<V>().is_some()
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let value = match wiring {
            Wiring::One(node) => match node.constant_ref::<V>() {
                Some(value) => value.clone(),
                None => return Ok(false),
            },
            Wiring::Raw(raw) => V::coerce(raw)?,
            _ => return Ok(false),
        };
        *(self.field)(component) = value;
        Ok(true)
    }
}

struct ValuesSlot<T, V> {
    field: fn(&mut T) -> &mut Vec<V>,
}
impl<T, V> SlotAccess<T> for ValuesSlot<T, V>
where
    T: Injectable,
    V: Scalar + Clone + Injectable,
{
    fn is_default(&self, component: &mut T) -> bool {
        (self.field)(component).is_empty()
    }

    fn accepts(&self, node: &Node) -> bool {
        node.constant_ref::<Vec<V>>().is_some()
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let values = match wiring {
            Wiring::One(node) => match node.constant_ref::<Vec<V>>() {
                Some(values) => values.clone(),
                None => return Ok(false),
            },
            Wiring::RawList(raw) => raw
                .iter()
                .map(|raw| V::coerce(raw))
                .collect::<Result<_, _>>()?,
            _ => return Ok(false),
        };
        *(self.field)(component) = values;
        Ok(true)
    }
}

struct ValueMapSlot<T, K, V> {
    field: fn(&mut T) -> &mut HashMap<K, V>,
}
impl<T, K, V> SlotAccess<T> for ValueMapSlot<T, K, V>
where
    T: Injectable,
    K: Scalar + Eq + Hash + Clone + Injectable,
    V: Scalar + Clone + Injectable,
{
    fn is_default(&self, component: &mut T) -> bool {
        (self.field)(component).is_empty()
    }

    fn accepts(&self, node: &Node) -> bool {
        node.constant_ref::<HashMap<K, V>>().is_some()
    }

    fn check_key(&self, raw: &str) -> Result<(), CoerceError> {
        K::coerce(raw).map(|_| ())
    }

    fn wire(&self, component: &mut T, wiring: Wiring<'_>) -> Result<bool, CoerceError> {
        let map = match wiring {
            Wiring::One(node) => match node.constant_ref::<HashMap<K, V>>() {
                Some(map) => map.clone(),
                None => return Ok(false),
            },
            Wiring::RawEntries(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(K::coerce(key)?, V::coerce(value)?);
                }
                map
            }
            _ => return Ok(false),
        };
        *(self.field)(component) = map;
        Ok(true)
    }
}

struct PrivateSlot;
impl<T> SlotAccess<T> for PrivateSlot {
    fn is_default(&self, _: &mut T) -> bool {
        true
    }

    fn accepts(&self, _: &Node) -> bool {
        false
    }

    fn wire(&self, _: &mut T, _: Wiring<'_>) -> Result<bool, CoerceError> {
        Ok(false)
    }
}
