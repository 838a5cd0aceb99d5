use std::{any::TypeId, sync::Arc};

use parking_lot::RwLock;

/// Boxed error returned by lifecycle hooks
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Anything that can live inside the graph
///
/// Nodes may be handed to other threads by the caller, so values need to be Send + Sync + 'static.
/// The graph itself is driven from a single thread.
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Reference-semantics handle to a component.
///
/// Every slot holding another component stores one of these, so wiring the same
/// node into several slots shares a single instance.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wraps a value into a [Shared] handle
pub fn shared<T: Injectable>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Index of a node inside its [Graph](crate::Graph)
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);
impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A resolved edge: `slot` on the owning node now points at `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub slot: String,
    pub target: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Speaker {}

    #[test]
    fn describes_trait_objects() {
        let info = TypeInfo::of::<dyn Speaker>();
        assert_eq!(info.type_id, TypeId::of::<dyn Speaker>());
        assert_ne!(info, TypeInfo::of::<Shared<dyn Speaker>>());
        assert!(info.to_string().ends_with("Speaker"));
    }
}
