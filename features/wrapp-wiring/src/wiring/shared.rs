use std::any::TypeId;

use crate::{
    node::Node,
    types::{Injectable, Shared, TypeInfo},
    wiring::Wireable,
};

impl<C: ?Sized + Injectable> Wireable for Shared<C> {
    fn target() -> TypeInfo {
        TypeInfo::of::<C>()
    }

    fn wire(node: &Node) -> Option<Self> {
        // Same concrete type - just share the handle
        if let Some(handle) = node.handle().downcast_ref::<Shared<C>>() {
            return Some(handle.clone());
        }

        // Otherwise the node must have declared the capability
        node.cast(TypeId::of::<Shared<C>>())?
            .downcast::<Shared<C>>()
            .ok()
            .map(|handle| *handle)
    }
}
