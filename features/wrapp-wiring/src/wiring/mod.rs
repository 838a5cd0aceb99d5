use crate::{
    node::Node,
    types::{Injectable, TypeInfo},
};

pub mod scalar;
pub mod shared;

/// A handle which can be filled from a node of the graph
///
/// Implemented for [Shared](crate::Shared) handles, both to concrete components and to
/// capabilities (`Shared<dyn Trait>`). Collection slots accept any `Wireable` element.
pub trait Wireable: Injectable + Clone + Sized {
    /// The type a node must be, or be castable to, to fill this handle
    fn target() -> TypeInfo;

    /// Produces a handle pointing at the node's value
    ///
    /// Returns None if the node is not assignable
    fn wire(node: &Node) -> Option<Self>;
}

/// What the resolver hands to a slot
pub(crate) enum Wiring<'a> {
    /// A single node, either explicitly named or auto-matched
    One(&'a Node),
    /// Ordered elements of a sequence slot
    Sequence(&'a [&'a Node]),
    /// Raw keys with their nodes for a map slot
    Map(&'a [(&'a str, &'a Node)]),
    /// A textual constant
    Raw(&'a str),
    /// Textual elements of an inline constant list
    RawList(&'a [&'a str]),
    /// Textual keys and values of an inline constant map
    RawEntries(&'a [(&'a str, &'a str)]),
}
