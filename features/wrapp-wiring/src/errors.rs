use thiserror::Error;

use crate::{
    levels::CyclePath,
    lifecycle::Hook,
    types::{DynError, TypeInfo},
};

/// Any error the graph can return
#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Errors while adding nodes to the graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Unnamed nodes are identified by their type, so they must be components
    #[error("expected unnamed node to be a shared component but got type '{0}'")]
    NotAggregate(TypeInfo),
    #[error("registered two unnamed nodes of type '{0}'")]
    DuplicateType(TypeInfo),
    #[error("registered two nodes named '{0}'")]
    DuplicateName(String),
    /// Dependencies are recorded by the graph, they cannot be handed in
    #[error("dependencies were recorded on node {0} before it was registered")]
    DependenciesSupplied(String),
}

/// Errors while populating slots
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("did not find node named '{name}' required by slot '{slot}' in {node}")]
    MissingNamed {
        name: String,
        slot: String,
        node: String,
    },
    #[error("node named '{name}' of type '{actual}' is not assignable to slot '{slot}' ({expected}) in {node}")]
    TypeMismatch {
        name: String,
        actual: TypeInfo,
        expected: TypeInfo,
        slot: String,
        node: String,
    },
    #[error("found a wiring spec on unsupported slot '{slot}' in {node}")]
    UnsupportedSlot { slot: String, node: String },
    #[error("wiring requested on private slot '{slot}' in {node}")]
    PrivateSlot { slot: String, node: String },
    #[error("key '{key}' for slot '{slot}' in {node} could not be converted: {source}")]
    KeyCoercion {
        key: String,
        slot: String,
        node: String,
        source: CoerceError,
    },
    #[error("found no assignable node for slot '{slot}' in {node}")]
    NoCandidate { slot: String, node: String },
    #[error("found two assignable nodes for slot '{slot}' in {node}: {first} and {second}")]
    Ambiguous {
        slot: String,
        node: String,
        first: String,
        second: String,
    },
    /// Registering a node created on demand failed
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Errors while starting or stopping the graph
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("{0}")]
    Cycle(CyclePath),
    #[error("{hook} hook of {node} failed: {source}")]
    Hook {
        hook: Hook,
        node: String,
        source: DynError,
    },
    #[error("the graph was already started")]
    AlreadyStarted,
}

/// Errors when turning a string into a typed scalar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value '{raw}' for type '{target}': {reason}")]
pub struct CoerceError {
    pub raw: String,
    pub target: &'static str,
    pub reason: String,
}
impl CoerceError {
    pub fn new<T: ?Sized>(raw: &str, reason: impl ToString) -> Self {
        Self {
            raw: raw.to_string(),
            target: std::any::type_name::<T>(),
            reason: reason.to_string(),
        }
    }
}

/// Errors when assigning a raw constant to a slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    #[error("slot '{slot}' does not exist on {node}")]
    UnknownSlot { slot: String, node: String },
    #[error("slot '{slot}' on {node} does not take a constant of this shape")]
    NotScalar { slot: String, node: String },
    #[error(transparent)]
    Coerce(#[from] CoerceError),
}
