use wrapp_wiring::{AssignError, RegisterError, ResolveError};

/// Errors when trying to register a class
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassError {
    /// The class name is already taken
    #[error("class '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Errors when building a graph from a blueprint
///
/// `component` is written as `class#id`, with an empty id for unnamed components.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("component {component} doesn't exist")]
    UnknownClass { component: String },
    #[error("expected a slot name at component {component}")]
    MissingSlotName { component: String },
    #[error("slot '{slot}' at component {component} names a component, it can't also list entries")]
    ComponentWithEntries { slot: String, component: String },
    #[error("auto slot '{slot}' at component {component} can't also list entries")]
    AutoWithEntries { slot: String, component: String },
    /// Either every entry has a key (map) or none has (sequence)
    #[error("slot '{slot}' at component {component} mixes keyed and unkeyed entries")]
    MixedEntries { slot: String, component: String },
    /// Either every entry names a component or every entry holds a value
    #[error("slot '{slot}' at component {component} mixes component and value entries")]
    MixedEntryKinds { slot: String, component: String },
    #[error("entry of slot '{slot}' at component {component} needs exactly one of component or value")]
    InvalidEntry { slot: String, component: String },
    #[error("could not read the environment file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("slot '{slot}' at component {component} is neither wired nor given a value")]
    MissingValue { slot: String, component: String },
    #[error("could not assign slot '{slot}' at component {component}: {source}")]
    Assign {
        slot: String,
        component: String,
        source: AssignError,
    },
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
