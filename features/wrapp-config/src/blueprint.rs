use std::fmt::Display;

use serde::Deserialize;

/// Declarative description of a graph
///
/// Deserializable from any serde format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

/// One component to instantiate
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentDef {
    /// Name in the graph, unnamed components are identified by their type
    pub id: Option<String>,
    /// Name the component type was registered under
    pub class: String,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
}
impl Display for ComponentDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.class, self.id.as_deref().unwrap_or_default())
    }
}

/// How one slot is filled
///
/// Exactly one of `component`, `auto`, `entries` or `value` applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlotDef {
    #[serde(default)]
    pub name: String,
    /// Wire the component with this id
    pub component: Option<String>,
    /// A constant in textual form
    pub value: Option<String>,
    /// Wire by type or capability
    #[serde(default)]
    pub auto: bool,
    /// Elements of a sequence, or of a map when keyed
    #[serde(default)]
    pub entries: Vec<EntryDef>,
}

/// One element of a collection slot
///
/// Either wires the component with this id or holds an inline constant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntryDef {
    pub key: Option<String>,
    pub component: Option<String>,
    pub value: Option<String>,
}
