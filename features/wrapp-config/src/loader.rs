use std::path::PathBuf;

use tracing::Dispatch;
use wrapp_wiring::{AssignError, Graph, Node, SlotSpec};

use crate::{
    blueprint::{Blueprint, ComponentDef, SlotDef},
    classes::ClassRegistry,
    errors::LoadError,
};

/// Builds populated graphs from blueprints
///
/// Constants can be overridden from the environment: the variable `<class>.<slot>` wins over the
/// value in the blueprint. With overrides enabled the loader first reads `.env` from the working
/// directory, or the file given to [Loader::with_env_file].
pub struct Loader<'a> {
    classes: &'a ClassRegistry,
    env_overrides: bool,
    env_file: Option<PathBuf>,
    logger: Option<Dispatch>,
}

/// How a blueprint slot is filled
enum Fill<'s> {
    Wired(SlotSpec),
    Constant,
    List(Vec<&'s str>),
    Entries(Vec<(&'s str, &'s str)>),
}

enum Element<'s> {
    Component(&'s str),
    Value(&'s str),
}
impl<'s> Element<'s> {
    fn text(&self) -> &'s str {
        match self {
            Element::Component(text) | Element::Value(text) => *text,
        }
    }
}

fn assign_error(def: &ComponentDef, slot: &SlotDef, source: AssignError) -> LoadError {
    LoadError::Assign {
        slot: slot.name.clone(),
        component: def.to_string(),
        source,
    }
}

impl<'a> Loader<'a> {
    pub fn new(classes: &'a ClassRegistry) -> Self {
        Loader {
            classes,
            env_overrides: true,
            env_file: None,
            logger: None,
        }
    }

    pub fn with_env_overrides(mut self, enabled: bool) -> Self {
        self.env_overrides = enabled;
        self
    }

    /// Reads overrides from this file instead of `.env`, the file must exist
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Logger for the loader and the graph it builds
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Instantiates and registers every component in order, then populates the graph
    pub fn load(&self, blueprint: &Blueprint) -> Result<Graph, LoadError> {
        let mut graph = Graph::new();
        graph.set_logger(self.logger.clone());
        if self.env_overrides {
            self.logged(|| self.read_env_file())?;
        }

        for def in &blueprint.components {
            let node = self.logged(|| self.build(def))?;
            graph.register([node])?;
        }

        graph.populate()?;
        Ok(graph)
    }

    fn logged<R>(&self, op: impl FnOnce() -> R) -> R {
        match &self.logger {
            Some(logger) => tracing::dispatcher::with_default(logger, op),
            None => op(),
        }
    }

    fn build(&self, def: &ComponentDef) -> Result<Node, LoadError> {
        let mut node = self
            .classes
            .instantiate(&def.class)
            .ok_or_else(|| LoadError::UnknownClass {
                component: def.to_string(),
            })?;
        if let Some(id) = &def.id {
            node = node.named(id);
        }

        for slot in &def.slots {
            if slot.name.is_empty() {
                return Err(LoadError::MissingSlotName {
                    component: def.to_string(),
                });
            }

            match self.fill(def, slot)? {
                Fill::Wired(spec) => node = node.slot(&slot.name, spec),
                Fill::Constant => self.assign(&node, def, slot)?,
                Fill::List(values) => {
                    node.assign_values(&slot.name, &values)
                        .map_err(|source| assign_error(def, slot, source))?;
                    tracing::debug!("assigned {values:?} to slot '{}' in {def}", slot.name);
                }
                Fill::Entries(entries) => {
                    node.assign_entries(&slot.name, &entries)
                        .map_err(|source| assign_error(def, slot, source))?;
                    tracing::debug!("assigned {entries:?} to slot '{}' in {def}", slot.name);
                }
            }
        }

        Ok(node)
    }

    fn fill<'s>(&self, def: &ComponentDef, slot: &'s SlotDef) -> Result<Fill<'s>, LoadError> {
        let invalid = |make: fn(String, String) -> LoadError| make(slot.name.clone(), def.to_string());

        if let Some(component) = &slot.component {
            if !slot.entries.is_empty() {
                return Err(invalid(|slot, component| LoadError::ComponentWithEntries {
                    slot,
                    component,
                }));
            }
            return Ok(Fill::Wired(SlotSpec::named(component)));
        }

        if slot.auto {
            if !slot.entries.is_empty() {
                return Err(invalid(|slot, component| LoadError::AutoWithEntries {
                    slot,
                    component,
                }));
            }
            return Ok(Fill::Wired(SlotSpec::auto()));
        }

        if slot.entries.is_empty() {
            return Ok(Fill::Constant);
        }

        let mut elements = Vec::with_capacity(slot.entries.len());
        for entry in &slot.entries {
            let element = match (&entry.component, &entry.value) {
                (Some(component), None) => Element::Component(component.as_str()),
                (None, Some(value)) => Element::Value(value.as_str()),
                _ => {
                    return Err(invalid(|slot, component| LoadError::InvalidEntry {
                        slot,
                        component,
                    }))
                }
            };
            elements.push((entry.key.as_deref(), element));
        }

        let values = elements
            .iter()
            .filter(|(_, element)| matches!(element, Element::Value(_)))
            .count();
        if values != 0 && values != elements.len() {
            return Err(invalid(|slot, component| LoadError::MixedEntryKinds {
                slot,
                component,
            }));
        }

        let keyed = elements.iter().filter(|(key, _)| key.is_some()).count();
        let fill = match (keyed, values) {
            (0, 0) => Fill::Wired(SlotSpec::sequence(
                elements.iter().map(|(_, element)| element.text()),
            )),
            (0, _) => Fill::List(elements.iter().map(|(_, element)| element.text()).collect()),
            (n, 0) if n == elements.len() => Fill::Wired(SlotSpec::entries(
                elements
                    .iter()
                    .map(|(key, element)| (key.unwrap_or_default(), element.text())),
            )),
            (n, _) if n == elements.len() => Fill::Entries(
                elements
                    .iter()
                    .map(|(key, element)| (key.unwrap_or_default(), element.text()))
                    .collect(),
            ),
            _ => {
                return Err(invalid(|slot, component| LoadError::MixedEntries {
                    slot,
                    component,
                }))
            }
        };
        Ok(fill)
    }

    fn assign(&self, node: &Node, def: &ComponentDef, slot: &SlotDef) -> Result<(), LoadError> {
        let value = self
            .env_override(def, slot)
            .or_else(|| slot.value.clone())
            .ok_or_else(|| LoadError::MissingValue {
                slot: slot.name.clone(),
                component: def.to_string(),
            })?;

        node.assign_value(&slot.name, &value)
            .map_err(|source| assign_error(def, slot, source))?;
        tracing::debug!("assigned {value} to slot '{}' in {def}", slot.name);
        Ok(())
    }

    /// Fills the process environment from the env file, variables already set are kept
    fn read_env_file(&self) -> Result<(), LoadError> {
        let read = match &self.env_file {
            Some(path) => dotenvy::from_path(path).map(|()| path.clone()),
            None => dotenvy::dotenv(),
        };
        match read {
            Ok(path) => tracing::debug!("read environment from {}", path.display()),
            Err(err) if err.not_found() && self.env_file.is_none() => {}
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn env_override(&self, def: &ComponentDef, slot: &SlotDef) -> Option<String> {
        if !self.env_overrides {
            return None;
        }
        std::env::var(format!("{}.{}", def.class, slot.name))
            .ok()
            .filter(|value| !value.is_empty())
    }
}
