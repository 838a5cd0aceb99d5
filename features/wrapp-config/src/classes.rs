use std::collections::HashMap;

use wrapp_wiring::{shared, Component, Node};

use crate::errors::ClassError;

type Instantiate = fn() -> Node;

/// A registry of all component types a blueprint may refer to.
///
/// Classes are registered under a name and instantiated from their [Default].
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Instantiate>,
}

impl ClassRegistry {
    /// Initializes an empty Class Registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class to the registry.
    ///
    /// If the name is already taken, it will return a [`ClassError`]
    pub fn register<T: Component + Default>(
        &mut self,
        class: impl Into<String>,
    ) -> Result<&mut Self, ClassError> {
        let class = class.into();
        if self.classes.contains_key(&class) {
            return Err(ClassError::AlreadyRegistered(class));
        }

        self.classes
            .insert(class, || Node::new(shared(T::default())));
        Ok(self)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// A fresh component node of the class, None if the class is not known
    pub fn instantiate(&self, class: &str) -> Option<Node> {
        self.classes.get(class).map(|instantiate| instantiate())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Default)]
    struct Counter {
        count: u32,
    }
    impl Component for Counter {}

    #[test]
    fn instantiates_fresh_components() {
        let mut classes = ClassRegistry::new();
        classes.register::<Counter>("Counter").unwrap();
        assert!(classes.contains("Counter"));

        let first = classes.instantiate("Counter").unwrap();
        let second = classes.instantiate("Counter").unwrap();
        let first = first.get::<Counter>().unwrap();
        let second = second.get::<Counter>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.read().count, 0);

        assert!(classes.instantiate("Missing").is_none());
    }

    #[test]
    fn rejects_duplicate_classes() {
        let mut classes = ClassRegistry::new();
        let err = classes
            .register::<Counter>("Counter")
            .unwrap()
            .register::<Counter>("Counter")
            .err()
            .unwrap();
        assert_eq!(err, ClassError::AlreadyRegistered("Counter".to_string()));
        assert_eq!(classes.classes().count(), 1);
    }
}
