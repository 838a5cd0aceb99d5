//! Wrapp Wiring assembles an application out of loosely declared components at runtime and
//! drives their lifecycle.
//!
//! Wrapp Wiring is split into two major parts:
//! 1. Resolver: registers nodes and fills their unset slots by name, by type or by capability
//! 2. Lifecycle: orders the nodes with hooks by their dependencies and starts or stops them
//!
//! # Examples
//!
//! ```rust
//! use wrapp_wiring::{shared, Component, Descriptor, DynError, Graph, Node, Shared, SlotSpec, Start};
//!
//! pub trait Answerable: Send + Sync {
//!     fn answer(&self) -> i64;
//! }
//!
//! #[derive(Default)]
//! struct Answer {
//!     ans: i64,
//! }
//! impl Answerable for Answer {
//!     fn answer(&self) -> i64 {
//!         self.ans
//!     }
//! }
//! impl Component for Answer {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.value("ans", |s| &mut s.ans)
//!             .implements::<dyn Answerable>(|answer| answer);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Checker {
//!     answer: Option<Shared<dyn Answerable>>,
//! }
//! impl Start for Checker {
//!     fn start(&mut self) -> Result<(), DynError> {
//!         match self.answer.as_ref().map(|answer| answer.read().answer()) {
//!             Some(42) => Ok(()),
//!             other => Err(format!("wrong answer {other:?}").into()),
//!         }
//!     }
//! }
//! impl Component for Checker {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.capability("answer", |s| &mut s.answer).starts();
//!     }
//! }
//!
//! let answer = Node::new(shared(Answer { ans: 42 })).named("answer");
//! let checker = Node::new(shared(Checker::default())).slot("answer", SlotSpec::named("answer"));
//!
//! let mut graph = Graph::new();
//! graph.register([answer, checker]).unwrap();
//! graph.populate().unwrap();
//! graph.start().unwrap();
//! graph.stop().unwrap();
//! ```
//!
//! Wrapp Wiring consists of the following components:
//!
//! 1. Descriptor - for declaring the slots, capabilities and hooks of a component
//! 2. Node - for handing components and constants to the graph
//! 3. Graph - for registering, populating, starting and stopping
//! 4. Errors - for everything that can go wrong on the way

pub mod descriptor;
pub mod errors;
pub mod graph;
pub mod levels;
pub mod lifecycle;
pub mod node;
mod resolver;
pub mod types;
pub mod wiring;

pub use descriptor::{Component, Descriptor, SlotKind, SlotMeta};
pub use errors::{
    AssignError, CoerceError, GraphError, LifecycleError, RegisterError, ResolveError,
};
pub use graph::Graph;
pub use levels::{CyclePath, Hop};
pub use lifecycle::{Close, Hook, LifecycleState, Open, Start, Stop};
pub use node::{Element, Node, SlotSpec};
pub use types::{shared, Dependency, DynError, Injectable, NodeId, Shared, TypeInfo};
pub use wiring::{scalar::Scalar, Wireable};
