//! Wrapp Config builds populated wiring graphs from declarative blueprints.
//!
//! Wrapp Config is split into two major parts:
//! 1. ClassRegistry: Used to name the component types a blueprint may instantiate
//! 2. Loader: Turns a [Blueprint] into a populated [Graph](wrapp_wiring::Graph)
//!
//! # Examples
//!
//! ```rust
//! use wrapp_config::{Blueprint, ClassRegistry, ComponentDef, Loader, SlotDef};
//! use wrapp_wiring::{Component, Descriptor, Shared};
//!
//! #[derive(Default)]
//! struct Server {
//!     port: u16,
//! }
//! impl Component for Server {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.value("port", |s| &mut s.port);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct App {
//!     server: Option<Shared<Server>>,
//! }
//! impl Component for App {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.reference("server", |s| &mut s.server);
//!     }
//! }
//!
//! let mut classes = ClassRegistry::new();
//! classes
//!     .register::<Server>("Server")
//!     .unwrap()
//!     .register::<App>("App")
//!     .unwrap();
//!
//! let blueprint = Blueprint {
//!     components: vec![
//!         ComponentDef {
//!             id: Some("main".to_string()),
//!             class: "Server".to_string(),
//!             slots: vec![SlotDef {
//!                 name: "port".to_string(),
//!                 value: Some("8080".to_string()),
//!                 ..Default::default()
//!             }],
//!         },
//!         ComponentDef {
//!             id: None,
//!             class: "App".to_string(),
//!             slots: vec![SlotDef {
//!                 name: "server".to_string(),
//!                 component: Some("main".to_string()),
//!                 ..Default::default()
//!             }],
//!         },
//!     ],
//! };
//!
//! let graph = Loader::new(&classes)
//!     .with_env_overrides(false)
//!     .load(&blueprint)
//!     .unwrap();
//! let server = graph.lookup_named("main").unwrap().get::<Server>().unwrap();
//! assert_eq!(server.read().port, 8080);
//! ```
//!
//! Wrapp Config consists of the following components:
//!
//! 1. Classes - for registering instantiable component types
//! 2. Blueprint - the serde model of a graph description
//! 3. Loader - for validating a blueprint and building the graph
//! 4. Errors - for config errors

pub mod blueprint;
pub mod classes;
pub mod errors;
pub mod loader;

pub use blueprint::{Blueprint, ComponentDef, EntryDef, SlotDef};
pub use classes::ClassRegistry;
pub use errors::{ClassError, LoadError};
pub use loader::Loader;
