use std::fmt::Display;

use crate::{errors::LifecycleError, graph::Graph, types::DynError, types::NodeId};

/// Components exposing this are opened by [Graph::start]
pub trait Open {
    fn open(&mut self) -> Result<(), DynError>;
}

/// Components exposing this are started by [Graph::start]
pub trait Start {
    fn start(&mut self) -> Result<(), DynError>;
}

/// Components exposing this are stopped by [Graph::stop]
pub trait Stop {
    fn stop(&mut self) -> Result<(), DynError>;
}

/// Components exposing this are closed by [Graph::stop]
pub trait Close {
    fn close(&mut self) -> Result<(), DynError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Open,
    Start,
    Stop,
    Close,
}
impl Hook {
    pub const ALL: [Hook; 4] = [Hook::Open, Hook::Start, Hook::Stop, Hook::Close];

    fn verb(self) -> &'static str {
        match self {
            Hook::Open => "opening",
            Hook::Start => "starting",
            Hook::Stop => "stopping",
            Hook::Close => "closing",
        }
    }
}
impl Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Hook::Open => "open",
            Hook::Start => "start",
            Hook::Stop => "stop",
            Hook::Close => "close",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Started,
    Stopped,
}

impl Graph {
    /// Opens and starts every hooked node, dependencies first
    ///
    /// Stops at the first failing hook. Nodes started up to that point are remembered, so a
    /// following [Graph::stop] only stops what actually came up.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.logged(|graph| {
            if graph.state == LifecycleState::Started {
                return Err(LifecycleError::AlreadyStarted);
            }

            let all: Vec<NodeId> = (0..graph.nodes.len()).map(NodeId).collect();
            let levels = graph.levels(&all).map_err(LifecycleError::Cycle)?;

            let mut started = Vec::new();
            let mut result = Ok(());
            'levels: for level in levels.iter().rev() {
                for &id in level {
                    for hook in [Hook::Open, Hook::Start] {
                        if let Err(e) = graph.run_hook(id, hook) {
                            result = Err(e);
                            break 'levels;
                        }
                    }
                    started.push(id);
                }
            }

            graph.started = started;
            graph.state = LifecycleState::Started;
            result
        })
    }

    /// Stops and closes the nodes of the last start, most dependent first
    ///
    /// Fails fast - nodes after a failing hook are left running.
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        self.logged(|graph| {
            if graph.state != LifecycleState::Started {
                return Ok(());
            }

            let levels = graph
                .levels(&graph.started)
                .map_err(LifecycleError::Cycle)?;

            for level in &levels {
                for &id in level {
                    for hook in [Hook::Stop, Hook::Close] {
                        graph.run_hook(id, hook)?;
                    }
                }
            }

            graph.started.clear();
            graph.state = LifecycleState::Stopped;
            Ok(())
        })
    }

    fn run_hook(&self, id: NodeId, hook: Hook) -> Result<(), LifecycleError> {
        let node = &self.nodes[id.0];
        if !node.value.has_hook(hook) {
            return Ok(());
        }

        tracing::debug!("{} {node}", hook.verb());
        match node.value.run_hook(hook) {
            Some(Err(source)) => {
                tracing::error!("error {} {node}: {source}", hook.verb());
                Err(LifecycleError::Hook {
                    hook,
                    node: node.to_string(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}
