// src/lib.rs

pub mod cache;
pub mod config;
pub mod country_codes;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod master;
pub mod model;
pub mod orchestrator;
pub mod services;
pub mod subagents;
pub mod tools;
pub mod visualization;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::{BoxError, WorkbenchError, WorkbenchResult};
pub use events::{EventSink, NullSink, ServerEvent};
pub use master::{MasterGraph, NodeContext};
pub use model::{AgentState, Artifact, ArtifactType, Query, Session};
pub use orchestrator::Orchestrator;
