//! Entity store, per-probe pipelines, and the tick scheduler for the
//! Replicator simulation.
//!
//! This crate owns everything that runs concurrently: the linearized
//! [`EntityStore`] every component shares, the perceive-decide-act
//! [`Pipeline`] run once per probe per tick, and the [`TickScheduler`]
//! that fans those pipelines out and back in behind a per-tick barrier.
//!
//! # Modules
//!
//! - [`action_executor`] -- Store-backed execution of probe actions.
//! - [`config`] -- Configuration loading from `replicator-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`DecisionProvider`] trait, [`StubDecisionProvider`]
//!   and [`ScriptedDecisionProvider`].
//! - [`events`] -- [`SimulationObserver`] progress events.
//! - [`executor`] -- Named, deadline-bounded units of work.
//! - [`parse`] -- Decision document parsing at the provider boundary.
//! - [`perception`] -- Decision context assembly from store state.
//! - [`pipeline`] -- The per-probe pipeline.
//! - [`rule_engine`] -- A deterministic rule-based decision provider.
//! - [`runner`] -- [`Simulation`] wiring and the bounded tick loop.
//! - [`status`] -- Read-only operator status.
//! - [`store`] -- The snapshot-backed [`EntityStore`].
//! - [`tick`] -- The tick cycle.

pub mod action_executor;
pub mod config;
pub mod decision;
pub mod events;
pub mod executor;
pub mod parse;
pub mod perception;
pub mod pipeline;
pub mod rule_engine;
pub mod runner;
pub mod status;
pub mod store;
pub mod tick;

// Re-export primary types at crate root for convenience.
pub use action_executor::ActionExecutor;
pub use config::{ConfigError, SimulationConfig};
pub use decision::{
    Decision, DecisionError, DecisionProvider, ScriptedDecisionProvider, StubDecisionProvider,
};
pub use events::{NoOpObserver, SimulationObserver, TracingObserver};
pub use executor::{TaskError, TaskExecutor};
pub use parse::{ParseError, parse_decision, parse_decision_or_wait};
pub use perception::{DecisionRequest, Environment};
pub use pipeline::{ExecutedAction, Pipeline, PipelineError, PipelineReport};
pub use rule_engine::RuleBasedProvider;
pub use runner::{RunnerError, Simulation, SimulationEndReason, SimulationResult};
pub use status::SimulationStatus;
pub use store::{EntityStore, ProbePatch, StoreError, StoreOptions, seed_state};
pub use tick::{ProbeState, ProbeTickResult, TickOutcome, TickReport, TickScheduler};
