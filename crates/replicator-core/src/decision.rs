//! Decision provider trait and deterministic implementations.
//!
//! During a probe's pipeline the engine presents a [`DecisionRequest`] and
//! awaits a [`Decision`]: a strategy summary, a priority category, and an
//! ordered list of proposed actions. The [`DecisionProvider`] trait
//! abstracts where decisions come from. It could be a language model behind
//! a network call, the rule engine in [`crate::rule_engine`], or a test
//! double.
//!
//! The provider call is the one place a pipeline is expected to suspend for
//! long, so the trait is async and the pipeline wraps every call in a
//! deadline.

use std::collections::{BTreeMap, VecDeque};

use futures::future::BoxFuture;
use replicator_types::{ActionProposal, Priority, ProbeId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::parse::ParseError;
use crate::perception::DecisionRequest;

/// Errors that can occur while obtaining a decision.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The provider did not answer within the deadline.
    #[error("probe {probe_id} timed out (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The probe being decided for.
        probe_id: ProbeId,
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// The provider answered with something that is not a decision.
    #[error("unparseable decision: {source}")]
    Parse {
        /// The underlying parse error.
        #[from]
        source: ParseError,
    },

    /// An internal error in the decision provider.
    #[error("decision provider error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

impl DecisionError {
    /// Shorthand for an [`DecisionError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// A provider's plan for one probe and one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Free-text strategy summary.
    pub strategy: String,
    /// Declared priority category.
    pub priority: Priority,
    /// Proposals, executed strictly in this order.
    pub actions: Vec<ActionProposal>,
}

impl Decision {
    /// A single wait with a survival priority.
    pub fn wait(reasoning: impl Into<String>) -> Self {
        Self {
            strategy: String::from("Hold position and recharge"),
            priority: Priority::Survival,
            actions: vec![ActionProposal::wait(reasoning)],
        }
    }
}

/// A source of probe decisions.
///
/// Implementations must be shareable across the concurrently running
/// pipelines of one tick.
pub trait DecisionProvider: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Decide what the probe in `request` should do this tick.
    ///
    /// Returning more than `request.max_actions` proposals is allowed; the
    /// pipeline drops the excess.
    fn decide<'a>(
        &'a self,
        request: &'a DecisionRequest,
    ) -> BoxFuture<'a, Result<Decision, DecisionError>>;
}

/// A provider that always waits.
///
/// Every probe spends every tick recharging. Useful for exercising the tick
/// cycle with no decision logic at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecisionProvider;

impl StubDecisionProvider {
    /// Create a new stub provider.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionProvider for StubDecisionProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn decide<'a>(
        &'a self,
        _request: &'a DecisionRequest,
    ) -> BoxFuture<'a, Result<Decision, DecisionError>> {
        Box::pin(async { Ok(Decision::wait("No decision logic configured")) })
    }
}

/// One queued answer of a [`ScriptedDecisionProvider`].
#[derive(Debug, Clone)]
enum Scripted {
    Answer(Decision),
    Fail(String),
    Hang,
}

/// A provider that replays queued answers per probe.
///
/// Each call pops the next queued answer for the requesting probe. A probe
/// with nothing queued gets the fallback decision (a wait unless
/// configured otherwise).
#[derive(Debug)]
pub struct ScriptedDecisionProvider {
    queues: Mutex<BTreeMap<ProbeId, VecDeque<Scripted>>>,
    fallback: Decision,
}

impl Default for ScriptedDecisionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDecisionProvider {
    /// An empty script that waits for everyone.
    pub fn new() -> Self {
        Self::with_fallback(Decision::wait("Nothing scripted"))
    }

    /// An empty script answering `fallback` when a queue runs dry.
    pub fn with_fallback(fallback: Decision) -> Self {
        Self {
            queues: Mutex::new(BTreeMap::new()),
            fallback,
        }
    }

    /// Queue a decision for `probe_id`.
    pub async fn push(&self, probe_id: ProbeId, decision: Decision) {
        self.enqueue(probe_id, Scripted::Answer(decision)).await;
    }

    /// Queue a provider failure for `probe_id`.
    pub async fn push_error(&self, probe_id: ProbeId, message: impl Into<String>) {
        self.enqueue(probe_id, Scripted::Fail(message.into())).await;
    }

    /// Queue a call that never answers, to exercise deadlines.
    pub async fn push_hang(&self, probe_id: ProbeId) {
        self.enqueue(probe_id, Scripted::Hang).await;
    }

    /// Answers still queued for `probe_id`.
    pub async fn pending(&self, probe_id: ProbeId) -> usize {
        self.queues
            .lock()
            .await
            .get(&probe_id)
            .map_or(0, VecDeque::len)
    }

    async fn enqueue(&self, probe_id: ProbeId, entry: Scripted) {
        self.queues
            .lock()
            .await
            .entry(probe_id)
            .or_default()
            .push_back(entry);
    }
}

impl DecisionProvider for ScriptedDecisionProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn decide<'a>(
        &'a self,
        request: &'a DecisionRequest,
    ) -> BoxFuture<'a, Result<Decision, DecisionError>> {
        Box::pin(async move {
            let next = self
                .queues
                .lock()
                .await
                .get_mut(&request.probe.id)
                .and_then(VecDeque::pop_front);

            match next {
                Some(Scripted::Answer(decision)) => Ok(decision),
                Some(Scripted::Fail(message)) => Err(DecisionError::Internal { message }),
                Some(Scripted::Hang) => futures::future::pending().await,
                None => Ok(self.fallback.clone()),
            }
        })
    }
}
