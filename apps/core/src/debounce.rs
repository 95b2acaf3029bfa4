//! Typing detection across restarts.
//!
//! The host re-runs the process on every keystroke and after every rerun
//! interval. A query that differs from the one handed over by the previous
//! run is still being typed; it is answered from the handoff alone, without
//! touching the network. Only an unchanged query moves on to fetching.

use crate::contract::{
    DisplayItem, HandoffVariables, ScriptFilterOutput, SessionHandoff, RERUN_INTERVAL_SECS,
};

pub const LOADING_SUBTITLE: &str = "Loading Inline Results…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingStabilization,
    Fetching,
    Settled,
}

/// One session keyed by the query text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    key: String,
    phase: SessionPhase,
}

impl Session {
    /// Classifies this invocation against the previous one.
    pub fn resume(query: &str, handoff: &SessionHandoff) -> Self {
        let phase = if handoff.old_query.as_deref() == Some(query) {
            SessionPhase::Fetching
        } else {
            SessionPhase::AwaitingStabilization
        };
        Self {
            key: query.to_string(),
            phase,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_typing(&self) -> bool {
        self.phase == SessionPhase::AwaitingStabilization
    }

    /// Fetching → Settled. No-op in any other phase.
    pub fn settle(&mut self) {
        if self.phase == SessionPhase::Fetching {
            self.phase = SessionPhase::Settled;
        }
    }
}

/// Placeholder on top, the previous results untouched below it, and a rerun
/// request so the host comes back once typing pauses.
pub fn typing_output(
    session: &Session,
    mut placeholder: DisplayItem,
    handoff: &SessionHandoff,
) -> ScriptFilterOutput {
    placeholder.subtitle = Some(LOADING_SUBTITLE.to_string());
    let mut items = vec![placeholder];
    items.extend(handoff.previous_items());

    ScriptFilterOutput {
        rerun: Some(RERUN_INTERVAL_SECS),
        skip_knowledge: true,
        variables: HandoffVariables {
            old_results: handoff
                .old_results
                .clone()
                .unwrap_or_else(|| "[]".to_string()),
            old_query: session.key().to_string(),
        },
        items,
    }
}
