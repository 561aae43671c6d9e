//! The conversation state adjacency graph (§4.3).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use voice_agent_core::session::ConversationState as S;

pub static ADJACENCY: Lazy<HashMap<S, &'static [S]>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        S::Greeting,
        &[S::InformationGathering, S::SlotFilling, S::Execution, S::Closing][..],
    );
    m.insert(
        S::InformationGathering,
        &[S::SlotFilling, S::Confirmation, S::Clarification, S::Execution][..],
    );
    m.insert(
        S::SlotFilling,
        &[S::SlotFilling, S::Confirmation, S::Clarification, S::Execution][..],
    );
    m.insert(S::Confirmation, &[S::Execution, S::SlotFilling, S::Clarification][..]);
    m.insert(
        S::Execution,
        &[S::Upselling, S::Closing, S::ProblemSolving, S::InformationGathering][..],
    );
    m.insert(
        S::Clarification,
        &[S::InformationGathering, S::SlotFilling, S::Escalation][..],
    );
    m.insert(
        S::Upselling,
        &[S::SlotFilling, S::Confirmation, S::Closing, S::Execution][..],
    );
    m.insert(S::ProblemSolving, &[S::Execution, S::Escalation, S::Closing][..]);
    m.insert(S::Escalation, &[S::Closing][..]);
    m.insert(S::Closing, &[][..]);
    m
});

/// Global escape states reachable from any non-terminal state regardless of
/// the table above: the priority-ordered decision rule lets a transfer
/// request, a hangup, or a complaint interrupt any stage of the
/// conversation, which the adjacency table alone does not express.
const ESCAPE_STATES: &[S] = &[S::Escalation, S::Closing, S::ProblemSolving, S::Clarification];

pub fn is_allowed_transition(from: S, to: S) -> bool {
    if from.is_terminal() {
        return false;
    }
    if from == to {
        return true;
    }
    if ESCAPE_STATES.contains(&to) {
        return true;
    }
    ADJACENCY.get(&from).map(|edges| edges.contains(&to)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_has_no_outgoing_edges() {
        assert!(ADJACENCY.get(&S::Closing).unwrap().is_empty());
        assert!(!is_allowed_transition(S::Closing, S::Greeting));
    }

    #[test]
    fn escape_states_reachable_from_greeting() {
        assert!(is_allowed_transition(S::Greeting, S::Escalation));
        assert!(is_allowed_transition(S::Greeting, S::Closing));
        assert!(is_allowed_transition(S::Greeting, S::Clarification));
    }

    #[test]
    fn greeting_cannot_reach_upselling_directly() {
        assert!(!is_allowed_transition(S::Greeting, S::Upselling));
    }
}
