//! Pure state machine behind the reorder controller
//!
//! ```text
//!            DragEnded            Dispatched
//!   Idle ─────────────▶ Reordering ─────────▶ Reconciling
//!    ▲                                          │
//!    └────────── Settled (last tracked) ◀───────┘
//! ```
//!
//! The reducer only tracks tickets and decides what to do with them; the
//! controller owns the mirror and the snapshots and carries out the effects.
//!
//! A ticket that stops being tracked while its request may still reach the
//! server (discarded after an earlier failure, or forgotten by a sync) is
//! kept as detached. Its late success means the server holds an order the
//! mirror does not show, so it raises a refetch.

use std::collections::{BTreeMap, BTreeSet};

use shared::models::ScopeRef;
use shared::ErrorKind;

/// Identifies one optimistic move; strictly increasing per controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Mirror updated optimistically, request not sent yet
    Reordering,
    /// At least one request awaiting its response
    Reconciling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DragEnded { ticket: Ticket, scope: ScopeRef },
    Dispatched { ticket: Ticket },
    Settled { ticket: Ticket, outcome: Outcome },
    /// Mirror replaced by a fresh server outline
    Synced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop the snapshot; the optimistic order stands
    Commit(Ticket),
    /// Restore the scope from this ticket's snapshot
    Rollback(Ticket),
    /// Forget these tickets without touching the mirror
    Discard(Vec<Ticket>),
    /// Outline no longer trusted
    Refetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub phase: Phase,
    /// Tracked tickets, sent or not
    pub in_flight: BTreeMap<Ticket, ScopeRef>,
    /// Tracked tickets whose request has not been sent yet
    pub pending: BTreeSet<Ticket>,
    /// Untracked tickets that may still commit server side
    pub detached: BTreeSet<Ticket>,
    pub needs_refetch: bool,
}

impl ControllerState {
    fn settle_phase(&mut self) {
        self.phase = if !self.pending.is_empty() {
            Phase::Reordering
        } else if !self.in_flight.is_empty() {
            Phase::Reconciling
        } else {
            Phase::Idle
        };
    }

    fn flag_refetch(&mut self, effects: &mut Vec<Effect>) {
        if !self.needs_refetch {
            self.needs_refetch = true;
            effects.push(Effect::Refetch);
        }
    }

    fn untrack(&mut self, ticket: Ticket) -> Option<ScopeRef> {
        self.pending.remove(&ticket);
        self.in_flight.remove(&ticket)
    }
}

pub fn reduce(mut state: ControllerState, action: Action) -> (ControllerState, Vec<Effect>) {
    let mut effects = Vec::new();

    match action {
        Action::DragEnded { ticket, scope } => {
            state.in_flight.insert(ticket, scope);
            state.pending.insert(ticket);
        }
        Action::Dispatched { ticket } => {
            state.pending.remove(&ticket);
        }
        Action::Settled { ticket, outcome } => {
            let Some(scope) = state.untrack(ticket) else {
                // Detached: only a late commit matters
                if state.detached.remove(&ticket) && outcome == Outcome::Confirmed {
                    state.flag_refetch(&mut effects);
                }
                return (state, effects);
            };
            match outcome {
                Outcome::Confirmed => effects.push(Effect::Commit(ticket)),
                Outcome::Failed(kind) => {
                    effects.push(Effect::Rollback(ticket));

                    // Later moves in the same scope were built on the rolled back order
                    let later: Vec<Ticket> = state
                        .in_flight
                        .range(ticket..)
                        .filter(|(_, s)| **s == scope)
                        .map(|(t, _)| *t)
                        .collect();
                    if !later.is_empty() {
                        for t in &later {
                            state.untrack(*t);
                            state.detached.insert(*t);
                        }
                        effects.push(Effect::Discard(later));
                        state.flag_refetch(&mut effects);
                    } else if kind.requires_refetch() {
                        state.flag_refetch(&mut effects);
                    }
                }
            }
        }
        Action::Synced => {
            let stale: Vec<Ticket> = state.in_flight.keys().copied().collect();
            state.in_flight.clear();
            state.pending.clear();
            state.detached.extend(stale.iter().copied());
            state.needs_refetch = false;
            if !stale.is_empty() {
                effects.push(Effect::Discard(stale));
            }
        }
    }

    state.settle_phase();
    (state, effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatched(state: ControllerState, ticket: u64, scope: &ScopeRef) -> ControllerState {
        let ticket = Ticket(ticket);
        let (state, effects) = reduce(
            state,
            Action::DragEnded {
                ticket,
                scope: scope.clone(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.phase, Phase::Reordering);

        let (state, effects) = reduce(state, Action::Dispatched { ticket });
        assert!(effects.is_empty());
        assert_eq!(state.phase, Phase::Reconciling);
        state
    }

    fn settle(state: ControllerState, ticket: u64, outcome: Outcome) -> (ControllerState, Vec<Effect>) {
        reduce(
            state,
            Action::Settled {
                ticket: Ticket(ticket),
                outcome,
            },
        )
    }

    #[test]
    fn test_confirm_returns_to_idle() {
        let scope = ScopeRef::course("c1");
        let state = dispatched(ControllerState::default(), 1, &scope);

        let (state, effects) = settle(state, 1, Outcome::Confirmed);
        assert_eq!(effects, vec![Effect::Commit(Ticket(1))]);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.in_flight.is_empty());
    }

    #[test]
    fn test_unsent_ticket_keeps_reordering() {
        let scope = ScopeRef::course("c1");
        let state = dispatched(ControllerState::default(), 1, &scope);
        let (state, _) = reduce(
            state,
            Action::DragEnded {
                ticket: Ticket(2),
                scope: scope.clone(),
            },
        );
        assert_eq!(state.phase, Phase::Reordering);

        let (state, _) = settle(state, 1, Outcome::Confirmed);
        assert_eq!(state.phase, Phase::Reordering);

        let (state, _) = reduce(state, Action::Dispatched { ticket: Ticket(2) });
        assert_eq!(state.phase, Phase::Reconciling);
    }

    #[test]
    fn test_failure_discards_later_tickets_and_requests_refetch() {
        let modules = ScopeRef::course("c1");
        let lessons = ScopeRef::module("c1", "m1");
        let state = dispatched(ControllerState::default(), 1, &modules);
        let state = dispatched(state, 2, &lessons);
        let state = dispatched(state, 3, &modules);

        let (state, effects) = settle(state, 1, Outcome::Failed(ErrorKind::StorageFailure));
        assert_eq!(
            effects,
            vec![
                Effect::Rollback(Ticket(1)),
                Effect::Discard(vec![Ticket(3)]),
                Effect::Refetch,
            ]
        );
        assert_eq!(state.in_flight.keys().copied().collect::<Vec<_>>(), vec![Ticket(2)]);
        assert!(state.detached.contains(&Ticket(3)));
        assert_eq!(state.phase, Phase::Reconciling);
        assert!(state.needs_refetch);
    }

    #[test]
    fn test_lone_storage_failure_keeps_outline_trusted() {
        let scope = ScopeRef::course("c1");
        let state = dispatched(ControllerState::default(), 1, &scope);

        let (state, effects) = settle(state, 1, Outcome::Failed(ErrorKind::StorageFailure));
        assert_eq!(effects, vec![Effect::Rollback(Ticket(1))]);
        assert!(!state.needs_refetch);
    }

    #[test]
    fn test_scope_failure_requests_refetch() {
        let scope = ScopeRef::module("c1", "m1");
        let state = dispatched(ControllerState::default(), 7, &scope);
        let (state, effects) = settle(state, 7, Outcome::Failed(ErrorKind::InvalidScope));
        assert_eq!(effects, vec![Effect::Rollback(Ticket(7)), Effect::Refetch]);
        assert!(state.needs_refetch);

        let (state, effects) = reduce(state, Action::Synced);
        assert!(effects.is_empty());
        assert!(!state.needs_refetch);
    }

    #[test]
    fn test_unknown_ticket_is_ignored() {
        let (state, effects) = settle(
            ControllerState::default(),
            9,
            Outcome::Failed(ErrorKind::StaleScope),
        );
        assert!(effects.is_empty());
        assert_eq!(state, ControllerState::default());
    }

    #[test]
    fn test_late_commit_after_sync_requests_refetch() {
        let scope = ScopeRef::course("c1");
        let state = dispatched(ControllerState::default(), 1, &scope);
        let state = dispatched(state, 2, &scope);

        let (state, effects) = reduce(state, Action::Synced);
        assert_eq!(effects, vec![Effect::Discard(vec![Ticket(1), Ticket(2)])]);
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.needs_refetch);

        // A late failure changed nothing on the server
        let (state, effects) = settle(state, 1, Outcome::Failed(ErrorKind::StorageFailure));
        assert!(effects.is_empty());
        assert!(!state.needs_refetch);

        let (state, effects) = settle(state, 2, Outcome::Confirmed);
        assert_eq!(effects, vec![Effect::Refetch]);
        assert!(state.needs_refetch);
        assert!(state.detached.is_empty());
    }
}
