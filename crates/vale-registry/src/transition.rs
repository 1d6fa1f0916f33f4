//! The voucher status transition table.
//!
//! This is the only place that decides which status changes are legal.
//!
//! | from \ to | Pending | Deducted | Voided |
//! |-----------|---------|----------|--------|
//! | Pending   | no-op   | apply    | apply  |
//! | Deducted  | reject  | no-op    | apply  |
//! | Voided    | reject  | apply    | no-op  |
//!
//! `Deducted -> Voided` corrects an erroneous deduction and
//! `Voided -> Deducted` reverses an erroneous void. Nothing returns to
//! `Pending`. Self-transitions change nothing and are not counted as updates.

use vale_types::Status;

/// Outcome of checking a requested status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The change is legal and alters the record.
    Apply,
    /// The record already has the requested status.
    NoOp,
    /// The change is not allowed.
    Rejected,
}

/// Look up a transition in the table.
pub fn check_transition(from: Status, to: Status) -> Transition {
    use Status::*;
    match (from, to) {
        (Pending, Pending) | (Deducted, Deducted) | (Voided, Voided) => Transition::NoOp,
        (Pending, Deducted) | (Pending, Voided) => Transition::Apply,
        (Deducted, Voided) | (Voided, Deducted) => Transition::Apply,
        (Deducted, Pending) | (Voided, Pending) => Transition::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Status::*;

    #[test]
    fn pending_moves_forward() {
        assert_eq!(check_transition(Pending, Deducted), Transition::Apply);
        assert_eq!(check_transition(Pending, Voided), Transition::Apply);
    }

    #[test]
    fn corrections_between_terminal_states() {
        assert_eq!(check_transition(Deducted, Voided), Transition::Apply);
        assert_eq!(check_transition(Voided, Deducted), Transition::Apply);
    }

    #[test]
    fn nothing_returns_to_pending() {
        assert_eq!(check_transition(Deducted, Pending), Transition::Rejected);
        assert_eq!(check_transition(Voided, Pending), Transition::Rejected);
    }

    #[test]
    fn every_pair_matches_the_table() {
        use Transition::{Apply as A, NoOp as N, Rejected as R};
        let table = [[N, A, A], [R, N, A], [R, A, N]];
        for (i, from) in Status::ALL.into_iter().enumerate() {
            for (j, to) in Status::ALL.into_iter().enumerate() {
                assert_eq!(check_transition(from, to), table[i][j], "{from} -> {to}");
            }
        }
    }

    #[test]
    fn self_transitions_are_noops() {
        for s in Status::ALL {
            assert_eq!(check_transition(s, s), Transition::NoOp);
        }
    }
}
