//! The job lifecycle transition table.
//!
//! Every lifecycle operation is gated twice: here, for pre-checks and for
//! turning a conditional-update miss into a precise error, and again in the
//! repository, where the same predicates appear in single-statement
//! conditional UPDATEs so concurrent writers cannot race past each other.

use super::models::JobStatus;

/// A named lifecycle operation on a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Assign,
    Accept,
    Unassign,
    Complete,
    RequestRevision,
    Approve,
    Cancel,
    FundEscrow,
}

impl LifecycleAction {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleAction::Assign => "assign",
            LifecycleAction::Accept => "accept",
            LifecycleAction::Unassign => "unassign",
            LifecycleAction::Complete => "complete",
            LifecycleAction::RequestRevision => "request_revision",
            LifecycleAction::Approve => "approve",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::FundEscrow => "fund_escrow",
        }
    }

    /// Whether this action may be applied to a job in `status`.
    ///
    /// `Accept` from `assigned` additionally requires the caller to be the
    /// assigned provider; `Approve` additionally requires the escrow to be
    /// funded. Those extra guards live in the service since they depend on
    /// more than the status.
    pub fn allowed_from(self, status: JobStatus) -> bool {
        use JobStatus::*;
        use LifecycleAction::*;

        matches!(
            (self, status),
            (Assign, Open)
                | (Accept, Open)
                | (Accept, Assigned)
                | (Unassign, Assigned)
                | (FundEscrow, Accepted)
                | (Complete, Accepted)
                | (Complete, RevisionRequested)
                | (RequestRevision, Completed)
                | (RequestRevision, RevisionRequested)
                | (Approve, Completed)
                | (Cancel, Open)
                | (Cancel, Assigned)
                | (Cancel, Accepted)
                | (Cancel, RevisionRequested)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;
    use LifecycleAction::*;

    const ALL_STATUSES: [JobStatus; 6] =
        [Open, Assigned, Accepted, Completed, RevisionRequested, Cancelled];

    fn allowed_statuses(action: LifecycleAction) -> Vec<JobStatus> {
        ALL_STATUSES
            .into_iter()
            .filter(|s| action.allowed_from(*s))
            .collect()
    }

    #[test]
    fn assign_only_from_open() {
        assert_eq!(allowed_statuses(Assign), vec![Open]);
    }

    #[test]
    fn accept_from_open_or_assigned() {
        assert_eq!(allowed_statuses(Accept), vec![Open, Assigned]);
    }

    #[test]
    fn unassign_only_from_assigned() {
        assert_eq!(allowed_statuses(Unassign), vec![Assigned]);
    }

    #[test]
    fn complete_from_accepted_or_revision_requested() {
        assert_eq!(allowed_statuses(Complete), vec![Accepted, RevisionRequested]);
    }

    #[test]
    fn revision_from_completed_or_revision_requested() {
        assert_eq!(
            allowed_statuses(RequestRevision),
            vec![Completed, RevisionRequested]
        );
    }

    #[test]
    fn approve_only_from_completed() {
        assert_eq!(allowed_statuses(Approve), vec![Completed]);
    }

    #[test]
    fn fund_escrow_only_from_accepted() {
        assert_eq!(allowed_statuses(FundEscrow), vec![Accepted]);
    }

    #[test]
    fn cancel_from_every_non_terminal_pre_approval_state() {
        assert_eq!(
            allowed_statuses(Cancel),
            vec![Open, Assigned, Accepted, RevisionRequested]
        );
    }

    #[test]
    fn cancelled_is_terminal() {
        for action in [
            Assign,
            Accept,
            Unassign,
            Complete,
            RequestRevision,
            Approve,
            Cancel,
            FundEscrow,
        ] {
            assert!(
                !action.allowed_from(Cancelled),
                "{} must not apply to a cancelled job",
                action.name()
            );
        }
    }

    #[test]
    fn completed_jobs_cannot_be_cancelled_or_reassigned() {
        for action in [Assign, Accept, Unassign, Cancel, FundEscrow] {
            assert!(!action.allowed_from(Completed), "{}", action.name());
        }
    }
}
