//! Participant model and lifecycle transitions

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::utils::errors::{ConflictReason, Result, StateViolation, VolunteerHubError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Participant {
    pub event_id: i64,
    pub user_id: i64,
    pub status: ParticipantStatus,
    pub registered_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i64>,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Participant {
    /// A fresh pending registration
    pub fn pending(event_id: i64, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            user_id,
            status: ParticipantStatus::Pending,
            registered_at: now,
            reviewed_at: None,
            reviewed_by: None,
            checked_in: false,
            check_in_time: None,
            completed: false,
            completed_at: None,
        }
    }

    /// `checked_in` implies approved, `completed` implies checked in
    pub fn is_consistent(&self) -> bool {
        (!self.checked_in || self.status == ParticipantStatus::Approved)
            && (!self.completed || self.checked_in)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(&self) -> ParticipantStatus {
        match self {
            ReviewDecision::Approve => ParticipantStatus::Approved,
            ReviewDecision::Reject => ParticipantStatus::Rejected,
        }
    }
}

/// A state change applied to a single participant.
///
/// Stores evaluate [`Transition::check`] and [`Transition::apply`] as one
/// atomic step so that a concurrent writer cannot slip in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Review { decision: ReviewDecision, reviewer: i64 },
    CheckIn,
    UndoCheckIn,
    Complete,
    UndoComplete,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Review { decision: ReviewDecision::Approve, .. } => "approve",
            Transition::Review { decision: ReviewDecision::Reject, .. } => "reject",
            Transition::CheckIn => "check_in",
            Transition::UndoCheckIn => "undo_check_in",
            Transition::Complete => "complete",
            Transition::UndoComplete => "undo_complete",
        }
    }

    /// Precondition of the transition against the participant's current state
    pub fn check(&self, participant: &Participant) -> Result<()> {
        match self {
            Transition::Review { .. } => {
                if participant.status != ParticipantStatus::Pending {
                    return Err(VolunteerHubError::Conflict(ConflictReason::AlreadyReviewed));
                }
            }
            Transition::CheckIn => {
                if participant.status != ParticipantStatus::Approved {
                    return Err(VolunteerHubError::InvalidState(StateViolation::NotApproved));
                }
                if participant.checked_in {
                    return Err(VolunteerHubError::InvalidState(StateViolation::AlreadyCheckedIn));
                }
            }
            Transition::UndoCheckIn => {
                if !participant.checked_in {
                    return Err(VolunteerHubError::InvalidState(StateViolation::NotCheckedIn));
                }
                if participant.completed {
                    return Err(VolunteerHubError::InvalidState(StateViolation::CompletedBlocksUndo));
                }
            }
            Transition::Complete => {
                if !participant.checked_in {
                    return Err(VolunteerHubError::InvalidState(StateViolation::NotCheckedIn));
                }
                if participant.completed {
                    return Err(VolunteerHubError::InvalidState(StateViolation::AlreadyCompleted));
                }
            }
            Transition::UndoComplete => {
                if !participant.completed {
                    return Err(VolunteerHubError::InvalidState(StateViolation::NotCompleted));
                }
            }
        }
        Ok(())
    }

    /// Apply the effect; callers must have passed [`Transition::check`]
    pub fn apply(&self, participant: &mut Participant, now: DateTime<Utc>) {
        match *self {
            Transition::Review { decision, reviewer } => {
                participant.status = decision.status();
                participant.reviewed_at = Some(now);
                participant.reviewed_by = Some(reviewer);
            }
            Transition::CheckIn => {
                participant.checked_in = true;
                participant.check_in_time = Some(now);
            }
            Transition::UndoCheckIn => {
                participant.checked_in = false;
                participant.check_in_time = None;
            }
            Transition::Complete => {
                participant.completed = true;
                participant.completed_at = Some(now);
            }
            Transition::UndoComplete => {
                participant.completed = false;
                participant.completed_at = None;
            }
        }
    }
}

/// Aggregate counts for the manager review screen
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub checked_in: usize,
    pub completed: usize,
}

/// Participants of one event partitioned for review.
///
/// `pending`, `approved` and `rejected` partition by status; `checked_in`
/// holds approved participants that are checked in but not yet completed,
/// `completed` those that are completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationBuckets {
    pub counts: RegistrationCounts,
    pub pending: Vec<Participant>,
    pub approved: Vec<Participant>,
    pub rejected: Vec<Participant>,
    pub checked_in: Vec<Participant>,
    pub completed: Vec<Participant>,
}

impl RegistrationBuckets {
    pub fn from_participants(participants: Vec<Participant>) -> Self {
        let mut buckets = RegistrationBuckets::default();
        buckets.counts.total = participants.len();

        for participant in participants {
            if participant.completed {
                buckets.completed.push(participant.clone());
            } else if participant.checked_in {
                buckets.checked_in.push(participant.clone());
            }

            match participant.status {
                ParticipantStatus::Pending => buckets.pending.push(participant),
                ParticipantStatus::Approved => buckets.approved.push(participant),
                ParticipantStatus::Rejected => buckets.rejected.push(participant),
            }
        }

        buckets.counts.pending = buckets.pending.len();
        buckets.counts.approved = buckets.approved.len();
        buckets.counts.rejected = buckets.rejected.len();
        buckets.counts.checked_in = buckets.checked_in.len();
        buckets.counts.completed = buckets.completed.len();
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn approved(now: DateTime<Utc>) -> Participant {
        let mut p = Participant::pending(1, 2, now);
        Transition::Review { decision: ReviewDecision::Approve, reviewer: 9 }.apply(&mut p, now);
        p
    }

    #[test]
    fn test_review_only_from_pending() {
        let now = Utc::now();
        let mut p = Participant::pending(1, 2, now);
        let review = Transition::Review { decision: ReviewDecision::Reject, reviewer: 9 };
        assert!(review.check(&p).is_ok());
        review.apply(&mut p, now);
        assert_eq!(p.status, ParticipantStatus::Rejected);
        assert_eq!(p.reviewed_by, Some(9));
        assert_matches!(
            review.check(&p),
            Err(VolunteerHubError::Conflict(ConflictReason::AlreadyReviewed))
        );
    }

    #[test]
    fn test_check_in_requires_approval() {
        let now = Utc::now();
        let p = Participant::pending(1, 2, now);
        assert_matches!(
            Transition::CheckIn.check(&p),
            Err(VolunteerHubError::InvalidState(StateViolation::NotApproved))
        );
        assert!(Transition::CheckIn.check(&approved(now)).is_ok());
    }

    #[test]
    fn test_undo_check_in_blocked_by_completion() {
        let now = Utc::now();
        let mut p = approved(now);
        assert_matches!(
            Transition::UndoCheckIn.check(&p),
            Err(VolunteerHubError::InvalidState(StateViolation::NotCheckedIn))
        );
        Transition::CheckIn.apply(&mut p, now);
        Transition::Complete.apply(&mut p, now);
        assert!(p.is_consistent());
        assert_matches!(
            Transition::UndoCheckIn.check(&p),
            Err(VolunteerHubError::InvalidState(StateViolation::CompletedBlocksUndo))
        );
        Transition::UndoComplete.apply(&mut p, now);
        assert!(p.completed_at.is_none());
        assert!(Transition::UndoCheckIn.check(&p).is_ok());
    }

    #[test]
    fn test_buckets_partition() {
        let now = Utc::now();
        let pending = Participant::pending(1, 10, now);
        let mut rejected = Participant::pending(1, 11, now);
        rejected.status = ParticipantStatus::Rejected;
        let mut checked = approved(now);
        checked.user_id = 12;
        Transition::CheckIn.apply(&mut checked, now);
        let mut done = checked.clone();
        done.user_id = 13;
        Transition::Complete.apply(&mut done, now);
        let plain = approved(now);

        let buckets = RegistrationBuckets::from_participants(vec![pending, rejected, checked, done, plain]);
        assert_eq!(buckets.counts, RegistrationCounts {
            total: 5,
            pending: 1,
            approved: 3,
            rejected: 1,
            checked_in: 1,
            completed: 1,
        });
        assert_eq!(buckets.completed[0].user_id, 13);
    }
}
