//! Marriage proposals while dragging a person.
//!
//! Dropping an unmarried person onto another unmarried person offers to
//! marry them. [`MarriageProposal`] tracks that interaction:
//!
//! ```text
//!            track (overlap)            accept             complete
//!   Idle ─────────────────────▶ CandidateFound ─────▶ Confirmed ─────▶ Married
//!    ▲                              │   │                                 │
//!    └──── track (no overlap) ──────┘   └── cancel ──▶ Idle               │
//!    └──────────────────────────── next track ────────────────────────────┘
//! ```
//!
//! The drag gesture stays open until [`MarriageProposal::complete`], which
//! records it before the marriage.
//!
//! At most one person is highlighted as the candidate. Every transition
//! reports which highlight to clear and which to set, and a new candidate's
//! highlight is always preceded by clearing the old one.

use log::debug;

use lineage_core::identifier::Id;

use crate::{
    document::{Document, MoveGesture},
    error::DocumentError,
    mutator::{MarriageOutcome, MarryMode},
};

/// Where a marriage proposal currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProposalState {
    #[default]
    Idle,
    /// `dragged` overlaps `candidate`, which is highlighted.
    CandidateFound { dragged: Id, candidate: Id },
    /// The user accepted marrying `dragged` to `candidate`.
    Confirmed { dragged: Id, candidate: Id },
    Married(MarriageOutcome),
}

/// Highlight updates for the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightChange {
    pub cleared: Option<Id>,
    pub set: Option<Id>,
}

impl HighlightChange {
    pub fn is_empty(&self) -> bool {
        self.cleared.is_none() && self.set.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarriageProposal {
    state: ProposalState,
}

impl MarriageProposal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProposalState {
        self.state
    }

    /// The person currently highlighted as a candidate.
    pub fn highlighted(&self) -> Option<Id> {
        match self.state {
            ProposalState::CandidateFound { candidate, .. }
            | ProposalState::Confirmed { candidate, .. } => Some(candidate),
            ProposalState::Idle | ProposalState::Married(_) => None,
        }
    }

    /// Re-evaluates the candidate after `dragged` moved.
    ///
    /// The candidate is the first person in document order whose box
    /// overlaps the dragged box and who may marry the dragged person.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::NotFound`] if `dragged` is not a person.
    /// - [`DocumentError::InvalidState`] while a confirmed proposal awaits
    ///   [`complete`](Self::complete).
    pub fn track(
        &mut self,
        document: &Document,
        dragged: Id,
    ) -> Result<HighlightChange, DocumentError> {
        if let ProposalState::Confirmed { .. } = self.state {
            return Err(DocumentError::invalid("a confirmed proposal is pending"));
        }

        let bounds = document.person(dragged)?.bounds();
        let mut candidate = None;
        for person in document.persons() {
            if person.id() != dragged
                && person.bounds().intersects(&bounds)
                && document.can_marry(dragged, person.id())?
            {
                candidate = Some(person.id());
                break;
            }
        }

        let previous = self.highlighted();
        self.state = match candidate {
            Some(candidate) => ProposalState::CandidateFound { dragged, candidate },
            None => ProposalState::Idle,
        };
        if previous == candidate {
            return Ok(HighlightChange::default());
        }
        debug!(dragged:% = dragged, candidate:? = candidate; "Marriage candidate changed");
        Ok(HighlightChange {
            cleared: previous,
            set: candidate,
        })
    }

    /// The user accepted the proposal.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] unless a candidate is found.
    pub fn accept(&mut self) -> Result<(), DocumentError> {
        match self.state {
            ProposalState::CandidateFound { dragged, candidate } => {
                self.state = ProposalState::Confirmed { dragged, candidate };
                Ok(())
            }
            _ => Err(DocumentError::invalid("no marriage candidate to accept")),
        }
    }

    /// Ends the drag, then marries the confirmed pair through the document
    /// and clears the highlight.
    ///
    /// The drag is recorded as its own move command below the marriage, so
    /// undoing twice puts the dragged person back where the drag started.
    /// The drag is finished even when the proposal is not confirmed. If the
    /// marriage is rejected the proposal returns to idle.
    pub fn complete(
        &mut self,
        document: &mut Document,
        gesture: MoveGesture,
    ) -> Result<(MarriageOutcome, HighlightChange), DocumentError> {
        document.finish_move(gesture)?;
        let ProposalState::Confirmed { dragged, candidate } = self.state else {
            return Err(DocumentError::invalid("no confirmed marriage proposal"));
        };
        let cleared = HighlightChange {
            cleared: Some(candidate),
            set: None,
        };
        match document.marry(dragged, candidate, MarryMode::Interactive) {
            Ok(outcome) => {
                self.state = ProposalState::Married(outcome);
                Ok((outcome, cleared))
            }
            Err(err) => {
                self.state = ProposalState::Idle;
                Err(err)
            }
        }
    }

    /// Drops the proposal, e.g. when the drag ends without acceptance.
    pub fn cancel(&mut self) -> HighlightChange {
        let cleared = self.highlighted();
        self.state = ProposalState::Idle;
        HighlightChange { cleared, set: None }
    }
}
