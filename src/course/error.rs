use thiserror::Error;

use super::group::{GroupId, GroupRole};
use super::page::PageId;

/// A candidate page order that breaks the diagnose → discuss → differentiate sequence.
/// The display text is shown to the author as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    #[error("students must complete the diagnostic test before entering the dialogue diagnosis")]
    DialogueBeforeDiagnostic {
        group: GroupId,
        diagnostic: PageId,
        dialogue: PageId,
    },

    #[error("students must complete the cognitive-starting-point diagnosis before entering tiered instruction")]
    TieredBeforePrerequisite {
        group: GroupId,
        prerequisite: PageId,
        tiered: PageId,
    },

    #[error("different differentiated-instruction configurations cannot be interleaved")]
    Interleaved {
        group: GroupId,
        intruder: PageId,
        intruder_group: GroupId,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CourseError {
    #[error(transparent)]
    Order(#[from] OrderViolation),

    #[error("generate the diagnostic page first (group {group})")]
    MissingDiagnostic { group: GroupId },

    #[error("no page with id {0}")]
    UnknownPage(PageId),

    #[error("a page with id {0} already exists")]
    DuplicatePage(PageId),

    #[error("reorder candidate does not contain exactly the course's pages")]
    CandidateMismatch,

    #[error("configuration group {group} holds more than one {role} page")]
    DuplicateGroupMember { group: GroupId, role: GroupRole },

    #[error("dialogue page {dialogue} in group {group} links to {linked}, not to diagnostic page {diagnostic}")]
    LinkMismatch {
        group: GroupId,
        dialogue: PageId,
        linked: PageId,
        diagnostic: PageId,
    },
}

impl CourseError {
    /// User-facing rejections the author can fix with a different gesture.
    /// Everything else is a data-integrity fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Order(_) | Self::MissingDiagnostic { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_author_rejections_are_recoverable() {
        let order = CourseError::from(OrderViolation::Interleaved {
            group: "g1".into(),
            intruder: "y".into(),
            intruder_group: "g2".into(),
        });
        assert!(order.is_recoverable());
        assert!(CourseError::MissingDiagnostic { group: "g1".into() }.is_recoverable());

        assert!(!CourseError::UnknownPage("p".into()).is_recoverable());
        assert!(!CourseError::CandidateMismatch.is_recoverable());
        assert!(!CourseError::DuplicateGroupMember {
            group: "g1".into(),
            role: GroupRole::Dialogue,
        }
        .is_recoverable());
    }
}
