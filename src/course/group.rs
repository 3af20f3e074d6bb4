use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::CourseError;
use super::page::{Page, PageContent, PageId};

/// Ties a diagnostic page to its optional dialogue and tiered-instruction companions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh id, distinct from every other id issued in this session.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupRole {
    Diagnostic,
    Dialogue,
    TieredInstruction,
}

impl GroupRole {
    fn label_stem(&self) -> &'static str {
        match self {
            Self::Diagnostic => "试题诊断",
            Self::Dialogue => "对话诊断",
            Self::TieredInstruction => "分层教学",
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Diagnostic => "diagnostic",
            Self::Dialogue => "dialogue",
            Self::TieredInstruction => "tiered-instruction",
        })
    }
}

/// Display title of a group member, e.g. "因材施教-试题诊断2".
pub fn group_label(role: GroupRole, index: u32) -> String {
    format!("因材施教-{}{}", role.label_stem(), index)
}

/// One more than the largest group index stored on any diagnostic page, or 1.
pub fn next_group_index(pages: &[Page]) -> u32 {
    pages
        .iter()
        .filter_map(Page::group_index)
        .max()
        .map_or(1, |max| max + 1)
}

/// At most one member per role. Placing a second member of the same role is an
/// integrity fault, never resolved by picking one.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMembers<T> {
    pub diagnostic: Option<T>,
    pub dialogue: Option<T>,
    pub tiered: Option<T>,
}

impl<T> Default for GroupMembers<T> {
    fn default() -> Self {
        Self {
            diagnostic: None,
            dialogue: None,
            tiered: None,
        }
    }
}

impl<T> GroupMembers<T> {
    pub fn get(&self, role: GroupRole) -> Option<&T> {
        match role {
            GroupRole::Diagnostic => self.diagnostic.as_ref(),
            GroupRole::Dialogue => self.dialogue.as_ref(),
            GroupRole::TieredInstruction => self.tiered.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostic.is_none() && self.dialogue.is_none() && self.tiered.is_none()
    }

    pub(crate) fn place(
        &mut self,
        group: &GroupId,
        role: GroupRole,
        member: T,
    ) -> Result<(), CourseError> {
        let slot = match role {
            GroupRole::Diagnostic => &mut self.diagnostic,
            GroupRole::Dialogue => &mut self.dialogue,
            GroupRole::TieredInstruction => &mut self.tiered,
        };
        if slot.is_some() {
            tracing::error!(%group, %role, "configuration group holds duplicate members");
            return Err(CourseError::DuplicateGroupMember {
                group: group.clone(),
                role,
            });
        }
        *slot = Some(member);
        Ok(())
    }
}

pub fn resolve_group<'a>(
    pages: &'a [Page],
    group: &GroupId,
) -> Result<GroupMembers<&'a Page>, CourseError> {
    let mut members = GroupMembers::default();
    for page in pages
        .iter()
        .filter(|page| page.config_group_id.as_ref() == Some(group))
    {
        if let Some(role) = page.role() {
            members.place(group, role, page)?;
        }
    }

    if let (Some(diagnostic), Some(dialogue)) = (members.diagnostic, members.dialogue) {
        if let PageContent::Dialogue(data) = &dialogue.content {
            if data.linked_diagnostic != diagnostic.id {
                tracing::error!(%group, dialogue = %dialogue.id, "dialogue links outside its group");
                return Err(CourseError::LinkMismatch {
                    group: group.clone(),
                    dialogue: dialogue.id.clone(),
                    linked: data.linked_diagnostic.clone(),
                    diagnostic: diagnostic.id.clone(),
                });
            }
        }
    }

    Ok(members)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrphanReason {
    /// no diagnostic page carries the companion's group id
    MissingDiagnostic,
    /// dialogue back-reference does not name its group's diagnostic page
    DanglingLink { linked: PageId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub page: PageId,
    pub group: Option<GroupId>,
    pub reason: OrphanReason,
}

/// Dialogue and tiered pages that lost their diagnostic page, typically after a
/// plain page delete.
pub fn orphaned_pages(pages: &[Page]) -> Vec<Orphan> {
    let diagnostic_of = |group: &GroupId| {
        pages.iter().find(|page| {
            page.role() == Some(GroupRole::Diagnostic)
                && page.config_group_id.as_ref() == Some(group)
        })
    };

    pages
        .iter()
        .filter(|page| {
            matches!(
                page.role(),
                Some(GroupRole::Dialogue | GroupRole::TieredInstruction)
            )
        })
        .filter_map(|page| {
            let diagnostic = page.config_group_id.as_ref().and_then(|group| diagnostic_of(group));
            let reason = match (diagnostic, &page.content) {
                (None, _) => OrphanReason::MissingDiagnostic,
                (Some(diagnostic), PageContent::Dialogue(data))
                    if data.linked_diagnostic != diagnostic.id =>
                {
                    OrphanReason::DanglingLink {
                        linked: data.linked_diagnostic.clone(),
                    }
                }
                _ => return None,
            };
            Some(Orphan {
                page: page.id.clone(),
                group: page.config_group_id.clone(),
                reason,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::page::{DiagnosisConfig, DiagnosticData, DialogueConfig, DialogueData};

    fn diagnostic(id: &str, group: &str, index: u32) -> Page {
        let mut data = DiagnosticData::new(vec![], DiagnosisConfig::default());
        data.group_index = index;
        Page::new(id, PageContent::Diagnostic(data))
            .with_id(id)
            .in_group(group.into())
    }

    fn dialogue(id: &str, group: &str, linked: &str) -> Page {
        Page::new(
            id,
            PageContent::Dialogue(DialogueData {
                config: DialogueConfig::default(),
                linked_diagnostic: linked.into(),
            }),
        )
        .with_id(id)
        .in_group(group.into())
    }

    #[test]
    fn next_group_index_starts_at_one() {
        assert_eq!(next_group_index(&[]), 1);
        let pages = vec![Page::new("封面", PageContent::Title)];
        assert_eq!(next_group_index(&pages), 1);
    }

    #[test]
    fn next_group_index_follows_the_largest() {
        let pages = vec![diagnostic("a", "g1", 1), diagnostic("b", "g3", 3)];
        assert_eq!(next_group_index(&pages), 4);
    }

    #[test]
    fn generated_group_ids_are_distinct() {
        assert_ne!(GroupId::generate(), GroupId::generate());
    }

    #[test]
    fn resolve_buckets_by_role() {
        let pages = vec![
            diagnostic("a", "g1", 1),
            Page::new("内容", PageContent::Content),
            dialogue("b", "g1", "a"),
            diagnostic("x", "g2", 2),
        ];
        let members = resolve_group(&pages, &"g1".into()).unwrap();
        assert_eq!(members.diagnostic.map(|p| p.id.as_str()), Some("a"));
        assert_eq!(members.dialogue.map(|p| p.id.as_str()), Some("b"));
        assert!(members.tiered.is_none());

        assert!(resolve_group(&pages, &"missing".into()).unwrap().is_empty());
    }

    #[test]
    fn resolve_rejects_duplicate_roles() {
        let pages = vec![diagnostic("a", "g1", 1), diagnostic("b", "g1", 2)];
        let err = resolve_group(&pages, &"g1".into()).unwrap_err();
        assert_eq!(
            err,
            CourseError::DuplicateGroupMember {
                group: "g1".into(),
                role: GroupRole::Diagnostic,
            }
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn resolve_rejects_foreign_back_reference() {
        let pages = vec![diagnostic("a", "g1", 1), dialogue("b", "g1", "elsewhere")];
        assert!(matches!(
            resolve_group(&pages, &"g1".into()),
            Err(CourseError::LinkMismatch { .. })
        ));
    }

    #[test]
    fn orphans_after_diagnostic_removed() {
        let pages = vec![
            dialogue("b", "g1", "a"),
            diagnostic("x", "g2", 2),
            dialogue("y", "g2", "z"),
        ];
        let orphans = orphaned_pages(&pages);
        assert_eq!(orphans.len(), 2);
        assert_eq!(orphans[0].page.as_str(), "b");
        assert_eq!(orphans[0].reason, OrphanReason::MissingDiagnostic);
        assert_eq!(
            orphans[1].reason,
            OrphanReason::DanglingLink { linked: "z".into() }
        );
    }

    #[test]
    fn labels_carry_the_group_index() {
        assert_eq!(group_label(GroupRole::Diagnostic, 2), "因材施教-试题诊断2");
        assert_eq!(group_label(GroupRole::TieredInstruction, 1), "因材施教-分层教学1");
    }
}
