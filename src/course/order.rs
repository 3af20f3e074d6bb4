use super::error::{CourseError, OrderViolation};
use super::group::{GroupId, GroupMembers};
use super::page::Page;

type Slot<'a> = (usize, &'a Page);

/// Members of one configuration group located in the visible order.
struct GroupSlots<'a> {
    id: &'a GroupId,
    members: GroupMembers<Slot<'a>>,
    first: usize,
    last: usize,
}

/// Checks a candidate page order. Only visible pages take part. Groups are checked
/// in order of first visible appearance, each against rules 1 to 3 before the next
/// group, and the first violation is returned.
///
/// 1. a dialogue page comes after its group's diagnostic page
/// 2. a tiered-instruction page comes after the diagnostic page, and after the dialogue page if there is one
/// 3. no page of another group sits between the first and last member of a group
pub fn validate(candidate: &[Page]) -> Result<(), CourseError> {
    let visible: Vec<&Page> = candidate.iter().filter(|page| page.is_visible()).collect();
    let groups = locate_groups(&visible)?;

    for group in &groups {
        check_dialogue(group)?;
        check_tiered(group)?;
        check_contiguous(group, &visible)?;
    }

    Ok(())
}

// groups come out in order of first visible appearance
fn locate_groups<'a>(visible: &[&'a Page]) -> Result<Vec<GroupSlots<'a>>, CourseError> {
    let mut groups: Vec<GroupSlots<'a>> = Vec::new();

    for (position, &page) in visible.iter().enumerate() {
        let Some(id) = page.config_group_id.as_ref() else {
            continue;
        };

        let index = match groups.iter().position(|group| group.id == id) {
            Some(index) => index,
            None => {
                groups.push(GroupSlots {
                    id,
                    members: GroupMembers::default(),
                    first: position,
                    last: position,
                });
                groups.len() - 1
            }
        };

        let slots = &mut groups[index];
        slots.last = position;
        if let Some(role) = page.role() {
            slots.members.place(id, role, (position, page))?;
        }
    }

    Ok(groups)
}

fn check_dialogue(group: &GroupSlots) -> Result<(), OrderViolation> {
    if let (Some((diagnostic_at, diagnostic)), Some((dialogue_at, dialogue))) =
        (group.members.diagnostic, group.members.dialogue)
    {
        if dialogue_at < diagnostic_at {
            return Err(OrderViolation::DialogueBeforeDiagnostic {
                group: group.id.clone(),
                diagnostic: diagnostic.id.clone(),
                dialogue: dialogue.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_tiered(group: &GroupSlots) -> Result<(), OrderViolation> {
    let (Some(diagnostic), Some((tiered_at, tiered))) =
        (group.members.diagnostic, group.members.tiered)
    else {
        return Ok(());
    };

    let prerequisites = std::iter::once(diagnostic).chain(group.members.dialogue);
    for (required_at, required) in prerequisites {
        if tiered_at < required_at {
            return Err(OrderViolation::TieredBeforePrerequisite {
                group: group.id.clone(),
                prerequisite: required.id.clone(),
                tiered: tiered.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_contiguous(group: &GroupSlots, visible: &[&Page]) -> Result<(), OrderViolation> {
    if group.last <= group.first {
        return Ok(());
    }

    let intruder = visible[group.first + 1..group.last].iter().find_map(|page| {
        page.config_group_id
            .as_ref()
            .filter(|other| *other != group.id)
            .map(|other| (*page, other))
    });

    match intruder {
        Some((page, other)) => Err(OrderViolation::Interleaved {
            group: group.id.clone(),
            intruder: page.id.clone(),
            intruder_group: other.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::page::{
        DiagnosisConfig, DiagnosticData, DialogueConfig, DialogueData, PageContent, TieredData,
    };

    fn diagnostic(id: &str, group: &str) -> Page {
        let data = DiagnosticData::new(vec![], DiagnosisConfig::default());
        Page::new(id, PageContent::Diagnostic(data))
            .with_id(id)
            .in_group(group.into())
    }

    fn dialogue(id: &str, group: &str, linked: &str) -> Page {
        let data = DialogueData {
            config: DialogueConfig::default(),
            linked_diagnostic: linked.into(),
        };
        Page::new(id, PageContent::Dialogue(data))
            .with_id(id)
            .in_group(group.into())
    }

    fn tiered(id: &str, group: &str) -> Page {
        let data = TieredData::for_levels(vec![], &[]);
        Page::new(id, PageContent::TieredInstruction(data))
            .with_id(id)
            .in_group(group.into())
    }

    fn content(id: &str) -> Page {
        Page::new(id, PageContent::Content).with_id(id)
    }

    fn hidden(mut page: Page) -> Page {
        page.hidden = true;
        page
    }

    fn violation(result: Result<(), CourseError>) -> OrderViolation {
        match result {
            Err(CourseError::Order(violation)) => violation,
            other => panic!("expected an order violation, got {:?}", other),
        }
    }

    #[test]
    fn accepts_the_canonical_sequence() {
        let pages = vec![
            content("intro"),
            diagnostic("a", "g1"),
            dialogue("b", "g1", "a"),
            tiered("c", "g1"),
            content("outro"),
        ];
        assert!(validate(&pages).is_ok());
    }

    #[test]
    fn dialogue_before_diagnostic_is_rejected() {
        let pages = vec![dialogue("b", "g1", "a"), diagnostic("a", "g1")];
        let err = violation(validate(&pages));
        assert!(matches!(err, OrderViolation::DialogueBeforeDiagnostic { .. }));
        assert_eq!(
            err.to_string(),
            "students must complete the diagnostic test before entering the dialogue diagnosis"
        );
    }

    #[test]
    fn tiered_before_diagnostic_is_rejected() {
        let pages = vec![tiered("c", "g1"), diagnostic("a", "g1")];
        let err = violation(validate(&pages));
        assert_eq!(
            err,
            OrderViolation::TieredBeforePrerequisite {
                group: "g1".into(),
                prerequisite: "a".into(),
                tiered: "c".into(),
            }
        );
    }

    #[test]
    fn tiered_before_dialogue_is_rejected() {
        let pages = vec![diagnostic("a", "g1"), tiered("c", "g1"), dialogue("b", "g1", "a")];
        let err = violation(validate(&pages));
        assert_eq!(
            err,
            OrderViolation::TieredBeforePrerequisite {
                group: "g1".into(),
                prerequisite: "b".into(),
                tiered: "c".into(),
            }
        );
    }

    #[test]
    fn tiered_without_diagnostic_is_unconstrained() {
        let pages = vec![tiered("c", "g1"), dialogue("b", "g1", "a")];
        assert!(validate(&pages).is_ok());
    }

    #[test]
    fn ungrouped_pages_may_sit_inside_a_group() {
        let pages = vec![diagnostic("a", "g1"), content("c"), dialogue("b", "g1", "a")];
        assert!(validate(&pages).is_ok());
    }

    #[test]
    fn foreign_group_inside_a_group_is_rejected() {
        let pages = vec![
            diagnostic("a", "g1"),
            diagnostic("x", "g2"),
            dialogue("b", "g1", "a"),
            dialogue("y", "g2", "x"),
        ];
        let err = violation(validate(&pages));
        assert_eq!(
            err,
            OrderViolation::Interleaved {
                group: "g1".into(),
                intruder: "x".into(),
                intruder_group: "g2".into(),
            }
        );
    }

    #[test]
    fn earlier_group_reports_first() {
        // g1 is split by g2, and g2's dialogue also precedes its diagnostic
        let pages = vec![
            diagnostic("a", "g1"),
            dialogue("y", "g2", "x"),
            dialogue("b", "g1", "a"),
            diagnostic("x", "g2"),
        ];
        let err = violation(validate(&pages));
        assert_eq!(
            err,
            OrderViolation::Interleaved {
                group: "g1".into(),
                intruder: "y".into(),
                intruder_group: "g2".into(),
            }
        );
    }

    #[test]
    fn rules_run_in_order_within_a_group() {
        // g1 breaks rule 1 and rule 3 at once
        let pages = vec![
            dialogue("b", "g1", "a"),
            diagnostic("x", "g2"),
            diagnostic("a", "g1"),
        ];
        let err = violation(validate(&pages));
        assert!(matches!(err, OrderViolation::DialogueBeforeDiagnostic { .. }));
    }

    #[test]
    fn hidden_pages_are_ignored() {
        let pages = vec![hidden(dialogue("b", "g1", "a")), diagnostic("a", "g1")];
        assert!(validate(&pages).is_ok());

        let pages = vec![
            diagnostic("a", "g1"),
            hidden(diagnostic("x", "g2")),
            dialogue("b", "g1", "a"),
        ];
        assert!(validate(&pages).is_ok());
    }

    #[test]
    fn duplicate_roles_are_an_integrity_fault() {
        let pages = vec![diagnostic("a", "g1"), diagnostic("a2", "g1")];
        assert!(matches!(
            validate(&pages),
            Err(CourseError::DuplicateGroupMember { .. })
        ));
    }

    #[test]
    fn validation_is_repeatable() {
        let pages = vec![dialogue("b", "g1", "a"), diagnostic("a", "g1")];
        assert_eq!(validate(&pages), validate(&pages));
    }
}
