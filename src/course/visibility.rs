use super::error::CourseError;
use super::group::{group_label, resolve_group, GroupId, GroupRole};
use super::page::{DialogueConfig, DialogueData, Page, PageContent, PageId};
use super::store::{Action, CourseStore};

/// What the caller should do with its page selection after a visibility change.
/// Selection state lives with the caller, not the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Keep,
    Select(PageId),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hidden {
    pub page: Page,
    pub selection: SelectionChange,
}

pub fn hide(page: &Page, selected: Option<&PageId>) -> Hidden {
    let mut page = page.clone();
    page.hidden = true;
    let selection = if selected == Some(&page.id) {
        SelectionChange::Clear
    } else {
        SelectionChange::Keep
    };
    Hidden { page, selection }
}

/// The page reappears at its stored position. Ordering is not re-checked.
pub fn unhide(page: &Page) -> Page {
    let mut page = page.clone();
    page.hidden = false;
    page
}

pub fn set_hidden(
    store: &mut CourseStore,
    id: &PageId,
    hidden: bool,
    selected: Option<&PageId>,
) -> Result<SelectionChange, CourseError> {
    let page = store
        .course()
        .page(id)
        .ok_or_else(|| CourseError::UnknownPage(id.clone()))?;

    if hidden {
        let Hidden { page, selection } = hide(page, selected);
        store.dispatch(Action::UpdatePage(page))?;
        Ok(selection)
    } else {
        let page = unhide(page);
        store.dispatch(Action::UpdatePage(page))?;
        Ok(SelectionChange::Keep)
    }
}

/// Switches the dialogue-diagnosis step of a configuration group on or off.
///
/// Turning it on reuses the group's dialogue page if there is one (showing it again
/// when hidden) or creates one right behind the diagnostic page. Turning it off only
/// hides the page, so its configuration survives. Either way the choice is recorded
/// on the diagnostic page's config.
pub fn toggle_conversation_for_group(
    store: &mut CourseStore,
    group: &GroupId,
    enabled: bool,
    selected: Option<&PageId>,
) -> Result<SelectionChange, CourseError> {
    let members = resolve_group(&store.course().pages, group)?;
    let diagnostic = members.diagnostic.cloned();
    let dialogue = members.dialogue.cloned();

    if !enabled {
        let selection = match dialogue {
            Some(page) if page.is_visible() => {
                let Hidden { page, selection } = hide(&page, selected);
                store.dispatch(Action::UpdatePage(page))?;
                selection
            }
            _ => SelectionChange::Keep,
        };
        if let Some(diagnostic) = diagnostic {
            record_conversation_flag(store, diagnostic, false)?;
        }
        return Ok(selection);
    }

    let Some(diagnostic) = diagnostic else {
        tracing::warn!(%group, "dialogue diagnosis requested before the diagnostic page exists");
        return Err(CourseError::MissingDiagnostic {
            group: group.clone(),
        });
    };

    let shown = match dialogue {
        Some(page) => {
            if page.hidden {
                store.dispatch(Action::UpdatePage(unhide(&page)))?;
            }
            page.id
        }
        None => {
            let index = diagnostic.group_index().unwrap_or_default();
            let page = Page::new(
                group_label(GroupRole::Dialogue, index),
                PageContent::Dialogue(DialogueData {
                    config: DialogueConfig::default(),
                    linked_diagnostic: diagnostic.id.clone(),
                }),
            )
            .in_group(group.clone());
            let id = page.id.clone();

            store.dispatch(Action::InsertPageAfter {
                page,
                after: diagnostic.id.clone(),
            })?;
            tracing::info!(%group, page = %id, "created dialogue page");
            id
        }
    };

    record_conversation_flag(store, diagnostic, true)?;
    Ok(SelectionChange::Select(shown))
}

fn record_conversation_flag(
    store: &mut CourseStore,
    mut diagnostic: Page,
    enabled: bool,
) -> Result<(), CourseError> {
    if let PageContent::Diagnostic(data) = &mut diagnostic.content {
        if data.config.conversation_enabled != enabled {
            data.config.conversation_enabled = enabled;
            store.dispatch(Action::UpdatePage(diagnostic))?;
        }
    }
    Ok(())
}
