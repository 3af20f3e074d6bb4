use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::CourseError;
use super::group::{group_label, next_group_index, orphaned_pages, resolve_group, GroupId, GroupRole};
use super::order::validate;
use super::page::{Course, DiagnosticData, OutlineGroup, Page, PageContent, PageId, TieredData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetTitle(String),
    AddPage(Page),
    /// places a page directly behind an existing one instead of at the end
    InsertPageAfter { page: Page, after: PageId },
    UpdatePage(Page),
    DeletePage(PageId),
    /// removes every page of a configuration group in one step
    DeleteConfigGroup(GroupId),
    ReorderPages(Vec<Page>),
    AddGroup(OutlineGroup),
    UpdateGroup(OutlineGroup),
    DeleteGroup(String),
    SetCourse(Box<Course>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTitle(_) => "SET_TITLE",
            Self::AddPage(_) => "ADD_PAGE",
            Self::InsertPageAfter { .. } => "INSERT_PAGE_AFTER",
            Self::UpdatePage(_) => "UPDATE_PAGE",
            Self::DeletePage(_) => "DELETE_PAGE",
            Self::DeleteConfigGroup(_) => "DELETE_CONFIG_GROUP",
            Self::ReorderPages(_) => "REORDER_PAGES",
            Self::AddGroup(_) => "ADD_GROUP",
            Self::UpdateGroup(_) => "UPDATE_GROUP",
            Self::DeleteGroup(_) => "DELETE_GROUP",
            Self::SetCourse(_) => "SET_COURSE",
        }
    }
}

/// Applies one action to a course snapshot. On error the caller keeps the prior
/// snapshot; nothing is partially applied.
pub fn reduce(course: &Course, action: Action) -> Result<Course, CourseError> {
    let mut next = course.clone();

    match action {
        Action::SetTitle(title) => next.title = title,
        Action::AddPage(page) => {
            ensure_new(&next, &page.id)?;
            let group = member_group(&page);
            note_group_index(&mut next, &page);
            next.pages.push(page);
            ensure_group_intact(&next, group)?;
        }
        Action::InsertPageAfter { page, after } => {
            ensure_new(&next, &page.id)?;
            let at = next
                .position(&after)
                .ok_or(CourseError::UnknownPage(after))?;
            let group = member_group(&page);
            note_group_index(&mut next, &page);
            next.pages.insert(at + 1, page);
            ensure_group_intact(&next, group)?;
        }
        Action::UpdatePage(page) => {
            let Some(at) = next.position(&page.id) else {
                tracing::debug!(page = %page.id, "update for unknown page ignored");
                return Ok(next);
            };
            let group = member_group(&page);
            note_group_index(&mut next, &page);
            next.pages[at] = page;
            ensure_group_intact(&next, group)?;
        }
        Action::DeletePage(id) => {
            let Some(at) = next.position(&id) else {
                tracing::debug!(page = %id, "delete for unknown page ignored");
                return Ok(next);
            };
            let removed = next.pages.remove(at);
            warn_orphans(&next, &removed);
        }
        Action::DeleteConfigGroup(group) => {
            let before = next.pages.len();
            next.pages
                .retain(|page| page.config_group_id.as_ref() != Some(&group));
            tracing::info!(%group, removed = before - next.pages.len(), "deleted configuration group");
        }
        Action::ReorderPages(candidate) => {
            ensure_permutation(&next.pages, &candidate)?;
            validate(&candidate)?;
            next.pages = candidate;
        }
        Action::AddGroup(group) => next.groups.push(group),
        Action::UpdateGroup(group) => {
            if let Some(slot) = next.groups.iter_mut().find(|g| g.id == group.id) {
                *slot = group;
            }
        }
        Action::DeleteGroup(id) => next.groups.retain(|g| g.id != id),
        Action::SetCourse(course) => return Ok(*course),
    }

    for (position, page) in next.pages.iter_mut().enumerate() {
        page.order = position;
    }
    next.updated_at = Utc::now();
    Ok(next)
}

fn ensure_new(course: &Course, id: &PageId) -> Result<(), CourseError> {
    match course.page(id) {
        Some(_) => Err(CourseError::DuplicatePage(id.clone())),
        None => Ok(()),
    }
}

fn ensure_permutation(current: &[Page], candidate: &[Page]) -> Result<(), CourseError> {
    let current_ids: HashSet<&PageId> = current.iter().map(|page| &page.id).collect();
    let candidate_ids: HashSet<&PageId> = candidate.iter().map(|page| &page.id).collect();

    if candidate.len() != current.len()
        || candidate_ids.len() != candidate.len()
        || candidate_ids != current_ids
    {
        return Err(CourseError::CandidateMismatch);
    }
    Ok(())
}

// group of a page that fills one of the group's roles
fn member_group(page: &Page) -> Option<GroupId> {
    page.role().and(page.config_group_id.clone())
}

fn ensure_group_intact(course: &Course, group: Option<GroupId>) -> Result<(), CourseError> {
    if let Some(group) = group {
        resolve_group(&course.pages, &group)?;
    }
    Ok(())
}

fn note_group_index(course: &mut Course, page: &Page) {
    if let Some(index) = page.group_index() {
        course.last_group_index = course.last_group_index.max(index);
    }
}

fn warn_orphans(course: &Course, removed: &Page) {
    let Some(group) = removed.config_group_id.as_ref() else {
        return;
    };
    let orphans = orphaned_pages(&course.pages)
        .into_iter()
        .filter(|orphan| orphan.group.as_ref() == Some(group))
        .count();
    if orphans > 0 {
        tracing::warn!(%group, page = %removed.id, orphans, "deleted page leaves group companions orphaned");
    }
}

/// Single owner of the course snapshot. Every mutation goes through `dispatch`.
#[derive(Debug, Default)]
pub struct CourseStore {
    course: Course,
}

impl CourseStore {
    pub fn new(course: Course) -> Self {
        Self { course }
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn into_course(self) -> Course {
        self.course
    }

    pub fn dispatch(&mut self, action: Action) -> Result<(), CourseError> {
        let name = action.name();
        tracing::debug!(action = name, "dispatch");

        match reduce(&self.course, action) {
            Ok(next) => {
                self.course = next;
                Ok(())
            }
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!(action = name, reason = %err, "action rejected");
                } else {
                    tracing::error!(action = name, error = %err, "action failed integrity checks");
                }
                Err(err)
            }
        }
    }

    /// Group number for the next diagnostic page. Never hands out a number twice,
    /// even after the page that held it is deleted.
    pub fn next_group_index(&self) -> u32 {
        next_group_index(&self.course.pages).max(self.course.last_group_index + 1)
    }

    /// Appends a diagnostic page that opens a new configuration group.
    pub fn add_diagnostic_page(
        &mut self,
        mut data: DiagnosticData,
    ) -> Result<(PageId, GroupId), CourseError> {
        let index = self.next_group_index();
        let group = GroupId::generate();
        data.group_index = index;

        let page = Page::new(
            group_label(GroupRole::Diagnostic, index),
            PageContent::Diagnostic(data),
        )
        .in_group(group.clone());
        let id = page.id.clone();

        self.dispatch(Action::AddPage(page))?;
        tracing::info!(%group, index, "created configuration group");
        Ok((id, group))
    }

    /// Adds the tiered-instruction page of a group right behind the group's last member.
    pub fn add_tiered_page(
        &mut self,
        group: &GroupId,
        data: TieredData,
    ) -> Result<PageId, CourseError> {
        let members = resolve_group(&self.course.pages, group)?;
        let diagnostic = members.diagnostic.ok_or_else(|| CourseError::MissingDiagnostic {
            group: group.clone(),
        })?;
        if members.tiered.is_some() {
            return Err(CourseError::DuplicateGroupMember {
                group: group.clone(),
                role: GroupRole::TieredInstruction,
            });
        }

        let index = diagnostic.group_index().unwrap_or_default();
        let after = self
            .course
            .pages
            .iter()
            .rev()
            .find(|page| page.config_group_id.as_ref() == Some(group))
            .map(|page| page.id.clone())
            .unwrap_or_else(|| diagnostic.id.clone());

        let page = Page::new(
            group_label(GroupRole::TieredInstruction, index),
            PageContent::TieredInstruction(data),
        )
        .in_group(group.clone());
        let id = page.id.clone();

        self.dispatch(Action::InsertPageAfter { page, after })?;
        Ok(id)
    }
}
