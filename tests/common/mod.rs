#![allow(dead_code)]

use courseware::course::{
    Action, CourseStore, DiagnosisConfig, DiagnosticData, DialogueConfig, DialogueData, Page,
    PageContent, TieredData,
};

pub fn content(id: &str) -> Page {
    Page::new(id, PageContent::Content).with_id(id)
}

pub fn diagnostic(id: &str, group: &str) -> Page {
    let data = DiagnosticData::new(vec![], DiagnosisConfig::default());
    Page::new(id, PageContent::Diagnostic(data))
        .with_id(id)
        .in_group(group.into())
}

pub fn dialogue(id: &str, group: &str, linked: &str) -> Page {
    let data = DialogueData {
        config: DialogueConfig::default(),
        linked_diagnostic: linked.into(),
    };
    Page::new(id, PageContent::Dialogue(data))
        .with_id(id)
        .in_group(group.into())
}

pub fn tiered(id: &str, group: &str) -> Page {
    Page::new(id, PageContent::TieredInstruction(TieredData::for_levels(vec![], &[])))
        .with_id(id)
        .in_group(group.into())
}

pub fn store_with(pages: Vec<Page>) -> CourseStore {
    let mut store = CourseStore::default();
    for page in pages {
        store
            .dispatch(Action::AddPage(page))
            .expect("fixture page is added");
    }
    store
}

pub fn ids(store: &CourseStore) -> Vec<String> {
    store
        .course()
        .pages
        .iter()
        .map(|page| page.id.to_string())
        .collect()
}

/// Pages of the store, rearranged to follow `order`.
pub fn arranged(store: &CourseStore, order: &[&str]) -> Vec<Page> {
    order
        .iter()
        .map(|id| {
            store
                .course()
                .page(&(*id).into())
                .cloned()
                .expect("page exists in the store")
        })
        .collect()
}
