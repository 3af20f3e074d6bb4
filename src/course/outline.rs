use anyhow::Context;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::group::GroupId;
use super::page::{Course, OutlineGroup, Page};

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum OutlineEntry<'a> {
    Title(&'a str),
    Count(usize),
    Pages(Vec<PageMeta<'a>>),
    Groups(Vec<GroupMeta<'a>>),
}

#[derive(Serialize, Debug)]
struct PageMeta<'a> {
    number: usize,
    id: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_group: Option<u32>,
}

#[derive(Serialize, Debug)]
struct GroupMeta<'a> {
    title: &'a str,
    collapsed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pages: Vec<&'a str>,
}

/// Renders the outline the navigation panel shows: visible pages only, numbered
/// from 1, with the group number of every configuration-group member.
pub fn render_outline(course: &Course) -> anyhow::Result<String> {
    let group_numbers: HashMap<&GroupId, u32> = course
        .pages
        .iter()
        .filter_map(|page| Some((page.config_group_id.as_ref()?, page.group_index()?)))
        .collect();

    let pages: Vec<PageMeta> = course
        .visible_pages()
        .enumerate()
        .map(|(position, page)| PageMeta {
            number: position + 1,
            id: page.id.as_str(),
            title: page.title.as_str(),
            kind: page.content.kind_name(),
            config_group: page
                .config_group_id
                .as_ref()
                .and_then(|group| group_numbers.get(group).copied()),
        })
        .collect();

    let groups: Vec<GroupMeta> = course
        .groups
        .iter()
        .map(|group| group_meta(group, &course.pages))
        .collect();

    let mut outline: BTreeMap<&str, OutlineEntry> = BTreeMap::new();
    outline.insert("title", OutlineEntry::Title(course.title.as_str()));
    outline.insert(
        "hidden_pages",
        OutlineEntry::Count(course.pages.len() - pages.len()),
    );
    outline.insert("pages", OutlineEntry::Pages(pages));
    if !groups.is_empty() {
        outline.insert("groups", OutlineEntry::Groups(groups));
    }

    Ok(format!(
        "---\n{}---\n",
        serde_yaml_ng::to_string(&outline).context("failed to serialize course outline")?
    ))
}

fn group_meta<'a>(group: &'a OutlineGroup, pages: &'a [Page]) -> GroupMeta<'a> {
    GroupMeta {
        title: group.title.as_str(),
        collapsed: group.collapsed,
        pages: group
            .pages
            .iter()
            .filter(|id| pages.iter().any(|page| &page.id == *id && page.is_visible()))
            .map(|id| id.as_str())
            .collect(),
    }
}
