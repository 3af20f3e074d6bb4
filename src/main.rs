use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;
use courseware::course::{
    render_outline, set_hidden, toggle_conversation_for_group, Action, Course, CourseError,
    CourseStore, GroupId, PageContent, PageId, SelectionChange, TieredData,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DEFAULT_LOG_FILTER: &str = "info";

pub struct Config {
    pub script: PathBuf,
    pub log_filter: String,
}

impl Config {
    pub fn new(script: PathBuf, log_filter: &str) -> Self {
        Self {
            script,
            log_filter: log_filter.to_string(),
        }
    }
}

fn parse_config(mut args: impl Iterator<Item = String>) -> anyhow::Result<Config> {
    let script = args
        .next()
        .context("script path is required, a YAML or JSON file listing the steps to apply")?;
    let log_filter = env::var("COURSEWARE_LOG").unwrap_or(DEFAULT_LOG_FILTER.to_string());

    Ok(Config::new(PathBuf::from(script), &log_filter))
}

#[derive(Deserialize, Debug)]
struct Script {
    #[serde(default)]
    title: Option<String>,
    steps: Vec<Step>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum Step {
    Dispatch(Action),
    Select(PageId),
    Hide(PageId),
    Unhide(PageId),
    Conversation { group: GroupId, enabled: bool },
    Tiered { group: GroupId },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = env::args().skip(1);

    let config = match parse_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Usage: courseware <script.yaml>");
            return Err(e);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let script = load_script(&config.script)
        .context(format!("failed to load script {}", config.script.display()))?;

    let mut store = CourseStore::new(match script.title {
        Some(title) => Course::new(title),
        None => Course::default(),
    });
    let mut selected: Option<PageId> = None;
    let mut rejected = 0;

    for (idx, step) in script.steps.into_iter().enumerate() {
        match apply_step(&mut store, step, selected.as_ref()) {
            Ok(SelectionChange::Keep) => {}
            Ok(SelectionChange::Select(id)) => selected = Some(id),
            Ok(SelectionChange::Clear) => selected = None,
            Err(e) if is_rejection(&e) => {
                rejected += 1;
                eprintln!("step {} rejected: {}", idx + 1, e);
            }
            Err(e) => return Err(e).context(format!("step {} failed", idx + 1)),
        }
    }

    let outline = render_outline(store.course()).context("failed to render outline")?;
    println!("{}", outline);
    println!(
        "applied {BOLD}{}{RESET} pages, {BOLD}{}{RESET} steps rejected",
        store.course().pages.len(),
        rejected
    );
    if let Some(id) = selected {
        println!("selected page {BOLD}{}{RESET}", id);
    }

    Ok(())
}

fn load_script(path: &Path) -> anyhow::Result<Script> {
    let raw = fs::read_to_string(path).context("failed to read script")?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");

    let script = if is_json {
        serde_json::from_str(&raw).context("script is not valid JSON")?
    } else {
        serde_yaml_ng::from_str(&raw).context("script is not valid YAML")?
    };
    Ok(script)
}

/// Steps the author can correct. An unknown page id is skipped like the reducer's
/// no-ops instead of stopping the script.
fn is_rejection(err: &CourseError) -> bool {
    err.is_recoverable() || matches!(err, CourseError::UnknownPage(_))
}

fn apply_step(
    store: &mut CourseStore,
    step: Step,
    selected: Option<&PageId>,
) -> Result<SelectionChange, CourseError> {
    match step {
        Step::Dispatch(action) => store.dispatch(action).map(|_| SelectionChange::Keep),
        Step::Select(id) => match store.course().page(&id) {
            Some(_) => Ok(SelectionChange::Select(id)),
            None => Err(CourseError::UnknownPage(id)),
        },
        Step::Hide(id) => set_hidden(store, &id, true, selected),
        Step::Unhide(id) => set_hidden(store, &id, false, selected),
        Step::Conversation { group, enabled } => {
            toggle_conversation_for_group(store, &group, enabled, selected)
        }
        Step::Tiered { group } => {
            let levels = store
                .course()
                .pages
                .iter()
                .filter(|page| page.config_group_id.as_ref() == Some(&group))
                .find_map(|page| match &page.content {
                    PageContent::Diagnostic(data) => Some((
                        data.config.knowledge_points.clone(),
                        data.config.student_levels.clone(),
                    )),
                    _ => None,
                });
            let (knowledge_points, bands) = levels.unwrap_or_default();
            let data = TieredData::for_levels(knowledge_points, &bands);
            store.add_tiered_page(&group, data).map(SelectionChange::Select)
        }
    }
}
