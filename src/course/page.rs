use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::group::{GroupId, GroupRole};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh id of the form `<prefix>-<uuid>`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// page id, unique within the course and never reassigned
    pub id: PageId,

    /// display title
    pub title: String,

    /// display rank, mirrors the page's position in `Course::pages`
    #[serde(default)]
    pub order: usize,

    /// hidden pages keep their payload but drop out of the visible outline
    #[serde(default)]
    pub hidden: bool,

    /// configuration group, only meaningful for diagnostic, dialogue and tiered pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_group_id: Option<GroupId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<SlideElement>,

    /// page type together with its type-specific payload
    pub content: PageContent,
}

impl Page {
    pub fn new(title: impl Into<String>, content: PageContent) -> Self {
        Self {
            id: PageId::generate(content.kind_name()),
            title: title.into(),
            order: 0,
            hidden: false,
            config_group_id: None,
            elements: Vec::new(),
            content,
        }
    }

    pub fn with_id(mut self, id: impl Into<PageId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.config_group_id = Some(group);
        self
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Role this page plays inside a configuration group, if its type takes part in grouping.
    pub fn role(&self) -> Option<GroupRole> {
        match self.content {
            PageContent::Diagnostic(_) => Some(GroupRole::Diagnostic),
            PageContent::Dialogue(_) => Some(GroupRole::Dialogue),
            PageContent::TieredInstruction(_) => Some(GroupRole::TieredInstruction),
            _ => None,
        }
    }

    pub fn group_index(&self) -> Option<u32> {
        match &self.content {
            PageContent::Diagnostic(data) => Some(data.group_index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PageContent {
    Title,
    Image,
    Content,
    TextImage,
    ImageText,
    Choice,
    Qa,
    Vote,
    Photo,
    Fillblank,
    Sort,
    Whiteboard,
    Flashcard,
    Cocopi,
    Workspace,
    Web,
    App,
    Diagnostic(DiagnosticData),
    Dialogue(DialogueData),
    TieredInstruction(TieredData),
}

impl PageContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Image => "image",
            Self::Content => "content",
            Self::TextImage => "text-image",
            Self::ImageText => "image-text",
            Self::Choice => "choice",
            Self::Qa => "qa",
            Self::Vote => "vote",
            Self::Photo => "photo",
            Self::Fillblank => "fillblank",
            Self::Sort => "sort",
            Self::Whiteboard => "whiteboard",
            Self::Flashcard => "flashcard",
            Self::Cocopi => "cocopi",
            Self::Workspace => "workspace",
            Self::Web => "web",
            Self::App => "app",
            Self::Diagnostic(_) => "diagnostic",
            Self::Dialogue(_) => "dialogue",
            Self::TieredInstruction(_) => "tiered-instruction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Text,
    Image,
    Shape,
    Table,
}

// diagnostic test

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticData {
    pub questions: Vec<DiagnosisQuestion>,

    /// knowledge point names covered by the question set
    pub knowledge_points: Vec<String>,

    pub config: DiagnosisConfig,

    /// human-readable group number, assigned once when the group is created
    #[serde(default)]
    pub group_index: u32,
}

impl DiagnosticData {
    pub fn new(questions: Vec<DiagnosisQuestion>, config: DiagnosisConfig) -> Self {
        Self {
            questions,
            knowledge_points: config.knowledge_points.iter().map(|kp| kp.name.clone()).collect(),
            config,
            group_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisConfig {
    pub knowledge_points: Vec<KnowledgePoint>,
    pub student_levels: Vec<StudentLevel>,
    pub selected_difficulties: Vec<Difficulty>,
    pub question_counts: BTreeMap<Difficulty, u32>,
    #[serde(default)]
    pub conversation_enabled: bool,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            knowledge_points: Vec::new(),
            student_levels: StudentLevel::default_bands(),
            selected_difficulties: vec![Difficulty::Medium, Difficulty::Easy],
            question_counts: BTreeMap::from([
                (Difficulty::Hard, 2),
                (Difficulty::MediumHard, 2),
                (Difficulty::Medium, 3),
                (Difficulty::MediumEasy, 2),
                (Difficulty::Easy, 2),
            ]),
            conversation_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePoint {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentLevel {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub min_score: u32,
    pub max_score: u32,
    pub color_class: String,
}

impl StudentLevel {
    fn band(id: &str, name: &str, icon: &str, scores: (u32, u32), color_class: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            min_score: scores.0,
            max_score: scores.1,
            color_class: color_class.to_string(),
        }
    }

    /// The four score bands offered when a new diagnostic test is configured.
    pub fn default_bands() -> Vec<Self> {
        vec![
            Self::band("1", "融会贯通", "🌟", (80, 100), "emerald"),
            Self::band("2", "掌握良好", "✨", (60, 79), "teal"),
            Self::band("3", "有待提升", "💡", (40, 59), "amber"),
            Self::band("4", "基础薄弱", "🌱", (0, 39), "rose"),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Hard,
    MediumHard,
    Medium,
    MediumEasy,
    Easy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub knowledge_point: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Single,
    Multiple,
    Judge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

// dialogue diagnosis

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueData {
    pub config: DialogueConfig,

    /// diagnostic page this dialogue follows up on
    pub linked_diagnostic: PageId,
}

const DEFAULT_DIALOGUE_PROMPT: &str = "# 角色设定
你是一位专业的学科教师，正在与学生进行一对一的认知诊断对话。你的目标是通过自然的对话方式，深入了解学生对知识点的理解程度。

# 交流风格
- 使用亲切友好的语气
- 适当使用鼓励性语言
- 根据学生回答调整问题难度

# 对话引导规则
1. 从简单问题开始，逐步深入
2. 根据学生回答动态调整问题
3. 鼓励学生表达自己的思考过程
4. 适时总结和确认理解";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    pub ai_role: String,
    pub dialogue_style: DialogueStyle,
    pub scoring_preference: ScoringPreference,
    pub encouragement_style: EncouragementStyle,
    pub max_rounds: u32,
    #[serde(default)]
    pub special_focus: String,
    #[serde(default)]
    pub custom_prompt: String,
    #[serde(default)]
    pub advanced_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundConfig>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            ai_role: String::from("专业学科教师"),
            dialogue_style: DialogueStyle::Friendly,
            scoring_preference: ScoringPreference::Moderate,
            encouragement_style: EncouragementStyle::Moderate,
            max_rounds: 5,
            special_focus: String::new(),
            custom_prompt: DEFAULT_DIALOGUE_PROMPT.to_string(),
            advanced_mode: false,
            avatar: None,
            voice: None,
            background: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogueStyle {
    Formal,
    Friendly,
    Inspiring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPreference {
    Strict,
    Moderate,
    Encouraging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncouragementStyle {
    Brief,
    Moderate,
    Enthusiastic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub image_url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub voice_id: String,
    /// -100 to 100
    pub pitch: i32,
    /// 0 to 100
    pub volume: u32,
    /// playback rate, 0.5 to 2.0
    pub speed: f32,
    pub auto_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub image_url: String,
}

// tiered instruction

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredData {
    pub lesson_knowledge_points: Vec<KnowledgePoint>,

    /// bands copied from the group's diagnostic config, read-only here
    pub student_levels: Vec<StudentLevel>,

    /// one entry per student level
    pub levels: Vec<TieredLevelConfig>,
}

impl TieredData {
    /// Empty per-level configuration for every band of the diagnostic test.
    pub fn for_levels(knowledge_points: Vec<KnowledgePoint>, levels: &[StudentLevel]) -> Self {
        Self {
            lesson_knowledge_points: knowledge_points,
            student_levels: levels.to_vec(),
            levels: levels
                .iter()
                .map(|level| TieredLevelConfig {
                    level_id: level.id.clone(),
                    level_name: level.name.clone(),
                    level_icon: level.icon.clone(),
                    level_color: level.color_class.clone(),
                    learning_tasks: Vec::new(),
                    performance_levels: Vec::new(),
                    agent: TieredAgentConfig::default(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredLevelConfig {
    pub level_id: String,
    pub level_name: String,
    pub level_icon: String,
    pub level_color: String,
    pub learning_tasks: Vec<LearningTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performance_levels: Vec<PerformanceLevel>,
    pub agent: TieredAgentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningTask {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    /// weighted criteria the guidance agent evaluates this task against
    #[serde(default)]
    pub criteria: Vec<EvaluationCriterion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    pub id: String,
    pub name: String,
    pub description: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceLevel {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub min_score: u32,
    pub max_score: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredAgentConfig {
    pub name: String,
    pub role: String,
    pub avatar: String,
    pub guidance_style: GuidanceStyle,
    pub conversation_style: DialogueStyle,
    pub encouragement_style: EncouragementStyle,
    pub max_rounds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_prompt: Option<String>,
}

impl Default for TieredAgentConfig {
    fn default() -> Self {
        Self {
            name: String::from("学习助手"),
            role: String::from("分层教学引导员"),
            avatar: String::from("🤖"),
            guidance_style: GuidanceStyle::Scaffolding,
            conversation_style: DialogueStyle::Friendly,
            encouragement_style: EncouragementStyle::Moderate,
            max_rounds: 10,
            special_focus: None,
            advanced_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuidanceStyle {
    Direct,
    Scaffolding,
    Inquiry,
}

// course

/// Presentation-only grouping in the navigation panel, unrelated to configuration groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageId>,
    #[serde(default)]
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,

    /// position in this list is the page order
    pub pages: Vec<Page>,

    #[serde(default)]
    pub groups: Vec<OutlineGroup>,

    /// highest group index ever handed out, survives deletion of the page that held it
    #[serde(default)]
    pub last_group_index: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            pages: Vec::new(),
            groups: Vec::new(),
            last_group_index: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|page| &page.id == id)
    }

    pub fn position(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|page| &page.id == id)
    }

    pub fn visible_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|page| page.is_visible())
    }
}

impl Default for Course {
    fn default() -> Self {
        Self::new("新建课程")
    }
}
