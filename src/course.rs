mod error;
mod group;
mod order;
mod outline;
mod page;
mod store;
mod visibility;

pub use error::{CourseError, OrderViolation};
pub use group::{
    group_label, next_group_index, orphaned_pages, resolve_group, GroupId, GroupMembers,
    GroupRole, Orphan, OrphanReason,
};
pub use order::validate;
pub use outline::render_outline;
pub use page::{
    Answer, AvatarConfig, BackgroundConfig, Course, DiagnosisConfig, DiagnosisQuestion,
    DiagnosticData, DialogueConfig, DialogueData, DialogueStyle, Difficulty, ElementKind,
    EncouragementStyle, EvaluationCriterion, GuidanceStyle, KnowledgePoint, LearningTask,
    OutlineGroup, Page, PageContent, PageId, PerformanceLevel, QuestionKind, ScoringPreference,
    SlideElement, StudentLevel, TieredAgentConfig, TieredData, TieredLevelConfig, VoiceConfig,
};
pub use store::{reduce, Action, CourseStore};
pub use visibility::{
    hide, set_hidden, toggle_conversation_for_group, unhide, Hidden, SelectionChange,
};
