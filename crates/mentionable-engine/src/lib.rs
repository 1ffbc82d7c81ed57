pub mod markup;
pub mod suggestions;

// Re-export key types for easier usage
pub use markup::change::{apply_change, insert_mention};
pub use markup::mentions::{DisplayTransform, Mention, MentionIndex, display_unchanged, plain_text};
pub use markup::position::Bias;
pub use markup::template::{DEFAULT_MARKUP, Template, TemplateError};
pub use suggestions::aggregate::{
    Query, Suggestion, SuggestionGroup, SuggestionSet, SuggestionState, group_candidates,
};
pub use suggestions::engine::{
    MentionsEngine, Responder, SourceConfig, SuggestionProvider, WordListProvider,
};
pub use suggestions::trigger::{CompiledTrigger, Trigger, TriggerError, TriggerMatch};
