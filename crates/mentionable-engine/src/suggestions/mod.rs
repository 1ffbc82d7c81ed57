/*!
 * # Suggestions Module
 *
 * Trigger matching and suggestion aggregation over the plain coordinate
 * space established by [`crate::markup`].
 *
 * - **`trigger`**: per-source detection of an actively-typed query at the
 *   caret
 * - **`aggregate`**: generation-tagged suggestion state, with grouping,
 *   flattening, counting and keyboard focus derived from one shared
 *   traversal
 * - **`engine`**: the [`MentionsEngine`](engine::MentionsEngine) façade
 *   tying a compiled template, an explicit source registry and the
 *   aggregate together; providers answer synchronously or asynchronously
 *   and stale deliveries are discarded by generation
 */

pub mod aggregate;
pub mod engine;
pub mod trigger;

pub use aggregate::{Query, Suggestion, SuggestionGroup, SuggestionSet, SuggestionState};
pub use engine::{MentionsEngine, Responder, SourceConfig, SuggestionProvider, WordListProvider};
pub use trigger::{CompiledTrigger, Trigger, TriggerError, TriggerMatch};
