use std::sync::{Arc, Mutex};

use crate::markup::change;
use crate::markup::mentions::{DisplayTransform, MentionIndex, plain_text};
use crate::markup::position::{floor_char_boundary, prev_char_boundary};
use crate::markup::template::Template;
use crate::suggestions::aggregate::{
    Query, Suggestion, SuggestionState, group_candidates,
};
use crate::suggestions::trigger::{CompiledTrigger, Trigger, TriggerError};

/// Source-supplied classifier assigning each candidate to a group name.
pub type GroupClassifier = Box<dyn Fn(&Suggestion) -> String + Send + Sync>;

/// Supplies candidates for a query. A provider may answer synchronously by
/// returning `Some(candidates)`, or asynchronously by returning `None` and
/// invoking the responder later, from any thread. There is no explicit
/// cancellation signal: a superseded responder's delivery is simply a no-op,
/// and a provider that never responds never contributes.
pub trait SuggestionProvider: Send + Sync {
    fn provide(&self, query: &str, responder: Responder) -> Option<Vec<Suggestion>>;
}

/// Synchronous provider over a fixed candidate list, filtering
/// case-insensitively by substring of the display text.
pub struct WordListProvider {
    entries: Vec<Suggestion>,
}

impl WordListProvider {
    pub fn new(entries: Vec<Suggestion>) -> Self {
        Self { entries }
    }
}

impl SuggestionProvider for WordListProvider {
    fn provide(&self, query: &str, _responder: Responder) -> Option<Vec<Suggestion>> {
        let needle = query.to_lowercase();
        Some(
            self.entries
                .iter()
                .filter(|s| s.display.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        )
    }
}

/// Configuration of one mention source, registered by value into the engine
/// at setup time.
pub struct SourceConfig {
    pub type_key: String,
    pub trigger: Trigger,
    pub allow_space_in_query: bool,
    pub append_space_on_add: bool,
    pub group_order: Vec<String>,
    pub group_by: GroupClassifier,
    pub provider: Arc<dyn SuggestionProvider>,
}

impl SourceConfig {
    /// A source with the default `@` trigger and a single `all` group.
    pub fn new(type_key: impl Into<String>, provider: Arc<dyn SuggestionProvider>) -> Self {
        Self {
            type_key: type_key.into(),
            trigger: Trigger::default(),
            allow_space_in_query: false,
            append_space_on_add: false,
            group_order: vec!["all".to_string()],
            group_by: Box::new(|_| "all".to_string()),
            provider,
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_allow_space_in_query(mut self, allow: bool) -> Self {
        self.allow_space_in_query = allow;
        self
    }

    pub fn with_append_space_on_add(mut self, append: bool) -> Self {
        self.append_space_on_add = append;
        self
    }

    pub fn with_grouping(
        mut self,
        group_order: Vec<String>,
        group_by: impl Fn(&Suggestion) -> String + Send + Sync + 'static,
    ) -> Self {
        self.group_order = group_order;
        self.group_by = Box::new(group_by);
        self
    }
}

struct SourceRuntime {
    config: SourceConfig,
    trigger: CompiledTrigger,
}

/// Generation-tagged delivery handle passed to providers.
///
/// Cloneable and sendable; a provider answering asynchronously keeps it and
/// calls [`Responder::deliver`] once results are available. Deliveries after
/// the engine has moved on (next caret move, explicit clear) are silently
/// discarded.
#[derive(Clone)]
pub struct Responder {
    state: Arc<Mutex<SuggestionState>>,
    source_order: Arc<Vec<String>>,
    source: Arc<SourceRuntime>,
    generation: u64,
    query: Query,
}

impl Responder {
    /// Groups and merges candidates into the aggregate. Returns whether the
    /// delivery was accepted (false when superseded).
    pub fn deliver(&self, candidates: Vec<Suggestion>) -> bool {
        let groups = group_candidates(
            candidates,
            &*self.source.config.group_by,
            &self.source.config.group_order,
        );
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        state.accept(self.generation, self.query.clone(), groups, &self.source_order)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// One mention-aware input instance: a compiled template, a display
/// transform, an explicit source registry, and generation-tagged suggestion
/// state.
///
/// Markup parsing, offset mapping and change application stay pure and
/// lock-free; only the suggestion aggregate sits behind a mutex so that
/// asynchronous provider deliveries from other threads merge safely.
pub struct MentionsEngine {
    template: Template,
    transform: Box<dyn Fn(&str, &str, Option<&str>) -> String + Send + Sync>,
    sources: Vec<Arc<SourceRuntime>>,
    source_order: Arc<Vec<String>>,
    state: Arc<Mutex<SuggestionState>>,
}

impl MentionsEngine {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            transform: Box::new(|_, display, _| display.to_string()),
            sources: Vec::new(),
            source_order: Arc::new(Vec::new()),
            state: Arc::new(Mutex::new(SuggestionState::new())),
        }
    }

    pub fn with_display_transform(
        mut self,
        transform: impl Fn(&str, &str, Option<&str>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    fn transform(&self) -> DisplayTransform<'_> {
        &*self.transform
    }

    /// Registers a source. Re-registering an existing `type_key` replaces the
    /// source in place, keeping its registration position so the flattening
    /// order stays stable.
    pub fn register_source(&mut self, config: SourceConfig) -> Result<(), TriggerError> {
        let trigger = CompiledTrigger::new(&config.trigger, config.allow_space_in_query)?;
        let runtime = Arc::new(SourceRuntime { config, trigger });
        match self
            .sources
            .iter_mut()
            .find(|s| s.config.type_key == runtime.config.type_key)
        {
            Some(existing) => *existing = runtime,
            None => self.sources.push(runtime),
        }
        self.source_order = Arc::new(
            self.sources
                .iter()
                .map(|s| s.config.type_key.clone())
                .collect(),
        );
        Ok(())
    }

    // ----- markup/plain collaborator surface -----

    pub fn plain_text(&self, markup: &str) -> String {
        plain_text(markup, &self.template, self.transform())
    }

    pub fn mention_index(&self, markup: &str) -> MentionIndex {
        MentionIndex::scan(markup, &self.template, self.transform())
    }

    pub fn apply_change(
        &self,
        old_markup: &str,
        new_plain: &str,
        selection: Option<(usize, usize)>,
        new_caret_end: usize,
    ) -> String {
        change::apply_change(
            old_markup,
            new_plain,
            selection,
            new_caret_end,
            &self.template,
            self.transform(),
        )
    }

    // ----- suggestion surface -----

    /// Caret-driven query refresh. Supersedes all in-flight queries, then
    /// matches every registered source's trigger against the plain text up
    /// to the caret and dispatches providers fire-and-forget.
    ///
    /// No query is issued while the caret sits strictly inside a mention or
    /// directly behind one.
    pub fn refresh(&self, markup: &str, plain: &str, caret: usize) {
        let generation = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.begin_refresh()
        };

        let caret = floor_char_boundary(plain, caret);
        let index = self.mention_index(markup);
        if index.is_inside_of_mention(caret) {
            return;
        }
        if caret > 0 && index.is_inside_of_mention(prev_char_boundary(plain, caret)) {
            return;
        }

        let substring = &plain[..caret];
        for source in &self.sources {
            let Some(matched) = source.trigger.match_at_caret(substring) else {
                continue;
            };
            let query = Query {
                source_type: source.config.type_key.clone(),
                query_text: matched.query_text.clone(),
                sequence_start: matched.sequence_start,
                sequence_end: matched.sequence_end,
                plain_text: plain.to_string(),
            };
            let responder = Responder {
                state: Arc::clone(&self.state),
                source_order: Arc::clone(&self.source_order),
                source: Arc::clone(source),
                generation,
                query,
            };
            if let Some(results) = source
                .config
                .provider
                .provide(&matched.query_text, responder.clone())
            {
                responder.deliver(results);
            }
        }
    }

    /// Selection-change entry point: a collapsed selection refreshes
    /// queries at the caret, a non-empty selection suppresses matching
    /// entirely.
    pub fn on_selection_change(
        &self,
        markup: &str,
        plain: &str,
        selection_start: usize,
        selection_end: usize,
    ) {
        if selection_start == selection_end {
            self.refresh(markup, plain, selection_end);
        } else {
            self.clear();
        }
    }

    /// Explicit clear: supersedes in-flight queries and resets focus.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.clear();
        }
    }

    pub fn suggestion_count(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.count(&self.source_order),
            Err(_) => 0,
        }
    }

    pub fn suggestion(&self, index: usize) -> Option<(Query, Suggestion)> {
        let state = self.state.lock().ok()?;
        state
            .get(&self.source_order, index)
            .map(|(q, s)| (q.clone(), s.clone()))
    }

    /// The flattened aggregate in navigation order: `(source type, group
    /// name, suggestion)` triples. Derived from the same traversal that
    /// drives counting and keyboard focus, so the rendered order and the
    /// navigation order cannot diverge.
    pub fn suggestion_view(&self) -> Vec<(String, String, Suggestion)> {
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        state
            .flattened(&self.source_order)
            .map(|(query, group, suggestion)| {
                (query.source_type.clone(), group.to_string(), suggestion.clone())
            })
            .collect()
    }

    pub fn focus_index(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.focus_index(),
            Err(_) => 0,
        }
    }

    pub fn focused(&self) -> Option<(Query, Suggestion)> {
        let state = self.state.lock().ok()?;
        state
            .focused(&self.source_order)
            .map(|(q, s)| (q.clone(), s.clone()))
    }

    pub fn shift_focus(&self, delta: isize) {
        if let Ok(mut state) = self.state.lock() {
            state.shift_focus(&self.source_order, delta);
        }
    }

    /// Completes the focused suggestion into the markup: splices the
    /// generated token over the query sequence, clears the aggregate and
    /// returns the new markup plus the plain-coordinate caret position.
    pub fn insert_focused(&self, markup: &str) -> Option<(String, usize)> {
        let (query, suggestion, append_space) = {
            let state = self.state.lock().ok()?;
            let (query, suggestion) = state.focused(&self.source_order)?;
            let source = self
                .sources
                .iter()
                .find(|s| s.config.type_key == query.source_type)?;
            (
                query.clone(),
                suggestion.clone(),
                source.config.append_space_on_add,
            )
        };

        let result = change::insert_mention(
            markup,
            query.sequence_start,
            query.sequence_end,
            &suggestion.id,
            &suggestion.display,
            Some(&query.source_type),
            append_space,
            &self.template,
            self.transform(),
        );
        self.clear();
        Some(result)
    }
}
