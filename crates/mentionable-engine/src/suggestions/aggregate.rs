use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single candidate offered by a provider. Providers may attach more data
/// on their side; the engine only needs the stable id and the display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub display: String,
}

impl Suggestion {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
        }
    }
}

/// A pending query: which source matched, what was typed, and where the
/// trigger-plus-query sequence sits in the plain text it was matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub source_type: String,
    pub query_text: String,
    pub sequence_start: usize,
    pub sequence_end: usize,
    pub plain_text: String,
}

/// Candidates of one source sharing a classifier-assigned group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionGroup {
    pub name: String,
    pub suggestions: Vec<Suggestion>,
}

/// The most recent accepted delivery for one source type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub query: Query,
    pub groups: Vec<SuggestionGroup>,
}

/// Groups candidates by a source-supplied classifier.
///
/// Groups are emitted in the source's declared group-name order; candidates
/// classified into undeclared groups follow in first-seen order rather than
/// being dropped. Within a group, delivery order is preserved.
pub fn group_candidates(
    candidates: Vec<Suggestion>,
    classify: &dyn Fn(&Suggestion) -> String,
    declared_order: &[String],
) -> Vec<SuggestionGroup> {
    let mut seen = Vec::new();
    let mut buckets: HashMap<String, Vec<Suggestion>> = HashMap::new();
    for suggestion in candidates {
        let name = classify(&suggestion);
        if !buckets.contains_key(&name) {
            seen.push(name.clone());
        }
        buckets.entry(name).or_default().push(suggestion);
    }

    let mut groups = Vec::new();
    for name in declared_order {
        if let Some(suggestions) = buckets.remove(name) {
            groups.push(SuggestionGroup {
                name: name.clone(),
                suggestions,
            });
        }
    }
    for name in seen {
        if let Some(suggestions) = buckets.remove(&name) {
            groups.push(SuggestionGroup { name, suggestions });
        }
    }
    groups
}

/// Generation-tagged suggestion state.
///
/// One instance per input; deliveries carry the generation they were issued
/// under and are silently discarded when it no longer matches, which is the
/// sole cancellation mechanism for in-flight providers. Within a generation
/// the aggregate grows monotonically as sources resolve independently.
///
/// Flattening, counting and focus all derive from one shared traversal
/// ([`SuggestionState::flattened`]) so the rendered order and the keyboard
/// navigation order cannot diverge.
#[derive(Debug, Default)]
pub struct SuggestionState {
    generation: u64,
    sets: HashMap<String, SuggestionSet>,
    focus_index: usize,
}

impl SuggestionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a caret-driven refresh: supersedes all in-flight queries and
    /// empties the aggregate. Returns the new generation to tag dispatched
    /// queries with.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.sets.clear();
        self.generation
    }

    /// Explicit clear: supersedes in-flight queries, empties the aggregate
    /// and resets keyboard focus.
    pub fn clear(&mut self) -> u64 {
        let generation = self.begin_refresh();
        self.focus_index = 0;
        generation
    }

    /// Accepts a delivery if its generation is still current, replacing any
    /// prior set for the same source type. Returns false for stale
    /// deliveries, which have no effect on displayed state.
    pub fn accept(
        &mut self,
        generation: u64,
        query: Query,
        groups: Vec<SuggestionGroup>,
        source_order: &[String],
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.sets.insert(query.source_type.clone(), SuggestionSet { query, groups });

        // An update may shrink the total below the focused index.
        let count = self.count(source_order);
        if self.focus_index >= count {
            self.focus_index = count.saturating_sub(1);
        }
        true
    }

    /// The one shared flattening traversal: sources in registration order,
    /// groups in emission order, candidates in delivery order. Yields the
    /// group name alongside each candidate so that rendering views derive
    /// from the same sequence as counting and keyboard focus.
    pub fn flattened<'a>(
        &'a self,
        source_order: &'a [String],
    ) -> impl Iterator<Item = (&'a Query, &'a str, &'a Suggestion)> + 'a {
        source_order
            .iter()
            .filter_map(|source_type| self.sets.get(source_type))
            .flat_map(|set| {
                set.groups.iter().flat_map(move |group| {
                    group
                        .suggestions
                        .iter()
                        .map(move |s| (&set.query, group.name.as_str(), s))
                })
            })
    }

    pub fn count(&self, source_order: &[String]) -> usize {
        self.flattened(source_order).count()
    }

    pub fn get<'a>(
        &'a self,
        source_order: &'a [String],
        index: usize,
    ) -> Option<(&'a Query, &'a Suggestion)> {
        self.flattened(source_order)
            .nth(index)
            .map(|(query, _, suggestion)| (query, suggestion))
    }

    pub fn focus_index(&self) -> usize {
        self.focus_index
    }

    pub fn focused<'a>(&'a self, source_order: &'a [String]) -> Option<(&'a Query, &'a Suggestion)> {
        self.get(source_order, self.focus_index)
    }

    /// Moves keyboard focus by `delta`, wrapping modulo the total count.
    pub fn shift_focus(&mut self, source_order: &[String], delta: isize) {
        let count = self.count(source_order);
        if count == 0 {
            self.focus_index = 0;
            return;
        }
        let count = count as isize;
        self.focus_index = (self.focus_index as isize + delta).rem_euclid(count) as usize;
    }
}
