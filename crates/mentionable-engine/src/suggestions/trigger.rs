use std::fmt::Write as _;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("trigger pattern failed to compile: {0}")]
pub struct TriggerError(#[from] regex::Error);

/// How a source's autocomplete queries begin.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A fixed token such as `@` or `#`. The matching pattern is derived
    /// from it together with the source's `allow_space_in_query` flag.
    Literal(String),
    /// A caller-supplied pattern. It must expose two capture groups: the
    /// full sequence to be replaced on completion, and the query text, and
    /// it should stay anchored at the end of its input.
    Pattern(Regex),
}

impl Trigger {
    pub fn literal(token: impl Into<String>) -> Self {
        Self::Literal(token.into())
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::Literal("@".to_string())
    }
}

/// A pending query detected at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// The query text typed after the trigger token.
    pub query_text: String,
    /// Plain offset where the trigger-plus-query sequence begins.
    pub sequence_start: usize,
    /// Plain offset just past the query text (the caret).
    pub sequence_end: usize,
}

/// A source's trigger compiled to a matching pattern, built once at
/// registration and reused on every caret move.
#[derive(Debug, Clone)]
pub struct CompiledTrigger {
    regex: Regex,
}

impl CompiledTrigger {
    /// For a literal trigger the pattern requires start-of-string or
    /// whitespace, the trigger token, then query characters excluding
    /// whitespace (unless `allow_space_in_query`) and the trigger's own
    /// characters, anchored at the end of the input.
    pub fn new(trigger: &Trigger, allow_space_in_query: bool) -> Result<Self, TriggerError> {
        let regex = match trigger {
            Trigger::Literal(token) => {
                Regex::new(&literal_pattern(token, allow_space_in_query))?
            }
            Trigger::Pattern(regex) => regex.clone(),
        };
        Ok(Self { regex })
    }

    /// Matches an actively-being-typed query against the plain text up to
    /// the caret. A trigger token earlier in the text with no contiguous
    /// query at the end does not match.
    pub fn match_at_caret(&self, text_up_to_caret: &str) -> Option<TriggerMatch> {
        let caps = self.regex.captures(text_up_to_caret)?;
        let sequence = caps.get(1)?;
        let query = caps.get(2)?;
        Some(TriggerMatch {
            query_text: query.as_str().to_string(),
            sequence_start: sequence.start(),
            sequence_end: sequence.end(),
        })
    }
}

fn literal_pattern(token: &str, allow_space_in_query: bool) -> String {
    // Exclusion class: the trigger's own characters, plus whitespace unless
    // spaces are allowed inside queries. Hex escapes keep arbitrary trigger
    // characters safe inside the class.
    let mut class = String::new();
    if !allow_space_in_query {
        class.push_str(r"\s");
    }
    for c in token.chars() {
        let _ = write!(class, r"\x{{{:X}}}", c as u32);
    }
    format!(r"(?:^|\s)({}([^{}]*))$", regex::escape(token), class)
}
