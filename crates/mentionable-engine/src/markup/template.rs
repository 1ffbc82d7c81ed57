use regex::Regex;
use thiserror::Error;

/// Default markup form: a trigger-prefixed bracket/paren token, `@[display](id)`.
pub const DEFAULT_MARKUP: &str = "@[__display__](__id__)";

const DISPLAY_PLACEHOLDER: &str = "__display__";
const ID_PLACEHOLDER: &str = "__id__";
const TYPE_PLACEHOLDER: &str = "__type__";

#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template names no `__display__` slot, so generated tokens could
    /// never be rendered back to plain text. Fatal at compile time.
    #[error("markup template `{template}` contains no __display__ placeholder")]
    MissingDisplayPlaceholder { template: String },

    #[error("markup template `{template}` compiled to an invalid pattern: {source}")]
    Pattern {
        template: String,
        source: regex::Error,
    },
}

/// A named placeholder slot in a markup template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Display,
    Id,
    Type,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// A compiled markup template: an ordered sequence of literal segments
/// interleaved with placeholder slots, plus the scanning pattern derived from
/// them.
///
/// The slot order recorded at compile time is reused symmetrically: the
/// matcher's capture groups appear in slot order, and [`Template::generate`]
/// substitutes values in the same order. Compile once, reuse for every parse
/// and generation.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
    slots: Vec<Slot>,
    matcher: Regex,
}

impl Template {
    /// Compiles a template string such as `@[__display__](__id__)`.
    ///
    /// Literal segments are escaped for safe use inside the generated
    /// matching pattern; each placeholder becomes a lazy capture group.
    /// Fails if no `__display__` placeholder is present.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut slots = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            let next = [
                (DISPLAY_PLACEHOLDER, Slot::Display),
                (ID_PLACEHOLDER, Slot::Id),
                (TYPE_PLACEHOLDER, Slot::Type),
            ]
            .into_iter()
            .filter_map(|(marker, slot)| rest.find(marker).map(|at| (at, marker, slot)))
            .min_by_key(|(at, ..)| *at);

            match next {
                Some((at, marker, slot)) => {
                    if at > 0 {
                        segments.push(Segment::Literal(rest[..at].to_string()));
                    }
                    segments.push(Segment::Slot(slot));
                    slots.push(slot);
                    rest = &rest[at + marker.len()..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        if !slots.contains(&Slot::Display) {
            return Err(TemplateError::MissingDisplayPlaceholder {
                template: template.to_string(),
            });
        }

        let mut pattern = String::new();
        for segment in &segments {
            match segment {
                Segment::Literal(literal) => pattern.push_str(&regex::escape(literal)),
                Segment::Slot(_) => pattern.push_str("(.+?)"),
            }
        }
        let matcher = Regex::new(&pattern).map_err(|source| TemplateError::Pattern {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            segments,
            slots,
            matcher,
        })
    }

    /// Generates a markup token by substituting values into the template's
    /// placeholder slots, honoring the original slot order.
    ///
    /// A missing `kind` renders a `__type__` slot as empty; templates that
    /// carry a type slot are expected to be used with typed sources.
    pub fn generate(&self, id: &str, display: &str, kind: Option<&str>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => out.push_str(literal),
                Segment::Slot(Slot::Display) => out.push_str(display),
                Segment::Slot(Slot::Id) => out.push_str(id),
                Segment::Slot(Slot::Type) => out.push_str(kind.unwrap_or_default()),
            }
        }
        out
    }

    pub(crate) fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

impl Default for Template {
    fn default() -> Self {
        // DEFAULT_MARKUP is a valid template, so this cannot fail.
        match Self::compile(DEFAULT_MARKUP) {
            Ok(template) => template,
            Err(_) => unreachable!("default markup template must compile"),
        }
    }
}
