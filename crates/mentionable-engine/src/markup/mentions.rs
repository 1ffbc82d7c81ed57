use regex::Captures;
use serde::{Deserialize, Serialize};

use crate::markup::template::{Slot, Template};

/// Hook for customizing how a mention renders into plain text, given
/// `(id, display, kind)`. The default, [`display_unchanged`], returns the
/// display text as-is.
pub type DisplayTransform<'a> = &'a dyn Fn(&str, &str, Option<&str>) -> String;

/// The default display transform: the display text, unchanged.
pub fn display_unchanged(_id: &str, display: &str, _kind: Option<&str>) -> String {
    display.to_string()
}

/// A mention extracted from a markup string: a stable `(id, display, kind)`
/// binding anchored at half-open byte ranges in both coordinate spaces.
///
/// Mentions are derived, never mutated; re-scan the markup to recompute them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub display: String,
    pub kind: Option<String>,
    pub markup_start: usize,
    pub markup_end: usize,
    pub plain_start: usize,
    pub plain_end: usize,
}

/// Ordered, non-overlapping mentions of one markup string, plus the total
/// lengths of both coordinate spaces.
///
/// Invariants: mentions are strictly ordered in both spaces simultaneously;
/// `plain_end - plain_start` equals the rendered display length and
/// `markup_end - markup_start` equals the token length.
#[derive(Debug, Clone)]
pub struct MentionIndex {
    mentions: Vec<Mention>,
    markup_len: usize,
    plain_len: usize,
}

impl MentionIndex {
    /// Scans a markup string left to right, advancing strictly past each
    /// token (no overlap, no backtracking), so runtime is linear in markup
    /// length.
    ///
    /// Plain offsets are computed from a running delta of markup bytes
    /// consumed minus plain bytes produced; the delta changes only across
    /// mention tokens, never across literal segments.
    pub fn scan(markup: &str, template: &Template, transform: DisplayTransform) -> Self {
        let mut mentions = Vec::new();
        // markup bytes consumed so far minus plain bytes produced so far
        let mut delta = 0isize;

        for caps in template.matcher().captures_iter(markup) {
            let Some((full, values)) = slot_values(&caps, template) else {
                continue;
            };
            let rendered = transform(values.id, values.display, values.kind);

            let markup_start = full.start();
            let markup_end = full.end();
            let plain_start = (markup_start as isize - delta) as usize;
            let plain_end = plain_start + rendered.len();
            delta += (markup_end - markup_start) as isize - rendered.len() as isize;

            mentions.push(Mention {
                id: values.id.to_string(),
                display: values.display.to_string(),
                kind: values.kind.map(str::to_string),
                markup_start,
                markup_end,
                plain_start,
                plain_end,
            });
        }

        let markup_len = markup.len();
        let plain_len = (markup_len as isize - delta) as usize;
        Self {
            mentions,
            markup_len,
            plain_len,
        }
    }

    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    pub fn markup_len(&self) -> usize {
        self.markup_len
    }

    pub fn plain_len(&self) -> usize {
        self.plain_len
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

/// Renders a markup string to plain text: literal segments are concatenated
/// verbatim and each mention token is replaced by the transformed display
/// text.
///
/// The output agrees byte-for-byte with the `plain_start`/`plain_end`
/// bookkeeping of [`MentionIndex::scan`] over the same markup.
pub fn plain_text(markup: &str, template: &Template, transform: DisplayTransform) -> String {
    let mut out = String::new();
    let mut tail = 0;

    for caps in template.matcher().captures_iter(markup) {
        let Some((full, values)) = slot_values(&caps, template) else {
            continue;
        };
        out.push_str(&markup[tail..full.start()]);
        out.push_str(&transform(values.id, values.display, values.kind));
        tail = full.end();
    }
    out.push_str(&markup[tail..]);
    out
}

struct SlotValues<'t> {
    id: &'t str,
    display: &'t str,
    kind: Option<&'t str>,
}

/// Pulls the slot values out of one token match, pairing capture groups with
/// the template's recorded slot order. When the template has no `id` slot the
/// id falls back to the display text.
fn slot_values<'t>(
    caps: &Captures<'t>,
    template: &Template,
) -> Option<(regex::Match<'t>, SlotValues<'t>)> {
    let full = caps.get(0)?;

    let mut display = None;
    let mut id = None;
    let mut kind = None;
    for (group, slot) in template.slots().iter().enumerate() {
        let Some(value) = caps.get(group + 1) else {
            continue;
        };
        match slot {
            Slot::Display => {
                display.get_or_insert(value.as_str());
            }
            Slot::Id => {
                id.get_or_insert(value.as_str());
            }
            Slot::Type => {
                kind.get_or_insert(value.as_str());
            }
        }
    }

    let display = display?;
    Some((
        full,
        SlotValues {
            id: id.unwrap_or(display),
            display,
            kind,
        },
    ))
}
