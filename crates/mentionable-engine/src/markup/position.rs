use crate::markup::mentions::{Mention, MentionIndex};

/// Which token edge a plain position snaps to when it falls strictly inside a
/// mention's display span and is therefore not representable in markup
/// coordinates without splitting the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Start,
    End,
}

impl MentionIndex {
    /// Converts a plain-text offset into a markup offset.
    ///
    /// Inside a literal run the conversion is a pure additive shift. Strictly
    /// inside a mention's display span the position snaps to the token's
    /// start or end according to `bias`; this is what lets a partial edit
    /// inside a mention collapse to a whole-mention operation. Exactly on a
    /// mention boundary the mapping is unambiguous and `bias` is ignored.
    ///
    /// Out-of-range offsets clamp to the nearest valid boundary.
    pub fn map_plain_to_markup(&self, plain_ix: usize, bias: Bias) -> usize {
        let plain_ix = plain_ix.min(self.plain_len());
        let mut shift = 0isize;

        for mention in self.mentions() {
            if plain_ix <= mention.plain_start {
                return (plain_ix as isize + shift) as usize;
            }
            if plain_ix < mention.plain_end {
                return match bias {
                    Bias::Start => mention.markup_start,
                    Bias::End => mention.markup_end,
                };
            }
            if plain_ix == mention.plain_end {
                return mention.markup_end;
            }
            shift = mention.markup_end as isize - mention.plain_end as isize;
        }
        (plain_ix as isize + shift) as usize
    }

    /// True iff the offset falls strictly inside some mention's display span.
    /// Boundaries are not "inside".
    pub fn is_inside_of_mention(&self, plain_ix: usize) -> bool {
        self.mention_at(plain_ix).is_some()
    }

    /// The mention whose span the caret has moved into or through as a result
    /// of a deletion ending at `caret_after_deletion` (an offset into the
    /// pre-deletion plain text), if any.
    ///
    /// Hosts use this to decide whether a deletion was widened to remove a
    /// whole mention, and to resynchronize the caret to the token boundary
    /// instead of the observed position.
    pub fn find_mention_touched_by_deletion(
        &self,
        caret_after_deletion: usize,
    ) -> Option<&Mention> {
        self.mention_at(caret_after_deletion)
    }

    /// The mention strictly containing `plain_ix`, if any.
    pub(crate) fn mention_at(&self, plain_ix: usize) -> Option<&Mention> {
        self.mentions()
            .iter()
            .find(|m| m.plain_start < plain_ix && plain_ix < m.plain_end)
    }
}

/// Clamps a byte offset into `s` down to the nearest char boundary at or
/// below it (and to `s.len()` at most).
pub(crate) fn floor_char_boundary(s: &str, ix: usize) -> usize {
    let mut ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// The char boundary immediately before `ix` (which must itself be a
/// boundary). Returns 0 at the start of the string.
pub(crate) fn prev_char_boundary(s: &str, ix: usize) -> usize {
    let mut ix = ix.min(s.len());
    loop {
        ix = ix.saturating_sub(1);
        if ix == 0 || s.is_char_boundary(ix) {
            return ix;
        }
    }
}
