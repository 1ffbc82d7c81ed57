use crate::markup::mentions::{DisplayTransform, MentionIndex, plain_text};
use crate::markup::position::{Bias, floor_char_boundary};
use crate::markup::template::Template;

/// Reconstructs a new markup string from an observed plain-text edit.
///
/// The edit is recovered by longest-common-prefix/suffix diffing between the
/// old plain rendering and `new_plain`, clamped by the prior `selection`
/// (when known) so that repeated characters around the edit point do not
/// misplace the changed region; the prior selection is the authoritative
/// signal for where editing occurred. Without a selection the diff falls back
/// to pure prefix/suffix matching disambiguated by `new_caret_end`; that
/// fallback is best-effort for pathological repeated-character edits.
///
/// A removed range whose edge falls strictly inside a mention is widened
/// outward to the mention's full span: a partial touch always deletes the
/// whole token, so a mention can never be left with a truncated display text
/// still bound to its original id. Because of this widening the plain
/// rendering of the result may legitimately differ from `new_plain`; the
/// caller re-renders from the returned markup and resynchronizes the caret
/// via [`MentionIndex::find_mention_touched_by_deletion`].
///
/// Applying a no-op change returns `old_markup` unmodified.
pub fn apply_change(
    old_markup: &str,
    new_plain: &str,
    selection: Option<(usize, usize)>,
    new_caret_end: usize,
    template: &Template,
    transform: DisplayTransform,
) -> String {
    let old_plain = plain_text(old_markup, template, transform);
    if old_plain == new_plain {
        return old_markup.to_string();
    }

    let old_len = old_plain.len();
    let new_len = new_plain.len();

    let mut prefix = common_prefix(&old_plain, new_plain);
    let mut suffix = common_suffix(&old_plain, new_plain);

    match selection {
        Some((sel_start, sel_end)) => {
            let sel_start = floor_char_boundary(&old_plain, sel_start);
            let sel_end = floor_char_boundary(&old_plain, sel_end).max(sel_start);
            prefix = prefix.min(sel_start);
            suffix = suffix.min(old_len - sel_end);
        }
        None => {
            // No reliable selection bound: the observed caret marks the end
            // of the changed region in the new string.
            let caret = floor_char_boundary(new_plain, new_caret_end);
            suffix = suffix.min(new_len - caret);
        }
    }
    suffix = suffix.min(old_len.min(new_len) - prefix);

    let inserted = &new_plain[prefix..new_len - suffix];
    let mut removed_start = prefix;
    let mut removed_end = old_len - suffix;

    // A partial touch deletes the whole token.
    let index = MentionIndex::scan(old_markup, template, transform);
    if let Some(mention) = index.mention_at(removed_start) {
        removed_start = mention.plain_start;
    }
    if let Some(mention) = index.mention_at(removed_end) {
        removed_end = mention.plain_end;
    }

    let markup_start = index.map_plain_to_markup(removed_start, Bias::Start);
    let markup_end = index.map_plain_to_markup(removed_end, Bias::End);

    let mut out = String::with_capacity(old_markup.len() + inserted.len());
    out.push_str(&old_markup[..markup_start]);
    out.push_str(inserted);
    out.push_str(&old_markup[markup_end..]);
    out
}

/// Splices a generated mention token over the plain range
/// `[query_sequence_start, query_sequence_end)`, typically the trigger plus
/// query sequence being completed, and returns the new markup together with
/// the plain-coordinate caret position just after the inserted display text.
pub fn insert_mention(
    old_markup: &str,
    query_sequence_start: usize,
    query_sequence_end: usize,
    id: &str,
    display: &str,
    kind: Option<&str>,
    append_space: bool,
    template: &Template,
    transform: DisplayTransform,
) -> (String, usize) {
    let index = MentionIndex::scan(old_markup, template, transform);
    let query_sequence_end = query_sequence_end.max(query_sequence_start);
    let markup_start = index.map_plain_to_markup(query_sequence_start, Bias::Start);
    let markup_end = index.map_plain_to_markup(query_sequence_end, Bias::End);

    let mut token = template.generate(id, display, kind);
    if append_space {
        token.push(' ');
    }

    let mut out = String::with_capacity(old_markup.len() + token.len());
    out.push_str(&old_markup[..markup_start]);
    out.push_str(&token);
    out.push_str(&old_markup[markup_end..]);

    let mut caret = query_sequence_start + transform(id, display, kind).len();
    if append_space {
        caret += 1;
    }
    (out, caret)
}

fn common_prefix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

fn common_suffix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().rev().zip(b.chars().rev()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::mentions::display_unchanged;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn apply(
        old_markup: &str,
        new_plain: &str,
        selection: Option<(usize, usize)>,
        caret: usize,
    ) -> String {
        apply_change(
            old_markup,
            new_plain,
            selection,
            caret,
            &Template::default(),
            &display_unchanged,
        )
    }

    #[test]
    fn no_change_is_idempotent() {
        let markup = "Hi @[Alice](1)!";
        assert_eq!(apply(markup, "Hi Alice!", Some((4, 4)), 4), markup);
        assert_eq!(apply("", "", None, 0), "");
    }

    #[test]
    fn typing_in_literal_run() {
        // "Hi Alice!" -> "Hiya Alice!" typed at caret 2
        assert_eq!(
            apply("Hi @[Alice](1)!", "Hiya Alice!", Some((2, 2)), 4),
            "Hiya @[Alice](1)!"
        );
    }

    #[test]
    fn typing_after_mention() {
        assert_eq!(
            apply("Hi @[Alice](1)", "Hi Alice?", Some((8, 8)), 9),
            "Hi @[Alice](1)?"
        );
    }

    #[test]
    fn deleting_inside_mention_removes_whole_token() {
        // "Hi Alice!" -> "Hi Alce!": one char deleted from inside the display
        assert_eq!(
            apply("Hi @[Alice](1)!", "Hi Alce!", Some((5, 5)), 4),
            "Hi !"
        );
    }

    #[test]
    fn deleting_inside_mention_without_selection_hint() {
        assert_eq!(apply("Hi @[Alice](1)!", "Hi Alce!", None, 5), "Hi !");
    }

    #[test]
    fn backspacing_last_display_char_removes_whole_token() {
        // "Hi Alice!" -> "Hi Alic!" via backspace at 8
        assert_eq!(
            apply("Hi @[Alice](1)!", "Hi Alic!", Some((8, 8)), 7),
            "Hi !"
        );
    }

    #[test]
    fn selection_replacement_spanning_mention_edge() {
        // select "i Al" (plain 1..5) and type "x": both edges widen as needed
        assert_eq!(
            apply("Hi @[Alice](1)!", "Hx!", Some((1, 5)), 2),
            "Hx!"
        );
    }

    #[test]
    fn selection_replacement_in_literal_run() {
        // "Hi Alice!" select "Hi" (0..2), paste "Hey"
        assert_eq!(
            apply("Hi @[Alice](1)!", "Hey Alice!", Some((0, 2)), 3),
            "Hey @[Alice](1)!"
        );
    }

    #[test]
    fn repeated_characters_resolve_via_selection() {
        // plain "aaa" -> "aaaa": prefix/suffix matching alone is ambiguous,
        // the prior caret pins the insertion point.
        let markup = "aaa @[Alice](1)";
        let out = apply(markup, "aaaa Alice", Some((1, 1)), 2);
        assert_eq!(out, "aaaa @[Alice](1)");
    }

    #[test]
    fn deletion_spanning_multiple_mentions() {
        let markup = "@[Alice](1) and @[Bob](2)";
        // plain "Alice and Bob"; select from inside Alice to inside Bob, delete
        let out = apply(markup, "Alob", Some((2, 11)), 2);
        // both partially-touched mentions are removed atomically
        assert_eq!(out, "");
    }

    #[test]
    fn plain_rendering_differs_only_when_widened() {
        let markup = "Hi @[Alice](1)!";
        let out = apply(markup, "Hi Alce!", Some((5, 5)), 4);
        let template = Template::default();
        // the caller-observed plain text is NOT what the new markup renders to
        assert_eq!(plain_text(&out, &template, &display_unchanged), "Hi !");
        // and the host can resynchronize the caret from the old index
        let old_index = MentionIndex::scan(markup, &template, &display_unchanged);
        let touched = old_index.find_mention_touched_by_deletion(5).unwrap();
        assert_eq!(touched.plain_start, 3);
    }

    #[test]
    fn stale_selection_clamps_instead_of_panicking() {
        assert_eq!(
            apply("Hi @[Alice](1)", "Hi Alice?", Some((40, 90)), 9),
            "Hi @[Alice](1)?"
        );
    }

    #[test]
    fn everything_deleted() {
        assert_eq!(apply("Hi @[Alice](1)!", "", Some((0, 9)), 0), "");
    }

    #[rstest]
    #[case(false, "Hi @[Bob](7)", 6)]
    #[case(true, "Hi @[Bob](7) ", 7)]
    fn insert_mention_replaces_query_sequence(
        #[case] append_space: bool,
        #[case] expected_markup: &str,
        #[case] expected_caret: usize,
    ) {
        // markup "Hi @b", plain "Hi @b", query sequence "@b" at 3..5
        let (out, caret) = insert_mention(
            "Hi @b",
            3,
            5,
            "7",
            "Bob",
            None,
            append_space,
            &Template::default(),
            &display_unchanged,
        );
        assert_eq!(out, expected_markup);
        assert_eq!(caret, expected_caret);
    }

    #[test]
    fn insert_mention_single_char_query() {
        // bare trigger, empty query: the sequence is just "@" at 3..4
        let (out, caret) = insert_mention(
            "Hi @",
            3,
            4,
            "7",
            "Bob",
            None,
            false,
            &Template::default(),
            &display_unchanged,
        );
        assert_eq!(out, "Hi @[Bob](7)");
        assert_eq!(caret, 6);
    }

    #[test]
    fn insert_mention_between_existing_mentions() {
        let template = Template::default();
        let markup = "@[Alice](1) @x @[Bob](2)";
        // plain: "Alice @x Bob", query sequence "@x" at 6..8
        let (out, caret) = insert_mention(
            markup,
            6,
            8,
            "3",
            "Carol",
            None,
            false,
            &template,
            &display_unchanged,
        );
        assert_eq!(out, "@[Alice](1) @[Carol](3) @[Bob](2)");
        assert_eq!(caret, 11);
    }

    #[test]
    fn insert_mention_caret_reflects_display_transform() {
        let decorate = |_id: &str, display: &str, _kind: Option<&str>| format!("<{display}>");
        let (out, caret) = insert_mention(
            "Hi @b",
            3,
            5,
            "7",
            "Bob",
            None,
            false,
            &Template::default(),
            &decorate,
        );
        assert_eq!(out, "Hi @[Bob](7)");
        assert_eq!(caret, 3 + "<Bob>".len());
    }

    #[test]
    fn round_trip_after_apply_change() {
        let template = Template::default();
        let markup = "Hi @[Alice](1), hello";
        let out = apply(markup, "Hi Alice, hello world", Some((15, 15)), 21);

        let plain = plain_text(&out, &template, &display_unchanged);
        let index = MentionIndex::scan(&out, &template, &display_unchanged);
        for mention in index.mentions() {
            assert_eq!(&plain[mention.plain_start..mention.plain_end], mention.display);
        }
        assert_eq!(plain, "Hi Alice, hello world");
    }
}
