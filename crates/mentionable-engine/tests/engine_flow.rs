//! End-to-end exercise of the public engine surface: register sources, type,
//! navigate, complete, and edit across mention boundaries.

use std::sync::{Arc, Mutex};
use std::thread;

use mentionable_engine::{
    MentionIndex, MentionsEngine, Responder, SourceConfig, Suggestion, SuggestionProvider,
    Template, Trigger, WordListProvider, display_unchanged, plain_text,
};
use pretty_assertions::assert_eq;

fn user_source() -> SourceConfig {
    SourceConfig::new(
        "user",
        Arc::new(WordListProvider::new(vec![
            Suggestion::new("1", "alice"),
            Suggestion::new("2", "alan"),
            Suggestion::new("3", "bob"),
        ])),
    )
    .with_append_space_on_add(true)
}

#[test]
fn type_navigate_complete_and_edit() {
    let mut engine = MentionsEngine::new(Template::default());
    engine.register_source(user_source()).unwrap();

    // The user has typed "hey @al"; caret sits at the end.
    let markup = "hey @al".to_string();
    let plain = engine.plain_text(&markup);
    assert_eq!(plain, "hey @al");

    engine.on_selection_change(&markup, &plain, 7, 7);
    assert_eq!(engine.suggestion_count(), 2);

    // Arrow down once: alice -> alan; wrap back around to alice.
    engine.shift_focus(1);
    engine.shift_focus(1);
    assert_eq!(engine.focused().unwrap().1.display, "alice");

    // Complete the focused suggestion.
    let (markup, caret) = engine.insert_focused(&markup).unwrap();
    assert_eq!(markup, "hey @[alice](1) ");
    assert_eq!(caret, "hey alice ".len());
    assert_eq!(engine.suggestion_count(), 0);

    let plain = engine.plain_text(&markup);
    assert_eq!(plain, "hey alice ");

    // Keep typing after the mention.
    let new_plain = "hey alice ok";
    let markup = engine.apply_change(&markup, new_plain, Some((caret, caret)), 12);
    assert_eq!(markup, "hey @[alice](1) ok");

    // Now delete a character from inside the display text: the whole token
    // goes, not just the touched character.
    let markup = engine.apply_change(&markup, "hey alce ok", Some((7, 7)), 6);
    assert_eq!(markup, "hey  ok");
}

#[test]
fn round_trip_holds_for_engine_produced_markup() {
    let mut engine = MentionsEngine::new(Template::default());
    engine.register_source(user_source()).unwrap();

    let markup = "@al";
    engine.refresh(markup, "@al", 3);
    let (markup, _) = engine.insert_focused(markup).unwrap();

    let template = Template::default();
    let plain = plain_text(&markup, &template, &display_unchanged);
    let index = MentionIndex::scan(&markup, &template, &display_unchanged);
    for mention in index.mentions() {
        assert_eq!(
            &plain[mention.plain_start..mention.plain_end],
            mention.display
        );
    }
    assert_eq!(index.plain_len(), plain.len());
}

#[test]
fn late_async_delivery_after_caret_move_is_dropped() {
    struct Parked {
        responders: Mutex<Vec<Responder>>,
    }
    impl SuggestionProvider for Parked {
        fn provide(&self, _query: &str, responder: Responder) -> Option<Vec<Suggestion>> {
            if let Ok(mut parked) = self.responders.lock() {
                parked.push(responder);
            }
            None
        }
    }

    let parked = Arc::new(Parked {
        responders: Mutex::new(Vec::new()),
    });
    let mut engine = MentionsEngine::new(Template::default());
    engine
        .register_source(SourceConfig::new(
            "user",
            Arc::clone(&parked) as Arc<dyn SuggestionProvider>,
        ))
        .unwrap();

    engine.refresh("@a", "@a", 2);
    engine.refresh("@ab", "@ab", 3); // caret moved, first query superseded

    let responders: Vec<Responder> = match parked.responders.lock() {
        Ok(mut r) => r.drain(..).collect(),
        Err(_) => Vec::new(),
    };
    assert_eq!(responders.len(), 2);

    // resolve out of order, from worker threads
    let stale = responders[0].clone();
    let current = responders[1].clone();
    let handle = thread::spawn(move || {
        let stale_accepted = stale.deliver(vec![Suggestion::new("9", "old")]);
        let current_accepted = current.deliver(vec![Suggestion::new("1", "new")]);
        (stale_accepted, current_accepted)
    });
    let (stale_accepted, current_accepted) = handle.join().unwrap();

    assert!(!stale_accepted);
    assert!(current_accepted);
    assert_eq!(engine.suggestion_count(), 1);
    assert_eq!(engine.suggestion(0).unwrap().1.display, "new");
}

#[test]
fn two_sources_with_distinct_triggers() {
    let mut engine = MentionsEngine::new(Template::default());
    engine.register_source(user_source()).unwrap();
    engine
        .register_source(
            SourceConfig::new(
                "channel",
                Arc::new(WordListProvider::new(vec![
                    Suggestion::new("c1", "general"),
                    Suggestion::new("c2", "games"),
                ])),
            )
            .with_trigger(Trigger::literal("#")),
        )
        .unwrap();

    engine.refresh("go #ga", "go #ga", 6);
    assert_eq!(engine.suggestion_count(), 1);
    assert_eq!(engine.suggestion(0).unwrap().1.display, "games");

    engine.refresh("go @a", "go @a", 5);
    assert_eq!(engine.suggestion_count(), 2);
}
