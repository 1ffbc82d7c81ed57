use anyhow::{Context, Result, bail};
use mentionable_config::EngineConfig;
use mentionable_engine::{
    MentionIndex, MentionsEngine, SourceConfig, Suggestion, Template, Trigger, WordListProvider,
    display_unchanged, plain_text,
};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::{env, fs, process};

const USAGE: &str = "\
Usage: mentionable-cli [--template <markup>] <command> [args]

Commands:
  plain <file>                         print the plain rendering of a markup file
  mentions <file>                      print the mention table of a markup file
  apply <file> <new-plain> <sel-start> <sel-end> <caret>
                                       reconstruct markup from an observed plain edit
  suggest <config.toml> <file> <caret> match triggers at the caret and list suggestions

Use `-` as <file> to read markup from stdin.";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut template_str = None;
    if args.first().map(String::as_str) == Some("--template") {
        if args.len() < 2 {
            bail!("--template requires a value\n{USAGE}");
        }
        template_str = Some(args.remove(1));
        args.remove(0);
    }

    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    let template = match &template_str {
        Some(s) => Template::compile(s)?,
        None => Template::default(),
    };

    match command.as_str() {
        "plain" => {
            let markup = read_markup(args.get(1))?;
            println!("{}", plain_text(&markup, &template, &display_unchanged));
        }
        "mentions" => {
            let markup = read_markup(args.get(1))?;
            let index = MentionIndex::scan(&markup, &template, &display_unchanged);
            for mention in index.mentions() {
                println!(
                    "{}\t{}\t{}\tmarkup {}..{}\tplain {}..{}",
                    mention.id,
                    mention.display,
                    mention.kind.as_deref().unwrap_or("-"),
                    mention.markup_start,
                    mention.markup_end,
                    mention.plain_start,
                    mention.plain_end,
                );
            }
        }
        "apply" => {
            if args.len() < 6 {
                bail!("apply needs <file> <new-plain> <sel-start> <sel-end> <caret>\n{USAGE}");
            }
            let markup = read_markup(args.get(1))?;
            let new_plain = &args[2];
            let sel_start: usize = args[3].parse().context("sel-start must be an integer")?;
            let sel_end: usize = args[4].parse().context("sel-end must be an integer")?;
            let caret: usize = args[5].parse().context("caret must be an integer")?;

            let new_markup = mentionable_engine::apply_change(
                &markup,
                new_plain,
                Some((sel_start, sel_end)),
                caret,
                &template,
                &display_unchanged,
            );
            println!("{new_markup}");
        }
        "suggest" => {
            if args.len() < 4 {
                bail!("suggest needs <config.toml> <file> <caret>\n{USAGE}");
            }
            let config = EngineConfig::load_from_path(&args[1])?
                .with_context(|| format!("no config file at {}", args[1]))?;
            let markup = read_markup(args.get(2))?;
            let caret: usize = args[3].parse().context("caret must be an integer")?;

            let engine = build_engine(&config)?;
            let plain = engine.plain_text(&markup);
            engine.refresh(&markup, &plain, caret);

            let focus = engine.focus_index();
            for (i, (source_type, group, suggestion)) in
                engine.suggestion_view().into_iter().enumerate()
            {
                let marker = if i == focus { ">" } else { " " };
                println!(
                    "{marker} [{source_type}/{group}] {}\t{}",
                    suggestion.display, suggestion.id
                );
            }
        }
        other => bail!("unknown command `{other}`\n{USAGE}"),
    }

    Ok(())
}

fn read_markup(arg: Option<&String>) -> Result<String> {
    let Some(path) = arg else {
        bail!("missing <file> argument\n{USAGE}");
    };
    let mut markup = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read markup from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
    };
    // a trailing newline is an artifact of file storage, not of the value
    if markup.ends_with('\n') {
        markup.pop();
    }
    Ok(markup)
}

fn build_engine(config: &EngineConfig) -> Result<MentionsEngine> {
    let template = match &config.template {
        Some(s) => Template::compile(s)?,
        None => Template::default(),
    };
    let mut engine = MentionsEngine::new(template);

    for settings in &config.sources {
        let candidates = settings
            .candidates
            .iter()
            .map(|c| Suggestion::new(c.id.clone(), c.display.clone()))
            .collect();
        let mut source = SourceConfig::new(
            settings.type_key.clone(),
            Arc::new(WordListProvider::new(candidates)),
        )
        .with_trigger(Trigger::literal(settings.trigger.clone()))
        .with_allow_space_in_query(settings.allow_space_in_query)
        .with_append_space_on_add(settings.append_space_on_add);
        if !settings.group_order.is_empty() {
            let order = settings.group_order.clone();
            let default_group = order[0].clone();
            // candidates declare their group by id; ungrouped ones fall
            // into the first declared group
            let groups: HashMap<String, String> = settings
                .candidates
                .iter()
                .filter_map(|c| c.group.clone().map(|g| (c.id.clone(), g)))
                .collect();
            source = source.with_grouping(order, move |s: &Suggestion| {
                groups
                    .get(&s.id)
                    .cloned()
                    .unwrap_or_else(|| default_group.clone())
            });
        }
        engine.register_source(source)?;
    }
    Ok(engine)
}
