use crate::cli::opts::*;
use crate::cli::presenter::{card_row, TerminalPresenter};

use anyhow::{anyhow, bail, Context, Result};
use cardwise_core::{
    filter_by_text, filters::due_cards, quiz_deck, review_card, review_due, scheduler, Collection,
    Deck, Flashcard, Presenter, SessionReport, SnapshotStore,
};
use cardwise_json::{paths, JsonStore};
use chrono::NaiveDate;
use rand::RngCore;
use std::path::Path;
use uuid::Uuid;

pub fn run_cli(args: Cli) -> Result<()> {
    let store = open_store(&args);
    let mut presenter = TerminalPresenter::stdio();
    let mut rng = rand::thread_rng();
    execute(args.cmd, &store, &mut presenter, &mut rng, scheduler::today())
}

pub fn open_store(args: &Cli) -> JsonStore {
    match &args.store {
        Some(path) => JsonStore::open_with(path.clone(), paths::backups_for(path), args.backups),
        None => {
            let (file, backups) = paths::default_store_file();
            JsonStore::open_with(file, backups, args.backups)
        }
    }
}

/// Loads the collection, runs one command and saves if it changed anything.
pub fn execute(
    cmd: Command,
    store: &dyn SnapshotStore,
    presenter: &mut dyn Presenter,
    rng: &mut dyn RngCore,
    today: NaiveDate,
) -> Result<()> {
    let mut collection = match store.load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "load failed, continuing with an empty collection");
            presenter.display_message(&format!("Failed to load data: {e}"));
            Collection::new()
        }
    };

    let changed = dispatch(cmd, &mut collection, presenter, rng, today)?;
    if changed {
        store.save(&collection).context("save failed")?;
    }
    Ok(())
}

fn dispatch(
    cmd: Command,
    col: &mut Collection,
    p: &mut dyn Presenter,
    rng: &mut dyn RngCore,
    today: NaiveDate,
) -> Result<bool> {
    match cmd {
        Command::Deck(cmd) => deck_cmd(col, p, cmd),
        Command::Card(cmd) => card_cmd(col, p, cmd),
        Command::Quiz { deck } => {
            let i = col.find_deck(&deck)?;
            let deck = col.deck_mut(i).ok_or_else(|| anyhow!("deck vanished"))?;
            let report = quiz_deck(deck, p, rng, today);
            Ok(report.reviewed() > 0)
        }
        Command::Review => {
            let report = review_due(col, p, today);
            Ok(report.reviewed() > 0)
        }
        Command::ReviewCard { deck, number } => {
            let i = col.find_deck(&deck)?;
            let deck = col.deck_mut(i).ok_or_else(|| anyhow!("deck vanished"))?;
            let name = deck.name().to_string();
            let idx = card_index(deck, number)?;
            let card = deck.card_mut(idx).ok_or_else(|| anyhow!("card vanished"))?;
            let report = review_card(card, Some(&name), p, today);
            report_single(p, &report);
            Ok(report.reviewed() > 0)
        }
        Command::Due => {
            list_due(col, p, today);
            Ok(false)
        }
        Command::Export(cmd) => {
            export_cmd(col, p, cmd)?;
            Ok(false)
        }
        Command::Import(cmd) => import_cmd(col, p, cmd),
    }
}

fn deck_cmd(col: &mut Collection, p: &mut dyn Presenter, cmd: DeckCmd) -> Result<bool> {
    match cmd {
        DeckCmd::Add { name } => {
            let Some(name) = name.or_else(|| p.prompt_deck_name(None)) else {
                return Ok(false);
            };
            let d = col.add_deck(&name)?;
            p.display_message(&d.id.to_string());
            Ok(true)
        }
        DeckCmd::List => {
            p.display_deck_list(col.decks());
            Ok(false)
        }
        DeckCmd::Rename { deck, name } => {
            let i = col.find_deck(&deck)?;
            let d = col.deck_mut(i).ok_or_else(|| anyhow!("deck vanished"))?;
            let Some(name) = name.or_else(|| p.prompt_deck_name(Some(d.name()))) else {
                return Ok(false);
            };
            d.rename(&name)?;
            Ok(true)
        }
        DeckCmd::Rm { deck, yes } => {
            let i = col.find_deck(&deck)?;
            let name = col.deck(i).map(|d| d.name().to_string()).unwrap_or_default();
            if !yes && !p.confirm(&format!("Delete deck '{name}'?")) {
                return Ok(false);
            }
            col.remove_deck(i)?;
            p.display_message("ok");
            Ok(true)
        }
    }
}

fn card_cmd(col: &mut Collection, p: &mut dyn Presenter, cmd: CardCmd) -> Result<bool> {
    match cmd {
        CardCmd::Add(a) => {
            let deck = resolve_deck_mut(col, &a.deck)?;
            let Some((prompt, answers)) = card_fields(p, a.prompt, a.answers) else {
                return Ok(false);
            };
            deck.add_card(Flashcard::new(&prompt, &answers)?);
            p.display_message(&format!("added card {}", deck.len()));
            Ok(true)
        }
        CardCmd::List { deck, query } => {
            let deck = col.deck(col.find_deck(&deck)?).ok_or_else(|| anyhow!("deck vanished"))?;
            match query {
                None => p.display_card_table(deck),
                Some(q) => {
                    for i in filter_by_text(deck, &q) {
                        if let Some(c) = deck.card(i) {
                            p.display_message(&card_row(i + 1, c));
                        }
                    }
                }
            }
            Ok(false)
        }
        CardCmd::Edit(e) => {
            let deck = resolve_deck_mut(col, &e.deck)?;
            let idx = card_index(deck, e.number)?;
            let fields = if e.prompt.is_none() && e.answers.is_none() {
                p.prompt_card_fields()
            } else {
                let old = deck.card(idx).ok_or_else(|| anyhow!("card vanished"))?;
                Some((
                    e.prompt.unwrap_or_else(|| old.prompt().to_string()),
                    e.answers.unwrap_or_else(|| old.raw_answers()),
                ))
            };
            let Some((prompt, answers)) = fields else {
                return Ok(false);
            };
            deck.replace_card(idx, Flashcard::new(&prompt, &answers)?)?;
            Ok(true)
        }
        CardCmd::Rm { deck, number, yes } => {
            let deck = resolve_deck_mut(col, &deck)?;
            let idx = card_index(deck, number)?;
            let prompt = deck.card(idx).map(|c| c.prompt().to_string()).unwrap_or_default();
            if !yes && !p.confirm(&format!("Delete card '{prompt}'?")) {
                return Ok(false);
            }
            deck.remove_card(idx)?;
            p.display_message("ok");
            Ok(true)
        }
    }
}

fn list_due(col: &Collection, p: &mut dyn Presenter, today: NaiveDate) {
    let groups = due_cards(col, today);
    if groups.is_empty() {
        p.display_message("No cards due today - nice!");
        return;
    }
    for g in groups {
        let Some(deck) = col.deck(g.deck_index) else { continue };
        p.display_message(&format!("[{}] {} due", deck.name(), g.card_indices.len()));
        for i in g.card_indices {
            if let Some(c) = deck.card(i) {
                p.display_message(&card_row(i + 1, c));
            }
        }
    }
}

fn report_single(p: &mut dyn Presenter, report: &SessionReport) {
    if let Some(o) = report.outcomes.first() {
        p.display_message(&format!("next review {} (in {} day(s))", o.next_review, o.interval_days));
    }
}

fn export_cmd(col: &Collection, p: &mut dyn Presenter, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path } => {
            let s = serde_json::to_string_pretty(col)?;
            std::fs::write(&path, s).with_context(|| format!("writing {}", path.display()))?;
            p.display_message(&format!("wrote {}", path.display()));
        }
        ExportCmd::Csv { path, deck } => {
            let decks: Vec<&Deck> = match deck {
                Some(sel) => vec![col.deck(col.find_deck(&sel)?).ok_or_else(|| anyhow!("deck vanished"))?],
                None => col.decks().iter().collect(),
            };
            write_csv(&path, &decks)?;
            p.display_message(&format!("wrote {}", path.display()));
        }
    }
    Ok(())
}

fn write_csv(path: &Path, decks: &[&Deck]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["deck", "prompt", "answers", "ease_factor", "repetitions", "interval_days", "next_review", "last_review"])?;
    for d in decks {
        for c in d.cards() {
            let s = &c.scheduling;
            wtr.write_record([
                d.name().to_string(),
                c.prompt().to_string(),
                c.raw_answers(),
                format!("{:.2}", s.ease_factor),
                s.repetitions.to_string(),
                s.interval_days.to_string(),
                s.next_review.to_string(),
                s.last_review.map(|d| d.to_string()).unwrap_or_default(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn import_cmd(col: &mut Collection, p: &mut dyn Presenter, cmd: ImportCmd) -> Result<bool> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let mut incoming: Collection = serde_json::from_str(&data)?;
            // imported decks are new decks, even when re-importing an export
            for d in incoming.decks_mut() {
                d.id = Uuid::new_v4();
            }
            let n = incoming.decks().len();
            col.merge(incoming);
            p.display_message(&format!("imported {n} deck(s)"));
            Ok(n > 0)
        }
        ImportCmd::Csv { path, deck } => {
            let target = deck.map(|sel| col.find_deck(&sel)).transpose()?;
            let mut rdr = csv::Reader::from_path(&path)?;
            let (mut added, mut skipped) = (0usize, 0usize);
            for (line, rec) in rdr.records().enumerate() {
                let rec = rec?;
                let deck_name = rec.get(0).unwrap_or("").trim();
                let prompt = rec.get(1).unwrap_or("");
                let answers = rec.get(2).unwrap_or("");
                let card = match Flashcard::new(prompt, answers) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(line = line + 2, error = %e, "skipping csv row");
                        skipped += 1;
                        continue;
                    }
                };
                let i = match target {
                    Some(i) => i,
                    None if deck_name.is_empty() => {
                        tracing::warn!(line = line + 2, "skipping csv row without deck");
                        skipped += 1;
                        continue;
                    }
                    None => ensure_deck_by_name(col, deck_name)?,
                };
                col.deck_mut(i).ok_or_else(|| anyhow!("deck vanished"))?.add_card(card);
                added += 1;
            }
            p.display_message(&format!("imported {added} card(s), skipped {skipped}"));
            Ok(added > 0)
        }
    }
}

// ===== Helpers =====
fn resolve_deck_mut<'a>(col: &'a mut Collection, sel: &str) -> Result<&'a mut Deck> {
    let i = col.find_deck(sel)?;
    col.deck_mut(i).ok_or_else(|| anyhow!("deck vanished"))
}

fn ensure_deck_by_name(col: &mut Collection, name: &str) -> Result<usize> {
    if let Ok(i) = col.find_deck(name) {
        return Ok(i);
    }
    col.add_deck(name)?;
    Ok(col.decks().len() - 1)
}

/// Card numbers are 1-based as displayed.
fn card_index(deck: &Deck, number: usize) -> Result<usize> {
    if number == 0 || number > deck.len() {
        bail!("no card #{number} in '{}' (has {})", deck.name(), deck.len());
    }
    Ok(number - 1)
}

fn card_fields(p: &mut dyn Presenter, prompt: Option<String>, answers: Option<String>) -> Option<(String, String)> {
    match (prompt, answers) {
        (Some(q), Some(a)) => Some((q, a)),
        _ => p.prompt_card_fields(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardwise_core::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    type Term = TerminalPresenter<Cursor<Vec<u8>>, Vec<u8>>;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    /// Runs `cmd` against `store` with scripted input; returns the output.
    fn run(store: &MemoryStore, cmd: Command, input: &str, today: NaiveDate) -> (Result<()>, String) {
        let mut p: Term = TerminalPresenter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let mut rng = StdRng::seed_from_u64(11);
        let res = execute(cmd, store, &mut p, &mut rng, today);
        (res, String::from_utf8(p.into_output()).unwrap())
    }

    fn seeded() -> MemoryStore {
        let mut col = Collection::new();
        let d = col.add_deck("Geo").unwrap();
        d.add_card(Flashcard::created_on("Capital of France?", "Paris", day(1)).unwrap());
        d.add_card(Flashcard::created_on("Capital of Peru?", "Lima", day(1)).unwrap());
        MemoryStore::with_collection(col)
    }

    fn add_card(deck: &str, prompt: &str, answers: &str) -> Command {
        Command::Card(CardCmd::Add(CardFields {
            deck: deck.into(),
            prompt: Some(prompt.into()),
            answers: Some(answers.into()),
        }))
    }

    #[test]
    fn deck_and_card_management_persist() {
        let store = MemoryStore::new();
        let (res, _) = run(&store, Command::Deck(DeckCmd::Add { name: None }), "Spanish\n", day(1));
        res.unwrap();
        run(&store, add_card("spanish", "hola", "hello, hi"), "", day(1)).0.unwrap();

        let col = store.snapshot().unwrap();
        assert_eq!(col.decks()[0].name(), "Spanish");
        assert_eq!(col.decks()[0].cards()[0].answers(), ["hello", "hi"]);

        let (_, out) = run(&store, Command::Card(CardCmd::List { deck: "Spanish".into(), query: None }), "", day(1));
        assert!(out.contains("1\thola\thello, hi\t"));

        run(&store, Command::Deck(DeckCmd::Rename { deck: "Spanish".into(), name: Some("Español".into()) }), "", day(1))
            .0
            .unwrap();
        assert_eq!(store.snapshot().unwrap().decks()[0].name(), "Español");
    }

    #[test]
    fn validation_errors_do_not_save() {
        let store = seeded();
        let (res, _) = run(&store, add_card("Geo", "  ", "x"), "", day(1));
        assert!(res.is_err());
        let (res, _) = run(&store, Command::Card(CardCmd::Rm { deck: "Geo".into(), number: 3, yes: true }), "", day(1));
        assert!(res.is_err());
        let (res, _) = run(&store, Command::Deck(DeckCmd::Add { name: Some(" ".into()) }), "", day(1));
        assert!(res.is_err());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn destructive_actions_need_confirmation() {
        let store = seeded();
        let rm = || Command::Deck(DeckCmd::Rm { deck: "geo".into(), yes: false });

        run(&store, rm(), "n\n", day(1)).0.unwrap();
        assert_eq!(store.save_count(), 0);

        run(&store, rm(), "yes\n", day(1)).0.unwrap();
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn review_updates_due_cards_and_saves() {
        let store = seeded();
        // first card cancelled, second answered and auto-rated
        let (res, out) = run(&store, Command::Review, ":q\nlima\n\n", day(1));
        res.unwrap();
        assert!(out.contains("[Geo] Q: Capital of France?"));
        assert!(out.contains("Correct!"));

        let col = store.snapshot().unwrap();
        let cards = col.decks()[0].cards();
        assert_eq!(cards[0].scheduling.last_review, None);
        assert_eq!(cards[1].scheduling.next_review, day(2));

        let (_, out) = run(&store, Command::Due, "", day(1));
        assert!(out.contains("[Geo] 1 due"));
        assert!(out.contains("1\tCapital of France?"));
    }

    #[test]
    fn cancelled_quiz_saves_nothing() {
        let store = seeded();
        let (res, out) = run(&store, Command::Quiz { deck: "Geo".into() }, "", day(1));
        res.unwrap();
        assert!(out.contains("Quiz over. Score: 0/2"));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn review_single_card_with_explicit_quality() {
        let store = seeded();
        let cmd = Command::ReviewCard { deck: "Geo".into(), number: 1 };
        let (res, out) = run(&store, cmd, "rome\n4\n", day(3));
        res.unwrap();
        assert!(out.contains("Wrong. Ans: Paris"));
        let snapshot = store.snapshot().unwrap();
        let card = &snapshot.decks()[0].cards()[0];
        assert_eq!(card.scheduling.repetitions, 1);
        assert_eq!(card.scheduling.next_review, day(4));
    }

    #[test]
    fn load_failure_starts_empty() {
        struct Broken;
        impl SnapshotStore for Broken {
            fn load(&self) -> Result<Collection, cardwise_core::CoreError> {
                Err(cardwise_core::CoreError::Storage("corrupt".into()))
            }
            fn save(&self, _: &Collection) -> Result<(), cardwise_core::CoreError> {
                Ok(())
            }
        }
        let mut p: Term = TerminalPresenter::new(Cursor::new(Vec::new()), Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        execute(Command::Deck(DeckCmd::List), &Broken, &mut p, &mut rng, day(1)).unwrap();
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Failed to load data"));
        assert!(out.contains("No decks yet."));
    }

    #[test]
    fn save_failure_is_reported() {
        let store = seeded();
        store.set_fail_saves(true);
        let (res, _) = run(&store, add_card("Geo", "Capital of Chile?", "Santiago"), "", day(1));
        assert!(res.is_err());
        assert_eq!(store.snapshot().unwrap().decks()[0].len(), 2);
    }

    #[test]
    fn csv_and_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("cards.csv");
        let json_path = dir.path().join("cards.json");
        let store = seeded();

        run(&store, Command::Export(ExportCmd::Csv { path: csv_path.clone(), deck: None }), "", day(1)).0.unwrap();
        run(&store, Command::Export(ExportCmd::Json { path: json_path.clone() }), "", day(1)).0.unwrap();

        let fresh = MemoryStore::new();
        let (res, out) = run(&fresh, Command::Import(ImportCmd::Csv { path: csv_path, deck: None }), "", day(1));
        res.unwrap();
        assert!(out.contains("imported 2 card(s), skipped 0"));
        let col = fresh.snapshot().unwrap();
        assert_eq!(col.decks().len(), 1);
        assert_eq!(col.decks()[0].name(), "Geo");
        assert_eq!(col.decks()[0].cards()[1].prompt(), "Capital of Peru?");

        run(&fresh, Command::Import(ImportCmd::Json { path: json_path }), "", day(1)).0.unwrap();
        let col = fresh.snapshot().unwrap();
        assert_eq!(col.decks().len(), 2);
        assert_ne!(col.decks()[0].id, col.decks()[1].id);
        assert_eq!(col.decks()[1].cards(), store.snapshot().unwrap().decks()[0].cards());
    }
}
