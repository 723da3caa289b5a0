use cardwise_core::{Collection, CoreError, Flashcard, SnapshotStore};
use cardwise_json::JsonStore;
use chrono::NaiveDate;
use std::fs;
use tempfile::tempdir;

fn sample() -> Collection {
    let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
    let mut col = Collection::new();
    {
        let geo = col.add_deck("Geography").unwrap();
        geo.add_card(Flashcard::created_on("Capital of France?", "Paris", start).unwrap());
        geo.add_card(Flashcard::created_on("Largest ocean?", "Pacific, the Pacific", start).unwrap());
        geo.card_mut(0).unwrap().apply_review_result(5, start);
        geo.card_mut(0).unwrap().apply_review_result(3, start);
        geo.card_mut(1).unwrap().apply_review_result(1, start);
    }
    {
        let math = col.add_deck("Geography").unwrap();
        math.add_card(Flashcard::created_on("2+2=?", "4", start).unwrap());
    }
    col
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempdir().unwrap();
    let store = JsonStore::open_with(dir.path().join("none.json"), dir.path().join("backups"), 3);
    assert!(store.load().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn save_then_load_reproduces_collection() {
    let dir = tempdir().unwrap();
    let store = JsonStore::open_with(dir.path().join("nested/cards.json"), dir.path().join("backups"), 3);
    let col = sample();

    store.save(&col).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, col);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["version"], 1);
    let card = &raw["decks"][0]["cards"][0];
    assert_eq!(card["prompt"], "Capital of France?");
    assert_eq!(card["answers"][0], "Paris");
    assert_eq!(card["scheduling"]["next_review"], "2024-03-05");
    assert_eq!(card["scheduling"]["last_review"], "2024-02-28");
    assert!(raw["decks"][1]["cards"][0]["scheduling"]["last_review"].is_null());
}

#[test]
fn unknown_version_and_garbage_are_storage_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cards.json");
    let store = JsonStore::open_with(path.clone(), dir.path().join("backups"), 3);

    fs::write(&path, r#"{"version": 99, "saved_at": "2024-01-01T00:00:00Z", "decks": []}"#).unwrap();
    assert!(matches!(store.load(), Err(CoreError::Storage(_))));

    fs::write(&path, "not json").unwrap();
    assert!(matches!(store.load(), Err(CoreError::Storage(_))));
}

#[test]
fn previous_snapshot_is_backed_up_and_rotated() {
    let dir = tempdir().unwrap();
    let backups = dir.path().join("backups");
    let store = JsonStore::open_with(dir.path().join("cards.json"), backups.clone(), 2);

    // a corrupt file must survive being replaced
    fs::write(store.path(), "corrupt").unwrap();
    let mut col = Collection::new();
    store.save(&col).unwrap();
    let kept: Vec<_> = fs::read_dir(&backups).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(fs::read_to_string(&kept[0]).unwrap(), "corrupt");

    for name in ["a", "b", "c"] {
        col.add_deck(name).unwrap();
        store.save(&col).unwrap();
    }
    assert_eq!(fs::read_dir(&backups).unwrap().count(), 2);
    assert_eq!(store.load().unwrap(), col);
}

fn write_snapshot(path: &std::path::Path, deck: &str) {
    let body = format!(r#"{{"version": 1, "saved_at": "2024-01-01T00:00:00Z", "decks": [{deck}]}}"#);
    fs::write(path, body).unwrap();
}

const GOOD_SCHEDULING: &str = r#"{"ease_factor": 2.5, "repetitions": 0, "interval_days": 0, "next_review": "2024-01-01", "last_review": null}"#;

#[test]
fn snapshot_with_invalid_cards_or_decks_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cards.json");
    let store = JsonStore::open_with(path.clone(), dir.path().join("backups"), 3);
    let id = "3f2b1c9e-8a1d-4c7e-9b52-0d6f7e8a9b10";

    let bad_decks = [
        format!(r#"{{"id": "{id}", "name": "  ", "cards": []}}"#),
        format!(r#"{{"id": "{id}", "name": "Geo", "cards": [{{"prompt": "", "answers": ["x"], "scheduling": {GOOD_SCHEDULING}}}]}}"#),
        format!(r#"{{"id": "{id}", "name": "Geo", "cards": [{{"prompt": "q", "answers": [], "scheduling": {GOOD_SCHEDULING}}}]}}"#),
        format!(r#"{{"id": "{id}", "name": "Geo", "cards": [{{"prompt": "q", "answers": [" ", ""], "scheduling": {GOOD_SCHEDULING}}}]}}"#),
        format!(
            r#"{{"id": "{id}", "name": "Geo", "cards": [{{"prompt": "q", "answers": ["x"], "scheduling": {}}}]}}"#,
            GOOD_SCHEDULING.replace("2.5", "0.2")
        ),
        format!(
            r#"{{"id": "{id}", "name": "Geo", "cards": [{{"prompt": "q", "answers": ["x"], "scheduling": {{"ease_factor": 2.5, "repetitions": 1, "interval_days": 1, "next_review": "2024-01-09", "last_review": "2024-01-01"}}}}]}}"#
        ),
    ];
    for deck in &bad_decks {
        write_snapshot(&path, deck);
        assert!(matches!(store.load(), Err(CoreError::Storage(_))), "accepted {deck}");
    }

    write_snapshot(
        &path,
        &format!(r#"{{"id": "{id}", "name": " Geo ", "cards": [{{"prompt": "q", "answers": [" x ", ""], "scheduling": {GOOD_SCHEDULING}}}]}}"#),
    );
    let col = store.load().unwrap();
    let deck = &col.decks()[0];
    assert_eq!(deck.name(), "Geo");
    assert_eq!(deck.cards()[0].answers(), ["x"]);
}
