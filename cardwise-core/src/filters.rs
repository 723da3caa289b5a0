use crate::{Collection, Deck};
use chrono::NaiveDate;

/// Cards due in one deck, by index, in deck order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DueGroup {
    pub deck_index: usize,
    pub card_indices: Vec<usize>,
}

/// Due cards across the collection: deck order, then card order.
/// Decks with nothing due are left out.
pub fn due_cards(collection: &Collection, today: NaiveDate) -> Vec<DueGroup> {
    collection
        .decks()
        .iter()
        .enumerate()
        .filter_map(|(deck_index, deck)| {
            let card_indices = due_in_deck(deck, today);
            (!card_indices.is_empty()).then_some(DueGroup { deck_index, card_indices })
        })
        .collect()
}

pub fn due_in_deck(deck: &Deck, today: NaiveDate) -> Vec<usize> {
    deck.cards()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_due(today))
        .map(|(i, _)| i)
        .collect()
}

pub fn filter_by_text(deck: &Deck, query: &str) -> Vec<usize> {
    let q = query.trim().to_lowercase();
    deck.cards()
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            q.is_empty()
                || c.prompt().to_lowercase().contains(&q)
                || c.answers().iter().any(|a| a.to_lowercase().contains(&q))
        })
        .map(|(i, _)| i)
        .collect()
}
