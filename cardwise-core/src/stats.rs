use crate::Deck;
use chrono::NaiveDate;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeckSummary {
    pub cards: usize,
    pub due: usize,
    pub new: usize,
    pub mean_ease: f64,
}

pub fn summarize_deck(deck: &Deck, today: NaiveDate) -> DeckSummary {
    let mut summary = DeckSummary::default();
    let mut ease_total = 0.0;
    for c in deck.cards() {
        summary.cards += 1;
        ease_total += c.scheduling.ease_factor;
        if c.is_due(today) {
            summary.due += 1;
        }
        if c.scheduling.is_new() {
            summary.new += 1;
        }
    }
    if summary.cards > 0 {
        summary.mean_ease = ease_total / summary.cards as f64;
    }
    summary
}
