//! Review sessions: sequencing cards, scoring answers and feeding quality
//! ratings into the scheduler.
//!
//! All user interaction goes through [`Presenter`]. A `None` from any
//! prompt means the user cancelled (or gave nothing); it is never an error.

use crate::{filters, Collection, Deck, Flashcard};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

pub const AUTO_QUALITY_CORRECT: i32 = 5;
pub const AUTO_QUALITY_WRONG: i32 = 2;

/// What the core needs from whatever is showing things to the user.
pub trait Presenter {
    /// Asks for a deck name, pre-filled with `current` when renaming.
    fn prompt_deck_name(&mut self, current: Option<&str>) -> Option<String>;
    /// Asks for `(prompt, comma-separated answers)`.
    fn prompt_card_fields(&mut self) -> Option<(String, String)>;
    fn prompt_answer(&mut self, deck: Option<&str>, prompt: &str) -> Option<String>;
    /// `None` when no usable rating was given.
    fn prompt_quality(&mut self) -> Option<i32>;
    fn confirm(&mut self, description: &str) -> bool;
    fn display_message(&mut self, text: &str);
    fn display_card_table(&mut self, deck: &Deck);
    fn display_deck_list(&mut self, decks: &[Deck]);
}

/// Lenient rating parse: blank or non-numeric text gives `None`.
/// Out-of-range numbers pass through; the scheduler clamps them.
pub fn parse_quality(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

pub fn resolve_quality(explicit: Option<i32>, correct: bool) -> i32 {
    explicit.unwrap_or(if correct { AUTO_QUALITY_CORRECT } else { AUTO_QUALITY_WRONG })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewOutcome {
    pub deck: Option<String>,
    pub prompt: String,
    pub correct: bool,
    pub quality: i32,
    pub interval_days: u32,
    pub next_review: NaiveDate,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionReport {
    /// Cards eligible for the session.
    pub total: usize,
    /// Cards whose prompt was shown, including cancelled ones.
    pub presented: usize,
    pub correct: usize,
    pub cancelled: bool,
    pub outcomes: Vec<ReviewOutcome>,
}

impl SessionReport {
    pub fn reviewed(&self) -> usize {
        self.outcomes.len()
    }

    fn record(&mut self, outcome: ReviewOutcome) {
        if outcome.correct {
            self.correct += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Presents one card and records the review. `None` if the answer prompt
/// was cancelled, in which case scheduling is untouched.
fn present<P: Presenter + ?Sized>(
    card: &mut Flashcard,
    deck: Option<&str>,
    presenter: &mut P,
    today: NaiveDate,
) -> Option<ReviewOutcome> {
    let answer = presenter.prompt_answer(deck, card.prompt())?;
    let correct = card.check_answer(Some(&answer));
    if correct {
        presenter.display_message("Correct!");
    } else {
        presenter.display_message(&format!("Wrong. Ans: {}", card.raw_answers()));
    }
    let quality = resolve_quality(presenter.prompt_quality(), correct);
    card.apply_review_result(quality, today);
    Some(ReviewOutcome {
        deck: deck.map(str::to_string),
        prompt: card.prompt().to_string(),
        correct,
        quality,
        interval_days: card.scheduling.interval_days,
        next_review: card.scheduling.next_review,
    })
}

/// Quizzes every card of `deck` once in shuffled order. Cancelling an
/// answer ends the quiz; that card is not recorded.
pub fn quiz_deck<P, R>(deck: &mut Deck, presenter: &mut P, rng: &mut R, today: NaiveDate) -> SessionReport
where
    P: Presenter + ?Sized,
    R: Rng + ?Sized,
{
    let mut report = SessionReport { total: deck.len(), ..Default::default() };
    if deck.is_empty() {
        presenter.display_message("Deck empty.");
        return report;
    }

    let mut order: Vec<usize> = (0..deck.len()).collect();
    order.shuffle(rng);

    for i in order {
        report.presented += 1;
        let Some(card) = deck.card_mut(i) else { continue };
        match present(card, None, presenter, today) {
            Some(outcome) => report.record(outcome),
            None => {
                report.cancelled = true;
                break;
            }
        }
    }

    tracing::info!(deck = deck.name(), correct = report.correct, total = report.total, "quiz finished");
    presenter.display_message(&format!("Quiz over. Score: {}/{}", report.correct, report.total));
    report
}

/// Reviews every card due on `today`, deck by deck. Cancelling an answer
/// skips only that card.
pub fn review_due<P>(collection: &mut Collection, presenter: &mut P, today: NaiveDate) -> SessionReport
where
    P: Presenter + ?Sized,
{
    let groups = filters::due_cards(collection, today);
    let mut report = SessionReport {
        total: groups.iter().map(|g| g.card_indices.len()).sum(),
        ..Default::default()
    };
    if groups.is_empty() {
        presenter.display_message("No cards due today - nice!");
        return report;
    }

    for group in groups {
        let Some(deck) = collection.deck_mut(group.deck_index) else { continue };
        let name = deck.name().to_string();
        for i in group.card_indices {
            let Some(card) = deck.card_mut(i) else { continue };
            report.presented += 1;
            match present(card, Some(&name), presenter, today) {
                Some(outcome) => report.record(outcome),
                None => tracing::debug!(deck = %name, card = i, "skipped"),
            }
        }
    }

    tracing::info!(reviewed = report.reviewed(), due = report.total, "due review finished");
    presenter.display_message("Review session done.");
    report
}

/// Reviews a single card. Cancelling records nothing.
pub fn review_card<P>(card: &mut Flashcard, deck: Option<&str>, presenter: &mut P, today: NaiveDate) -> SessionReport
where
    P: Presenter + ?Sized,
{
    let mut report = SessionReport { total: 1, presented: 1, ..Default::default() };
    match present(card, deck, presenter, today) {
        Some(outcome) => report.record(outcome),
        None => report.cancelled = true,
    }
    report
}
