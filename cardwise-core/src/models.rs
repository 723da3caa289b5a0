use crate::{matcher, scheduler, CoreError, SchedulingState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DeckId = Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawFlashcard")]
pub struct Flashcard {
    prompt: String,
    answers: Vec<String>,
    pub scheduling: SchedulingState,
}

impl Flashcard {
    pub fn new(prompt: &str, raw_answers: &str) -> Result<Self, CoreError> {
        Self::created_on(prompt, raw_answers, scheduler::today())
    }

    /// Builds a card due on `created`. `raw_answers` is comma-separated.
    pub fn created_on(prompt: &str, raw_answers: &str, created: NaiveDate) -> Result<Self, CoreError> {
        if raw_answers.trim().is_empty() {
            return Err(CoreError::Invalid("answer cannot be empty"));
        }
        Ok(Self {
            prompt: validate_prompt(prompt)?,
            answers: validate_answers(matcher::parse_answers(raw_answers))?,
            scheduling: SchedulingState::new(created),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn raw_answers(&self) -> String {
        self.answers.join(", ")
    }

    pub fn check_answer(&self, input: Option<&str>) -> bool {
        matcher::matches(input, &self.answers)
    }

    pub fn apply_review_result(&mut self, quality: i32, today: NaiveDate) {
        self.scheduling.update(quality, today)
    }

    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.scheduling.is_due(as_of)
    }
}

/// Serialized form of [`Flashcard`]; checked on the way in.
#[derive(Deserialize)]
struct RawFlashcard {
    prompt: String,
    answers: Vec<String>,
    scheduling: SchedulingState,
}

impl TryFrom<RawFlashcard> for Flashcard {
    type Error = CoreError;

    fn try_from(raw: RawFlashcard) -> Result<Self, Self::Error> {
        raw.scheduling.validate()?;
        Ok(Self {
            prompt: validate_prompt(&raw.prompt)?,
            answers: validate_answers(
                raw.answers
                    .iter()
                    .flat_map(|a| matcher::parse_answers(a))
                    .collect(),
            )?,
            scheduling: raw.scheduling,
        })
    }
}

fn validate_prompt(prompt: &str) -> Result<String, CoreError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(CoreError::Invalid("prompt cannot be empty"));
    }
    Ok(prompt.to_string())
}

fn validate_answers(answers: Vec<String>) -> Result<Vec<String>, CoreError> {
    if answers.is_empty() {
        return Err(CoreError::Invalid("at least one answer is required"));
    }
    Ok(answers)
}

fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Invalid("deck name cannot be empty"));
    }
    Ok(name.to_string())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawDeck")]
pub struct Deck {
    pub id: DeckId,
    name: String,
    cards: Vec<Flashcard>,
}

#[derive(Deserialize)]
struct RawDeck {
    id: DeckId,
    name: String,
    cards: Vec<Flashcard>,
}

impl TryFrom<RawDeck> for Deck {
    type Error = CoreError;

    fn try_from(raw: RawDeck) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            name: validate_name(&raw.name)?,
            cards: raw.cards,
        })
    }
}

impl Deck {
    pub fn new(name: &str) -> Result<Self, CoreError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: validate_name(name)?,
            cards: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) -> Result<(), CoreError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [Flashcard] {
        &mut self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Flashcard> {
        self.cards.get(index)
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut Flashcard> {
        self.cards.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn add_card(&mut self, card: Flashcard) {
        self.cards.push(card);
    }

    pub fn remove_card(&mut self, index: usize) -> Result<Flashcard, CoreError> {
        self.check_index(index)?;
        Ok(self.cards.remove(index))
    }

    /// Swaps in an edited card. The replacement keeps its own (fresh)
    /// scheduling state.
    pub fn replace_card(&mut self, index: usize, card: Flashcard) -> Result<Flashcard, CoreError> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.cards[index], card))
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.cards.len() {
            return Err(CoreError::OutOfRange { index, len: self.cards.len() });
        }
        Ok(())
    }
}

/// Every deck the user owns. Deck names are not required to be unique.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    decks: Vec<Deck>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_decks(decks: Vec<Deck>) -> Self {
        Self { decks }
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn decks_mut(&mut self) -> &mut [Deck] {
        &mut self.decks
    }

    pub fn deck(&self, index: usize) -> Option<&Deck> {
        self.decks.get(index)
    }

    pub fn deck_mut(&mut self, index: usize) -> Option<&mut Deck> {
        self.decks.get_mut(index)
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn add_deck(&mut self, name: &str) -> Result<&mut Deck, CoreError> {
        let deck = Deck::new(name)?;
        self.decks.push(deck);
        let last = self.decks.len() - 1;
        Ok(&mut self.decks[last])
    }

    pub fn remove_deck(&mut self, index: usize) -> Result<Deck, CoreError> {
        if index >= self.decks.len() {
            return Err(CoreError::OutOfRange { index, len: self.decks.len() });
        }
        Ok(self.decks.remove(index))
    }

    /// Resolves a deck by id, then by case-insensitive name (first match wins).
    pub fn find_deck(&self, selector: &str) -> Result<usize, CoreError> {
        let sel = selector.trim();
        if let Ok(id) = Uuid::parse_str(sel) {
            if let Some(i) = self.decks.iter().position(|d| d.id == id) {
                return Ok(i);
            }
        }
        let wanted = sel.to_lowercase();
        self.decks
            .iter()
            .position(|d| d.name.to_lowercase() == wanted)
            .ok_or_else(|| CoreError::NotFound(format!("deck {sel}")))
    }

    pub fn due_count(&self, today: NaiveDate) -> usize {
        self.decks
            .iter()
            .flat_map(|d| d.cards.iter())
            .filter(|c| c.is_due(today))
            .count()
    }

    /// Appends every deck of `other`, keeping their ids.
    pub fn merge(&mut self, other: Collection) {
        self.decks.extend(other.decks);
    }
}
