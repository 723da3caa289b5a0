use cardwise_core::{parse_quality, scheduler, summarize_deck, Deck, Flashcard, Presenter};
use std::io::{self, BufRead, Write};

/// Typing this at any prompt cancels it, as does end of input.
pub const CANCEL: &str = ":q";

/// Line-oriented presenter over any reader/writer pair.
pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
}

impl TerminalPresenter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: &str) {
        // nothing useful to do if the terminal is gone
        let _ = writeln!(self.output, "{text}");
    }

    /// `None` on end of input, read failure or the cancel marker.
    fn ask(&mut self, label: &str) -> Option<String> {
        let _ = write!(self.output, "{label}");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                (line.trim() != CANCEL).then(|| line.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "reading input failed");
                None
            }
        }
    }
}

pub fn card_row(number: usize, card: &Flashcard) -> String {
    format!("{number}\t{}\t{}\t{}", card.prompt(), card.raw_answers(), card.scheduling)
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn prompt_deck_name(&mut self, current: Option<&str>) -> Option<String> {
        let label = match current {
            Some(name) => format!("New name for '{name}': "),
            None => "Deck name: ".to_string(),
        };
        self.ask(&label)
    }

    fn prompt_card_fields(&mut self) -> Option<(String, String)> {
        let prompt = self.ask("Question: ")?;
        let answers = self.ask("Answer(s) (comma-separated): ")?;
        Some((prompt, answers))
    }

    fn prompt_answer(&mut self, deck: Option<&str>, prompt: &str) -> Option<String> {
        match deck {
            Some(d) => self.ask(&format!("[{d}] Q: {prompt}\n> ")),
            None => self.ask(&format!("Q: {prompt}\n> ")),
        }
    }

    fn prompt_quality(&mut self) -> Option<i32> {
        let line = self.ask("Rate quality (0-5) or leave empty to auto-rate: ")?;
        parse_quality(&line)
    }

    fn confirm(&mut self, description: &str) -> bool {
        self.ask(&format!("{description} [y/N] "))
            .map(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn display_message(&mut self, text: &str) {
        self.say(text);
    }

    fn display_card_table(&mut self, deck: &Deck) {
        self.say(&format!("#\tQuestion\tAnswer\tScheduling    ({})", deck.name()));
        for (i, card) in deck.cards().iter().enumerate() {
            self.say(&card_row(i + 1, card));
        }
    }

    fn display_deck_list(&mut self, decks: &[Deck]) {
        if decks.is_empty() {
            self.say("No decks yet.");
            return;
        }
        let today = scheduler::today();
        for d in decks {
            let s = summarize_deck(d, today);
            self.say(&format!(
                "{}\t{} ({} cards, {} due, {} new, EF {:.2})",
                d.id, d.name(), s.cards, s.due, s.new, s.mean_ease
            ));
        }
    }
}
