use crate::CoreError;
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const EF_MIN: f64 = 1.3;
pub const EF_DEFAULT: f64 = 2.5;
pub const QUALITY_MAX: i32 = 5;
/// Ratings at or above this count as a successful recall.
pub const PASS_QUALITY: i32 = 3;
/// Longest interval ever scheduled (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// SM-2 parameters for a single card.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SchedulingState {
    pub ease_factor: f64,
    pub repetitions: u32,
    pub interval_days: u32,
    pub next_review: NaiveDate,
    pub last_review: Option<NaiveDate>,
}

impl SchedulingState {
    /// Fresh state; the card is due on `created`.
    pub fn new(created: NaiveDate) -> Self {
        Self {
            ease_factor: EF_DEFAULT,
            repetitions: 0,
            interval_days: 0,
            next_review: created,
            last_review: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_review.is_none()
    }

    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_review <= as_of
    }

    /// Applies one SM-2 review graded `quality` (clamped to 0..=5) on `today`.
    ///
    /// The interval for the third and later passes is
    /// `round(previous_interval * ease)` with the ease from *before* this
    /// review, rounding half away from zero.
    pub fn update(&mut self, quality: i32, today: NaiveDate) {
        let q = quality.clamp(0, QUALITY_MAX);
        self.last_review = Some(today);

        if q >= PASS_QUALITY {
            self.interval_days = match self.repetitions {
                0 => 1,
                1 => 6,
                _ => (self.interval_days as f64 * self.ease_factor)
                    .round()
                    .min(MAX_INTERVAL_DAYS as f64) as u32,
            };
            self.repetitions += 1;
        } else {
            self.repetitions = 0;
            self.interval_days = 1;
        }

        let miss = (QUALITY_MAX - q) as f64;
        let delta = 0.1 - miss * (0.08 + miss * 0.02);
        self.ease_factor = (self.ease_factor + delta).max(EF_MIN);

        // keep next_review == today + interval even at the end of the calendar
        let days_left = NaiveDate::MAX.signed_duration_since(today).num_days().max(0);
        self.interval_days = self.interval_days.min(days_left.min(MAX_INTERVAL_DAYS as i64) as u32);
        self.next_review = today
            .checked_add_days(Days::new(self.interval_days as u64))
            .unwrap_or(NaiveDate::MAX);

        tracing::debug!(
            quality = q,
            interval = self.interval_days,
            ease = self.ease_factor,
            next = %self.next_review,
            "sm2 update"
        );
    }

    /// Rejects state that `update` can never produce.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.ease_factor.is_finite() || self.ease_factor < EF_MIN {
            return Err(CoreError::Invalid("ease factor below 1.3"));
        }
        if self.interval_days > MAX_INTERVAL_DAYS {
            return Err(CoreError::Invalid("interval too long"));
        }
        if let Some(last) = self.last_review {
            if last.checked_add_days(Days::new(self.interval_days as u64)) != Some(self.next_review) {
                return Err(CoreError::Invalid("next review does not follow last review"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for SchedulingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Next={} | EF={:.2} | rep={} | int={}d",
            self.next_review, self.ease_factor, self.repetitions, self.interval_days
        )
    }
}
