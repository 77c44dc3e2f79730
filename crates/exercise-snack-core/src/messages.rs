//! Exercise suggestion catalog and the per-day message rotation.
//!
//! [`MessagePool::pick`] never hands out the same suggestion twice in a row
//! within one day, including across separate calls. Non-adjacent repeats are
//! allowed, and the exclusion is forgotten at the day boundary.

use chrono::NaiveDate;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Notification titles, rotated independently of the body text.
pub const TITLES: [&str; 5] = [
    "Time to move!",
    "Exercise snack time!",
    "Let's get moving!",
    "Break time!",
    "Your body says thanks!",
];

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short name of the exercise, e.g. "10 squats".
    pub exercise: String,
    /// Notification body shown to the user.
    pub message: String,
}

impl Suggestion {
    pub fn new(exercise: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
            message: message.into(),
        }
    }
}

/// The built-in catalog of desk-friendly exercises.
pub fn default_catalog() -> Vec<Suggestion> {
    [
        ("10 squats", "Drop and give me 10 squats! Your body will thank you!"),
        ("15 desk push-ups", "How about 15 desk push-ups? You've got this!"),
        ("30-second plank", "Hold a 30-second plank, you're stronger than you think!"),
        ("20 calf raises", "Time for 20 calf raises! Stand tall and feel the burn!"),
        ("10 lunges per leg", "Do 10 lunges per leg, your future self will thank you!"),
        ("30-second toe touch", "Stretch it out! Touch your toes and hold for 30 seconds!"),
        ("15 jumping jacks", "Try 15 jumping jacks to get your blood pumping!"),
        ("10 shoulder rolls each way", "Roll your shoulders 10 times each way and release that tension!"),
        ("10 tricep dips", "Do 10 tricep dips on your chair! Arms of steel incoming!"),
        ("2-minute walk", "Walk around for 2 minutes, every step counts!"),
        ("20 high knees", "Pump out 20 high knees and feel that energy surge!"),
        ("15 seated leg raises", "Try 15 seated leg raises to sneak in some core work!"),
    ]
    .into_iter()
    .map(|(exercise, message)| Suggestion::new(exercise, message))
    .collect()
}

fn seeded_rng(seed: Option<u64>) -> Mcg128Xsl64 {
    match seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    }
}

/// Randomised, non-repeating-per-day message rotation.
#[derive(Debug, Clone)]
pub struct MessagePool {
    suggestions: Vec<Suggestion>,
    last_used_index: Option<usize>,
    last_used_day: Option<NaiveDate>,
    rng: Mcg128Xsl64,
}

impl MessagePool {
    /// Build a pool over `suggestions`.
    ///
    /// `seed` fixes the random sequence (tests, reproducible runs); `None`
    /// seeds from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCollection`] if `suggestions` is empty.
    /// An empty pool is a setup bug, not a runtime condition.
    pub fn new(suggestions: Vec<Suggestion>, seed: Option<u64>) -> Result<Self, ValidationError> {
        if suggestions.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "message pool needs at least one suggestion".into(),
            ));
        }
        Ok(Self {
            suggestions,
            last_used_index: None,
            last_used_day: None,
            rng: seeded_rng(seed),
        })
    }

    /// Pool over [`default_catalog`].
    pub fn with_default_catalog(seed: Option<u64>) -> Self {
        Self {
            suggestions: default_catalog(),
            last_used_index: None,
            last_used_day: None,
            rng: seeded_rng(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn last_used_index(&self) -> Option<usize> {
        self.last_used_index
    }

    pub fn last_used_day(&self) -> Option<NaiveDate> {
        self.last_used_day
    }

    /// Draw exactly `count` suggestions for `today`.
    pub fn pick(&mut self, count: usize, today: NaiveDate) -> Vec<Suggestion> {
        if self.last_used_day.is_some_and(|day| day != today) {
            self.last_used_index = None;
        }

        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            let index = self.draw_index();
            self.last_used_index = Some(index);
            self.last_used_day = Some(today);
            picked.push(self.suggestions[index].clone());
        }
        picked
    }

    /// Random notification title. Does not touch the rotation state.
    pub fn pick_title(&mut self) -> &'static str {
        TITLES[self.rng.gen_range(0..TITLES.len())]
    }

    fn draw_index(&mut self) -> usize {
        let size = self.suggestions.len();
        loop {
            let index = self.rng.gen_range(0..size);
            if size == 1 || Some(index) != self.last_used_index {
                return index;
            }
        }
    }
}
