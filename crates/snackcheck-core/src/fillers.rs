//! Random filler values for variable sets and annotation placeholders.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "apple", "banana", "cherry", "grape", "lemon", "mango", "melon", "orange", "peach", "pear",
    "plum", "kiwi", "carrot", "celery", "pretzel", "cracker", "cookie", "muffin", "yogurt",
    "cheese", "raisin", "popcorn", "granola", "waffle", "pancake", "juice", "milk", "water",
    "smoothie", "lemonade", "sandwich", "noodle", "rice", "bagel", "toast", "honey", "berry",
    "apricot", "coconut", "pumpkin",
];

/// Upper bound (exclusive) for random integers.
pub const MAX_RANDOM_INT: i64 = 100_000;

/// Source of random, type-conformant filler values.
pub trait FillerSource: Send {
    /// A non-empty lowercase word.
    fn word(&mut self) -> String;
    /// An integer in `0..MAX_RANDOM_INT`.
    fn int(&mut self) -> i64;
    fn boolean(&mut self) -> bool;
    /// A UUID v4 string.
    fn id(&mut self) -> String;
    fn email(&mut self) -> String {
        format!("{}.{}@example.com", self.word(), self.int())
    }
}

/// `rand`-backed filler; seed it for reproducible runs.
pub struct RandomFiller {
    rng: StdRng,
}

impl RandomFiller {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl FillerSource for RandomFiller {
    fn word(&mut self) -> String {
        WORDS.choose(&mut self.rng).copied().unwrap_or("snack").to_string()
    }

    fn int(&mut self) -> i64 {
        self.rng.gen_range(0..MAX_RANDOM_INT)
    }

    fn boolean(&mut self) -> bool {
        self.rng.gen()
    }

    fn id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.gen())
            .into_uuid()
            .to_string()
    }
}
