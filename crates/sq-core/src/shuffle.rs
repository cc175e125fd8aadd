//! Fisher–Yates shuffle of an answer list.
//!
//! The accepted answer tends to sit at a fixed position in upstream order,
//! so every viewing gets a fresh random order.

use crate::models::Answer;
use crate::traits::RandomSource;

/// Shuffles `answers` in place with a freshly seeded thread-local generator.
pub fn shuffle_answers(answers: &mut [Answer]) {
    let mut rng = rand::thread_rng();
    shuffle_answers_with(answers, &mut rng);
}

/// Shuffles `answers` in place, drawing swap indices from `rng`.
/// Only positions change; fewer than two answers are left untouched.
pub fn shuffle_answers_with<R: RandomSource + ?Sized>(answers: &mut [Answer], rng: &mut R) {
    if answers.len() < 2 {
        return;
    }
    for n in (1..answers.len()).rev() {
        let k = rng.uniform_inclusive(n);
        answers.swap(n, k);
    }
}
