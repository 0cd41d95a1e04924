// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Daily fact generator.
//!
//! Every run picks one fact to carry through its journal lines and run
//! summary. Purely cosmetic, but it gives each day's journal entry a
//! distinct, human-recognizable marker.

use rand::Rng;

static FACTS: &[&str] = &[
    "Octopuses have three hearts and blue blood",
    "Honey never spoils - archaeologists have found edible honey in ancient Egyptian tombs",
    "A group of flamingos is called a 'flamboyance'",
    "Bananas are berries, but strawberries aren't",
    "The shortest war in history lasted only 38-45 minutes",
    "A single cloud can weigh more than a million pounds",
    "Sharks have been around longer than trees",
    "The human brain uses about 20% of the body's total energy",
    "There are more possible games of chess than atoms in the observable universe",
    "Wombat poop is cube-shaped",
    "The Great Wall of China isn't visible from space with the naked eye",
    "A day on Venus is longer than its year",
    "Dolphins have names for each other",
    "The inventor of the Pringles can is buried in one",
    "Cleopatra lived closer in time to the Moon landing than to the construction of the Great Pyramid",
];

/// Pick one fact uniformly at random.
pub fn daily_fact(rng: &mut impl Rng) -> &'static str {
    FACTS[rng.gen_range(0..FACTS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn daily_fact_comes_from_the_table() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let fact = daily_fact(&mut rng);
            assert!(FACTS.contains(&fact));
        }
    }
}
