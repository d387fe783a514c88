// Name pools for rank-earned body labels.

use rand::Rng;
use std::collections::HashSet;

const MAJOR_NAMES: [&str; 20] = [
    "Zeus", "Hera", "Poseidon", "Demeter", "Ares", "Athena", "Apollo", "Artemis", "Hephaestus",
    "Aphrodite", "Hermes", "Dionysus", "Hades", "Hypnos", "Nike", "Janus", "Nemesis", "Iris",
    "Hecate", "Tyche",
];

const PHONETIC_WORDS: [&str; 26] = [
    "Alfa", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliett",
    "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo", "Sierra", "Tango",
    "Uniform", "Victor", "Whiskey", "X-Ray", "Yankee", "Zulu",
];

const MINOR_SUFFIX_ALPHABET: &str = "QWERTYUIOPASDFGHJKLZXCVBNM1234567890";
const MINOR_SUFFIX_LEN: usize = 5;

/// Pools used to name the heaviest bodies. Injected into the universe so tests can
/// supply small pools.
#[derive(Debug, Clone)]
pub struct NamePool {
    /// Finite pool handed out without replacement.
    pub major_names: Vec<String>,
    /// Prefix words for generated minor names.
    pub phonetic_words: Vec<String>,
    pub suffix_alphabet: Vec<char>,
}

impl Default for NamePool {
    fn default() -> Self {
        Self {
            major_names: MAJOR_NAMES.iter().map(|s| s.to_string()).collect(),
            phonetic_words: PHONETIC_WORDS.iter().map(|s| s.to_string()).collect(),
            suffix_alphabet: MINOR_SUFFIX_ALPHABET.chars().collect(),
        }
    }
}

impl NamePool {
    /// Picks a random major name not present in `in_use`; `None` once the pool is exhausted.
    pub fn pick_major<R: Rng>(&self, rng: &mut R, in_use: &HashSet<String>) -> Option<String> {
        let free: Vec<&String> = self
            .major_names
            .iter()
            .filter(|name| !in_use.contains(*name))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[rng.random_range(0..free.len())].clone())
    }

    /// Generates "<phonetic word> <5 alphanumerics>", retrying until it is not in `in_use`.
    pub fn generate_minor<R: Rng>(&self, rng: &mut R, in_use: &HashSet<String>) -> String {
        if self.phonetic_words.is_empty() || self.suffix_alphabet.is_empty() {
            return String::new();
        }
        loop {
            let word = &self.phonetic_words[rng.random_range(0..self.phonetic_words.len())];
            let mut name = String::with_capacity(word.len() + 1 + MINOR_SUFFIX_LEN);
            name.push_str(word);
            name.push(' ');
            for _ in 0..MINOR_SUFFIX_LEN {
                name.push(self.suffix_alphabet[rng.random_range(0..self.suffix_alphabet.len())]);
            }
            if !in_use.contains(&name) {
                return name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn major_names_skip_names_in_use() {
        let pool = NamePool {
            major_names: vec!["Zeus".into(), "Hera".into()],
            ..NamePool::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let in_use = HashSet::from(["Zeus".to_string()]);

        for _ in 0..20 {
            assert_eq!(pool.pick_major(&mut rng, &in_use).as_deref(), Some("Hera"));
        }
    }

    #[test]
    fn exhausted_major_pool_yields_none() {
        let pool = NamePool {
            major_names: vec!["Zeus".into()],
            ..NamePool::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let in_use = HashSet::from(["Zeus".to_string()]);

        assert_eq!(pool.pick_major(&mut rng, &in_use), None);
    }

    #[test]
    fn minor_names_have_word_and_suffix() {
        let pool = NamePool::default();
        let mut rng = SmallRng::seed_from_u64(42);

        let name = pool.generate_minor(&mut rng, &HashSet::new());
        let (word, suffix) = name.split_once(' ').expect("minor name has a space");

        assert!(PHONETIC_WORDS.contains(&word));
        assert_eq!(suffix.len(), MINOR_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| MINOR_SUFFIX_ALPHABET.contains(c)));
    }

    #[test]
    fn minor_names_avoid_collisions() {
        let pool = NamePool {
            phonetic_words: vec!["Alfa".into()],
            suffix_alphabet: vec!['A', 'B'],
            ..NamePool::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let mut in_use = HashSet::new();

        // 32 possible names; generating all of them must never repeat one.
        for _ in 0..32 {
            let name = pool.generate_minor(&mut rng, &in_use);
            assert!(in_use.insert(name));
        }
    }
}
