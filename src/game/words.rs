//! Word pool and masking.

use rand::seq::SliceRandom;
use rand::Rng;

/// Candidate words (everyday things and animals), shared by every game.
pub const WORDS: &[&str] = &[
    "słoń", "dom", "drzewo", "samochód", "kwiat", "książka", "pies", "kot",
    "mysz", "krzesło", "stół", "lampa",
];

pub fn default_pool() -> Vec<String> {
    WORDS.iter().map(|w| w.to_string()).collect()
}

/// Draw up to `n` distinct words from `pool`.
pub fn draw<R: Rng>(pool: &[String], rng: &mut R, n: usize) -> Vec<String> {
    pool.choose_multiple(rng, n).cloned().collect()
}

/// Player-visible form of the secret word: first and last character kept,
/// interior replaced with underscores. One- and two-character words are
/// too short to mask usefully and pass through unchanged.
pub fn mask(word: &str) -> String {
    let len = word.chars().count();
    if len <= 2 {
        return word.to_string();
    }
    let mut chars = word.chars();
    let first = chars.next().unwrap();
    let last = chars.next_back().unwrap();
    let mut masked = String::with_capacity(word.len());
    masked.push(first);
    for _ in 0..len - 2 {
        masked.push('_');
    }
    masked.push(last);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mask_keeps_ends_and_hides_interior() {
        assert_eq!(mask("drzewo"), "d____o");
        assert_eq!(mask("kot"), "k_t");
        // non-ASCII words are masked by character, not by byte
        assert_eq!(mask("słoń"), "s__ń");
        assert_eq!(mask("książka"), "k_____a");
    }

    #[test]
    fn mask_leaves_short_words_alone() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("a"), "a");
        assert_eq!(mask("ja"), "ja");
    }

    #[test]
    fn draw_yields_distinct_words() {
        let pool = default_pool();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = draw(&pool, &mut rng, 3);
            assert_eq!(picked.len(), 3);
            assert_ne!(picked[0], picked[1]);
            assert_ne!(picked[0], picked[2]);
            assert_ne!(picked[1], picked[2]);
        }
    }

    #[test]
    fn draw_caps_at_pool_size() {
        let pool = vec!["kot".to_string(), "pies".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let picked = draw(&pool, &mut rng, 3);
        assert_eq!(picked.len(), 2);
    }
}
