//! Random team names of the form "Adjective Noun".

use rand::seq::IndexedRandom;
use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "angry", "brave", "bright", "calm", "clever", "crimson", "daring", "eager", "fancy",
    "fearless", "fierce", "gentle", "giant", "golden", "grumpy", "happy", "hidden", "jolly",
    "lazy", "lucky", "mighty", "nimble", "noisy", "proud", "quick", "quiet", "rapid", "royal",
    "rusty", "silent", "silver", "sleepy", "sneaky", "speedy", "stormy", "swift", "tiny",
    "wild", "wise", "zealous",
];

pub const NOUNS: &[&str] = &[
    "badgers", "bears", "beetles", "cobras", "comets", "crows", "dragons", "eagles", "falcons",
    "foxes", "geckos", "giants", "goblins", "hawks", "hornets", "jackals", "knights", "lions",
    "llamas", "lynxes", "mammoths", "otters", "owls", "pandas", "penguins", "pirates", "ravens",
    "rhinos", "robots", "sharks", "sloths", "sparrows", "squids", "tigers", "titans", "toads",
    "vikings", "walruses", "wizards", "wolves",
];

/// Picks a random team name, e.g. "Sneaky Otters".
pub fn team_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("nameless");
    let noun = NOUNS.choose(rng).copied().unwrap_or("team");
    format!("{} {}", capitalize(adjective), capitalize(noun))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_team_name_has_two_known_words() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = team_name(&mut rng);
        let words: Vec<&str> = name.split(' ').collect();

        assert_eq!(words.len(), 2);
        assert!(ADJECTIVES.contains(&words[0].to_lowercase().as_str()));
        assert!(NOUNS.contains(&words[1].to_lowercase().as_str()));
    }

    #[test]
    fn test_team_name_is_capitalized() {
        let mut rng = StdRng::seed_from_u64(11);
        let name = team_name(&mut rng);
        assert!(name.split(' ').all(|w| w.chars().next().unwrap().is_uppercase()));
    }

    #[test]
    fn test_team_name_seeded_is_repeatable() {
        let a = team_name(&mut StdRng::seed_from_u64(3));
        let b = team_name(&mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("otters"), "Otters");
        assert_eq!(capitalize(""), "");
    }
}
