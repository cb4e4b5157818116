use rand::Rng;

/// Letters used to fill the cells no word passes through
pub const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Pick a uniformly random uppercase letter A-Z
pub fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    ALPHABET[rng.random_range(0..ALPHABET.len())] as char
}

/// Whether a character may appear in a grid cell
pub fn is_grid_letter(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// Whether a normalized word can be laid into a grid as-is
pub fn is_grid_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_grid_letter)
}

/// Uppercase every word, keeping the caller's order
pub fn normalize_words<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words.iter().map(|w| w.as_ref().to_uppercase()).collect()
}
