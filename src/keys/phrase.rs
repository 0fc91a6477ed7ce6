use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of words in a wallet phrase (128 bits of entropy plus checksum).
pub const PHRASE_WORDS: usize = 12;

/// A BIP-39 recovery phrase.
///
/// Construction does not validate; use [`super::KeyDerivation::validate_phrase`]
/// before trusting it. The text is wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RecoveryPhrase(String);

impl RecoveryPhrase {
    /// Normalize whitespace and case of user input.
    pub fn new(phrase: &str) -> Self {
        let normalized = phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|w| !w.is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

impl From<String> for RecoveryPhrase {
    fn from(mut phrase: String) -> Self {
        let normalized = Self::new(&phrase);
        phrase.zeroize();
        normalized
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryPhrase")
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}
