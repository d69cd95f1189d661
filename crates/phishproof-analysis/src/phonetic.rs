//! Phonetic fingerprints.
//!
//! Stored codes are later compared for equality against freshly
//! computed query codes, so the encoders must track the commons-codec
//! reference output exactly; rphonetic is a direct port of it.

use rphonetic::{DoubleMetaphone, Encoder, Metaphone, Soundex};

/// Four-character Soundex code.
pub fn soundex(input: &str) -> String {
    Soundex::default().encode(input)
}

/// Classic single-code Metaphone.
pub fn metaphone(input: &str) -> String {
    Metaphone::default().encode(input)
}

/// Double-Metaphone primary code. The engine never needs the
/// alternate code.
pub fn double_metaphone(input: &str) -> String {
    DoubleMetaphone::default().encode(input)
}
