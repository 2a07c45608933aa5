//! Syllable encodings used by literals of the bundled language.
//!
//! Strings are written one byte per word. Each byte is four base-5 digits,
//! most significant first, spelled with the syllables `pa pe pi po pu`.
//! Integers are binary numerals spelled with `pi` for one and `po` for zero.

use thiserror::Error;

const SYLLABLES: [&str; 5] = ["pa", "pe", "pi", "po", "pu"];
const DIGITS_PER_BYTE: usize = 4;
const WORD_LEN: usize = DIGITS_PER_BYTE * 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Failed to decode word {word}: expected 8 characters")]
    WrongLength { word: String },
    #[error("Failed to decode symbol {syllable} in word {word}")]
    UnknownSyllable { syllable: String, word: String },
    #[error("Failed to decode word {word}: value {value} does not fit in a byte")]
    ByteOverflow { word: String, value: u32 },
    #[error("Failed to parse binary number from {numeral}")]
    InvalidNumeral { numeral: String },
}

pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * (WORD_LEN + 1));
    for (index, &byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let mut digits = [0usize; DIGITS_PER_BYTE];
        let mut value = usize::from(byte);
        for digit in digits.iter_mut().rev() {
            *digit = value % 5;
            value /= 5;
        }
        for digit in digits {
            out.push_str(SYLLABLES[digit]);
        }
    }
    out
}

/// Inverse of [`encode`]. Words are separated by single spaces.
pub fn decode(text: &str) -> Result<Vec<u8>, CipherError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(' ').map(decode_word).collect()
}

fn decode_word(word: &str) -> Result<u8, CipherError> {
    if word.len() != WORD_LEN || !word.is_ascii() {
        return Err(CipherError::WrongLength {
            word: word.to_string(),
        });
    }

    let mut value = 0u32;
    for index in (0..WORD_LEN).step_by(2) {
        let syllable = &word[index..index + 2];
        let digit = SYLLABLES
            .iter()
            .position(|candidate| *candidate == syllable)
            .ok_or_else(|| CipherError::UnknownSyllable {
                syllable: syllable.to_string(),
                word: word.to_string(),
            })?;
        value = value * 5 + digit as u32;
    }

    u8::try_from(value).map_err(|_| CipherError::ByteOverflow {
        word: word.to_string(),
        value,
    })
}

/// Reads a numeral such as `pipopi` (binary `101`).
pub fn decode_numeral(numeral: &str) -> Result<i64, CipherError> {
    let invalid = || CipherError::InvalidNumeral {
        numeral: numeral.to_string(),
    };

    let digits = numeral
        .chars()
        .filter(|&c| c != 'p')
        .map(|c| match c {
            'i' => Ok('1'),
            'o' => Ok('0'),
            _ => Err(invalid()),
        })
        .collect::<Result<String, _>>()?;
    if digits.is_empty() {
        return Err(invalid());
    }
    i64::from_str_radix(&digits, 2).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_bytes_as_base_five_syllables() {
        assert_eq!(encode(b"h"), "papupapu");
        assert_eq!(encode(b"hi"), "papupapu papupepa");
        assert_eq!(encode(&[0]), "papapapa");
        assert_eq!(encode(&[255]), "pipapepa");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn round_trips_every_byte() {
        for byte in 0..=u8::MAX {
            let encoded = encode(&[byte]);
            assert_eq!(decode(&encoded), Ok(vec![byte]), "byte {byte}");
        }
    }

    #[test]
    fn round_trips_sample_strings() {
        for sample in ["", "Hello, world!", "tab\tand\nnewline", "ünïcode"] {
            let encoded = encode(sample.as_bytes());
            assert_eq!(decode(&encoded).expect("decode"), sample.as_bytes());
        }
    }

    #[test]
    fn rejects_words_of_the_wrong_length() {
        assert_eq!(
            decode("papupapu papu"),
            Err(CipherError::WrongLength {
                word: "papu".to_string()
            })
        );
        assert!(matches!(
            decode("papupapu  papupepa"),
            Err(CipherError::WrongLength { .. })
        ));
    }

    #[test]
    fn rejects_unknown_syllables() {
        assert_eq!(
            decode("papupaxu"),
            Err(CipherError::UnknownSyllable {
                syllable: "xu".to_string(),
                word: "papupaxu".to_string()
            })
        );
    }

    #[test]
    fn rejects_values_above_a_byte() {
        assert_eq!(
            decode("pupupupu"),
            Err(CipherError::ByteOverflow {
                word: "pupupupu".to_string(),
                value: 624
            })
        );
    }

    #[test]
    fn decodes_numerals() {
        assert_eq!(decode_numeral("po"), Ok(0));
        assert_eq!(decode_numeral("pipopi"), Ok(5));
        assert_eq!(decode_numeral("pipopipopipo"), Ok(42));
        assert_eq!(decode_numeral("pipop"), Ok(2));
        assert_eq!(decode_numeral("pipipopo"), Ok(12));
    }

    #[test]
    fn rejects_malformed_numerals() {
        let too_long = "pi".repeat(64);
        for numeral in ["", "pp", "pipa", too_long.as_str()] {
            assert_eq!(
                decode_numeral(numeral),
                Err(CipherError::InvalidNumeral {
                    numeral: numeral.to_string()
                }),
                "numeral {numeral:?}"
            );
        }
    }
}
