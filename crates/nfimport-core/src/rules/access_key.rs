//! Access key (chave de acesso) recognition and formatting.

use uuid::Uuid;

use super::patterns::{ACCESS_KEY_BARE, ACCESS_KEY_LABELED};
use super::{ExtractionMatch, FieldExtractor};

/// Statutory length of an NFe/NFCe access key.
pub const ACCESS_KEY_DIGITS: usize = 44;

const GROUP_SIZE: usize = 4;

/// Access key extractor working on flattened page text.
pub struct AccessKeyExtractor;

impl AccessKeyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AccessKeyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AccessKeyExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for pattern in [&*ACCESS_KEY_LABELED, &*ACCESS_KEY_BARE] {
            for caps in pattern.captures_iter(text) {
                let Some(key) = normalize_access_key(&caps[1]) else {
                    continue;
                };
                if results.iter().any(|r| r.value == key) {
                    continue;
                }
                results.push(ExtractionMatch::new(key, caps[1].trim()));
            }
        }

        results
    }
}

/// Strip whitespace and, if exactly 44 digits remain, return the grouped key.
pub fn normalize_access_key(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    is_access_key(&compact).then(|| format_access_key(&compact))
}

/// Keep only the digits of `raw` and, if exactly 44 remain, return the grouped key.
pub fn access_key_from_digits(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    is_access_key(&digits).then(|| format_access_key(&digits))
}

fn is_access_key(compact: &str) -> bool {
    compact.len() == ACCESS_KEY_DIGITS && compact.chars().all(|c| c.is_ascii_digit())
}

/// Group digits in blocks of four separated by a single space.
pub fn format_access_key(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    chars
        .chunks(GROUP_SIZE)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A unique placeholder key for documents whose source carries none.
pub fn synthesize_access_key(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}
