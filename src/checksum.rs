// 🧮 Checksum Pipeline - ISO 13616 mod-97 validation
// Normalize → Rearrange → Digit Map → Chunked Modulus → compare to 1
//
// IBANs expand into 30-60+ digit numbers. No native integer holds that
// exactly, so the modulus is taken by chunked long division over the
// decimal string instead of a bignum.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

// ============================================================================
// CONSTANTS
// ============================================================================

/// ISO 7064 MOD 97-10 modulus used by IBAN check digits
pub const IBAN_MODULUS: u32 = 97;

/// Number of leading digits reduced per step of the chunked division
const CHUNK_LEN: usize = 8;

/// Largest modulus whose remainders print in fewer than `CHUNK_LEN` digits
pub const MAX_CHUNKED_MODULUS: u32 = 9_999_999;

/// Characters moved from the front to the back before the modulus is taken
const ROTATE_LEN: usize = 4;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    /// The digit string (or BBAN) was empty
    #[error("input is empty")]
    EmptyInput,

    /// A non-decimal character reached the modulus calculator
    #[error("invalid digit {found:?} at position {position}")]
    InvalidDigit { position: usize, found: char },

    /// Modulus is zero or too large for the chunked reduction to shrink
    #[error("modulus {0} is outside 1..=9999999")]
    InvalidModulus(u32),

    /// Country code is not exactly two ASCII letters
    #[error("country code {0:?} must be two ASCII letters")]
    InvalidCountryCode(String),
}

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Strip everything except ASCII letters and digits, then uppercase.
///
/// IBANs are usually written in space-separated blocks of four, sometimes
/// with hyphens. Non-ASCII letters are removed, not folded.
///
/// ```
/// assert_eq!(iban_checksum::normalize("gb29 nwbk-6016"), "GB29NWBK6016");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Move the first four characters (country code + check digits) to the end.
///
/// Strings of four characters or fewer come back unchanged.
pub fn rotate_leading_four(s: &str) -> String {
    match s.char_indices().nth(ROTATE_LEN) {
        Some((split, _)) => {
            let mut rotated = String::with_capacity(s.len());
            rotated.push_str(&s[split..]);
            rotated.push_str(&s[..split]);
            rotated
        }
        None => s.to_string(),
    }
}

/// Expand letters into their two-digit codes: `A=10, B=11, ..., Z=35`.
///
/// Digits pass through. Lowercase letters are accepted. Anything else is
/// dropped rather than treated as an error.
pub fn to_digit_string(s: &str) -> String {
    let mut digits = String::with_capacity(s.len() * 2);

    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c.is_ascii_alphabetic() {
            let code = c.to_ascii_uppercase() as u32 - 'A' as u32 + 10;
            digits.push_str(&code.to_string());
        }
    }

    digits
}

/// Remainder of a decimal digit string divided by 97.
///
/// Returns `Err(ChecksumError::EmptyInput)` for `""`. Leading zeros do not
/// affect the result.
pub fn mod97(digits: &str) -> Result<u32, ChecksumError> {
    mod_chunked(digits, IBAN_MODULUS)
}

/// Remainder of an arbitrarily long decimal digit string divided by `modulus`.
///
/// Works by long division in chunks: reduce the leading eight digits, write
/// the remainder back in front of the rest as a plain base-10 numeral, and
/// repeat until eight or fewer digits remain. The remainder always prints
/// shorter than a chunk, so the working string shrinks every step.
pub fn mod_chunked(digits: &str, modulus: u32) -> Result<u32, ChecksumError> {
    if modulus == 0 || modulus > MAX_CHUNKED_MODULUS {
        return Err(ChecksumError::InvalidModulus(modulus));
    }

    if digits.is_empty() {
        return Err(ChecksumError::EmptyInput);
    }

    if let Some((position, found)) = digits.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(ChecksumError::InvalidDigit { position, found });
    }

    let modulus = u64::from(modulus);
    let mut working = digits.to_string();

    while working.len() > CHUNK_LEN {
        let (chunk, rest) = working.split_at(CHUNK_LEN);
        let remainder = parse_digits(chunk) % modulus;
        trace!(chunk, remainder, remaining = rest.len(), "reduced chunk");
        working = format!("{}{}", remainder, rest);
    }

    // Bounded by modulus <= MAX_CHUNKED_MODULUS
    Ok((parse_digits(&working) % modulus) as u32)
}

/// Value of at most `CHUNK_LEN` ASCII digits (already checked by the caller)
fn parse_digits(chunk: &str) -> u64 {
    chunk
        .bytes()
        .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate an IBAN checksum.
///
/// Runs the full pipeline and accepts only a remainder of exactly 1. Any
/// string is accepted; malformed or empty input just yields `false`. No
/// per-country length or structure rules are applied.
pub fn is_valid_iban(iban: &str) -> bool {
    let normalized = normalize(iban);
    let rearranged = rotate_leading_four(&normalized);
    let digits = to_digit_string(&rearranged);

    matches!(mod97(&digits), Ok(1))
}

/// Compute the two check digits for a country code and BBAN.
///
/// Both parts are normalized first, so `"gb"` and `"NWBK 6016 ..."` work.
///
/// ```
/// let digits = iban_checksum::check_digits("GB", "NWBK 6016 1331 9268 19").unwrap();
/// assert_eq!(digits, "29");
/// ```
pub fn check_digits(country: &str, bban: &str) -> Result<String, ChecksumError> {
    let country = normalize(country);
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ChecksumError::InvalidCountryCode(country));
    }

    let bban = normalize(bban);
    if bban.is_empty() {
        return Err(ChecksumError::EmptyInput);
    }

    // Same layout the validator sees after rotation, with "00" as placeholder
    let digits = to_digit_string(&format!("{}{}00", bban, country));
    let remainder = mod97(&digits)?;

    Ok(format!("{:02}", 98 - remainder))
}

// ============================================================================
// PIPELINE BREAKDOWN
// ============================================================================

/// Every intermediate value the validator produces for one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumBreakdown {
    pub input: String,
    pub normalized: String,
    pub rearranged: String,
    pub digits: String,

    /// None when nothing alphanumeric survived normalization
    pub remainder: Option<u32>,

    pub valid: bool,
}

impl ChecksumBreakdown {
    pub fn status(&self) -> &'static str {
        if self.valid {
            "VALID"
        } else {
            "INVALID"
        }
    }
}

/// Run the pipeline and keep each stage's output.
pub fn explain(iban: &str) -> ChecksumBreakdown {
    let normalized = normalize(iban);
    let rearranged = rotate_leading_four(&normalized);
    let digits = to_digit_string(&rearranged);
    let remainder = mod97(&digits).ok();

    ChecksumBreakdown {
        input: iban.to_string(),
        normalized,
        rearranged,
        digits,
        remainder,
        valid: remainder == Some(1),
    }
}

// ============================================================================
// TESTS
// ============================================================================
