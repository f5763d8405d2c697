//! Post body preparation: profanity masking and length validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ChirpyError, Result};

/// Maximum post body length, in characters.
pub const MAX_BODY_CHARS: usize = 140;

/// Replacement for masked words.
const MASK: &str = "****";

static PROFANITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)kerfuffle|sharbert|fornax").expect("profanity pattern is valid")
});

/// Mask blocked words in `body` (case-insensitive).
pub fn censor(body: &str) -> String {
    PROFANITY.replace_all(body, MASK).into_owned()
}

/// Mask blocked words, then reject bodies longer than [`MAX_BODY_CHARS`].
///
/// The length is measured after masking, in Unicode scalar values.
pub fn prepare_body(body: &str) -> Result<String> {
    let cleaned = censor(body);
    let len = cleaned.chars().count();
    if len > MAX_BODY_CHARS {
        return Err(ChirpyError::Validation(format!(
            "post body is {len} characters, limit is {MAX_BODY_CHARS}"
        )));
    }
    Ok(cleaned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
