use axum::{debug_handler, Json};
use serde::Serialize;

use crate::error::{RelayError, RelayResult};

pub const LANGUAGES: &[(&str, &str)] = &[
    ("arb", "modern standard arabic"),
    ("ben", "bengali"),
    ("cat", "catalan"),
    ("ces", "czech"),
    ("cmn", "mandarin chinese"),
    ("cym", "welsh"),
    ("dan", "danish"),
    ("deu", "german"),
    ("eng", "english"),
    ("est", "estonian"),
    ("fra", "french"),
    ("hin", "hindi"),
    ("ind", "indonesian"),
    ("ita", "italian"),
    ("jpn", "japanese"),
    ("kor", "korean"),
    ("nld", "dutch"),
    ("pol", "polish"),
    ("por", "portuguese"),
    ("ron", "romanian"),
    ("rus", "russian"),
    ("slk", "slovak"),
    ("spa", "spanish"),
    ("swe", "swedish"),
    ("tel", "telugu"),
    ("tha", "thai"),
    ("tur", "turkish"),
    ("ukr", "ukrainian"),
    ("urd", "urdu"),
    ("uzn", "uzbek"),
    ("vie", "vietnamese"),
];

pub fn validate(code: &str) -> RelayResult<()> {
    if LANGUAGES.iter().any(|(known, _)| *known == code) {
        Ok(())
    } else {
        Err(RelayError::invalid(format!("language {code:?}")))
    }
}

#[derive(Serialize)]
pub struct Language {
    code: &'static str,
    name: &'static str,
}

#[debug_handler]
pub async fn languages() -> Json<Vec<Language>> {
    Json(
        LANGUAGES
            .iter()
            .map(|&(code, name)| Language { code, name })
            .collect()
    )
}
