/*!
 * Language utilities for display names.
 *
 * LibreTranslate codes are mostly ISO 639-1 but may carry a region or
 * script subtag ("pt-BR", "zh-Hant"); lookups fall back to the primary
 * subtag.
 */

use anyhow::{anyhow, Result};
use isolang::Language;

use crate::providers::LanguageDescriptor;

/// Primary subtag of a code, lowercased
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Get the English language name from an ISO 639-1 or 639-3 code
pub fn get_language_name(code: &str) -> Result<String> {
    let primary = primary_subtag(code);
    let lang = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };

    lang.map(|l| l.to_name().to_string())
        .ok_or_else(|| anyhow!("Unknown language code: {}", code))
}

/// Name to show for a code: the server's own name, then the ISO name,
/// then the code itself
pub fn display_name(code: &str, installed: &[LanguageDescriptor]) -> String {
    if let Some(lang) = installed.iter().find(|l| l.code == code) {
        if !lang.name.is_empty() {
            return lang.name.clone();
        }
    }

    get_language_name(code).unwrap_or_else(|_| code.to_string())
}
