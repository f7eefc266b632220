//! System prompts for LLM-based document translation.
//!
//! Every instruction the model sees lives here so that prompt changes touch
//! exactly one file and tests can inspect the text without a live model.
//! The prompt for a request is chosen once from its [`Direction`] and never
//! changes while that document is being translated.

use crate::config::Direction;

/// System prompt for Arabic → English translation.
pub const AR_TO_EN_PROMPT: &str = "You are a professional translator. Translate the following Arabic text into \
natural, fluent English. **Important:** Any personal names, company names, \
geographical names, or other entities must remain in their original form; \
do not translate them. Preserve the meaning and tone of the text, and ensure readability.";

/// System prompt for English → Arabic translation.
pub const EN_TO_AR_PROMPT: &str = "You are a professional translator. Translate the following English text into \
natural, fluent Arabic. **Important:** Any personal names, company names, \
geographical names, or other entities must remain in their original English form; \
do not translate them. Preserve the meaning and tone of the text, and ensure readability.";

/// Return the fixed system instruction for `direction`.
pub fn select_prompt(direction: Direction) -> &'static str {
    match direction {
        Direction::ArabicToEnglish => AR_TO_EN_PROMPT,
        Direction::EnglishToArabic => EN_TO_AR_PROMPT,
    }
}

/// Build the user turn carrying the paragraph text.
pub fn user_message(text: &str) -> String {
    format!("Text to translate:\n{}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ar_to_en_targets_english() {
        let p = select_prompt(Direction::ArabicToEnglish);
        assert!(p.contains("Arabic text into"));
        assert!(p.contains("fluent English"));
    }

    #[test]
    fn en_to_ar_targets_arabic() {
        let p = select_prompt(Direction::EnglishToArabic);
        assert!(p.contains("English text into"));
        assert!(p.contains("fluent Arabic"));
    }

    #[test]
    fn both_prompts_preserve_named_entities() {
        for d in [Direction::ArabicToEnglish, Direction::EnglishToArabic] {
            let p = select_prompt(d);
            assert!(p.contains("personal names, company names"));
            assert!(p.contains("geographical names"));
            assert!(p.contains("do not translate them"));
        }
    }

    #[test]
    fn user_message_prefixes_text() {
        assert_eq!(user_message("مرحبا"), "Text to translate:\nمرحبا");
    }
}
