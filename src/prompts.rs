//! Instructions sent to the vision model.
//!
//! Every prompt lives here so tests can inspect them without a model, and a
//! wording change touches exactly one place. Callers can override the default
//! via [`crate::config::ReportConfig::title_instruction`].

use crate::config::ReportLanguage;

/// Default English title-extraction instruction.
pub const TITLE_INSTRUCTION_EN: &str = "Extract the main title of this academic paper page: \
the single largest and most prominent heading text on the page. \
Return exactly that text and nothing else. Do not add explanations, author names, \
quotation marks or any other text.";

/// Turkish title-extraction instruction.
pub const TITLE_INSTRUCTION_TR: &str = "Bu akademik makale sayfasındaki en büyük ve en belirgin \
metin olan ana başlığı çıkar. Sadece ve sadece tam başlığı döndür, başka hiçbir açıklama, \
yazar adı veya ek metin ekleme.";

/// The default instruction for `language`.
pub fn title_instruction(language: ReportLanguage) -> &'static str {
    match language {
        ReportLanguage::English => TITLE_INSTRUCTION_EN,
        ReportLanguage::Turkish => TITLE_INSTRUCTION_TR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_ask_for_title_only() {
        assert!(TITLE_INSTRUCTION_EN.contains("nothing else"));
        assert!(TITLE_INSTRUCTION_TR.contains("Sadece"));
        assert_eq!(
            title_instruction(ReportLanguage::English),
            TITLE_INSTRUCTION_EN
        );
    }
}
