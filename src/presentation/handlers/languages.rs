use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct LanguageEntry {
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Serialize)]
pub struct LanguagesResponse {
    pub premium: Vec<LanguageEntry>,
    pub standard: Vec<LanguageEntry>,
}

/// Premium entries have enhanced-model coverage at the provider; the rest are
/// served by standard models.
pub async fn languages_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LanguagesResponse {
            premium: premium_languages(),
            standard: standard_languages(),
        }),
    )
}

fn premium_languages() -> Vec<LanguageEntry> {
    vec![
        LanguageEntry { code: "ru-RU", name: "Russian (Russia)" },
        LanguageEntry { code: "en-US", name: "English (United States)" },
        LanguageEntry { code: "en-GB", name: "English (United Kingdom)" },
        LanguageEntry { code: "de-DE", name: "German (Germany)" },
        LanguageEntry { code: "fr-FR", name: "French (France)" },
        LanguageEntry { code: "es-ES", name: "Spanish (Spain)" },
        LanguageEntry { code: "ja-JP", name: "Japanese (Japan)" },
        LanguageEntry { code: "pt-BR", name: "Portuguese (Brazil)" },
    ]
}

fn standard_languages() -> Vec<LanguageEntry> {
    vec![
        LanguageEntry { code: "uk-UA", name: "Ukrainian (Ukraine)" },
        LanguageEntry { code: "kk-KZ", name: "Kazakh (Kazakhstan)" },
        LanguageEntry { code: "it-IT", name: "Italian (Italy)" },
        LanguageEntry { code: "nl-NL", name: "Dutch (Netherlands)" },
        LanguageEntry { code: "pl-PL", name: "Polish (Poland)" },
        LanguageEntry { code: "tr-TR", name: "Turkish (Turkey)" },
        LanguageEntry { code: "zh-CN", name: "Chinese (Simplified)" },
        LanguageEntry { code: "ko-KR", name: "Korean (South Korea)" },
        LanguageEntry { code: "ar-SA", name: "Arabic (Saudi Arabia)" },
        LanguageEntry { code: "hi-IN", name: "Hindi (India)" },
        LanguageEntry { code: "sv-SE", name: "Swedish (Sweden)" },
        LanguageEntry { code: "cs-CZ", name: "Czech (Czechia)" },
        LanguageEntry { code: "da-DK", name: "Danish (Denmark)" },
        LanguageEntry { code: "fi-FI", name: "Finnish (Finland)" },
    ]
}
