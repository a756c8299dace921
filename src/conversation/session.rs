//! Session configuration and localized conversation chrome

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Id,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Id,
            Language::Id => Language::En,
        }
    }

    /// Pick the variant for this language
    pub fn pick<T>(self, en: T, id: T) -> T {
        match self {
            Language::En => en,
            Language::Id => id,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "id" => Ok(Language::Id),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Per-conversation presentation settings.
///
/// Only `reset`/`toggle_language` on the controller change these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub bot_name: String,
    pub greeting: String,
    pub language: Language,
    pub theme: String,
}

impl SessionConfig {
    pub fn new(bot_name: impl Into<String>, language: Language, theme: impl Into<String>) -> Self {
        let bot_name = bot_name.into();
        Self {
            greeting: greeting(language, &bot_name),
            bot_name,
            language,
            theme: theme.into(),
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.greeting = greeting(language, &self.bot_name);
    }
}

pub fn greeting(language: Language, bot_name: &str) -> String {
    match language {
        Language::En => format!(
            "Hi! I'm {bot_name}, your guide to Lembah Hijau Tourism Village. \
             Ask me about homestays, attractions, activities, or how to get here."
        ),
        Language::Id => format!(
            "Halo! Saya {bot_name}, pemandu Anda di Desa Wisata Lembah Hijau. \
             Tanyakan tentang homestay, tempat wisata, aktivitas, atau cara menuju ke sini."
        ),
    }
}

pub fn greeting_suggestions(language: Language) -> Vec<String> {
    let replies: [&str; 3] = language.pick(
        [
            "Show me available homestays",
            "What can I do in the village?",
            "How do I get there?",
        ],
        [
            "Tampilkan homestay yang tersedia",
            "Apa saja kegiatan di desa?",
            "Bagaimana cara ke sana?",
        ],
    );
    replies.iter().map(ToString::to_string).collect()
}

/// Quick action offered before the first user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAction {
    pub label: String,
    pub kind: QuickActionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickActionKind {
    /// Send the label as a user message
    Ask,
    /// Run a page analysis on the current page
    AnalyzePage,
}

pub fn quick_actions(language: Language) -> Vec<QuickAction> {
    let ask = |label: &str| QuickAction {
        label: label.to_string(),
        kind: QuickActionKind::Ask,
    };
    let mut actions: Vec<QuickAction> = language
        .pick(
            ["Find a homestay", "Weather this week", "Popular attractions"],
            ["Cari homestay", "Cuaca minggu ini", "Wisata populer"],
        )
        .iter()
        .map(|label| ask(label))
        .collect();
    actions.push(QuickAction {
        label: language.pick("Explain this page", "Jelaskan halaman ini").to_string(),
        kind: QuickActionKind::AnalyzePage,
    });
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_codes() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" id ".parse::<Language>().unwrap(), Language::Id);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::En.toggled(), Language::Id);
        assert_eq!(Language::Id.toggled().toggled(), Language::Id);
    }

    #[test]
    fn set_language_refreshes_greeting() {
        let mut session = SessionConfig::new("Sari", Language::Id, "forest");
        assert!(session.greeting.starts_with("Halo"));
        session.set_language(Language::En);
        assert!(session.greeting.starts_with("Hi!"));
        assert!(session.greeting.contains("Sari"));
    }

    #[test]
    fn greeting_suggestions_have_three_entries() {
        assert_eq!(greeting_suggestions(Language::En).len(), 3);
        assert_eq!(greeting_suggestions(Language::Id).len(), 3);
    }
}
