//! Keyword-based intent routing

use serde::Serialize;

const HOMESTAY_KEYWORDS: &[&str] = &[
    "homestay",
    "home stay",
    "penginapan",
    "menginap",
    "inap",
    "accommodation",
    "lodging",
    "kamar",
    "room",
    "where to stay",
    "tempat tinggal",
];

const WEATHER_KEYWORDS: &[&str] = &[
    "weather", "cuaca", "rain", "hujan", "forecast", "prakiraan", "temperature", "suhu",
    "sunny", "cerah",
];

/// Words that mark a question as being about the destination rather than
/// general chit-chat. Only used to bias phrasing of the generated answer.
const DOMAIN_KEYWORDS: &[&str] = &[
    "village", "desa", "wisata", "tour", "attraction", "activity", "aktivitas", "kegiatan",
    "waterfall", "curug", "tea", "teh", "lake", "danau", "trek", "camping", "kemah", "book",
    "pesan", "price", "harga", "ticket", "tiket", "transport", "bandung", "ciwidey", "lembah",
    "homestay", "visit", "kunjung", "season", "musim", "culinary", "kuliner", "angklung",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    HomestayQuery,
    WeatherQuery,
    Generic,
}

/// Classify an utterance. Homestay wins when both keyword sets match.
pub fn classify(utterance: &str) -> Intent {
    let lowered = utterance.to_lowercase();
    if contains_any(&lowered, HOMESTAY_KEYWORDS) {
        Intent::HomestayQuery
    } else if contains_any(&lowered, WEATHER_KEYWORDS) {
        Intent::WeatherQuery
    } else {
        Intent::Generic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicLabel {
    Domain,
    General,
}

impl TopicLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TopicLabel::Domain => "DOMAIN",
            TopicLabel::General => "GENERAL",
        }
    }
}

pub fn topic_label(utterance: &str) -> TopicLabel {
    if contains_any(&utterance.to_lowercase(), DOMAIN_KEYWORDS) {
        TopicLabel::Domain
    } else {
        TopicLabel::General
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|k| haystack.contains(k))
}
