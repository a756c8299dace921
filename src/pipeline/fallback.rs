//! Fixed replies used when generation is unavailable, plus follow-up suggestions

use crate::conversation::Language;
use crate::intent::Intent;
use rand::seq::SliceRandom;
use rand::RngCore;

const FALLBACKS_EN: &[&str] = &[
    "Sorry, I can't reach my knowledge service right now. Meanwhile, you can browse the homestay list or the attractions page from the menu.",
    "I'm having trouble answering at the moment. Please try again in a little while, or ask me to show available homestays.",
    "My connection is a bit unstable right now. You can still explore homestays, activities, and directions from the main menu.",
    "I couldn't put together an answer this time. Try rephrasing your question, or contact the village office via the Contact page.",
];

const FALLBACKS_ID: &[&str] = &[
    "Maaf, saya belum bisa terhubung ke layanan pengetahuan saat ini. Sementara itu, Anda dapat melihat daftar homestay atau halaman wisata dari menu.",
    "Saya sedang kesulitan menjawab. Silakan coba lagi sebentar lagi, atau minta saya menampilkan homestay yang tersedia.",
    "Koneksi saya sedang kurang stabil. Anda tetap bisa menjelajahi homestay, aktivitas, dan petunjuk arah dari menu utama.",
    "Saya belum bisa menyusun jawaban kali ini. Coba ulangi pertanyaan dengan kata lain, atau hubungi kantor desa melalui halaman Kontak.",
];

pub fn fallback_set(language: Language) -> &'static [&'static str] {
    language.pick(FALLBACKS_EN, FALLBACKS_ID)
}

/// Uniformly random member of the fallback set
pub fn pick_fallback(language: Language, rng: &mut dyn RngCore) -> &'static str {
    let set = fallback_set(language);
    set.choose(rng).copied().unwrap_or(set[0])
}

pub fn homestay_apology(language: Language) -> &'static str {
    language.pick(
        "Sorry, I couldn't load the homestay list right now. Please try again shortly or open the Homestays page from the menu.",
        "Maaf, daftar homestay belum bisa dimuat saat ini. Silakan coba lagi sebentar lagi atau buka halaman Homestay dari menu.",
    )
}

pub fn missing_credential(language: Language) -> &'static str {
    language.pick(
        "The assistant isn't configured yet: no API key for the language model was provided. Ask the site administrator to set GEMINI_API_KEY. You can still ask me to show available homestays.",
        "Asisten belum dikonfigurasi: kunci API untuk model bahasa belum diisi. Minta administrator situs mengatur GEMINI_API_KEY. Anda tetap bisa meminta saya menampilkan homestay yang tersedia.",
    )
}

pub fn unauthorized_notice(language: Language) -> &'static str {
    language.pick(
        "The assistant's API key was rejected. Showing a basic answer instead.",
        "Kunci API asisten ditolak. Menampilkan jawaban dasar.",
    )
}

pub fn unavailable_notice(language: Language) -> &'static str {
    language.pick(
        "The assistant service is unreachable. Showing a basic answer instead.",
        "Layanan asisten tidak dapat dihubungi. Menampilkan jawaban dasar.",
    )
}

pub fn simplified_notice(language: Language) -> &'static str {
    language.pick(
        "Answered in simplified mode without conversation context.",
        "Dijawab dalam mode sederhana tanpa konteks percakapan.",
    )
}

pub fn page_request(language: Language) -> &'static str {
    language.pick(
        "Please explain what this page is about.",
        "Tolong jelaskan isi halaman ini.",
    )
}

pub fn follow_up_suggestions(intent: Intent, language: Language) -> Vec<String> {
    let replies: [&str; 3] = match intent {
        Intent::HomestayQuery => language.pick(
            [
                "Which one is the cheapest?",
                "Homestays for 4 guests",
                "How do I get there?",
            ],
            [
                "Mana yang paling murah?",
                "Homestay untuk 4 orang",
                "Bagaimana cara ke sana?",
            ],
        ),
        Intent::WeatherQuery => language.pick(
            [
                "When is the best time to visit?",
                "What should I pack?",
                "Indoor activities for rainy days",
            ],
            [
                "Kapan waktu terbaik berkunjung?",
                "Apa yang perlu saya bawa?",
                "Aktivitas saat hujan",
            ],
        ),
        Intent::Generic => language.pick(
            [
                "Show me available homestays",
                "Popular attractions",
                "What activities are there?",
            ],
            [
                "Tampilkan homestay yang tersedia",
                "Wisata populer",
                "Ada aktivitas apa saja?",
            ],
        ),
    };
    replies.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn every_fallback_is_eventually_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        for language in [Language::En, Language::Id] {
            let seen: HashSet<&str> = (0..1000)
                .map(|_| pick_fallback(language, &mut rng))
                .collect();
            assert_eq!(seen.len(), fallback_set(language).len());
        }
    }

    #[test]
    fn suggestions_are_capped_at_three() {
        for intent in [Intent::HomestayQuery, Intent::WeatherQuery, Intent::Generic] {
            assert_eq!(follow_up_suggestions(intent, Language::En).len(), 3);
        }
    }
}
