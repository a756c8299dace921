//! Prompt construction for the generative backend

use crate::conversation::{Language, Message, Role, SessionConfig};
use crate::intent::TopicLabel;
use crate::knowledge::{KnowledgeContext, PageContext};
use crate::llm::{GenerationParams, LlmMessage, LlmRequest, SafetySetting, SystemContent};

/// Completed messages carried into a request
pub const HISTORY_WINDOW: usize = 10;

fn instructions(session: &SessionConfig) -> String {
    let bot = &session.bot_name;
    match session.language {
        Language::En => format!(
            "You are {bot}, the friendly virtual guide of Lembah Hijau Tourism Village in West Java, Indonesia.
Answer in English. Keep answers short (at most 4 sentences or a brief list) and practical.
Only state prices, homestays, and facts that appear in the provided knowledge; if something is not covered, say so and suggest contacting the village office.
Never invent bookings or confirm reservations yourself; point visitors to the booking page instead."
        ),
        Language::Id => format!(
            "Anda adalah {bot}, pemandu virtual yang ramah dari Desa Wisata Lembah Hijau di Jawa Barat, Indonesia.
Jawab dalam Bahasa Indonesia. Jawaban singkat (maksimal 4 kalimat atau daftar pendek) dan praktis.
Hanya sebutkan harga, homestay, dan fakta yang ada di pengetahuan yang diberikan; jika tidak tercakup, katakan demikian dan sarankan menghubungi kantor desa.
Jangan membuat atau mengonfirmasi pemesanan sendiri; arahkan pengunjung ke halaman pemesanan."
        ),
    }
}

fn label_guidance(label: TopicLabel) -> String {
    let hint = match label {
        TopicLabel::Domain => "The question is about the village; answer from the knowledge below and mention a relevant attraction, activity, or homestay when it helps.",
        TopicLabel::General => "The question is general; answer briefly and, where natural, relate it back to visiting the village.",
    };
    format!("QUESTION TYPE: {}\n{hint}", label.as_str())
}

fn page_section(page: &PageContext) -> String {
    format!(
        "CURRENT PAGE\nPath: {}\nTitle: {}\n{}",
        page.path, page.title, page.extracted_text
    )
}

/// Full request: instructions, classification label, knowledge, optional
/// page context, prior turns, and the utterance, with tuned sampling.
pub fn primary_request(
    session: &SessionConfig,
    label: TopicLabel,
    knowledge: &KnowledgeContext,
    page: Option<&PageContext>,
    history: &[LlmMessage],
    utterance: &str,
) -> LlmRequest {
    let mut system = vec![
        SystemContent::new(instructions(session)),
        SystemContent::new(label_guidance(label)),
        SystemContent::new(format!("KNOWLEDGE\n{}", knowledge.render())),
    ];
    if let Some(page) = page {
        system.push(SystemContent::new(page_section(page)));
    }

    let mut messages = history.to_vec();
    messages.push(LlmMessage::user(utterance));

    LlmRequest {
        system,
        messages,
        generation: Some(GenerationParams::default()),
        safety: SafetySetting::standard(),
    }
}

/// Degraded request: instructions and utterance only, backend defaults
pub fn minimal_request(session: &SessionConfig, utterance: &str) -> LlmRequest {
    LlmRequest {
        system: vec![SystemContent::new(instructions(session))],
        messages: vec![LlmMessage::user(utterance)],
        generation: None,
        safety: Vec::new(),
    }
}

/// Prior turns for the backend: the last completed messages, without audit
/// entries, starting with a user turn and with same-role runs merged.
pub fn history_window(messages: &[Message]) -> Vec<LlmMessage> {
    let eligible: Vec<&Message> = messages
        .iter()
        .filter(|m| !m.is_animating && !m.is_audit() && !m.content.trim().is_empty())
        .collect();
    let recent = eligible
        .get(eligible.len().saturating_sub(HISTORY_WINDOW)..)
        .unwrap_or_default();

    let mut out: Vec<LlmMessage> = Vec::new();
    for msg in recent.iter().skip_while(|m| m.role == Role::Assistant) {
        let turn = match msg.role {
            Role::User => LlmMessage::user(msg.content.as_str()),
            Role::Assistant => LlmMessage::assistant(msg.content.as_str()),
        };
        match out.last_mut() {
            Some(last) if last.role == turn.role => {
                last.text.push('\n');
                last.text.push_str(&turn.text);
            }
            _ => out.push(turn),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{faqs, static_facts};
    use crate::llm::MessageRole;

    fn knowledge() -> KnowledgeContext {
        KnowledgeContext {
            static_facts: static_facts(Language::En),
            faqs: faqs(Language::En),
            live_inventory: vec![],
        }
    }

    #[test]
    fn primary_request_carries_everything() {
        let session = SessionConfig::new("Sari", Language::En, "default");
        let page = PageContext {
            path: "/tours".into(),
            title: "Tours".into(),
            extracted_text: "Content: Sunrise tour".into(),
        };
        let history = vec![LlmMessage::user("hi"), LlmMessage::assistant("hello")];
        let req = primary_request(&session, TopicLabel::Domain, &knowledge(), Some(&page), &history, "what now?");

        assert_eq!(req.system.len(), 4);
        assert!(req.system[0].text.contains("Sari"));
        assert!(req.system[1].text.contains("DOMAIN"));
        assert!(req.system[2].text.contains("LOCATION"));
        assert!(req.system[3].text.contains("Sunrise tour"));
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[2].text, "what now?");
        assert!(req.generation.is_some());
        assert_eq!(req.safety.len(), 4);
    }

    #[test]
    fn minimal_request_is_bare() {
        let session = SessionConfig::new("Sari", Language::Id, "default");
        let req = minimal_request(&session, "halo");
        assert_eq!(req.system.len(), 1);
        assert_eq!(req.messages, vec![LlmMessage::user("halo")]);
        assert!(req.generation.is_none());
        assert!(req.safety.is_empty());
    }

    #[test]
    fn history_skips_greeting_audit_and_merges_runs() {
        let mut streaming = Message::streaming();
        streaming.content = "partial".into();
        let messages = vec![
            Message::assistant("Welcome!", vec![]),
            Message::user("rooms?"),
            Message::assistant("Here are rooms", vec![]),
            Message::audit("Book Pondok"),
            Message::user("thanks"),
            Message::user("and the lake?"),
            streaming,
        ];
        let history = history_window(&messages);
        let roles: Vec<MessageRole> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]);
        assert_eq!(history[2].text, "thanks\nand the lake?");
    }

    #[test]
    fn history_is_windowed() {
        let messages: Vec<Message> = (0..30)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("q{i}"))
                } else {
                    Message::assistant(format!("a{i}"), vec![])
                }
            })
            .collect();
        let history = history_window(&messages);
        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history[0].text, "q20");
    }
}
