//! Response generation pipeline
//!
//! Per turn, in priority order:
//! 1. homestay questions are answered from the live inventory, bypassing
//!    the generative backend
//! 2. everything else goes to the backend with full context
//! 3. a request-format failure of (2) is retried once with a minimal prompt
//! 4. any other failure ends in a random static fallback
//!
//! Nothing here returns an error; every path produces a reply.

mod fallback;
mod prompt;

pub use fallback::{fallback_set, page_request};
pub use prompt::history_window;

use crate::actions::{Action, ActionButton, ButtonVariant};
use crate::conversation::{Attachments, Language, SessionConfig, MAX_ACTION_BUTTONS};
use crate::intent::{self, Intent};
use crate::knowledge::{format_rupiah, Homestay, KnowledgeAggregator, PageContext};
use crate::llm::{FailureClass, LlmError, LlmMessage, LlmService};
use rand::RngCore;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Entries summarized in a homestay reply
pub const HOMESTAY_SUMMARY_LIMIT: usize = 3;

/// Which strategy produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Configuration,
    Inventory,
    InventoryApology,
    Primary,
    DegradedRetry,
    StaticFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient, non-blocking message shown beside the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: &str) -> Self {
        Self {
            level,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub text: String,
    pub action_buttons: Option<Vec<ActionButton>>,
    pub suggested_replies: Option<Vec<String>>,
    pub attachments: Attachments,
    pub notice: Option<Notice>,
    pub tier: Tier,
}

impl PipelineResult {
    fn plain(text: impl Into<String>, tier: Tier) -> Self {
        Self {
            text: text.into(),
            action_buttons: None,
            suggested_replies: None,
            attachments: Attachments::default(),
            notice: None,
            tier,
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggested_replies = Some(suggestions);
        self
    }
}

/// Everything the pipeline needs to know about the current turn
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub utterance: &'a str,
    pub session: &'a SessionConfig,
    pub history: &'a [LlmMessage],
    pub page: Option<&'a PageContext>,
}

pub struct ResponsePipeline {
    /// `None` when no credential is configured
    llm: Option<Arc<dyn LlmService>>,
    knowledge: KnowledgeAggregator,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl ResponsePipeline {
    pub fn new(
        llm: Option<Arc<dyn LlmService>>,
        knowledge: KnowledgeAggregator,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self {
            llm,
            knowledge,
            rng: Mutex::new(rng),
        }
    }

    pub async fn respond(&self, input: TurnInput<'_>) -> PipelineResult {
        let intent = intent::classify(input.utterance);
        tracing::debug!(intent = ?intent, "Routing turn");

        let result = match intent {
            Intent::HomestayQuery => self.homestay_reply(input.session.language).await,
            Intent::WeatherQuery | Intent::Generic => self.generate(input, intent).await,
        };

        tracing::info!(intent = ?intent, tier = ?result.tier, "Reply produced");
        result
    }

    async fn homestay_reply(&self, language: Language) -> PipelineResult {
        match self.knowledge.live_inventory(language).await {
            Ok(list) => summarize_homestays(&list, language),
            Err(e) => {
                tracing::warn!(error = %e, "Homestay lookup failed");
                PipelineResult::plain(fallback::homestay_apology(language), Tier::InventoryApology)
            }
        }
    }

    async fn generate(&self, input: TurnInput<'_>, intent: Intent) -> PipelineResult {
        let language = input.session.language;
        let Some(llm) = &self.llm else {
            return PipelineResult::plain(fallback::missing_credential(language), Tier::Configuration);
        };
        let suggestions = fallback::follow_up_suggestions(intent, language);

        let knowledge = self.knowledge.generate_context(language).await;
        let request = prompt::primary_request(
            input.session,
            intent::topic_label(input.utterance),
            &knowledge,
            input.page,
            input.history,
            input.utterance,
        );

        let failure = match llm.complete(&request).await {
            Ok(response) => {
                return PipelineResult::plain(response.text, Tier::Primary).with_suggestions(suggestions);
            }
            Err(e) => e,
        };

        let failure = if failure.kind.is_retryable() {
            tracing::warn!(error = %failure, "Primary request rejected, retrying with minimal prompt");
            let retry = prompt::minimal_request(input.session, input.utterance);
            match llm.complete(&retry).await {
                Ok(response) => {
                    return PipelineResult::plain(response.text, Tier::DegradedRetry)
                        .with_suggestions(suggestions)
                        .with_notice(Notice::new(
                            NoticeLevel::Info,
                            fallback::simplified_notice(language),
                        ));
                }
                Err(e) => e,
            }
        } else {
            failure
        };

        self.static_fallback(language, &failure)
    }

    fn static_fallback(&self, language: Language, failure: &LlmError) -> PipelineResult {
        tracing::warn!(error = %failure, class = ?failure.class(), "Falling back to static reply");
        let text = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            fallback::pick_fallback(language, rng.as_mut())
        };
        let notice = match failure.class() {
            FailureClass::Unauthorized => {
                Notice::new(NoticeLevel::Error, fallback::unauthorized_notice(language))
            }
            FailureClass::Retryable | FailureClass::Fatal => {
                Notice::new(NoticeLevel::Warning, fallback::unavailable_notice(language))
            }
        };
        PipelineResult::plain(text, Tier::StaticFallback).with_notice(notice)
    }
}

/// Text summary of up to three homestays with view/book buttons for each and
/// one listing filter, capped at the per-message button limit.
fn summarize_homestays(list: &[Homestay], language: Language) -> PipelineResult {
    let shown = &list[..list.len().min(HOMESTAY_SUMMARY_LIMIT)];

    let mut text = if shown.is_empty() {
        language
            .pick(
                "There are no homestays listed at the moment. Please check the Homestays page again later.",
                "Saat ini belum ada homestay yang terdaftar. Silakan cek halaman Homestay lagi nanti.",
            )
            .to_string()
    } else {
        language
            .pick("Here are homestays you can book:", "Berikut homestay yang bisa Anda pesan:")
            .to_string()
    };

    let mut buttons = Vec::with_capacity(shown.len() * 2 + 1);
    for (i, h) in shown.iter().enumerate() {
        let per_night = language.pick("night", "malam");
        let guests = language.pick("guests", "tamu");
        text.push_str(&format!(
            "\n{}. {} - {}/{per_night}, {}, max {} {guests}",
            i + 1,
            h.title,
            format_rupiah(h.base_price),
            h.location,
            h.max_guests,
        ));
        buttons.push(
            ActionButton::new(
                format!("{} {}", language.pick("View", "Lihat"), h.title),
                Action::View { id: h.id },
            )
            .with_icon("eye")
            .with_variant(ButtonVariant::Outline),
        );
        buttons.push(
            ActionButton::new(
                format!("{} {}", language.pick("Book", "Pesan"), h.title),
                Action::Book { id: h.id },
            )
            .with_icon("calendar"),
        );
    }
    if list.len() > shown.len() {
        text.push_str(&language.pick(
            format!("\n(+{} more on the Homestays page)", list.len() - shown.len()),
            format!("\n(+{} lainnya di halaman Homestay)", list.len() - shown.len()),
        ));
    }
    buttons.push(
        ActionButton::new(
            language.pick("All homestays", "Semua homestay"),
            Action::Filter {
                params: "sort=price".to_string(),
            },
        )
        .with_icon("filter")
        .with_variant(ButtonVariant::Secondary),
    );
    buttons.truncate(MAX_ACTION_BUTTONS);

    let attachments = Attachments {
        images: shown.iter().filter_map(|h| h.images.first().cloned()).collect(),
        ..Attachments::default()
    };

    PipelineResult {
        text,
        action_buttons: Some(buttons),
        suggested_replies: Some(fallback::follow_up_suggestions(Intent::HomestayQuery, language)),
        attachments,
        notice: None,
        tier: Tier::Inventory,
    }
}
