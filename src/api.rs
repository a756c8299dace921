//! HTTP API exposing conversations to the site widget

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::conversation::{Conversation, ConversationDeps, Language, SessionConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Floor on the sweep period so tiny TTLs don't spin
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Presentation defaults for new conversations
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub bot_name: String,
    pub language: Language,
    pub theme: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    conversations: Arc<RwLock<HashMap<String, Arc<Conversation>>>>,
    deps: ConversationDeps,
    defaults: SessionDefaults,
}

impl AppState {
    pub fn new(deps: ConversationDeps, defaults: SessionDefaults) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            deps,
            defaults,
        }
    }

    async fn create_conversation(&self, language: Option<Language>) -> Arc<Conversation> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = SessionConfig::new(
            self.defaults.bot_name.clone(),
            language.unwrap_or(self.defaults.language),
            self.defaults.theme.clone(),
        );
        let conversation = Arc::new(Conversation::new(id.clone(), session, self.deps.clone()));
        self.conversations
            .write()
            .await
            .insert(id.clone(), conversation.clone());
        tracing::info!(conv_id = %id, "Conversation created");
        conversation
    }

    async fn conversation(&self, id: &str) -> Option<Arc<Conversation>> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn remove_conversation(&self, id: &str) -> Option<Arc<Conversation>> {
        let removed = self.conversations.write().await.remove(id);
        if removed.is_some() {
            tracing::info!(conv_id = %id, "Conversation removed");
        }
        removed
    }

    /// Drop conversations untouched for at least `ttl`. Busy or subscribed
    /// conversations are kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|id, conversation| match conversation.idle_for() {
            Some(idle) if idle >= ttl => {
                tracing::info!(conv_id = %id, idle_secs = idle.as_secs(), "Conversation expired");
                conversation.close();
                false
            }
            _ => true,
        });
        before - conversations.len()
    }

    /// Periodically evict idle conversations
    pub fn spawn_idle_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let period = (ttl / 4).max(MIN_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = state.evict_idle(ttl).await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Idle sweep finished");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeAggregator;
    use crate::llm::LlmService;
    use crate::pipeline::ResponsePipeline;
    use crate::testing::{InstantScheduler, MockHomestayDirectory, MockLlmClient};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TTL: Duration = Duration::from_secs(600);

    fn state() -> AppState {
        let pipeline = ResponsePipeline::new(
            Some(Arc::new(MockLlmClient::new()) as Arc<dyn LlmService>),
            KnowledgeAggregator::new(Arc::new(MockHomestayDirectory::with(vec![]))),
            Box::new(StdRng::seed_from_u64(5)),
        );
        AppState::new(
            ConversationDeps {
                pipeline: Arc::new(pipeline),
                scheduler: Arc::new(InstantScheduler::default()),
                base_delay: Duration::from_millis(1),
            },
            SessionDefaults {
                bot_name: "Sari".into(),
                language: Language::Id,
                theme: "forest".into(),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn only_conversations_past_the_ttl_are_evicted() {
        let state = state();
        let stale = state.create_conversation(None).await;
        let recent = state.create_conversation(Some(Language::En)).await;
        let watched = state.create_conversation(None).await;
        let _rx = watched.subscribe();

        tokio::time::advance(TTL - Duration::from_secs(60)).await;
        let _ = recent.snapshot();
        tokio::time::advance(Duration::from_secs(60)).await;

        assert_eq!(state.evict_idle(TTL).await, 1);
        assert!(state.conversation(stale.id()).await.is_none());
        assert!(state.conversation(recent.id()).await.is_some());
        assert!(state.conversation(watched.id()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_clears_abandoned_conversations() {
        let state = state();
        let conversation = state.create_conversation(None).await;
        let sweeper = state.spawn_idle_sweeper(TTL);

        tokio::time::sleep(TTL + TTL / 2).await;

        assert!(state.conversation(conversation.id()).await.is_none());
        sweeper.abort();
    }

    #[tokio::test]
    async fn removing_twice_finds_nothing() {
        let state = state();
        let conversation = state.create_conversation(None).await;

        assert!(state.remove_conversation(conversation.id()).await.is_some());
        assert!(state.remove_conversation(conversation.id()).await.is_none());
    }
}
