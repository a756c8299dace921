//! Knowledge aggregation for response generation
//!
//! Merges the static destination facts, the FAQ and a live inventory
//! snapshot. The inventory is fetched fresh on every call.

mod facts;
mod inventory;
mod page;

pub use facts::{faqs, static_facts, Faq, StaticFacts};
pub use inventory::{
    Homestay, HomestayDirectory, HomestayLookupError, HttpHomestayDirectory, InventoryEntry,
};
pub use page::{scan_page, PageContext, PageSnapshot};

use crate::conversation::Language;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeContext {
    pub static_facts: StaticFacts,
    pub faqs: Vec<Faq>,
    pub live_inventory: Vec<InventoryEntry>,
}

impl KnowledgeContext {
    /// Render as plain text for inclusion in a prompt
    pub fn render(&self) -> String {
        let facts = &self.static_facts;
        let mut out = String::new();

        let _ = writeln!(out, "LOCATION: {}", facts.location);
        let _ = writeln!(out, "TRANSPORT:");
        for line in facts.transport {
            let _ = writeln!(out, "- {line}");
        }
        let _ = writeln!(out, "ATTRACTIONS:");
        for line in facts.attractions {
            let _ = writeln!(out, "- {line}");
        }
        let _ = writeln!(out, "ACTIVITIES:");
        for line in facts.activities {
            let _ = writeln!(out, "- {line}");
        }
        let _ = writeln!(out, "SEASON: {}", facts.season);
        let _ = writeln!(out, "LODGING: {}", facts.lodging);

        let _ = writeln!(out, "FAQ:");
        for faq in &self.faqs {
            let _ = writeln!(out, "Q: {}\nA: {}", faq.question, faq.answer);
        }

        if self.live_inventory.is_empty() {
            let _ = writeln!(out, "HOMESTAYS: (live listing unavailable)");
        } else {
            let _ = writeln!(out, "HOMESTAYS:");
            for h in &self.live_inventory {
                let _ = writeln!(
                    out,
                    "- #{} {} | {}/night | {} | up to {} guests",
                    h.id,
                    h.title,
                    format_rupiah(h.price),
                    h.location,
                    h.max_guests
                );
            }
        }
        out
    }
}

/// Builds knowledge contexts from static data and the inventory collaborator
pub struct KnowledgeAggregator {
    directory: Arc<dyn HomestayDirectory>,
}

impl KnowledgeAggregator {
    pub fn new(directory: Arc<dyn HomestayDirectory>) -> Self {
        Self { directory }
    }

    /// Current inventory, straight from the collaborator
    pub async fn live_inventory(
        &self,
        language: Language,
    ) -> Result<Vec<Homestay>, HomestayLookupError> {
        self.directory.all_homestays(language).await
    }

    /// Static facts plus a fresh inventory snapshot. A failed fetch leaves
    /// the inventory empty; the rest of the context is still returned.
    pub async fn generate_context(&self, language: Language) -> KnowledgeContext {
        let live_inventory = match self.live_inventory(language).await {
            Ok(list) => list.iter().map(InventoryEntry::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Inventory unavailable, continuing with static facts");
                Vec::new()
            }
        };

        KnowledgeContext {
            static_facts: static_facts(language),
            faqs: faqs(language),
            live_inventory,
        }
    }
}

/// `Rp250.000` style formatting
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_homestays, MockHomestayDirectory};

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(0), "Rp0");
        assert_eq!(format_rupiah(950), "Rp950");
        assert_eq!(format_rupiah(150_000), "Rp150.000");
        assert_eq!(format_rupiah(1_250_000), "Rp1.250.000");
    }

    #[tokio::test]
    async fn context_includes_live_inventory() {
        let directory = Arc::new(MockHomestayDirectory::with(sample_homestays(2)));
        let aggregator = KnowledgeAggregator::new(directory.clone());

        let ctx = aggregator.generate_context(Language::En).await;
        assert_eq!(ctx.live_inventory.len(), 2);
        assert_eq!(ctx.faqs.len(), 4);
        assert!(ctx.render().contains("#1 "));

        // every call goes back to the collaborator
        aggregator.generate_context(Language::En).await;
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn failed_inventory_degrades_to_static_facts() {
        let aggregator = KnowledgeAggregator::new(Arc::new(MockHomestayDirectory::failing()));

        let ctx = aggregator.generate_context(Language::Id).await;
        assert!(ctx.live_inventory.is_empty());
        assert!(ctx.static_facts.location.contains("Lembah Hijau"));
        assert!(ctx.render().contains("live listing unavailable"));
    }
}
