//! Homestay inventory collaborator

use crate::conversation::Language;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Homestay listing as served by the inventory backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homestay {
    pub id: i64,
    pub title: String,
    #[serde(deserialize_with = "lenient_price")]
    pub base_price: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub max_guests: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Entry of the live inventory section of the knowledge context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: i64,
    pub title: String,
    pub price: u64,
    pub location: String,
    pub max_guests: u32,
}

impl From<&Homestay> for InventoryEntry {
    fn from(h: &Homestay) -> Self {
        Self {
            id: h.id,
            title: h.title.clone(),
            price: h.base_price,
            location: h.location.clone(),
            max_guests: h.max_guests,
        }
    }
}

#[derive(Debug, Error)]
pub enum HomestayLookupError {
    #[error("homestay request failed: {0}")]
    Transport(String),
    #[error("homestay service returned HTTP {0}")]
    Status(u16),
    #[error("unreadable homestay payload: {0}")]
    Decode(String),
}

/// Source of the current homestay inventory
#[async_trait]
pub trait HomestayDirectory: Send + Sync {
    /// Fetch every listed homestay. Implementations may ignore `language`.
    async fn all_homestays(&self, language: Language) -> Result<Vec<Homestay>, HomestayLookupError>;
}

#[async_trait]
impl<T: HomestayDirectory + ?Sized> HomestayDirectory for Arc<T> {
    async fn all_homestays(&self, language: Language) -> Result<Vec<Homestay>, HomestayLookupError> {
        (**self).all_homestays(language).await
    }
}

/// Inventory backend reached over HTTP (`GET {base}/homestays?lang=..`)
pub struct HttpHomestayDirectory {
    client: Client,
    endpoint: String,
}

impl HttpHomestayDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HomestayLookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HomestayLookupError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/homestays", base_url.trim_end_matches('/')),
        })
    }
}

/// The backend answers with either a bare list or a `{ "data": [...] }` envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum HomestayPayload {
    Bare(Vec<Homestay>),
    Envelope { data: Vec<Homestay> },
}

#[async_trait]
impl HomestayDirectory for HttpHomestayDirectory {
    async fn all_homestays(&self, language: Language) -> Result<Vec<Homestay>, HomestayLookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("lang", language.code())])
            .send()
            .await
            .map_err(|e| HomestayLookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HomestayLookupError::Status(status.as_u16()));
        }

        let payload: HomestayPayload = response
            .json()
            .await
            .map_err(|e| HomestayLookupError::Decode(e.to_string()))?;

        Ok(match payload {
            HomestayPayload::Bare(list) | HomestayPayload::Envelope { data: list } => list,
        })
    }
}

/// Accept prices given as integers, floats, or numeric strings
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Raw::Float(f) if f.is_finite() && f >= 0.0 => Ok(f.round() as u64),
        Raw::Float(f) => Err(serde::de::Error::custom(format!("invalid price {f}"))),
        Raw::Text(s) => parse_price_text(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price {s:?}"))),
    }
}

/// "250.000" and "1.250.000" use dots as thousands separators; anything
/// else with a dot is read as a decimal and rounded.
fn parse_price_text(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let groups: Vec<&str> = raw.split('.').collect();
    let all_digits = |g: &str| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit());

    let grouped = groups.len() > 1
        && (1..=3).contains(&groups[0].len())
        && groups.iter().all(|g| all_digits(g))
        && groups[1..].iter().all(|g| g.len() == 3);
    if grouped {
        return groups.concat().parse().ok();
    }

    match groups.as_slice() {
        [whole] if all_digits(whole) => whole.parse().ok(),
        [whole, fraction] if all_digits(whole) && all_digits(fraction) => {
            let value: f64 = raw.parse().ok()?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rounded = value.round() as u64;
            Some(rounded)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn prices_are_decoded_leniently() {
        let list: Vec<Homestay> = serde_json::from_value(json!([
            {"id": 1, "title": "A", "base_price": 250000, "location": "RT 01", "max_guests": 4},
            {"id": 2, "title": "B", "base_price": "175000.00", "location": "RT 02", "max_guests": 2, "images": ["b.jpg"]},
            {"id": 3, "title": "C", "base_price": 300000.0}
        ]))
        .unwrap();
        assert_eq!(list[0].base_price, 250_000);
        assert_eq!(list[1].base_price, 175_000);
        assert_eq!(list[1].images, vec!["b.jpg".to_string()]);
        assert_eq!(list[2].base_price, 300_000);
        assert_eq!(list[2].max_guests, 0);
    }

    #[test]
    fn dotted_thousands_are_not_read_as_decimals() {
        assert_eq!(parse_price_text("250.000"), Some(250_000));
        assert_eq!(parse_price_text(" 1.250.000 "), Some(1_250_000));
        assert_eq!(parse_price_text("175000.00"), Some(175_000));
        assert_eq!(parse_price_text("99.5"), Some(100));
        assert_eq!(parse_price_text("300000"), Some(300_000));
        assert_eq!(parse_price_text("1.25.000"), None);
        assert_eq!(parse_price_text("Rp 250.000"), None);
        assert_eq!(parse_price_text(""), None);

        let stay: Homestay =
            serde_json::from_value(json!({"id": 4, "title": "D", "base_price": "450.000"})).unwrap();
        assert_eq!(stay.base_price, 450_000);
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn fetches_envelope_payload_with_language() {
        let router = Router::new().route(
            "/api/homestays",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let title = if q.get("lang").map(String::as_str) == Some("en") {
                    "Bamboo Cottage"
                } else {
                    "Pondok Bambu"
                };
                Json(json!({"data": [{"id": 7, "title": title, "base_price": 200000}]}))
            }),
        );
        let base = serve(router).await;
        let directory = HttpHomestayDirectory::new(&base, Duration::from_secs(5)).unwrap();

        let list = directory.all_homestays(Language::En).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Bamboo Cottage");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new().route("/api/homestays", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(router).await;
        let directory = HttpHomestayDirectory::new(&base, Duration::from_secs(5)).unwrap();

        let err = directory.all_homestays(Language::Id).await.unwrap_err();
        assert!(matches!(err, HomestayLookupError::Status(503)));
    }
}
