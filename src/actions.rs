//! Action buttons embedded in assistant replies and their dispatch
//!
//! Each `Action` variant carries its own payload type. Wire payloads whose
//! tag or shape is not recognized decode to `Action::Unknown` and are
//! ignored at dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const BOOKING_ROUTE: &str = "/book-now";
pub const DETAIL_ROUTE: &str = "/homestay";
pub const LISTING_ROUTE: &str = "/homestays";

/// Directive attached to a button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Book { id: i64 },
    View { id: i64 },
    Filter { params: String },
    Navigate { path: String },
    External { url: String },
    /// Fallback for unknown tags or payloads that do not fit their tag
    Unknown { tag: String, data: Value },
}

impl Action {
    pub fn tag(&self) -> &str {
        match self {
            Action::Book { .. } => "book",
            Action::View { .. } => "view",
            Action::Filter { .. } => "filter",
            Action::Navigate { .. } => "navigate",
            Action::External { .. } => "external",
            Action::Unknown { tag, .. } => tag,
        }
    }

    fn data(&self) -> Value {
        match self {
            Action::Book { id } | Action::View { id } => json!({ "id": id }),
            Action::Filter { params } => json!({ "params": params }),
            Action::Navigate { path } => json!({ "path": path }),
            Action::External { url } => json!({ "url": url }),
            Action::Unknown { data, .. } => data.clone(),
        }
    }

    /// Parse from wire tag and payload
    pub fn from_tag_and_data(tag: &str, data: Value) -> Self {
        let parsed = match tag {
            "book" => id_field(&data).map(|id| Action::Book { id }),
            "view" => id_field(&data).map(|id| Action::View { id }),
            "filter" => string_field(&data, "params").map(|params| Action::Filter { params }),
            "navigate" => string_field(&data, "path").map(|path| Action::Navigate { path }),
            "external" => string_field(&data, "url").map(|url| Action::External { url }),
            _ => None,
        };
        parsed.unwrap_or_else(|| Action::Unknown {
            tag: tag.to_string(),
            data,
        })
    }
}

fn id_field(data: &Value) -> Option<i64> {
    match data.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)?.as_str().map(ToString::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Outline,
}

/// Clickable directive embedded in an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireButton", into = "WireButton")]
pub struct ActionButton {
    pub label: String,
    pub action: Action,
    pub icon: Option<String>,
    pub variant: ButtonVariant,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
            icon: None,
            variant: ButtonVariant::Primary,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }
}

#[derive(Serialize, Deserialize)]
struct WireButton {
    label: String,
    action: String,
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default)]
    variant: ButtonVariant,
}

impl From<WireButton> for ActionButton {
    fn from(w: WireButton) -> Self {
        Self {
            label: w.label,
            action: Action::from_tag_and_data(&w.action, w.data),
            icon: w.icon,
            variant: w.variant,
        }
    }
}

impl From<ActionButton> for WireButton {
    fn from(b: ActionButton) -> Self {
        Self {
            label: b.label,
            action: b.action.tag().to_string(),
            data: b.action.data(),
            icon: b.icon,
            variant: b.variant,
        }
    }
}

/// Where a dispatched action sends the visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum NavigationTarget {
    /// In-app route
    Route(String),
    /// URL opened in a new browsing context
    NewContext(String),
}

/// Side-effect sink for navigation
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &NavigationTarget);
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn navigate(&self, target: &NavigationTarget) {
        (**self).navigate(target);
    }
}

/// Resolves action buttons into navigation side effects
pub struct ActionDispatcher<N> {
    navigator: N,
}

impl<N: Navigator> ActionDispatcher<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    /// Execute the button's action. Unknown actions do nothing.
    pub fn execute(&self, button: &ActionButton) -> Option<NavigationTarget> {
        let target = resolve(&button.action)?;
        tracing::info!(action = button.action.tag(), target = ?target, "Dispatching action");
        self.navigator.navigate(&target);
        Some(target)
    }
}

fn resolve(action: &Action) -> Option<NavigationTarget> {
    match action {
        Action::Book { id } => Some(NavigationTarget::Route(format!(
            "{BOOKING_ROUTE}?homestay={id}"
        ))),
        Action::View { id } => Some(NavigationTarget::Route(format!("{DETAIL_ROUTE}/{id}"))),
        Action::Filter { params } => {
            let params = params.trim_start_matches('?');
            Some(NavigationTarget::Route(if params.is_empty() {
                LISTING_ROUTE.to_string()
            } else {
                format!("{LISTING_ROUTE}?{params}")
            }))
        }
        Action::Navigate { path } => Some(NavigationTarget::Route(path.clone())),
        Action::External { url } => Some(NavigationTarget::NewContext(url.clone())),
        Action::Unknown { tag, .. } => {
            tracing::debug!(tag = %tag, "Ignoring unknown action");
            None
        }
    }
}
