use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Seconds the host waits before re-running the script filter.
pub const RERUN_INTERVAL_SECS: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Default,
    Fallback,
    MultiSelect,
    Rerun,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "default" => Some(Self::Default),
            "fallback" => Some(Self::Fallback),
            "multi-select" => Some(Self::MultiSelect),
            "rerun" => Some(Self::Rerun),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Fallback => "fallback",
            Self::MultiSelect => "multi-select",
            Self::Rerun => "rerun",
        }
    }

    /// Explicit invocations are never suppressed.
    pub fn bypasses_suppression(self) -> bool {
        matches!(self, Self::Fallback | Self::MultiSelect)
    }

    /// Recomputations reuse icons and previews resolved by an earlier run.
    pub fn skips_buffering(self) -> bool {
        matches!(self, Self::Rerun | Self::MultiSelect)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State the host round-trips from the previous invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionHandoff {
    pub old_query: Option<String>,
    /// JSON-encoded display items of the previous settled run.
    pub old_results: Option<String>,
}

impl SessionHandoff {
    pub fn new(old_query: Option<&str>, old_results: Option<&str>) -> Self {
        Self {
            old_query: old_query.map(str::to_string),
            old_results: old_results.map(str::to_string),
        }
    }

    /// Previous items; absent or unreadable handoffs count as empty.
    pub fn previous_items(&self) -> Vec<DisplayItem> {
        let Some(raw) = self.old_results.as_deref().filter(|r| !r.trim().is_empty()) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<DisplayItem>>(raw) {
            Ok(items) => items,
            Err(error) => {
                crate::logging::warn(&format!("discarding unreadable oldResults: {error}"));
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Keyword the host triggered the script filter with, prepended to the argument.
    pub trigger_prefix: String,
    pub argument: String,
    pub mode: Mode,
    pub handoff: SessionHandoff,
}

impl Invocation {
    pub fn new(argument: &str, mode: Mode, handoff: SessionHandoff) -> Self {
        Self {
            trigger_prefix: String::new(),
            argument: argument.to_string(),
            mode,
            handoff,
        }
    }

    pub fn with_trigger_prefix(mut self, prefix: &str) -> Self {
        self.trigger_prefix = prefix.to_string();
        self
    }

    pub fn query(&self) -> String {
        format!("{}{}", self.trigger_prefix, self.argument)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemIcon {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModVariables {
    pub mode: Mode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<ModVariables>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemMods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<ModAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<ModAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<ModAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub uid: String,
    /// Primary action; empty means no-op.
    #[serde(default)]
    pub arg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<ItemIcon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quicklookurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mods: Option<ItemMods>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandoffVariables {
    #[serde(rename = "oldResults")]
    pub old_results: String,
    #[serde(rename = "oldQuery")]
    pub old_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptFilterOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerun: Option<f64>,
    #[serde(rename = "skipknowledge", default)]
    pub skip_knowledge: bool,
    pub variables: HandoffVariables,
    pub items: Vec<DisplayItem>,
}

impl ScriptFilterOutput {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionReason {
    Uri,
    TooShort,
    IgnoredWord,
    HostKeyword(String),
}

impl Display for SuppressionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uri => write!(f, "URL"),
            Self::TooShort => write!(f, "Min Query Length"),
            Self::IgnoredWord => write!(f, "extra ignore word"),
            Self::HostKeyword(word) => write!(f, "host keyword: {word}"),
        }
    }
}

/// Result of one invocation: either nothing at all, or a full envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Suppressed(SuppressionReason),
    Output(ScriptFilterOutput),
}

impl Outcome {
    pub fn output(&self) -> Option<&ScriptFilterOutput> {
        match self {
            Self::Output(output) => Some(output),
            Self::Suppressed(_) => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }
}
