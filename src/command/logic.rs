//! Edit intents attached to file nodes.
//!
//! The JSON side of an action's logic is union-shaped: either a legacy raw
//! fallback body (bare string) or a structured spec (object). It decodes at
//! the boundary into an explicit tagged variant and is consumed through
//! pattern matching from then on.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::engine::locate::Occurrence;

/// A named edit intent. The key correlates the action with snippet groups in
/// the node's code and with markers already present in target files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Action {
    #[serde(alias = "title")]
    pub key: String,

    #[serde(alias = "fallback")]
    pub logic: Logic,
}

/// String-or-object union, decoded into explicit variants.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Logic {
    /// Legacy free-text fallback block: the snippet body to anchor a new
    /// marker after.
    Raw(String),
    /// Structured edit spec.
    Structured(StructuredLogic),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredLogic {
    pub behaviour: Behaviour,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub target_start: Option<String>,

    #[serde(default)]
    pub target_end: Option<String>,

    /// Explicit content; when absent, the snippet group matching the action
    /// key supplies it.
    #[serde(default)]
    pub content: Option<String>,

    /// Inject content without installing a marker for future runs.
    #[serde(default)]
    pub fallback_only: bool,

    #[serde(default)]
    pub occurrence: Option<Occurrence>,

    /// Substring whose presence makes the whole action a no-op.
    #[serde(default)]
    pub require_absent: Option<String>,

    #[serde(default)]
    pub replacement: Option<String>,

    /// Overrides the marker key installed by this action (defaults to the
    /// action key).
    #[serde(default)]
    pub mark: Option<String>,
}

/// The closed set of action behaviours. Unknown behaviour names fail at
/// decode time instead of becoming silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Behaviour {
    #[serde(rename = "addMarkerAboveTarget", alias = "add-marker-above-target")]
    AddMarkerAboveTarget,
    #[serde(rename = "addMarkerBelowTarget", alias = "add-marker-below-target")]
    AddMarkerBelowTarget,
    #[serde(rename = "insertBeforeInline", alias = "insert-before-inline")]
    InsertBeforeInline,
    #[serde(rename = "insertAfterInline", alias = "insert-after-inline")]
    InsertAfterInline,
    #[serde(rename = "insertBeforeLine", alias = "insert-before-line")]
    InsertBeforeLine,
    #[serde(rename = "insertAfterLine", alias = "insert-after-line")]
    InsertAfterLine,
    #[serde(rename = "replaceIfMissing", alias = "replace-if-missing")]
    ReplaceIfMissing,
    #[serde(rename = "replaceBetween", alias = "replace-between")]
    ReplaceBetween,
}

impl<'de> Deserialize<'de> for Logic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LogicVisitor;

        impl<'de> Visitor<'de> for LogicVisitor {
            type Value = Logic;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a fallback string or a structured logic object")
            }

            fn visit_str<E>(self, value: &str) -> Result<Logic, E>
            where
                E: de::Error,
            {
                Ok(Logic::Raw(value.to_string()))
            }

            fn visit_map<M>(self, map: M) -> Result<Logic, M::Error>
            where
                M: MapAccess<'de>,
            {
                let spec =
                    StructuredLogic::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(Logic::Structured(spec))
            }
        }

        deserializer.deserialize_any(LogicVisitor)
    }
}
