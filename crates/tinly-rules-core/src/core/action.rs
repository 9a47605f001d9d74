// crates/tinly-rules-core/src/core/action.rs
// ============================================================================
// Module: Tinly Rules Action Model
// Description: Rule action payloads and the effects they resolve into.
// Purpose: Define the typed action union and the effect contract for hosts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Actions describe what happens when a rule fires. They are authored as a
//! tagged union (`type` plus `value` payload) so each kind carries exactly
//! the fields it needs; a redirect without a URL is unrepresentable instead
//! of a runtime surprise. Resolving an action against the request produces an
//! [`ActionEffect`], the closed vocabulary redirect handlers switch on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// HTTP status used when a block action does not name one.
pub const DEFAULT_BLOCK_STATUS: u16 = 403;

/// Message used when a block action does not carry one.
pub const DEFAULT_BLOCK_MESSAGE: &str = "Access to this destination is blocked.";

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Action payload attached to a rule or rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RuleAction {
    /// Redirect the visitor to an alternate destination URL.
    Redirect {
        /// Destination the visitor is sent to instead of the default.
        url: String,
    },
    /// Append UTM attribution parameters to the resource's destination URL.
    ///
    /// Parameters already present on the destination are overwritten; other
    /// query parameters are preserved.
    AddUtm {
        /// `utm_source` value, when set.
        utm_source: Option<String>,
        /// `utm_medium` value, when set.
        utm_medium: Option<String>,
        /// `utm_campaign` value, when set.
        utm_campaign: Option<String>,
        /// `utm_term` value, when set.
        utm_term: Option<String>,
        /// `utm_content` value, when set.
        utm_content: Option<String>,
    },
    /// Deny the request with a status code and message.
    Block {
        /// HTTP status to serve; defaults to [`DEFAULT_BLOCK_STATUS`].
        status_code: Option<u16>,
        /// Human-readable denial message; defaults to [`DEFAULT_BLOCK_MESSAGE`].
        message: Option<String>,
    },
    /// Serve an inline content payload instead of redirecting.
    ShowContent {
        /// Opaque content document interpreted by the serving layer.
        payload: Value,
    },
    /// Attach response headers to the eventual redirect.
    SetHeader {
        /// Header names and values to set on the response.
        headers: BTreeMap<String, String>,
    },
}

impl RuleAction {
    /// Returns the discriminant of this action.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::Redirect { .. } => ActionType::Redirect,
            Self::AddUtm { .. } => ActionType::AddUtm,
            Self::Block { .. } => ActionType::Block,
            Self::ShowContent { .. } => ActionType::ShowContent,
            Self::SetHeader { .. } => ActionType::SetHeader,
        }
    }
}

// ============================================================================
// SECTION: Action Discriminants
// ============================================================================

/// Discriminant-only view of a rule action, used in summaries and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Redirect to an alternate URL.
    Redirect,
    /// Append UTM parameters to the destination.
    AddUtm,
    /// Deny the request.
    Block,
    /// Serve inline content.
    ShowContent,
    /// Attach response headers.
    SetHeader,
}

impl ActionType {
    /// Returns the canonical wire name of the action kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redirect => "redirect",
            Self::AddUtm => "add_utm",
            Self::Block => "block",
            Self::ShowContent => "show_content",
            Self::SetHeader => "set_header",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Effects
// ============================================================================

/// Concrete outcome a resolved action instructs the host to perform.
///
/// Effects are fully materialized: defaults are filled in and UTM rewrites
/// are already applied, so hosts switch on the variant without consulting the
/// originating rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEffect {
    /// Send the visitor to this URL.
    Redirect {
        /// Final redirect destination.
        url: String,
    },
    /// Deny the request.
    Block {
        /// HTTP status to serve.
        status_code: u16,
        /// Denial message for the response body.
        message: String,
    },
    /// Serve this content payload inline.
    Content {
        /// Opaque content document interpreted by the serving layer.
        payload: Value,
    },
    /// Redirect to the default destination with these headers attached.
    Header {
        /// Header names and values to set on the response.
        headers: BTreeMap<String, String>,
    },
}
