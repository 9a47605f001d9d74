// crates/tinly-rules-core/src/core/context.rs
// ============================================================================
// Module: Tinly Rules Visitor Context
// Description: Per-request visitor snapshot consumed by the matcher.
// Purpose: Carry the pre-extracted request facts conditions test against.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The visitor context is assembled by the redirect handler before evaluation
//! begins: geo lookup, user-agent parsing, header extraction, and visit
//! counters all happen upstream. Every lookup field is optional; proxies
//! strip headers and geo databases miss, so absence is an expected state the
//! matcher handles rather than an error.
//!
//! Header-derived fields are untrusted input. The engine treats them as
//! opaque text and never interprets them beyond the comparisons rules ask
//! for.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Device Types
// ============================================================================

/// Device category parsed from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Phones and other handheld devices.
    Mobile,
    /// Tablets.
    Tablet,
    /// Desktop and laptop browsers.
    Desktop,
}

impl DeviceType {
    /// Parses a device keyword, ignoring case (returns `None` when unknown).
    #[must_use]
    pub fn from_keyword(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mobile" => Some(Self::Mobile),
            "tablet" => Some(Self::Tablet),
            "desktop" => Some(Self::Desktop),
            _ => None,
        }
    }

    /// Returns the canonical lowercase token for the device category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Visitor Context
// ============================================================================

/// Snapshot of one visitor request, assembled before evaluation.
///
/// # Invariants
/// - Lookup fields are `None` when the upstream extraction could not produce
///   them; the matcher applies absent-field semantics in that case.
/// - Temporal fields (`local_hour`, `day_of_week`, `date`) are in the
///   visitor's local time as derived by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorContext {
    /// ISO 3166-1 alpha-2 country code from geo lookup.
    pub country_code: Option<String>,
    /// City name from geo lookup.
    pub city: Option<String>,
    /// Region or state name from geo lookup.
    pub region: Option<String>,
    /// Device category parsed from the user agent.
    pub device_type: Option<DeviceType>,
    /// Operating system name parsed from the user agent.
    pub os: Option<String>,
    /// Browser name parsed from the user agent.
    pub browser: Option<String>,
    /// Primary language tag from `Accept-Language`.
    pub language: Option<String>,
    /// Raw `Referer` header value; the matcher extracts the host itself.
    pub referrer: Option<String>,
    /// Query parameters from the request URL.
    pub query_params: BTreeMap<String, String>,
    /// Hour of day (0-23) in the visitor's local time.
    pub local_hour: Option<u8>,
    /// Day of week (0 = Monday .. 6 = Sunday) in the visitor's local time.
    pub day_of_week: Option<u8>,
    /// Calendar date in ISO `YYYY-MM-DD` form, visitor-local.
    pub date: Option<String>,
    /// Total scans or clicks recorded for the resource before this request.
    pub scan_count: u64,
    /// Whether this request is the visitor's first scan of the resource.
    pub is_first_scan: bool,
}

impl Default for VisitorContext {
    fn default() -> Self {
        Self {
            country_code: None,
            city: None,
            region: None,
            device_type: None,
            os: None,
            browser: None,
            language: None,
            referrer: None,
            query_params: BTreeMap::new(),
            local_hour: None,
            day_of_week: None,
            date: None,
            scan_count: 0,
            is_first_scan: true,
        }
    }
}
