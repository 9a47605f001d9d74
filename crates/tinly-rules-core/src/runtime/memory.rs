// crates/tinly-rules-core/src/runtime/memory.rs
// ============================================================================
// Module: Tinly Rules In-Memory Store
// Description: Simple in-memory rule store for tests, demos, and dry runs.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of [`RuleStore`]
//! and [`MatchRecorder`] for tests, local demos, and the CLI's dry-run mode.
//! It is not intended for production use; the service backs these interfaces
//! with its database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::identifiers::RuleGroupId;
use crate::core::identifiers::RuleId;
use crate::core::outcome::CandidateSource;
use crate::core::rule::EvaluationScope;
use crate::core::rule::RedirectRule;
use crate::core::rule::RuleGroup;
use crate::core::time::Timestamp;
use crate::interfaces::MatchRecorder;
use crate::interfaces::RecordError;
use crate::interfaces::RuleStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory rule store for tests and examples.
///
/// Clones share the same underlying maps, so a handle can serve as both the
/// resolver's store and the test's assertion window onto match counters.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRuleStore {
    /// Single rules keyed by identifier, protected by a mutex.
    rules: Arc<Mutex<BTreeMap<RuleId, RedirectRule>>>,
    /// Rule groups keyed by identifier, protected by a mutex.
    groups: Arc<Mutex<BTreeMap<RuleGroupId, RuleGroup>>>,
}

impl InMemoryRuleStore {
    /// Creates an empty in-memory rule store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(BTreeMap::new())),
            groups: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Inserts or replaces a single rule.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn insert_rule(&self, rule: RedirectRule) -> Result<(), StoreError> {
        self.rules
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?
            .insert(rule.id, rule);
        Ok(())
    }

    /// Inserts or replaces a rule group.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn insert_group(&self, group: RuleGroup) -> Result<(), StoreError> {
        self.groups
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?
            .insert(group.id, group);
        Ok(())
    }

    /// Returns a snapshot of one rule, including its current match stats.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn rule(&self, id: RuleId) -> Result<Option<RedirectRule>, StoreError> {
        let guard = self
            .rules
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    /// Returns a snapshot of one rule group, including its current match
    /// stats.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn group(&self, id: RuleGroupId) -> Result<Option<RuleGroup>, StoreError> {
        let guard = self
            .groups
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?;
        Ok(guard.get(&id).cloned())
    }
}

impl RuleStore for InMemoryRuleStore {
    fn rules_for(&self, scope: &EvaluationScope) -> Result<Vec<RedirectRule>, StoreError> {
        let guard = self
            .rules
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|rule| rule.is_active && rule.target.applies_to(scope))
            .cloned()
            .collect())
    }

    fn groups_for(&self, scope: &EvaluationScope) -> Result<Vec<RuleGroup>, StoreError> {
        let guard = self
            .groups
            .lock()
            .map_err(|_| StoreError::Unavailable("rule store mutex poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|group| group.is_active && group.target.applies_to(scope))
            .cloned()
            .collect())
    }
}

impl MatchRecorder for InMemoryRuleStore {
    fn record_match(
        &self,
        source: CandidateSource,
        matched_at: Timestamp,
    ) -> Result<(), RecordError> {
        match source {
            CandidateSource::Rule(id) => {
                let mut guard = self
                    .rules
                    .lock()
                    .map_err(|_| RecordError::Recorder("rule store mutex poisoned".to_string()))?;
                let rule = guard
                    .get_mut(&id)
                    .ok_or_else(|| RecordError::UnknownCandidate(source.to_string()))?;
                rule.stats.times_matched = rule.stats.times_matched.saturating_add(1);
                rule.stats.last_matched_at = Some(matched_at);
            }
            CandidateSource::Group(id) => {
                let mut guard = self
                    .groups
                    .lock()
                    .map_err(|_| RecordError::Recorder("rule store mutex poisoned".to_string()))?;
                let group = guard
                    .get_mut(&id)
                    .ok_or_else(|| RecordError::UnknownCandidate(source.to_string()))?;
                group.stats.times_matched = group.stats.times_matched.saturating_add(1);
                group.stats.last_matched_at = Some(matched_at);
            }
        }
        Ok(())
    }
}
