//! Caller-owned memo of the last schedule built per account.
//!
//! The cache is plain data behind `&mut self`. Callers that share one across
//! threads wrap it in a lock; the engine never reaches for it on its own.

use std::collections::HashMap;

use crate::{
    config::Config,
    error::ConfigError,
    model::Message,
    timeline::{ScheduleOutcome, build_schedule},
};

#[derive(Debug, Clone)]
struct CachedSchedule {
    fingerprint: String,
    outcome: ScheduleOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleCache {
    entries: HashMap<String, CachedSchedule>,
    stats: CacheStats,
}

/// Serialized form of everything a schedule depends on. `None` disables
/// caching for that call rather than risking a false hit.
fn fingerprint(messages: &[Message], cfg: &Config) -> Option<String> {
    serde_json::to_string(&(messages, &cfg.timing, &cfg.layout, &cfg.monetization)).ok()
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached outcome for `account` if its inputs are unchanged,
    /// otherwise build a fresh one and remember it.
    pub fn get_or_build(
        &mut self,
        account: &str,
        messages: &[Message],
        cfg: &Config,
    ) -> Result<ScheduleOutcome, ConfigError> {
        let Some(fp) = fingerprint(messages, cfg) else {
            self.stats.misses += 1;
            return build_schedule(messages, cfg);
        };

        if let Some(hit) = self.entries.get(account).filter(|c| c.fingerprint == fp) {
            self.stats.hits += 1;
            tracing::debug!(account, "schedule cache hit");
            return Ok(hit.outcome.clone());
        }

        self.stats.misses += 1;
        tracing::debug!(account, "schedule cache miss");
        let outcome = build_schedule(messages, cfg)?;
        self.entries.insert(
            account.to_string(),
            CachedSchedule {
                fingerprint: fp,
                outcome: outcome.clone(),
            },
        );
        Ok(outcome)
    }

    pub fn invalidate(&mut self, account: &str) -> bool {
        self.entries.remove(account).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageId, MessageKind, Sender};

    fn script(text: &str) -> Vec<Message> {
        vec![Message {
            id: MessageId(0),
            text: text.into(),
            sender: Sender::A,
            clip_duration_seconds: None,
            conversation_id: 0,
            starts_conversation: true,
            theme: "light".into(),
            kind: MessageKind::Content,
        }]
    }

    #[test]
    fn identical_inputs_hit() {
        let mut cache = ScheduleCache::new();
        let cfg = Config::default();
        let first = cache.get_or_build("acct", &script("hello"), &cfg).unwrap();
        let second = cache.get_or_build("acct", &script("hello"), &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn changed_script_or_config_rebuilds() {
        let mut cache = ScheduleCache::new();
        let mut cfg = Config::default();
        cache.get_or_build("acct", &script("hello"), &cfg).unwrap();
        cache.get_or_build("acct", &script("hello!"), &cfg).unwrap();
        cfg.timing.fps = 60.0;
        let rebuilt = cache.get_or_build("acct", &script("hello!"), &cfg).unwrap();
        assert_eq!(rebuilt.schedule.fps, 60.0);
        assert_eq!(cache.stats().misses, 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn accounts_are_isolated_and_invalidation_drops_entries() {
        let mut cache = ScheduleCache::new();
        let cfg = Config::default();
        cache.get_or_build("a", &script("x"), &cfg).unwrap();
        cache.get_or_build("b", &script("y"), &cfg).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalid_config_is_not_cached() {
        let mut cache = ScheduleCache::new();
        let mut cfg = Config::default();
        cfg.timing.chars_per_second = 0.0;
        assert!(cache.get_or_build("a", &script("x"), &cfg).is_err());
        assert!(cache.is_empty());
    }
}
