use chrono::{DateTime, Utc};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSession {
    pub name: String,

    /// Discovery metadata has been published for this name.
    pub announced: bool,

    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Devices heard from since startup.
///
/// Sessions are created on the first valid packet for a name and are never evicted.
/// There is no internal locking: the registry expects a single owner that both
/// mutates and reads it. Wrap it in a lock before sharing it between threads.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    sessions: IndexMap<String, DeviceSession>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a valid packet for `name` and returns whether the device still
    /// needs to be announced.
    pub fn record_packet(&mut self, name: &str, now: DateTime<Utc>) -> bool {
        let session = self
            .sessions
            .entry(name.to_owned())
            .or_insert_with(|| DeviceSession {
                name: name.to_owned(),
                announced: false,
                last_seen_at: None,
            });

        if let Some(last_seen_at) = session.last_seen_at
            && now < last_seen_at
        {
            log::warn!("clock went backwards for {name}: {last_seen_at} -> {now}");
        }
        session.last_seen_at = Some(now);

        !session.announced
    }

    pub fn mark_announced(&mut self, name: &str) {
        if let Some(session) = self.sessions.get_mut(name) {
            session.announced = true;
        }
    }

    /// Snapshot of known names, in first-seen order.
    pub fn names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn last_seen(&self, name: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(name).and_then(|s| s.last_seen_at)
    }

    pub fn get(&self, name: &str) -> Option<&DeviceSession> {
        self.sessions.get(name)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn first_packet_creates_session() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.last_seen("kitchen"), None);

        assert!(registry.record_packet("kitchen", t0()));
        assert_eq!(
            registry.get("kitchen"),
            Some(&DeviceSession {
                name: "kitchen".to_string(),
                announced: false,
                last_seen_at: Some(t0()),
            })
        );
    }

    #[test]
    fn second_packet_after_announce_is_not_new() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.record_packet("kitchen", t0()));
        registry.mark_announced("kitchen");

        let later = t0() + TimeDelta::seconds(5);
        assert!(!registry.record_packet("kitchen", later));
        assert_eq!(registry.last_seen("kitchen"), Some(later));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unannounced_session_is_reported_again() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.record_packet("kitchen", t0()));
        assert!(registry.record_packet("kitchen", t0()));
    }

    #[test]
    fn names_are_in_first_seen_order() {
        let mut registry = DeviceRegistry::new();
        registry.record_packet("b", t0());
        registry.record_packet("a", t0());
        registry.record_packet("b", t0() + TimeDelta::seconds(1));
        assert_eq!(registry.names(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn mark_announced_ignores_unknown_names() {
        let mut registry = DeviceRegistry::new();
        registry.mark_announced("ghost");
        assert!(registry.is_empty());
    }
}
