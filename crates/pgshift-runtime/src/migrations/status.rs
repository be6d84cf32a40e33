use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ledger::LedgerEntry;

/// Applied/pending state of one on-disk migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
    pub has_down: bool,
}

impl StatusEntry {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Status of every on-disk migration, in application order.
///
/// Ledger rows without a matching directory are not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub entries: Vec<StatusEntry>,
}

impl StatusReport {
    /// Join sorted on-disk names with the ledger. `has_down` is asked per name.
    pub fn build<F>(on_disk: &[String], ledger: &[LedgerEntry], has_down: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let applied: HashMap<&str, DateTime<Utc>> = ledger
            .iter()
            .map(|e| (e.name.as_str(), e.applied_at))
            .collect();

        let entries = on_disk
            .iter()
            .map(|name| StatusEntry {
                name: name.clone(),
                applied_at: applied.get(name.as_str()).copied(),
                has_down: has_down(name),
            })
            .collect();

        Self { entries }
    }

    pub fn applied(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_applied())
    }

    pub fn pending(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| !e.is_applied())
    }

    pub fn applied_count(&self) -> usize {
        self.applied().count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn has_pending(&self) -> bool {
        self.pending().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_marks_applied_and_pending() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ledger = vec![LedgerEntry::new("a", t)];
        let report = StatusReport::build(&names(&["a", "b"]), &ledger, |name| name == "a");

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].applied_at, Some(t));
        assert!(report.entries[0].has_down);
        assert!(!report.entries[1].is_applied());
        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.pending_count(), 1);
        assert!(report.has_pending());
    }

    #[test]
    fn test_orphans_are_invisible() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ledger = vec![LedgerEntry::new("a", t), LedgerEntry::new("deleted", t)];
        let report = StatusReport::build(&names(&["a"]), &ledger, |_| false);

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.applied_count(), 1);
        assert!(!report.has_pending());
    }

    #[test]
    fn test_empty() {
        let report = StatusReport::build(&[], &[], |_| false);
        assert!(report.is_empty());
        assert!(!report.has_pending());
    }
}
