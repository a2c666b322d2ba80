use std::collections::HashMap;

use crate::model::ConnId;

/// Deferred work the world can have in flight. At most one task per kind is
/// pending; scheduling a kind again replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    MatchCountdown,
    FlagReset,
    MatchReset,
    MedikitRespawn,
    ArmorRespawn,
    SpeedBoostExpiry(ConnId),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: HashMap<TimerKind, i64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, due_ms: i64) {
        self.pending.insert(kind, due_ms);
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.pending.remove(&kind).is_some()
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&TimerKind) -> bool) {
        self.pending.retain(|kind, _| !predicate(kind));
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    pub fn due_at(&self, kind: TimerKind) -> Option<i64> {
        self.pending.get(&kind).copied()
    }

    /// Removes and returns the earliest task due at `now_ms` with its due time.
    /// Taking one at a time lets a handler cancel or reschedule later tasks.
    pub fn pop_due(&mut self, now_ms: i64) -> Option<(TimerKind, i64)> {
        let (kind, due_ms) = self
            .pending
            .iter()
            .filter(|(_, due_ms)| **due_ms <= now_ms)
            .min_by_key(|(_, due_ms)| **due_ms)
            .map(|(kind, due_ms)| (*kind, *due_ms))?;
        self.pending.remove(&kind);
        Some((kind, due_ms))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rescheduling_replaces_pending_task() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKind::MatchCountdown, 1_000);
        scheduler.schedule(TimerKind::MatchCountdown, 5_000);
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pop_due(1_000).is_none());
        assert_eq!(
            scheduler.pop_due(5_000),
            Some((TimerKind::MatchCountdown, 5_000))
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn due_tasks_come_out_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKind::MatchReset, 300);
        scheduler.schedule(TimerKind::FlagReset, 100);
        scheduler.schedule(TimerKind::ArmorRespawn, 200);
        scheduler.schedule(TimerKind::MedikitRespawn, 900);
        let mut fired = Vec::new();
        while let Some((kind, _)) = scheduler.pop_due(500) {
            fired.push(kind);
        }
        assert_eq!(
            fired,
            vec![TimerKind::FlagReset, TimerKind::ArmorRespawn, TimerKind::MatchReset]
        );
        assert!(scheduler.is_pending(TimerKind::MedikitRespawn));
    }

    #[test]
    fn cancel_where_drops_matching_kinds() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKind::SpeedBoostExpiry(a), 10);
        scheduler.schedule(TimerKind::SpeedBoostExpiry(b), 10);
        scheduler.schedule(TimerKind::FlagReset, 10);
        scheduler.cancel_where(|kind| matches!(kind, TimerKind::SpeedBoostExpiry(_)));
        assert_eq!(scheduler.pop_due(10), Some((TimerKind::FlagReset, 10)));
        assert!(scheduler.pop_due(10).is_none());
        assert!(!scheduler.cancel(TimerKind::SpeedBoostExpiry(a)));
    }
}
