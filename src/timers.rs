// Per-player delayed-hide timers. At most one pending timer per player.
// Keyed by player, not by controls instance: overlays sharing a player must not
// race each other's auto-hide.

use std::collections::HashMap;

use crate::types::{PlayerId, Timestamp};

/// Handle identifying one armed timer. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

struct PendingHide {
    token: TimerToken,
    deadline: Timestamp,
    on_fire: Box<dyn FnOnce()>,
}

/// Table of pending hide timers, driven by an external clock.
#[derive(Default)]
pub struct HideTimerTable {
    pending: HashMap<PlayerId, PendingHide>,
    next_token: u64,
}

impl HideTimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any timer for `player` with one firing `delay_ms` after `now`.
    pub fn arm(
        &mut self,
        player: PlayerId,
        now: Timestamp,
        delay_ms: u64,
        on_fire: impl FnOnce() + 'static,
    ) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let deadline = now.after_millis(delay_ms);
        let previous = self.pending.insert(
            player,
            PendingHide {
                token,
                deadline,
                on_fire: Box::new(on_fire),
            },
        );
        if previous.is_some() {
            log::trace!("timers: {player} re-armed, previous timer cancelled");
        }
        log::trace!("timers: {player} hide at {}us", deadline.as_micros());
        token
    }

    /// Cancel the pending timer for `player`. Returns whether one existed.
    pub fn cancel(&mut self, player: PlayerId) -> bool {
        self.pending.remove(&player).is_some()
    }

    pub fn is_pending(&self, player: PlayerId) -> bool {
        self.pending.contains_key(&player)
    }

    pub fn token(&self, player: PlayerId) -> Option<TimerToken> {
        self.pending.get(&player).map(|p| p.token)
    }

    pub fn deadline(&self, player: PlayerId) -> Option<Timestamp> {
        self.pending.get(&player).map(|p| p.deadline)
    }

    /// Earliest deadline across all players.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove every timer due at `now` and hand back their callbacks, earliest first.
    /// Callers run them after releasing any borrow on the table.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<Box<dyn FnOnce()>> {
        let mut due: Vec<(PlayerId, Timestamp, TimerToken)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(player, p)| (*player, p.deadline, p.token))
            .collect();
        due.sort_by_key(|(_, deadline, token)| (*deadline, token.0));

        due.into_iter()
            .filter_map(|(player, _, _)| self.pending.remove(&player))
            .map(|p| p.on_fire)
            .collect()
    }
}

impl std::fmt::Debug for HideTimerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HideTimerTable")
            .field("pending", &self.pending.len())
            .field("next_token", &self.next_token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fire_all(table: &mut HideTimerTable, now: Timestamp) -> usize {
        let due = table.take_due(now);
        let count = due.len();
        for on_fire in due {
            on_fire();
        }
        count
    }

    #[test]
    fn arm_schedules_after_delay() {
        let mut table = HideTimerTable::new();
        let player = PlayerId::new(1);
        table.arm(player, Timestamp::from_millis(100), 2750, || {});
        assert!(table.is_pending(player));
        assert_eq!(table.deadline(player), Some(Timestamp::from_millis(2850)));
        assert_eq!(fire_all(&mut table, Timestamp::from_millis(2849)), 0);
        assert_eq!(fire_all(&mut table, Timestamp::from_millis(2850)), 1);
        assert!(!table.is_pending(player));
    }

    #[test]
    fn second_arm_replaces_first() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut table = HideTimerTable::new();
        let player = PlayerId::new(7);

        let log = fired.clone();
        let first = table.arm(player, Timestamp::from_millis(0), 100, move || log.borrow_mut().push("first"));
        let log = fired.clone();
        let second = table.arm(player, Timestamp::from_millis(10), 100, move || log.borrow_mut().push("second"));

        assert_ne!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.token(player), Some(second));

        fire_all(&mut table, Timestamp::from_millis(1000));
        assert_eq!(*fired.borrow(), vec!["second"]);
    }

    #[test]
    fn cancel_prevents_fire() {
        let fired = Rc::new(RefCell::new(false));
        let mut table = HideTimerTable::new();
        let player = PlayerId::new(2);
        let flag = fired.clone();
        table.arm(player, Timestamp::from_millis(0), 10, move || *flag.borrow_mut() = true);

        assert!(table.cancel(player));
        assert!(!table.cancel(player));
        fire_all(&mut table, Timestamp::from_millis(100));
        assert!(!*fired.borrow());
    }

    #[test]
    fn players_are_independent() {
        let mut table = HideTimerTable::new();
        table.arm(PlayerId::new(1), Timestamp::from_millis(0), 500, || {});
        table.arm(PlayerId::new(2), Timestamp::from_millis(0), 100, || {});
        assert_eq!(table.next_deadline(), Some(Timestamp::from_millis(100)));

        assert_eq!(fire_all(&mut table, Timestamp::from_millis(200)), 1);
        assert!(table.is_pending(PlayerId::new(1)));
        assert!(!table.is_pending(PlayerId::new(2)));
    }

    #[test]
    fn due_callbacks_come_back_in_deadline_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut table = HideTimerTable::new();
        for (id, delay) in [(1u64, 300u64), (2, 100), (3, 200)] {
            let order = order.clone();
            table.arm(PlayerId::new(id), Timestamp::from_millis(0), delay, move || {
                order.borrow_mut().push(id)
            });
        }
        fire_all(&mut table, Timestamp::from_millis(1000));
        assert_eq!(*order.borrow(), vec![2, 3, 1]);
        assert!(table.is_empty());
    }
}
