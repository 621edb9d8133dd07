// Player runtime context shared by every controls instance: clock, hide timers,
// and the player -> controls registry.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::timers::{HideTimerTable, TimerToken};
use crate::types::{ControlsId, PlayerId, Timestamp};

/// Owns the per-player tables. Passed to controls instances by `Rc`.
#[derive(Debug, Default)]
pub struct ControlsRuntime {
    now: Cell<Timestamp>,
    timers: RefCell<HideTimerTable>,
    registered: RefCell<BTreeSet<ControlsId>>,
    bound: RefCell<HashMap<PlayerId, BTreeSet<ControlsId>>>,
    next_controls: Cell<u64>,
}

impl ControlsRuntime {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn now(&self) -> Timestamp {
        self.now.get()
    }

    /// Move the clock forward and fire every hide timer that is now due.
    /// Returns the number of timers fired. The clock never goes backwards.
    pub fn advance(&self, now: Timestamp) -> usize {
        if now > self.now.get() {
            self.now.set(now);
        }
        let due = self.timers.borrow_mut().take_due(self.now.get());
        let fired = due.len();
        for on_fire in due {
            on_fire();
        }
        fired
    }

    /// Earliest pending hide deadline, for hosts scheduling their next tick.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.borrow().next_deadline()
    }

    pub fn arm_hide(
        &self,
        player: PlayerId,
        delay_ms: u64,
        on_fire: impl FnOnce() + 'static,
    ) -> TimerToken {
        self.timers
            .borrow_mut()
            .arm(player, self.now.get(), delay_ms, on_fire)
    }

    pub fn cancel_hide(&self, player: PlayerId) -> bool {
        self.timers.borrow_mut().cancel(player)
    }

    pub fn has_pending_hide(&self, player: PlayerId) -> bool {
        self.timers.borrow().is_pending(player)
    }

    pub fn hide_deadline(&self, player: PlayerId) -> Option<Timestamp> {
        self.timers.borrow().deadline(player)
    }

    pub fn pending_hides(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Hand out an id for a new controls instance and record it.
    pub fn register_controls(&self) -> ControlsId {
        let id = ControlsId::new(self.next_controls.get() + 1);
        self.next_controls.set(id.as_u64());
        self.registered.borrow_mut().insert(id);
        log::trace!("runtime: registered {id}");
        id
    }

    pub fn unregister_controls(&self, id: ControlsId) {
        self.registered.borrow_mut().remove(&id);
        self.unbind(id);
    }

    pub fn is_registered(&self, id: ControlsId) -> bool {
        self.registered.borrow().contains(&id)
    }

    /// Pair a controls instance with the player it resolved on attach.
    pub fn bind(&self, id: ControlsId, player: PlayerId) {
        self.unbind(id);
        self.bound.borrow_mut().entry(player).or_default().insert(id);
    }

    pub fn unbind(&self, id: ControlsId) {
        self.bound.borrow_mut().retain(|_, controls| {
            controls.remove(&id);
            !controls.is_empty()
        });
    }

    /// Controls instances currently bound to `player`, in registration order.
    pub fn controls_for(&self, player: PlayerId) -> Vec<ControlsId> {
        self.bound
            .borrow()
            .get(&player)
            .map(|controls| controls.iter().copied().collect())
            .unwrap_or_default()
    }
}
