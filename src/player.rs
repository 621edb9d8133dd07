// Host player: shared state properties plus the element's activity event bus.
// Reactivity is an explicit subscription list per property / event kind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::ControlsError;
use crate::types::{ActivityKind, PlayerId, PlayerProperty, PlayerSignals};

/// Handle returned by subscriptions, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type PropertyListener = Rc<dyn Fn(PlayerProperty, bool)>;
type ActivityListener = Rc<dyn Fn(ActivityKind)>;

struct Listeners<K, L> {
    entries: Vec<(ListenerId, Vec<K>, L)>,
}

impl<K: PartialEq, L: Clone> Listeners<K, L> {
    fn new() -> Self {
        Listeners { entries: Vec::new() }
    }

    fn insert(&mut self, id: ListenerId, keys: Vec<K>, listener: L) {
        self.entries.push((id, keys, listener));
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _, _)| *entry != id);
        self.entries.len() != before
    }

    /// Listeners interested in `key`, cloned out so callers can notify without a borrow.
    fn matching(&self, key: &K) -> Vec<L> {
        self.entries
            .iter()
            .filter(|(_, keys, _)| keys.contains(key))
            .map(|(_, _, listener)| listener.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A media player element as seen by controls overlays.
pub struct Player {
    id: PlayerId,
    signals: RefCell<PlayerSignals>,
    property_listeners: RefCell<Listeners<PlayerProperty, PropertyListener>>,
    activity_listeners: RefCell<Listeners<ActivityKind, ActivityListener>>,
    next_listener: Cell<u64>,
}

pub type PlayerHandle = Rc<Player>;

impl Player {
    pub fn new(id: PlayerId) -> PlayerHandle {
        Self::with_signals(id, PlayerSignals::default())
    }

    pub fn with_signals(id: PlayerId, signals: PlayerSignals) -> PlayerHandle {
        Rc::new(Player {
            id,
            signals: RefCell::new(signals),
            property_listeners: RefCell::new(Listeners::new()),
            activity_listeners: RefCell::new(Listeners::new()),
            next_listener: Cell::new(0),
        })
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn signals(&self) -> PlayerSignals {
        *self.signals.borrow()
    }

    pub fn get(&self, property: PlayerProperty) -> bool {
        self.signals.borrow().get(property)
    }

    /// Host-side state update. `isControlsActive` is only writable through [`dispatch`](Player::dispatch).
    pub fn set(&self, property: PlayerProperty, value: bool) -> Result<(), ControlsError> {
        if property == PlayerProperty::IsControlsActive {
            return Err(ControlsError::ReadOnlyProperty(property));
        }
        self.write(property, value);
        Ok(())
    }

    /// Write back to the shared player state, observable by every subscriber.
    pub fn dispatch(&self, property: PlayerProperty, value: bool) {
        log::debug!("{}: dispatch {property}={value}", self.id);
        self.write(property, value);
    }

    fn write(&self, property: PlayerProperty, value: bool) {
        let changed = self.signals.borrow_mut().put(property, value);
        if !changed {
            return;
        }
        let listeners = self.property_listeners.borrow().matching(&property);
        for listener in listeners {
            listener(property, value);
        }
    }

    /// Call `listener` whenever one of `properties` changes value.
    pub fn subscribe(
        &self,
        properties: &[PlayerProperty],
        listener: impl Fn(PlayerProperty, bool) + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.property_listeners
            .borrow_mut()
            .insert(id, properties.to_vec(), Rc::new(listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.property_listeners.borrow_mut().remove(id)
    }

    /// Bind `listener` to one activity event kind on the player element.
    pub fn add_activity_listener(
        &self,
        kind: ActivityKind,
        listener: impl Fn(ActivityKind) + 'static,
    ) -> ListenerId {
        let id = self.next_id();
        self.activity_listeners
            .borrow_mut()
            .insert(id, vec![kind], Rc::new(listener));
        id
    }

    pub fn remove_activity_listener(&self, id: ListenerId) -> bool {
        self.activity_listeners.borrow_mut().remove(id)
    }

    /// Deliver a DOM activity event to the bound listeners.
    pub fn emit_activity(&self, kind: ActivityKind) {
        let listeners = self.activity_listeners.borrow().matching(&kind);
        for listener in listeners {
            listener(kind);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.property_listeners.borrow().len() + self.activity_listeners.borrow().len()
    }

    fn next_id(&self) -> ListenerId {
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        ListenerId(id)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("signals", &*self.signals.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let player = Player::new(PlayerId::new(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        player.subscribe(&[PlayerProperty::Paused], move |p, v| log.borrow_mut().push((p, v)));

        player.set(PlayerProperty::Paused, true).unwrap(); // already paused
        player.set(PlayerProperty::Paused, false).unwrap();
        player.set(PlayerProperty::PlaybackReady, true).unwrap(); // not subscribed

        assert_eq!(*seen.borrow(), vec![(PlayerProperty::Paused, false)]);
    }

    #[test]
    fn controls_active_is_dispatch_only() {
        let player = Player::new(PlayerId::new(1));
        let err = player.set(PlayerProperty::IsControlsActive, true).unwrap_err();
        assert!(matches!(err, ControlsError::ReadOnlyProperty(_)));
        assert!(!player.get(PlayerProperty::IsControlsActive));

        player.dispatch(PlayerProperty::IsControlsActive, true);
        assert!(player.signals().is_controls_active);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let player = Player::new(PlayerId::new(1));
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = player.subscribe(&[PlayerProperty::IsAudioView], move |_, _| c.set(c.get() + 1));

        player.set(PlayerProperty::IsAudioView, true).unwrap();
        assert!(player.unsubscribe(id));
        assert!(!player.unsubscribe(id));
        player.set(PlayerProperty::IsAudioView, false).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn activity_listeners_filter_by_kind() {
        let player = Player::new(PlayerId::new(1));
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        let id = player.add_activity_listener(ActivityKind::Click, move |_| c.set(c.get() + 1));

        player.emit_activity(ActivityKind::Click);
        player.emit_activity(ActivityKind::KeyDown);
        assert_eq!(clicks.get(), 1);

        player.remove_activity_listener(id);
        player.emit_activity(ActivityKind::Click);
        assert_eq!(clicks.get(), 1);
        assert_eq!(player.listener_count(), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let player = Player::new(PlayerId::new(1));
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let weak = Rc::downgrade(&player);
        let s = slot.clone();
        let id = player.subscribe(&[PlayerProperty::Paused], move |_, _| {
            if let (Some(player), Some(id)) = (weak.upgrade(), s.get()) {
                player.unsubscribe(id);
            }
        });
        slot.set(Some(id));

        player.set(PlayerProperty::Paused, false).unwrap();
        assert_eq!(player.listener_count(), 0);
    }
}
