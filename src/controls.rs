// Controls overlay instance: binds activity and property listeners on the owning
// player, runs the visibility rules, and applies their side effects.
// See DESIGN.md: Decision Engine, Activity Listener Binder

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::debounce::Debouncer;
use crate::disposal::DisposalBin;
use crate::engine::{decide, DecisionInputs, Rule};
use crate::error::ControlsError;
use crate::lookup::PlayerLookup;
use crate::player::{ListenerId, Player, PlayerHandle};
use crate::runtime::ControlsRuntime;
use crate::types::*;

/// Window for collapsing pointer motion.
pub const MOTION_DEBOUNCE_MS: u64 = 50;

/// Player properties whose changes trigger a recompute.
/// `isControlsActive` is excluded: it is the engine's own output.
pub const WATCHED_PROPERTIES: [PlayerProperty; 5] = [
    PlayerProperty::Paused,
    PlayerProperty::IsAudioView,
    PlayerProperty::PlaybackReady,
    PlayerProperty::IsSettingsActive,
    PlayerProperty::PlaybackStarted,
];

/// Activity events bound straight to recompute. `mousemove` goes through the debouncer.
pub const DIRECT_ACTIVITY: [ActivityKind; 5] = [
    ActivityKind::Focus,
    ActivityKind::KeyDown,
    ActivityKind::Click,
    ActivityKind::TouchStart,
    ActivityKind::MouseLeave,
];

struct ControlsInner {
    id: ControlsId,
    runtime: Rc<ControlsRuntime>,
    config: RefCell<ControlsConfig>,
    player: RefCell<Option<PlayerHandle>>,
    interacting: Cell<bool>,
    motion: RefCell<Debouncer<ActivityKind>>,
    disposal: RefCell<DisposalBin>,
    last_action: Cell<Option<Action>>,
}

/// One on-screen controls overlay.
///
/// Created standalone, then paired with its owning player by [`attach`](MediaControls::attach).
/// Dropping the instance detaches it.
pub struct MediaControls {
    inner: Rc<ControlsInner>,
}

impl MediaControls {
    pub fn new(runtime: Rc<ControlsRuntime>, config: ControlsConfig) -> Result<Self, ControlsError> {
        config.validate()?;
        let id = runtime.register_controls();
        Ok(MediaControls {
            inner: Rc::new(ControlsInner {
                id,
                runtime,
                config: RefCell::new(config),
                player: RefCell::new(None),
                interacting: Cell::new(false),
                motion: RefCell::new(Debouncer::new(MOTION_DEBOUNCE_MS, true)),
                disposal: RefCell::new(DisposalBin::new()),
                last_action: Cell::new(None),
            }),
        })
    }

    pub fn id(&self) -> ControlsId {
        self.inner.id
    }

    /// Resolve the owning player from `node` and bind to it.
    /// Returns `false`, leaving the instance standalone, when no player owns the node.
    pub fn attach(&self, node: NodeId, lookup: &dyn PlayerLookup) -> bool {
        self.detach();
        match lookup.find_owning_player(node) {
            Some(player) => {
                self.attach_to(player);
                true
            }
            None => {
                log::debug!("{}: no owning player, running standalone", self.inner.id);
                false
            }
        }
    }

    /// Bind directly to a known player.
    pub fn attach_to(&self, player: PlayerHandle) {
        self.detach();
        ControlsInner::bind(&self.inner, player);
    }

    /// Unbind every listener and cancel the player's pending hide.
    pub fn detach(&self) {
        self.inner.unbind();
    }

    pub fn is_attached(&self) -> bool {
        self.inner.player.borrow().is_some()
    }

    pub fn player(&self) -> Option<PlayerHandle> {
        self.inner.player.borrow().clone()
    }

    pub fn config(&self) -> ControlsConfig {
        self.inner.config.borrow().clone()
    }

    /// Replace the configuration. Attribute changes are watched inputs, so this recomputes.
    pub fn set_config(&self, config: ControlsConfig) -> Result<(), ControlsError> {
        config.validate()?;
        *self.inner.config.borrow_mut() = config;
        if self.is_attached() {
            self.inner.recompute(Some(Trigger::Config));
        }
        Ok(())
    }

    pub fn is_interacting(&self) -> bool {
        self.inner.interacting.get()
    }

    pub fn pointer_enter(&self) {
        self.inner.set_interacting(true);
    }

    pub fn pointer_leave(&self) {
        self.inner.set_interacting(false);
    }

    pub fn touch_start(&self) {
        self.inner.set_interacting(true);
    }

    pub fn touch_end(&self) {
        self.inner.set_interacting(false);
    }

    /// Run the visibility rules now and apply their side effects.
    pub fn recompute(&self, trigger: Option<Trigger>) -> Action {
        self.inner.recompute(trigger)
    }

    /// Run the rules against supplied signals without touching any player or timer.
    pub fn evaluate(&self, signals: &PlayerSignals, trigger: Option<Trigger>) -> Action {
        self.inner.decide(signals, trigger).action()
    }

    /// Action chosen by the most recent recompute.
    pub fn last_action(&self) -> Option<Action> {
        self.inner.last_action.get()
    }
}

impl Drop for MediaControls {
    fn drop(&mut self) {
        self.inner.unbind();
        self.inner.runtime.unregister_controls(self.inner.id);
    }
}

impl std::fmt::Debug for MediaControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaControls")
            .field("id", &self.inner.id)
            .field("player", &self.player().map(|p| p.id()))
            .field("interacting", &self.inner.interacting.get())
            .field("last_action", &self.inner.last_action.get())
            .finish()
    }
}

impl ControlsInner {
    fn bind(this: &Rc<Self>, player: PlayerHandle) {
        let player_id = player.id();
        log::debug!("{}: attached to {player_id}", this.id);
        *this.player.borrow_mut() = Some(player.clone());
        this.runtime.bind(this.id, player_id);

        let mut disposal = DisposalBin::new();

        let weak = Rc::downgrade(this);
        let listener = player.subscribe(&WATCHED_PROPERTIES, move |property, _| {
            if let Some(inner) = weak.upgrade() {
                inner.on_trigger(Trigger::Property(property));
            }
        });
        let owner = Rc::downgrade(&player);
        disposal.add(move || {
            if let Some(player) = owner.upgrade() {
                player.unsubscribe(listener);
            }
        });

        for kind in DIRECT_ACTIVITY {
            let weak = Rc::downgrade(this);
            let listener = player.add_activity_listener(kind, move |kind| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_trigger(Trigger::Activity(kind));
                }
            });
            disposal.add(remove_activity(&player, listener));
        }

        let weak = Rc::downgrade(this);
        let listener = player.add_activity_listener(ActivityKind::MouseMove, move |kind| {
            if let Some(inner) = weak.upgrade() {
                inner.on_motion(kind);
            }
        });
        disposal.add(remove_activity(&player, listener));

        *this.disposal.borrow_mut() = disposal;

        this.recompute(Some(Trigger::Config));
    }

    fn unbind(&self) {
        let mut disposal = std::mem::take(&mut *self.disposal.borrow_mut());
        disposal.empty();
        self.motion.borrow_mut().cancel();

        let player = self.player.borrow_mut().take();
        if let Some(player) = player {
            self.runtime.cancel_hide(player.id());
            log::debug!("{}: detached from {}", self.id, player.id());
        }
        self.runtime.unbind(self.id);
    }

    fn is_attached(&self) -> bool {
        self.player.borrow().is_some()
    }

    fn on_trigger(self: &Rc<Self>, trigger: Trigger) {
        if self.is_attached() {
            self.recompute(Some(trigger));
        }
    }

    fn on_motion(self: &Rc<Self>, kind: ActivityKind) {
        let now = self.runtime.now();
        let passed = self.motion.borrow_mut().call(now, kind);
        if let Some(kind) = passed {
            self.on_trigger(Trigger::Activity(kind));
        }
    }

    fn set_interacting(self: &Rc<Self>, interacting: bool) {
        if self.interacting.replace(interacting) != interacting {
            self.on_trigger(Trigger::Interaction);
        }
    }

    fn decide(&self, signals: &PlayerSignals, trigger: Option<Trigger>) -> Rule {
        let config = self.config.borrow();
        decide(&DecisionInputs {
            config: &config,
            signals,
            is_interacting: self.interacting.get(),
            trigger,
        })
    }

    fn recompute(self: &Rc<Self>, trigger: Option<Trigger>) -> Action {
        let player = self.player.borrow().clone();
        let signals = player.as_ref().map(|p| p.signals()).unwrap_or_default();
        let rule = self.decide(&signals, trigger);
        let action = rule.action();
        self.last_action.set(Some(action));

        let Some(player) = player else {
            return action;
        };
        let player_id = player.id();
        log::debug!("{}: {:?} -> {} ({trigger:?})", self.id, rule, action.name());

        // A newer decision always supersedes a pending hide.
        self.runtime.cancel_hide(player_id);

        if let Some(visible) = rule.dispatch() {
            player.dispatch(PlayerProperty::IsControlsActive, visible);
        }

        if rule.arms_hide() {
            let delay = self.config.borrow().active_duration;
            let weak = Rc::downgrade(self);
            self.runtime.arm_hide(player_id, delay, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_hide_timer(player_id);
                }
            });
        }

        action
    }

    fn on_hide_timer(&self, player_id: PlayerId) {
        let player = self.player.borrow().clone();
        match player {
            Some(player) if player.id() == player_id => {
                log::trace!("{}: hide timer fired for {player_id}", self.id);
                player.dispatch(PlayerProperty::IsControlsActive, false);
            }
            _ => log::trace!("{}: stale hide timer for {player_id} ignored", self.id),
        }
    }
}

fn remove_activity(player: &PlayerHandle, listener: ListenerId) -> impl FnOnce() + 'static {
    let owner: Weak<Player> = Rc::downgrade(player);
    move || {
        if let Some(player) = owner.upgrade() {
            player.remove_activity_listener(listener);
        }
    }
}
