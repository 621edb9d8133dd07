// Visibility policy. Pure: no timers, no dispatch.
// Rules are evaluated in order; the first match wins.

use crate::types::{Action, ControlsConfig, PlayerSignals, Trigger};

/// Everything a decision reads, gathered at the start of a recompute.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    pub config: &'a ControlsConfig,
    pub signals: &'a PlayerSignals,
    pub is_interacting: bool,
    pub trigger: Option<Trigger>,
}

/// The rule that produced a decision, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Explicitly hidden or playback not ready.
    Unavailable,
    /// Audio views are always visible.
    AudioView,
    /// Waiting for the first playback start.
    AwaitingPlayback,
    /// Pointer over the controls or settings menu open.
    Engaged,
    /// Paused with hide-when-paused.
    PausedAutoHide,
    /// Mouse left the player while playing with hide-on-mouse-leave.
    MouseLeft,
    /// Playing with no overriding policy: show, then auto-hide.
    Playing,
    /// Paused without hide-when-paused.
    PausedIdle,
}

impl Rule {
    pub fn action(&self) -> Action {
        match self {
            Rule::Unavailable | Rule::AwaitingPlayback | Rule::MouseLeft => Action::Hide,
            Rule::PausedAutoHide => Action::HideWithDelay,
            Rule::AudioView | Rule::Engaged | Rule::Playing | Rule::PausedIdle => Action::Show,
        }
    }

    /// Whether the rule leaves a delayed hide armed for the player.
    pub fn arms_hide(&self) -> bool {
        matches!(self, Rule::PausedAutoHide | Rule::Playing)
    }

    /// Visibility to dispatch right away, if any.
    pub fn dispatch(&self) -> Option<bool> {
        match self.action() {
            Action::Show => Some(true),
            Action::Hide => Some(false),
            Action::HideWithDelay => None,
        }
    }
}

/// Pick the rule that applies to these inputs.
pub fn decide(inputs: &DecisionInputs<'_>) -> Rule {
    let config = inputs.config;
    let signals = inputs.signals;

    if config.hidden || !signals.playback_ready {
        return Rule::Unavailable;
    }

    if signals.is_audio_view {
        return Rule::AudioView;
    }

    if config.wait_for_playback_start && !signals.playback_started {
        return Rule::AwaitingPlayback;
    }

    if inputs.is_interacting || signals.is_settings_active {
        return Rule::Engaged;
    }

    if config.hide_when_paused && signals.paused {
        return Rule::PausedAutoHide;
    }

    let mouse_left = inputs.trigger.is_some_and(|t| t.is_mouse_leave());
    if config.hide_on_mouse_leave && !signals.paused && mouse_left {
        return Rule::MouseLeft;
    }

    if !signals.paused {
        return Rule::Playing;
    }

    Rule::PausedIdle
}
