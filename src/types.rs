// Strong typing over strings. Newtypes for timestamps and identities, typed property names.
// See DESIGN.md: Data model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ControlsError;

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms.saturating_mul(1000))
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Timestamp `ms` milliseconds after this one, saturating at the end of time.
    pub fn after_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms.saturating_mul(1000)))
    }
}

/// Identity of a player element. Keys the per-player tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u64);

impl PlayerId {
    pub fn new(id: u64) -> Self {
        PlayerId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Identity of a controls overlay instance, handed out by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControlsId(u64);

impl ControlsId {
    pub fn new(id: u64) -> Self {
        ControlsId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controls#{}", self.0)
    }
}

/// Document node identity used for owning-player lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }
}

/// Named boolean properties exposed by the player's shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerProperty {
    Paused,
    IsAudioView,
    PlaybackReady,
    IsControlsActive,
    IsSettingsActive,
    PlaybackStarted,
}

impl PlayerProperty {
    pub const ALL: [PlayerProperty; 6] = [
        PlayerProperty::Paused,
        PlayerProperty::IsAudioView,
        PlayerProperty::PlaybackReady,
        PlayerProperty::IsControlsActive,
        PlayerProperty::IsSettingsActive,
        PlayerProperty::PlaybackStarted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PlayerProperty::Paused => "paused",
            PlayerProperty::IsAudioView => "isAudioView",
            PlayerProperty::PlaybackReady => "playbackReady",
            PlayerProperty::IsControlsActive => "isControlsActive",
            PlayerProperty::IsSettingsActive => "isSettingsActive",
            PlayerProperty::PlaybackStarted => "playbackStarted",
        }
    }
}

impl fmt::Display for PlayerProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayerProperty {
    type Err = ControlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerProperty::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ControlsError::UnknownProperty(s.to_string()))
    }
}

/// Snapshot of the player state the decision engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSignals {
    #[serde(default)]
    pub is_audio_view: bool,
    #[serde(default)]
    pub is_settings_active: bool,
    #[serde(default)]
    pub playback_ready: bool,
    #[serde(default)]
    pub is_controls_active: bool,
    #[serde(default = "default_true")]
    pub paused: bool,
    #[serde(default)]
    pub playback_started: bool,
}

impl Default for PlayerSignals {
    fn default() -> Self {
        PlayerSignals {
            is_audio_view: false,
            is_settings_active: false,
            playback_ready: false,
            is_controls_active: false,
            paused: true,
            playback_started: false,
        }
    }
}

impl PlayerSignals {
    pub fn get(&self, property: PlayerProperty) -> bool {
        match property {
            PlayerProperty::Paused => self.paused,
            PlayerProperty::IsAudioView => self.is_audio_view,
            PlayerProperty::PlaybackReady => self.playback_ready,
            PlayerProperty::IsControlsActive => self.is_controls_active,
            PlayerProperty::IsSettingsActive => self.is_settings_active,
            PlayerProperty::PlaybackStarted => self.playback_started,
        }
    }

    /// Write a property. Returns whether the value changed.
    pub(crate) fn put(&mut self, property: PlayerProperty, value: bool) -> bool {
        let slot = match property {
            PlayerProperty::Paused => &mut self.paused,
            PlayerProperty::IsAudioView => &mut self.is_audio_view,
            PlayerProperty::PlaybackReady => &mut self.playback_ready,
            PlayerProperty::IsControlsActive => &mut self.is_controls_active,
            PlayerProperty::IsSettingsActive => &mut self.is_settings_active,
            PlayerProperty::PlaybackStarted => &mut self.playback_started,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }
}

/// DOM-level activity events bound on the player element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Focus,
    KeyDown,
    Click,
    TouchStart,
    MouseLeave,
    MouseMove,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        ActivityKind::Focus,
        ActivityKind::KeyDown,
        ActivityKind::Click,
        ActivityKind::TouchStart,
        ActivityKind::MouseLeave,
        ActivityKind::MouseMove,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActivityKind::Focus => "focus",
            ActivityKind::KeyDown => "keydown",
            ActivityKind::Click => "click",
            ActivityKind::TouchStart => "touchstart",
            ActivityKind::MouseLeave => "mouseleave",
            ActivityKind::MouseMove => "mousemove",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = ControlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ControlsError::UnknownActivity(s.to_string()))
    }
}

/// Why a recompute happened. Only `Activity(MouseLeave)` is special-cased by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A watched player property changed.
    Property(PlayerProperty),
    /// An activity event on the player element.
    Activity(ActivityKind),
    /// Pointer or touch entered/left the controls region.
    Interaction,
    /// Configuration changed or the instance was attached.
    Config,
}

impl Trigger {
    pub fn is_mouse_leave(&self) -> bool {
        matches!(self, Trigger::Activity(ActivityKind::MouseLeave))
    }
}

/// Outcome of a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Show,
    Hide,
    HideWithDelay,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Show => "show",
            Action::Hide => "hide",
            Action::HideWithDelay => "hide-with-delay",
        }
    }
}

/// Corner or center the overlay is pinned to. Layout only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Pin {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    /// No pin, or a value the host did not recognise.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Flex direction of the overlay. Layout only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FlexDirection {
    Row,
    Column,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Flex alignment used for both `align` and `justify`. Layout only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FlexAlign {
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Per-instance configuration, settable by the embedding page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsConfig {
    /// Force-hidden override.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub full_width: bool,
    #[serde(default)]
    pub full_height: bool,
    #[serde(default)]
    pub direction: FlexDirection,
    #[serde(default)]
    pub align: FlexAlign,
    #[serde(default)]
    pub justify: FlexAlign,
    #[serde(default)]
    pub pin: Pin,
    /// Delay before auto-hide (milliseconds).
    #[serde(default = "default_active_duration")]
    pub active_duration: u64,
    #[serde(default)]
    pub wait_for_playback_start: bool,
    #[serde(default)]
    pub hide_when_paused: bool,
    #[serde(default)]
    pub hide_on_mouse_leave: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        ControlsConfig {
            hidden: false,
            full_width: false,
            full_height: false,
            direction: FlexDirection::default(),
            align: FlexAlign::default(),
            justify: FlexAlign::default(),
            pin: Pin::default(),
            active_duration: default_active_duration(),
            wait_for_playback_start: false,
            hide_when_paused: false,
            hide_on_mouse_leave: false,
        }
    }
}

impl ControlsConfig {
    /// Parse a config from the camelCase JSON the embedding page sends.
    pub fn from_json(json: &str) -> Result<Self, ControlsError> {
        let config: ControlsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ControlsError> {
        // Arming a timer that far out would overflow the microsecond clock.
        if self.active_duration > MAX_ACTIVE_DURATION_MS {
            return Err(ControlsError::InvalidConfig(format!(
                "activeDuration {}ms exceeds {}ms",
                self.active_duration, MAX_ACTIVE_DURATION_MS
            )));
        }
        Ok(())
    }
}

/// One day. Anything longer is a configuration mistake.
pub const MAX_ACTIVE_DURATION_MS: u64 = 86_400_000;

fn default_active_duration() -> u64 {
    2750
}

fn default_true() -> bool {
    true
}
