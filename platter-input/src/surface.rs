//! Control surface state: raw control events in, console commands out

use crate::controls::{
    fader_to_value, knob_angle_to_value, KnobKind, SliderRole, CHANGE_EPSILON, KNOB_MAX_ANGLE,
    KNOB_MIN_ANGLE,
};
use platter_audio::{AudioCommand, DeckId};
use std::collections::HashMap;
use std::path::PathBuf;

/// Deck buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Play,
    Stop,
    Cue,
    KeyLock,
}

/// Raw event from a control surface
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// Knob rotated to `angle` degrees
    Knob { deck: DeckId, kind: KnobKind, angle: f32 },
    /// Slider moved to `position` along its travel
    Slider { deck: DeckId, role: SliderRole, position: f32 },
    /// Crossfader moved to `position` along its travel
    Crossfader { position: f32 },
    ButtonDown { deck: DeckId, button: Button },
    ButtonUp { deck: DeckId, button: Button },
    PlatterTouch { deck: DeckId, angle: f32 },
    PlatterMove { deck: DeckId, angle: f32, dt: f32 },
    PlatterRelease { deck: DeckId },
    /// Track picked for a deck
    Load { deck: DeckId, path: PathBuf },
}

/// Physical travel of the surface's controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    pub knob_min_angle: f32,
    pub knob_max_angle: f32,
    /// Slider travel length
    pub slider_length: f32,
    /// Crossfader travel length
    pub crossfader_length: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            knob_min_angle: KNOB_MIN_ANGLE,
            knob_max_angle: KNOB_MAX_ANGLE,
            slider_length: 1.0,
            crossfader_length: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Control {
    Knob(DeckId, KnobKind),
    Slider(DeckId, SliderRole),
    Crossfader,
}

/// Converts surface events to console commands, forwarding continuous
/// controls only when their value actually changed
pub struct SurfaceHandler {
    layout: SurfaceLayout,
    last_values: HashMap<Control, f32>,
}

impl Default for SurfaceHandler {
    fn default() -> Self {
        Self::new(SurfaceLayout::default())
    }
}

impl SurfaceHandler {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            last_values: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Last value forwarded for a knob
    pub fn knob_value(&self, deck: DeckId, kind: KnobKind) -> Option<f32> {
        self.last_values.get(&Control::Knob(deck, kind)).copied()
    }

    /// Forget forwarded values so the next event of every control is sent
    pub fn reset(&mut self) {
        self.last_values.clear();
    }

    /// Handle an event and return a command if applicable
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Option<AudioCommand> {
        match event {
            SurfaceEvent::Knob { deck, kind, angle } => {
                let value =
                    knob_angle_to_value(angle, self.layout.knob_min_angle, self.layout.knob_max_angle);
                self.changed(Control::Knob(deck, kind), value)
                    .then(|| kind.command(deck, value))
            }
            SurfaceEvent::Slider { deck, role, position } => {
                let value = fader_to_value(position, self.layout.slider_length);
                self.changed(Control::Slider(deck, role), value)
                    .then(|| role.command(deck, value))
            }
            SurfaceEvent::Crossfader { position } => {
                let value = fader_to_value(position, self.layout.crossfader_length);
                self.changed(Control::Crossfader, value)
                    .then_some(AudioCommand::SetCrossfader(value))
            }

            SurfaceEvent::ButtonDown { deck, button } => Some(match button {
                Button::Play => AudioCommand::Play(deck),
                Button::Stop => AudioCommand::Stop(deck),
                Button::Cue => AudioCommand::CuePress(deck),
                Button::KeyLock => AudioCommand::ToggleKeyLock(deck),
            }),
            SurfaceEvent::ButtonUp { deck, button } => match button {
                Button::Cue => Some(AudioCommand::CueRelease(deck)),
                _ => None,
            },

            SurfaceEvent::PlatterTouch { deck, angle } => Some(AudioCommand::ScratchBegin(deck, angle)),
            SurfaceEvent::PlatterMove { deck, angle, dt } => {
                Some(AudioCommand::ScratchMove(deck, angle, dt))
            }
            SurfaceEvent::PlatterRelease { deck } => Some(AudioCommand::ScratchEnd(deck)),

            SurfaceEvent::Load { deck, path } => {
                tracing::debug!(deck = %deck.letter(), path = %path.display(), "load requested");
                Some(AudioCommand::Load(deck, path))
            }
        }
    }

    fn changed(&mut self, control: Control, value: f32) -> bool {
        match self.last_values.get(&control) {
            Some(last) if (value - last).abs() <= CHANGE_EPSILON => false,
            _ => {
                self.last_values.insert(control, value);
                true
            }
        }
    }
}
