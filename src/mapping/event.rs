//! Mapper events and their activation state machines

use super::bind::BindId;
use super::keyboard::KbdKey;
use super::{Mods, MAX_ACTIVITY, TRIGGER_THRESHOLD};
use crate::ports::MouseButton;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub(crate) usize);

impl EventId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Emulator shortcut registered by another subsystem
pub struct Handler {
    pub(crate) callback: Box<dyn FnMut(bool) + Send>,
    /// Host key code of the default bind
    pub default_key: Option<u32>,
    pub default_mods: Mods,
    /// Label shown by a mapper UI, also the dedup key
    pub button_name: String,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("default_key", &self.default_key)
            .field("default_mods", &self.default_mods)
            .field("button_name", &self.button_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisTarget {
    pub stick: usize,
    pub axis: usize,
    pub positive: bool,
    /// The other direction of the same axis
    pub opposite: Option<EventId>,
}

#[derive(Debug)]
pub enum EventKind {
    Key(KbdKey),
    Modifier(Mods),
    Handler(Handler),
    MouseButton(MouseButton),
    JoystickAxis(AxisTarget),
    JoystickButton { stick: usize, button: usize },
    JoystickHat { stick: usize, hat: usize, dir: usize },
}

impl EventKind {
    /// Everything except joystick axes behaves as an on/off trigger
    pub fn is_trigger(&self) -> bool {
        !matches!(self, EventKind::JoystickAxis(_))
    }
}

#[derive(Debug)]
pub struct Event {
    name: String,
    pub(crate) kind: EventKind,
    pub(crate) active: bool,
    pub(crate) activity: u32,
    pub(crate) value: i32,
    pub(crate) binds: Vec<BindId>,
}

impl Event {
    pub(crate) fn new(name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            name: name.into(),
            kind,
            active: false,
            activity: 0,
            value: 0,
            binds: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn is_trigger(&self) -> bool {
        self.kind.is_trigger()
    }

    /// Result of the last `Active` call
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activity(&self) -> u32 {
        self.activity
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn binds(&self) -> &[BindId] {
        &self.binds
    }

    pub(crate) fn opposite(&self) -> Option<EventId> {
        match self.kind {
            EventKind::JoystickAxis(target) => target.opposite,
            _ => None,
        }
    }

    /// Trigger activation. Returns the `Active` call to make, if any.
    pub(crate) fn trigger_activate(&mut self, skip_action: bool) -> Option<bool> {
        if self.value > TRIGGER_THRESHOLD {
            let fire = self.activity == 0 && !skip_action;
            if self.activity < MAX_ACTIVITY {
                self.activity += 1;
            }
            fire.then_some(true)
        } else if self.activity > 0 {
            self.activity = 0;
            Some(false)
        } else {
            None
        }
    }

    /// Trigger deactivation. Returns `Some(false)` when the last holder let go.
    pub(crate) fn trigger_deactivate(&mut self) -> Option<bool> {
        if self.activity == 0 {
            return None;
        }
        self.activity -= 1;
        (self.activity == 0).then_some(false)
    }
}
