//! Emulator-facing collaborators
//!
//! The mapper never touches emulated hardware directly. Every effect of an
//! event ends up in one of these ports:
//!
//! ```text
//!   Event::Active ──┬──> KeyboardPort::add_key
//!                   ├──> MousePort::button_pressed / button_released
//!                   └──> VirtualJoystickState ──(poll)──> JoystickPort
//! ```
//!
//! Typed macro keys reach the keyboard port through their key events like any
//! bound key. The keyboard port takes `&self` so a host can share one
//! emulated keyboard with its own producers.

use crate::mapping::keyboard::KbdKey;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub trait KeyboardPort: Send + Sync {
    fn add_key(&self, key: KbdKey, pressed: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

pub trait MousePort: Send {
    fn button_pressed(&mut self, button: MouseButton);
    fn button_released(&mut self, button: MouseButton);
}

/// Emulated gameport. `stick` is 0 or 1, `button` is 0 or 1.
pub trait JoystickPort: Send {
    fn enable(&mut self, stick: usize, enabled: bool);
    fn move_x(&mut self, stick: usize, x: f32);
    fn move_y(&mut self, stick: usize, y: f32);
    fn button(&mut self, stick: usize, button: usize, pressed: bool);
    fn get_move_y(&self, stick: usize) -> f32;
}

/// Bundle of ports handed to the mapper context
pub struct EmulatorPorts {
    pub keyboard: Arc<dyn KeyboardPort>,
    pub mouse: Box<dyn MousePort>,
    pub joystick: Box<dyn JoystickPort>,
}

/// Ports that only report what the emulator would receive
#[derive(Debug, Default)]
pub struct LoggingKeyboard;

impl KeyboardPort for LoggingKeyboard {
    fn add_key(&self, key: KbdKey, pressed: bool) {
        info!("Keyboard: {:?} {}", key, if pressed { "down" } else { "up" });
    }
}

#[derive(Debug, Default)]
pub struct LoggingMouse;

impl MousePort for LoggingMouse {
    fn button_pressed(&mut self, button: MouseButton) {
        info!("Mouse: {:?} pressed", button);
    }

    fn button_released(&mut self, button: MouseButton) {
        info!("Mouse: {:?} released", button);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GameportStick {
    pub enabled: bool,
    pub x: f32,
    pub y: f32,
    pub buttons: [bool; 2],
}

/// Keeps the gameport state and logs every change
#[derive(Debug, Default)]
pub struct LoggingJoystick {
    sticks: [GameportStick; 2],
}

impl LoggingJoystick {
    fn stick_mut(&mut self, stick: usize) -> Option<&mut GameportStick> {
        self.sticks.get_mut(stick)
    }
}

impl JoystickPort for LoggingJoystick {
    fn enable(&mut self, stick: usize, enabled: bool) {
        if let Some(s) = self.stick_mut(stick) {
            if s.enabled != enabled {
                info!("Gameport stick {} enabled: {}", stick, enabled);
            }
            s.enabled = enabled;
        }
    }

    fn move_x(&mut self, stick: usize, x: f32) {
        if let Some(s) = self.stick_mut(stick) {
            if (s.x - x).abs() > f32::EPSILON {
                debug!("Gameport stick {} X: {:.3}", stick, x);
            }
            s.x = x;
        }
    }

    fn move_y(&mut self, stick: usize, y: f32) {
        if let Some(s) = self.stick_mut(stick) {
            if (s.y - y).abs() > f32::EPSILON {
                debug!("Gameport stick {} Y: {:.3}", stick, y);
            }
            s.y = y;
        }
    }

    fn button(&mut self, stick: usize, button: usize, pressed: bool) {
        if let Some(slot) = self.stick_mut(stick).and_then(|s| s.buttons.get_mut(button)) {
            if *slot != pressed {
                info!("Gameport stick {} button {}: {}", stick, button, pressed);
            }
            *slot = pressed;
        }
    }

    fn get_move_y(&self, stick: usize) -> f32 {
        self.sticks.get(stick).map(|s| s.y).unwrap_or_default()
    }
}

impl EmulatorPorts {
    pub fn logging() -> Self {
        Self {
            keyboard: Arc::new(LoggingKeyboard),
            mouse: Box::new(LoggingMouse),
            joystick: Box::new(LoggingJoystick::default()),
        }
    }
}

/// Everything the ports received, in order
#[derive(Clone, Debug, PartialEq)]
pub enum PortCall {
    Key(KbdKey, bool),
    Mouse(MouseButton, bool),
    Enable(usize, bool),
    MoveX(usize, f32),
    MoveY(usize, f32),
    Button(usize, usize, bool),
}

/// Recording ports for hosts that inspect the output themselves
#[derive(Clone, Debug, Default)]
pub struct RecordingPorts {
    calls: Arc<Mutex<Vec<PortCall>>>,
    sticks: Arc<Mutex<[GameportStick; 2]>>,
}

impl RecordingPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ports(&self) -> EmulatorPorts {
        EmulatorPorts {
            keyboard: Arc::new(self.clone()),
            mouse: Box::new(self.clone()),
            joystick: Box::new(self.clone()),
        }
    }

    fn record(&self, call: PortCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Drains and returns the recorded calls
    pub fn take(&self) -> Vec<PortCall> {
        self.calls
            .lock()
            .map(|mut calls| std::mem::take(&mut *calls))
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<(KbdKey, bool)> {
        self.take()
            .into_iter()
            .filter_map(|c| match c {
                PortCall::Key(k, p) => Some((k, p)),
                _ => None,
            })
            .collect()
    }

    pub fn stick(&self, stick: usize) -> GameportStick {
        self.sticks
            .lock()
            .ok()
            .and_then(|s| s.get(stick).copied())
            .unwrap_or_default()
    }

    fn with_stick(&self, stick: usize, f: impl FnOnce(&mut GameportStick)) {
        if let Ok(mut sticks) = self.sticks.lock() {
            if let Some(s) = sticks.get_mut(stick) {
                f(s);
            }
        }
    }
}

impl KeyboardPort for RecordingPorts {
    fn add_key(&self, key: KbdKey, pressed: bool) {
        self.record(PortCall::Key(key, pressed));
    }
}

impl MousePort for RecordingPorts {
    fn button_pressed(&mut self, button: MouseButton) {
        self.record(PortCall::Mouse(button, true));
    }

    fn button_released(&mut self, button: MouseButton) {
        self.record(PortCall::Mouse(button, false));
    }
}

impl JoystickPort for RecordingPorts {
    fn enable(&mut self, stick: usize, enabled: bool) {
        self.with_stick(stick, |s| s.enabled = enabled);
        self.record(PortCall::Enable(stick, enabled));
    }

    fn move_x(&mut self, stick: usize, x: f32) {
        self.with_stick(stick, |s| s.x = x);
        self.record(PortCall::MoveX(stick, x));
    }

    fn move_y(&mut self, stick: usize, y: f32) {
        self.with_stick(stick, |s| s.y = y);
        self.record(PortCall::MoveY(stick, y));
    }

    fn button(&mut self, stick: usize, button: usize, pressed: bool) {
        self.with_stick(stick, |s| {
            if let Some(b) = s.buttons.get_mut(button) {
                *b = pressed;
            }
        });
        self.record(PortCall::Button(stick, button, pressed));
    }

    fn get_move_y(&self, stick: usize) -> f32 {
        self.stick(stick).y
    }
}
