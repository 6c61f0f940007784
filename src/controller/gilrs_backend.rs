//! gilrs-backed [`JoystickBackend`]
//!
//! gilrs reports a standard gamepad layout. It is exposed as 6 axes
//! (left X/Y, right X/Y, left Z, right Z), 13 buttons and one hat built
//! from the D-pad.

use super::backend::{DeviceInfo, JoystickBackend};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

const AXES: [(Axis, bool); 6] = [
    (Axis::LeftStickX, false),
    (Axis::LeftStickY, true),
    (Axis::RightStickX, false),
    (Axis::RightStickY, true),
    (Axis::LeftZ, false),
    (Axis::RightZ, false),
];

const BUTTONS: [Button; 13] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::Mode,
];

/// D-pad buttons with their hat direction bit
const DPAD: [(Button, u8); 4] = [
    (Button::DPadUp, 1),
    (Button::DPadRight, 2),
    (Button::DPadDown, 4),
    (Button::DPadLeft, 8),
];

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to initialize gamepad access: {0}")]
    InitializationError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum BackendState {
    Initializing,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct GilrsJoysticks<S: BackendState> {
    gilrs: Gilrs,
    /// Device slots in connection order. A slot keeps its index after a disconnect.
    devices: Vec<GamepadId>,
}

impl GilrsJoysticks<Initializing> {
    pub fn create() -> Result<Self, BackendError> {
        info!("Initializing gilrs joystick backend");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(BackendError::InitializationError(e.to_string()));
            }
        };
        Ok(Self::new(gilrs, Vec::new()))
    }

    /// Enumerates connected gamepads and starts polling
    pub fn initialize(mut self) -> GilrsJoysticks<Polling> {
        self.devices = self.gilrs.gamepads().map(|(id, _)| id).collect();
        if self.devices.is_empty() {
            warn!("No gamepad connected");
        }
        for (index, (id, gamepad)) in self.gilrs.gamepads().enumerate() {
            info!("  [{}] ID: {}, Name: {}", index, id, gamepad.name());
        }
        self.transition()
    }
}

impl GilrsJoysticks<Polling> {
    fn gamepad(&self, index: usize) -> Option<Gamepad<'_>> {
        let id = *self.devices.get(index)?;
        self.gilrs.connected_gamepad(id)
    }
}

impl JoystickBackend for GilrsJoysticks<Polling> {
    fn refresh(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected if !self.devices.contains(&id) => {
                    info!("Gamepad {} connected as device {}", id, self.devices.len());
                    self.devices.push(id);
                }
                EventType::Disconnected => warn!("Gamepad {} disconnected", id),
                _ => {}
            }
        }
    }

    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn device(&self, index: usize) -> Option<DeviceInfo> {
        let gamepad = self.gamepad(index)?;
        debug!("Device {} is {}", index, gamepad.name());
        Some(DeviceInfo {
            name: gamepad.name().to_string(),
            axes: AXES.len(),
            buttons: BUTTONS.len(),
            hats: 1,
        })
    }

    fn axis(&self, index: usize, axis: usize) -> i16 {
        match (self.gamepad(index), AXES.get(axis)) {
            (Some(gamepad), Some((axis, invert))) => scale_axis(gamepad.value(*axis), *invert),
            _ => 0,
        }
    }

    fn button(&self, index: usize, button: usize) -> bool {
        match (self.gamepad(index), BUTTONS.get(button)) {
            (Some(gamepad), Some(button)) => gamepad.is_pressed(*button),
            _ => false,
        }
    }

    fn hat(&self, index: usize, hat: usize) -> u8 {
        match self.gamepad(index) {
            Some(gamepad) if hat == 0 => dpad_bits(|b| gamepad.is_pressed(b)),
            _ => 0,
        }
    }
}

/// gilrs' -1.0..=1.0 onto the signed 16-bit scale, Y pointing down
fn scale_axis(value: f32, invert: bool) -> i16 {
    let value = if invert { -value } else { value };
    (value.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

fn dpad_bits(pressed: impl Fn(Button) -> bool) -> u8 {
    DPAD.iter()
        .filter(|(button, _)| pressed(*button))
        .fold(0, |bits, (_, bit)| bits | bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_scale_and_invert() {
        assert_eq!(scale_axis(1.0, false), 32767);
        assert_eq!(scale_axis(-1.0, false), -32767);
        assert_eq!(scale_axis(1.0, true), -32767);
        assert_eq!(scale_axis(0.0, true), 0);
        assert_eq!(scale_axis(2.5, false), 32767);
    }

    #[test]
    fn dpad_builds_hat_bits() {
        assert_eq!(dpad_bits(|_| false), 0);
        assert_eq!(
            dpad_bits(|b| matches!(b, Button::DPadUp | Button::DPadLeft)),
            9
        );
        assert_eq!(dpad_bits(|b| b == Button::DPadDown), 4);
    }
}
