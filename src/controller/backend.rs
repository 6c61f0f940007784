//! Physical joystick access
//!
//! Stick bind groups read raw state through [`JoystickBackend`] once per poll.
//! Values use the signed 16-bit scale, hats the 1/2/4/8 direction bits.

use crate::config::JoystickType;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub axes: usize,
    pub buttons: usize,
    pub hats: usize,
}

pub trait JoystickBackend {
    /// Pulls pending device events so the next reads are current
    fn refresh(&mut self);
    fn device_count(&self) -> usize;
    fn device(&self, index: usize) -> Option<DeviceInfo>;
    fn axis(&self, index: usize, axis: usize) -> i16;
    fn button(&self, index: usize, button: usize) -> bool;
    fn hat(&self, index: usize, hat: usize) -> u8;
}

/// Backend without any device
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJoysticks;

impl JoystickBackend for NoJoysticks {
    fn refresh(&mut self) {}

    fn device_count(&self) -> usize {
        0
    }

    fn device(&self, _index: usize) -> Option<DeviceInfo> {
        None
    }

    fn axis(&self, _index: usize, _axis: usize) -> i16 {
        0
    }

    fn button(&self, _index: usize, _button: usize) -> bool {
        false
    }

    fn hat(&self, _index: usize, _hat: usize) -> u8 {
        0
    }
}

#[derive(Clone, Debug, Default)]
struct ScriptedDevice {
    info: DeviceInfo,
    axes: Vec<i16>,
    buttons: Vec<bool>,
    hats: Vec<u8>,
}

/// Backend whose state is set by hand, for hosts that feed input themselves
#[derive(Clone, Debug, Default)]
pub struct ScriptedJoysticks {
    devices: Vec<ScriptedDevice>,
}

impl ScriptedJoysticks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, name: &str, axes: usize, buttons: usize, hats: usize) -> Self {
        self.devices.push(ScriptedDevice {
            info: DeviceInfo {
                name: name.to_string(),
                axes,
                buttons,
                hats,
            },
            axes: vec![0; axes],
            buttons: vec![false; buttons],
            hats: vec![0; hats],
        });
        self
    }

    pub fn set_axis(&mut self, index: usize, axis: usize, value: i16) {
        if let Some(slot) = self.devices.get_mut(index).and_then(|d| d.axes.get_mut(axis)) {
            *slot = value;
        }
    }

    pub fn set_button(&mut self, index: usize, button: usize, pressed: bool) {
        if let Some(slot) = self
            .devices
            .get_mut(index)
            .and_then(|d| d.buttons.get_mut(button))
        {
            *slot = pressed;
        }
    }

    pub fn set_hat(&mut self, index: usize, hat: usize, value: u8) {
        if let Some(slot) = self.devices.get_mut(index).and_then(|d| d.hats.get_mut(hat)) {
            *slot = value;
        }
    }
}

impl JoystickBackend for ScriptedJoysticks {
    fn refresh(&mut self) {}

    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn device(&self, index: usize) -> Option<DeviceInfo> {
        self.devices.get(index).map(|d| d.info.clone())
    }

    fn axis(&self, index: usize, axis: usize) -> i16 {
        self.devices
            .get(index)
            .and_then(|d| d.axes.get(axis).copied())
            .unwrap_or_default()
    }

    fn button(&self, index: usize, button: usize) -> bool {
        self.devices
            .get(index)
            .and_then(|d| d.buttons.get(button).copied())
            .unwrap_or_default()
    }

    fn hat(&self, index: usize, hat: usize) -> u8 {
        self.devices
            .get(index)
            .and_then(|d| d.hats.get(hat).copied())
            .unwrap_or_default()
    }
}

/// Turns `auto` into a concrete joystick type based on the connected devices
pub fn resolve_joystick_type(
    configured: JoystickType,
    backend: &dyn JoystickBackend,
) -> JoystickType {
    if configured != JoystickType::Auto {
        return configured;
    }

    let devices: Vec<DeviceInfo> = (0..backend.device_count().min(2))
        .filter_map(|i| backend.device(i))
        .collect();

    let resolved = match devices.as_slice() {
        [first, second, ..] => {
            let usable = |d: &DeviceInfo| d.axes > 1 || d.buttons > 0;
            match (usable(first), usable(second)) {
                (true, true) => JoystickType::TwoAxis,
                (true, false) => JoystickType::FourAxis,
                (false, true) => JoystickType::FourAxisSecond,
                (false, false) => JoystickType::None,
            }
        }
        [only] if only.axes > 0 || only.buttons > 0 => JoystickType::FourAxis,
        _ => JoystickType::None,
    };

    info!(
        "Detected {} joystick(s), using joystick type {:?}",
        devices.len(),
        resolved
    );
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_type_is_kept() {
        assert_eq!(
            resolve_joystick_type(JoystickType::Fcs, &NoJoysticks),
            JoystickType::Fcs
        );
    }

    #[test]
    fn auto_without_devices_is_none() {
        assert_eq!(
            resolve_joystick_type(JoystickType::Auto, &NoJoysticks),
            JoystickType::None
        );
    }

    #[test]
    fn auto_with_one_device_splits_it() {
        let backend = ScriptedJoysticks::new().with_device("pad", 4, 4, 1);
        assert_eq!(
            resolve_joystick_type(JoystickType::Auto, &backend),
            JoystickType::FourAxis
        );
    }

    #[test]
    fn auto_with_two_devices() {
        let both = ScriptedJoysticks::new()
            .with_device("a", 2, 2, 0)
            .with_device("b", 2, 2, 0);
        assert_eq!(
            resolve_joystick_type(JoystickType::Auto, &both),
            JoystickType::TwoAxis
        );

        let second_only = ScriptedJoysticks::new()
            .with_device("wheel pedals", 1, 0, 0)
            .with_device("b", 4, 4, 0);
        assert_eq!(
            resolve_joystick_type(JoystickType::Auto, &second_only),
            JoystickType::FourAxisSecond
        );
    }

    #[test]
    fn scripted_state_is_readable() {
        let mut backend = ScriptedJoysticks::new().with_device("pad", 2, 2, 1);
        backend.set_axis(0, 1, -200);
        backend.set_button(0, 1, true);
        backend.set_hat(0, 0, 4);
        backend.set_axis(3, 0, 1);
        assert_eq!(backend.axis(0, 1), -200);
        assert!(backend.button(0, 1));
        assert_eq!(backend.hat(0, 0), 4);
        assert_eq!(backend.axis(0, 5), 0);
    }
}
