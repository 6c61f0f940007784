//! Buffer between joystick events and the emulated gameport

pub const MAX_VIRTUAL_STICKS: usize = 2;
pub const MAX_VIRTUAL_BUTTONS: usize = 8;
pub const MAX_VIRTUAL_AXES: usize = 8;
/// Four hats with four directions each
pub const MAX_VIRTUAL_HAT_DIRECTIONS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VirtualStick {
    pub button_pressed: [bool; MAX_VIRTUAL_BUTTONS],
    pub axis_pos: [i16; MAX_VIRTUAL_AXES],
    /// Indexed by `(hat << 2) + direction`
    pub hat_pressed: [bool; MAX_VIRTUAL_HAT_DIRECTIONS],
}

/// Written by joystick events, read by the stick bind groups once per poll
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VirtualJoystickState {
    sticks: [VirtualStick; MAX_VIRTUAL_STICKS],
}

impl VirtualJoystickState {
    pub fn stick(&self, stick: usize) -> Option<&VirtualStick> {
        self.sticks.get(stick)
    }

    pub fn set_axis(&mut self, stick: usize, axis: usize, value: i32) {
        if let Some(slot) = self.sticks.get_mut(stick).and_then(|s| s.axis_pos.get_mut(axis)) {
            *slot = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        }
    }

    pub fn set_button(&mut self, stick: usize, button: usize, pressed: bool) {
        if let Some(slot) = self
            .sticks
            .get_mut(stick)
            .and_then(|s| s.button_pressed.get_mut(button))
        {
            *slot = pressed;
        }
    }

    pub fn set_hat(&mut self, stick: usize, hat: usize, dir: usize, pressed: bool) {
        let index = (hat << 2) + dir;
        if let Some(slot) = self
            .sticks
            .get_mut(stick)
            .and_then(|s| s.hat_pressed.get_mut(index))
        {
            *slot = pressed;
        }
    }

    pub fn axis(&self, stick: usize, axis: usize) -> i16 {
        self.stick(stick)
            .and_then(|s| s.axis_pos.get(axis).copied())
            .unwrap_or_default()
    }

    pub fn button(&self, stick: usize, button: usize) -> bool {
        self.stick(stick)
            .and_then(|s| s.button_pressed.get(button).copied())
            .unwrap_or_default()
    }

    pub fn hat(&self, stick: usize, hat: usize, dir: usize) -> bool {
        self.stick(stick)
            .and_then(|s| s.hat_pressed.get((hat << 2) + dir).copied())
            .unwrap_or_default()
    }
}
