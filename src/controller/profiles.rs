//! Emulated gameport output of the stick profiles
//!
//! After bound events have written the virtual joystick, each stick group
//! turns that buffer into gameport state:
//!
//! ```text
//!   2axis  : vjoy[n] axes 0-1, buttons 0-1            -> stick n
//!   4axis  : vjoy[0] axes 0-1 / 2-3, buttons i>>1,i&1 -> sticks 0 and 1
//!   fcs    : 4axis layout, hat folded into stick 1 Y
//!   ch     : 4axis axes, buttons and hats encoded as one priority code
//! ```

use super::virtual_joystick::{VirtualJoystickState, MAX_VIRTUAL_BUTTONS};
use crate::mapping::bind_group::{StickBindGroup, StickProfile, MAX_STICK_BUTTONS};
use crate::ports::JoystickPort;

const HAT_CENTERED: u8 = 0x00;
const HAT_UP: u8 = 0x01;
const HAT_RIGHT: u8 = 0x02;
const HAT_DOWN: u8 = 0x04;
const HAT_LEFT: u8 = 0x08;
const HAT_RIGHTUP: u8 = HAT_RIGHT | HAT_UP;
const HAT_RIGHTDOWN: u8 = HAT_RIGHT | HAT_DOWN;
const HAT_LEFTUP: u8 = HAT_LEFT | HAT_UP;
const HAT_LEFTDOWN: u8 = HAT_LEFT | HAT_DOWN;

/// CH Flightstick: lower value wins
pub const CH_BUTTON_PRIORITY: [u8; 6] = [7, 11, 13, 14, 5, 6];
/// Per hat, indexed by up, down, right, left
pub const CH_HAT_PRIORITY: [[u8; 4]; 2] = [[0, 1, 2, 3], [8, 9, 10, 12]];

fn axis_to_float(value: i16) -> f32 {
    f32::from(value) / 32768.0
}

/// Hat bits of a virtual hat, vertical before horizontal, up over down, left over right
fn virtual_hat_position(vjoy: &VirtualJoystickState, stick: usize, hat: usize) -> u8 {
    let mut position = HAT_CENTERED;
    if vjoy.hat(stick, hat, 0) {
        position |= HAT_UP;
    } else if vjoy.hat(stick, hat, 2) {
        position |= HAT_DOWN;
    }
    if vjoy.hat(stick, hat, 3) {
        position |= HAT_LEFT;
    } else if vjoy.hat(stick, hat, 1) {
        position |= HAT_RIGHT;
    }
    position
}

/// Stick 1 Y level for an FCS hat position. Diagonals keep the level that is
/// closer to `current_y` so a rolling thumb does not flicker.
pub fn decode_fcs_hat(position: u8, current_y: f32) -> Option<f32> {
    let y = match position {
        HAT_CENTERED => 1.0,
        HAT_UP => -1.0,
        HAT_RIGHT => -0.5,
        HAT_DOWN => 0.0,
        HAT_LEFT => 0.5,
        HAT_LEFTUP => {
            if current_y < 0.0 {
                0.5
            } else {
                -1.0
            }
        }
        HAT_RIGHTUP => {
            if current_y < -0.7 {
                -0.5
            } else {
                -1.0
            }
        }
        HAT_RIGHTDOWN => {
            if current_y < -0.2 {
                0.0
            } else {
                -0.5
            }
        }
        HAT_LEFTDOWN => {
            if current_y > 0.2 {
                0.0
            } else {
                0.5
            }
        }
        _ => return None,
    };
    Some(y)
}

/// Four-bit CH code of the highest priority input held, 15 when idle
pub fn ch_button_state(hats: [u8; 2], buttons: &[bool]) -> u8 {
    let mut state = 15u8;
    for (hat, position) in hats.iter().enumerate() {
        let priority = CH_HAT_PRIORITY[hat];
        for (bit, slot) in [(HAT_UP, 0), (HAT_DOWN, 1), (HAT_RIGHT, 2), (HAT_LEFT, 3)] {
            if position & bit != 0 {
                state = state.min(priority[slot]);
            }
        }
    }
    for (pressed, priority) in buttons.iter().zip(CH_BUTTON_PRIORITY) {
        if *pressed {
            state = state.min(priority);
        }
    }
    state.min(15)
}

impl StickBindGroup {
    /// Virtual buttons folded onto the emulated ones
    fn folded_buttons(&self, vjoy: &VirtualJoystickState, stick: usize) -> [bool; MAX_STICK_BUTTONS] {
        let mut pressed = [false; MAX_STICK_BUTTONS];
        if self.button_wrap == 0 {
            return pressed;
        }
        for i in 0..MAX_VIRTUAL_BUTTONS {
            if vjoy.button(stick, i) {
                pressed[i % self.button_wrap] = true;
            }
        }
        pressed
    }

    fn emit_button(
        &mut self,
        index: usize,
        pressed: bool,
        target: (usize, usize),
        port: &mut dyn JoystickPort,
    ) {
        let (stick, button) = target;
        if self.autofire && pressed {
            self.button_autofire[index] = self.button_autofire[index].wrapping_add(1);
            port.button(stick, button, self.button_autofire[index] & 1 == 1);
        } else {
            port.button(stick, button, pressed);
        }
    }

    /// Writes this group's gameport state from the virtual joystick
    pub(crate) fn update_outputs(&mut self, vjoy: &VirtualJoystickState, port: &mut dyn JoystickPort) {
        if self.is_dummy() {
            return;
        }

        match self.profile {
            StickProfile::TwoAxis => {
                let stick = self.emustick;
                let pressed = self.folded_buttons(vjoy, stick);
                for i in 0..self.emulated_buttons {
                    self.emit_button(i, pressed[i], (stick, i), port);
                }
                port.move_x(stick, axis_to_float(vjoy.axis(stick, 0)));
                port.move_y(stick, axis_to_float(vjoy.axis(stick, 1)));
            }
            StickProfile::FourAxis | StickProfile::Fcs { .. } => {
                let pressed = self.folded_buttons(vjoy, 0);
                for i in 0..self.emulated_buttons {
                    self.emit_button(i, pressed[i], (i >> 1, i & 1), port);
                }
                port.move_x(0, axis_to_float(vjoy.axis(0, 0)));
                port.move_y(0, axis_to_float(vjoy.axis(0, 1)));
                port.move_x(1, axis_to_float(vjoy.axis(0, 2)));

                if let StickProfile::Fcs { old_hat_position } = self.profile {
                    let position = virtual_hat_position(vjoy, 0, 0);
                    if position != old_hat_position {
                        if let Some(y) = decode_fcs_hat(position, port.get_move_y(1)) {
                            port.move_y(1, y);
                        }
                        self.profile = StickProfile::Fcs {
                            old_hat_position: position,
                        };
                    }
                } else {
                    port.move_y(1, axis_to_float(vjoy.axis(0, 3)));
                }
            }
            StickProfile::Ch => {
                port.move_x(0, axis_to_float(vjoy.axis(0, 0)));
                port.move_y(0, axis_to_float(vjoy.axis(0, 1)));
                port.move_x(1, axis_to_float(vjoy.axis(0, 2)));
                port.move_y(1, axis_to_float(vjoy.axis(0, 3)));

                let hats = [virtual_hat_position(vjoy, 0, 0), virtual_hat_position(vjoy, 0, 1)];
                let pressed = self.folded_buttons(vjoy, 0);
                let state = ch_button_state(hats, &pressed[..CH_BUTTON_PRIORITY.len()]);
                port.button(0, 0, state & 8 == 0);
                port.button(0, 1, state & 4 == 0);
                port.button(1, 0, state & 2 == 0);
                port.button(1, 1, state & 1 == 0);
            }
        }
    }
}
