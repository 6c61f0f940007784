//! Bind groups: per-device owners of the physical-input bind lists

use super::bind::{Bind, BindId, BindSource, HatDirection};
use super::context::RawInput;
use super::error::MappingError;
use super::keyboard::host_key_name;
use super::TRIGGER_THRESHOLD;
use crate::config::JoystickSettings;
use crate::controller::backend::JoystickBackend;
use crate::controller::normalize::{process_input, to_axis_value, AxisTuning};
use crate::ports::JoystickPort;
use std::collections::HashMap;
use tracing::{info, warn};

pub type GroupId = usize;

pub const MAX_STICK_AXES: usize = 4;
pub const MAX_STICK_BUTTONS: usize = 32;
/// Physical buttons considered when wrapping is on
pub const MAX_BUTTON_CAP: usize = 16;
pub const MAX_STICK_HATS: usize = 4;

const MISSING_DEVICE: &str = "[missing joystick]";

/// Emulated hardware a stick group presents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickProfile {
    TwoAxis,
    FourAxis,
    Fcs { old_hat_position: u8 },
    Ch,
}

impl StickProfile {
    pub fn fcs() -> Self {
        Self::Fcs {
            old_hat_position: 0,
        }
    }

    /// Emulated axes, buttons and hats
    fn emulated_counts(self) -> (usize, usize, usize) {
        match self {
            Self::TwoAxis => (2, 2, 0),
            Self::FourAxis => (4, 4, 0),
            Self::Fcs { .. } => (4, 4, 1),
            Self::Ch => (4, 6, 1),
        }
    }
}

/// Bind list operation produced by polling, run by the dispatcher in order
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ListAction {
    Activate {
        list: Vec<BindId>,
        value: i32,
        trigger: bool,
    },
    Deactivate {
        list: Vec<BindId>,
        trigger: bool,
    },
}

#[derive(Debug, Default)]
pub struct KeyBindGroup {
    lists: HashMap<u32, Vec<BindId>>,
}

impl KeyBindGroup {
    pub fn list(&self, code: u32) -> &[BindId] {
        self.lists.get(&code).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct StickBindGroup {
    pub(crate) profile: StickProfile,
    device: Option<usize>,
    pub(crate) emustick: usize,
    prefix: String,
    name: String,
    dummy: bool,
    connected: bool,

    axes: usize,
    buttons: usize,
    hats: usize,
    pub(crate) emulated_axes: usize,
    pub(crate) emulated_buttons: usize,
    emulated_hats: usize,
    pub(crate) button_wrap: usize,
    button_cap: usize,
    axes_cap: usize,
    hats_cap: usize,

    pos_axis_lists: Vec<Vec<BindId>>,
    neg_axis_lists: Vec<Vec<BindId>>,
    button_lists: Vec<Vec<BindId>>,
    hat_lists: Vec<Vec<BindId>>,

    old_button_state: [bool; MAX_STICK_BUTTONS],
    old_pos_axis_state: [bool; MAX_STICK_AXES],
    old_neg_axis_state: [bool; MAX_STICK_AXES],
    old_hat_state: [u8; MAX_STICK_HATS],
    pub(crate) button_autofire: [u32; MAX_STICK_BUTTONS],

    tuning: Vec<AxisTuning>,
    axis_button_threshold: i32,
    pub(crate) autofire: bool,
}

impl StickBindGroup {
    fn blank(profile: StickProfile, device: Option<usize>, emustick: usize) -> Self {
        let (emulated_axes, emulated_buttons, emulated_hats) = profile.emulated_counts();
        Self {
            profile,
            device,
            emustick,
            prefix: format!("stick_{emustick}"),
            name: MISSING_DEVICE.to_string(),
            dummy: false,
            connected: false,
            axes: 0,
            buttons: 0,
            hats: 0,
            emulated_axes,
            emulated_buttons,
            emulated_hats,
            button_wrap: emulated_buttons,
            button_cap: 0,
            axes_cap: 0,
            hats_cap: 0,
            pos_axis_lists: vec![Vec::new(); MAX_STICK_AXES],
            neg_axis_lists: vec![Vec::new(); MAX_STICK_AXES],
            button_lists: vec![Vec::new(); MAX_STICK_BUTTONS],
            hat_lists: vec![Vec::new(); MAX_STICK_HATS * 4],
            old_button_state: [false; MAX_STICK_BUTTONS],
            old_pos_axis_state: [false; MAX_STICK_AXES],
            old_neg_axis_state: [false; MAX_STICK_AXES],
            old_hat_state: [0; MAX_STICK_HATS],
            button_autofire: [0; MAX_STICK_BUTTONS],
            tuning: vec![AxisTuning::default(); MAX_STICK_AXES / 2],
            axis_button_threshold: TRIGGER_THRESHOLD,
            autofire: false,
        }
    }

    /// Placeholder for an emulated stick slot without hardware. Its binds are
    /// kept and saved, but it never polls and never drives the gameport.
    pub fn dummy(emustick: usize) -> Self {
        let mut group = Self::blank(StickProfile::TwoAxis, None, emustick);
        group.dummy = true;
        group
    }

    /// Stick group reading physical device `device` into emulated stick `emustick`
    pub fn new(
        profile: StickProfile,
        device: usize,
        emustick: usize,
        backend: &dyn JoystickBackend,
        settings: &JoystickSettings,
        port: &mut dyn JoystickPort,
    ) -> Self {
        let mut group = Self::blank(profile, Some(device), emustick);
        group.autofire = settings.autofire;
        group.axis_button_threshold = settings.axis_button_threshold();
        group.tuning = (0..MAX_STICK_AXES / 2)
            .map(|pair| settings.axis_tuning(device, pair))
            .collect();

        port.enable(emustick, true);
        if profile != StickProfile::TwoAxis {
            port.enable(1, true);
        }
        if let StickProfile::Fcs { .. } = profile {
            port.move_y(1, 1.0);
        }

        let Some(info) = backend.device(device) else {
            warn!(
                "No joystick {} present for {}, only bound inputs will drive it",
                device, group.prefix
            );
            return group;
        };

        group.connected = true;
        group.name = info.name;
        group.axes = info.axes;
        group.buttons = info.buttons;
        group.hats = info.hats;
        group.button_wrap = info.buttons;
        group.button_cap = info.buttons;
        if settings.buttonwrap {
            group.button_wrap = group.emulated_buttons;
            group.button_cap = info.buttons.min(MAX_BUTTON_CAP);
        }
        group.button_wrap = group.button_wrap.min(MAX_STICK_BUTTONS);
        group.axes_cap = group.emulated_axes.min(info.axes).min(MAX_STICK_AXES);
        group.hats_cap = group.emulated_hats.min(info.hats).min(MAX_STICK_HATS);

        info!(
            "Using joystick {} with {} axes, {} buttons and {} hat(s)",
            group.name, group.axes, group.buttons, group.hats
        );
        group
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Device name used in bind display names
    pub fn device_name(&self) -> &str {
        &self.name
    }

    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn device(&self) -> Option<usize> {
        self.device
    }

    fn list_index(&self, source: &BindSource) -> Result<(ListKind, usize), MappingError> {
        match *source {
            BindSource::JoyAxis { axis, positive } if axis < self.emulated_axes => Ok((
                if positive {
                    ListKind::PosAxis
                } else {
                    ListKind::NegAxis
                },
                axis,
            )),
            BindSource::JoyButton { button } if button < self.button_wrap => {
                Ok((ListKind::Button, button))
            }
            BindSource::JoyHat { hat, dir } if hat < MAX_STICK_HATS => {
                Ok((ListKind::Hat, (hat << 2) + dir.index()))
            }
            BindSource::Key { .. } => Err(MappingError::InvalidBindSpec(format!(
                "{} cannot hold key binds",
                self.prefix
            ))),
            _ => Err(MappingError::OutOfRange(format!(
                "{} {}",
                self.prefix,
                source.config_words()
            ))),
        }
    }

    fn lists_mut(&mut self, kind: ListKind) -> &mut Vec<Vec<BindId>> {
        match kind {
            ListKind::PosAxis => &mut self.pos_axis_lists,
            ListKind::NegAxis => &mut self.neg_axis_lists,
            ListKind::Button => &mut self.button_lists,
            ListKind::Hat => &mut self.hat_lists,
        }
    }

    /// Reads the device and turns every change into bind list work
    pub(crate) fn poll(&mut self, backend: &dyn JoystickBackend) -> Vec<ListAction> {
        let mut actions = Vec::new();
        let Some(device) = self.device.filter(|_| self.connected && !self.dummy) else {
            return actions;
        };

        let mut button_pressed = [false; MAX_STICK_BUTTONS];
        if self.button_wrap > 0 {
            for i in 0..self.button_cap {
                if backend.button(device, i) {
                    button_pressed[i % self.button_wrap] = true;
                }
            }
        }
        for i in 0..self.button_wrap {
            if button_pressed[i] != self.old_button_state[i] {
                let list = self.button_lists[i].clone();
                if button_pressed[i] {
                    actions.push(ListAction::Activate {
                        list,
                        value: super::MAX_VALUE,
                        trigger: true,
                    });
                } else {
                    actions.push(ListAction::Deactivate {
                        list,
                        trigger: true,
                    });
                }
                self.old_button_state[i] = button_pressed[i];
            }
        }

        for pair in 0..self.axes_cap.div_ceil(2) {
            let x_axis = pair * 2;
            let y_axis = x_axis + 1;
            let raw_x = backend.axis(device, x_axis);
            let raw_y = if y_axis < self.axes_cap {
                backend.axis(device, y_axis)
            } else {
                0
            };
            let (x, y) = process_input(raw_x, raw_y, self.tuning[pair]);
            self.axis_actions(x_axis, to_axis_value(x), &mut actions);
            if y_axis < self.axes_cap {
                self.axis_actions(y_axis, to_axis_value(y), &mut actions);
            }
        }

        for hat in 0..self.hats_cap {
            let state = backend.hat(device, hat);
            let old = self.old_hat_state[hat];
            for dir in HatDirection::ALL {
                let bit = dir.bit();
                if state & bit == old & bit {
                    continue;
                }
                let list = self.hat_lists[(hat << 2) + dir.index()].clone();
                if state & bit != 0 {
                    actions.push(ListAction::Activate {
                        list,
                        value: super::MAX_VALUE,
                        trigger: true,
                    });
                } else {
                    actions.push(ListAction::Deactivate {
                        list,
                        trigger: true,
                    });
                }
            }
            self.old_hat_state[hat] = state;
        }

        actions
    }

    fn axis_actions(&mut self, axis: usize, position: i32, actions: &mut Vec<ListAction>) {
        if position > 1 {
            if self.old_neg_axis_state[axis] {
                actions.push(ListAction::Deactivate {
                    list: self.neg_axis_lists[axis].clone(),
                    trigger: false,
                });
                self.old_neg_axis_state[axis] = false;
            }
            actions.push(ListAction::Activate {
                list: self.pos_axis_lists[axis].clone(),
                value: position,
                trigger: false,
            });
            self.old_pos_axis_state[axis] = true;
        } else if position < -1 {
            if self.old_pos_axis_state[axis] {
                actions.push(ListAction::Deactivate {
                    list: self.pos_axis_lists[axis].clone(),
                    trigger: false,
                });
                self.old_pos_axis_state[axis] = false;
            }
            actions.push(ListAction::Activate {
                list: self.neg_axis_lists[axis].clone(),
                value: position.abs().min(super::MAX_VALUE),
                trigger: false,
            });
            self.old_neg_axis_state[axis] = true;
        } else {
            if self.old_pos_axis_state[axis] {
                actions.push(ListAction::Deactivate {
                    list: self.pos_axis_lists[axis].clone(),
                    trigger: false,
                });
                self.old_pos_axis_state[axis] = false;
            }
            if self.old_neg_axis_state[axis] {
                actions.push(ListAction::Deactivate {
                    list: self.neg_axis_lists[axis].clone(),
                    trigger: false,
                });
                self.old_neg_axis_state[axis] = false;
            }
        }
    }

    /// Bind source for a live input on this stick's device
    fn capture(&self, raw: &RawInput) -> Option<BindSource> {
        match *raw {
            RawInput::JoyAxis {
                device,
                axis,
                value,
            } if Some(device) == self.device => {
                if i32::from(value).abs() < TRIGGER_THRESHOLD || axis >= self.emulated_axes {
                    return None;
                }
                Some(BindSource::JoyAxis {
                    axis,
                    positive: value > 0,
                })
            }
            RawInput::JoyButton { device, button } if Some(device) == self.device => {
                if self.button_wrap == 0 {
                    return None;
                }
                Some(BindSource::JoyButton {
                    button: button % self.button_wrap,
                })
            }
            RawInput::JoyHat { device, hat, value } if Some(device) == self.device => {
                if value == 0 || value > 0x0f {
                    return None;
                }
                BindSource::hat(hat, value).ok()
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    PosAxis,
    NegAxis,
    Button,
    Hat,
}

#[derive(Debug)]
pub enum BindGroup {
    Keyboard(KeyBindGroup),
    Stick(StickBindGroup),
}

impl BindGroup {
    pub fn keyboard() -> Self {
        Self::Keyboard(KeyBindGroup::default())
    }

    /// First word of every bind spec this group owns
    pub fn config_prefix(&self) -> &str {
        match self {
            Self::Keyboard(_) => "key",
            Self::Stick(stick) => stick.prefix(),
        }
    }

    pub(crate) fn parse_source<'a>(
        &self,
        words: &mut impl Iterator<Item = &'a str>,
    ) -> Result<BindSource, MappingError> {
        match self {
            Self::Keyboard(_) => BindSource::parse_key(words),
            Self::Stick(_) => BindSource::parse_stick(words),
        }
    }

    /// Adds a bind to the list of its physical code
    pub(crate) fn insert(&mut self, id: BindId, source: &BindSource) -> Result<(), MappingError> {
        match self {
            Self::Keyboard(kb) => match source {
                BindSource::Key { code } => {
                    kb.lists.entry(*code).or_default().push(id);
                    Ok(())
                }
                other => Err(MappingError::InvalidBindSpec(format!(
                    "keyboard cannot hold {}",
                    other.config_words()
                ))),
            },
            Self::Stick(stick) => {
                let (kind, index) = stick.list_index(source)?;
                stick.lists_mut(kind)[index].push(id);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, id: BindId, source: &BindSource) {
        match self {
            Self::Keyboard(kb) => {
                if let BindSource::Key { code } = source {
                    if let Some(list) = kb.lists.get_mut(code) {
                        list.retain(|b| *b != id);
                    }
                }
            }
            Self::Stick(stick) => {
                if let Ok((kind, index)) = stick.list_index(source) {
                    stick.lists_mut(kind)[index].retain(|b| *b != id);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Keyboard(kb) => kb.lists.clear(),
            Self::Stick(stick) => {
                for kind in [
                    ListKind::PosAxis,
                    ListKind::NegAxis,
                    ListKind::Button,
                    ListKind::Hat,
                ] {
                    stick.lists_mut(kind).iter_mut().for_each(Vec::clear);
                }
            }
        }
    }

    pub(crate) fn capture(&self, raw: &RawInput) -> Option<BindSource> {
        match (self, raw) {
            (Self::Keyboard(_), RawInput::KeyDown { code }) => Some(BindSource::Key { code: *code }),
            (Self::Stick(stick), raw) if !stick.dummy => stick.capture(raw),
            _ => None,
        }
    }

    /// Deadzone applied when an axis drives an on/off event
    pub(crate) fn axis_button_threshold(&self) -> i32 {
        match self {
            Self::Keyboard(_) => TRIGGER_THRESHOLD,
            Self::Stick(stick) => stick.axis_button_threshold,
        }
    }

    /// Human readable bind name like `Key a` or `Gamepad Axis 1+`
    pub fn bind_name(&self, bind: &Bind) -> String {
        let input = match (self, bind.source()) {
            (_, BindSource::Key { code }) => format!("Key {}", host_key_name(code)),
            (Self::Stick(stick), BindSource::JoyAxis { axis, positive }) => format!(
                "{} Axis {}{}",
                stick.name,
                axis,
                if positive { "+" } else { "-" }
            ),
            (Self::Stick(stick), BindSource::JoyButton { button }) => {
                format!("{} Button {}", stick.name, button)
            }
            (Self::Stick(stick), BindSource::JoyHat { hat, dir }) => {
                format!("{} Hat {} {}", stick.name, hat, dir.name())
            }
            (Self::Keyboard(_), other) => other.config_words(),
        };
        format!("{}{}", bind.mods_label(), input)
    }

    pub fn as_stick(&self) -> Option<&StickBindGroup> {
        match self {
            Self::Stick(stick) => Some(stick),
            Self::Keyboard(_) => None,
        }
    }

    pub fn as_keyboard(&self) -> Option<&KeyBindGroup> {
        match self {
            Self::Keyboard(kb) => Some(kb),
            Self::Stick(_) => None,
        }
    }
}
