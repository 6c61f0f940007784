//! Activation path from physical input down to event effects

use super::bind::{BindId, BindSource};
use super::bind_group::{BindGroup, ListAction};
use super::context::InputMapperContext;
use super::event::{EventId, EventKind};
use super::{BindFlags, Mods, MAX_VALUE, TRIGGER_THRESHOLD};
use crate::controller::backend::JoystickBackend;
use crate::typer::KeyPress;
use tracing::debug;

impl InputMapperContext {
    /// Host key press or release from the platform
    pub fn handle_key(&mut self, code: u32, pressed: bool) {
        let list = match self.groups.first().and_then(BindGroup::as_keyboard) {
            Some(kb) => kb.list(code).to_vec(),
            None => return,
        };
        if pressed {
            self.activate_bind_list(&list, MAX_VALUE, true);
        } else {
            self.deactivate_bind_list(&list, true);
        }
    }

    /// One joystick tick: read devices, run bound events, write the gameport
    pub fn update_joysticks(&mut self, backend: &mut dyn JoystickBackend) {
        backend.refresh();
        for index in 0..self.groups.len() {
            let actions = match &mut self.groups[index] {
                BindGroup::Stick(stick) => stick.poll(&*backend),
                BindGroup::Keyboard(_) => continue,
            };
            for action in actions {
                match action {
                    ListAction::Activate {
                        list,
                        value,
                        trigger,
                    } => self.activate_bind_list(&list, value, trigger),
                    ListAction::Deactivate { list, trigger } => {
                        self.deactivate_bind_list(&list, trigger)
                    }
                }
            }
        }

        let vjoy = &self.vjoy;
        let port = self.ports.joystick.as_mut();
        for group in &mut self.groups {
            if let BindGroup::Stick(stick) = group {
                stick.update_outputs(vjoy, &mut *port);
            }
        }
    }

    /// Runs one macro typer press through its key event and answers the typer
    pub fn apply_typed_key(&mut self, press: KeyPress) {
        let Some(id) = self.event_id(&press.event_name()) else {
            press.reply(false);
            return;
        };
        if press.pressed {
            self.activate_event(id, true, false);
        } else {
            self.deactivate_event(id, true);
        }
        press.reply(true);
    }

    /// Whether the configured alternate chord for the host modifier is held
    fn host_chord_held(&self) -> bool {
        self.host_alternate
            .chord()
            .is_some_and(|chord| self.mods.contains(chord))
    }

    /// Fires the most specific modifier match among the binds of one physical code
    pub(crate) fn activate_bind_list(&mut self, list: &[BindId], value: i32, trigger: bool) {
        let held = self.mods;
        let chord = self.host_chord_held();
        let qualifies = |mods: Mods| held.contains(mods) || (chord && mods == Mods::HOST);

        let validmod = list
            .iter()
            .filter_map(|id| self.bind(*id))
            .map(|b| b.mods)
            .filter(|m| qualifies(*m))
            .map(|m| m.bits())
            .max();
        let Some(validmod) = validmod else {
            return;
        };

        for id in list {
            let Some(bind) = self.bind_mut(*id) else {
                continue;
            };
            if bind.mods.bits() != validmod {
                continue;
            }
            if bind.mods == Mods::HOST && !held.contains(Mods::HOST) && chord {
                bind.flags.insert(BindFlags::HOLD_TEMPORARY);
            }
            self.activate_bind(*id, value, trigger, false);
        }
    }

    /// Releases every bind of one physical code
    pub(crate) fn deactivate_bind_list(&mut self, list: &[BindId], trigger: bool) {
        for id in list {
            if let Some(bind) = self.bind_mut(*id) {
                bind.flags.remove(BindFlags::HOLD_TEMPORARY);
            }
            self.deactivate_bind(*id, trigger);
        }
    }

    pub(crate) fn activate_bind(&mut self, id: BindId, value: i32, trigger: bool, skip_action: bool) {
        let Some((event, source, group)) = self.bind(id).map(|b| (b.event, b.source, b.group))
        else {
            return;
        };
        let Some(is_trigger) = self.event(event).map(|e| e.is_trigger()) else {
            return;
        };

        let value = match source {
            BindSource::JoyAxis { .. } if is_trigger => {
                let threshold = self
                    .groups
                    .get(group)
                    .map(BindGroup::axis_button_threshold)
                    .unwrap_or(TRIGGER_THRESHOLD);
                if value > threshold {
                    MAX_VALUE
                } else {
                    0
                }
            }
            _ => value,
        };

        if let Some(bind) = self.bind_mut(id) {
            bind.value = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        }

        if !is_trigger {
            if let Some(ev) = self.event_mut(event) {
                ev.value = value;
            }
            self.activate_event(event, trigger, false);
            return;
        }

        if value > TRIGGER_THRESHOLD {
            if let Some(ev) = self.event_mut(event) {
                ev.value = value;
            }
            let Some(bind) = self.bind_mut(id) else {
                return;
            };
            if bind.active {
                return;
            }
            bind.active = true;
            // a latched bind is still holding the event
            if !bind.holding {
                self.activate_event(event, trigger, skip_action);
            }
        } else if self.bind(id).is_some_and(|b| b.active) {
            if let Some(bind) = self.bind_mut(id) {
                bind.active = false;
            }
            self.deactivate_event(event, trigger);
        }
    }

    pub(crate) fn deactivate_bind(&mut self, id: BindId, trigger: bool) {
        let Some(event) = self.bind(id).map(|b| b.event) else {
            return;
        };
        let Some(is_trigger) = self.event(event).map(|e| e.is_trigger()) else {
            return;
        };

        if !is_trigger {
            if let Some(bind) = self.bind_mut(id) {
                bind.value = 0;
            }
            if let Some(ev) = self.event_mut(event) {
                ev.value = 0;
            }
            self.deactivate_event(event, trigger);
            return;
        }

        let Some(bind) = self.bind_mut(id) else {
            return;
        };
        if !bind.active {
            return;
        }
        bind.active = false;
        if bind.flags.intersects(BindFlags::HOLD | BindFlags::HOLD_TEMPORARY) {
            if !bind.holding {
                bind.holding = true;
                self.holdlist.push(id);
                return;
            }
            bind.holding = false;
            self.holdlist.retain(|b| *b != id);
        }
        self.deactivate_event(event, trigger);
    }

    /// Lets go of a bind regardless of its hold latch
    pub(crate) fn release_bind(&mut self, id: BindId) {
        let Some(bind) = self.bind_mut(id) else {
            return;
        };
        let latched = bind.active || bind.holding;
        let deflected = bind.value != 0;
        bind.active = false;
        bind.holding = false;
        let (event, source) = (bind.event, bind.source);
        self.holdlist.retain(|b| *b != id);

        let Some(is_trigger) = self.event(event).map(|e| e.is_trigger()) else {
            return;
        };
        if is_trigger {
            if latched {
                self.deactivate_event(event, true);
            }
        } else if deflected {
            // key binds count activity, stick binds only read it
            self.deactivate_bind(id, matches!(source, BindSource::Key { .. }));
        }
    }

    pub(crate) fn release_all(&mut self) {
        for id in self.bind_ids() {
            self.release_bind(id);
        }
    }

    /// Own activity plus the opposite direction's
    fn activity_count(&self, id: EventId) -> u32 {
        let Some(event) = self.event(id) else {
            return 0;
        };
        let opposite = event
            .opposite()
            .and_then(|o| self.event(o))
            .map(|o| o.activity)
            .unwrap_or(0);
        event.activity | opposite
    }

    pub(crate) fn activate_event(&mut self, id: EventId, trigger: bool, skip_action: bool) {
        let Some(is_trigger) = self.event(id).map(|e| e.is_trigger()) else {
            return;
        };
        if is_trigger {
            let fire = self
                .event_mut(id)
                .and_then(|ev| ev.trigger_activate(skip_action));
            if let Some(on) = fire {
                self.fire(id, on);
            }
        } else if trigger {
            if let Some(ev) = self.event_mut(id) {
                ev.activity = ev.activity.saturating_add(1);
            }
            if !skip_action {
                self.fire(id, true);
            }
        } else if self.activity_count(id) == 0 {
            self.fire(id, true);
        }
    }

    pub(crate) fn deactivate_event(&mut self, id: EventId, trigger: bool) {
        let Some(is_trigger) = self.event(id).map(|e| e.is_trigger()) else {
            return;
        };
        if is_trigger {
            let fire = self.event_mut(id).and_then(|ev| ev.trigger_deactivate());
            if let Some(on) = fire {
                self.fire(id, on);
            }
        } else if trigger {
            let remaining = self.event_mut(id).map(|ev| {
                ev.activity = ev.activity.saturating_sub(1);
                ev.activity
            });
            if remaining == Some(0) {
                if self.activity_count(id) > 0 {
                    self.repost_activity(id);
                } else {
                    self.fire(id, false);
                }
            }
        } else if self.activity_count(id) == 0 {
            self.fire(id, false);
        }
    }

    /// Re-applies the opposite direction that is still held
    fn repost_activity(&mut self, id: EventId) {
        if let Some(opposite) = self.event(id).and_then(|e| e.opposite()) {
            self.fire(opposite, true);
        }
    }

    /// The `Active` effect of an event
    pub(crate) fn fire(&mut self, id: EventId, on: bool) {
        let Some(event) = self.events.get_mut(id.0).and_then(Option::as_mut) else {
            return;
        };
        event.active = on;
        let value = event.value;
        let mut taken_over = None;
        match &mut event.kind {
            EventKind::Key(key) => self.ports.keyboard.add_key(*key, on),
            EventKind::Modifier(bits) => self.mods.set(*bits, on),
            EventKind::Handler(handler) => (handler.callback)(on),
            EventKind::MouseButton(button) => {
                if on {
                    self.ports.mouse.button_pressed(*button);
                } else {
                    self.ports.mouse.button_released(*button);
                }
            }
            EventKind::JoystickAxis(target) => {
                let sign = if target.positive { 1 } else { -1 };
                let position = if on { value * sign } else { 0 };
                self.vjoy.set_axis(target.stick, target.axis, position);
                if on {
                    taken_over = target.opposite;
                }
            }
            EventKind::JoystickButton { stick, button } => {
                self.vjoy.set_button(*stick, *button, on)
            }
            EventKind::JoystickHat { stick, hat, dir } => {
                self.vjoy.set_hat(*stick, *hat, *dir, on)
            }
        }
        debug!("{} -> {}", event.name(), on);
        if let Some(observer) = self.observer.as_mut() {
            observer(event.name(), on);
        }
        // both directions share one axis
        if let Some(opposite) = taken_over.and_then(|o| self.event_mut(o)) {
            opposite.active = false;
        }
    }

    /// Window focus lost: let go of everything except the lock keys
    pub fn losing_focus(&mut self) {
        let locks = self.lock_key_events();
        let ids: Vec<EventId> = self
            .events()
            .map(|(id, _)| id)
            .filter(|id| !locks.contains(&Some(*id)))
            .collect();
        for id in ids {
            self.deactivate_all(id);
        }
    }

    /// Deactivates every bind of one event
    pub fn deactivate_all(&mut self, id: EventId) {
        let binds = self.event(id).map(|e| e.binds.clone()).unwrap_or_default();
        for bind in binds {
            self.deactivate_bind(bind, true);
        }
    }

    /// Startup sync of host lock state without injecting key presses
    pub fn sync_lock_keys(&mut self, caps_on: bool, num_on: bool) {
        let [caps, num] = self.lock_key_events();
        for (event, on) in [(caps, caps_on), (num, num_on)] {
            let Some(event) = event.filter(|_| on) else {
                continue;
            };
            let binds = self.event(event).map(|e| e.binds.clone()).unwrap_or_default();
            for bind in binds {
                self.activate_bind(bind, MAX_VALUE, true, true);
                self.deactivate_bind(bind, false);
            }
        }
    }
}
