//! The mapper context: owner of every event, bind and bind group

use super::bind::{parse_options, Bind, BindId, BindSource};
use super::bind_group::{BindGroup, GroupId, StickBindGroup, StickProfile};
use super::defaults;
use super::error::MappingError;
use super::event::{Event, EventId, EventKind, Handler};
use super::keyboard::{KbdKey, KEY_TABLE};
use super::{BindFlags, Mods};
use crate::config::{HostKeyAlternate, JoystickType, Settings};
use crate::controller::backend::{resolve_joystick_type, JoystickBackend};
use crate::controller::virtual_joystick::VirtualJoystickState;
use crate::ports::EmulatorPorts;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Called with the event name and its new state after every `Active` effect
pub type BindObserver = Box<dyn FnMut(&str, bool) + Send>;

/// Live physical input offered to [`InputMapperContext::capture_bind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawInput {
    KeyDown { code: u32 },
    JoyAxis { device: usize, axis: usize, value: i16 },
    JoyButton { device: usize, button: usize },
    JoyHat { device: usize, hat: usize, value: u8 },
}

/// One arena entry. The generation moves on every time the bind is dropped.
#[derive(Debug, Default)]
struct BindSlot {
    generation: u32,
    bind: Option<Bind>,
}

pub struct InputMapperContext {
    pub(crate) events: Vec<Option<Event>>,
    names: HashMap<String, EventId>,
    binds: Vec<BindSlot>,
    free_binds: Vec<usize>,
    pub(crate) groups: Vec<BindGroup>,
    pending: HashMap<String, Vec<String>>,
    pub(crate) mods: Mods,
    pub(crate) host_alternate: HostKeyAlternate,
    pub(crate) holdlist: Vec<BindId>,
    pub(crate) vjoy: VirtualJoystickState,
    pub(crate) ports: EmulatorPorts,
    pub(crate) observer: Option<BindObserver>,
    joystick_type: JoystickType,
    defaults_applied: bool,
}

impl InputMapperContext {
    /// Empty context with only the keyboard group
    pub fn new(ports: EmulatorPorts, host_alternate: HostKeyAlternate) -> Self {
        Self {
            events: Vec::new(),
            names: HashMap::new(),
            binds: Vec::new(),
            free_binds: Vec::new(),
            groups: vec![BindGroup::keyboard()],
            pending: HashMap::new(),
            mods: Mods::empty(),
            host_alternate,
            holdlist: Vec::new(),
            vjoy: VirtualJoystickState::default(),
            ports,
            observer: None,
            joystick_type: JoystickType::None,
            defaults_applied: false,
        }
    }

    /// Full startup: stick groups, the standard event layout, then binds
    /// from `binds_text` or the defaults.
    pub fn startup(
        ports: EmulatorPorts,
        settings: &Settings,
        backend: &dyn JoystickBackend,
        binds_text: Option<&str>,
    ) -> Result<Self, MappingError> {
        let mut ctx = Self::new(ports, settings.mapper.host_key_alternate);
        ctx.create_stick_groups(settings, backend);
        defaults::register_standard_events(&mut ctx)?;
        match binds_text {
            Some(text) => ctx.load_binds(text),
            None => ctx.create_default_binds(),
        }
        info!(
            "Mapper ready: {} events, {} binds, joystick type {:?}",
            ctx.events.iter().flatten().count(),
            ctx.bind_ids().len(),
            ctx.joystick_type
        );
        Ok(ctx)
    }

    /// Creates the stick bind groups for the configured joystick type
    pub fn create_stick_groups(&mut self, settings: &Settings, backend: &dyn JoystickBackend) {
        let js = &settings.joystick;
        let joystick_type = resolve_joystick_type(js.joysticktype, backend);
        self.joystick_type = joystick_type;
        self.groups.truncate(1);

        let port = self.ports.joystick.as_mut();
        let mut stick = |profile, device, emustick| {
            BindGroup::Stick(StickBindGroup::new(
                profile,
                device,
                emustick,
                backend,
                js,
                &mut *port,
            ))
        };
        let sticks: Vec<BindGroup> = match joystick_type {
            JoystickType::None | JoystickType::Auto => Vec::new(),
            JoystickType::TwoAxis => {
                let first = stick(StickProfile::TwoAxis, 0, 0);
                let second = if backend.device_count() > 1 {
                    stick(StickProfile::TwoAxis, 1, 1)
                } else {
                    BindGroup::Stick(StickBindGroup::dummy(1))
                };
                vec![first, second]
            }
            JoystickType::FourAxis => vec![
                stick(StickProfile::FourAxis, 0, 0),
                BindGroup::Stick(StickBindGroup::dummy(1)),
            ],
            JoystickType::FourAxisSecond => vec![
                stick(StickProfile::FourAxis, 1, 0),
                BindGroup::Stick(StickBindGroup::dummy(1)),
            ],
            JoystickType::Fcs => vec![
                stick(StickProfile::fcs(), 0, 0),
                BindGroup::Stick(StickBindGroup::dummy(1)),
            ],
            JoystickType::Ch => vec![
                stick(StickProfile::Ch, 0, 0),
                BindGroup::Stick(StickBindGroup::dummy(1)),
            ],
        };
        self.groups.extend(sticks);
    }

    pub fn joystick_type(&self) -> JoystickType {
        self.joystick_type
    }

    pub fn set_observer(&mut self, observer: BindObserver) {
        self.observer = Some(observer);
    }

    // ---- event registry ----

    /// Registers a new event. Deferred config lines naming it are replayed.
    pub fn register_event(&mut self, name: &str, kind: EventKind) -> Result<EventId, MappingError> {
        let key = name.to_ascii_lowercase();
        if self.names.contains_key(&key) {
            return Err(MappingError::DuplicateEvent(name.to_string()));
        }
        let id = EventId(self.events.len());
        self.events.push(Some(Event::new(key.clone(), kind)));
        self.names.insert(key.clone(), id);

        if let Some(lines) = self.pending.remove(&key) {
            debug!("Replaying {} deferred line(s) for {}", lines.len(), key);
            for line in lines {
                self.create_string_bind(&line);
            }
        }
        Ok(id)
    }

    /// Registers a joystick axis pair, each direction pointing at the other
    pub fn register_axis_pair(
        &mut self,
        stick: usize,
        axis: usize,
    ) -> Result<(EventId, EventId), MappingError> {
        use super::event::AxisTarget;
        let target = |positive| AxisTarget {
            stick,
            axis,
            positive,
            opposite: None,
        };
        let neg = self.register_event(
            &format!("jaxis_{stick}_{axis}-"),
            EventKind::JoystickAxis(target(false)),
        )?;
        let pos = self.register_event(
            &format!("jaxis_{stick}_{axis}+"),
            EventKind::JoystickAxis(AxisTarget {
                opposite: Some(neg),
                ..target(true)
            }),
        )?;
        if let Some(EventKind::JoystickAxis(t)) = self.event_mut(neg).map(|e| &mut e.kind) {
            t.opposite = Some(pos);
        }
        Ok((neg, pos))
    }

    /// Registers a mapper shortcut as event `hand_<name>`. A handler whose
    /// button name is already registered is not added twice.
    pub fn add_handler(
        &mut self,
        callback: impl FnMut(bool) + Send + 'static,
        default_key: Option<u32>,
        default_mods: Mods,
        name: &str,
        button_name: &str,
    ) -> Result<EventId, MappingError> {
        let existing = self.events.iter().enumerate().find_map(|(i, e)| match e {
            Some(Event {
                kind: EventKind::Handler(h),
                ..
            }) if h.button_name == button_name => Some(EventId(i)),
            _ => None,
        });
        if let Some(id) = existing {
            debug!("Handler {} already registered", button_name);
            return Ok(id);
        }

        let handler = Handler {
            callback: Box::new(callback),
            default_key,
            default_mods,
            button_name: button_name.to_string(),
        };
        let id = self.register_event(&format!("hand_{name}"), EventKind::Handler(handler))?;

        let has_binds = self.event(id).is_some_and(|e| !e.binds.is_empty());
        if self.defaults_applied && !has_binds {
            if let Some(line) = self.event(id).and_then(defaults::handler_default_line) {
                self.create_string_bind(&line);
            }
        }
        Ok(id)
    }

    /// Removes a handler event together with its binds
    pub fn remove_handler(&mut self, name: &str) -> bool {
        let Some(id) = self.event_id(&format!("hand_{name}")) else {
            return false;
        };
        let binds = self.event(id).map(|e| e.binds.clone()).unwrap_or_default();
        for bind in binds {
            self.delete_bind(bind);
        }
        if let Some(event) = self.events.get_mut(id.0).and_then(Option::take) {
            self.names.remove(event.name());
        }
        true
    }

    pub fn event_id(&self, name: &str) -> Option<EventId> {
        self.names.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(id.0).and_then(Option::as_ref)
    }

    pub fn event_by_name(&self, name: &str) -> Option<&Event> {
        self.event_id(name).and_then(|id| self.event(id))
    }

    pub(crate) fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Registered events in registration order
    pub fn events(&self) -> impl Iterator<Item = (EventId, &Event)> {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EventId(i), e)))
    }

    // ---- binds ----

    pub fn bind(&self, id: BindId) -> Option<&Bind> {
        self.binds
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.bind.as_ref())
    }

    pub(crate) fn bind_mut(&mut self, id: BindId) -> Option<&mut Bind> {
        self.binds
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.bind.as_mut())
    }

    /// Handles of every live bind
    pub fn bind_ids(&self) -> Vec<BindId> {
        self.binds
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.bind.is_some())
            .map(|(i, slot)| BindId::new(i, slot.generation))
            .collect()
    }

    /// Handle the next new bind gets: a free slot first, else a new one
    fn next_bind_id(&self) -> BindId {
        match self.free_binds.last() {
            Some(&index) => BindId::new(
                index,
                self.binds.get(index).map_or(0, |slot| slot.generation),
            ),
            None => BindId::new(self.binds.len(), 0),
        }
    }

    /// Empties a slot and retires its handle
    fn take_bind(&mut self, id: BindId) -> Option<Bind> {
        let slot = self
            .binds
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())?;
        let bind = slot.bind.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_binds.push(id.index());
        Some(bind)
    }

    pub fn groups(&self) -> &[BindGroup] {
        &self.groups
    }

    /// Attaches a new bind to `event` through the list of `group`
    pub fn add_bind(
        &mut self,
        event: EventId,
        group: GroupId,
        source: BindSource,
        mods: Mods,
        flags: BindFlags,
    ) -> Result<BindId, MappingError> {
        let event_name = self
            .event(event)
            .map(|e| e.name().to_string())
            .ok_or_else(|| MappingError::UnknownEvent(format!("#{}", event.0)))?;
        let is_handler = self
            .event(event)
            .is_some_and(|e| matches!(e.kind, EventKind::Handler(_)));
        if is_handler && !matches!(source, BindSource::Key { .. }) {
            return Err(MappingError::KeyboardOnly(event_name));
        }

        let id = self.next_bind_id();
        self.groups
            .get_mut(group)
            .ok_or_else(|| MappingError::InvalidBindSpec(format!("no bind group {group}")))?
            .insert(id, &source)?;
        let bind = Bind::new(source, group, event, mods, flags);
        match self.free_binds.pop().and_then(|index| self.binds.get_mut(index)) {
            Some(slot) => slot.bind = Some(bind),
            None => self.binds.push(BindSlot {
                generation: 0,
                bind: Some(bind),
            }),
        }
        if let Some(ev) = self.event_mut(event) {
            ev.binds.push(id);
        }
        Ok(id)
    }

    /// Removes a bind from its group list and from its event
    pub fn delete_bind(&mut self, id: BindId) -> bool {
        self.release_bind(id);
        let Some(bind) = self.take_bind(id) else {
            return false;
        };
        if let Some(group) = self.groups.get_mut(bind.group) {
            group.remove(id, &bind.source);
        }
        if let Some(event) = self.event_mut(bind.event) {
            event.binds.retain(|b| *b != id);
        }
        self.holdlist.retain(|b| *b != id);
        true
    }

    /// Drops every bind of every event
    pub fn clear_all_binds(&mut self) {
        self.release_all();
        for group in &mut self.groups {
            group.clear();
        }
        for event in self.events.iter_mut().flatten() {
            event.binds.clear();
        }
        for id in self.bind_ids() {
            self.take_bind(id);
        }
        self.holdlist.clear();
    }

    pub fn set_bind_mods(&mut self, id: BindId, mods: Mods) -> Result<(), MappingError> {
        self.bind_mut(id).ok_or(MappingError::UnknownBind)?.mods = mods;
        Ok(())
    }

    pub fn set_bind_flags(&mut self, id: BindId, flags: BindFlags) -> Result<(), MappingError> {
        self.bind_mut(id).ok_or(MappingError::UnknownBind)?.flags = flags;
        Ok(())
    }

    /// Binds the first group that recognizes `raw` to `event`
    pub fn capture_bind(&mut self, event: EventId, raw: RawInput) -> Option<BindId> {
        let (group, source) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(i, g)| g.capture(&raw).map(|s| (i, s)))?;
        match self.add_bind(event, group, source, Mods::empty(), BindFlags::empty()) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Cannot bind {:?}: {}", raw, e);
                None
            }
        }
    }

    /// Human readable description of a bind
    pub fn bind_name(&self, id: BindId) -> Option<String> {
        let bind = self.bind(id)?;
        Some(self.groups.get(bind.group)?.bind_name(bind))
    }

    pub fn bind_spec(&self, id: BindId) -> Option<String> {
        let bind = self.bind(id)?;
        Some(bind.config_spec(self.groups.get(bind.group)?.config_prefix()))
    }

    /// Binds latched by the hold flag
    pub fn held_binds(&self) -> &[BindId] {
        &self.holdlist
    }

    pub fn modifiers(&self) -> Mods {
        self.mods
    }

    pub fn virtual_joysticks(&self) -> &VirtualJoystickState {
        &self.vjoy
    }

    // ---- text format ----

    /// Parses one bind file line. Unknown events are deferred until registered.
    pub fn create_string_bind(&mut self, line: &str) {
        let words = split_config_words(line);
        let Some((name, specs)) = words.split_first() else {
            return;
        };
        if name.starts_with('#') {
            return;
        }
        let Some(event) = self.event_id(name) else {
            debug!("Deferring binds for unknown event {}", name);
            self.pending
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(line.to_string());
            return;
        };
        for spec in specs {
            if let Err(e) = self.create_spec_bind(event, spec) {
                warn!("Skipping bind \"{}\" of {}: {}", spec, name, e);
            }
        }
    }

    fn create_spec_bind(&mut self, event: EventId, spec: &str) -> Result<BindId, MappingError> {
        let mut words = spec.split_whitespace();
        let prefix = words
            .next()
            .ok_or_else(|| MappingError::InvalidBindSpec("empty bind".into()))?;
        let group = self
            .groups
            .iter()
            .position(|g| g.config_prefix().eq_ignore_ascii_case(prefix))
            .ok_or_else(|| MappingError::InvalidBindSpec(format!("no bind group for '{prefix}'")))?;
        let source = self.groups[group].parse_source(&mut words)?;
        let (mods, flags) = parse_options(words);
        self.add_bind(event, group, source, mods, flags)
    }

    /// Loads a whole bind file
    pub fn load_binds(&mut self, text: &str) {
        for line in text.lines() {
            self.create_string_bind(line);
        }
        self.defaults_applied = true;
    }

    /// Bind file text: one line per event, then still deferred lines
    pub fn save_binds(&self) -> String {
        let mut out = String::new();
        for (_, event) in self.events() {
            out.push_str(event.name());
            for bind in event.binds() {
                if let Some(spec) = self.bind_spec(*bind) {
                    out.push_str(&format!(" \"{spec}\""));
                }
            }
            out.push('\n');
        }
        let mut deferred: Vec<_> = self.pending.iter().collect();
        deferred.sort_by(|a, b| a.0.cmp(b.0));
        for (_, lines) in deferred {
            for line in lines {
                out.push_str(line.trim());
                out.push('\n');
            }
        }
        out
    }

    /// Applies the built-in bind set
    pub fn create_default_binds(&mut self) {
        for line in defaults::default_bind_lines(self) {
            self.create_string_bind(&line);
        }
        self.defaults_applied = true;
    }

    pub(crate) fn lock_key_events(&self) -> [Option<EventId>; 2] {
        let find = |key: KbdKey| {
            KEY_TABLE
                .iter()
                .find(|k| k.key == key)
                .and_then(|k| self.event_id(&super::keyboard::key_event_name(k.entry)))
        };
        [find(KbdKey::CapsLock), find(KbdKey::NumLock)]
    }
}

/// Splits a line into words, keeping `"quoted words"` together
pub(crate) fn split_config_words(line: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            words.push(&quoted[..end]);
            rest = quoted.get(end + 1..).unwrap_or_default();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            words.push(&rest[..end]);
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RecordingPorts;

    fn context() -> (InputMapperContext, RecordingPorts) {
        let rec = RecordingPorts::new();
        let ctx = InputMapperContext::new(rec.ports(), HostKeyAlternate::None);
        (ctx, rec)
    }

    #[test]
    fn splits_quoted_words() {
        assert_eq!(
            split_config_words(r#"key_a "key 97" "key 98 mod1"  "#),
            vec!["key_a", "key 97", "key 98 mod1"]
        );
        assert_eq!(split_config_words(r#"x "unterminated"#), vec!["x", "unterminated"]);
        assert!(split_config_words("   ").is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected_case_insensitively() {
        let (mut ctx, _) = context();
        ctx.register_event("key_a", EventKind::Key(KbdKey::A)).unwrap();
        assert!(matches!(
            ctx.register_event("KEY_A", EventKind::Key(KbdKey::A)),
            Err(MappingError::DuplicateEvent(_))
        ));
    }

    #[test]
    fn deferred_lines_are_replayed_on_registration() {
        let (mut ctx, _) = context();
        ctx.create_string_bind(r#"key_b "key 98""#);
        assert!(ctx.save_binds().contains(r#"key_b "key 98""#));

        let id = ctx.register_event("key_b", EventKind::Key(KbdKey::B)).unwrap();
        assert_eq!(ctx.event(id).unwrap().binds().len(), 1);
        assert_eq!(ctx.save_binds(), "key_b \"key 98\"\n");
    }

    #[test]
    fn bad_specs_are_skipped() {
        let (mut ctx, _) = context();
        let id = ctx.register_event("key_c", EventKind::Key(KbdKey::C)).unwrap();
        ctx.create_string_bind(r#"key_c "key x" "stick_0 button 1" "key 99 hold""#);
        let binds = ctx.event(id).unwrap().binds().to_vec();
        assert_eq!(binds.len(), 1);
        assert_eq!(ctx.bind(binds[0]).unwrap().flags(), BindFlags::HOLD);
    }

    #[test]
    fn handlers_accept_only_keys_and_dedupe() {
        let (mut ctx, _) = context();
        ctx.create_stick_groups(
            &Settings {
                joystick: crate::config::JoystickSettings {
                    joysticktype: JoystickType::TwoAxis,
                    ..Default::default()
                },
                ..Default::default()
            },
            &crate::controller::backend::NoJoysticks,
        );
        let id = ctx
            .add_handler(|_| {}, None, Mods::empty(), "shot", "Screenshot")
            .unwrap();
        let again = ctx
            .add_handler(|_| {}, None, Mods::empty(), "other", "Screenshot")
            .unwrap();
        assert_eq!(id, again);
        assert!(ctx.event_id("hand_other").is_none());
        assert!(matches!(
            ctx.add_bind(id, 1, BindSource::JoyButton { button: 0 }, Mods::empty(), BindFlags::empty()),
            Err(MappingError::KeyboardOnly(_))
        ));
    }

    #[test]
    fn remove_handler_drops_event_and_binds() {
        let (mut ctx, _) = context();
        let id = ctx
            .add_handler(|_| {}, None, Mods::empty(), "pause", "Pause")
            .unwrap();
        ctx.create_string_bind(r#"hand_pause "key 19 mod2""#);
        assert_eq!(ctx.event(id).unwrap().binds().len(), 1);
        assert!(ctx.remove_handler("pause"));
        assert!(ctx.event(id).is_none());
        assert!(ctx.groups()[0].as_keyboard().unwrap().list(19).is_empty());
        assert!(!ctx.remove_handler("pause"));
    }

    #[test]
    fn delete_bind_leaves_event() {
        let (mut ctx, _) = context();
        let ev = ctx.register_event("key_d", EventKind::Key(KbdKey::D)).unwrap();
        let bind = ctx
            .add_bind(ev, 0, BindSource::Key { code: 100 }, Mods::empty(), BindFlags::empty())
            .unwrap();
        assert!(ctx.delete_bind(bind));
        assert!(ctx.event(ev).unwrap().binds().is_empty());
        assert!(ctx.groups()[0].as_keyboard().unwrap().list(100).is_empty());
        assert!(!ctx.delete_bind(bind));
    }

    #[test]
    fn capture_creates_key_binds() {
        let (mut ctx, _) = context();
        let ev = ctx.register_event("key_e", EventKind::Key(KbdKey::E)).unwrap();
        let bind = ctx.capture_bind(ev, RawInput::KeyDown { code: 101 }).unwrap();
        assert_eq!(ctx.bind_spec(bind).unwrap(), "key 101");
        assert_eq!(ctx.bind_name(bind).unwrap(), "Key e");
        assert!(ctx
            .capture_bind(ev, RawInput::JoyButton { device: 0, button: 0 })
            .is_none());
    }

    #[test]
    fn stale_bind_handles_stay_dead() {
        let (mut ctx, _) = context();
        let ev = ctx.register_event("key_f", EventKind::Key(KbdKey::F)).unwrap();
        let key = |code| BindSource::Key { code };

        let first = ctx
            .add_bind(ev, 0, key(102), Mods::empty(), BindFlags::empty())
            .unwrap();
        assert!(ctx.delete_bind(first));
        let second = ctx
            .add_bind(ev, 0, key(103), Mods::empty(), BindFlags::empty())
            .unwrap();
        assert_eq!(second.index(), first.index());
        assert!(ctx.bind(first).is_none());
        assert!(!ctx.delete_bind(first));
        assert_eq!(ctx.bind_spec(second).unwrap(), "key 103");

        ctx.clear_all_binds();
        let third = ctx
            .add_bind(ev, 0, key(104), Mods::empty(), BindFlags::empty())
            .unwrap();
        assert!(ctx.bind(second).is_none());
        assert!(ctx.set_bind_mods(second, Mods::MOD1).is_err());
        assert_eq!(ctx.bind_ids(), vec![third]);
        assert_eq!(ctx.event(ev).unwrap().binds(), &[third]);
    }
}
