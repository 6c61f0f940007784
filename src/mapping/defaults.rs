//! The standard event layout and its built-in binds

use super::bind::{format_options, HatDirection};
use super::context::InputMapperContext;
use super::error::MappingError;
use super::event::{Event, EventKind};
use super::keyboard::{code, key_event_name, KEY_TABLE};
use super::{BindFlags, Mods};
use crate::ports::MouseButton;

/// Buttons of each emulated stick that get events
const STICK_BUTTONS: [usize; 2] = [6, 2];
/// Axes of each emulated stick that get events
const STICK_AXES: [usize; 2] = [4, 2];
/// Hats of each emulated stick that get events
const STICK_HATS: [usize; 2] = [1, 0];

const MODIFIERS: [(&str, Mods, [u32; 2]); 3] = [
    ("mod_1", Mods::MOD1, [code::LCTRL, code::RCTRL]),
    ("mod_2", Mods::MOD2, [code::LALT, code::RALT]),
    ("mod_3", Mods::MOD3, [code::LSHIFT, code::RSHIFT]),
];

/// Registers every key, modifier, mouse and joystick event
pub fn register_standard_events(ctx: &mut InputMapperContext) -> Result<(), MappingError> {
    for key in KEY_TABLE {
        ctx.register_event(&key_event_name(key.entry), EventKind::Key(key.key))?;
    }
    for (name, bits, _) in MODIFIERS {
        ctx.register_event(name, EventKind::Modifier(bits))?;
    }
    ctx.register_event("mod_host", EventKind::Modifier(Mods::HOST))?;

    for (name, button) in [
        ("mbutton_left", MouseButton::Left),
        ("mbutton_middle", MouseButton::Middle),
        ("mbutton_right", MouseButton::Right),
    ] {
        ctx.register_event(name, EventKind::MouseButton(button))?;
    }

    for stick in 0..2 {
        for axis in 0..STICK_AXES[stick] {
            ctx.register_axis_pair(stick, axis)?;
        }
        for button in 0..STICK_BUTTONS[stick] {
            ctx.register_event(
                &format!("jbutton_{stick}_{button}"),
                EventKind::JoystickButton { stick, button },
            )?;
        }
        for hat in 0..STICK_HATS[stick] {
            for dir in HatDirection::ALL {
                ctx.register_event(
                    &format!("jhat_{stick}_{hat}_{}", dir.index()),
                    EventKind::JoystickHat {
                        stick,
                        hat,
                        dir: dir.index(),
                    },
                )?;
            }
        }
    }
    Ok(())
}

/// Default bind line of a handler event, if it has a default key
pub fn handler_default_line(event: &Event) -> Option<String> {
    let EventKind::Handler(handler) = event.kind() else {
        return None;
    };
    let key = handler.default_key?;
    Some(format!(
        "{} \"key {}{}\"",
        event.name(),
        key,
        format_options(handler.default_mods, BindFlags::empty())
    ))
}

/// Bind file lines of the built-in layout for the current bind groups
pub fn default_bind_lines(ctx: &InputMapperContext) -> Vec<String> {
    let mut lines: Vec<String> = KEY_TABLE
        .iter()
        .map(|key| format!("{} \"key {}\"", key_event_name(key.entry), key.default_code))
        .collect();

    for (name, _, [left, right]) in MODIFIERS {
        lines.push(format!("{name} \"key {left}\" \"key {right}\""));
    }

    lines.extend(
        ctx.events()
            .filter_map(|(_, event)| handler_default_line(event)),
    );

    for group in ctx.groups() {
        let Some(stick) = group.as_stick() else {
            continue;
        };
        let emustick = stick.emustick;
        if emustick >= STICK_AXES.len() {
            continue;
        }
        let prefix = stick.prefix();

        for button in 0..STICK_BUTTONS[emustick].min(stick.button_wrap) {
            lines.push(format!("jbutton_{emustick}_{button} \"{prefix} button {button}\""));
        }
        for axis in 0..STICK_AXES[emustick].min(stick.emulated_axes) {
            lines.push(format!("jaxis_{emustick}_{axis}- \"{prefix} axis {axis} 0\""));
            lines.push(format!("jaxis_{emustick}_{axis}+ \"{prefix} axis {axis} 1\""));
        }
        for hat in 0..STICK_HATS[emustick] {
            for dir in HatDirection::ALL {
                lines.push(format!(
                    "jhat_{emustick}_{hat}_{} \"{prefix} hat {hat} {}\"",
                    dir.index(),
                    dir.bit()
                ));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostKeyAlternate, JoystickSettings, JoystickType, Settings};
    use crate::controller::backend::ScriptedJoysticks;
    use crate::mapping::bind_group::BindGroup;
    use crate::ports::RecordingPorts;

    fn settings(joysticktype: JoystickType) -> Settings {
        Settings {
            joystick: JoystickSettings {
                joysticktype,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn layout_registers_every_family() {
        let rec = RecordingPorts::new();
        let mut ctx = InputMapperContext::new(rec.ports(), HostKeyAlternate::None);
        register_standard_events(&mut ctx).unwrap();
        for name in [
            "key_esc",
            "key_lessthan",
            "mod_host",
            "mbutton_middle",
            "jaxis_0_3+",
            "jaxis_1_1-",
            "jbutton_0_5",
            "jbutton_1_1",
            "jhat_0_0_3",
        ] {
            assert!(ctx.event_id(name).is_some(), "{name} missing");
        }
        assert!(ctx.event_id("jbutton_1_2").is_none());
        assert!(ctx.event_id("jhat_1_0_0").is_none());
        assert!(matches!(
            register_standard_events(&mut ctx),
            Err(MappingError::DuplicateEvent(_))
        ));
    }

    #[test]
    fn handler_line_carries_mods() {
        let rec = RecordingPorts::new();
        let mut ctx = InputMapperContext::new(rec.ports(), HostKeyAlternate::None);
        let id = ctx
            .add_handler(|_| {}, Some(code::F1 + 9), Mods::MOD1 | Mods::HOST, "capmouse", "Cap Mouse")
            .unwrap();
        assert_eq!(
            handler_default_line(ctx.event(id).unwrap()).as_deref(),
            Some("hand_capmouse \"key 291 mod1 host\"")
        );
        let plain = ctx
            .add_handler(|_| {}, None, Mods::empty(), "noop", "Nothing")
            .unwrap();
        assert_eq!(handler_default_line(ctx.event(plain).unwrap()), None);
    }

    #[test]
    fn stick_defaults_follow_groups() {
        let backend = ScriptedJoysticks::new().with_device("pad", 6, 13, 1);
        let rec = RecordingPorts::new();
        let ctx =
            InputMapperContext::startup(rec.ports(), &settings(JoystickType::FourAxis), &backend, None)
                .unwrap();
        let lines = default_bind_lines(&ctx);
        assert!(lines.contains(&"jbutton_0_5 \"stick_0 button 5\"".to_string()));
        assert!(lines.contains(&"jaxis_0_3+ \"stick_0 axis 3 1\"".to_string()));
        assert!(lines.contains(&"jhat_0_0_2 \"stick_0 hat 0 4\"".to_string()));
        assert!(lines.contains(&"jbutton_1_1 \"stick_1 button 1\"".to_string()));
        assert!(lines.contains(&"mod_3 \"key 304\" \"key 303\"".to_string()));

        let bound = ctx.event_by_name("jaxis_0_3+").unwrap();
        assert_eq!(bound.binds().len(), 1);
    }

    #[test]
    fn keyboard_only_without_sticks() {
        let rec = RecordingPorts::new();
        let ctx = InputMapperContext::startup(
            rec.ports(),
            &settings(JoystickType::None),
            &crate::controller::backend::NoJoysticks,
            None,
        )
        .unwrap();
        let lines = default_bind_lines(&ctx);
        assert!(lines.iter().all(|l| !l.contains("stick_")));
        assert!(ctx.groups().iter().all(|g| matches!(g, BindGroup::Keyboard(_))));
        assert_eq!(ctx.event_by_name("key_a").unwrap().binds().len(), 1);
    }
}
