use input_mapper::config::{JoystickSettings, JoystickType, Settings};
use input_mapper::controller::backend::{NoJoysticks, ScriptedJoysticks};
use input_mapper::mapping::keyboard::code;
use input_mapper::mapping::{InputMapperContext, RawInput};
use input_mapper::ports::RecordingPorts;
use rstest::rstest;

fn settings(joysticktype: JoystickType) -> Settings {
    Settings {
        joystick: JoystickSettings {
            joysticktype,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn pad() -> ScriptedJoysticks {
    ScriptedJoysticks::new().with_device("pad", 4, 6, 2)
}

#[test]
fn physical_stick_drives_gameport_through_default_binds() {
    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::FourAxis), &backend, None)
            .unwrap();

    backend.set_button(0, 0, true);
    backend.set_axis(0, 0, i16::MAX);
    ctx.update_joysticks(&mut backend);
    assert_eq!(rec.stick(0).buttons, [true, false]);
    assert!(rec.stick(0).x > 0.99);
    assert!(ctx.event_by_name("jbutton_0_0").unwrap().is_active());

    backend.set_button(0, 0, false);
    backend.set_axis(0, 0, 0);
    ctx.update_joysticks(&mut backend);
    assert_eq!(rec.stick(0).buttons, [false, false]);
    assert_eq!(rec.stick(0).x, 0.0);
    assert!(!ctx.event_by_name("jaxis_0_0+").unwrap().is_active());
}

#[test]
fn small_deflection_stays_in_deadzone() {
    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::FourAxis), &backend, None)
            .unwrap();
    backend.set_axis(0, 1, 2000);
    ctx.update_joysticks(&mut backend);
    assert_eq!(ctx.virtual_joysticks().axis(0, 1), 0);
    assert_eq!(rec.stick(0).y, 0.0);
}

#[test]
fn axis_bound_to_button_uses_axis_deadzone() {
    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut ctx = InputMapperContext::startup(
        rec.ports(),
        &settings(JoystickType::FourAxis),
        &backend,
        Some(r#"jbutton_0_1 "stick_0 axis 2 1""#),
    )
    .unwrap();

    backend.set_axis(0, 2, i16::MAX / 2);
    ctx.update_joysticks(&mut backend);
    assert!(!ctx.event_by_name("jbutton_0_1").unwrap().is_active());

    backend.set_axis(0, 2, i16::MAX);
    ctx.update_joysticks(&mut backend);
    assert!(ctx.event_by_name("jbutton_0_1").unwrap().is_active());
    assert_eq!(rec.stick(0).buttons, [false, true]);

    backend.set_axis(0, 2, 0);
    ctx.update_joysticks(&mut backend);
    assert!(!ctx.event_by_name("jbutton_0_1").unwrap().is_active());
}

#[test]
fn ch_profile_resolves_lowest_priority() {
    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::Ch), &backend, None)
            .unwrap();

    backend.set_button(0, 0, true);
    ctx.update_joysticks(&mut backend);
    // priority 7
    assert_eq!(rec.stick(0).buttons, [true, false]);
    assert_eq!(rec.stick(1).buttons, [false, false]);

    backend.set_button(0, 4, true);
    ctx.update_joysticks(&mut backend);
    // priority 5 beats 7
    assert_eq!(rec.stick(0).buttons, [true, false]);
    assert_eq!(rec.stick(1).buttons, [true, false]);
}

#[test]
fn missing_device_still_emits_keyboard_driven_output() {
    let rec = RecordingPorts::new();
    let mut ctx = InputMapperContext::startup(
        rec.ports(),
        &settings(JoystickType::FourAxis),
        &NoJoysticks,
        Some(r#"jbutton_0_0 "key 32""#),
    )
    .unwrap();
    assert!(!ctx.groups()[1].as_stick().unwrap().is_connected());

    ctx.handle_key(code::SPACE, true);
    ctx.update_joysticks(&mut NoJoysticks);
    assert_eq!(rec.stick(0).buttons, [true, false]);
    assert!(rec.stick(0).enabled);
}

#[test]
fn auto_type_follows_connected_devices() {
    let rec = RecordingPorts::new();
    let two = ScriptedJoysticks::new()
        .with_device("left", 2, 2, 0)
        .with_device("right", 2, 2, 0);
    let ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::Auto), &two, None).unwrap();
    assert_eq!(ctx.joystick_type(), JoystickType::TwoAxis);
    assert!(ctx.groups()[2].as_stick().unwrap().is_connected());

    let ctx = InputMapperContext::startup(rec.ports(), &settings(JoystickType::Auto), &NoJoysticks, None)
        .unwrap();
    assert_eq!(ctx.joystick_type(), JoystickType::None);
    assert_eq!(ctx.groups().len(), 1);
}

#[test]
fn dummy_slot_keeps_its_binds() {
    let rec = RecordingPorts::new();
    let ctx = InputMapperContext::startup(
        rec.ports(),
        &settings(JoystickType::FourAxis),
        &pad(),
        Some(r#"jbutton_1_0 "stick_1 button 1""#),
    )
    .unwrap();
    assert!(ctx.groups()[2].as_stick().unwrap().is_dummy());
    assert!(ctx
        .save_binds()
        .contains("jbutton_1_0 \"stick_1 button 1\"\n"));
}

#[test]
fn capture_wraps_buttons_and_names_them() {
    let rec = RecordingPorts::new();
    let mut ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::FourAxis), &pad(), Some(""))
            .unwrap();
    let event = ctx.event_id("jbutton_0_2").unwrap();

    let bind = ctx
        .capture_bind(event, RawInput::JoyButton { device: 0, button: 8 })
        .unwrap();
    assert_eq!(ctx.bind_spec(bind).unwrap(), "stick_0 button 2");
    assert_eq!(ctx.bind_name(bind).unwrap(), "pad Button 2");

    let hat = ctx
        .capture_bind(event, RawInput::JoyHat { device: 0, hat: 0, value: 2 })
        .unwrap();
    assert_eq!(ctx.bind_spec(hat).unwrap(), "stick_0 hat 0 2");
    assert!(ctx
        .capture_bind(event, RawInput::JoyAxis { device: 0, axis: 1, value: 1000 })
        .is_none());
}

#[test]
fn deleting_a_deflected_stick_bind_centres_the_axis() {
    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut ctx =
        InputMapperContext::startup(rec.ports(), &settings(JoystickType::FourAxis), &backend, None)
            .unwrap();
    backend.set_axis(0, 0, i16::MAX);
    ctx.update_joysticks(&mut backend);
    assert!(ctx.virtual_joysticks().axis(0, 0) > 32000);

    let bind = ctx.event_by_name("jaxis_0_0+").unwrap().binds()[0];
    assert!(ctx.delete_bind(bind));
    assert_eq!(ctx.virtual_joysticks().axis(0, 0), 0);
    assert!(!ctx.event_by_name("jaxis_0_0+").unwrap().is_active());
}

const MOD_KEYS: &str = "mod_1 \"key 306\"\n\
                        mod_2 \"key 308\"\n\
                        mod_3 \"key 304\"\n\
                        mod_host \"key 19\"\n";

#[derive(Clone, Copy, Debug)]
enum Drive {
    Button(usize),
    Axis(usize, i16),
    Hat(usize, u8),
}

fn first_button(_: &InputMapperContext, rec: &RecordingPorts) -> bool {
    rec.stick(0).buttons[0]
}

fn second_button(_: &InputMapperContext, rec: &RecordingPorts) -> bool {
    rec.stick(0).buttons[1]
}

fn stick_down(_: &InputMapperContext, rec: &RecordingPorts) -> bool {
    rec.stick(0).y > 0.99
}

fn hat_down(ctx: &InputMapperContext, _: &RecordingPorts) -> bool {
    ctx.virtual_joysticks().hat(0, 0, 2)
}

#[rstest]
#[case("jbutton_0_0 \"stick_0 button 3\"", &[], Drive::Button(3), first_button)]
#[case("jaxis_0_1+ \"stick_0 axis 1 1 mod1\"", &[code::LCTRL], Drive::Axis(1, i16::MAX), stick_down)]
#[case("jhat_0_0_2 \"stick_0 hat 0 4 mod3 hold\"", &[code::LSHIFT], Drive::Hat(0, 4), hat_down)]
#[case(
    "jbutton_0_1 \"stick_0 axis 2 0 mod2 host\"",
    &[code::LALT, 19],
    Drive::Axis(2, i16::MIN),
    second_button
)]
fn stick_binds_survive_save_and_load(
    #[case] line: &str,
    #[case] held: &[u32],
    #[case] drive: Drive,
    #[case] output: fn(&InputMapperContext, &RecordingPorts) -> bool,
) {
    let text = format!("{MOD_KEYS}{line}\n");
    let backend = pad();
    let first = InputMapperContext::startup(
        RecordingPorts::new().ports(),
        &settings(JoystickType::Fcs),
        &backend,
        Some(&text),
    )
    .unwrap();
    let saved = first.save_binds();
    assert!(saved.contains(&format!("{line}\n")), "{line} missing from:\n{saved}");

    let mut backend = pad();
    let rec = RecordingPorts::new();
    let mut second = InputMapperContext::startup(
        rec.ports(),
        &settings(JoystickType::Fcs),
        &backend,
        Some(&saved),
    )
    .unwrap();
    assert_eq!(second.save_binds(), saved);

    match drive {
        Drive::Button(button) => backend.set_button(0, button, true),
        Drive::Axis(axis, value) => backend.set_axis(0, axis, value),
        Drive::Hat(hat, value) => backend.set_hat(0, hat, value),
    }
    // the modifiers are still up
    second.update_joysticks(&mut backend);
    assert_eq!(output(&second, &rec), held.is_empty());

    for code in held {
        second.handle_key(*code, true);
    }
    // stick inputs only fire on a change
    second.update_joysticks(&mut pad());
    second.update_joysticks(&mut backend);
    assert!(output(&second, &rec));
}
