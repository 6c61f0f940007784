//! Joystick side of the mapper
//!
//! ```text
//! JoystickBackend ──► StickBindGroup::poll ──► binds / events
//!   (gilrs)             normalize                   │
//!                                                   ▼
//! JoystickPort ◄── profiles::update_outputs ◄── VirtualJoystickState
//! ```
//!
//! [`backend`] abstracts physical devices, [`normalize`] applies deadzone
//! and response curves, [`profiles`] turns the virtual joystick buffer into
//! 2-axis, 4-axis, FCS or CH gameport output.

pub mod backend;
pub mod gilrs_backend;
pub mod normalize;
pub mod profiles;
pub mod virtual_joystick;
