//! Input binding and dispatch for an emulated PC
//!
//! Physical keys and joysticks are bound to named emulator events. Events
//! drive the emulated keyboard, mouse buttons, the modifier mask, mapper
//! shortcuts and a virtual joystick buffer that is reshaped into gameport
//! output by one of four hardware profiles.

pub mod config;
pub mod controller;
pub mod mapping;
pub mod ports;
pub mod typer;
