//! Input binding and dispatch
//!
//! ```text
//!  raw key / joystick sample
//!            │
//!            ▼
//!  ┌──────────────────┐   list of BindIds for that physical code
//!  │    BindGroup     │─────────────────────────────┐
//!  └──────────────────┘                             ▼
//!                                      ┌──────────────────────────┐
//!                                      │ activate_bind_list       │ modifier tie-break
//!                                      │ deactivate_bind_list     │ host chord
//!                                      └────────────┬─────────────┘
//!                                                   ▼
//!                                        Bind activate/deactivate    hold latch
//!                                                   ▼
//!                                        Event activate/deactivate   trigger or continuous
//!                                                   ▼
//!                                        Event::Active effect ──> ports, modifier mask,
//!                                                                 virtual joystick, handlers
//! ```
//!
//! Events and binds live in arenas inside [`InputMapperContext`] and refer
//! to each other through [`EventId`] and [`BindId`] handles.

pub mod bind;
pub mod bind_group;
pub mod context;
pub mod defaults;
mod dispatch;
pub mod error;
pub mod event;
pub mod keyboard;

use bitflags::bitflags;

pub use bind::{Bind, BindId, BindSource, HatDirection};
pub use bind_group::{BindGroup, GroupId, StickBindGroup, StickProfile};
pub use context::{InputMapperContext, RawInput};
pub use error::MappingError;
pub use event::{AxisTarget, Event, EventId, EventKind, Handler};
pub use keyboard::KbdKey;

/// Values above this count as "pressed" for trigger events
pub const TRIGGER_THRESHOLD: i32 = 25000;

/// Full deflection on the signed 16-bit scale
pub const MAX_VALUE: i32 = 32767;

/// Saturation point of a trigger event's activity counter
pub const MAX_ACTIVITY: u32 = 32767;

bitflags! {
    /// Modifier mask of a bind and of the currently held modifiers
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Mods: u8 {
        const MOD1 = 0x01;
        const MOD2 = 0x02;
        const MOD3 = 0x04;
        const HOST = 0x08;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BindFlags: u8 {
        /// Sticky bind: released on the second physical release
        const HOLD = 0x01;
        /// Hold set by the host alternate chord, cleared on release
        const HOLD_TEMPORARY = 0x02;
    }
}
