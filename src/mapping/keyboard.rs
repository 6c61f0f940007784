//! Emulated keyboard keys and their default host key codes
//!
//! Host key codes follow the classic SDL keysym numbering, which is also
//! what bind files store after `key`.

macro_rules! key_table {
    ($( $variant:ident => $entry:literal, $code:expr; )*) => {
        /// Key of the emulated keyboard, handed to [`crate::ports::KeyboardPort`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum KbdKey {
            $($variant,)*
        }

        /// Every emulated key with its event suffix and default host code.
        pub const KEY_TABLE: &[KeyEntry] = &[
            $(KeyEntry { key: KbdKey::$variant, entry: $entry, default_code: $code },)*
        ];
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEntry {
    pub key: KbdKey,
    /// Suffix of the `key_<entry>` event name
    pub entry: &'static str,
    pub default_code: u32,
}

/// Host key codes used by default binds and handler shortcuts
pub mod code {
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const RETURN: u32 = 13;
    pub const PAUSE: u32 = 19;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const QUOTE: u32 = 39;
    pub const COMMA: u32 = 44;
    pub const MINUS: u32 = 45;
    pub const PERIOD: u32 = 46;
    pub const SLASH: u32 = 47;
    pub const NUM_0: u32 = 48;
    pub const SEMICOLON: u32 = 59;
    pub const LESS: u32 = 60;
    pub const EQUALS: u32 = 61;
    pub const LEFTBRACKET: u32 = 91;
    pub const BACKSLASH: u32 = 92;
    pub const RIGHTBRACKET: u32 = 93;
    pub const BACKQUOTE: u32 = 96;
    pub const LETTER_A: u32 = 97;
    pub const DELETE: u32 = 127;
    pub const KP_0: u32 = 256;
    pub const KP_PERIOD: u32 = 266;
    pub const KP_DIVIDE: u32 = 267;
    pub const KP_MULTIPLY: u32 = 268;
    pub const KP_MINUS: u32 = 269;
    pub const KP_PLUS: u32 = 270;
    pub const KP_ENTER: u32 = 271;
    pub const UP: u32 = 273;
    pub const DOWN: u32 = 274;
    pub const RIGHT: u32 = 275;
    pub const LEFT: u32 = 276;
    pub const INSERT: u32 = 277;
    pub const HOME: u32 = 278;
    pub const END: u32 = 279;
    pub const PAGEUP: u32 = 280;
    pub const PAGEDOWN: u32 = 281;
    pub const F1: u32 = 282;
    pub const NUMLOCK: u32 = 300;
    pub const CAPSLOCK: u32 = 301;
    pub const SCROLLOCK: u32 = 302;
    pub const RSHIFT: u32 = 303;
    pub const LSHIFT: u32 = 304;
    pub const RCTRL: u32 = 305;
    pub const LCTRL: u32 = 306;
    pub const RALT: u32 = 307;
    pub const LALT: u32 = 308;
    pub const PRINT: u32 = 316;
}

key_table! {
    F1 => "f1", code::F1;
    F2 => "f2", code::F1 + 1;
    F3 => "f3", code::F1 + 2;
    F4 => "f4", code::F1 + 3;
    F5 => "f5", code::F1 + 4;
    F6 => "f6", code::F1 + 5;
    F7 => "f7", code::F1 + 6;
    F8 => "f8", code::F1 + 7;
    F9 => "f9", code::F1 + 8;
    F10 => "f10", code::F1 + 9;
    F11 => "f11", code::F1 + 10;
    F12 => "f12", code::F1 + 11;
    Num1 => "1", code::NUM_0 + 1;
    Num2 => "2", code::NUM_0 + 2;
    Num3 => "3", code::NUM_0 + 3;
    Num4 => "4", code::NUM_0 + 4;
    Num5 => "5", code::NUM_0 + 5;
    Num6 => "6", code::NUM_0 + 6;
    Num7 => "7", code::NUM_0 + 7;
    Num8 => "8", code::NUM_0 + 8;
    Num9 => "9", code::NUM_0 + 9;
    Num0 => "0", code::NUM_0;
    A => "a", code::LETTER_A;
    B => "b", code::LETTER_A + 1;
    C => "c", code::LETTER_A + 2;
    D => "d", code::LETTER_A + 3;
    E => "e", code::LETTER_A + 4;
    F => "f", code::LETTER_A + 5;
    G => "g", code::LETTER_A + 6;
    H => "h", code::LETTER_A + 7;
    I => "i", code::LETTER_A + 8;
    J => "j", code::LETTER_A + 9;
    K => "k", code::LETTER_A + 10;
    L => "l", code::LETTER_A + 11;
    M => "m", code::LETTER_A + 12;
    N => "n", code::LETTER_A + 13;
    O => "o", code::LETTER_A + 14;
    P => "p", code::LETTER_A + 15;
    Q => "q", code::LETTER_A + 16;
    R => "r", code::LETTER_A + 17;
    S => "s", code::LETTER_A + 18;
    T => "t", code::LETTER_A + 19;
    U => "u", code::LETTER_A + 20;
    V => "v", code::LETTER_A + 21;
    W => "w", code::LETTER_A + 22;
    X => "x", code::LETTER_A + 23;
    Y => "y", code::LETTER_A + 24;
    Z => "z", code::LETTER_A + 25;
    Space => "space", code::SPACE;
    Esc => "esc", code::ESCAPE;
    Equals => "equals", code::EQUALS;
    Grave => "grave", code::BACKQUOTE;
    Tab => "tab", code::TAB;
    Enter => "enter", code::RETURN;
    Backspace => "bspace", code::BACKSPACE;
    LeftBracket => "lbracket", code::LEFTBRACKET;
    RightBracket => "rbracket", code::RIGHTBRACKET;
    Minus => "minus", code::MINUS;
    CapsLock => "capslock", code::CAPSLOCK;
    Semicolon => "semicolon", code::SEMICOLON;
    Quote => "quote", code::QUOTE;
    Backslash => "backslash", code::BACKSLASH;
    LeftShift => "lshift", code::LSHIFT;
    RightShift => "rshift", code::RSHIFT;
    LeftAlt => "lalt", code::LALT;
    RightAlt => "ralt", code::RALT;
    LeftCtrl => "lctrl", code::LCTRL;
    RightCtrl => "rctrl", code::RCTRL;
    Comma => "comma", code::COMMA;
    Period => "period", code::PERIOD;
    Slash => "slash", code::SLASH;
    PrintScreen => "printscreen", code::PRINT;
    ScrollLock => "scrolllock", code::SCROLLOCK;
    Pause => "pause", code::PAUSE;
    PageDown => "pagedown", code::PAGEDOWN;
    PageUp => "pageup", code::PAGEUP;
    Insert => "insert", code::INSERT;
    Home => "home", code::HOME;
    Delete => "delete", code::DELETE;
    End => "end", code::END;
    Up => "up", code::UP;
    Left => "left", code::LEFT;
    Down => "down", code::DOWN;
    Right => "right", code::RIGHT;
    Kp1 => "kp_1", code::KP_0 + 1;
    Kp2 => "kp_2", code::KP_0 + 2;
    Kp3 => "kp_3", code::KP_0 + 3;
    Kp4 => "kp_4", code::KP_0 + 4;
    Kp5 => "kp_5", code::KP_0 + 5;
    Kp6 => "kp_6", code::KP_0 + 6;
    Kp7 => "kp_7", code::KP_0 + 7;
    Kp8 => "kp_8", code::KP_0 + 8;
    Kp9 => "kp_9", code::KP_0 + 9;
    Kp0 => "kp_0", code::KP_0;
    NumLock => "numlock", code::NUMLOCK;
    KpDivide => "kp_divide", code::KP_DIVIDE;
    KpMultiply => "kp_multiply", code::KP_MULTIPLY;
    KpMinus => "kp_minus", code::KP_MINUS;
    KpPlus => "kp_plus", code::KP_PLUS;
    KpPeriod => "kp_period", code::KP_PERIOD;
    KpEnter => "kp_enter", code::KP_ENTER;
    LessThan => "lessthan", code::LESS;
}

/// Event name of a key, e.g. `key_lshift`
pub fn key_event_name(entry: &str) -> String {
    format!("key_{entry}")
}

/// Short name of a host key code for bind display
pub fn host_key_name(code: u32) -> String {
    KEY_TABLE
        .iter()
        .find(|k| k.default_code == code)
        .map(|k| k.entry.to_string())
        .unwrap_or_else(|| code.to_string())
}
