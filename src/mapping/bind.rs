//! Binds: one physical input code attached to one event

use super::bind_group::GroupId;
use super::error::MappingError;
use super::event::EventId;
use super::{BindFlags, Mods};
use tracing::warn;

/// Handle to a bind. The generation keeps a deleted bind's handle dead after
/// its slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindId {
    index: usize,
    generation: u32,
}

impl BindId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Single cardinal direction of a hat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Up,
    Right,
    Down,
    Left,
}

impl HatDirection {
    pub const ALL: [HatDirection; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Reduces a raw hat value to one direction, checking up, right, down, left in turn.
    pub fn from_bits(raw: u8) -> Result<Self, MappingError> {
        Self::ALL
            .into_iter()
            .find(|dir| raw & dir.bit() != 0)
            .ok_or(MappingError::InvalidHatDirection(raw))
    }

    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Position inside a hat's four-entry block
    pub fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindSource {
    Key { code: u32 },
    JoyAxis { axis: usize, positive: bool },
    JoyButton { button: usize },
    JoyHat { hat: usize, dir: HatDirection },
}

impl BindSource {
    pub fn hat(hat: usize, raw: u8) -> Result<Self, MappingError> {
        Ok(Self::JoyHat {
            hat,
            dir: HatDirection::from_bits(raw)?,
        })
    }

    /// The words following the group prefix in a bind spec
    pub fn config_words(&self) -> String {
        match self {
            Self::Key { code } => code.to_string(),
            Self::JoyAxis { axis, positive } => format!("axis {} {}", axis, u8::from(*positive)),
            Self::JoyButton { button } => format!("button {}", button),
            Self::JoyHat { hat, dir } => format!("hat {} {}", hat, dir.bit()),
        }
    }

    /// Parses `<code>` after a `key` prefix
    pub(crate) fn parse_key<'a>(
        words: &mut impl Iterator<Item = &'a str>,
    ) -> Result<Self, MappingError> {
        let code = next_number(words, "key code")?;
        Ok(Self::Key { code })
    }

    /// Parses `axis|button|hat ...` after a `stick_N` prefix
    pub(crate) fn parse_stick<'a>(
        words: &mut impl Iterator<Item = &'a str>,
    ) -> Result<Self, MappingError> {
        let kind = words
            .next()
            .ok_or_else(|| MappingError::InvalidBindSpec("missing input type".into()))?;
        match kind.to_ascii_lowercase().as_str() {
            "axis" => {
                let axis = next_number(words, "axis index")?;
                let positive: u8 = next_number(words, "axis direction")?;
                Ok(Self::JoyAxis {
                    axis,
                    positive: positive != 0,
                })
            }
            "button" => Ok(Self::JoyButton {
                button: next_number(words, "button index")?,
            }),
            "hat" => {
                let hat = next_number(words, "hat index")?;
                let raw: u8 = next_number(words, "hat direction")?;
                Self::hat(hat, raw)
            }
            other => Err(MappingError::InvalidBindSpec(format!(
                "unknown input type '{other}'"
            ))),
        }
    }
}

fn next_number<'a, T: std::str::FromStr>(
    words: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<T, MappingError> {
    let word = words
        .next()
        .ok_or_else(|| MappingError::InvalidBindSpec(format!("missing {what}")))?;
    word.parse()
        .map_err(|_| MappingError::InvalidBindSpec(format!("bad {what} '{word}'")))
}

/// Parses the trailing `mod1 mod2 mod3 host hold` words. Unknown words are skipped.
pub(crate) fn parse_options<'a>(words: impl Iterator<Item = &'a str>) -> (Mods, BindFlags) {
    let mut mods = Mods::empty();
    let mut flags = BindFlags::empty();
    for word in words {
        match word.to_ascii_lowercase().as_str() {
            "mod1" => mods |= Mods::MOD1,
            "mod2" => mods |= Mods::MOD2,
            "mod3" => mods |= Mods::MOD3,
            "host" => mods |= Mods::HOST,
            "hold" => flags |= BindFlags::HOLD,
            other => warn!("Ignoring unknown bind option '{}'", other),
        }
    }
    (mods, flags)
}

pub(crate) fn format_options(mods: Mods, flags: BindFlags) -> String {
    let mut out = String::new();
    for (bit, word) in [
        (Mods::MOD1, " mod1"),
        (Mods::MOD2, " mod2"),
        (Mods::MOD3, " mod3"),
        (Mods::HOST, " host"),
    ] {
        if mods.contains(bit) {
            out.push_str(word);
        }
    }
    if flags.contains(BindFlags::HOLD) {
        out.push_str(" hold");
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bind {
    pub(crate) source: BindSource,
    pub(crate) group: GroupId,
    pub(crate) event: EventId,
    pub(crate) mods: Mods,
    pub(crate) flags: BindFlags,
    pub(crate) value: i16,
    pub(crate) active: bool,
    pub(crate) holding: bool,
}

impl Bind {
    pub(crate) fn new(
        source: BindSource,
        group: GroupId,
        event: EventId,
        mods: Mods,
        flags: BindFlags,
    ) -> Self {
        Self {
            source,
            group,
            event,
            mods,
            flags,
            value: 0,
            active: false,
            holding: false,
        }
    }

    pub fn source(&self) -> BindSource {
        self.source
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    pub fn mods(&self) -> Mods {
        self.mods
    }

    pub fn flags(&self) -> BindFlags {
        self.flags
    }

    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Complete spec text, `prefix` being the owning group's config prefix
    pub fn config_spec(&self, prefix: &str) -> String {
        format!(
            "{} {}{}",
            prefix,
            self.source.config_words(),
            format_options(self.mods, self.flags)
        )
    }

    /// Modifier part of the human readable name, e.g. `mod1+host+`
    pub(crate) fn mods_label(&self) -> String {
        let mut out = String::new();
        for (bit, word) in [
            (Mods::MOD1, "mod1+"),
            (Mods::MOD2, "mod2+"),
            (Mods::MOD3, "mod3+"),
            (Mods::HOST, "host+"),
        ] {
            if self.mods.contains(bit) {
                out.push_str(word);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x01, HatDirection::Up)]
    #[case(0x02, HatDirection::Right)]
    #[case(0x04, HatDirection::Down)]
    #[case(0x08, HatDirection::Left)]
    #[case(0x03, HatDirection::Up)]
    #[case(0x0c, HatDirection::Down)]
    #[case(0xfa, HatDirection::Right)]
    fn hat_reduces_to_one_direction(#[case] raw: u8, #[case] dir: HatDirection) {
        assert_eq!(HatDirection::from_bits(raw).unwrap(), dir);
    }

    #[test]
    fn hat_without_direction_is_rejected() {
        assert!(matches!(
            HatDirection::from_bits(0x30),
            Err(MappingError::InvalidHatDirection(0x30))
        ));
    }

    #[test]
    fn options_are_case_insensitive() {
        let (mods, flags) = parse_options("MOD1 Host hold bogus".split_whitespace());
        assert_eq!(mods, Mods::MOD1 | Mods::HOST);
        assert_eq!(flags, BindFlags::HOLD);
        assert_eq!(format_options(mods, flags), " mod1 host hold");
    }

    #[test]
    fn temporary_hold_is_not_written() {
        assert_eq!(
            format_options(Mods::empty(), BindFlags::HOLD_TEMPORARY),
            ""
        );
    }

    #[rstest]
    #[case("axis 3 1", BindSource::JoyAxis { axis: 3, positive: true })]
    #[case("AXIS 0 0", BindSource::JoyAxis { axis: 0, positive: false })]
    #[case("button 7", BindSource::JoyButton { button: 7 })]
    #[case("hat 1 8", BindSource::JoyHat { hat: 1, dir: HatDirection::Left })]
    fn parses_stick_sources(#[case] text: &str, #[case] expected: BindSource) {
        let mut words = text.split_whitespace();
        assert_eq!(BindSource::parse_stick(&mut words).unwrap(), expected);
    }

    #[rstest]
    #[case("axis")]
    #[case("axis x 1")]
    #[case("slider 1")]
    #[case("hat 0 0")]
    fn rejects_bad_stick_sources(#[case] text: &str) {
        let mut words = text.split_whitespace();
        assert!(BindSource::parse_stick(&mut words).is_err());
    }

    #[test]
    fn spec_text() {
        let bind = Bind::new(
            BindSource::JoyHat {
                hat: 0,
                dir: HatDirection::Down,
            },
            1,
            EventId(3),
            Mods::MOD2,
            BindFlags::HOLD,
        );
        assert_eq!(bind.config_spec("stick_0"), "stick_0 hat 0 4 mod2 hold");
    }
}
