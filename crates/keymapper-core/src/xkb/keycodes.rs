//! Identity XKB keycodes table.
//!
//! `setxkbmap -keycodes keymapper-keycodes` loads this table for the device.
//! It names every X11 keycode after its own number (`<42> = 42;`), which is
//! what lets the symbols files refer to keys as `<N>` without knowing the
//! symbolic names of the user's real keycodes table.
//!
//! The base layout included by every symbols file (`include "us"`) binds keys
//! by their evdev names (`<AC01>`, `<LFSH>`, ...), so the table also aliases
//! each of those names to its numeric key.  Without the aliases the base
//! layout would resolve to nothing on the device.

use std::ops::RangeInclusive;

use super::symbols::{XKB_KEYCODE_OFFSET, XKB_MAX_KEYCODE};
use crate::keycode::Keycode;

/// Name of the keycodes table, passed to `setxkbmap -keycodes`.  Also the file
/// name under the XKB `keycodes` directory.
pub const KEYCODES_TABLE_NAME: &str = "keymapper-keycodes";

/// Symbolic names of the evdev keycodes table (X11 numbering).
const EVDEV_KEY_NAMES: &[(&str, Keycode)] = &[
    ("ESC", 9),
    // Number row
    ("AE01", 10),
    ("AE02", 11),
    ("AE03", 12),
    ("AE04", 13),
    ("AE05", 14),
    ("AE06", 15),
    ("AE07", 16),
    ("AE08", 17),
    ("AE09", 18),
    ("AE10", 19),
    ("AE11", 20),
    ("AE12", 21),
    ("BKSP", 22),
    // Top letter row
    ("TAB", 23),
    ("AD01", 24),
    ("AD02", 25),
    ("AD03", 26),
    ("AD04", 27),
    ("AD05", 28),
    ("AD06", 29),
    ("AD07", 30),
    ("AD08", 31),
    ("AD09", 32),
    ("AD10", 33),
    ("AD11", 34),
    ("AD12", 35),
    ("RTRN", 36),
    // Home row
    ("LCTL", 37),
    ("AC01", 38),
    ("AC02", 39),
    ("AC03", 40),
    ("AC04", 41),
    ("AC05", 42),
    ("AC06", 43),
    ("AC07", 44),
    ("AC08", 45),
    ("AC09", 46),
    ("AC10", 47),
    ("AC11", 48),
    ("TLDE", 49),
    // Bottom row
    ("LFSH", 50),
    ("BKSL", 51),
    ("AB01", 52),
    ("AB02", 53),
    ("AB03", 54),
    ("AB04", 55),
    ("AB05", 56),
    ("AB06", 57),
    ("AB07", 58),
    ("AB08", 59),
    ("AB09", 60),
    ("AB10", 61),
    ("RTSH", 62),
    ("KPMU", 63),
    ("LALT", 64),
    ("SPCE", 65),
    ("CAPS", 66),
    // Function keys
    ("FK01", 67),
    ("FK02", 68),
    ("FK03", 69),
    ("FK04", 70),
    ("FK05", 71),
    ("FK06", 72),
    ("FK07", 73),
    ("FK08", 74),
    ("FK09", 75),
    ("FK10", 76),
    ("NMLK", 77),
    ("SCLK", 78),
    // Keypad
    ("KP7", 79),
    ("KP8", 80),
    ("KP9", 81),
    ("KPSU", 82),
    ("KP4", 83),
    ("KP5", 84),
    ("KP6", 85),
    ("KPAD", 86),
    ("KP1", 87),
    ("KP2", 88),
    ("KP3", 89),
    ("KP0", 90),
    ("KPDL", 91),
    ("LVL3", 92),
    ("HZTG", 93),
    ("LSGT", 94),
    ("FK11", 95),
    ("FK12", 96),
    ("AB11", 97),
    // Japanese keys
    ("KATA", 98),
    ("HIRA", 99),
    ("HENK", 100),
    ("HKTG", 101),
    ("MUHE", 102),
    ("JPCM", 103),
    ("KPEN", 104),
    ("RCTL", 105),
    ("KPDV", 106),
    ("PRSC", 107),
    ("RALT", 108),
    ("ALGR", 108),
    ("LNFD", 109),
    // Navigation block
    ("HOME", 110),
    ("UP", 111),
    ("PGUP", 112),
    ("LEFT", 113),
    ("RGHT", 114),
    ("END", 115),
    ("DOWN", 116),
    ("PGDN", 117),
    ("INS", 118),
    ("DELE", 119),
    ("MUTE", 121),
    ("VOL-", 122),
    ("VOL+", 123),
    ("POWR", 124),
    ("KPEQ", 125),
    ("PAUS", 127),
    ("KPPT", 129),
    ("HNGL", 130),
    ("HJCV", 131),
    ("AE13", 132),
    ("LWIN", 133),
    ("LMTA", 133),
    ("RWIN", 134),
    ("RMTA", 134),
    ("COMP", 135),
    ("MENU", 135),
    ("STOP", 136),
    ("AGAI", 137),
    ("PROP", 138),
    ("UNDO", 139),
    ("FRNT", 140),
    ("COPY", 141),
    ("OPEN", 142),
    ("PAST", 143),
    ("FIND", 144),
    ("CUT", 145),
    ("HELP", 146),
    // Extended function keys
    ("FK13", 191),
    ("FK14", 192),
    ("FK15", 193),
    ("FK16", 194),
    ("FK17", 195),
    ("FK18", 196),
    ("FK19", 197),
    ("FK20", 198),
    ("FK21", 199),
    ("FK22", 200),
    ("FK23", 201),
    ("FK24", 202),
    // Virtual modifiers
    ("MDSW", 203),
    ("ALT", 204),
    ("META", 205),
    ("SUPR", 206),
    ("HYPR", 207),
];

/// Codes evdev names `<I{code}>` (multimedia and other unnamed keys).
const EVDEV_NUMBERED_RANGES: &[RangeInclusive<Keycode>] =
    &[120..=120, 126..=126, 128..=129, 147..=190, 208..=XKB_MAX_KEYCODE];

/// Every `(symbolic name, X11 code)` pair the table aliases.
fn evdev_aliases() -> impl Iterator<Item = (String, Keycode)> {
    let named = EVDEV_KEY_NAMES
        .iter()
        .map(|&(name, code)| (name.to_string(), code));
    let numbered = EVDEV_NUMBERED_RANGES
        .iter()
        .cloned()
        .flatten()
        .map(|code| (format!("I{code}"), code));
    named.chain(numbered)
}

/// Renders the identity keycodes table covering every X11 keycode, with
/// aliases for the evdev key names.
pub fn render_keycodes_table() -> String {
    let mut out = format!("default xkb_keycodes \"{KEYCODES_TABLE_NAME}\" {{\n");
    out.push_str(&format!("    minimum = {XKB_KEYCODE_OFFSET};\n"));
    out.push_str(&format!("    maximum = {XKB_MAX_KEYCODE};\n"));
    for code in XKB_KEYCODE_OFFSET..=XKB_MAX_KEYCODE {
        out.push_str(&format!("    <{code}> = {code};\n"));
    }
    for (name, code) in evdev_aliases() {
        out.push_str(&format!("    alias <{name}> = <{code}>;\n"));
    }
    out.push_str("};\n");
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_keycodes_table_declares_range() {
        let table = render_keycodes_table();

        assert!(table.starts_with("default xkb_keycodes \"keymapper-keycodes\" {\n"));
        assert!(table.contains("    minimum = 8;\n"));
        assert!(table.contains("    maximum = 255;\n"));
        assert!(table.ends_with("};\n"));
    }

    #[test]
    fn test_keycodes_table_names_every_code_after_itself() {
        let table = render_keycodes_table();

        let entries = table.lines().filter(|l| l.trim_start().starts_with('<')).count();
        assert_eq!(entries, usize::from(XKB_MAX_KEYCODE - XKB_KEYCODE_OFFSET) + 1);
        assert!(table.contains("    <8> = 8;\n"));
        assert!(table.contains("    <255> = 255;\n"));
        assert!(!table.contains("<7>"));
    }

    #[test]
    fn test_keycodes_table_aliases_base_layout_key_names() {
        let table = render_keycodes_table();

        assert!(table.contains("    alias <ESC> = <9>;\n"));
        assert!(table.contains("    alias <AC01> = <38>;\n"));
        // `b` on a us layout, evdev 48
        assert!(table.contains("    alias <AB05> = <56>;\n"));
        assert!(table.contains("    alias <LFSH> = <50>;\n"));
        assert!(table.contains("    alias <LCTL> = <37>;\n"));
        assert!(table.contains("    alias <I147> = <147>;\n"));
        assert!(table.contains("    alias <FK24> = <202>;\n"));
    }

    #[test]
    fn test_aliases_are_unique_and_point_at_declared_codes() {
        // Arrange
        let aliases: Vec<_> = evdev_aliases().collect();

        // Act
        let names: HashSet<_> = aliases.iter().map(|(name, _)| name.as_str()).collect();

        // Assert
        assert_eq!(names.len(), aliases.len(), "duplicate alias name");
        for (name, code) in &aliases {
            assert!(
                (XKB_KEYCODE_OFFSET..=XKB_MAX_KEYCODE).contains(code),
                "<{name}> points outside the table: {code}"
            );
            assert!(
                name.parse::<Keycode>().is_err(),
                "<{name}> collides with a numeric key name"
            );
        }
    }

    #[test]
    fn test_every_printable_key_of_the_main_block_has_an_alias() {
        let names: HashSet<_> = evdev_aliases().map(|(name, _)| name).collect();

        for row in ["AE", "AD", "AC", "AB"] {
            for column in 1..=10 {
                let name = format!("{row}{column:02}");
                assert!(names.contains(&name), "missing <{name}>");
            }
        }
    }
}
