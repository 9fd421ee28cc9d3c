//! Integration tests for the keymapper-core public API.
//!
//! These tests drive the registry, the session context, and the symbols file
//! renderer together, the way the injector does before applying a layout.

use keymapper_core::{
    keycode::xmodmap::parse_xmodmap_pke,
    xkb::symbols::parse_bindings,
    InjectionContext, KeycodeRegistry, SymbolsFile, SystemMapping, XKB_KEYCODE_OFFSET,
};

const XMODMAP: &str = "\
keycode   9 = Escape NoSymbol Escape
keycode  10 = 1 exclam 1 exclam
keycode  11 = 2 at 2 at
keycode  38 = a A a A
keycode  50 = Shift_L NoSymbol Shift_L
keycode  56 = b B b B
";

fn system_mapping() -> SystemMapping {
    SystemMapping::from_known(parse_xmodmap_pke(XMODMAP).expect("sample must parse"))
}

#[test]
fn test_allocated_codes_survive_render_and_parse() {
    // Arrange
    let registry = system_mapping();
    let ouml = registry.resolve("odiaeresis").unwrap();
    let euro = registry.resolve("EuroSign").unwrap();

    // Act
    let text = SymbolsFile::new("keymapper/rt", "us", registry.unknown_entries()).render();
    let parsed = parse_bindings(&text).unwrap();

    // Assert
    assert!(text.contains(&format!("key <{}> {{ [ odiaeresis ] }};", ouml + XKB_KEYCODE_OFFSET)));
    assert!(parsed.contains(&(ouml, "odiaeresis".to_string())));
    assert!(parsed.contains(&(euro, "EuroSign".to_string())));
}

#[test]
fn test_session_with_two_unknown_characters_emits_exactly_two_bindings() {
    // Arrange
    let registry = system_mapping();
    let context = InjectionContext::from_mapping(
        "/dev/input/event4",
        [(30, "ö"), (31, "€"), (32, "b"), (42, "Shift_L")],
        &registry,
    )
    .unwrap();

    // Act
    let file = SymbolsFile::new("keymapper/two", "de", registry.unknown_entries());
    let parsed = parse_bindings(&file.render()).unwrap();

    // Assert
    assert_eq!(parsed.len(), 2);
    assert!(parsed.contains(&(context.key_to_code()[&30], "ö".to_string())));
    assert!(parsed.contains(&(context.key_to_code()[&31], "€".to_string())));
    // Known symbols keep their layout codes and are not re-bound
    assert_eq!(context.key_to_code()[&32], 48);
    assert_eq!(context.key_to_code()[&42], 42);
}

#[test]
fn test_unknown_codes_avoid_every_known_code() {
    let registry = system_mapping();
    let known: Vec<u16> = parse_xmodmap_pke(XMODMAP)
        .unwrap()
        .into_iter()
        .map(|(_, code)| code)
        .collect();

    for i in 0..32 {
        registry.resolve(&format!("U{:04X}", 0x100 + i)).unwrap();
    }

    for (code, symbol) in registry.unknown_entries() {
        assert!(!known.contains(&code), "{symbol} got known code {code}");
        assert!(!registry.is_known(&symbol));
    }
}
