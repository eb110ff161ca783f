use navshell::schema::FamilyOrigin;
use navshell::validation::with_code;
use navshell::{ResolveError, ShellError};

use crate::fixture::Fixture;

#[test]
fn test_system_tree_loads_clean() {
    let snapshot = Fixture::new().snapshot();
    assert!(snapshot.warnings.is_empty(), "{:?}", snapshot.warnings);
    assert_eq!(snapshot.store.families().count(), 3);
    assert_eq!(snapshot.nav.coordinate_of("system"), Some("0.0"));
    assert_eq!(snapshot.nav.coordinate_of("conversations"), Some("0.1"));
    assert_eq!(snapshot.nav.coordinate_of("math"), Some("0.2"));
    assert_eq!(snapshot.zones.members("daily"), vec!["conversations.search", "math.add"]);
    // a child family is grafted under its parent by its name
    assert_eq!(snapshot.store.select("system", "conversations"), Some("conversations"));
    assert_eq!(snapshot.store.get("conversations").unwrap().label, "Conversations");
    assert_eq!(snapshot.store.get("conversations.start").unwrap().label, "Start conversation");
}

#[test]
fn test_override_label_keeps_options() {
    let plain = Fixture::new().snapshot();
    let custom = Fixture::customized().snapshot();
    let before = plain.store.get("system.tools").unwrap();
    let after = custom.store.get("system.tools").unwrap();
    assert_eq!(after.label, "X");
    assert_eq!(after.options(), before.options());
    assert_eq!(after.description, before.description);
}

#[test]
fn test_excluded_node_is_gone_everywhere() {
    let snapshot = Fixture::customized().snapshot();
    assert!(!snapshot.store.contains("conversations.search"));
    let options = snapshot.store.get("conversations").unwrap().options().unwrap();
    assert!(!options.values().any(|t| t == "conversations.search"));
    assert_eq!(snapshot.zones.members("daily"), vec!["math.add"]);
    assert_eq!(with_code(&snapshot.warnings, "W205").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W401").count(), 1);

    let resolver = snapshot.resolver();
    for token in ["conversations.search", "0.1.2", "search"] {
        assert!(
            matches!(resolver.resolve(token), Err(ResolveError::NotFound { .. })),
            "{token} still resolves"
        );
    }
}

#[test]
fn test_added_node_reachable_through_overridden_options() {
    let snapshot = Fixture::customized().snapshot();
    let r = snapshot.resolver().resolve("0.2.3").unwrap();
    assert_eq!(r.node_id, "math.mul");
    assert_eq!(snapshot.store.get("math.mul").unwrap().family, "math");
}

#[test]
fn test_exclude_beats_add_and_override() {
    let fixture = Fixture::new();
    fixture.write_user(
        "nodes_custom.yaml",
        r#"
override_nodes:
  math.add:
    label: Plus
add_nodes:
  math.sub:
    type: Callable
    label: Subtract
    function_name: sub
    args_schema: {}
exclude_nodes: [math.add, math.sub, math.nothing]
"#,
    );
    let snapshot = fixture.snapshot();
    assert!(!snapshot.store.contains("math.add"));
    assert!(!snapshot.store.contains("math.sub"));
    assert_eq!(with_code(&snapshot.warnings, "W204").count(), 1);
}

#[test]
fn test_invalid_patch_keeps_unpatched_node() {
    let fixture = Fixture::new();
    fixture.write_user(
        "nodes_custom.json",
        r#"{"override_nodes": {"math.add": {"args_schema": "nonsense"}, "math.ghost": {"label": "?"}}}"#,
    );
    let snapshot = fixture.snapshot();
    let add = snapshot.store.get("math.add").unwrap();
    assert_eq!(add.binding().unwrap().args_schema.fields.len(), 2);
    assert_eq!(with_code(&snapshot.warnings, "W203").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W201").count(), 1);
}

#[test]
fn test_broken_user_family_falls_back_to_system() {
    let fixture = Fixture::new();
    fixture.write_user("families/conversations_family.json", "{ broken");
    let snapshot = fixture.snapshot();
    assert_eq!(with_code(&snapshot.warnings, "W001").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W003").count(), 1);
    let family = snapshot.store.family("conversations").unwrap();
    assert_eq!(family.origin, FamilyOrigin::System);
    assert!(snapshot.store.contains("conversations.search"));
}

#[test]
fn test_unreadable_user_files_fall_back_to_system() {
    let fixture = Fixture::new();
    let not_utf8 = [0xff, 0xfe, 0x7b];
    fixture.write_user_bytes("families/conversations_family.json", &not_utf8);
    fixture.write_user_bytes("nodes_custom.json", &not_utf8);
    fixture.write_user_bytes("nav.json", &not_utf8);
    let snapshot = fixture.snapshot();

    assert_eq!(with_code(&snapshot.warnings, "W001").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W003").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W200").count(), 1);
    assert_eq!(with_code(&snapshot.warnings, "W300").count(), 1);
    assert_eq!(
        snapshot.store.family("conversations").unwrap().origin,
        FamilyOrigin::System
    );
    assert!(snapshot.store.contains("conversations.search"));
    assert_eq!(snapshot.nav.coordinate_of("math"), Some("0.2"));
}

#[test]
fn test_user_family_replaces_system_family() {
    let fixture = Fixture::new();
    fixture.write_user(
        "families/math_family.json",
        r#"{"name": "math", "nodes": {
            "math": {"type": "Menu", "label": "My Math", "options": {"2": "math.pow"}},
            "pow": {"type": "Callable", "label": "Power", "function_name": "pow", "args_schema": {}}
        }}"#,
    );
    let snapshot = fixture.snapshot();
    assert_eq!(snapshot.store.family("math").unwrap().origin, FamilyOrigin::User);
    assert!(snapshot.store.contains("math.pow"));
    assert!(!snapshot.store.contains("math.add"));
    // the zone member that lived in the replaced family is dropped
    assert_eq!(with_code(&snapshot.warnings, "W401").count(), 1);
}

#[test]
fn test_invalid_nodes_warn_without_failing() {
    let fixture = Fixture::new();
    fixture.write_system(
        "families/extra_family.json",
        r#"{"name": "extra", "nodes": {
            "extra": {"type": "Menu", "label": "Extra", "options": {"0": "extra.a", "2": "extra.a"}},
            "a": {"type": "Callable", "label": "A", "function_name": "a", "args_schema": {}, "options": {"2": "extra"}},
            "b": {"type": "Widget", "label": "B"},
            "c": {"type": "Callable", "label": "C", "args_schema": {}},
            "d": {"type": "Callable", "label": "D", "function_name": "d"},
            "e": {"type": "Menu"}
        }}"#,
    );
    let snapshot = fixture.snapshot();
    for code in ["W101", "W102", "W103", "W104", "W106", "W107"] {
        assert_eq!(with_code(&snapshot.warnings, code).count(), 1, "{code}");
    }
    assert!(snapshot.store.contains("extra.a"));
    for dropped in ["extra.b", "extra.c", "extra.d", "extra.e"] {
        assert!(!snapshot.store.contains(dropped), "{dropped}");
    }
}

#[test]
fn test_coordinate_collision_is_fatal() {
    let fixture = Fixture::new();
    fixture.write_user(
        "nav.json",
        r#"{"nav_tree_order": ["system", "math"], "coordinate_mapping": {"0.1": "system", "0.01": "math"}}"#,
    );
    assert!(matches!(
        fixture.try_snapshot(),
        Err(ShellError::CoordinateCollision { .. })
    ));
}

#[test]
fn test_nested_explicit_coordinate_is_fatal() {
    let fixture = Fixture::new();
    // system sits at 0.0 and 0.0.2 is its tools option
    fixture.write_user(
        "nav.json",
        r#"{"nav_tree_order": ["system", "conversations"], "coordinate_mapping": {"0.0.2": "math"}}"#,
    );
    match fixture.try_snapshot() {
        Err(ShellError::CoordinateCollision { coordinate, existing, incoming }) => {
            assert_eq!(coordinate, "0.0.2");
            assert_eq!(existing, "system at 0.0");
            assert_eq!(incoming, "math");
        }
        other => panic!("expected a collision, got {:?}", other.map(|s| s.generation)),
    }
}

#[test]
fn test_explicit_coordinates_reserve_slots() {
    let fixture = Fixture::new();
    fixture.write_user(
        "nav.toml",
        r#"
nav_tree_order = ["system", "conversations", "math"]

[family_priorities]
math = -1

[coordinate_mapping]
"0.0" = "conversations"
"#,
    );
    let snapshot = fixture.snapshot();
    assert_eq!(snapshot.nav.coordinate_of("conversations"), Some("0.0"));
    assert_eq!(snapshot.nav.coordinate_of("math"), Some("0.1"));
    assert_eq!(snapshot.nav.coordinate_of("system"), Some("0.2"));
}
