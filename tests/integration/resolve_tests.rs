use navshell::nav::ComboAddress;
use navshell::resolve::Rule;
use navshell::{AliasTable, ResolveError, View};

use crate::fixture::Fixture;

#[test]
fn test_numeric_and_semantic_agree_for_every_nav_node() {
    let snapshot = Fixture::customized().snapshot();
    let resolver = snapshot.resolver();
    let mut checked = 0;
    for entry in snapshot.nav.entries() {
        for (_, id) in snapshot.store.subtree(&entry.family) {
            let Some(combo) = ComboAddress::derive(&snapshot.nav, &snapshot.store, &id) else {
                continue;
            };
            let numeric = resolver.resolve(&combo.coordinate).unwrap();
            let semantic = resolver.resolve(&combo.semantic).unwrap();
            assert_eq!(numeric.node_id, semantic.node_id, "{combo}");
            assert_eq!(numeric.node_id, id);
            assert_eq!(numeric.rule, Rule::Numeric);
            assert_eq!(semantic.coordinate.as_deref(), Some(combo.coordinate.as_str()));
            checked += 1;
        }
    }
    assert!(checked >= 8, "only {checked} nodes checked");
}

#[test]
fn test_implicit_menu_suffix() {
    let snapshot = Fixture::new().snapshot();
    let resolver = snapshot.resolver();

    let r = resolver.resolve("0.0.10").unwrap();
    assert_eq!(r.node_id, "system.ping");
    assert_eq!(r.view, View::Menu);
    assert_eq!(r.address(), "0.0.10.0");

    let r = resolver.resolve("0.0.10.1").unwrap();
    assert_eq!(r.view, View::ActionMenu);
    assert_eq!(r.address(), "0.0.10.1.0");

    assert_eq!(resolver.resolve("0.0.10.1.0").unwrap().view, View::ActionMenu);
    assert_eq!(resolver.resolve("0.0.10.1.1").unwrap().view, View::Execute);
    assert_eq!(resolver.resolve("system.ping.0").unwrap().address(), "system.ping.0");

    for past_terminal in ["0.0.10.1.1.0", "0.0.10.0.1", "system.ping.1.0.1"] {
        assert!(
            matches!(resolver.resolve(past_terminal), Err(ResolveError::NotFound { .. })),
            "{past_terminal}"
        );
    }
}

#[test]
fn test_option_walks_mix_selectors_and_child_names() {
    let snapshot = Fixture::new().snapshot();
    let resolver = snapshot.resolver();
    assert_eq!(resolver.resolve("0.0.2.2").unwrap().node_id, "system.tools.echo");
    assert_eq!(resolver.resolve("system.2.echo").unwrap().node_id, "system.tools.echo");
    assert_eq!(resolver.resolve("system.conversations.3").unwrap().node_id, "conversations.start");
    assert!(resolver.resolve("0.0.99").is_err());
}

#[test]
fn test_bare_name_and_ambiguity() {
    let fixture = Fixture::new();
    fixture.write_system(
        "families/notes_family.json",
        r#"{"name": "notes", "nodes": {
            "notes": {"type": "Menu", "label": "Notes", "options": {"2": "notes.search"}},
            "search": {"type": "Callable", "label": "Search notes", "function_name": "search", "args_schema": {}}
        }}"#,
    );
    let snapshot = fixture.snapshot();
    let resolver = snapshot.resolver();

    let r = resolver.resolve("ping").unwrap();
    assert_eq!(r.node_id, "system.ping");
    assert_eq!(r.rule, Rule::BareName);
    assert_eq!(r.coordinate.as_deref(), Some("0.0.10"));

    match resolver.resolve("search") {
        Err(ResolveError::Ambiguous { candidates, .. }) => {
            assert_eq!(candidates, vec!["conversations.search", "notes.search"]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    // a zone narrows the bare name to its own members
    let r = resolver.resolve("daily.search").unwrap();
    assert_eq!(r.node_id, "conversations.search");
    assert_eq!(r.rule, Rule::Zone);
    assert_eq!(r.address(), "daily.search.0");
}

#[test]
fn test_zone_rule_requires_membership() {
    let snapshot = Fixture::new().snapshot();
    let resolver = snapshot.resolver();
    assert_eq!(resolver.resolve("daily.add").unwrap().node_id, "math.add");
    assert_eq!(resolver.resolve("daily.0.2.2.1").unwrap().view, View::ActionMenu);
    assert!(matches!(
        resolver.resolve("daily.ping"),
        Err(ResolveError::NotFound { .. })
    ));
}

#[test]
fn test_shortcuts_and_runtime_aliases() {
    let snapshot = Fixture::new().snapshot();

    let r = snapshot.resolver().resolve("shout.1.1").unwrap();
    assert_eq!(r.node_id, "system.tools.echo");
    assert_eq!(r.rule, Rule::Alias);

    let aliases = AliasTable::new();
    aliases.register("m", "0.2");
    aliases.register("shout", "system.ping");
    let resolver = snapshot.resolver().with_aliases(&aliases);
    assert_eq!(resolver.resolve("m.2").unwrap().node_id, "math.add");
    // runtime aliases shadow configured shortcuts
    assert_eq!(resolver.resolve("shout").unwrap().node_id, "system.ping");

    aliases.register("loop_a", "loop_b");
    aliases.register("loop_b", "loop_a");
    assert!(matches!(
        resolver.resolve("loop_a"),
        Err(ResolveError::NotFound { .. })
    ));
}
