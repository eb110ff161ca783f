use std::time::Duration;

use navshell::loader::DirSource;
use navshell::schema::Shortcut;
use navshell::shell::CommandOutput;
use navshell::{
    create_event_channel, ApprovalError, ExecutionError, ResolveError, Shell, ShellError, ShellEvent,
    WorkflowStatus,
};
use serde_json::json;

use crate::fixture::{registry, Fixture};

#[tokio::test]
async fn test_jump_renders_menu_and_action_views() {
    let fixture = Fixture::new();
    let shell = fixture.shell();

    let CommandOutput::Menu(menu) = shell.handle("jump 0.0").await.unwrap() else {
        panic!("expected menu");
    };
    assert_eq!(menu.node_id, "system");
    assert_eq!(menu.address, "0.0.0");
    let selectors: Vec<&str> = menu.options.iter().map(|o| o.selector.as_str()).collect();
    assert_eq!(selectors, vec!["2", "10", "conversations"]);

    let CommandOutput::ActionMenu(action) = shell.handle("jump 0.2.2.1").await.unwrap() else {
        panic!("expected action menu");
    };
    assert_eq!(action.function_name, "add");
    assert_eq!(action.args.len(), 2);
    assert_eq!(action.status, WorkflowStatus::Unran);
    assert!(action.to_string().contains("a: integer"));
}

#[tokio::test]
async fn test_menu_at_action_selector_is_an_error() {
    let shell = Fixture::new().shell();
    for line in ["jump 0.0.1", "jump system.tools.1.1", r#"jump system {"a": 1}"#] {
        let err = shell.handle(line).await.unwrap_err();
        assert!(
            matches!(err, ShellError::Execution(ExecutionError::CallableRequired(_))),
            "{line}: {err}"
        );
    }
}

#[tokio::test]
async fn test_args_imply_execution() {
    let shell = Fixture::new().shell();
    let CommandOutput::Executed(run) = shell
        .handle(r#"jump add {"a": 2, "b": 3}"#)
        .await
        .unwrap()
    else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!(5));
    assert_eq!(run.node_id, "math.add");
    assert_eq!(run.status, WorkflowStatus::Quarantine);
    assert_eq!(run.execution_count, 1);

    let CommandOutput::Executed(run) = shell.handle("jump 0.0.10.1.1").await.unwrap() else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!("pong"));
    assert_eq!(run.address, "0.0.10.1.1");
}

#[tokio::test]
async fn test_arg_validation_leaves_counts_unchanged() {
    let shell = Fixture::new().shell();
    shell.handle(r#"jump echo {"text": "hi"}"#).await.unwrap();

    let err = shell.handle(r#"jump echo {"text": 7}"#).await.unwrap_err();
    assert!(matches!(
        err,
        ShellError::Execution(ExecutionError::ArgValidation { .. })
    ));
    let err = shell.handle("jump echo.1.1").await.unwrap_err();
    assert!(matches!(
        err,
        ShellError::Execution(ExecutionError::ArgValidation { .. })
    ));

    let record = shell.tracker().record("system.tools.echo").await.unwrap().unwrap();
    assert_eq!(record.execution_count, 1);
    assert_eq!(record.failure_count, 0);
}

#[tokio::test]
async fn test_timeout_recorded_as_failure() {
    let fixture = Fixture::new();
    let shell = Shell::builder(DirSource::new(fixture.system_dir()))
        .registry(registry())
        .default_timeout(Duration::from_millis(30))
        .build()
        .unwrap();
    let err = shell.handle("jump math.slow.1.1").await.unwrap_err();
    assert!(matches!(err, ShellError::Execution(ExecutionError::Timeout { .. })));
    let record = shell.tracker().record("math.slow").await.unwrap().unwrap();
    assert_eq!(record.failure_count, 1);
    assert_eq!(record.status, WorkflowStatus::Quarantine);
}

#[tokio::test]
async fn test_chain_passes_outputs_forward() {
    let shell = Fixture::new().shell();
    let output = shell
        .handle(r#"chain echo {"text": "hi"} -> echo {"text": "{$prev} again"} -> add {"a": 1, "b": 2} -> echo {"text": "{$step2_result}/{$prev}"}"#)
        .await
        .unwrap();
    let CommandOutput::Chain { steps } = output else {
        panic!("expected chain");
    };
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[1].output, json!("hi again"));
    assert_eq!(steps[3].output, json!("hi again/3"));

    // the last output carries over to the next command
    let CommandOutput::Executed(run) = shell
        .handle(r#"jump echo {"text": "$last_result"}"#)
        .await
        .unwrap()
    else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!("hi again/3"));
}

#[tokio::test]
async fn test_chain_aborts_with_failing_step() {
    let shell = Fixture::new().shell();
    let err = shell
        .handle(r#"chain echo {"text": "x"} -> add {"a": "no", "b": 1} -> ping"#)
        .await
        .unwrap_err();
    match err {
        ShellError::ChainStep { step, source } => {
            assert_eq!(step, 2);
            assert!(matches!(
                *source,
                ShellError::Execution(ExecutionError::ArgValidation { .. })
            ));
        }
        other => panic!("unexpected {other}"),
    }
    // step 3 never ran
    assert!(shell.tracker().record("system.ping").await.unwrap().is_none());

    let err = shell.handle("chain ping -> nowhere").await.unwrap_err();
    assert!(matches!(err, ShellError::ChainStep { step: 2, .. }));
}

#[tokio::test]
async fn test_chain_shortcut_expands_template() {
    let shell = Fixture::new().shell();
    let CommandOutput::Chain { steps } = shell
        .handle(r#"chain addup {"a": 2, "b": 5}"#)
        .await
        .unwrap()
    else {
        panic!("expected chain");
    };
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].output, json!(3));
    assert_eq!(steps[1].args, json!({"a": 3, "b": 5}));
    assert_eq!(steps[1].output, json!(8));
}

#[tokio::test]
async fn test_nav_rendering() {
    let shell = Fixture::customized().shell();
    let CommandOutput::Nav(tree) = shell.handle("nav").await.unwrap() else {
        panic!("expected nav");
    };
    let ids: Vec<&str> = tree.lines.iter().map(|l| l.node_id.as_str()).collect();
    assert_eq!(ids[0], "system");
    assert!(ids.contains(&"math.mul"));
    assert_eq!(ids.iter().filter(|id| **id == "conversations").count(), 1);
    let rendered = tree.to_string();
    assert!(rendered.contains("0.2.3 Multiply (math.mul)"), "{rendered}");

    let CommandOutput::Nav(zone) = shell.handle("nav daily").await.unwrap() else {
        panic!("expected nav");
    };
    assert_eq!(zone.lines.len(), 1);
    assert_eq!(zone.lines[0].node_id, "math.add");

    let CommandOutput::Nav(family) = shell.handle("nav math").await.unwrap() else {
        panic!("expected nav");
    };
    assert_eq!(family.lines.len(), 3);

    assert!(matches!(
        shell.handle("nav nowhere").await,
        Err(ShellError::Resolve(ResolveError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_shortcut_command_registers_alias() {
    let shell = Fixture::new().shell();
    let output = shell.handle("shortcut calc 0.2").await.unwrap();
    assert!(matches!(output, CommandOutput::AliasRegistered { replaced: None, .. }));
    let CommandOutput::Executed(run) = shell
        .handle(r#"jump calc.2 {"a": 4, "b": 4}"#)
        .await
        .unwrap()
    else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!(8));

    assert!(shell.handle("shortcut bad 0.9.9").await.is_err());
    assert!(shell.handle("shortcut a.b 0.2").await.is_err());
    assert_eq!(shell.aliases().len(), 1);
}

#[tokio::test]
async fn test_approval_commands() {
    let shell = Fixture::new().shell();
    shell.handle(r#"jump add {"a": 1, "b": 1}"#).await.unwrap();
    shell.handle(r#"jump add {"a": 1, "b": 2}"#).await.unwrap();

    let CommandOutput::Pending { queue } = shell.handle("pending").await.unwrap() else {
        panic!("expected pending");
    };
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].path, "math.add");

    let CommandOutput::Status { status, .. } = shell.handle("status 0.2.2").await.unwrap() else {
        panic!("expected status");
    };
    assert_eq!(status, WorkflowStatus::Quarantine);

    let output = shell.handle("approve 0.2.2 alice").await.unwrap();
    assert!(matches!(output, CommandOutput::Approved { changed: true, .. }));
    let err = shell.handle("approve math.add bob").await.unwrap_err();
    assert!(matches!(err, ShellError::Approval(ApprovalError::AlreadyGolden(_))));

    let CommandOutput::Pending { queue } = shell.handle("pending").await.unwrap() else {
        panic!("expected pending");
    };
    assert!(queue.is_empty());

    let CommandOutput::Revoked { record } = shell.handle("revoke add carol").await.unwrap() else {
        panic!("expected revoke");
    };
    assert_eq!(record.status, WorkflowStatus::Quarantine);
    assert!(matches!(
        shell.handle("revoke add carol").await,
        Err(ShellError::Approval(ApprovalError::NotGolden { .. }))
    ));
    assert!(matches!(
        shell.handle("approve ping alice").await,
        Err(ShellError::Approval(ApprovalError::NotInQuarantine { .. }))
    ));
}

#[tokio::test]
async fn test_reload_swaps_snapshot() {
    let fixture = Fixture::new();
    let (tx, mut rx) = create_event_channel();
    let shell = Shell::builder(DirSource::new(fixture.system_dir()))
        .user_source(DirSource::new(fixture.user_dir()))
        .registry(registry())
        .events(tx)
        .build()
        .unwrap();
    assert!(matches!(
        rx.recv().await,
        Some(ShellEvent::SnapshotActivated { generation: 1, .. })
    ));

    let before = shell.snapshot();
    assert!(shell.resolve("0.2.3").is_err());

    fixture.write_user("nodes_custom.json", crate::fixture::NODES_CUSTOM);
    let CommandOutput::Reloaded { generation, .. } = shell.handle("reload").await.unwrap() else {
        panic!("expected reload");
    };
    assert_eq!(generation, 2);
    assert_eq!(shell.resolve("0.2.3").unwrap().node_id, "math.mul");
    // readers holding the old snapshot keep a consistent view
    assert!(before.store.contains("conversations.search"));
    assert!(!shell.snapshot().store.contains("conversations.search"));
    assert!(matches!(
        rx.recv().await,
        Some(ShellEvent::SnapshotActivated { generation: 2, .. })
    ));

    // a broken reload keeps the active snapshot
    fixture.write_user("nav.json", r#"{"coordinate_mapping": {"0.1": "math", "0.01": "system"}}"#);
    assert!(shell.handle("reload").await.is_err());
    assert_eq!(shell.snapshot().generation, 2);
}

#[tokio::test]
async fn test_unknown_command() {
    let shell = Fixture::new().shell();
    assert!(matches!(
        shell.handle("teleport 0.0").await,
        Err(ShellError::Command(_))
    ));
}

#[tokio::test]
async fn test_chain_separator_inside_json_is_data() {
    let shell = Fixture::new().shell();
    let CommandOutput::Chain { steps } = shell
        .handle(r#"chain echo {"text": "a->b"} -> echo {"text": "{$prev} [x->y]"}"#)
        .await
        .unwrap()
    else {
        panic!("expected chain");
    };
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].output, json!("a->b"));
    assert_eq!(steps[1].output, json!("a->b [x->y]"));
}

#[tokio::test]
async fn test_menu_view_for_menus_has_no_action_entry() {
    let shell = Fixture::new().shell();
    let CommandOutput::Menu(menu) = shell.handle("jump 0.0").await.unwrap() else {
        panic!("expected menu");
    };
    assert!(!menu.callable);
    assert!(!menu.to_string().contains("  1:"));

    let CommandOutput::Menu(menu) = shell.handle("jump echo").await.unwrap() else {
        panic!("expected menu");
    };
    assert!(menu.callable);
    assert!(menu.to_string().contains("  1: review arguments / execute"));
}

#[tokio::test]
async fn test_back_walks_the_navigation_stack() {
    let shell = Fixture::new().shell();
    assert!(matches!(
        shell.handle("back").await,
        Err(ShellError::Command(_))
    ));

    shell.handle("jump 0.0").await.unwrap();
    shell.handle("jump system.tools").await.unwrap();
    shell.handle("jump echo.1").await.unwrap();

    let mut visited = Vec::new();
    for _ in 0..3 {
        let CommandOutput::Menu(menu) = shell.handle("back").await.unwrap() else {
            panic!("expected menu");
        };
        visited.push(menu.node_id);
    }
    assert_eq!(visited, vec!["system.tools", "system", "system"]);

    // failed jumps leave the stack alone
    assert!(shell.handle("jump nowhere").await.is_err());
    let CommandOutput::Menu(menu) = shell.handle("back").await.unwrap() else {
        panic!("expected menu");
    };
    assert_eq!(menu.node_id, "system");
}

#[tokio::test]
async fn test_menu_returns_to_nearest_menu() {
    let shell = Fixture::new().shell();
    let CommandOutput::Menu(menu) = shell.handle("menu").await.unwrap() else {
        panic!("expected menu");
    };
    assert_eq!(menu.node_id, "system");

    shell.handle(r#"jump echo {"text": "x"}"#).await.unwrap();
    let CommandOutput::Menu(menu) = shell.handle("menu").await.unwrap() else {
        panic!("expected menu");
    };
    assert_eq!(menu.node_id, "system.tools");

    // menu counts as a visit, so back returns to the callable
    let CommandOutput::Menu(menu) = shell.handle("back").await.unwrap() else {
        panic!("expected menu");
    };
    assert_eq!(menu.node_id, "system.tools.echo");
    assert!(menu.callable);
}

#[tokio::test]
async fn test_history_lists_jumps_and_chain_steps() {
    let shell = Fixture::new().shell();
    let CommandOutput::History { entries } = shell.handle("history").await.unwrap() else {
        panic!("expected history");
    };
    assert!(entries.is_empty());

    shell.handle(r#"jump add {"a": 1, "b": 2}"#).await.unwrap();
    shell.handle(r#"chain echo {"text": "hi"} -> ping"#).await.unwrap();
    // menu views and failures are not executions
    shell.handle("jump 0.0").await.unwrap();
    assert!(shell.handle(r#"jump add {"a": "x", "b": 2}"#).await.is_err());

    let CommandOutput::History { entries } = shell.handle("history").await.unwrap() else {
        panic!("expected history");
    };
    let nodes: Vec<&str> = entries.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(nodes, vec!["math.add", "system.tools.echo", "system.ping"]);
    assert_eq!(entries[0].step, 0);
    assert_eq!(entries[0].output, json!(3));
    assert_eq!(entries[0].command(), r#"jump math.add {"a":1,"b":2}"#);
    assert_eq!(entries[2].output, json!("pong"));
}

#[tokio::test]
async fn test_session_variables() {
    let shell = Fixture::new().shell();
    shell.handle("save_var who ada").await.unwrap();
    let CommandOutput::VarSaved { value, replaced, .. } = shell.handle("save_var n 4").await.unwrap() else {
        panic!("expected saved variable");
    };
    assert_eq!(value, json!(4));
    assert_eq!(replaced, None);

    let CommandOutput::Executed(run) = shell
        .handle(r#"jump echo {"text": "hello {$who}"}"#)
        .await
        .unwrap()
    else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!("hello ada"));
    let CommandOutput::Executed(run) = shell.handle(r#"jump add {"a": "$n", "b": 1}"#).await.unwrap() else {
        panic!("expected execution");
    };
    assert_eq!(run.output, json!(5));

    let CommandOutput::Variable { value, .. } = shell.handle("get_var who").await.unwrap() else {
        panic!("expected variable");
    };
    assert_eq!(value, json!("ada"));
    let CommandOutput::Variables { vars } = shell.handle("list_vars").await.unwrap() else {
        panic!("expected variables");
    };
    assert_eq!(vars.keys().collect::<Vec<_>>(), vec!["who", "n"]);

    let CommandOutput::VarDeleted { value, .. } = shell.handle("delete_var who").await.unwrap() else {
        panic!("expected deletion");
    };
    assert_eq!(value, json!("ada"));
    assert!(matches!(
        shell.handle("get_var who").await,
        Err(ShellError::UnknownVariable(name)) if name == "who"
    ));
    assert!(matches!(
        shell.handle("delete_var who").await,
        Err(ShellError::UnknownVariable(_))
    ));
    assert!(matches!(
        shell.handle("save_var prev 1").await,
        Err(ShellError::Command(_))
    ));
}

#[tokio::test]
async fn test_shortcuts_lists_configured_and_runtime() {
    let shell = Fixture::new().shell();
    shell.handle("shortcut calc 0.2").await.unwrap();
    shell.handle("shortcut shout 0.0.2").await.unwrap();

    let CommandOutput::Shortcuts { entries } = shell.handle("shortcuts").await.unwrap() else {
        panic!("expected shortcuts");
    };
    let names: Vec<(&str, bool)> = entries.iter().map(|e| (e.alias.as_str(), e.runtime)).collect();
    assert_eq!(names, vec![("addup", false), ("calc", true), ("shout", true)]);
    assert!(matches!(entries[0].shortcut, Shortcut::Chain { .. }));
    assert_eq!(entries[2].shortcut, Shortcut::jump("0.0.2"));
}

#[tokio::test]
async fn test_alias_shadowed_by_earlier_rules_is_rejected() {
    let shell = Fixture::new().shell();
    for line in [
        "shortcut add 0.0",
        "shortcut math 0.0",
        "shortcut search 0.2",
        "shortcut daily 0.2",
        "shortcut 7 0.2",
    ] {
        match shell.handle(line).await {
            Err(ShellError::Command(message)) => assert!(message.contains("shadowed"), "{line}: {message}"),
            other => panic!("{line}: unexpected {other:?}"),
        }
    }
    assert!(shell.aliases().is_empty());
}

#[tokio::test]
async fn test_reject_clears_pending_until_next_run() {
    let shell = Fixture::new().shell();
    shell.handle(r#"jump add {"a": 1, "b": 1}"#).await.unwrap();

    let CommandOutput::Rejected { record } = shell.handle("reject 0.2.2 dave").await.unwrap() else {
        panic!("expected rejection");
    };
    assert_eq!(record.path, "math.add");
    assert_eq!(record.status, WorkflowStatus::Quarantine);
    let CommandOutput::Pending { queue } = shell.handle("pending").await.unwrap() else {
        panic!("expected pending");
    };
    assert!(queue.is_empty());
    assert!(matches!(
        shell.handle("reject add dave").await,
        Err(ShellError::Approval(ApprovalError::NotPending(_)))
    ));
    assert!(matches!(
        shell.handle("reject ping dave").await,
        Err(ShellError::Approval(ApprovalError::NotInQuarantine { .. }))
    ));

    shell.handle(r#"jump add {"a": 2, "b": 2}"#).await.unwrap();
    let CommandOutput::Pending { queue } = shell.handle("pending").await.unwrap() else {
        panic!("expected pending");
    };
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].path, "math.add");
    let output = shell.handle("approve add alice").await.unwrap();
    assert!(matches!(output, CommandOutput::Approved { changed: true, .. }));
}
