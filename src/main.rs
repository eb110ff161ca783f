use std::pin::Pin;

use navshell::loader::MemorySource;
use navshell::schema::ConfigFormat;
use navshell::store::{NAV_DOC, SHORTCUTS_DOC, ZONES_DOC};
use navshell::{
    create_event_channel, AsyncFnCallable, CallableError, CallableRegistry, Shell, ShellSettings,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

type CallFuture = Pin<Box<dyn std::future::Future<Output = Result<Value, CallableError>> + Send>>;

fn demo_registry() -> CallableRegistry {
    let mut registry = CallableRegistry::new();
    registry
        .register_sync("echo", |args: Value| -> Result<Value, CallableError> {
            Ok(args.get("text").cloned().unwrap_or(Value::Null))
        })
        .register_sync("add", |args: Value| -> Result<Value, CallableError> {
            let a = args["a"].as_i64().ok_or_else(|| CallableError::InvalidInput("a".into()))?;
            let b = args["b"].as_i64().ok_or_else(|| CallableError::InvalidInput("b".into()))?;
            Ok(json!(a + b))
        })
        .register_async(
            "shout",
            AsyncFnCallable::new(|args: Value| -> CallFuture {
                Box::pin(async move {
                    let text = args["text"].as_str().unwrap_or_default().to_uppercase();
                    Ok(json!(format!("{}!", text)))
                })
            }),
        );
    registry
}

fn demo_source() -> MemorySource {
    MemorySource::new()
        .with_family(
            "system",
            ConfigFormat::Yaml,
            r#"
name: system
description: Built-in operations
nodes:
  system:
    type: Menu
    label: System
    options:
      "2": system.echo
  echo:
    type: Callable
    label: Echo
    function_name: echo
    args_schema:
      text: string
"#,
        )
        .with_family(
            "math",
            ConfigFormat::Json,
            r#"{
                "name": "math",
                "nodes": {
                    "math": {"type": "Menu", "label": "Math", "options": {"2": "math.add"}},
                    "add": {"type": "Callable", "label": "Add", "function_name": "add",
                            "args_schema": {"a": "integer", "b": "integer"}},
                    "shout": {"type": "Callable", "label": "Shout", "function_name": "shout",
                              "is_async": true, "args_schema": {"text": "string"}}
                }
            }"#,
        )
        .with_document(NAV_DOC, ConfigFormat::Json, r#"{"nav_tree_order": ["system", "math"]}"#)
        .with_document(ZONES_DOC, ConfigFormat::Json, r#"{"zones": {"daily": {"members": ["math.add", "echo"]}}}"#)
        .with_document(
            SHORTCUTS_DOC,
            ConfigFormat::Toml,
            "[sum]\ntype = \"jump\"\ntarget = \"math.add\"\n\n[greet]\ntype = \"chain\"\ntemplate = 'system.echo {\"text\": \"{$name}\"} -> math.shout {\"text\": \"$prev\"}'\n",
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (events, mut receiver) = create_event_channel();
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            tracing::debug!(?event, "shell event");
        }
    });

    // With a settings file, read commands from stdin; otherwise run the demo.
    if let Some(path) = std::env::args().nth(1) {
        let settings = ShellSettings::load(&path).await?;
        let shell = Shell::from_settings(&settings, demo_registry())?.events(events).build()?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match shell.handle(&line).await {
                Ok(output) => print!("{}", output),
                Err(err) => println!("error: {}", err),
            }
        }
        shell.shutdown().await;
        return Ok(());
    }

    println!("=== navshell demo ===\n");
    let shell = Shell::builder(demo_source())
        .registry(demo_registry())
        .events(events)
        .build()?;

    for warning in &shell.snapshot().warnings {
        println!("warning: {}", warning);
    }

    for line in [
        "nav",
        "jump 0.1",
        "jump 0.1.2.1",
        r#"jump 0.1.2.1.1 {"a": 2, "b": 3}"#,
        r#"jump sum {"a": 1, "b": "x"}"#,
        r#"chain greet {"name": "world"}"#,
        "nav daily",
        "shortcut s math.shout",
        "shortcuts",
        "save_var who world",
        r#"jump s {"text": "hello {$who}"}"#,
        r#"jump s {"text": "$last_result"}"#,
        "history",
        "back",
        "menu",
        "pending",
        "reject math.shout carol",
        "approve math.add alice",
        "approve math.add bob",
        "status 0.1.2",
    ] {
        println!("> {}", line);
        match shell.handle(line).await {
            Ok(output) => println!("{}", output),
            Err(err) => println!("error: {}\n", err),
        }
    }

    shell.shutdown().await;
    Ok(())
}
