use std::fs;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use navshell::loader::DirSource;
use navshell::{
    AsyncFnCallable, CallableError, CallableRegistry, Shell, ShellSnapshot, SnapshotBuilder,
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const SYSTEM_FAMILY: &str = r#"{
    "name": "system",
    "description": "Core operations",
    "nodes": {
        "system": {"type": "Menu", "label": "System", "options": {"2": "system.tools", "10": "system.ping"}},
        "tools": {"type": "Menu", "label": "Tools", "options": {"2": "system.tools.echo"}},
        "tools.echo": {"type": "Callable", "label": "Echo", "function_name": "echo",
                       "args_schema": {"text": "string"}},
        "ping": {"type": "Callable", "label": "Ping", "function_name": "ping", "args_schema": {}}
    }
}"#;

pub const CONVERSATIONS_FAMILY: &str = r#"
name: conversations
parent: system
nodes:
  conversations:
    type: Menu
    prompt: Conversations
    options:
      "2": conversations.search
      "3": conversations.start
  search:
    type: Callable
    label: Search
    function_name: search
    args_schema:
      query: string
  start:
    type: Callable
    title: Start conversation
    function_name: start
    args_schema:
      title:
        type: string
        required: false
"#;

pub const MATH_FAMILY: &str = r#"
name = "math"

[nodes.math]
type = "Menu"
label = "Math"
options = { "2" = "math.add" }

[nodes.add]
type = "Callable"
label = "Add"
function_name = "add"
args_schema = { a = "integer", b = "integer" }

[nodes.slow]
type = "Callable"
label = "Slow"
function_name = "slow"
is_async = true
args_schema = {}
"#;

pub const NAV: &str = r#"{"nav_tree_order": ["system", "conversations", "math"]}"#;

pub const ZONES: &str = r#"{"zones": {"daily": {"description": "Everyday", "members": ["0.1.2", "math.add"]}}}"#;

pub const SHORTCUTS: &str = r#"{
    "shout": {"type": "jump", "target": "system.tools.echo"},
    "addup": {"type": "chain", "template": "math.add {\"a\": \"$a\", \"b\": 1} -> math.add {\"a\": \"$prev\", \"b\": \"$b\"}"}
}"#;

pub const NODES_CUSTOM: &str = r#"{
    "override_nodes": {
        "system.tools": {"label": "X"},
        "math": {"options": {"2": "math.add", "3": "math.mul"}}
    },
    "add_nodes": {
        "math.mul": {"type": "Callable", "label": "Multiply", "function_name": "mul",
                     "args_schema": {"a": "integer", "b": "integer"}}
    },
    "exclude_nodes": ["conversations.search"]
}"#;

/// A system tree and an (initially empty) user tree in a temp dir.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture { dir };
        fixture.write_system("families/system_family.json", SYSTEM_FAMILY);
        fixture.write_system("families/conversations_family.yaml", CONVERSATIONS_FAMILY);
        fixture.write_system("families/math_family.toml", MATH_FAMILY);
        fixture.write_system("nav.json", NAV);
        fixture.write_system("zones.json", ZONES);
        fixture.write_system("shortcuts.json", SHORTCUTS);
        fs::create_dir_all(fixture.user_dir()).unwrap();
        fixture
    }

    /// The fixture with the standard user customization applied.
    pub fn customized() -> Self {
        let fixture = Self::new();
        fixture.write_user("nodes_custom.json", NODES_CUSTOM);
        fixture
    }

    pub fn system_dir(&self) -> PathBuf {
        self.dir.path().join("system")
    }

    pub fn user_dir(&self) -> PathBuf {
        self.dir.path().join("user")
    }

    pub fn write_system(&self, rel: &str, content: &str) {
        write(&self.system_dir(), rel, content);
    }

    pub fn write_user(&self, rel: &str, content: &str) {
        write(&self.user_dir(), rel, content);
    }

    pub fn write_user_bytes(&self, rel: &str, content: &[u8]) {
        write(&self.user_dir(), rel, content);
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        self.try_snapshot().unwrap()
    }

    pub fn try_snapshot(&self) -> navshell::ShellResult<ShellSnapshot> {
        let system = DirSource::new(self.system_dir());
        let user = DirSource::new(self.user_dir());
        SnapshotBuilder::new(&system, Some(&user)).build(1)
    }

    pub fn shell(&self) -> Shell {
        Shell::builder(DirSource::new(self.system_dir()))
            .user_source(DirSource::new(self.user_dir()))
            .registry(registry())
            .build()
            .unwrap()
    }
}

fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

type CallFuture = Pin<Box<dyn std::future::Future<Output = Result<Value, CallableError>> + Send>>;

pub fn registry() -> CallableRegistry {
    let mut registry = CallableRegistry::new();
    registry
        .register_sync("echo", |args: Value| -> Result<Value, CallableError> {
            Ok(args["text"].clone())
        })
        .register_sync("ping", |_args: Value| -> Result<Value, CallableError> { Ok(json!("pong")) })
        .register_sync("search", |args: Value| -> Result<Value, CallableError> {
            Ok(json!([args["query"]]))
        })
        .register_sync("start", |_args: Value| -> Result<Value, CallableError> { Ok(json!({"id": 1})) })
        .register_sync("add", |args: Value| -> Result<Value, CallableError> {
            let a = args["a"].as_i64().ok_or_else(|| CallableError::InvalidInput("a".into()))?;
            let b = args["b"].as_i64().ok_or_else(|| CallableError::InvalidInput("b".into()))?;
            Ok(json!(a + b))
        })
        .register_sync("mul", |args: Value| -> Result<Value, CallableError> {
            let a = args["a"].as_i64().unwrap_or(0);
            let b = args["b"].as_i64().unwrap_or(0);
            Ok(json!(a * b))
        })
        .register_async(
            "slow",
            AsyncFnCallable::new(|_args: Value| -> CallFuture {
                Box::pin(async {
                    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                    Ok(Value::Null)
                })
            }),
        );
    registry
}
