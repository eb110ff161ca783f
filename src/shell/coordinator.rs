//! The shell coordinator.
//!
//! [`Shell`] (constructed via [`ShellBuilder`]) owns the active snapshot, the
//! runtime alias table, the session state, the dispatcher and the approver
//! service, and turns command lines into [`CommandOutput`]s.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ShellSettings;
use crate::error::{ExecutionError, ResolveError, ShellError, ShellResult};
use crate::events::{emit, EventSender, ShellEvent};
use crate::nav::is_numeric_segment;
use crate::exec::{CallableRegistry, Dispatcher, DEFAULT_TIMEOUT_SECS};
use crate::loader::{ConfigSource, DirSource};
use crate::resolve::{AliasTable, ResolvedAddress, View, DEFAULT_MAX_ALIAS_DEPTH};
use crate::schema::{Node, Shortcut};
use crate::store::{ShellSnapshot, SnapshotBuilder, SnapshotHandle};
use crate::tracker::{
    ApproverHandle, ApproverService, FileRecordStore, MemoryRecordStore, RecordStore, StatusTracker,
    WorkflowStatus, DEFAULT_FAILURE_THRESHOLD,
};

use super::command::{ChainStep, Command};
use super::render::{
    ActionView, ChainStepView, CommandOutput, ExecutionView, MenuView, NavTree, ShortcutEntry,
};
use super::session::Session;
use super::vars::ChainVars;

const APPROVAL_QUEUE_CAPACITY: usize = 64;

/// Interactive front end over one configuration.
pub struct Shell {
    system: Arc<dyn ConfigSource>,
    user: Option<Arc<dyn ConfigSource>>,
    nav_prefix: Option<String>,
    snapshot: SnapshotHandle,
    aliases: AliasTable,
    dispatcher: Dispatcher,
    approver: ApproverHandle,
    approver_task: JoinHandle<()>,
    max_alias_depth: usize,
    session: Mutex<Session>,
    events: Option<EventSender>,
}

impl Shell {
    pub fn builder(system: impl ConfigSource + 'static) -> ShellBuilder {
        ShellBuilder {
            system: Arc::new(system),
            user: None,
            nav_prefix: None,
            registry: CallableRegistry::new(),
            record_store: None,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
            events: None,
        }
    }

    /// Directory sources and record storage as named by `settings`.
    pub fn from_settings(settings: &ShellSettings, registry: CallableRegistry) -> ShellResult<ShellBuilder> {
        let mut builder = Shell::builder(DirSource::new(&settings.system_dir))
            .registry(registry)
            .nav_prefix(settings.nav_prefix.clone())
            .default_timeout(Duration::from_secs(settings.default_timeout_secs))
            .failure_threshold(settings.golden_failure_threshold)
            .max_alias_depth(settings.max_alias_depth);
        if let Some(dir) = &settings.user_dir {
            builder = builder.user_source(DirSource::new(dir));
        }
        if let Some(dir) = &settings.record_dir {
            builder = builder.record_store(Arc::new(FileRecordStore::new(dir)?));
        }
        Ok(builder)
    }

    /// Parse and run one command line.
    pub async fn handle(&self, line: &str) -> ShellResult<CommandOutput> {
        let command = Command::parse(line)?;
        debug!(?command, "handling command");
        self.run(command).await
    }

    pub async fn run(&self, command: Command) -> ShellResult<CommandOutput> {
        match command {
            Command::Jump { address, args } => self.jump(&address, args).await,
            Command::Chain { steps } => self.chain(steps).await,
            Command::Nav { scope } => {
                let snapshot = self.snapshot.load();
                let tree = match scope {
                    Some(scope) => NavTree::scoped(&snapshot, &scope)?,
                    None => NavTree::all(&snapshot),
                };
                Ok(CommandOutput::Nav(tree))
            }
            Command::Shortcut { alias, target } => self.register_alias(&alias, &target),
            Command::Shortcuts => Ok(CommandOutput::Shortcuts {
                entries: self.shortcut_entries(),
            }),
            Command::Back => {
                let current = self
                    .session
                    .lock()
                    .back()
                    .map(str::to_string)
                    .ok_or_else(|| ShellError::Command("no navigation history".to_string()))?;
                self.show_menu(&current)
            }
            Command::Menu => {
                let current = self.session.lock().current().map(str::to_string);
                let target = self.nearest_menu(current.as_deref())?;
                self.session.lock().visit(&target);
                self.show_menu(&target)
            }
            Command::History => Ok(CommandOutput::History {
                entries: self.session.lock().history().cloned().collect(),
            }),
            Command::SaveVar { name, value } => {
                let replaced = self.session.lock().set_var(&name, value.clone())?;
                debug!(name = %name, "variable saved");
                Ok(CommandOutput::VarSaved { name, value, replaced })
            }
            Command::GetVar { name } => {
                let value = self.session.lock().var(&name)?.clone();
                Ok(CommandOutput::Variable { name, value })
            }
            Command::DeleteVar { name } => {
                let value = self.session.lock().remove_var(&name)?;
                Ok(CommandOutput::VarDeleted { name, value })
            }
            Command::ListVars => Ok(CommandOutput::Variables {
                vars: self.session.lock().vars().clone(),
            }),
            Command::Approve { path, approver } => {
                let path = self.canonical_path(&path);
                let outcome = self.approver.approve(&path, &approver).await?;
                Ok(CommandOutput::Approved {
                    changed: outcome.changed(),
                    approver: outcome.record().approved_by.clone().unwrap_or(approver),
                    path,
                })
            }
            Command::Reject { path, actor } => {
                let path = self.canonical_path(&path);
                let record = self.approver.reject(&path, &actor).await?;
                Ok(CommandOutput::Rejected { record })
            }
            Command::Revoke { path, actor } => {
                let path = self.canonical_path(&path);
                let record = self.approver.revoke(&path, &actor).await?;
                Ok(CommandOutput::Revoked { record })
            }
            Command::Pending => Ok(CommandOutput::Pending {
                queue: self.approver.pending().await?,
            }),
            Command::Status { path } => {
                let path = self.canonical_path(&path);
                let record = self.dispatcher.tracker().record(&path).await?;
                Ok(CommandOutput::Status {
                    status: record.as_ref().map(|r| r.status).unwrap_or(WorkflowStatus::Unran),
                    record,
                    path,
                })
            }
            Command::Reload => {
                let snapshot = self.reload().await?;
                Ok(CommandOutput::Reloaded {
                    generation: snapshot.generation,
                    warnings: snapshot.warnings.len(),
                })
            }
        }
    }

    /// The active snapshot.
    pub fn snapshot(&self) -> Arc<ShellSnapshot> {
        self.snapshot.load()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn tracker(&self) -> &Arc<StatusTracker> {
        self.dispatcher.tracker()
    }

    pub fn approver(&self) -> &ApproverHandle {
        &self.approver
    }

    /// Resolve against the active snapshot, runtime aliases included.
    pub fn resolve(&self, token: &str) -> Result<ResolvedAddress, ResolveError> {
        let snapshot = self.snapshot.load();
        self.resolve_in(&snapshot, token)
    }

    /// Re-read every source, build the next generation and swap it in.
    /// On failure the active snapshot is kept.
    pub async fn reload(&self) -> ShellResult<Arc<ShellSnapshot>> {
        let generation = self.snapshot.generation() + 1;
        let system = self.system.clone();
        let user = self.user.clone();
        let prefix = self.nav_prefix.clone();
        let next = tokio::task::spawn_blocking(move || build_snapshot(&*system, user.as_deref(), prefix, generation))
            .await
            .map_err(|e| ShellError::Command(format!("reload task failed: {}", e)))??;
        let warnings = next.warnings.len();
        self.snapshot.swap(next);
        info!(generation, warnings, "snapshot activated");
        emit(
            self.events.as_ref(),
            ShellEvent::SnapshotActivated {
                generation,
                warnings,
                timestamp: Utc::now(),
            },
        );
        Ok(self.snapshot.load())
    }

    /// Stop the approver service once pending requests are answered.
    pub async fn shutdown(self) {
        let Shell {
            approver,
            approver_task,
            ..
        } = self;
        drop(approver);
        let _ = approver_task.await;
    }

    fn resolve_in(&self, snapshot: &ShellSnapshot, token: &str) -> Result<ResolvedAddress, ResolveError> {
        snapshot
            .resolver()
            .with_aliases(&self.aliases)
            .with_max_alias_depth(self.max_alias_depth)
            .resolve(token)
    }

    /// Records are keyed by node id; addresses are accepted where they resolve.
    fn canonical_path(&self, path: &str) -> String {
        self.resolve(path)
            .map(|r| r.node_id)
            .unwrap_or_else(|_| path.to_string())
    }

    fn register_alias(&self, alias: &str, target: &str) -> ShellResult<CommandOutput> {
        if alias.is_empty() || alias.contains('.') {
            return Err(ShellError::Command(format!(
                "alias '{}' must be a single segment",
                alias
            )));
        }
        let snapshot = self.snapshot.load();
        if let Some(owner) = shadowing(&snapshot, alias) {
            return Err(ShellError::Command(format!(
                "alias '{}' is shadowed by {}",
                alias, owner
            )));
        }
        // resolving now reports a bad target before anyone relies on it
        self.resolve_in(&snapshot, target)?;
        let replaced = self.aliases.register(alias, target);
        info!(alias, target, "alias registered");
        Ok(CommandOutput::AliasRegistered {
            alias: alias.to_string(),
            target: target.to_string(),
            replaced,
        })
    }

    /// Configured shortcuts and runtime aliases by name. A runtime alias
    /// replaces a configured shortcut of the same name.
    fn shortcut_entries(&self) -> Vec<ShortcutEntry> {
        let snapshot = self.snapshot.load();
        let mut entries: BTreeMap<String, ShortcutEntry> = snapshot
            .shortcuts
            .iter()
            .map(|(alias, shortcut)| {
                let entry = ShortcutEntry {
                    alias: alias.clone(),
                    shortcut: shortcut.clone(),
                    runtime: false,
                };
                (alias.clone(), entry)
            })
            .collect();
        for (alias, target) in self.aliases.list() {
            let entry = ShortcutEntry {
                alias: alias.clone(),
                shortcut: Shortcut::jump(target),
                runtime: true,
            };
            entries.insert(alias, entry);
        }
        entries.into_values().collect()
    }

    fn show_menu(&self, node_id: &str) -> ShellResult<CommandOutput> {
        let snapshot = self.snapshot.load();
        let resolved = self.resolve_in(&snapshot, node_id)?;
        let node = node_of(&snapshot, &resolved)?;
        Ok(CommandOutput::Menu(MenuView::build(&snapshot, node, &resolved)))
    }

    /// The current node if it is a menu, else its first menu parent, else
    /// the first family in nav order.
    fn nearest_menu(&self, current: Option<&str>) -> ShellResult<String> {
        let snapshot = self.snapshot.load();
        if let Some(id) = current {
            if snapshot.store.get(id).is_some_and(|n| !n.is_callable()) {
                return Ok(id.to_string());
            }
            let parent = snapshot
                .store
                .parents(id)
                .into_iter()
                .find(|p| snapshot.store.get(p).is_some_and(|n| !n.is_callable()));
            if let Some(parent) = parent {
                return Ok(parent);
            }
        }
        snapshot
            .nav
            .entries()
            .iter()
            .find_map(|e| snapshot.store.family(&e.family))
            .map(|family| family.root().to_string())
            .ok_or_else(|| ShellError::Command("no menu to return to".to_string()))
    }

    async fn jump(&self, address: &str, args: Option<Value>) -> ShellResult<CommandOutput> {
        let snapshot = self.snapshot.load();
        let resolved = self.resolve_in(&snapshot, address)?;
        let node = node_of(&snapshot, &resolved)?;

        let execute = match (resolved.view, &args) {
            (View::Execute, _) => true,
            (_, Some(_)) => true,
            (View::Menu, None) => {
                self.session.lock().visit(&node.id);
                return Ok(CommandOutput::Menu(MenuView::build(&snapshot, node, &resolved)));
            }
            (View::ActionMenu, None) => false,
        };
        if !node.is_callable() {
            return Err(ExecutionError::CallableRequired(node.id.clone()).into());
        }
        if !execute {
            let status = self.dispatcher.tracker().status(&node.id).await?;
            self.session.lock().visit(&node.id);
            return Ok(CommandOutput::ActionMenu(ActionView::build(node, &resolved, status)?));
        }

        let vars = self.seeded_vars()?;
        let args = vars.substitute(args.unwrap_or_else(|| json!({})));
        let outcome = self.dispatcher.execute(node, args.clone(), None).await?;
        {
            let mut session = self.session.lock();
            session.visit(&node.id);
            session.record(&node.id, args, outcome.output.clone());
        }
        Ok(CommandOutput::Executed(ExecutionView {
            node_id: outcome.node_id,
            address: resolved.address(),
            output: outcome.output,
            status: outcome.record.status,
            execution_count: outcome.record.execution_count,
        }))
    }

    async fn chain(&self, steps: Vec<ChainStep>) -> ShellResult<CommandOutput> {
        let snapshot = self.snapshot.load();
        let mut vars = self.seeded_vars()?;
        let steps = expand_chain_shortcut(&snapshot, steps, &mut vars)?;

        let mut views = Vec::with_capacity(steps.len());
        for (i, step) in steps.into_iter().enumerate() {
            let number = i + 1;
            let view = self
                .chain_step(&snapshot, &vars, step, number)
                .await
                .map_err(|e| ShellError::ChainStep {
                    step: number,
                    source: Box::new(e),
                })?;
            vars.record_step(number, &view.output);
            self.session
                .lock()
                .record(&view.node_id, view.args.clone(), view.output.clone());
            views.push(view);
        }
        info!(steps = views.len(), "chain finished");
        Ok(CommandOutput::Chain { steps: views })
    }

    /// Saved variables plus `$prev` / `$last_result` from the last execution.
    fn seeded_vars(&self) -> ShellResult<ChainVars> {
        let session = self.session.lock();
        Ok(ChainVars::new()?
            .with_values(session.vars())
            .with_last_result(session.last_result()))
    }

    async fn chain_step(
        &self,
        snapshot: &ShellSnapshot,
        vars: &ChainVars,
        step: ChainStep,
        number: usize,
    ) -> ShellResult<ChainStepView> {
        let resolved = self.resolve_in(snapshot, &step.address)?;
        let node = node_of(snapshot, &resolved)?;
        let args = vars.substitute(step.args.unwrap_or_else(|| json!({})));
        let outcome = self.dispatcher.execute(node, args.clone(), None).await?;
        Ok(ChainStepView {
            step: number,
            node_id: outcome.node_id,
            args,
            output: outcome.output,
        })
    }
}

/// `chain <alias> [args]` where `alias` names a chain shortcut expands to
/// the shortcut's template; the args object's fields become placeholders.
fn expand_chain_shortcut(
    snapshot: &ShellSnapshot,
    steps: Vec<ChainStep>,
    vars: &mut ChainVars,
) -> ShellResult<Vec<ChainStep>> {
    let [only] = steps.as_slice() else {
        return Ok(steps);
    };
    let Some(Shortcut::Chain { template }) = snapshot.shortcuts.get(&only.address) else {
        return Ok(steps);
    };
    if let Some(Value::Object(fields)) = &only.args {
        for (name, value) in fields {
            vars.set(name.clone(), value.clone());
        }
    }
    debug!(alias = %only.address, template = %template, "expanding chain shortcut");
    match Command::parse(&format!("chain {}", template))? {
        Command::Chain { steps } => Ok(steps),
        _ => Err(ShellError::Command(format!("shortcut '{}' is not a chain", only.address))),
    }
}

/// What already answers `alias` before the alias rule is reached.
fn shadowing(snapshot: &ShellSnapshot, alias: &str) -> Option<String> {
    if is_numeric_segment(alias) {
        return Some("the numeric coordinate rule".to_string());
    }
    if snapshot.zones.has_zone(alias) {
        return Some(format!("zone '{}'", alias));
    }
    match snapshot.resolver().resolve_direct(alias) {
        Ok(resolved) => Some(format!("node {}", resolved.node_id)),
        Err(ResolveError::Ambiguous { candidates, .. }) => Some(format!("nodes {}", candidates.join(", "))),
        Err(ResolveError::NotFound { .. }) => None,
    }
}

fn node_of<'s>(snapshot: &'s ShellSnapshot, resolved: &ResolvedAddress) -> Result<&'s Node, ResolveError> {
    snapshot
        .store
        .get(&resolved.node_id)
        .ok_or_else(|| ResolveError::not_found(&resolved.node_id))
}

fn build_snapshot(
    system: &dyn ConfigSource,
    user: Option<&dyn ConfigSource>,
    nav_prefix: Option<String>,
    generation: u64,
) -> ShellResult<ShellSnapshot> {
    let mut builder = SnapshotBuilder::new(system, user);
    if let Some(prefix) = nav_prefix {
        builder = builder.with_nav_prefix(prefix);
    }
    builder.build(generation)
}

/// Builder for a [`Shell`].
pub struct ShellBuilder {
    system: Arc<dyn ConfigSource>,
    user: Option<Arc<dyn ConfigSource>>,
    nav_prefix: Option<String>,
    registry: CallableRegistry,
    record_store: Option<Arc<dyn RecordStore>>,
    default_timeout: Duration,
    failure_threshold: u64,
    max_alias_depth: usize,
    events: Option<EventSender>,
}

impl ShellBuilder {
    pub fn user_source(mut self, user: impl ConfigSource + 'static) -> Self {
        self.user = Some(Arc::new(user));
        self
    }

    pub fn nav_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.nav_prefix = Some(prefix.into());
        self
    }

    pub fn registry(mut self, registry: CallableRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Defaults to in-memory records.
    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn failure_threshold(mut self, threshold: u64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth;
        self
    }

    pub fn events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Build the first snapshot and start the approver service. Must be
    /// called inside a tokio runtime.
    pub fn build(self) -> ShellResult<Shell> {
        let snapshot = build_snapshot(&*self.system, self.user.as_deref(), self.nav_prefix.clone(), 1)?;
        info!(
            system = %self.system.describe(),
            user = ?self.user.as_ref().map(|u| u.describe()),
            warnings = snapshot.warnings.len(),
            "shell configuration loaded"
        );
        emit(
            self.events.as_ref(),
            ShellEvent::SnapshotActivated {
                generation: snapshot.generation,
                warnings: snapshot.warnings.len(),
                timestamp: Utc::now(),
            },
        );

        let store = self
            .record_store
            .unwrap_or_else(|| Arc::new(MemoryRecordStore::new()));
        let mut tracker = StatusTracker::new(store, self.failure_threshold);
        let mut dispatcher_events = None;
        if let Some(sender) = &self.events {
            tracker = tracker.with_events(sender.clone());
            dispatcher_events = Some(sender.clone());
        }
        let tracker = Arc::new(tracker);
        let mut dispatcher = Dispatcher::new(Arc::new(self.registry), tracker.clone())
            .with_default_timeout(self.default_timeout);
        if let Some(sender) = dispatcher_events {
            dispatcher = dispatcher.with_events(sender);
        }
        let (approver, approver_task) = ApproverService::spawn(tracker, APPROVAL_QUEUE_CAPACITY);

        Ok(Shell {
            system: self.system,
            user: self.user,
            nav_prefix: self.nav_prefix,
            snapshot: SnapshotHandle::new(snapshot),
            aliases: AliasTable::new(),
            dispatcher,
            approver,
            approver_task,
            max_alias_depth: self.max_alias_depth,
            session: Mutex::new(Session::default()),
            events: self.events,
        })
    }
}
