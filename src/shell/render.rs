use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ExecutionError, ResolveError, ShellError};
use crate::nav::ComboAddress;
use crate::resolve::ResolvedAddress;
use crate::schema::{ArgType, Node, Shortcut};
use crate::store::ShellSnapshot;
use crate::tracker::{PendingApproval, WorkflowRecord, WorkflowStatus};

use super::session::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuOption {
    pub selector: String,
    pub target: String,
    pub label: String,
}

/// The `.0` view of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuView {
    pub node_id: String,
    pub address: String,
    pub coordinate: Option<String>,
    pub label: String,
    pub description: String,
    /// Callables get the `.1` action menu; menus only list their options.
    pub callable: bool,
    pub options: Vec<MenuOption>,
    pub zones: Vec<String>,
}

impl MenuView {
    pub fn build(snapshot: &ShellSnapshot, node: &Node, resolved: &ResolvedAddress) -> Self {
        let options = node
            .options()
            .map(|options| {
                options
                    .iter()
                    .map(|(selector, target)| MenuOption {
                        selector: selector.clone(),
                        target: target.clone(),
                        label: snapshot
                            .store
                            .get(target)
                            .map(|n| n.label.clone())
                            .unwrap_or_else(|| target.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        MenuView {
            node_id: node.id.clone(),
            address: resolved.address(),
            coordinate: resolved.coordinate.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
            callable: node.is_callable(),
            options,
            zones: snapshot.zones.zones_of(&node.id),
        }
    }
}

impl fmt::Display for MenuView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.node_id)?;
        if let Some(coordinate) = &self.coordinate {
            write!(f, " @ {}", coordinate)?;
        }
        writeln!(f)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        writeln!(f, "  0: menu")?;
        if self.callable {
            writeln!(f, "  1: review arguments / execute")?;
        }
        for option in &self.options {
            writeln!(f, "  {}: {} ({})", option.selector, option.label, option.target)?;
        }
        if !self.zones.is_empty() {
            writeln!(f, "  zones: {}", self.zones.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgField {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub required: bool,
}

/// The `.1.0` view of a callable: its binding, arguments and trust state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionView {
    pub node_id: String,
    pub address: String,
    pub label: String,
    pub description: String,
    pub function_name: String,
    pub is_async: bool,
    pub args: Vec<ArgField>,
    pub status: WorkflowStatus,
}

impl ActionView {
    pub fn build(node: &Node, resolved: &ResolvedAddress, status: WorkflowStatus) -> Result<Self, ShellError> {
        let binding = node
            .binding()
            .ok_or_else(|| ExecutionError::CallableRequired(node.id.clone()))?;
        Ok(ActionView {
            node_id: node.id.clone(),
            address: resolved.address(),
            label: node.label.clone(),
            description: node.description.clone(),
            function_name: binding.function_name.clone(),
            is_async: binding.is_async,
            args: binding
                .args_schema
                .fields
                .iter()
                .map(|(name, spec)| ArgField {
                    name: name.clone(),
                    arg_type: spec.arg_type,
                    required: spec.required,
                })
                .collect(),
            status,
        })
    }
}

impl fmt::Display for ActionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}] status: {}", self.label, self.node_id, self.status)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        let mode = if self.is_async { "async" } else { "sync" };
        writeln!(f, "  calls {} ({})", self.function_name, mode)?;
        if self.args.is_empty() {
            writeln!(f, "  no arguments")?;
        }
        for arg in &self.args {
            let required = if arg.required { "" } else { " (optional)" };
            writeln!(f, "  {}: {}{}", arg.name, arg.arg_type, required)?;
        }
        writeln!(f, "  1.1: execute")
    }
}

/// One line of a rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavLine {
    pub depth: usize,
    pub coordinate: Option<String>,
    pub node_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NavTree {
    pub scope: Option<String>,
    pub lines: Vec<NavLine>,
}

impl NavTree {
    /// Every nav family in coordinate order, then families without a
    /// coordinate that were not already shown.
    pub fn all(snapshot: &ShellSnapshot) -> Self {
        let mut tree = NavTree::default();
        let mut shown = HashSet::new();
        for entry in snapshot.nav.entries() {
            tree.push_subtree(snapshot, &entry.family, &mut shown);
        }
        let mut rest: Vec<&str> = snapshot
            .store
            .families()
            .map(|f| f.root())
            .filter(|root| !shown.contains(*root))
            .collect();
        rest.sort_unstable();
        for root in rest {
            if !shown.contains(root) {
                tree.push_subtree(snapshot, root, &mut shown);
            }
        }
        tree
    }

    /// A zone's members, a family's subtree, or the subtree of any
    /// resolvable address, tried in that order.
    pub fn scoped(snapshot: &ShellSnapshot, scope: &str) -> Result<Self, ShellError> {
        let mut tree = NavTree {
            scope: Some(scope.to_string()),
            lines: Vec::new(),
        };
        let mut shown = HashSet::new();
        if let Some(zone) = snapshot.zones.zone(scope) {
            for member in &zone.members {
                tree.push_subtree(snapshot, member, &mut shown);
            }
            return Ok(tree);
        }
        let root = match snapshot.store.family(scope) {
            Some(family) => family.root().to_string(),
            None => snapshot
                .resolver()
                .resolve(scope)
                .map_err(|_| ResolveError::not_found(scope))?
                .node_id,
        };
        tree.push_subtree(snapshot, &root, &mut shown);
        Ok(tree)
    }

    fn push_subtree(&mut self, snapshot: &ShellSnapshot, root: &str, shown: &mut HashSet<String>) {
        for (depth, id) in snapshot.store.subtree(root) {
            if !shown.insert(id.clone()) {
                continue;
            }
            let Some(node) = snapshot.store.get(&id) else {
                continue;
            };
            self.lines.push(NavLine {
                depth,
                coordinate: ComboAddress::derive(&snapshot.nav, &snapshot.store, &id).map(|c| c.coordinate),
                node_id: id.clone(),
                label: node.label.clone(),
            });
        }
    }
}

impl fmt::Display for NavTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            let indent = "  ".repeat(line.depth);
            match &line.coordinate {
                Some(coordinate) => writeln!(f, "{}{} {} ({})", indent, coordinate, line.label, line.node_id)?,
                None => writeln!(f, "{}{} ({})", indent, line.label, line.node_id)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionView {
    pub node_id: String,
    pub address: String,
    pub output: Value,
    pub status: WorkflowStatus,
    pub execution_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStepView {
    pub step: usize,
    pub node_id: String,
    pub args: Value,
    pub output: Value,
}

/// A configured shortcut or a runtime alias, as listed by `shortcuts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortcutEntry {
    pub alias: String,
    pub shortcut: Shortcut,
    pub runtime: bool,
}

/// Result of one shell command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandOutput {
    Menu(MenuView),
    ActionMenu(ActionView),
    Executed(ExecutionView),
    Chain { steps: Vec<ChainStepView> },
    Nav(NavTree),
    AliasRegistered {
        alias: String,
        target: String,
        replaced: Option<String>,
    },
    Approved {
        path: String,
        approver: String,
        changed: bool,
    },
    Revoked { record: WorkflowRecord },
    Pending { queue: Vec<PendingApproval> },
    Status {
        path: String,
        status: WorkflowStatus,
        record: Option<WorkflowRecord>,
    },
    Reloaded { generation: u64, warnings: usize },
    Shortcuts { entries: Vec<ShortcutEntry> },
    History { entries: Vec<HistoryEntry> },
    VarSaved {
        name: String,
        value: Value,
        replaced: Option<Value>,
    },
    Variable { name: String, value: Value },
    VarDeleted { name: String, value: Value },
    Variables { vars: IndexMap<String, Value> },
    Rejected { record: WorkflowRecord },
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Menu(view) => view.fmt(f),
            CommandOutput::ActionMenu(view) => view.fmt(f),
            CommandOutput::Executed(view) => writeln!(
                f,
                "{} -> {} [{} #{}]",
                view.address, view.output, view.status, view.execution_count
            ),
            CommandOutput::Chain { steps } => {
                for step in steps {
                    writeln!(f, "step {} {} -> {}", step.step, step.node_id, step.output)?;
                }
                Ok(())
            }
            CommandOutput::Nav(tree) => tree.fmt(f),
            CommandOutput::AliasRegistered { alias, target, replaced } => match replaced {
                Some(old) => writeln!(f, "{} -> {} (was {})", alias, target, old),
                None => writeln!(f, "{} -> {}", alias, target),
            },
            CommandOutput::Approved { path, approver, changed } => {
                if *changed {
                    writeln!(f, "{} approved by {}", path, approver)
                } else {
                    writeln!(f, "{} was already approved", path)
                }
            }
            CommandOutput::Revoked { record } => writeln!(f, "{} back in quarantine", record.path),
            CommandOutput::Pending { queue } => {
                if queue.is_empty() {
                    return writeln!(f, "no pending approvals");
                }
                for item in queue {
                    writeln!(f, "{} (queued {})", item.path, item.queued_at.to_rfc3339())?;
                }
                Ok(())
            }
            CommandOutput::Status { path, status, record } => match record {
                Some(r) => writeln!(
                    f,
                    "{}: {} ({} runs, {} failures{})",
                    path,
                    status,
                    r.execution_count,
                    r.failure_count,
                    if r.flagged_for_review { ", flagged" } else { "" }
                ),
                None => writeln!(f, "{}: {}", path, status),
            },
            CommandOutput::Reloaded { generation, warnings } => {
                writeln!(f, "generation {} active ({} warnings)", generation, warnings)
            }
            CommandOutput::Shortcuts { entries } => {
                if entries.is_empty() {
                    return writeln!(f, "no shortcuts");
                }
                for entry in entries {
                    let origin = if entry.runtime { " (session)" } else { "" };
                    match &entry.shortcut {
                        Shortcut::Jump { target } => writeln!(f, "{} -> {}{}", entry.alias, target, origin)?,
                        Shortcut::Chain { template } => {
                            writeln!(f, "{} => chain {}{}", entry.alias, template, origin)?
                        }
                    }
                }
                Ok(())
            }
            CommandOutput::History { entries } => {
                if entries.is_empty() {
                    return writeln!(f, "no executions yet");
                }
                for entry in entries {
                    writeln!(
                        f,
                        "{}. {} {} {} -> {}",
                        entry.step,
                        entry.at.to_rfc3339(),
                        entry.node_id,
                        entry.args,
                        entry.output
                    )?;
                    writeln!(f, "   {}", entry.command())?;
                }
                Ok(())
            }
            CommandOutput::VarSaved { name, value, replaced } => match replaced {
                Some(old) => writeln!(f, "${} = {} (was {})", name, value, old),
                None => writeln!(f, "${} = {}", name, value),
            },
            CommandOutput::Variable { name, value } => writeln!(f, "${} = {}", name, value),
            CommandOutput::VarDeleted { name, .. } => writeln!(f, "${} deleted", name),
            CommandOutput::Variables { vars } => {
                if vars.is_empty() {
                    return writeln!(f, "no variables");
                }
                for (name, value) in vars {
                    writeln!(f, "${} = {}", name, value)?;
                }
                Ok(())
            }
            CommandOutput::Rejected { record } => writeln!(f, "{} rejected, still in quarantine", record.path),
        }
    }
}
