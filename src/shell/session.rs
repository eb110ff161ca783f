use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::ShellError;

use super::vars::{LAST_RESULT, PREV};

/// Executions kept for `history`; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 256;

/// One execution made in this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Position in the session, counting dropped entries.
    pub step: usize,
    pub node_id: String,
    pub args: Value,
    pub output: Value,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Command line that repeats this execution.
    pub fn command(&self) -> String {
        format!("jump {} {}", self.node_id, self.args)
    }
}

/// Per-shell state that outlives a single command: the navigation stack,
/// execution history, saved variables and the last result.
#[derive(Debug, Default)]
pub struct Session {
    stack: Vec<String>,
    history: VecDeque<HistoryEntry>,
    executions: usize,
    vars: IndexMap<String, Value>,
    last_result: Option<Value>,
}

impl Session {
    /// Note a node the user moved to. Repeated visits to the top are kept once.
    pub fn visit(&mut self, node_id: &str) {
        if self.stack.last().map(String::as_str) != Some(node_id) {
            self.stack.push(node_id.to_string());
        }
    }

    /// Step back one level. The first visited node is never popped.
    pub fn back(&mut self) -> Option<&str> {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.current()
    }

    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn record(&mut self, node_id: &str, args: Value, output: Value) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            step: self.executions,
            node_id: node_id.to_string(),
            args,
            output: output.clone(),
            at: Utc::now(),
        });
        self.executions += 1;
        self.last_result = Some(output);
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn last_result(&self) -> Option<Value> {
        self.last_result.clone()
    }

    /// Save a variable. Returns the value it replaced.
    pub fn set_var(&mut self, name: &str, value: Value) -> Result<Option<Value>, ShellError> {
        if is_reserved(name) {
            return Err(ShellError::Command(format!(
                "'{}' is set by the shell and cannot be saved",
                name
            )));
        }
        Ok(self.vars.insert(name.to_string(), value))
    }

    pub fn var(&self, name: &str) -> Result<&Value, ShellError> {
        self.vars
            .get(name)
            .ok_or_else(|| ShellError::UnknownVariable(name.to_string()))
    }

    pub fn remove_var(&mut self, name: &str) -> Result<Value, ShellError> {
        self.vars
            .shift_remove(name)
            .ok_or_else(|| ShellError::UnknownVariable(name.to_string()))
    }

    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }
}

/// Names the shell fills in itself: `prev`, `last_result`, `stepN_result`.
fn is_reserved(name: &str) -> bool {
    name == PREV
        || name == LAST_RESULT
        || name
            .strip_prefix("step")
            .and_then(|rest| rest.strip_suffix("_result"))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
