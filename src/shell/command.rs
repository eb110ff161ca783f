use serde_json::Value;

use crate::error::ShellError;

/// Separator between chain steps.
pub const CHAIN_SEPARATOR: &str = "->";

/// One `<address> [json-args]` step of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStep {
    pub address: String,
    pub args: Option<Value>,
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Jump { address: String, args: Option<Value> },
    Chain { steps: Vec<ChainStep> },
    Nav { scope: Option<String> },
    Shortcut { alias: String, target: String },
    Shortcuts,
    Back,
    Menu,
    History,
    SaveVar { name: String, value: Value },
    GetVar { name: String },
    DeleteVar { name: String },
    ListVars,
    Approve { path: String, approver: String },
    Reject { path: String, actor: String },
    Revoke { path: String, actor: String },
    Pending,
    Status { path: String },
    Reload,
}

impl Command {
    /// Parse one input line.
    pub fn parse(input: &str) -> Result<Command, ShellError> {
        let input = input.trim();
        let (verb, rest) = split_word(input);
        match verb {
            "" => Err(ShellError::Command("empty command".to_string())),
            "jump" => {
                let step = parse_step(rest)
                    .ok_or_else(|| ShellError::Command("jump requires an address".to_string()))??;
                Ok(Command::Jump {
                    address: step.address,
                    args: step.args,
                })
            }
            "chain" => {
                if rest.is_empty() {
                    return Err(ShellError::Command("chain requires at least one step".to_string()));
                }
                let mut steps = Vec::new();
                for (i, part) in split_chain(rest).into_iter().enumerate() {
                    let step = parse_step(part).ok_or_else(|| {
                        ShellError::Command(format!("chain step {} is empty", i + 1))
                    })?;
                    steps.push(step.map_err(|e| ShellError::ChainStep {
                        step: i + 1,
                        source: Box::new(e),
                    })?);
                }
                Ok(Command::Chain { steps })
            }
            "nav" => Ok(Command::Nav {
                scope: (!rest.is_empty()).then(|| rest.to_string()),
            }),
            "shortcut" => {
                let [alias, target] = two_words(verb, rest, "<alias> <target>")?;
                Ok(Command::Shortcut { alias, target })
            }
            "shortcuts" => no_args(verb, rest, Command::Shortcuts),
            "back" => no_args(verb, rest, Command::Back),
            "menu" => no_args(verb, rest, Command::Menu),
            "history" => no_args(verb, rest, Command::History),
            "save_var" => {
                let (name, raw) = split_word(rest);
                if name.is_empty() || raw.is_empty() {
                    return Err(ShellError::Command("usage: save_var <name> <value>".to_string()));
                }
                Ok(Command::SaveVar {
                    name: name.to_string(),
                    value: parse_value(raw)?,
                })
            }
            "get_var" => Ok(Command::GetVar {
                name: one_word(verb, rest, "<name>")?,
            }),
            "delete_var" => Ok(Command::DeleteVar {
                name: one_word(verb, rest, "<name>")?,
            }),
            "list_vars" => no_args(verb, rest, Command::ListVars),
            "approve" => {
                let [path, approver] = two_words(verb, rest, "<path> <approver>")?;
                Ok(Command::Approve { path, approver })
            }
            "reject" => {
                let [path, actor] = two_words(verb, rest, "<path> <actor>")?;
                Ok(Command::Reject { path, actor })
            }
            "revoke" => {
                let [path, actor] = two_words(verb, rest, "<path> <actor>")?;
                Ok(Command::Revoke { path, actor })
            }
            "pending" => no_args(verb, rest, Command::Pending),
            "status" => Ok(Command::Status {
                path: one_word(verb, rest, "<path>")?,
            }),
            "reload" => no_args(verb, rest, Command::Reload),
            other => Err(ShellError::Command(format!("unknown command: {}", other))),
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

/// Split chain text at separators that sit outside JSON strings, objects
/// and arrays.
fn split_chain(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let separator = CHAIN_SEPARATOR.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.saturating_sub(1),
                _ if depth == 0 && bytes[i..].starts_with(separator) => {
                    parts.push(&text[start..i]);
                    i += separator.len();
                    start = i;
                    continue;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

/// JSON when the text is JSON; other bare text is taken as a string.
fn parse_value(raw: &str) -> Result<Value, ShellError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Ok(value),
        Err(e) if raw.starts_with(|c| matches!(c, '{' | '[' | '"')) => {
            Err(ShellError::InvalidArguments(format!("{}: {}", raw, e)))
        }
        Err(_) => Ok(Value::String(raw.to_string())),
    }
}

/// `None` when the step text is blank.
fn parse_step(text: &str) -> Option<Result<ChainStep, ShellError>> {
    let (address, raw_args) = split_word(text);
    if address.is_empty() {
        return None;
    }
    let args = if raw_args.is_empty() {
        Ok(None)
    } else {
        serde_json::from_str::<Value>(raw_args)
            .map(Some)
            .map_err(|e| ShellError::InvalidArguments(format!("{}: {}", raw_args, e)))
    };
    Some(args.map(|args| ChainStep {
        address: address.to_string(),
        args,
    }))
}

fn one_word(verb: &str, rest: &str, usage: &str) -> Result<String, ShellError> {
    let (word, extra) = split_word(rest);
    if word.is_empty() || !extra.is_empty() {
        return Err(ShellError::Command(format!("usage: {} {}", verb, usage)));
    }
    Ok(word.to_string())
}

fn two_words(verb: &str, rest: &str, usage: &str) -> Result<[String; 2], ShellError> {
    let (first, tail) = split_word(rest);
    let (second, extra) = split_word(tail);
    if first.is_empty() || second.is_empty() || !extra.is_empty() {
        return Err(ShellError::Command(format!("usage: {} {}", verb, usage)));
    }
    Ok([first.to_string(), second.to_string()])
}

fn no_args(verb: &str, rest: &str, command: Command) -> Result<Command, ShellError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ShellError::Command(format!("{} takes no arguments", verb)))
    }
}
