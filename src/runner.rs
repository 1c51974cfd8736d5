// src/runner.rs

//! External process invocation
//!
//! Every external tool the workflow touches (package manager, packaged-format
//! tool, editor binary) is reached through [`CommandRunner`]. The system
//! implementation spawns real processes and resolves binaries with `which`;
//! tests substitute a scripted runner.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// An argv-style command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Prefix with a privilege escalation command such as `sudo`
    pub fn privileged(self, prefix: Option<&str>) -> Self {
        match prefix {
            Some(prefix) => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.program);
                args.extend(self.args);
                Self {
                    program: prefix.to_string(),
                    args,
                }
            }
            None => self,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Turn a non-zero exit into [`Error::CommandFailed`]
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                command: spec.to_string(),
                status: self.status_label(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Abstraction over process execution and binary lookup
pub trait CommandRunner {
    /// Run to completion and capture output. Spawn failures are errors;
    /// non-zero exits are reported in the output.
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Start a process without waiting for it
    fn spawn_detached(&mut self, spec: &CommandSpec) -> Result<()>;

    /// Resolve an executable name on the search path
    fn resolve(&self, binary: &str) -> Option<PathBuf>;

    /// Run and fail on non-zero exit
    fn run_checked(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec)?.check(spec)
    }
}

/// Runner that spawns real processes
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {}", spec);

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::CommandSpawn {
                command: spec.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&mut self, spec: &CommandSpec) -> Result<()> {
        debug!("Launching: {}", spec);
        Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| Error::CommandSpawn {
                command: spec.to_string(),
                source,
            })
    }

    fn resolve(&self, binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }
}

#[cfg(any(test, feature = "testing"))]
/// Replies for commands matched by substring
#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    output: CommandOutput,
}

#[cfg(any(test, feature = "testing"))]
/// Change to binary resolution after a matching command succeeds
#[derive(Debug, Clone)]
struct Effect {
    pattern: String,
    binary: String,
    path: Option<PathBuf>,
}

#[cfg(any(test, feature = "testing"))]
/// Runner that never spawns anything
///
/// Commands are recorded and answered from a list of substring rules; the
/// first rule whose pattern occurs in the rendered command wins, otherwise
/// the command succeeds with empty output. Binary resolution is a table that
/// commands can change when they succeed (an install makes a binary appear,
/// a removal makes it disappear).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    effects: Vec<Effect>,
    binaries: std::collections::HashMap<String, PathBuf>,
    history: Vec<CommandSpec>,
    launched: Vec<CommandSpec>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with exit code and stdout
    pub fn reply(mut self, pattern: &str, code: i32, stdout: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            output: CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: if code == 0 { String::new() } else { format!("{} failed", pattern) },
            },
        });
        self
    }

    /// Make `binary` resolvable at `path`
    pub fn with_binary(mut self, binary: &str, path: impl Into<PathBuf>) -> Self {
        self.binaries.insert(binary.to_string(), path.into());
        self
    }

    /// After a successful command containing `pattern`, resolve `binary` at `path`
    pub fn installs(mut self, pattern: &str, binary: &str, path: impl Into<PathBuf>) -> Self {
        self.effects.push(Effect {
            pattern: pattern.to_string(),
            binary: binary.to_string(),
            path: Some(path.into()),
        });
        self
    }

    /// After a successful command containing `pattern`, stop resolving `binary`
    pub fn removes(mut self, pattern: &str, binary: &str) -> Self {
        self.effects.push(Effect {
            pattern: pattern.to_string(),
            binary: binary.to_string(),
            path: None,
        });
        self
    }

    /// Every command run so far, in order
    pub fn history(&self) -> &[CommandSpec] {
        &self.history
    }

    /// Rendered command lines run so far
    pub fn command_lines(&self) -> Vec<String> {
        self.history.iter().map(ToString::to_string).collect()
    }

    /// Processes started with [`CommandRunner::spawn_detached`]
    pub fn launched(&self) -> &[CommandSpec] {
        &self.launched
    }
}

#[cfg(any(test, feature = "testing"))]
impl CommandRunner for ScriptedRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.to_string();
        self.history.push(spec.clone());

        let output = self
            .rules
            .iter()
            .find(|rule| line.contains(&rule.pattern))
            .map(|rule| rule.output.clone())
            .unwrap_or(CommandOutput {
                code: Some(0),
                ..Default::default()
            });

        if output.success() {
            for effect in self.effects.iter().filter(|e| line.contains(&e.pattern)) {
                match &effect.path {
                    Some(path) => {
                        self.binaries.insert(effect.binary.clone(), path.clone());
                    }
                    None => {
                        self.binaries.remove(&effect.binary);
                    }
                }
            }
        }

        Ok(output)
    }

    fn spawn_detached(&mut self, spec: &CommandSpec) -> Result<()> {
        self.launched.push(spec.clone());
        Ok(())
    }

    fn resolve(&self, binary: &str) -> Option<PathBuf> {
        self.binaries.get(binary).cloned()
    }
}
