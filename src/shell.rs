// src/shell.rs

//! Shell integration for the native editor binary
//!
//! Two files are generated per shell, both keyed by the wrapper function
//! name: a function that launches the editor detached from the terminal
//! (query flags such as `--version` still run in the foreground), and a
//! completion definition that offers common flags and, for
//! `--uninstall-extension`, the currently installed extension ids.
//!
//! fish picks the files up from its own `functions/` and `completions/`
//! directories. bash and zsh files go to a codeshift-owned directory and
//! must be sourced from the user's rc file.

use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Flags offered by the generated completions
const EDITOR_FLAGS: &[(&str, &str)] = &[
    ("new-window", "Open a new window"),
    ("reuse-window", "Open in the last active window"),
    ("goto", "Open a file at a line and column"),
    ("diff", "Compare two files"),
    ("wait", "Wait for the files to be closed"),
    ("list-extensions", "List installed extensions"),
    ("install-extension", "Install an extension by id or .vsix path"),
    ("uninstall-extension", "Uninstall an extension"),
    ("version", "Print version"),
    ("help", "Print usage"),
];

/// Flags whose output the user wants to see in the terminal
const FOREGROUND_FLAGS: &[&str] = &[
    "--version",
    "-v",
    "--help",
    "-h",
    "--list-extensions",
    "--install-extension",
    "--uninstall-extension",
    "--status",
    "--wait",
    "-w",
];

/// Supported interactive shells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
}

impl ShellKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }

    /// Parse a shell name or path such as `/usr/bin/fish`
    pub fn from_program(program: &str) -> Option<Self> {
        let name = Path::new(program).file_name()?.to_str()?;
        match name {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "fish" => Some(Self::Fish),
            _ => None,
        }
    }

    /// Shell named by `$SHELL`
    pub fn from_env() -> Option<Self> {
        std::env::var("SHELL").ok().as_deref().and_then(Self::from_program)
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Files written for one shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationFiles {
    pub shell: ShellKind,
    pub function: PathBuf,
    pub completion: PathBuf,
}

impl IntegrationFiles {
    /// Where the files go for `shell`
    pub fn locate(config: &MigrationConfig, shell: ShellKind) -> Self {
        let name = &config.shell.function_name;
        let paths = &config.paths;
        let (function, completion) = match shell {
            ShellKind::Fish => (
                paths.fish_dir.join("functions").join(format!("{name}.fish")),
                paths.fish_dir.join("completions").join(format!("{name}.fish")),
            ),
            ShellKind::Bash => (
                paths.shell_dir.join(format!("{name}.bash")),
                paths.shell_dir.join(format!("{name}-completion.bash")),
            ),
            ShellKind::Zsh => (
                paths.shell_dir.join(format!("{name}.zsh")),
                paths.shell_dir.join(format!("_{name}")),
            ),
        };
        Self {
            shell,
            function,
            completion,
        }
    }

    /// Lines the user adds to their rc file; fish needs none
    pub fn source_lines(&self) -> Vec<String> {
        match self.shell {
            ShellKind::Fish => Vec::new(),
            ShellKind::Bash | ShellKind::Zsh => vec![
                format!("source {}", posix_quote(&self.function.to_string_lossy())),
                format!("source {}", posix_quote(&self.completion.to_string_lossy())),
            ],
        }
    }
}

/// Generate and write the function and completion files
///
/// Existing files are overwritten, so regenerating is idempotent.
pub fn write_shell_integration(
    config: &MigrationConfig,
    shell: ShellKind,
    binary: &Path,
) -> Result<IntegrationFiles> {
    let files = IntegrationFiles::locate(config, shell);
    let name = &config.shell.function_name;

    write_file(&files.function, &render_function(shell, name, binary))?;
    write_file(&files.completion, &render_completion(shell, name, binary))?;

    info!(
        "Wrote {} integration: {}, {}",
        shell,
        files.function.display(),
        files.completion.display()
    );
    Ok(files)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Wrapper function launching `binary` detached
pub fn render_function(shell: ShellKind, name: &str, binary: &Path) -> String {
    let binary = binary.to_string_lossy();
    match shell {
        ShellKind::Fish => {
            let quoted = fish_quote(&binary);
            format!(
                "# Generated by codeshift; regenerate with `codeshift shell-integration`\n\
                 function {name} --wraps {quoted} --description 'Launch the editor detached from the terminal'\n\
                 \x20   switch \"$argv[1]\"\n\
                 \x20       case {flags}\n\
                 \x20           command {quoted} $argv\n\
                 \x20       case '*'\n\
                 \x20           command {quoted} $argv >/dev/null 2>&1 &\n\
                 \x20           disown\n\
                 \x20   end\n\
                 end\n",
                flags = FOREGROUND_FLAGS.join(" "),
            )
        }
        ShellKind::Bash | ShellKind::Zsh => {
            let quoted = posix_quote(&binary);
            format!(
                "# Generated by codeshift; regenerate with `codeshift shell-integration`\n\
                 {name}() {{\n\
                 \x20   case \"$1\" in\n\
                 \x20       {flags})\n\
                 \x20           command {quoted} \"$@\" ;;\n\
                 \x20       *)\n\
                 \x20           command {quoted} \"$@\" >/dev/null 2>&1 &\n\
                 \x20           disown ;;\n\
                 \x20   esac\n\
                 }}\n",
                flags = FOREGROUND_FLAGS.join("|"),
            )
        }
    }
}

/// Completion definition for the wrapper function
pub fn render_completion(shell: ShellKind, name: &str, binary: &Path) -> String {
    let binary = binary.to_string_lossy();
    let header = "# Generated by codeshift; regenerate with `codeshift shell-integration`\n";
    // zsh only reads #compdef from the first line
    let mut out = match shell {
        ShellKind::Zsh => format!("#compdef {name}\n{header}"),
        ShellKind::Fish | ShellKind::Bash => header.to_string(),
    };
    match shell {
        ShellKind::Fish => {
            let quoted = fish_quote(&binary);
            for (flag, description) in EDITOR_FLAGS {
                let extra = match *flag {
                    "uninstall-extension" => format!(
                        " -x -a '(command {} --list-extensions 2>/dev/null)'",
                        quoted.replace('\'', "\\'")
                    ),
                    "install-extension" | "goto" => " -r".to_string(),
                    _ => String::new(),
                };
                out.push_str(&format!(
                    "complete -c {name} -l {flag}{extra} -d {}\n",
                    fish_quote(description)
                ));
            }
        }
        ShellKind::Bash => {
            let func = completion_function_name(name);
            let quoted = posix_quote(&binary);
            let flags: Vec<String> = EDITOR_FLAGS.iter().map(|(f, _)| format!("--{f}")).collect();
            out.push_str(&format!(
                "{func}() {{\n\
                 \x20   local cur=\"${{COMP_WORDS[COMP_CWORD]}}\"\n\
                 \x20   local prev=\"${{COMP_WORDS[COMP_CWORD-1]}}\"\n\
                 \x20   if [[ \"$prev\" == \"--uninstall-extension\" ]]; then\n\
                 \x20       COMPREPLY=( $(compgen -W \"$(command {quoted} --list-extensions 2>/dev/null)\" -- \"$cur\") )\n\
                 \x20       return\n\
                 \x20   fi\n\
                 \x20   if [[ \"$cur\" == -* ]]; then\n\
                 \x20       COMPREPLY=( $(compgen -W \"{flags}\" -- \"$cur\") )\n\
                 \x20       return\n\
                 \x20   fi\n\
                 \x20   COMPREPLY=( $(compgen -f -- \"$cur\") )\n\
                 }}\n\
                 complete -o filenames -F {func} {name}\n",
                flags = flags.join(" "),
            ));
        }
        ShellKind::Zsh => {
            let func = completion_function_name(name);
            let quoted = posix_quote(&binary);
            out.push_str(&format!("{func}() {{\n    _arguments \\\n"));
            for (flag, description) in EDITOR_FLAGS {
                let action = match *flag {
                    "uninstall-extension" => format!(
                        ":extension:{{compadd -- $(command {} --list-extensions 2>/dev/null)}}",
                        quoted
                    ),
                    "install-extension" => ":extension:_files".to_string(),
                    "goto" => ":file:_files".to_string(),
                    _ => String::new(),
                };
                out.push_str(&format!(
                    "        {} \\\n",
                    posix_quote(&format!("--{flag}[{description}]{action}"))
                ));
            }
            out.push_str("        '*:file:_files'\n}\n");
            out.push_str(&format!("compdef {func} {name}\n"));
        }
    }
    out
}

/// `_name_complete` with characters bash rejects in identifiers replaced
fn completion_function_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("_{safe}_complete")
}

/// Single-quote for POSIX shells
pub fn posix_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Single-quote for fish
pub fn fish_quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
