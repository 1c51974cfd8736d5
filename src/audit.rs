// src/audit.rs

//! Audit log viewer for the chat CLI
//!
//! The chat CLI writes one newline-delimited JSON file per session. Each line
//! is an event with a timestamp, the session id, an event type, and a free-form
//! data object. When the editor runs from the packaged format, the data
//! directory lives inside the package's private home, so that location is
//! checked before the regular XDG data directory.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Longest user input shown in a summary
pub const INPUT_PREVIEW_CHARS: usize = 100;
/// Longest tool output shown in a summary
pub const OUTPUT_PREVIEW_CHARS: usize = 200;
/// Sessions shown when no limit is given
pub const DEFAULT_SESSION_LIMIT: usize = 5;

/// One line of a session file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: DateTime<FixedOffset>,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AuditEvent {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    UserInput,
    ToolExecuteStart,
    ToolExecuteEnd,
    SessionEnd,
    #[serde(other)]
    Other,
}

/// Find the audit directory for `app`
///
/// The packaged editor's private home wins over the XDG data directory. The
/// XDG candidate is only returned when it exists.
pub fn find_audit_directory(home: &Path, xdg_data_home: Option<&Path>, app: &str) -> Option<PathBuf> {
    let pattern = format!(
        "{}/snap/code/*/.local/share/{}/audit",
        glob::Pattern::escape(&home.to_string_lossy()),
        glob::Pattern::escape(app)
    );
    match glob::glob(&pattern) {
        Ok(mut paths) => {
            if let Some(found) = paths.find_map(|entry| entry.ok()) {
                debug!("Found packaged audit directory {}", found.display());
                return Some(found);
            }
        }
        Err(e) => warn!("Invalid audit search pattern {}: {}", pattern, e),
    }

    let data_home = xdg_data_home
        .map(Path::to_path_buf)
        .unwrap_or_else(|| home.join(".local/share"));
    let candidate = data_home.join(app).join("audit");
    candidate.is_dir().then_some(candidate)
}

/// Look up the audit directory from the environment
pub fn locate_audit_directory(app: &str) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let xdg = std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    find_audit_directory(&home, xdg.as_deref(), app)
}

/// Session files in `dir`, newest modification time first
pub fn list_session_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with("session-") && name.ends_with(".jsonl")) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, entry.path()));
    }

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Parse every event in a session file
///
/// Malformed lines are logged and skipped.
pub fn load_session(path: &Path) -> Result<Vec<AuditEvent>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(parse_events(&content, path))
}

fn parse_events(content: &str, origin: &Path) -> Vec<AuditEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed line {} in {}: {}", index + 1, origin.display(), e);
                None
            }
        })
        .collect()
}

/// A tool call from start to (possibly) finish
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolExecution {
    pub tool_name: String,
    pub mcp_server: Option<String>,
    pub status: Option<String>,
    pub output: Option<String>,
    pub duration_ms: Option<u64>,
}

impl ToolExecution {
    pub fn is_mcp(&self) -> bool {
        self.mcp_server.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Something that happened during a session, in log order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEntry {
    Input(String),
    Tool(ToolExecution),
}

/// Digest of one session file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub file: PathBuf,
    pub session_id: String,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub ended_at: Option<DateTime<FixedOffset>>,
    pub model_id: Option<String>,
    pub interactive: bool,
    pub entries: Vec<SessionEntry>,
}

impl SessionSummary {
    /// Fold a session's events; `None` for a session without events
    pub fn from_events(file: &Path, events: &[AuditEvent]) -> Option<Self> {
        let first = events.first()?;
        let mut summary = Self {
            file: file.to_path_buf(),
            session_id: first.session_id.clone(),
            ..Default::default()
        };

        for event in events {
            match event.kind {
                EventKind::SessionStart => {
                    summary.started_at = Some(event.ts);
                    summary.model_id = event.str_field("model_id").map(str::to_string);
                    summary.interactive = event
                        .data
                        .get("interactive")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                }
                EventKind::UserInput => {
                    if let Some(input) = event.str_field("input") {
                        summary
                            .entries
                            .push(SessionEntry::Input(truncate(input, INPUT_PREVIEW_CHARS)));
                    }
                }
                EventKind::ToolExecuteStart => summary.entries.push(SessionEntry::Tool(ToolExecution {
                    tool_name: event.str_field("tool_name").unwrap_or("unknown").to_string(),
                    mcp_server: event.str_field("mcp_server").map(str::to_string),
                    ..Default::default()
                })),
                EventKind::ToolExecuteEnd => {
                    // Ends close the most recent open call
                    let open = summary.entries.iter_mut().rev().find_map(|entry| match entry {
                        SessionEntry::Tool(tool) if tool.status.is_none() => Some(tool),
                        _ => None,
                    });
                    let Some(tool) = open else {
                        debug!("Tool end without start in session {}", summary.session_id);
                        continue;
                    };
                    tool.status = Some(event.str_field("status").unwrap_or("unknown").to_string());
                    tool.output = event
                        .str_field("output")
                        .map(|o| truncate(o, OUTPUT_PREVIEW_CHARS));
                    tool.duration_ms = event.data.get("duration_ms").and_then(Value::as_u64);
                }
                EventKind::SessionEnd => summary.ended_at = Some(event.ts),
                EventKind::Other => {}
            }
        }

        Some(summary)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            SessionEntry::Input(input) => Some(input.as_str()),
            SessionEntry::Tool(_) => None,
        })
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolExecution> {
        self.entries.iter().filter_map(|entry| match entry {
            SessionEntry::Tool(tool) => Some(tool),
            SessionEntry::Input(_) => None,
        })
    }

    pub fn tool_count(&self) -> usize {
        self.tools().count()
    }

    pub fn mcp_tool_count(&self) -> usize {
        self.tools().filter(|t| t.is_mcp()).count()
    }
}

fn format_ts(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(f, "Session: {}", self.session_id)?;
        writeln!(f, "  File: {}", file_name)?;
        if let Some(ts) = &self.started_at {
            writeln!(f, "  Started: {}", format_ts(ts))?;
            writeln!(f, "  Model: {}", self.model_id.as_deref().unwrap_or("Unknown"))?;
            writeln!(f, "  Interactive: {}", self.interactive)?;
        }
        for entry in &self.entries {
            match entry {
                SessionEntry::Input(input) => writeln!(f, "  Input: {}", input)?,
                SessionEntry::Tool(tool) => write_tool(f, tool)?,
            }
        }
        if let Some(ts) = &self.ended_at {
            writeln!(f, "  Ended: {}", format_ts(ts))?;
        }
        write!(
            f,
            "  Total tools: {} (MCP: {})",
            self.tool_count(),
            self.mcp_tool_count()
        )
    }
}

fn write_tool(f: &mut fmt::Formatter<'_>, tool: &ToolExecution) -> fmt::Result {
    writeln!(f, "  Tool: {}", tool.tool_name)?;
    if let Some(server) = tool.mcp_server.as_deref().filter(|s| !s.is_empty()) {
        writeln!(f, "      Server: {}", server)?;
    }
    if let Some(status) = &tool.status {
        let mark = if tool.succeeded() { "ok" } else { "FAILED" };
        writeln!(f, "      Finished: {} [{}]", status, mark)?;
    }
    if let Some(output) = &tool.output {
        writeln!(f, "      Output: {}", output)?;
    }
    if let Some(ms) = tool.duration_ms {
        writeln!(f, "      Duration: {}ms", ms)?;
    }
    Ok(())
}

/// Cut `text` to `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    const SESSION: &str = r#"{"ts":"2025-01-10T09:00:00Z","session_id":"abc","type":"session_start","data":{"model_id":"claude","interactive":true}}
{"ts":"2025-01-10T09:00:05Z","session_id":"abc","type":"user_input","data":{"input":"list files"}}

{"ts":"2025-01-10T09:00:06Z","session_id":"abc","type":"tool_execute_start","data":{"tool_name":"fs_read"}}
{"ts":"2025-01-10T09:00:07Z","session_id":"abc","type":"tool_execute_end","data":{"status":"success","output":"a.txt","duration_ms":12}}
not json at all
{"ts":"2025-01-10T09:00:08Z","session_id":"abc","type":"tool_execute_start","data":{"tool_name":"search","mcp_server":"docs"}}
{"ts":"2025-01-10T09:00:09Z","session_id":"abc","type":"tool_execute_end","data":{"status":"error"}}
{"ts":"2025-01-10T09:00:09Z","session_id":"abc","type":"heartbeat","data":{}}
{"ts":"2025-01-10T09:01:00Z","session_id":"abc","type":"session_end","data":{}}
"#;

    fn set_mtime(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let events = parse_events(SESSION, Path::new("session-abc.jsonl"));
        assert_eq!(events.len(), 8);
        assert_eq!(events[0].kind, EventKind::SessionStart);
        assert_eq!(events[6].kind, EventKind::Other);
    }

    #[test]
    fn test_summary() {
        let events = parse_events(SESSION, Path::new("session-abc.jsonl"));
        let summary = SessionSummary::from_events(Path::new("session-abc.jsonl"), &events).unwrap();

        assert_eq!(summary.session_id, "abc");
        assert_eq!(summary.model_id.as_deref(), Some("claude"));
        assert!(summary.interactive);
        assert_eq!(summary.inputs().collect::<Vec<_>>(), ["list files"]);
        assert_eq!(summary.tool_count(), 2);
        assert_eq!(summary.mcp_tool_count(), 1);
        let tools: Vec<_> = summary.tools().collect();
        assert!(tools[0].succeeded());
        assert_eq!(tools[0].duration_ms, Some(12));
        assert_eq!(tools[1].status.as_deref(), Some("error"));
        assert!(summary.ended_at.is_some());

        let rendered = summary.to_string();
        assert!(rendered.contains("Started: 2025-01-10 09:00:00"));
        assert!(rendered.contains("Server: docs"));
        assert!(rendered.ends_with("Total tools: 2 (MCP: 1)"));
    }

    #[test]
    fn test_summary_keeps_conversation_order() {
        let content = r#"{"ts":"2025-01-10T09:00:00Z","session_id":"s","type":"user_input","data":{"input":"first"}}
{"ts":"2025-01-10T09:00:01Z","session_id":"s","type":"tool_execute_start","data":{"tool_name":"fs_read"}}
{"ts":"2025-01-10T09:00:02Z","session_id":"s","type":"tool_execute_end","data":{"status":"success"}}
{"ts":"2025-01-10T09:00:03Z","session_id":"s","type":"user_input","data":{"input":"second"}}
"#;
        let events = parse_events(content, Path::new("session-s.jsonl"));
        let summary = SessionSummary::from_events(Path::new("session-s.jsonl"), &events).unwrap();

        assert!(matches!(&summary.entries[0], SessionEntry::Input(i) if i == "first"));
        assert!(matches!(&summary.entries[1], SessionEntry::Tool(t) if t.succeeded()));
        assert!(matches!(&summary.entries[2], SessionEntry::Input(i) if i == "second"));

        let rendered = summary.to_string();
        let first = rendered.find("Input: first").unwrap();
        let tool = rendered.find("Tool: fs_read").unwrap();
        let second = rendered.find("Input: second").unwrap();
        assert!(first < tool && tool < second);
    }

    #[test]
    fn test_empty_session_has_no_summary() {
        assert!(SessionSummary::from_events(Path::new("x"), &[]).is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(250);
        let cut = truncate(&long, OUTPUT_PREVIEW_CHARS);
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("ééé", 2), "éé...");
    }

    #[test]
    fn test_list_session_files_newest_first() {
        let temp = TempDir::new().unwrap();
        for (name, secs) in [("session-old.jsonl", 100), ("session-new.jsonl", 300), ("session-mid.jsonl", 200)] {
            let path = temp.path().join(name);
            fs::write(&path, "").unwrap();
            set_mtime(&path, secs);
        }
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let files = list_session_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["session-new.jsonl", "session-mid.jsonl", "session-old.jsonl"]);
    }

    #[test]
    fn test_packaged_directory_preferred() {
        let temp = TempDir::new().unwrap();
        let home = temp.path();
        let packaged = home.join("snap/code/174/.local/share/amazon-q-cli/audit");
        let regular = home.join(".local/share/amazon-q-cli/audit");
        fs::create_dir_all(&packaged).unwrap();
        fs::create_dir_all(&regular).unwrap();

        assert_eq!(find_audit_directory(home, None, "amazon-q-cli"), Some(packaged.clone()));

        fs::remove_dir_all(home.join("snap")).unwrap();
        assert_eq!(find_audit_directory(home, None, "amazon-q-cli"), Some(regular));
    }

    #[test]
    fn test_xdg_directory_must_exist() {
        let temp = TempDir::new().unwrap();
        let xdg = temp.path().join("data");
        assert_eq!(find_audit_directory(temp.path(), Some(&xdg), "amazon-q-cli"), None);

        fs::create_dir_all(xdg.join("amazon-q-cli/audit")).unwrap();
        assert_eq!(
            find_audit_directory(temp.path(), Some(&xdg), "amazon-q-cli"),
            Some(xdg.join("amazon-q-cli/audit"))
        );
    }
}
