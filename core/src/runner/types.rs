use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

/// A fully-resolved child process invocation. There is deliberately no working
/// directory: every path a tool needs is passed as an absolute argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Human-readable tool name for logs and errors (`tts`, `musetalk`, `ffmpeg`).
    pub tool: String,
    pub program: OsString,
    pub args: Vec<OsString>,
    pub envs: HashMap<String, String>,
}

impl ToolCommand {
    pub fn new(tool: impl Into<String>, program: impl Into<OsString>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            envs: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, flag: &str, path: &Path) -> Self {
        self.arg(flag).arg(path.as_os_str())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    /// Arguments as lossy strings, for logging and assertions.
    pub fn argv(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn display(&self) -> String {
        let mut s = self.program.to_string_lossy().into_owned();
        for a in self.argv() {
            s.push(' ');
            s.push_str(&a);
        }
        s
    }
}

/// Exit status reported by a session; `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout_tail: String,
    pub stderr_tail: String,
}
