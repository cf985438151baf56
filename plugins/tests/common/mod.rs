#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use talkhead_core::api::{
    AnimationConfig, ExitInfo, StageConfig, ToolCommand, ToolRunner, ToolSession, VersionResolver,
    Workspace, WorkspaceManager,
};

type Script = dyn Fn(&ToolCommand) -> i32 + Send + Sync;

/// Stands in for a real tool: records every command, lets the script touch
/// the filesystem the way the tool would, then exits with the returned code.
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolCommand>>,
    script: Box<Script>,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&ToolCommand) -> i32 + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> ToolCommand {
        self.calls().pop().expect("runner was never called")
    }
}

struct ExitedSession {
    code: i32,
}

#[async_trait]
impl ToolSession for ExitedSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        None
    }
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        let msg: &'static [u8] = if self.code == 0 { b"" } else { b"scripted failure\n" };
        Some(Box::new(msg))
    }
    async fn kill(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn wait(&mut self) -> anyhow::Result<ExitInfo> {
        Ok(ExitInfo {
            code: Some(self.code),
        })
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start_session(&self, command: &ToolCommand) -> anyhow::Result<Box<dyn ToolSession>> {
        self.calls.lock().unwrap().push(command.clone());
        let code = (self.script)(command);
        Ok(Box::new(ExitedSession { code }))
    }
}

/// Value following `flag` in the command's arguments.
pub fn arg_after(cmd: &ToolCommand, flag: &str) -> Option<PathBuf> {
    let argv = cmd.argv();
    argv.iter()
        .position(|a| a == flag)
        .and_then(|i| argv.get(i + 1))
        .map(PathBuf::from)
}

pub fn all_after(cmd: &ToolCommand, flag: &str) -> Vec<PathBuf> {
    let argv = cmd.argv();
    argv.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| PathBuf::from(&w[1]))
        .collect()
}

pub async fn workspace(root: &Path) -> Workspace {
    WorkspaceManager::new(root.join("output"))
        .create_workspace()
        .await
        .unwrap()
}

/// A MuseTalk tree containing every file the adapter checks for.
pub fn fake_engine(root: &Path) -> AnimationConfig {
    let engine = root.join("MuseTalk");
    for dir in ["configs/inference", "scripts", "models/musetalk", "models/musetalkV15"] {
        fs::create_dir_all(engine.join(dir)).unwrap();
    }
    for file in [
        "app.py",
        "configs/inference/test.yaml",
        "models/musetalk/pytorch_model.bin",
        "models/musetalk/musetalk.json",
        "models/musetalkV15/unet.pth",
        "models/musetalkV15/musetalk.json",
    ] {
        fs::write(engine.join(file), b"x").unwrap();
    }
    AnimationConfig {
        engine_dir: engine.to_string_lossy().into_owned(),
        ..AnimationConfig::default()
    }
}

pub fn animation_config(cfg: &AnimationConfig, version: &str) -> StageConfig {
    let resolved = VersionResolver::new(cfg)
        .resolve(version, &Default::default())
        .unwrap();
    StageConfig::new(None, 4096).with_version(resolved)
}

pub fn write(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}
