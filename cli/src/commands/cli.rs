use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "talkhead", version, about = "Text + portrait in, lip-synced talking-head video out")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.talkhead/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `workspace.output_root`.
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Identifier recorded in the server state file; generated when absent.
    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, group = "input")]
    pub text: Option<String>,

    #[arg(long, group = "input")]
    pub text_file: Option<PathBuf>,

    #[arg(long)]
    pub image: PathBuf,

    /// Animation engine version; defaults to `animation.default_version`.
    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub fps: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    pub bbox_shift: Option<i32>,

    #[arg(long)]
    pub use_float16: Option<bool>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CheckArgs {
    /// Version to check; defaults to `animation.default_version`.
    #[arg(long)]
    pub version: Option<String>,

    /// Engine directory; defaults to `animation.engine_dir`.
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LocateArgs {
    pub task_id: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Run one task to completion and print its result.
    Generate(GenerateArgs),
    /// Verify the animation engine installation.
    Check(CheckArgs),
    /// Print the final video path of a finished task.
    Locate(LocateArgs),
}
