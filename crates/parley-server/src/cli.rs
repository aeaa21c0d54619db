use std::path::PathBuf;

use clap::Parser;
use parley_config::BackendKind;

/// Parley: multi-dialogue chat server for a single on-device language model.
#[derive(Parser, Debug, Default)]
#[command(name = "parley", version, about)]
pub struct Args {
    /// Server settings file (TOML). Defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Engine configuration JSON handed to the backend.
    #[arg(long, visible_alias = "genie-config")]
    pub engine_config: Option<PathBuf>,

    /// Working directory the engine resolves model paths against.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Prompt template family (llama3, llama3-taide, llama2).
    #[arg(long)]
    pub template: Option<String>,

    /// Backend implementation (echo, genie).
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Keep backend memory across turns of the default dialogue.
    #[arg(long)]
    pub stateful: bool,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
