//! parley: HTTP chat server over a single on-device language model.
//!
//! Loads the engine configuration, creates a default dialogue, and serves
//! blocking and streaming chat plus dialogue lifecycle endpoints.

mod api;
mod bootstrap;
mod cli;

use std::sync::Arc;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;

const DEFAULT_LOG_DIRECTIVE: &str = "parley=info";

fn init_logging(level: Option<&str>) {
    let directive = level.unwrap_or(DEFAULT_LOG_DIRECTIVE);
    let directive: Directive = directive.parse().unwrap_or_else(|_| {
        eprintln!("invalid --log-level '{directive}', using {DEFAULT_LOG_DIRECTIVE}");
        DEFAULT_LOG_DIRECTIVE.parse().expect("default directive is valid")
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();
}

async fn run(args: cli::Args) -> parley_common::Result<()> {
    let boot = bootstrap::bootstrap(&args)?;

    let state = Arc::new(AppState {
        manager: boot.manager.clone(),
        default_dialogue: boot.default_dialogue.clone(),
    });
    let router = api::build_router(state, boot.settings.server.max_body_bytes);

    api::start_server(router, &boot.settings.server.host, boot.settings.server.port).await?;

    if boot.manager.remove_dialogue(&boot.default_dialogue) {
        tracing::debug!("default dialogue released");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    if let Err(e) = run(args).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
