use clap::Parser;

/// SplitSync native messaging host: pairs browser windows and keeps their
/// URL and scroll position in sync.
#[derive(Parser, Debug)]
#[command(name = "splitsync", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override, as a tracing directive (e.g. `splitsync=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Extension origin passed by the browser when it launches the host.
    #[arg(hide = true)]
    pub origin: Option<String>,

    /// Native window handle of the caller (Windows only).
    #[arg(long, hide = true)]
    pub parent_window: Option<i64>,
}

pub fn parse() -> Args {
    Args::parse()
}
