//! CLI surface for the authoritative host shell. The core engine exposes
//! programmatic entry points only; this binary is the thin wiring layer
//! that turns flags and environment variables into a [`HostConfig`].

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Authoritative Seedfall simulation host")]
pub struct Cli {
    /// Root seed for world generation. Falls back to `ROOT_SEED`, then a
    /// fixed default, if not given.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Genre preset name used to bias generation.
    #[arg(long, default_value = "fantasy")]
    pub genre: String,

    /// TCP port to bind the client-facing listener on.
    #[arg(long, default_value_t = 7777)]
    pub port: u16,

    /// Maximum simultaneous connected players.
    #[arg(long, default_value_t = 16)]
    pub max_players: u32,

    /// Path to a save envelope to load at startup instead of generating a
    /// fresh world.
    #[arg(long)]
    pub load: Option<std::path::PathBuf>,
}

/// Resolved runtime configuration after CLI flags, environment overrides,
/// and defaults are merged.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub root_seed: u64,
    pub genre: String,
    pub port: u16,
    pub max_players: u32,
    pub load_path: Option<std::path::PathBuf>,
    pub tick_hz: f64,
    pub lagcomp_window_ms: f64,
    pub interp_delay_ms: f64,
}

impl HostConfig {
    /// Merge CLI flags with `ROOT_SEED`/`TICK_HZ` environment overrides.
    /// `ROOT_SEED` wins over the default but loses to an explicit `--seed`.
    pub fn from_cli(cli: &Cli) -> Self {
        let root_seed = cli.seed.unwrap_or_else(|| {
            std::env::var("ROOT_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(12345)
        });
        let tick_hz = std::env::var("TICK_HZ")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60.0);
        Self {
            root_seed,
            genre: cli.genre.clone(),
            port: cli.port,
            max_players: cli.max_players,
            load_path: cli.load.clone(),
            tick_hz,
            lagcomp_window_ms: 500.0,
            interp_delay_ms: 100.0,
        }
    }
}
