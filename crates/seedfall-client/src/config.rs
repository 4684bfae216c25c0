//! CLI surface for the predictive client shell.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Predictive Seedfall client")]
pub struct Cli {
    /// Server host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub server: String,

    /// Server port.
    #[arg(long, default_value_t = 7777)]
    pub port: u16,

    /// Client id presented to the server in every intent.
    #[arg(long, default_value_t = 1)]
    pub client_id: u32,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    pub client_id: u32,
    pub tick_hz: f64,
    pub interp_delay_ms: f64,
    pub extrapolation_cap_ms: f64,
}

impl ClientConfig {
    /// `TICK_HZ` may override the default tick rate, matching the same
    /// environment convention the server honors.
    pub fn from_cli(cli: &Cli) -> Self {
        let tick_hz = std::env::var("TICK_HZ")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60.0);
        Self {
            server_addr: format!("{}:{}", cli.server, cli.port),
            client_id: cli.client_id,
            tick_hz,
            interp_delay_ms: 100.0,
            extrapolation_cap_ms: 100.0,
        }
    }
}
