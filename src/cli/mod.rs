//! CLI module for auer-cfg.

mod commands;
pub mod dispatch;
pub mod render;

pub use commands::Commands;
pub use dispatch::Report;

use std::time::Duration;

use crate::config::SiteConfig;
use crate::error::Result;
use crate::pbx::{HttpTransport, Session};
use crate::tunnel::Tunnel;

/// Connect to the PBX described by `config` and carry out `command`.
///
/// The tunnel, when configured, lives only for the duration of this call.
pub fn run(config: &SiteConfig, command: &Commands) -> Result<Report> {
    let tunnel = if config.ssh_tunnel {
        Some(Tunnel::open(config)?)
    } else {
        None
    };

    let base_url = match &tunnel {
        Some(tunnel) => format!("https://127.0.0.1:{}", tunnel.local_port()),
        None => format!("https://{}", config.auer_address),
    };
    tracing::debug!(%base_url, ?command, "dispatching");

    let transport = HttpTransport::new(base_url, &config.auer_admin_user, &config.auer_admin_pass);
    let mut session =
        Session::new(transport).with_settle(Duration::from_millis(config.settle_ms));
    let mut report = dispatch::dispatch(&mut session, command)?;
    report.address = config.auer_address.clone();
    Ok(report)
}
