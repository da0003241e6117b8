//! SSH local port-forward to the PBX management port.
//!
//! The forward is held by a supervised `ssh -N -L` child. [`Tunnel`] owns it
//! and terminates it on drop, so every exit path tears the channel down.

use std::io::{BufRead, BufReader, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::SiteConfig;
use crate::error::{Error, Result};

/// HTTPS port of the PBX web interface.
pub const PBX_PORT: u16 = 443;

const READY_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

const PASS_ENV: &str = "AUER_CFG_SSH_PASS";
const ASKPASS_SCRIPT: &str = "#!/bin/sh\nprintf '%s' \"$AUER_CFG_SSH_PASS\"\n";

/// A running port-forward. Dropping it closes the forward.
#[derive(Debug)]
pub struct Tunnel {
    child: Child,
    local_port: u16,
}

impl Tunnel {
    /// Start the forward and wait until the local end accepts connections.
    pub fn open(config: &SiteConfig) -> Result<Self> {
        let local_port = free_local_port()?;
        let mut cmd = ssh_command(config, local_port)?;

        if let Some(password) = config.ssh_pass.as_deref() {
            let dir = dirs::cache_dir().map(|d| d.join("auer-cfg")).ok_or_else(|| {
                Error::Config("cannot resolve a cache directory for ssh askpass".into())
            })?;
            let script = ensure_askpass_script(&dir)?;
            tracing::debug!(script = %script.display(), "using SSH_ASKPASS for password auth");
            cmd.env(PASS_ENV, password)
                .env("SSH_ASKPASS", &script)
                .env("SSH_ASKPASS_REQUIRE", "force");
        }

        tracing::debug!(local_port, host = ?config.ssh_host, "spawning ssh tunnel");
        let child = cmd
            .spawn()
            .map_err(|e| Error::Connection(format!("cannot start ssh: {e}")))?;

        let mut tunnel = Self { child, local_port };
        tunnel.wait_ready()?;
        tunnel.drain_stderr();
        tracing::info!(local_port, "ssh tunnel up");
        Ok(tunnel)
    }

    /// Loopback port forwarded to the PBX.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Keep reading ssh's stderr so a long-lived forward never blocks on a full pipe.
    fn drain_stderr(&mut self) {
        let Some(stderr) = self.child.stderr.take() else {
            return;
        };
        std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                tracing::debug!(target: "auer_cfg::ssh", "{line}");
            }
        });
    }

    fn wait_ready(&mut self) -> Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.local_port));
        let deadline = Instant::now() + READY_TIMEOUT;

        loop {
            if let Some(status) = self.child.try_wait()? {
                let mut stderr = String::new();
                if let Some(mut pipe) = self.child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                return Err(Error::Connection(format!(
                    "ssh exited with {status}: {}",
                    stderr.trim()
                )));
            }
            if TcpStream::connect_timeout(&addr, POLL_INTERVAL).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Connection(format!(
                    "ssh forward on port {} not ready after {}s",
                    self.local_port,
                    READY_TIMEOUT.as_secs()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for Tunnel {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        tracing::debug!(local_port = self.local_port, "ssh tunnel closed");
    }
}

fn free_local_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

fn ssh_command(config: &SiteConfig, local_port: u16) -> Result<Command> {
    let host = config
        .ssh_host
        .as_deref()
        .ok_or_else(|| Error::Config("ssh_tunnel requires ssh_host".into()))?;
    let user = config
        .ssh_user
        .as_deref()
        .ok_or_else(|| Error::Config("ssh_tunnel requires ssh_user".into()))?;

    let mut cmd = Command::new("ssh");
    cmd.arg("-N")
        .arg("-T")
        .arg("-L")
        .arg(format!(
            "127.0.0.1:{local_port}:{}:{PBX_PORT}",
            config.auer_address
        ))
        .arg("-p")
        .arg(config.ssh_port.to_string())
        .arg("-o")
        .arg("ExitOnForwardFailure=yes")
        .arg("-o")
        .arg("StrictHostKeyChecking=accept-new")
        .arg("-o")
        .arg(format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"))
        .arg("-o")
        .arg("ServerAliveInterval=30");
    if config.ssh_pass.is_none() {
        cmd.arg("-o").arg("BatchMode=yes");
    }
    cmd.arg(format!("{user}@{host}"));
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    Ok(cmd)
}

fn ensure_askpass_script(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("ssh-askpass.sh");
    let current = std::fs::read(&path).ok();
    if current.as_deref() != Some(ASKPASS_SCRIPT.as_bytes()) {
        std::fs::write(&path, ASKPASS_SCRIPT)?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)?.permissions();
        perms.set_mode(0o700);
        std::fs::set_permissions(&path, perms)?;
    }
    Ok(path)
}
