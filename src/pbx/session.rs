//! State reads and transitions against the PBX configuration page.

use std::time::Duration;

use super::Transport;
use super::page::{self, PbxInfo, SwitchState};
use crate::error::{Error, Result};

const AUTOSWITCH_STATE: &str = "/config_autoswitch_state";
const AUTOSWITCH_SAVE: &str = "/config_autoswitch_save";
const CONFIGS_STATE: &str = "/configs_state";
const CONFIGS_SET: &str = "/configs_set";

/// Time the PBX needs before a profile switch shows up in `/configs_state`.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

/// One-shot session against a PBX web interface.
pub struct Session<T: Transport> {
    transport: T,
    settle: Duration,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            settle: DEFAULT_SETTLE,
        }
    }

    /// Override the pause after activating a profile.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read the configuration-switching page.
    pub fn fetch_state(&mut self) -> Result<SwitchState> {
        let autoswitch = self.transport.get(AUTOSWITCH_STATE)?;
        let configs = self.transport.get(CONFIGS_STATE)?;
        page::parse_switch_state(&autoswitch, &configs)
    }

    /// Read the appliance identity header.
    pub fn fetch_info(&mut self) -> Result<PbxInfo> {
        let tree = self.transport.get("/tree")?;
        let about = self.transport.get("/about_state")?;
        let logstatus = self.transport.get("/logstatus_state")?;
        page::parse_info(&tree, &about, &logstatus)
    }

    /// Turn automatic configuration switching on or off.
    ///
    /// Returns `false` without saving when the PBX is already in the requested
    /// state. The relay checkbox and name are echoed back unchanged.
    pub fn set_automatic(&mut self, enabled: bool) -> Result<bool> {
        let current = page::parse_autoswitch(&self.transport.get(AUTOSWITCH_STATE)?)?;
        if current.enabled == enabled {
            tracing::info!(enabled, "automatic switching already in requested state");
            return Ok(false);
        }

        // Checkboxes are submitted by presence; the value is the field name.
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(3);
        if enabled {
            form.push(("switchCfgCb", "switchCfgCb"));
        }
        if current.relay_controllable {
            form.push(("switchSysRelais", "switchSysRelais"));
        }
        form.push(("switchSysRelaisName", current.relay_name.as_str()));

        self.transport.post(AUTOSWITCH_SAVE, &form)?;
        tracing::info!(enabled, "automatic switching updated");
        Ok(true)
    }

    /// Activate the profile with user-visible `number`.
    ///
    /// `state` must come from a recent [`Session::fetch_state`]; an unknown
    /// number fails before any request is made. Returns `false` when the
    /// profile is already active.
    pub fn select_profile(&mut self, state: &SwitchState, number: u32) -> Result<bool> {
        let profile = state.profile(number).ok_or_else(|| {
            let known: Vec<String> = state.profiles.iter().map(|p| p.number.to_string()).collect();
            Error::Validation(format!(
                "Identifikationsnummer {number} not found (known: {})",
                known.join(", ")
            ))
        })?;

        if profile.is_active {
            tracing::info!(number, name = %profile.name, "profile already active");
            return Ok(false);
        }

        let previous = state.active_profile().map(|p| p.number);
        let path = format!("{CONFIGS_SET}?configId={}", profile.row_id);
        self.transport.post(&path, &[])?;
        tracing::info!(number, ?previous, name = %profile.name, "profile activated");

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(true)
    }
}
