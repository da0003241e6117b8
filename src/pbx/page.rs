//! Parsing of the state documents behind the PBX's configuration page.
//!
//! The firmware's "Zeitsteuerung / Konfigurationen" page is filled in by the
//! browser from a handful of JSON state endpoints. Everything that depends on
//! their exact shape lives here; callers only see [`SwitchState`] and
//! [`PbxInfo`].

use serde::Deserialize;

use crate::error::{Error, Result};

/// One configuration template known to the PBX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProfile {
    /// Number shown to the user ("Identifikationsnummer").
    pub number: u32,
    pub name: String,
    pub is_active: bool,
    /// Internal row key the firmware expects when activating.
    pub row_id: String,
}

/// Snapshot of the configuration-switching page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchState {
    pub automatic_switching_enabled: bool,
    pub relay_controllable: bool,
    pub relay_name: String,
    /// In page order.
    pub profiles: Vec<ConfigProfile>,
}

impl SwitchState {
    /// Look up a profile by its user-visible number.
    pub fn profile(&self, number: u32) -> Option<&ConfigProfile> {
        self.profiles.iter().find(|p| p.number == number)
    }

    pub fn active_profile(&self) -> Option<&ConfigProfile> {
        self.profiles.iter().find(|p| p.is_active)
    }
}

/// Automatic switching flags as reported by `/config_autoswitch_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSwitch {
    pub enabled: bool,
    pub relay_controllable: bool,
    pub relay_name: String,
}

/// Identity of the appliance, shown above the tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PbxInfo {
    pub product: String,
    pub name: String,
    pub firmware: String,
    pub date: String,
    pub serial: String,
    pub user: String,
}

/// Checkbox values arrive as booleans, numbers or strings depending on the page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Number(n) => *n != 0,
            Flag::Text(s) => !matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "off"
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAutoSwitch {
    switch_cfg_cb: Option<Flag>,
    switch_sys_relais: Option<Flag>,
    switch_sys_relais_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfigs {
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    id: serde_json::Value,
    data: Vec<serde_json::Value>,
    /// Sometimes an empty array instead of an object.
    #[serde(default)]
    userdata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTreeEntry {
    pbx: String,
    pbx_edit: String,
}

#[derive(Debug, Deserialize)]
struct RawAbout {
    version: String,
    date: String,
    serial: String,
}

#[derive(Debug, Deserialize)]
struct RawLogStatus {
    logstatus: String,
}

fn decode<'a, T: Deserialize<'a>>(what: &str, body: &'a str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Parse(format!("{what}: {e}")))
}

/// Parse `/config_autoswitch_state`.
pub fn parse_autoswitch(body: &str) -> Result<AutoSwitch> {
    let raw: RawAutoSwitch = decode("config_autoswitch_state", body)?;
    let enabled = raw
        .switch_cfg_cb
        .ok_or_else(|| Error::Parse("config_autoswitch_state: missing switchCfgCb".into()))?;
    let relay = raw
        .switch_sys_relais
        .ok_or_else(|| Error::Parse("config_autoswitch_state: missing switchSysRelais".into()))?;
    // Echoed back on save, so a missing name must not become an empty one.
    let relay_name = raw.switch_sys_relais_name.ok_or_else(|| {
        Error::Parse("config_autoswitch_state: missing switchSysRelaisName".into())
    })?;

    Ok(AutoSwitch {
        enabled: enabled.is_set(),
        relay_controllable: relay.is_set(),
        relay_name,
    })
}

/// Parse `/configs_state` into profiles, in page order.
///
/// Column 0 holds the name, column 1 the user-visible number.
pub fn parse_profiles(body: &str) -> Result<Vec<ConfigProfile>> {
    let raw: RawConfigs = decode("configs_state", body)?;
    if raw.rows.is_empty() {
        return Err(Error::Parse("configs_state: no configurations listed".into()));
    }

    let profiles = raw
        .rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| parse_row(idx, row))
        .collect::<Result<Vec<_>>>()?;

    let active = profiles.iter().filter(|p| p.is_active).count();
    if active != 1 {
        return Err(Error::Parse(format!(
            "configs_state: expected exactly one active configuration, found {active}"
        )));
    }

    Ok(profiles)
}

fn parse_row(idx: usize, row: RawRow) -> Result<ConfigProfile> {
    let column = |col: usize| -> Result<String> {
        match row.data.get(col) {
            Some(serde_json::Value::String(s)) => Ok(s.trim().to_string()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            _ => Err(Error::Parse(format!(
                "configs_state: row {idx} has no column {col}"
            ))),
        }
    };

    let name = column(0)?;
    let number_text = column(1)?;
    let number = number_text.parse::<u32>().map_err(|_| {
        Error::Parse(format!(
            "configs_state: row {idx} has non-numeric identifier {number_text:?}"
        ))
    })?;
    let row_id = match &row.id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(Error::Parse(format!(
                "configs_state: row {idx} has unusable id {other}"
            )));
        }
    };
    let is_active = row
        .userdata
        .get("active")
        .and_then(|v| Flag::deserialize(v).ok())
        .is_some_and(|f| f.is_set());

    Ok(ConfigProfile {
        number,
        name,
        is_active,
        row_id,
    })
}

/// Combine both documents of the configuration page.
pub fn parse_switch_state(autoswitch: &str, configs: &str) -> Result<SwitchState> {
    let auto = parse_autoswitch(autoswitch)?;
    let profiles = parse_profiles(configs)?;
    Ok(SwitchState {
        automatic_switching_enabled: auto.enabled,
        relay_controllable: auto.relay_controllable,
        relay_name: auto.relay_name,
        profiles,
    })
}

/// Parse the header documents (`/tree`, `/about_state`, `/logstatus_state`).
pub fn parse_info(tree: &str, about: &str, logstatus: &str) -> Result<PbxInfo> {
    let tree: Vec<RawTreeEntry> = decode("tree", tree)?;
    let root = tree
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("tree: empty menu tree".into()))?;
    let about: RawAbout = decode("about_state", about)?;
    let log: RawLogStatus = decode("logstatus_state", logstatus)?;

    Ok(PbxInfo {
        product: root.pbx,
        name: root.pbx_edit,
        firmware: about.version.trim().to_string(),
        date: about.date,
        serial: about.serial,
        user: log.logstatus,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn captured_page_has_exactly_one_active_profile() {
        let state = parse_switch_state(AUTOSWITCH_OFF, CONFIGS).unwrap();

        assert_eq!(state.profiles.iter().filter(|p| p.is_active).count(), 1);
        assert_eq!(state.active_profile().unwrap().name, "Tag");
        assert!(!state.automatic_switching_enabled);
        assert!(state.relay_controllable);
        assert_eq!(state.relay_name, "Relais 1");
    }

    #[test]
    fn profiles_keep_page_order() {
        let profiles = parse_profiles(CONFIGS).unwrap();
        let numbers: Vec<u32> = profiles.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(profiles[1].row_id, "12");
    }

    #[test]
    fn numeric_ids_and_flags_are_accepted() {
        let body = r#"{"rows":[
            {"id":7,"data":["A",4],"userdata":{"active":1}},
            {"id":8,"data":["B","5"],"userdata":{"active":0}}
        ]}"#;
        let profiles = parse_profiles(body).unwrap();
        assert_eq!(profiles[0].row_id, "7");
        assert_eq!(profiles[0].number, 4);
        assert!(profiles[0].is_active);
        assert!(!profiles[1].is_active);
    }

    #[test]
    fn boolean_autoswitch_flags() {
        let auto = parse_autoswitch(
            r#"{"switchCfgCb":true,"switchSysRelais":false,"switchSysRelaisName":""}"#,
        )
        .unwrap();
        assert!(auto.enabled);
        assert!(!auto.relay_controllable);
    }

    #[test]
    fn truncated_document_is_a_parse_error() {
        let truncated = &CONFIGS[..CONFIGS.len() / 2];
        let err = parse_profiles(truncated).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn html_error_page_is_a_parse_error() {
        let err = parse_switch_state("<html><body>Login</body></html>", CONFIGS).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn empty_table_is_not_silently_accepted() {
        let err = parse_profiles(r#"{"rows":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn missing_marker_is_a_parse_error() {
        let err = parse_autoswitch(r#"{"switchSysRelais":"1"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(msg) if msg.contains("switchCfgCb")));
    }

    #[test]
    fn missing_relay_name_is_a_parse_error() {
        let err = parse_autoswitch(r#"{"switchCfgCb":"0","switchSysRelais":"1"}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(msg) if msg.contains("switchSysRelaisName")));
    }

    #[test]
    fn two_active_rows_are_rejected() {
        let body = r#"{"rows":[
            {"id":"1","data":["A","1"],"userdata":{"active":true}},
            {"id":"2","data":["B","2"],"userdata":{"active":true}}
        ]}"#;
        assert!(matches!(parse_profiles(body), Err(Error::Parse(_))));
    }

    #[test]
    fn non_numeric_identifier_is_rejected() {
        let body = r#"{"rows":[{"id":"1","data":["A","x"],"userdata":{"active":true}}]}"#;
        assert!(matches!(parse_profiles(body), Err(Error::Parse(_))));
    }

    #[test]
    fn header_documents() {
        let info = parse_info(TREE, ABOUT, LOGSTATUS).unwrap();
        assert_eq!(info.product, "COMpact 5500R");
        assert_eq!(info.name, "Zentrale");
        assert_eq!(info.firmware, "Version 8.2D");
        assert_eq!(info.serial, "4711");
        assert_eq!(info.user, "admin");
    }

    #[test]
    fn empty_tree_is_rejected() {
        assert!(matches!(parse_info("[]", ABOUT, LOGSTATUS), Err(Error::Parse(_))));
    }
}
