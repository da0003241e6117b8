//! Access to the PBX web management interface.

mod digest;
mod http;
pub mod page;
mod session;

pub use http::HttpTransport;
pub use page::{PbxInfo, SwitchState};
pub use session::Session;

use crate::error::Result;

/// Request seam between the session logic and the wire.
pub trait Transport {
    /// GET `path` (absolute, may carry a query string) and return the body.
    fn get(&mut self, path: &str) -> Result<String>;

    /// POST `form` url-encoded to `path`; an empty form sends no body.
    fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory PBX used by the session and dispatcher tests.

    use super::Transport;
    use super::page::fixtures;
    use crate::error::{Error, Result};

    /// Serves the fixture documents and applies saves to its own state.
    #[derive(Debug)]
    pub struct StubPbx {
        pub autoswitch_enabled: bool,
        pub relay_controllable: bool,
        /// `None` leaves the field out of the autoswitch document.
        pub relay_name: Option<String>,
        pub active_row: String,
        pub requests: Vec<String>,
        pub posts: Vec<(String, Vec<(String, String)>)>,
    }

    impl Default for StubPbx {
        fn default() -> Self {
            Self {
                autoswitch_enabled: false,
                relay_controllable: true,
                relay_name: Some("Relais 1".to_string()),
                active_row: "11".to_string(),
                requests: Vec::new(),
                posts: Vec::new(),
            }
        }
    }

    impl StubPbx {
        fn flag(value: bool) -> &'static str {
            if value { "1" } else { "0" }
        }

        fn configs(&self) -> String {
            let table = [
                ("11", "Tag", "1"),
                ("12", "Nacht", "2"),
                ("13", "Wochenende", "3"),
            ];
            let rows: Vec<String> = table
                .iter()
                .map(|(id, name, number)| {
                    format!(
                        r#"{{"id":"{id}","data":["{name}","{number}"],"userdata":{{"active":{}}}}}"#,
                        *id == self.active_row
                    )
                })
                .collect();
            format!(r#"{{"rows":[{}]}}"#, rows.join(","))
        }
    }

    impl Transport for StubPbx {
        fn get(&mut self, path: &str) -> Result<String> {
            self.requests.push(format!("GET {path}"));
            match path {
                "/config_autoswitch_state" => {
                    let name = self
                        .relay_name
                        .as_ref()
                        .map(|n| format!(r#","switchSysRelaisName":"{n}""#))
                        .unwrap_or_default();
                    Ok(format!(
                        r#"{{"switchCfgCb":"{}","switchSysRelais":"{}"{name}}}"#,
                        Self::flag(self.autoswitch_enabled),
                        Self::flag(self.relay_controllable)
                    ))
                }
                "/configs_state" => Ok(self.configs()),
                "/tree" => Ok(fixtures::TREE.to_string()),
                "/about_state" => Ok(fixtures::ABOUT.to_string()),
                "/logstatus_state" => Ok(fixtures::LOGSTATUS.to_string()),
                other => Err(Error::Protocol(format!("GET {other} returned HTTP 404"))),
            }
        }

        fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Result<String> {
            self.requests.push(format!("POST {path}"));
            self.posts.push((
                path.to_string(),
                form.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));

            if path == "/config_autoswitch_save" {
                self.autoswitch_enabled = form.iter().any(|(k, _)| *k == "switchCfgCb");
                self.relay_controllable = form.iter().any(|(k, _)| *k == "switchSysRelais");
                return Ok(String::new());
            }
            if let Some(id) = path.strip_prefix("/configs_set?configId=") {
                self.active_row = id.to_string();
                return Ok(String::new());
            }
            Err(Error::Protocol(format!("POST {path} returned HTTP 404")))
        }
    }
}
