//! ureq-backed [`Transport`] speaking HTTPS with Digest auth to the PBX.

use ureq::Agent;
use ureq::Body;
use ureq::http::Response;
use ureq::tls::{TlsConfig, TlsProvider};
use uuid::Uuid;

use super::Transport;
use super::digest::Challenge;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug)]
struct DigestState {
    challenge: Challenge,
    nc: u32,
}

/// HTTP client for the PBX web interface.
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
    username: String,
    password: String,
    auth: Option<DigestState>,
}

impl HttpTransport {
    /// `base_url` is scheme and authority only, e.g. `https://127.0.0.1:40123`.
    pub fn new(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        // The appliance ships a self-signed certificate.
        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .disable_verification(true)
            .build();

        let agent: Agent = Agent::config_builder()
            .tls_config(tls_config)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            auth: None,
        }
    }

    fn next_authorization(&mut self, method: Method, path: &str) -> Option<String> {
        let state = self.auth.as_mut()?;
        state.nc += 1;
        let cnonce = Uuid::new_v4().simple().to_string();
        Some(state.challenge.authorization(
            &self.username,
            &self.password,
            method.as_str(),
            path,
            state.nc,
            &cnonce,
        ))
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        form: &[(&str, &str)],
        authorization: Option<&str>,
    ) -> Result<Response<Body>> {
        let result = match method {
            Method::Get => {
                let mut request = self.agent.get(url);
                if let Some(value) = authorization {
                    request = request.header("Authorization", value);
                }
                request.call()
            }
            Method::Post => {
                let mut request = self.agent.post(url);
                if let Some(value) = authorization {
                    request = request.header("Authorization", value);
                }
                if form.is_empty() {
                    request.send_empty()
                } else {
                    request.send_form(form.iter().copied())
                }
            }
        };
        result.map_err(|e| Error::Connection(format!("{} {url}: {e}", method.as_str())))
    }

    /// Issue one request, answering at most one Digest challenge.
    fn execute(&mut self, method: Method, path: &str, form: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let mut challenged = false;

        loop {
            let authorization = self.next_authorization(method, path);
            let mut response = self.send(method, &url, form, authorization.as_deref())?;
            let status = response.status().as_u16();
            tracing::debug!(method = method.as_str(), path, status, "pbx request");

            if status == 401 {
                if challenged {
                    return Err(Error::Authentication(self.username.clone()));
                }
                let header = response
                    .headers()
                    .get("www-authenticate")
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        Error::Protocol(format!("{path} answered 401 without a challenge"))
                    })?;
                let challenge = Challenge::parse(header)?;
                tracing::debug!(realm = %challenge.realm, stale = challenge.stale, "digest challenge");
                self.auth = Some(DigestState { challenge, nc: 0 });
                challenged = true;
                continue;
            }

            if !(200..300).contains(&status) {
                return Err(Error::Protocol(format!(
                    "{} {path} returned HTTP {status}",
                    method.as_str()
                )));
            }

            return response
                .body_mut()
                .read_to_string()
                .map_err(|e| Error::Connection(format!("reading {path}: {e}")));
        }
    }
}

impl Transport for HttpTransport {
    fn get(&mut self, path: &str) -> Result<String> {
        self.execute(Method::Get, path, &[])
    }

    fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Result<String> {
        self.execute(Method::Post, path, form)
    }
}
