//! Maps a CLI verb onto session calls.

use crate::error::Result;
use crate::pbx::{PbxInfo, Session, SwitchState, Transport};

use super::Commands;

/// What gets rendered after a command completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub info: PbxInfo,
    pub state: SwitchState,
    /// Address the PBX is known by in the site configuration.
    pub address: String,
    /// Whether the command changed anything on the PBX.
    pub changed: bool,
}

/// Run `command` and re-read the page so the report reflects the result.
pub fn dispatch<T: Transport>(session: &mut Session<T>, command: &Commands) -> Result<Report> {
    let changed = match command {
        Commands::Show => false,
        Commands::Enable => session.set_automatic(true)?,
        Commands::Disable => session.set_automatic(false)?,
        Commands::Select { number } => {
            let current = session.fetch_state()?;
            session.select_profile(&current, *number)?
        }
    };

    let info = session.fetch_info()?;
    let state = session.fetch_state()?;
    Ok(Report {
        info,
        state,
        address: String::new(),
        changed,
    })
}
