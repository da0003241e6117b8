//! Terminal rendering of a [`Report`].

use std::fmt::Write;

use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::style::Stylize;

use super::Report;

const CHECK: &str = "✔";
const CROSS: &str = "✖";

fn flag_cell(set: bool) -> Cell {
    if set {
        Cell::new(CHECK).fg(Color::Green)
    } else {
        Cell::new(CROSS).fg(Color::Red)
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

/// Header line, switching flags and the profile table.
pub fn render(report: &Report) -> String {
    let info = &report.info;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        info.product.as_str().bold().blue(),
        "Zeitsteuerung - Konfigurationen".bold()
    );
    let _ = writeln!(
        out,
        "{}, Datum {}, SN {} | Angemeldet als: {}@{} | Anlagenname: {}",
        info.firmware, info.date, info.serial, info.user, report.address, info.name
    );
    out.push('\n');

    let state = &report.state;
    let _ = writeln!(out, "{}", "KONFIGURATIONSUMSCHALTUNG".bold());
    let mut flags = Table::new();
    flags.load_preset(NOTHING);
    flags.add_row(vec![
        Cell::new("Automatische Konfigurationsumschaltung"),
        flag_cell(state.automatic_switching_enabled),
    ]);
    flags.add_row(vec![
        Cell::new(format!("Steuerbar mit Systemrelais: {}", state.relay_name)),
        flag_cell(state.relay_controllable),
    ]);
    let _ = writeln!(out, "{flags}");
    out.push('\n');

    let _ = writeln!(out, "{}", "KONFIGURATIONSNAMEN".bold());
    let mut profiles = Table::new();
    profiles
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell("Konfigurationsname"),
            header_cell("Identifikationsnummer"),
            header_cell("Aktiv"),
        ]);
    for profile in &state.profiles {
        let active = if profile.is_active {
            Cell::new(CHECK).fg(Color::Green)
        } else {
            Cell::new("")
        };
        profiles.add_row(vec![
            Cell::new(&profile.name),
            Cell::new(profile.number),
            active,
        ]);
    }
    for idx in [1, 2] {
        if let Some(column) = profiles.column_mut(idx) {
            column.set_cell_alignment(CellAlignment::Center);
        }
    }
    let _ = writeln!(out, "{profiles}");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbx::page::{self, fixtures};

    fn report() -> Report {
        Report {
            info: page::parse_info(fixtures::TREE, fixtures::ABOUT, fixtures::LOGSTATUS).unwrap(),
            state: page::parse_switch_state(fixtures::AUTOSWITCH_ON, fixtures::CONFIGS).unwrap(),
            address: "192.168.0.240".into(),
            changed: false,
        }
    }

    #[test]
    fn header_names_the_appliance() {
        let out = render(&report());
        assert!(out.contains("COMpact 5500R"));
        assert!(out.contains("SN 4711"));
        assert!(out.contains("admin@192.168.0.240"));
        assert!(out.contains("Anlagenname: Zentrale"));
    }

    #[test]
    fn lists_every_profile_in_order() {
        let out = render(&report());
        let tag = out.find("Tag").unwrap();
        let nacht = out.find("Nacht").unwrap();
        let wochenende = out.find("Wochenende").unwrap();
        assert!(tag < nacht && nacht < wochenende);
        assert!(out.contains("Steuerbar mit Systemrelais: Relais 1"));
    }

    #[test]
    fn active_profile_is_marked() {
        let out = render(&report());
        let line = out.lines().find(|l| l.contains("Tag")).unwrap();
        assert!(line.contains(CHECK));
        let line = out.lines().find(|l| l.contains("Nacht")).unwrap();
        assert!(!line.contains(CHECK));
    }
}
