// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wire types and D-Bus interface definitions for the LADISH session service.
//!
//! Everything the session daemon sends over the bus is decoded here, once,
//! into named records. The core never indexes raw reply tuples.

use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

/// D-Bus service name of the session daemon.
pub const SERVICE_NAME: &str = "org.ladish";

/// Object path of the control interface (studio lifecycle).
pub const CONTROL_PATH: &str = "/org/ladish/Control";

/// Object path of the loaded studio.
pub const STUDIO_PATH: &str = "/org/ladish/Studio";

/// Room object paths are the studio path sibling with a numeric suffix,
/// e.g. `/org/ladish/Room1`.
pub const ROOM_PATH_PREFIX: &str = "/org/ladish/Room";

pub const CONTROL_INTERFACE: &str = "org.ladish.Control";
pub const STUDIO_INTERFACE: &str = "org.ladish.Studio";
pub const ROOM_INTERFACE: &str = "org.ladish.Room";
pub const PATCHBAY_INTERFACE: &str = "org.jackaudio.JackPatchbay";
pub const GRAPH_DICT_INTERFACE: &str = "org.ladish.GraphDict";
pub const GRAPH_MANAGER_INTERFACE: &str = "org.ladish.GraphManager";
pub const APP_SUPERVISOR_INTERFACE: &str = "org.ladish.AppSupervisor";

/// Graph-dict object classes, first argument of `GraphDict.Get`/`Set`.
pub const DICT_OBJECT_GRAPH: u32 = 0;
pub const DICT_OBJECT_CLIENT: u32 = 1;
pub const DICT_OBJECT_PORT: u32 = 2;
pub const DICT_OBJECT_CONNECTION: u32 = 3;

/// Per-client canvas layout keys persisted in the session graph dict.
pub const KEY_CANVAS_X: &str = "http://ladish.org/ns/canvas/x";
pub const KEY_CANVAS_Y: &str = "http://ladish.org/ns/canvas/y";
pub const KEY_CANVAS_SPLIT: &str = "http://kxstudio.sourceforge.net/ns/canvas/split";
pub const KEY_CANVAS_X_SPLIT: &str = "http://kxstudio.sourceforge.net/ns/canvas/x_split";
pub const KEY_CANVAS_Y_SPLIT: &str = "http://kxstudio.sourceforge.net/ns/canvas/y_split";

/// Per-port key marking a MIDI port as bridged through a2jmidid.
pub const KEY_A2J_PORT: &str = "http://ladish.org/ns/a2j";

// JACK port flag bits as reported by the patchbay interface.
pub const PORT_FLAG_INPUT: u32 = 0x0000_0001;
pub const PORT_FLAG_OUTPUT: u32 = 0x0000_0002;
pub const PORT_FLAG_PHYSICAL: u32 = 0x0000_0004;
pub const PORT_FLAG_CAN_MONITOR: u32 = 0x0000_0008;
pub const PORT_FLAG_TERMINAL: u32 = 0x0000_0010;

// JACK port payload types.
pub const PORT_TYPE_AUDIO: u32 = 0;
pub const PORT_TYPE_MIDI: u32 = 1;

/// One port inside a `GetGraph` client entry. Wire signature `(tsuu)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct PortRecord {
    pub id: u64,
    pub name: String,
    pub flags: u32,
    pub kind: u32,
}

/// One client entry of a `GetGraph` reply. Wire signature `(tsa(tsuu))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct GroupRecord {
    pub id: u64,
    pub name: String,
    pub ports: Vec<PortRecord>,
}

/// One connection entry of a `GetGraph` reply. Wire signature `(tstststst)`.
///
/// The daemon repeats the endpoint client/port names; only the three ids
/// matter to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct ConnectionRecord {
    pub source_group: u64,
    pub source_group_name: String,
    pub source_port: u64,
    pub source_port_name: String,
    pub target_group: u64,
    pub target_group_name: String,
    pub target_port: u64,
    pub target_port_name: String,
    pub id: u64,
}

/// One row of an `AppSupervisor.GetAll2` reply. Wire signature `(tsbbs)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct AppEntry {
    /// Stable ordering key within the supervisor.
    pub number: u64,
    pub name: String,
    pub active: bool,
    /// Whether the app was launched inside a terminal.
    pub terminal: bool,
    /// Free-form level label ("0", "1", "lash", ...).
    pub level: String,
}

impl AppEntry {
    /// Display label in the `[L1] (inactive) name` form the panels use.
    /// Digit-only levels get an `L` prefix; the level is upper-cased.
    pub fn display_label(&self) -> String {
        let mut text = String::from("[");
        if !self.level.is_empty() && self.level.bytes().all(|b| b.is_ascii_digit()) {
            text.push('L');
        }
        text.push_str(&self.level.to_uppercase());
        text.push_str("] ");
        if !self.active {
            text.push_str("(inactive) ");
        }
        text.push_str(&self.name);
        text
    }
}

/// Derive the externally-visible room index from a room object path.
///
/// The daemon encodes the index as the path suffix (`/org/ladish/Room2` is
/// index 2). Returns `None` for paths outside the room namespace.
pub fn room_index_from_path(path: &str) -> Option<usize> {
    path.strip_prefix(ROOM_PATH_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_signatures() {
        assert_eq!(PortRecord::signature().to_string(), "(tsuu)");
        assert_eq!(GroupRecord::signature().to_string(), "(tsa(tsuu))");
        assert_eq!(ConnectionRecord::signature().to_string(), "(tstststst)");
        assert_eq!(AppEntry::signature().to_string(), "(tsbbs)");
    }

    #[test]
    fn test_app_entry_label_digit_level() {
        let app = AppEntry {
            number: 1,
            name: "Ardour".to_string(),
            active: true,
            terminal: false,
            level: "1".to_string(),
        };
        assert_eq!(app.display_label(), "[L1] Ardour");
    }

    #[test]
    fn test_app_entry_label_named_level_inactive() {
        let app = AppEntry {
            number: 2,
            name: "jack_mixer".to_string(),
            active: false,
            terminal: true,
            level: "lash".to_string(),
        };
        assert_eq!(app.display_label(), "[LASH] (inactive) jack_mixer");
    }

    #[test]
    fn test_room_index_from_path() {
        assert_eq!(room_index_from_path("/org/ladish/Room1"), Some(1));
        assert_eq!(room_index_from_path("/org/ladish/Room12"), Some(12));
        assert_eq!(room_index_from_path("/org/ladish/Studio"), None);
        assert_eq!(room_index_from_path("/org/ladish/Room"), None);
    }
}
