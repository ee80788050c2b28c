// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Graph model types for clients, ports, and connections.

use studiobay_ipc as ipc;

pub type GroupId = u64;
pub type PortId = u64;
pub type ConnectionId = u64;

/// A client/application node in the port graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub kind: GroupKind,
    pub split: SplitState,
    /// Persisted canvas layout, once known.
    pub position: Option<GroupPosition>,
}

impl Group {
    pub fn new(id: GroupId, name: String) -> Self {
        let kind = GroupKind::from_name(&name);
        Self {
            id,
            name,
            kind,
            split: SplitState::Undefined,
            position: None,
        }
    }
}

/// Rough classification of a graph client, derived from its name.
/// Display-only; the daemon is the authority on identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Hardware,
    Application,
    /// The capture/playback boundary of a room.
    RoomBoundary,
}

impl GroupKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Hardware Playback" | "Hardware Capture" => Self::Hardware,
            "Capture" | "Playback" => Self::RoomBoundary,
            _ => Self::Application,
        }
    }
}

/// Whether a group's input and output ports are rendered as one box or two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitState {
    #[default]
    Undefined,
    Joined,
    Split,
}

impl SplitState {
    /// Decode the persisted split flag ("true"/"false", anything else unset).
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Split,
            Some("false") => Self::Joined,
            _ => Self::Undefined,
        }
    }

    pub fn as_metadata(self) -> Option<&'static str> {
        match self {
            Self::Split => Some("true"),
            Self::Joined => Some("false"),
            Self::Undefined => None,
        }
    }
}

/// Canvas coordinates for a group: the unsplit box and the split sub-box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupPosition {
    pub x: f64,
    pub y: f64,
    pub split_x: f64,
    pub split_y: f64,
}

/// A single audio/MIDI endpoint belonging to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    /// Back-reference to the owning group, not ownership.
    pub group: GroupId,
    pub name: String,
    pub direction: PortDirection,
    pub media: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Undefined,
}

impl PortDirection {
    /// Decode JACK port flag bits.
    pub fn from_flags(flags: u32) -> Self {
        if flags & ipc::PORT_FLAG_INPUT != 0 {
            Self::Input
        } else if flags & ipc::PORT_FLAG_OUTPUT != 0 {
            Self::Output
        } else {
            Self::Undefined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    AudioNative,
    MidiNative,
    /// MIDI bridged through a2jmidid.
    MidiBridged,
    Undefined,
}

impl MediaKind {
    /// Decode the JACK port payload type. `bridged` comes from the per-port
    /// a2j metadata key and only matters for MIDI ports.
    pub fn from_wire(kind: u32, bridged: bool) -> Self {
        match kind {
            ipc::PORT_TYPE_AUDIO => Self::AudioNative,
            ipc::PORT_TYPE_MIDI if bridged => Self::MidiBridged,
            ipc::PORT_TYPE_MIDI => Self::MidiNative,
            _ => Self::Undefined,
        }
    }
}

/// A connection between two ports. Never outlives either endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source_port: PortId,
    pub target_port: PortId,
}
