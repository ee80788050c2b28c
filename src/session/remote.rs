// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The query/mutation surface the core uses to talk to the session daemon.
//!
//! Calls are synchronous-blocking from the caller's perspective but time
//! bounded: an implementation must report `RemoteError::Unavailable` rather
//! than block indefinitely when the daemon has gone away.

use crate::graph::types::{ConnectionId, GroupId, MediaKind, PortDirection, PortId};
use studiobay_ipc::AppEntry;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The daemon could not be reached or the call timed out.
    #[error("session service unavailable: {0}")]
    Unavailable(String),
    /// The daemon answered with an error.
    #[error("remote call failed: {0}")]
    CallFailed(String),
}

/// Fully decoded `GetGraph` reply: raw flags and payload types are already
/// mapped to the model enums at the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDump {
    pub groups: Vec<GroupDump>,
    pub connections: Vec<ConnectionDump>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDump {
    pub id: GroupId,
    pub name: String,
    pub ports: Vec<PortDump>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortDump {
    pub id: PortId,
    pub name: String,
    pub direction: PortDirection,
    pub media: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDump {
    pub id: ConnectionId,
    pub source_port: PortId,
    pub target_port: PortId,
}

/// One entry of the studio's room list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomListing {
    pub path: String,
    pub name: String,
    pub project: Option<String>,
}

/// Which application supervisor to query: the studio itself or one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorRef<'a> {
    Studio,
    Room(&'a str),
}

/// Remote queries and mutations against the session daemon.
pub trait SessionControl {
    // Queries
    fn get_full_graph(&self) -> Result<GraphDump, RemoteError>;
    fn get_room_list(&self) -> Result<Vec<RoomListing>, RemoteError>;
    fn get_room(&self, path: &str) -> Result<RoomListing, RemoteError>;
    fn get_app_list(&self, supervisor: SupervisorRef<'_>) -> Result<Vec<AppEntry>, RemoteError>;
    fn get_group_metadata(&self, group: GroupId, key: &str) -> Result<Option<String>, RemoteError>;
    fn studio_name(&self) -> Result<String, RemoteError>;
    fn studio_is_started(&self) -> Result<bool, RemoteError>;

    // Mutations
    fn set_group_metadata(&self, group: GroupId, key: &str, value: &str)
        -> Result<(), RemoteError>;
    fn rename_group(&self, group: GroupId, name: &str) -> Result<(), RemoteError>;
    fn rename_port(&self, port: PortId, name: &str) -> Result<(), RemoteError>;
    fn connect_ports(&self, source: PortId, target: PortId) -> Result<(), RemoteError>;
    fn disconnect_connection(&self, connection: ConnectionId) -> Result<(), RemoteError>;
}
