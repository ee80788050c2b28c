// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Canonical in-memory model of the session graph.
//!
//! Every mutation is idempotent under duplicate delivery and returns the
//! ordered list of visible changes, so the view layer can decide which
//! canvas calls to emit without inspecting the store again. Signals from
//! the daemon may arrive out of order; the rules here absorb benign
//! reorderings instead of trying to re-sequence them.

use crate::graph::types::{
    Connection, ConnectionId, Group, GroupId, GroupPosition, MediaKind, Port, PortDirection,
    PortId, SplitState,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A port was announced for a group the store does not know about.
    /// The port is dropped; the next full resync picks it up.
    #[error("port {port} references unknown group {group}")]
    DanglingGroup { port: PortId, group: GroupId },
    /// A connection was announced with a missing endpoint port.
    #[error("connection {connection} references unknown port {port}")]
    DanglingPort {
        connection: ConnectionId,
        port: PortId,
    },
}

/// One visible change produced by a store mutation, in application order.
///
/// A duplicate "appeared" delivery re-emits its `Added` change without
/// touching state, so a view that missed the original event self-heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphChange {
    GroupAdded(GroupId),
    GroupRenamed(GroupId),
    GroupRemoved(GroupId),
    PortAdded(PortId),
    PortRenamed(PortId),
    PortRemoved(PortId),
    Connected(ConnectionId),
    Disconnected(ConnectionId),
}

/// The studio graph: groups, their ports, and the connections between ports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStore {
    groups: HashMap<GroupId, Group>,
    ports: HashMap<PortId, Port>,
    connections: HashMap<ConnectionId, Connection>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything. Used before a full resync and on studio unload.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.ports.clear();
        self.connections.clear();
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.ports.is_empty() && self.connections.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Add a group. Re-announcing an existing id leaves it untouched but
    /// still reports `GroupAdded` (identity is stable across rename, so the
    /// stored name wins over a stale duplicate).
    pub fn add_group(&mut self, id: GroupId, name: &str) -> Vec<GraphChange> {
        if self.groups.contains_key(&id) {
            debug!("group {} re-announced, replaying appearance", id);
        } else {
            self.groups.insert(id, Group::new(id, name.to_string()));
        }
        vec![GraphChange::GroupAdded(id)]
    }

    /// Remove a group and cascade: its ports disappear, and every
    /// connection touching those ports is disconnected first. Removing an
    /// absent id is a silent no-op.
    pub fn remove_group(&mut self, id: GroupId) -> Vec<GraphChange> {
        if self.groups.remove(&id).is_none() {
            return Vec::new();
        }
        let mut owned: Vec<PortId> = self
            .ports
            .values()
            .filter(|p| p.group == id)
            .map(|p| p.id)
            .collect();
        owned.sort_unstable();

        let mut changes = Vec::new();
        for port in owned {
            changes.extend(self.remove_port(port));
        }
        changes.push(GraphChange::GroupRemoved(id));
        changes
    }

    /// Rename a group in place; identity is unchanged. Renaming an absent
    /// id is a no-op (the group may have already disappeared).
    pub fn rename_group(&mut self, id: GroupId, new_name: &str) -> Vec<GraphChange> {
        match self.groups.get_mut(&id) {
            Some(group) => {
                group.name = new_name.to_string();
                vec![GraphChange::GroupRenamed(id)]
            }
            None => {
                debug!("rename of unknown group {} ignored", id);
                Vec::new()
            }
        }
    }

    /// Add a port to an existing group. The owning group must already be
    /// present; a port that arrives first is rejected as dangling and left
    /// for the next full resync.
    pub fn add_port(
        &mut self,
        group: GroupId,
        id: PortId,
        name: &str,
        direction: PortDirection,
        media: MediaKind,
    ) -> Result<Vec<GraphChange>, GraphError> {
        if self.ports.contains_key(&id) {
            debug!("port {} re-announced, replaying appearance", id);
            return Ok(vec![GraphChange::PortAdded(id)]);
        }
        if !self.groups.contains_key(&group) {
            return Err(GraphError::DanglingGroup { port: id, group });
        }
        self.ports.insert(
            id,
            Port {
                id,
                group,
                name: name.to_string(),
                direction,
                media,
            },
        );
        Ok(vec![GraphChange::PortAdded(id)])
    }

    /// Remove a port, disconnecting everything attached to it first.
    /// Removing an absent id is a silent no-op.
    pub fn remove_port(&mut self, id: PortId) -> Vec<GraphChange> {
        if self.ports.remove(&id).is_none() {
            return Vec::new();
        }
        let mut attached: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.source_port == id || c.target_port == id)
            .map(|c| c.id)
            .collect();
        attached.sort_unstable();

        let mut changes = Vec::new();
        for conn in attached {
            changes.extend(self.disconnect(conn));
        }
        changes.push(GraphChange::PortRemoved(id));
        changes
    }

    /// Rename a port in place. Renaming an absent id is a no-op.
    pub fn rename_port(&mut self, id: PortId, new_name: &str) -> Vec<GraphChange> {
        match self.ports.get_mut(&id) {
            Some(port) => {
                port.name = new_name.to_string();
                vec![GraphChange::PortRenamed(id)]
            }
            None => {
                debug!("rename of unknown port {} ignored", id);
                Vec::new()
            }
        }
    }

    /// Record a connection between two known ports. A duplicate id replays
    /// `Connected`; a missing endpoint is a dangling reference and the
    /// connection is dropped.
    pub fn connect(
        &mut self,
        id: ConnectionId,
        source_port: PortId,
        target_port: PortId,
    ) -> Result<Vec<GraphChange>, GraphError> {
        if self.connections.contains_key(&id) {
            debug!("connection {} re-announced, replaying", id);
            return Ok(vec![GraphChange::Connected(id)]);
        }
        for port in [source_port, target_port] {
            if !self.ports.contains_key(&port) {
                return Err(GraphError::DanglingPort {
                    connection: id,
                    port,
                });
            }
        }
        self.connections.insert(
            id,
            Connection {
                id,
                source_port,
                target_port,
            },
        );
        Ok(vec![GraphChange::Connected(id)])
    }

    /// Remove a connection. Removing an absent id is a silent no-op.
    pub fn disconnect(&mut self, id: ConnectionId) -> Vec<GraphChange> {
        if self.connections.remove(&id).is_some() {
            vec![GraphChange::Disconnected(id)]
        } else {
            Vec::new()
        }
    }

    /// Update the cached canvas layout for a group. Unknown ids are logged
    /// and ignored; layout is cosmetic state.
    pub fn set_position(&mut self, id: GroupId, position: GroupPosition) {
        match self.groups.get_mut(&id) {
            Some(group) => group.position = Some(position),
            None => warn!("position update for unknown group {}", id),
        }
    }

    /// Update the cached split state for a group.
    pub fn set_split(&mut self, id: GroupId, split: SplitState) {
        match self.groups.get_mut(&id) {
            Some(group) => group.split = split,
            None => warn!("split update for unknown group {}", id),
        }
    }
}
