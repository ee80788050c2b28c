// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-memory `SessionControl` used by the core tests.

use crate::graph::types::{ConnectionId, GroupId, PortId};
use crate::session::remote::{
    GraphDump, RemoteError, RoomListing, SessionControl, SupervisorRef,
};
use std::cell::RefCell;
use std::collections::HashMap;
use studiobay_ipc::AppEntry;

#[derive(Debug, Default)]
pub struct FakeSession {
    pub graph: GraphDump,
    pub rooms: Vec<RoomListing>,
    pub studio_name: String,
    pub started: bool,
    pub studio_apps: Vec<AppEntry>,
    pub room_apps: HashMap<String, Vec<AppEntry>>,
    pub metadata: RefCell<HashMap<(GroupId, String), String>>,
    /// Remote mutations issued through the trait, in call order.
    pub mutations: RefCell<Vec<String>>,
    pub fail_graph: bool,
    pub fail_rooms: bool,
    pub fail_apps: bool,
}

impl FakeSession {
    pub fn set_metadata(&self, group: GroupId, key: &str, value: &str) {
        self.metadata
            .borrow_mut()
            .insert((group, key.to_string()), value.to_string());
    }

    fn unavailable<T>(&self) -> Result<T, RemoteError> {
        Err(RemoteError::Unavailable("fake outage".to_string()))
    }
}

impl SessionControl for FakeSession {
    fn get_full_graph(&self) -> Result<GraphDump, RemoteError> {
        if self.fail_graph {
            return self.unavailable();
        }
        Ok(self.graph.clone())
    }

    fn get_room_list(&self) -> Result<Vec<RoomListing>, RemoteError> {
        if self.fail_rooms {
            return self.unavailable();
        }
        Ok(self.rooms.clone())
    }

    fn get_room(&self, path: &str) -> Result<RoomListing, RemoteError> {
        self.rooms
            .iter()
            .find(|r| r.path == path)
            .cloned()
            .ok_or_else(|| RemoteError::CallFailed(format!("no room {path}")))
    }

    fn get_app_list(&self, supervisor: SupervisorRef<'_>) -> Result<Vec<AppEntry>, RemoteError> {
        if self.fail_apps {
            return self.unavailable();
        }
        Ok(match supervisor {
            SupervisorRef::Studio => self.studio_apps.clone(),
            SupervisorRef::Room(path) => self.room_apps.get(path).cloned().unwrap_or_default(),
        })
    }

    fn get_group_metadata(&self, group: GroupId, key: &str) -> Result<Option<String>, RemoteError> {
        Ok(self
            .metadata
            .borrow()
            .get(&(group, key.to_string()))
            .cloned())
    }

    fn studio_name(&self) -> Result<String, RemoteError> {
        Ok(self.studio_name.clone())
    }

    fn studio_is_started(&self) -> Result<bool, RemoteError> {
        Ok(self.started)
    }

    fn set_group_metadata(
        &self,
        group: GroupId,
        key: &str,
        value: &str,
    ) -> Result<(), RemoteError> {
        self.set_metadata(group, key, value);
        self.mutations
            .borrow_mut()
            .push(format!("set_metadata {group} {key}={value}"));
        Ok(())
    }

    fn rename_group(&self, group: GroupId, name: &str) -> Result<(), RemoteError> {
        self.mutations
            .borrow_mut()
            .push(format!("rename_group {group} {name}"));
        Ok(())
    }

    fn rename_port(&self, port: PortId, name: &str) -> Result<(), RemoteError> {
        self.mutations
            .borrow_mut()
            .push(format!("rename_port {port} {name}"));
        Ok(())
    }

    fn connect_ports(&self, source: PortId, target: PortId) -> Result<(), RemoteError> {
        self.mutations
            .borrow_mut()
            .push(format!("connect {source} {target}"));
        Ok(())
    }

    fn disconnect_connection(&self, connection: ConnectionId) -> Result<(), RemoteError> {
        self.mutations
            .borrow_mut()
            .push(format!("disconnect {connection}"));
        Ok(())
    }
}
