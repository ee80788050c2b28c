// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! D-Bus client for the LADISH session daemon.
//!
//! All raw protocol decoding lives here: reply tuples become the records
//! from `studiobay-ipc`, port flag bits become model enums, and every
//! signal is translated into a [`SessionEvent`] before the core sees it.
//! Queries and mutations are exposed through the blocking [`SessionControl`]
//! trait; each call is bounded by the configured timeout so a vanished
//! daemon surfaces as `RemoteError::Unavailable` instead of a hang.

use crate::graph::types::{ConnectionId, GroupId, MediaKind, PortDirection, PortId};
use crate::session::events::SessionEvent;
use crate::session::remote::{
    ConnectionDump, GraphDump, GroupDump, PortDump, RemoteError, RoomListing, SessionControl,
    SupervisorRef,
};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use studiobay_ipc::{self as ipc, AppEntry, ConnectionRecord, GroupRecord};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedValue;
use zbus::{proxy, Connection, Result as ZbusResult};

/// Studio lifecycle interface.
#[proxy(
    interface = "org.ladish.Control",
    default_service = "org.ladish",
    default_path = "/org/ladish/Control"
)]
trait Control {
    fn is_studio_loaded(&self) -> ZbusResult<bool>;

    #[zbus(signal)]
    fn studio_appeared(&self) -> ZbusResult<()>;
    #[zbus(signal)]
    fn studio_disappeared(&self) -> ZbusResult<()>;
}

/// The loaded studio object.
#[proxy(
    interface = "org.ladish.Studio",
    default_service = "org.ladish",
    default_path = "/org/ladish/Studio"
)]
trait Studio {
    fn get_name(&self) -> ZbusResult<String>;
    fn is_started(&self) -> ZbusResult<bool>;
    fn get_room_list(&self) -> ZbusResult<Vec<(String, HashMap<String, OwnedValue>)>>;

    #[zbus(signal)]
    fn studio_started(&self) -> ZbusResult<()>;
    #[zbus(signal)]
    fn studio_stopped(&self) -> ZbusResult<()>;
    #[zbus(signal)]
    fn studio_renamed(&self, name: &str) -> ZbusResult<()>;
    #[zbus(signal)]
    fn room_appeared(
        &self,
        room_path: &str,
        properties: HashMap<String, OwnedValue>,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn room_disappeared(
        &self,
        room_path: &str,
        properties: HashMap<String, OwnedValue>,
    ) -> ZbusResult<()>;
}

/// One room object; bound at its own path.
#[proxy(interface = "org.ladish.Room", default_service = "org.ladish")]
trait Room {
    fn get_name(&self) -> ZbusResult<String>;
    fn get_project_properties(&self) -> ZbusResult<(u64, HashMap<String, OwnedValue>)>;
}

/// JACK patchbay interface exposed on the studio object.
#[proxy(
    interface = "org.jackaudio.JackPatchbay",
    default_service = "org.ladish",
    default_path = "/org/ladish/Studio"
)]
trait Patchbay {
    fn get_graph(
        &self,
        known_version: u64,
    ) -> ZbusResult<(u64, Vec<GroupRecord>, Vec<ConnectionRecord>)>;
    #[zbus(name = "ConnectPortsByID")]
    fn connect_ports_by_id(&self, source_port: u64, target_port: u64) -> ZbusResult<()>;
    #[zbus(name = "DisconnectPortsByConnectionID")]
    fn disconnect_ports_by_connection_id(&self, connection_id: u64) -> ZbusResult<()>;

    #[zbus(signal)]
    fn client_appeared(
        &self,
        new_graph_version: u64,
        client_id: u64,
        client_name: &str,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn client_disappeared(
        &self,
        new_graph_version: u64,
        client_id: u64,
        client_name: &str,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn client_renamed(
        &self,
        new_graph_version: u64,
        client_id: u64,
        old_name: &str,
        new_name: &str,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn port_appeared(
        &self,
        new_graph_version: u64,
        client_id: u64,
        client_name: &str,
        port_id: u64,
        port_name: &str,
        port_flags: u32,
        port_type: u32,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn port_disappeared(
        &self,
        new_graph_version: u64,
        client_id: u64,
        client_name: &str,
        port_id: u64,
        port_name: &str,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn port_renamed(
        &self,
        new_graph_version: u64,
        client_id: u64,
        client_name: &str,
        port_id: u64,
        old_name: &str,
        new_name: &str,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn ports_connected(
        &self,
        new_graph_version: u64,
        source_client_id: u64,
        source_client_name: &str,
        source_port_id: u64,
        source_port_name: &str,
        target_client_id: u64,
        target_client_name: &str,
        target_port_id: u64,
        target_port_name: &str,
        connection_id: u64,
    ) -> ZbusResult<()>;
    #[zbus(signal)]
    fn ports_disconnected(
        &self,
        new_graph_version: u64,
        source_client_id: u64,
        source_client_name: &str,
        source_port_id: u64,
        source_port_name: &str,
        target_client_id: u64,
        target_client_name: &str,
        target_port_id: u64,
        target_port_name: &str,
        connection_id: u64,
    ) -> ZbusResult<()>;
}

/// Key/value metadata persisted in the session graph.
#[proxy(
    interface = "org.ladish.GraphDict",
    default_service = "org.ladish",
    default_path = "/org/ladish/Studio"
)]
trait GraphDict {
    fn get(&self, object_type: u32, object_id: u64, key: &str) -> ZbusResult<String>;
    fn set(&self, object_type: u32, object_id: u64, key: &str, value: &str) -> ZbusResult<()>;
}

/// Rename operations on graph objects.
#[proxy(
    interface = "org.ladish.GraphManager",
    default_service = "org.ladish",
    default_path = "/org/ladish/Studio"
)]
trait GraphManager {
    fn rename_client(&self, client_id: u64, name: &str) -> ZbusResult<()>;
    fn rename_port(&self, port_id: u64, name: &str) -> ZbusResult<()>;
}

/// Application supervision; bound at the studio or a room path.
#[proxy(interface = "org.ladish.AppSupervisor", default_service = "org.ladish")]
trait AppSupervisor {
    fn get_all2(&self) -> ZbusResult<(u64, Vec<AppEntry>)>;
}

/// Connected client for the session daemon.
#[derive(Clone)]
pub struct SessionClient {
    connection: Connection,
    control: ControlProxy<'static>,
    studio: StudioProxy<'static>,
    patchbay: PatchbayProxy<'static>,
    graph_dict: GraphDictProxy<'static>,
    graph_manager: GraphManagerProxy<'static>,
    handle: tokio::runtime::Handle,
    call_timeout: Duration,
}

impl SessionClient {
    /// Connect to the session bus and verify the daemon answers.
    /// Must be called from within a tokio runtime; blocking calls issued
    /// later are driven by that same runtime.
    pub async fn connect(call_timeout: Duration) -> Result<Self, RemoteError> {
        info!("Connecting to session daemon...");

        let connection = Connection::session()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let control = ControlProxy::new(&connection)
            .await
            .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
        let studio = StudioProxy::new(&connection)
            .await
            .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
        let patchbay = PatchbayProxy::new(&connection)
            .await
            .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
        let graph_dict = GraphDictProxy::new(&connection)
            .await
            .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
        let graph_manager = GraphManagerProxy::new(&connection)
            .await
            .map_err(|e| RemoteError::CallFailed(e.to_string()))?;

        match control.is_studio_loaded().await {
            Ok(loaded) => info!("Connected to session daemon (studio loaded: {})", loaded),
            Err(e) => return Err(RemoteError::Unavailable(e.to_string())),
        }

        Ok(Self {
            connection,
            control,
            studio,
            patchbay,
            graph_dict,
            graph_manager,
            handle: tokio::runtime::Handle::current(),
            call_timeout,
        })
    }

    /// Drive a proxy call to completion with the configured time bound.
    fn call<T, F>(&self, fut: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        match self.handle.block_on(tokio::time::timeout(self.call_timeout, fut)) {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Unavailable(format!(
                "call timed out after {}ms",
                self.call_timeout.as_millis()
            ))),
        }
    }

    async fn port_is_bridged(&self, port: PortId) -> bool {
        matches!(
            self.graph_dict
                .get(ipc::DICT_OBJECT_PORT, port, ipc::KEY_A2J_PORT)
                .await
                .as_deref(),
            Ok("yes")
        )
    }

    async fn room_project(&self, path: &str) -> Option<String> {
        let room = RoomProxy::builder(&self.connection)
            .path(path.to_string())
            .ok()?
            .build()
            .await
            .ok()?;
        let (_version, properties) = room.get_project_properties().await.ok()?;
        string_prop(&properties, "name")
    }

    /// Listen for daemon signals and forward them as [`SessionEvent`]s.
    /// Returns when all signal streams end (connection lost).
    pub async fn run_event_stream(
        &self,
        tx: UnboundedSender<SessionEvent>,
    ) -> Result<(), RemoteError> {
        use futures::StreamExt;

        let subscribe = |e: zbus::Error| RemoteError::CallFailed(e.to_string());

        let mut studio_appeared = self.control.receive_studio_appeared().await.map_err(subscribe)?;
        let mut studio_disappeared =
            self.control.receive_studio_disappeared().await.map_err(subscribe)?;
        let mut studio_started = self.studio.receive_studio_started().await.map_err(subscribe)?;
        let mut studio_stopped = self.studio.receive_studio_stopped().await.map_err(subscribe)?;
        let mut studio_renamed = self.studio.receive_studio_renamed().await.map_err(subscribe)?;
        let mut room_appeared = self.studio.receive_room_appeared().await.map_err(subscribe)?;
        let mut room_disappeared =
            self.studio.receive_room_disappeared().await.map_err(subscribe)?;
        let mut client_appeared =
            self.patchbay.receive_client_appeared().await.map_err(subscribe)?;
        let mut client_disappeared =
            self.patchbay.receive_client_disappeared().await.map_err(subscribe)?;
        let mut client_renamed = self.patchbay.receive_client_renamed().await.map_err(subscribe)?;
        let mut port_appeared = self.patchbay.receive_port_appeared().await.map_err(subscribe)?;
        let mut port_disappeared =
            self.patchbay.receive_port_disappeared().await.map_err(subscribe)?;
        let mut port_renamed = self.patchbay.receive_port_renamed().await.map_err(subscribe)?;
        let mut ports_connected =
            self.patchbay.receive_ports_connected().await.map_err(subscribe)?;
        let mut ports_disconnected =
            self.patchbay.receive_ports_disconnected().await.map_err(subscribe)?;

        loop {
            tokio::select! {
                Some(_) = studio_appeared.next() => {
                    let _ = tx.send(SessionEvent::StudioAppeared);
                }
                Some(_) = studio_disappeared.next() => {
                    let _ = tx.send(SessionEvent::StudioDisappeared);
                }
                Some(_) = studio_started.next() => {
                    let _ = tx.send(SessionEvent::StudioStarted);
                }
                Some(_) = studio_stopped.next() => {
                    let _ = tx.send(SessionEvent::StudioStopped);
                }
                Some(signal) = studio_renamed.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::StudioRenamed {
                            name: args.name.to_string(),
                        });
                    }
                }
                Some(signal) = room_appeared.next() => {
                    if let Ok(args) = signal.args() {
                        let name = string_prop(&args.properties, "name")
                            .unwrap_or_else(|| args.room_path.to_string());
                        let _ = tx.send(SessionEvent::RoomAppeared {
                            path: args.room_path.to_string(),
                            name,
                        });
                    }
                }
                Some(signal) = room_disappeared.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::RoomDisappeared {
                            path: args.room_path.to_string(),
                        });
                    }
                }
                Some(signal) = client_appeared.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::ClientAppeared {
                            id: args.client_id,
                            name: args.client_name.to_string(),
                        });
                    }
                }
                Some(signal) = client_disappeared.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::ClientDisappeared { id: args.client_id });
                    }
                }
                Some(signal) = client_renamed.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::ClientRenamed {
                            id: args.client_id,
                            name: args.new_name.to_string(),
                        });
                    }
                }
                Some(signal) = port_appeared.next() => {
                    if let Ok(args) = signal.args() {
                        let bridged = if args.port_type == ipc::PORT_TYPE_MIDI {
                            self.port_is_bridged(args.port_id).await
                        } else {
                            false
                        };
                        let _ = tx.send(SessionEvent::PortAppeared {
                            group: args.client_id,
                            port: args.port_id,
                            name: args.port_name.to_string(),
                            direction: PortDirection::from_flags(args.port_flags),
                            media: MediaKind::from_wire(args.port_type, bridged),
                        });
                    }
                }
                Some(signal) = port_disappeared.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::PortDisappeared { port: args.port_id });
                    }
                }
                Some(signal) = port_renamed.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::PortRenamed {
                            port: args.port_id,
                            name: args.new_name.to_string(),
                        });
                    }
                }
                Some(signal) = ports_connected.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::PortsConnected {
                            connection: args.connection_id,
                            source: args.source_port_id,
                            target: args.target_port_id,
                        });
                    }
                }
                Some(signal) = ports_disconnected.next() => {
                    if let Ok(args) = signal.args() {
                        let _ = tx.send(SessionEvent::PortsDisconnected {
                            connection: args.connection_id,
                        });
                    }
                }
                else => {
                    // All streams ended, connection lost.
                    break;
                }
            }
        }

        debug!("signal streams ended");
        Ok(())
    }
}

impl SessionControl for SessionClient {
    fn get_full_graph(&self) -> Result<GraphDump, RemoteError> {
        self.call(async {
            let (_version, groups, connections) = self
                .patchbay
                .get_graph(0)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;

            let mut dump = GraphDump::default();
            for group in groups {
                let mut ports = Vec::with_capacity(group.ports.len());
                for port in group.ports {
                    let bridged = if port.kind == ipc::PORT_TYPE_MIDI {
                        self.port_is_bridged(port.id).await
                    } else {
                        false
                    };
                    ports.push(PortDump {
                        id: port.id,
                        name: port.name,
                        direction: PortDirection::from_flags(port.flags),
                        media: MediaKind::from_wire(port.kind, bridged),
                    });
                }
                dump.groups.push(GroupDump {
                    id: group.id,
                    name: group.name,
                    ports,
                });
            }
            for conn in connections {
                dump.connections.push(ConnectionDump {
                    id: conn.id,
                    source_port: conn.source_port,
                    target_port: conn.target_port,
                });
            }
            Ok(dump)
        })
    }

    fn get_room_list(&self) -> Result<Vec<RoomListing>, RemoteError> {
        self.call(async {
            let raw = self
                .studio
                .get_room_list()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;

            let mut rooms = Vec::with_capacity(raw.len());
            for (path, properties) in raw {
                let name =
                    string_prop(&properties, "name").unwrap_or_else(|| path.clone());
                let project = self.room_project(&path).await;
                rooms.push(RoomListing {
                    path,
                    name,
                    project,
                });
            }
            Ok(rooms)
        })
    }

    fn get_room(&self, path: &str) -> Result<RoomListing, RemoteError> {
        self.call(async {
            let room = RoomProxy::builder(&self.connection)
                .path(path.to_string())
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?
                .build()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
            let name = room
                .get_name()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
            let project = self.room_project(path).await;
            Ok(RoomListing {
                path: path.to_string(),
                name,
                project,
            })
        })
    }

    fn get_app_list(&self, supervisor: SupervisorRef<'_>) -> Result<Vec<AppEntry>, RemoteError> {
        let path = match supervisor {
            SupervisorRef::Studio => ipc::STUDIO_PATH.to_string(),
            SupervisorRef::Room(room_path) => room_path.to_string(),
        };
        self.call(async move {
            let proxy = AppSupervisorProxy::builder(&self.connection)
                .path(path)
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?
                .build()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
            let (_version, apps) = proxy
                .get_all2()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))?;
            Ok(apps)
        })
    }

    fn get_group_metadata(&self, group: GroupId, key: &str) -> Result<Option<String>, RemoteError> {
        self.call(async {
            // The dict interface answers with an error for unset keys;
            // that is "no value", not a failure.
            Ok(match self.graph_dict.get(ipc::DICT_OBJECT_CLIENT, group, key).await {
                Ok(value) if !value.is_empty() => Some(value),
                _ => None,
            })
        })
    }

    fn studio_name(&self) -> Result<String, RemoteError> {
        self.call(async {
            self.studio
                .get_name()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn studio_is_started(&self) -> Result<bool, RemoteError> {
        self.call(async {
            self.studio
                .is_started()
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn set_group_metadata(
        &self,
        group: GroupId,
        key: &str,
        value: &str,
    ) -> Result<(), RemoteError> {
        debug!("set metadata {} on group {}", key, group);
        self.call(async {
            self.graph_dict
                .set(ipc::DICT_OBJECT_CLIENT, group, key, value)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn rename_group(&self, group: GroupId, name: &str) -> Result<(), RemoteError> {
        debug!("rename group {} to {}", group, name);
        self.call(async {
            self.graph_manager
                .rename_client(group, name)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn rename_port(&self, port: PortId, name: &str) -> Result<(), RemoteError> {
        debug!("rename port {} to {}", port, name);
        self.call(async {
            self.graph_manager
                .rename_port(port, name)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn connect_ports(&self, source: PortId, target: PortId) -> Result<(), RemoteError> {
        debug!("connect ports {} -> {}", source, target);
        self.call(async {
            self.patchbay
                .connect_ports_by_id(source, target)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }

    fn disconnect_connection(&self, connection: ConnectionId) -> Result<(), RemoteError> {
        debug!("disconnect connection {}", connection);
        self.call(async {
            self.patchbay
                .disconnect_ports_by_connection_id(connection)
                .await
                .map_err(|e| RemoteError::CallFailed(e.to_string()))
        })
    }
}

fn string_prop(properties: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    let value = properties.get(key)?;
    match value.downcast_ref::<String>() {
        Ok(s) if !s.is_empty() => Some(s),
        Ok(_) => None,
        Err(_) => {
            warn!("property {} is not a string", key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Value;

    fn prop(value: Value<'_>) -> OwnedValue {
        OwnedValue::try_from(value).unwrap()
    }

    #[test]
    fn test_string_prop_decodes_only_nonempty_strings() {
        let mut properties = HashMap::new();
        properties.insert("name".to_string(), prop(Value::from("Mix")));
        properties.insert("empty".to_string(), prop(Value::from("")));
        properties.insert("count".to_string(), prop(Value::from(3u32)));

        assert_eq!(string_prop(&properties, "name").as_deref(), Some("Mix"));
        assert_eq!(string_prop(&properties, "empty"), None);
        assert_eq!(string_prop(&properties, "count"), None);
        assert_eq!(string_prop(&properties, "missing"), None);
    }
}
