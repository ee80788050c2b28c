// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Full-state resync from the session daemon.
//!
//! Used at startup, on studio appearance, and whenever incremental events
//! can no longer be trusted. The load is all-or-nothing: the model is
//! cleared up front, and if any remote query fails midway everything is
//! cleared again rather than left half-populated. Individual dangling
//! entries inside an otherwise good dump are dropped with a warning.

use crate::graph::store::GraphStore;
use crate::reconciler::StudioState;
use crate::rooms::RoomIndex;
use crate::session::remote::{RemoteError, SessionControl, SupervisorRef};
use crate::view::{Canvas, ViewProjector};
use studiobay_ipc::room_index_from_path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("snapshot load failed: {0}")]
    LoadFailed(#[from] RemoteError),
}

/// Replace the whole model with the daemon's current state.
pub fn load_full<S: SessionControl, C: Canvas>(
    service: &S,
    store: &mut GraphStore,
    rooms: &mut RoomIndex,
    studio: &mut StudioState,
    projector: &mut ViewProjector<C>,
) -> Result<(), SnapshotError> {
    clear_all(store, rooms, studio, projector);
    if let Err(e) = populate(service, store, rooms, studio, projector) {
        clear_all(store, rooms, studio, projector);
        return Err(SnapshotError::LoadFailed(e));
    }
    info!(
        "resynced: {} groups, {} ports, {} connections, {} room slots",
        store.group_count(),
        store.port_count(),
        store.connection_count(),
        rooms.len() - 1
    );
    Ok(())
}

fn clear_all<C: Canvas>(
    store: &mut GraphStore,
    rooms: &mut RoomIndex,
    studio: &mut StudioState,
    projector: &mut ViewProjector<C>,
) {
    store.clear();
    rooms.clear();
    studio.clear();
    projector.clear();
}

fn populate<S: SessionControl, C: Canvas>(
    service: &S,
    store: &mut GraphStore,
    rooms: &mut RoomIndex,
    studio: &mut StudioState,
    projector: &mut ViewProjector<C>,
) -> Result<(), RemoteError> {
    studio.name = service.studio_name()?;
    studio.started = service.studio_is_started()?;
    studio.apps = service.get_app_list(SupervisorRef::Studio)?;

    let dump = service.get_full_graph()?;
    for group in &dump.groups {
        let changes = store.add_group(group.id, &group.name);
        projector.project(store, service, &changes);
        for port in &group.ports {
            match store.add_port(group.id, port.id, &port.name, port.direction, port.media) {
                Ok(changes) => projector.project(store, service, &changes),
                Err(e) => warn!("dump entry dropped: {}", e),
            }
        }
    }
    for conn in &dump.connections {
        match store.connect(conn.id, conn.source_port, conn.target_port) {
            Ok(changes) => projector.project(store, service, &changes),
            Err(e) => warn!("dump entry dropped: {}", e),
        }
    }

    for listing in service.get_room_list()? {
        let Some(index) = room_index_from_path(&listing.path) else {
            warn!("room path {} carries no index, skipped", listing.path);
            continue;
        };
        match rooms.insert_at(index, &listing.path, &listing.name) {
            Ok(_) => {
                let apps = service.get_app_list(SupervisorRef::Room(&listing.path))?;
                if let Some(room) = rooms.room_by_path_mut(&listing.path) {
                    room.project = listing.project.clone();
                    room.apps = apps;
                }
            }
            Err(e) => warn!("room {} skipped: {}", listing.path, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{MediaKind, PortDirection};
    use crate::session::events::SessionEvent;
    use crate::session::fake::FakeSession;
    use crate::session::remote::{ConnectionDump, GraphDump, GroupDump, PortDump, RoomListing};
    use crate::view::testing::RecordingCanvas;
    use studiobay_ipc::AppEntry;

    fn fixture_session() -> FakeSession {
        let mut service = FakeSession::default();
        service.studio_name = "My Studio".to_string();
        service.started = true;
        service.studio_apps = vec![AppEntry {
            number: 1,
            name: "jack_mixer".to_string(),
            active: true,
            terminal: false,
            level: "0".to_string(),
        }];
        service.graph = GraphDump {
            groups: vec![
                GroupDump {
                    id: 1,
                    name: "App".to_string(),
                    ports: vec![PortDump {
                        id: 10,
                        name: "out".to_string(),
                        direction: PortDirection::Output,
                        media: MediaKind::AudioNative,
                    }],
                },
                GroupDump {
                    id: 2,
                    name: "Hw".to_string(),
                    ports: vec![PortDump {
                        id: 20,
                        name: "in".to_string(),
                        direction: PortDirection::Input,
                        media: MediaKind::AudioNative,
                    }],
                },
            ],
            connections: vec![ConnectionDump {
                id: 100,
                source_port: 10,
                target_port: 20,
            }],
        };
        service.rooms = vec![RoomListing {
            path: "/org/ladish/Room2".to_string(),
            name: "Tracking".to_string(),
            project: Some("demo".to_string()),
        }];
        service
    }

    fn empty_model() -> (GraphStore, RoomIndex, StudioState, ViewProjector<RecordingCanvas>) {
        (
            GraphStore::new(),
            RoomIndex::new(),
            StudioState::default(),
            ViewProjector::new(RecordingCanvas::default()),
        )
    }

    #[test]
    fn test_full_load_populates_model_and_canvas() {
        let service = fixture_session();
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();

        load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector).unwrap();

        assert_eq!(studio.name, "My Studio");
        assert!(studio.started);
        assert_eq!(studio.apps.len(), 1);
        assert_eq!(store.group_count(), 2);
        assert_eq!(store.connection_count(), 1);
        assert_eq!(rooms.room_at(2).unwrap().project.as_deref(), Some("demo"));
        assert!(rooms.is_placeholder(1));

        assert_eq!(
            projector.canvas().calls,
            vec![
                "clear",
                "add_group 1 App split=false Application",
                "add_port 1 10 out Output AudioNative",
                "add_group 2 Hw split=false Application",
                "add_port 2 20 in Input AudioNative",
                "connect 100 10->20",
            ]
        );
    }

    #[test]
    fn test_failed_load_leaves_model_empty() {
        let mut service = fixture_session();
        service.fail_rooms = true;
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();

        // Seed stale state to prove it does not survive the failed load.
        store.add_group(99, "Stale");

        let err = load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LoadFailed(RemoteError::Unavailable(_))
        ));
        assert!(store.is_empty());
        assert!(rooms.is_empty());
        assert_eq!(studio, StudioState::default());
        assert_eq!(projector.canvas().calls.last().unwrap(), "clear");
    }

    #[test]
    fn test_failed_graph_fetch_aborts_load() {
        let mut service = fixture_session();
        service.fail_graph = true;
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();

        let err = load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::LoadFailed(RemoteError::Unavailable(_))
        ));
        assert!(store.is_empty());
        assert!(rooms.is_empty());
        assert_eq!(studio, StudioState::default());
    }

    #[test]
    fn test_failed_app_fetch_aborts_load() {
        let mut service = fixture_session();
        service.fail_apps = true;
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();

        load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector).unwrap_err();
        assert!(store.is_empty());
        assert!(rooms.is_empty());
    }

    #[test]
    fn test_dangling_dump_entries_are_dropped_not_fatal() {
        let mut service = fixture_session();
        service.graph.connections.push(ConnectionDump {
            id: 101,
            source_port: 10,
            target_port: 999,
        });
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();

        load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector).unwrap();
        assert_eq!(store.connection_count(), 1);
        assert!(store.connection(101).is_none());
    }

    #[test]
    fn test_snapshot_equals_event_replay() {
        // Loading a dump and replaying the equivalent event stream must
        // land on the same graph.
        let service = fixture_session();
        let (mut store, mut rooms, mut studio, mut projector) = empty_model();
        load_full(&service, &mut store, &mut rooms, &mut studio, &mut projector).unwrap();

        let mut recon = crate::reconciler::Reconciler::new(
            fixture_session(),
            ViewProjector::new(RecordingCanvas::default()),
        );
        for event in [
            SessionEvent::ClientAppeared {
                id: 1,
                name: "App".to_string(),
            },
            SessionEvent::PortAppeared {
                group: 1,
                port: 10,
                name: "out".to_string(),
                direction: PortDirection::Output,
                media: MediaKind::AudioNative,
            },
            SessionEvent::ClientAppeared {
                id: 2,
                name: "Hw".to_string(),
            },
            SessionEvent::PortAppeared {
                group: 2,
                port: 20,
                name: "in".to_string(),
                direction: PortDirection::Input,
                media: MediaKind::AudioNative,
            },
            SessionEvent::PortsConnected {
                connection: 100,
                source: 10,
                target: 20,
            },
            SessionEvent::RoomAppeared {
                path: "/org/ladish/Room2".to_string(),
                name: "Tracking".to_string(),
            },
        ] {
            recon.apply(event);
        }

        assert_eq!(recon.store(), &store);
        assert_eq!(recon.rooms(), &rooms);
    }
}
