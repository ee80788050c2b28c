// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Applies session events to the model, in arrival order.
//!
//! Events carry no sequence numbers. Instead of re-ordering, the reconciler
//! leans on the store's idempotency rules: duplicates replay, absent-id
//! removals vanish, and dangling references are dropped with a warning
//! until the next full resync repairs them. A studio appearing is the one
//! event that cannot be applied incrementally; it triggers a resync.

use crate::graph::store::GraphStore;
use crate::rooms::{RoomError, RoomIndex};
use crate::session::events::SessionEvent;
use crate::session::remote::{SessionControl, SupervisorRef};
use crate::snapshot::{self, SnapshotError};
use crate::view::{Canvas, ViewProjector};
use studiobay_ipc::{room_index_from_path, AppEntry};
use tracing::{debug, info, warn};

/// Name, run state, and supervised applications of the loaded studio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudioState {
    pub name: String,
    pub started: bool,
    pub apps: Vec<AppEntry>,
}

impl StudioState {
    pub fn clear(&mut self) {
        self.name.clear();
        self.started = false;
        self.apps.clear();
    }
}

/// Owns the whole session model and keeps it in sync with the daemon.
pub struct Reconciler<S: SessionControl, C: Canvas> {
    store: GraphStore,
    rooms: RoomIndex,
    studio: StudioState,
    service: S,
    projector: ViewProjector<C>,
}

impl<S: SessionControl, C: Canvas> Reconciler<S, C> {
    pub fn new(service: S, projector: ViewProjector<C>) -> Self {
        Self {
            store: GraphStore::new(),
            rooms: RoomIndex::new(),
            studio: StudioState::default(),
            service,
            projector,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn rooms(&self) -> &RoomIndex {
        &self.rooms
    }

    pub fn studio(&self) -> &StudioState {
        &self.studio
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn projector_mut(&mut self) -> &mut ViewProjector<C> {
        &mut self.projector
    }

    /// Replace the whole model with a fresh snapshot from the daemon.
    /// On failure the model is left empty; see [`snapshot::load_full`].
    pub fn resync(&mut self) -> Result<(), SnapshotError> {
        snapshot::load_full(
            &self.service,
            &mut self.store,
            &mut self.rooms,
            &mut self.studio,
            &mut self.projector,
        )
    }

    /// Apply one event. Never fails: problems are logged and absorbed.
    pub fn apply(&mut self, event: SessionEvent) {
        debug!("applying {:?}", event);
        match event {
            SessionEvent::ClientAppeared { id, name } => {
                let changes = self.store.add_group(id, &name);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::ClientDisappeared { id } => {
                let changes = self.store.remove_group(id);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::ClientRenamed { id, name } => {
                let changes = self.store.rename_group(id, &name);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::PortAppeared {
                group,
                port,
                name,
                direction,
                media,
            } => match self.store.add_port(group, port, &name, direction, media) {
                Ok(changes) => {
                    self.projector.project(&mut self.store, &self.service, &changes)
                }
                Err(e) => warn!("dropping port announcement: {}", e),
            },
            SessionEvent::PortDisappeared { port } => {
                let changes = self.store.remove_port(port);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::PortRenamed { port, name } => {
                let changes = self.store.rename_port(port, &name);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::PortsConnected {
                connection,
                source,
                target,
            } => match self.store.connect(connection, source, target) {
                Ok(changes) => {
                    self.projector.project(&mut self.store, &self.service, &changes)
                }
                Err(e) => warn!("dropping connection announcement: {}", e),
            },
            SessionEvent::PortsDisconnected { connection } => {
                let changes = self.store.disconnect(connection);
                self.projector.project(&mut self.store, &self.service, &changes);
            }
            SessionEvent::RoomAppeared { path, name } => self.room_appeared(&path, &name),
            SessionEvent::RoomDisappeared { path } => match self.rooms.remove_by_path(&path) {
                Ok((index, room)) => info!("room {} left slot {}", room.name, index),
                Err(RoomError::NotFound(_)) => {
                    warn!("disappearance of unknown room {} ignored", path)
                }
                Err(e) => warn!("room removal failed: {}", e),
            },
            SessionEvent::StudioStarted => self.studio.started = true,
            SessionEvent::StudioStopped => self.studio.started = false,
            SessionEvent::StudioRenamed { name } => self.studio.name = name,
            SessionEvent::StudioAppeared => {
                if let Err(e) = self.resync() {
                    warn!("resync after studio appearance failed: {}", e);
                }
            }
            SessionEvent::StudioDisappeared => {
                self.store.clear();
                self.rooms.clear();
                self.studio.clear();
                self.projector.clear();
            }
        }
    }

    fn room_appeared(&mut self, path: &str, name: &str) {
        let Some(index) = room_index_from_path(path) else {
            warn!("room path {} carries no index, ignored", path);
            return;
        };
        match self.rooms.insert_at(index, path, name) {
            Ok(Some(evicted)) => {
                warn!("room {} evicted stale occupant {}", path, evicted.path)
            }
            Ok(None) => {}
            Err(e) => {
                warn!("room {} rejected: {}", path, e);
                return;
            }
        }
        self.refresh_room(path);
    }

    /// Pull project name and app rows for one room. Best effort: the room
    /// stays listed with bare data if the daemon will not answer.
    fn refresh_room(&mut self, path: &str) {
        let project = match self.service.get_room(path) {
            Ok(listing) => listing.project,
            Err(e) => {
                debug!("project lookup for {} failed: {}", path, e);
                None
            }
        };
        let apps = match self.service.get_app_list(SupervisorRef::Room(path)) {
            Ok(apps) => apps,
            Err(e) => {
                debug!("app list for {} failed: {}", path, e);
                Vec::new()
            }
        };
        if let Some(room) = self.rooms.room_by_path_mut(path) {
            room.project = project;
            room.apps = apps;
        }
    }
}
