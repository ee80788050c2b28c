// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projection of graph changes onto a canvas-like view.
//!
//! The projector owns no graph state. It turns the ordered change lists
//! produced by [`GraphStore`] mutations into canvas calls, pulling layout
//! metadata (position, split) from the session daemon's graph dict on group
//! appearance and writing it back when the user moves or splits a box.
//! Metadata is decoration: a failed read falls back to defaults and a
//! failed write is logged, neither disturbs the model.

use crate::graph::store::{GraphChange, GraphStore};
use crate::graph::types::{
    ConnectionId, GroupId, GroupKind, GroupPosition, MediaKind, PortDirection, PortId, SplitState,
};
use crate::session::remote::{RemoteError, SessionControl};
use studiobay_ipc as ipc;
use tracing::{debug, info, warn};

/// Vertical/horizontal offset of the split sub-box when no persisted
/// coordinates exist for it yet.
pub const DEFAULT_SPLIT_OFFSET: f64 = 50.0;

/// The drawing surface the projector renders into.
///
/// Implementations range from a real patchbay canvas to the tracing-only
/// [`TraceCanvas`]. Calls arrive in the same order the store reported the
/// underlying changes, so implementations never see a port before its group
/// or a connection before its ports.
pub trait Canvas {
    fn add_group(&mut self, id: GroupId, name: &str, split: bool, kind: GroupKind);
    fn remove_group(&mut self, id: GroupId);
    fn rename_group(&mut self, id: GroupId, name: &str);
    fn add_port(
        &mut self,
        group: GroupId,
        port: PortId,
        name: &str,
        direction: PortDirection,
        media: MediaKind,
    );
    fn remove_port(&mut self, port: PortId);
    fn rename_port(&mut self, port: PortId, name: &str);
    fn connect_ports(&mut self, connection: ConnectionId, source: PortId, target: PortId);
    fn disconnect_ports(&mut self, connection: ConnectionId);
    fn set_group_position(&mut self, id: GroupId, position: GroupPosition);
    fn split_group(&mut self, id: GroupId);
    fn join_group(&mut self, id: GroupId);
    fn clear(&mut self);
}

/// Applies [`GraphChange`] lists to a [`Canvas`].
pub struct ViewProjector<C: Canvas> {
    canvas: C,
    split_offset: f64,
}

impl<C: Canvas> ViewProjector<C> {
    pub fn new(canvas: C) -> Self {
        Self::with_split_offset(canvas, DEFAULT_SPLIT_OFFSET)
    }

    pub fn with_split_offset(canvas: C, split_offset: f64) -> Self {
        Self {
            canvas,
            split_offset,
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    /// Render one change list. `store` is the post-mutation model; added
    /// entities are looked up there, removed ones are addressed by id only.
    pub fn project<S: SessionControl>(
        &mut self,
        store: &mut GraphStore,
        service: &S,
        changes: &[GraphChange],
    ) {
        for change in changes {
            match *change {
                GraphChange::GroupAdded(id) => self.project_group_added(store, service, id),
                GraphChange::GroupRenamed(id) => {
                    if let Some(group) = store.group(id) {
                        self.canvas.rename_group(id, &group.name);
                    }
                }
                GraphChange::GroupRemoved(id) => self.canvas.remove_group(id),
                GraphChange::PortAdded(id) => {
                    if let Some(port) = store.port(id) {
                        self.canvas
                            .add_port(port.group, id, &port.name, port.direction, port.media);
                    }
                }
                GraphChange::PortRenamed(id) => {
                    if let Some(port) = store.port(id) {
                        self.canvas.rename_port(id, &port.name);
                    }
                }
                GraphChange::PortRemoved(id) => self.canvas.remove_port(id),
                GraphChange::Connected(id) => {
                    if let Some(conn) = store.connection(id) {
                        self.canvas
                            .connect_ports(id, conn.source_port, conn.target_port);
                    }
                }
                GraphChange::Disconnected(id) => self.canvas.disconnect_ports(id),
            }
        }
    }

    fn project_group_added<S: SessionControl>(
        &mut self,
        store: &mut GraphStore,
        service: &S,
        id: GroupId,
    ) {
        let Some(group) = store.group(id) else {
            return;
        };
        let name = group.name.clone();
        let kind = group.kind;

        // Only application boxes honor the persisted split flag; hardware
        // and room boundary boxes always render joined.
        let split = match kind {
            GroupKind::Application => SplitState::from_metadata(
                metadata(service, id, ipc::KEY_CANVAS_SPLIT).as_deref(),
            ),
            GroupKind::Hardware | GroupKind::RoomBoundary => SplitState::Joined,
        };
        store.set_split(id, split);
        self.canvas
            .add_group(id, &name, split == SplitState::Split, kind);

        let x = metadata_f64(service, id, ipc::KEY_CANVAS_X);
        let y = metadata_f64(service, id, ipc::KEY_CANVAS_Y);
        if let (Some(x), Some(y)) = (x, y) {
            let position = GroupPosition {
                x,
                y,
                split_x: metadata_f64(service, id, ipc::KEY_CANVAS_X_SPLIT)
                    .unwrap_or(x + self.split_offset),
                split_y: metadata_f64(service, id, ipc::KEY_CANVAS_Y_SPLIT)
                    .unwrap_or(y + self.split_offset),
            };
            store.set_position(id, position);
            self.canvas.set_group_position(id, position);
        }
    }

    /// Split a group box, persisting the flag before touching the canvas so
    /// a crash between the two leaves the durable state ahead of the view.
    pub fn request_split<S: SessionControl>(
        &mut self,
        store: &mut GraphStore,
        service: &S,
        id: GroupId,
    ) -> Result<(), RemoteError> {
        service.set_group_metadata(id, ipc::KEY_CANVAS_SPLIT, "true")?;
        store.set_split(id, SplitState::Split);
        self.canvas.split_group(id);
        Ok(())
    }

    /// Join a split group box back into one.
    pub fn request_join<S: SessionControl>(
        &mut self,
        store: &mut GraphStore,
        service: &S,
        id: GroupId,
    ) -> Result<(), RemoteError> {
        service.set_group_metadata(id, ipc::KEY_CANVAS_SPLIT, "false")?;
        store.set_split(id, SplitState::Joined);
        self.canvas.join_group(id);
        Ok(())
    }

    /// Persist a box move. `split_half` selects which coordinate pair of a
    /// split group moved; the model echoes back through a later resync, so
    /// only the cached position is updated here.
    pub fn group_moved<S: SessionControl>(
        &mut self,
        store: &mut GraphStore,
        service: &S,
        id: GroupId,
        split_half: bool,
        x: f64,
        y: f64,
    ) -> Result<(), RemoteError> {
        let (key_x, key_y) = if split_half {
            (ipc::KEY_CANVAS_X_SPLIT, ipc::KEY_CANVAS_Y_SPLIT)
        } else {
            (ipc::KEY_CANVAS_X, ipc::KEY_CANVAS_Y)
        };
        service.set_group_metadata(id, key_x, &x.to_string())?;
        service.set_group_metadata(id, key_y, &y.to_string())?;

        if let Some(group) = store.group(id) {
            let mut position = group.position.unwrap_or_default();
            if split_half {
                position.split_x = x;
                position.split_y = y;
            } else {
                position.x = x;
                position.y = y;
            }
            store.set_position(id, position);
        }
        Ok(())
    }

    /// Rename requests go to the daemon; the model changes only when the
    /// matching rename signal comes back.
    pub fn request_group_rename<S: SessionControl>(
        &self,
        service: &S,
        id: GroupId,
        name: &str,
    ) -> Result<(), RemoteError> {
        service.rename_group(id, name)
    }

    pub fn request_port_rename<S: SessionControl>(
        &self,
        service: &S,
        port: PortId,
        name: &str,
    ) -> Result<(), RemoteError> {
        service.rename_port(port, name)
    }

    pub fn request_connect<S: SessionControl>(
        &self,
        service: &S,
        source: PortId,
        target: PortId,
    ) -> Result<(), RemoteError> {
        service.connect_ports(source, target)
    }

    pub fn request_disconnect<S: SessionControl>(
        &self,
        service: &S,
        connection: ConnectionId,
    ) -> Result<(), RemoteError> {
        service.disconnect_connection(connection)
    }

    pub fn clear(&mut self) {
        self.canvas.clear();
    }
}

fn metadata<S: SessionControl>(service: &S, id: GroupId, key: &str) -> Option<String> {
    match service.get_group_metadata(id, key) {
        Ok(value) => value,
        Err(e) => {
            warn!("metadata read {} for group {} failed: {}", key, id, e);
            None
        }
    }
}

fn metadata_f64<S: SessionControl>(service: &S, id: GroupId, key: &str) -> Option<f64> {
    let raw = metadata(service, id, key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("metadata {} for group {} is not a number: {:?}", key, id, raw);
            None
        }
    }
}

/// Canvas that renders to the log. Used by the headless monitor binary.
#[derive(Debug, Default)]
pub struct TraceCanvas;

impl Canvas for TraceCanvas {
    fn add_group(&mut self, id: GroupId, name: &str, split: bool, kind: GroupKind) {
        info!("+ group {} {:?} ({:?}, split: {})", id, name, kind, split);
    }

    fn remove_group(&mut self, id: GroupId) {
        info!("- group {}", id);
    }

    fn rename_group(&mut self, id: GroupId, name: &str) {
        info!("~ group {} renamed to {:?}", id, name);
    }

    fn add_port(
        &mut self,
        group: GroupId,
        port: PortId,
        name: &str,
        direction: PortDirection,
        media: MediaKind,
    ) {
        info!(
            "+ port {} {:?} on group {} ({:?} {:?})",
            port, name, group, direction, media
        );
    }

    fn remove_port(&mut self, port: PortId) {
        info!("- port {}", port);
    }

    fn rename_port(&mut self, port: PortId, name: &str) {
        info!("~ port {} renamed to {:?}", port, name);
    }

    fn connect_ports(&mut self, connection: ConnectionId, source: PortId, target: PortId) {
        info!("+ connection {}: {} -> {}", connection, source, target);
    }

    fn disconnect_ports(&mut self, connection: ConnectionId) {
        info!("- connection {}", connection);
    }

    fn set_group_position(&mut self, id: GroupId, position: GroupPosition) {
        debug!(
            "group {} at ({}, {}) / split ({}, {})",
            id, position.x, position.y, position.split_x, position.split_y
        );
    }

    fn split_group(&mut self, id: GroupId) {
        info!("group {} split", id);
    }

    fn join_group(&mut self, id: GroupId) {
        info!("group {} joined", id);
    }

    fn clear(&mut self) {
        info!("canvas cleared");
    }
}
