// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The closed set of change notifications delivered by the session daemon.
//!
//! Signals are decoded into this union once, at the D-Bus boundary. They
//! carry no timestamps and no ordering guarantee; the reconciler applies
//! them in arrival order and relies on store idempotency for correctness.

use crate::graph::types::{ConnectionId, GroupId, MediaKind, PortDirection, PortId};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ClientAppeared {
        id: GroupId,
        name: String,
    },
    ClientDisappeared {
        id: GroupId,
    },
    ClientRenamed {
        id: GroupId,
        name: String,
    },
    PortAppeared {
        group: GroupId,
        port: PortId,
        name: String,
        direction: PortDirection,
        media: MediaKind,
    },
    PortDisappeared {
        port: PortId,
    },
    PortRenamed {
        port: PortId,
        name: String,
    },
    PortsConnected {
        connection: ConnectionId,
        source: PortId,
        target: PortId,
    },
    PortsDisconnected {
        connection: ConnectionId,
    },
    RoomAppeared {
        path: String,
        name: String,
    },
    RoomDisappeared {
        path: String,
    },
    StudioStarted,
    StudioStopped,
    StudioRenamed {
        name: String,
    },
    /// A studio was loaded. Incremental history across this boundary is not
    /// guaranteed; the reconciler answers with a full resync.
    StudioAppeared,
    StudioDisappeared,
}
