// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ordered, sparse, index-addressable list of rooms.
//!
//! The daemon addresses rooms by the numeric suffix of their object path,
//! and those indices must stay valid while rooms come and go from the
//! middle of the list. Slot 0 belongs to the studio itself; a removed or
//! not-yet-announced room leaves an inert placeholder so later
//! insert-by-index operations never miss their target.

use studiobay_ipc::AppEntry;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Slot 0 is reserved for the studio; rooms occupy indices >= 1.
    #[error("room index 0 is reserved for the studio")]
    ReservedSlot,
    /// Removal referenced a path no slot holds. Non-fatal; logged upstream.
    #[error("no room with path {0}")]
    NotFound(String),
}

/// A live sub-session. `path` is the primary key; `index` drifts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub path: String,
    pub name: String,
    /// Name of the project loaded in the room, if any.
    pub project: Option<String>,
    /// Application-supervision rows, replaced wholesale on each re-fetch.
    pub apps: Vec<AppEntry>,
}

impl Room {
    fn new(path: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            project: None,
            apps: Vec::new(),
        }
    }

    /// `"Room A (project)"` when a project is loaded, bare name otherwise.
    pub fn display_title(&self) -> String {
        match &self.project {
            Some(project) => format!("{} ({})", self.name, project),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Studio,
    Placeholder,
    Occupied(Room),
}

/// Index-stable room list. See module docs for the padding rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIndex {
    slots: Vec<Slot>,
}

impl Default for RoomIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomIndex {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::Studio],
        }
    }

    /// Drop all rooms, keeping only the studio slot.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
    }

    /// Number of slots, studio and placeholders included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() == 1
    }

    pub fn room_at(&self, index: usize) -> Option<&Room> {
        match self.slots.get(index) {
            Some(Slot::Occupied(room)) => Some(room),
            _ => None,
        }
    }

    pub fn is_placeholder(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Placeholder))
    }

    pub fn room_by_path(&self, path: &str) -> Option<&Room> {
        self.rooms().map(|(_, room)| room).find(|r| r.path == path)
    }

    pub fn room_by_path_mut(&mut self, path: &str) -> Option<&mut Room> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Occupied(room) if room.path == path => Some(room),
            _ => None,
        })
    }

    /// Iterate occupied slots in index order.
    pub fn rooms(&self) -> impl Iterator<Item = (usize, &Room)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Occupied(room) => Some((i, room)),
            _ => None,
        })
    }

    /// Insert a room at `index`, padding any gap with placeholders.
    ///
    /// A placeholder at `index` is replaced. A room already holding the
    /// slot with the same path is replaced in place (duplicate appearance,
    /// treated as idempotent). A different room is evicted first and
    /// returned so the caller can tear down whatever represents it.
    pub fn insert_at(
        &mut self,
        index: usize,
        path: &str,
        name: &str,
    ) -> Result<Option<Room>, RoomError> {
        if index == 0 {
            return Err(RoomError::ReservedSlot);
        }
        while self.slots.len() <= index {
            self.slots.push(Slot::Placeholder);
        }

        let evicted = match std::mem::replace(&mut self.slots[index], Slot::Placeholder) {
            Slot::Occupied(room) if room.path != path => Some(room),
            _ => None,
        };
        if evicted.is_some() {
            debug!("room slot {} evicted for {}", index, path);
        }
        self.slots[index] = Slot::Occupied(Room::new(path, name));
        Ok(evicted)
    }

    /// Remove the room holding `path`, wherever it sits. Interior slots
    /// become placeholders to keep later indices stable; a trailing slot is
    /// dropped along with any placeholders left dangling behind it.
    pub fn remove_by_path(&mut self, path: &str) -> Result<(usize, Room), RoomError> {
        let index = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Slot::Occupied(room) if room.path == path))
            .ok_or_else(|| RoomError::NotFound(path.to_string()))?;

        let room = match std::mem::replace(&mut self.slots[index], Slot::Placeholder) {
            Slot::Occupied(room) => room,
            _ => unreachable!(),
        };

        if index == self.slots.len() - 1 {
            self.slots.pop();
            while matches!(self.slots.last(), Some(Slot::Placeholder)) {
                self.slots.pop();
            }
        }
        Ok((index, room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_pads_gaps_with_placeholders() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(3, "/org/ladish/Room3", "Studio C").unwrap();
        rooms.insert_at(1, "/org/ladish/Room1", "Studio A").unwrap();

        assert_eq!(rooms.room_at(1).unwrap().name, "Studio A");
        assert!(rooms.is_placeholder(2));
        assert_eq!(rooms.room_at(3).unwrap().name, "Studio C");
        assert_eq!(rooms.len(), 4);
    }

    #[test]
    fn test_slot_zero_is_reserved() {
        let mut rooms = RoomIndex::new();
        assert_eq!(
            rooms.insert_at(0, "/org/ladish/Room0", "bad"),
            Err(RoomError::ReservedSlot)
        );
        assert!(rooms.room_at(0).is_none());
        assert!(!rooms.is_placeholder(0));
    }

    #[test]
    fn test_same_path_insert_is_idempotent_replace() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "Old name").unwrap();
        let evicted = rooms.insert_at(1, "/org/ladish/Room1", "New name").unwrap();
        assert!(evicted.is_none());
        assert_eq!(rooms.room_at(1).unwrap().name, "New name");
    }

    #[test]
    fn test_different_path_insert_evicts_occupant() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "First").unwrap();
        let evicted = rooms
            .insert_at(1, "/org/ladish/Room9", "Second")
            .unwrap()
            .expect("occupant should be evicted");
        assert_eq!(evicted.path, "/org/ladish/Room1");
        assert_eq!(rooms.room_at(1).unwrap().path, "/org/ladish/Room9");
    }

    #[test]
    fn test_remove_by_path_survives_index_drift() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(3, "/org/ladish/Room3", "Studio C").unwrap();
        rooms.insert_at(1, "/org/ladish/Room1", "Studio A").unwrap();
        rooms.insert_at(2, "/org/ladish/Room2", "Studio B").unwrap();

        let (index, room) = rooms.remove_by_path("/org/ladish/Room3").unwrap();
        assert_eq!(index, 3);
        assert_eq!(room.name, "Studio C");
        // Trailing slot: dropped rather than left as a placeholder.
        assert_eq!(rooms.len(), 3);
    }

    #[test]
    fn test_interior_removal_leaves_placeholder() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "A").unwrap();
        rooms.insert_at(2, "/org/ladish/Room2", "B").unwrap();

        rooms.remove_by_path("/org/ladish/Room1").unwrap();
        assert!(rooms.is_placeholder(1));
        assert_eq!(rooms.room_at(2).unwrap().name, "B");

        // A later insert-by-index lands without repadding.
        rooms.insert_at(1, "/org/ladish/Room1", "A2").unwrap();
        assert_eq!(rooms.room_at(1).unwrap().name, "A2");
    }

    #[test]
    fn test_trailing_placeholders_are_trimmed() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "A").unwrap();
        rooms.insert_at(4, "/org/ladish/Room4", "D").unwrap();

        rooms.remove_by_path("/org/ladish/Room4").unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms.room_at(1).unwrap().name, "A");
    }

    #[test]
    fn test_remove_unknown_path_is_not_found() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "A").unwrap();
        let before = rooms.clone();
        assert_eq!(
            rooms.remove_by_path("/org/ladish/Room7"),
            Err(RoomError::NotFound("/org/ladish/Room7".to_string()))
        );
        assert_eq!(rooms, before);
    }

    #[test]
    fn test_display_title_with_project() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(1, "/org/ladish/Room1", "Mix").unwrap();
        let room = rooms.room_by_path_mut("/org/ladish/Room1").unwrap();
        assert_eq!(room.display_title(), "Mix");
        room.project = Some("demo-song".to_string());
        assert_eq!(room.display_title(), "Mix (demo-song)");
    }

    #[test]
    fn test_clear_keeps_studio_slot() {
        let mut rooms = RoomIndex::new();
        rooms.insert_at(2, "/org/ladish/Room2", "B").unwrap();
        rooms.clear();
        assert!(rooms.is_empty());
        assert_eq!(rooms.len(), 1);
    }
}
