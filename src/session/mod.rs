// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Session daemon boundary: event decoding, the remote control trait,
//! and the D-Bus client implementing it.

pub mod client;
pub mod events;
pub mod remote;

#[cfg(test)]
pub mod fake;

pub use client::SessionClient;
