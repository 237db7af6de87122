// BgpSim: BGP Network Simulator written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for the time-ordered event queue that drives the simulation.

mod queue;
pub use queue::EventQueue;

use crate::types::Id;

/// An event to dispatch. The only handler in this simulator is "tick this
/// node", so the event carries nothing but the id of the node to tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    /// The node that should be ticked when this event fires.
    pub target: Id,
}

impl Event {
    /// Construct a tick event for `target`.
    pub fn tick(target: Id) -> Self {
        Self { target }
    }
}
