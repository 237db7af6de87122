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

//! Module containing all core type definitions: node identity, port
//! connectivity, flits and credits.

use std::fmt;

use thiserror::Error;

/// Simulated time, in cycles. Signed so that comparisons against "not yet
/// scheduled" sentinels (`-1`) read naturally, matching the reference
/// implementation's `long last_tick`.
pub type Time = i64;

/// Tag distinguishing the three kinds of node that live in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A traffic-generating terminal.
    Source,
    /// A traffic-consuming terminal.
    Destination,
    /// An internal router with a full five-stage pipeline.
    Router,
}

/// Identity of a node: its kind plus an index into the array of nodes of
/// that kind. Displays as `Src 3`, `Dst 3`, `Rtr 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id {
    /// The kind of node.
    pub kind: NodeKind,
    /// Index into the per-kind array.
    pub index: usize,
}

impl Id {
    /// Construct a source id.
    pub fn src(index: usize) -> Self {
        Self { kind: NodeKind::Source, index }
    }

    /// Construct a destination id.
    pub fn dst(index: usize) -> Self {
        Self { kind: NodeKind::Destination, index }
    }

    /// Construct a router id.
    pub fn rtr(index: usize) -> Self {
        Self { kind: NodeKind::Router, index }
    }

    /// `true` if this id names a source terminal.
    pub fn is_src(&self) -> bool {
        self.kind == NodeKind::Source
    }

    /// `true` if this id names a destination terminal.
    pub fn is_dst(&self) -> bool {
        self.kind == NodeKind::Destination
    }

    /// `true` if this id names an internal router.
    pub fn is_rtr(&self) -> bool {
        self.kind == NodeKind::Router
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            NodeKind::Source => "Src",
            NodeKind::Destination => "Dst",
            NodeKind::Router => "Rtr",
        };
        write!(f, "{tag} {}", self.index)
    }
}

/// A physical port on a node: the node plus a port index local to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouterPortPair {
    /// The node that owns the port.
    pub id: Id,
    /// The port index on that node.
    pub port: usize,
}

impl RouterPortPair {
    /// Construct a new port pair.
    pub fn new(id: Id, port: usize) -> Self {
        Self { id, port }
    }
}

impl fmt::Display for RouterPortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.port)
    }
}

/// A directed link between two physical ports, tagged with a monotonic id
/// unique among all connections ever inserted into a [`crate::topology::Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    /// The upstream (sending) port.
    pub src: RouterPortPair,
    /// The downstream (receiving) port.
    pub dst: RouterPortPair,
    /// Monotonically increasing id, unique per connection, assigned at
    /// insertion order. Used to give connections a stable iteration order.
    pub uniq: usize,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Error returned when [`crate::topology::Topology::connect`] would have to
/// overwrite an existing, differing connection on one of the two ports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("port conflict: {attempted} conflicts with the already-connected {existing}")]
pub struct TopologyError {
    /// The connection that was attempted.
    pub attempted: Connection,
    /// The connection already occupying one of the two ports.
    pub existing: Connection,
}

/// Kind of a flit within its packet. Every packet is a contiguous run that
/// starts with exactly one [`FlitType::Head`] and ends with exactly one
/// [`FlitType::Tail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlitType {
    /// First flit of a packet; carries the source-routed path.
    Head,
    /// Interior flit of a packet.
    Body,
    /// Last flit of a packet; releases the virtual channel it rode in on.
    Tail,
}

/// Routing metadata carried by every flit of a packet. Body and tail flits
/// duplicate the head's `path`/`idx` fields so that every flit in a packet is
/// self-describing, mirroring the reference `RouteInfo` struct.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteInfo {
    /// Id of the generating source terminal.
    pub src: usize,
    /// Id of the intended destination terminal.
    pub dst: usize,
    /// Source-computed sequence of output port numbers, one per hop,
    /// terminated by the terminal port (0).
    pub path: Vec<usize>,
    /// Cursor into `path`; advanced by one at every route computation.
    pub idx: usize,
}

/// The unit of transfer on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flit {
    /// Head, body, or tail.
    pub flit_type: FlitType,
    /// Routing metadata.
    pub route_info: RouteInfo,
    /// Opaque payload; the reference implementation uses this purely as a
    /// sequence counter for trace readability.
    pub payload: i64,
}

impl Flit {
    /// Construct a new flit.
    pub fn new(flit_type: FlitType, src: usize, dst: usize, payload: i64) -> Self {
        Self {
            flit_type,
            route_info: RouteInfo { src, dst, path: Vec::new(), idx: 0 },
            payload,
        }
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match self.flit_type {
            FlitType::Head => 'H',
            FlitType::Body => 'B',
            FlitType::Tail => 'T',
        };
        write!(f, "{{{t}:{}->{}.p{}}}", self.route_info.src, self.route_info.dst, self.payload)
    }
}

/// A credit: one free buffer slot at the downstream input unit. Carries no
/// data of its own, since this simulator only ever has one virtual channel
/// per physical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credit;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(Id::src(3).to_string(), "Src 3");
        assert_eq!(Id::dst(3).to_string(), "Dst 3");
        assert_eq!(Id::rtr(3).to_string(), "Rtr 3");
    }

    #[test]
    fn id_kind_predicates() {
        assert!(Id::src(0).is_src());
        assert!(!Id::src(0).is_dst());
        assert!(Id::dst(0).is_dst());
        assert!(Id::rtr(0).is_rtr());
    }
}
