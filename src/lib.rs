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

//! A cycle-accurate discrete-event simulator for packet-switched
//! interconnection networks built as a ring or a k-ary r-cube torus.
//!
//! Every node (source terminal, destination terminal, or internal router)
//! is a self-rescheduling state machine ticked by the [`event`] queue.
//! Routers run a five-stage virtual-channel pipeline (route compute, VC
//! allocation, switch allocation, switch traversal) with credit-based flow
//! control over [`channel`]s built from a source-routed [`topology`].
//!
//! [`network::Simulator`] is the entry point: build one from a
//! [`config::SimConfig`], then either run it to completion or drive it one
//! cycle at a time through [`interactive`].

pub mod channel;
pub mod config;
pub mod event;
pub mod formatter;
pub mod interactive;
pub mod network;
pub mod prelude;
pub mod router;
#[cfg(test)]
mod test;
pub mod topology;
pub mod types;
