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

//! The simulator: the single owner of the topology, the channel array, every
//! node, and the event queue. Nothing here is shared by reference beyond the
//! lifetime of a single call -- cyclic ownership between routers and
//! channels is avoided by having this struct hold both in flat arrays and
//! handing routers plain indices into the channel array.

use std::collections::HashMap;
use std::fmt::Write as _;

use log::info;

use crate::channel::Channel;
use crate::config::{SimConfig, TopologyKind};
use crate::event::{Event, EventQueue};
use crate::router::{Router, RoutingDesc};
use crate::topology::Topology;
use crate::types::{Id, RouterPortPair, Time, TopologyError};

/// A fully built network ready to run. Construct with [`Simulator::build`].
pub struct Simulator {
    eventq: EventQueue,
    channels: Vec<Channel>,
    sources: Vec<Router>,
    destinations: Vec<Router>,
    routers: Vec<Router>,
    double_tick_count: u64,
}

impl Simulator {
    /// Build a network from `config`: construct the topology, allocate one
    /// channel per directed link, then construct every source, destination
    /// and router node with the channel indices for its ports. Seeds the
    /// event queue with a tick for every source at time 0.
    pub fn build(config: &SimConfig) -> Result<Self, TopologyError> {
        let topology = match config.topology {
            TopologyKind::Ring => Topology::ring(config.radix)?,
            TopologyKind::Torus { dims } => Topology::torus(config.radix, dims)?,
        };
        let n = config.terminal_count();
        let routing = RoutingDesc { radix: config.radix, dims: config.dims() };

        // Assign every connection a slot in a flat channel array, indexed by
        // `Connection::uniq` so forward and reverse lookups agree on which
        // slot a given link occupies.
        let mut by_uniq: HashMap<usize, usize> = HashMap::new();
        let mut channels = Vec::new();
        // Topology only supports point lookups, so channels are discovered
        // on demand as each node's ports are resolved below, deduplicated on
        // `Connection::uniq` since every link is touched from both ends.
        let mut register = |conn: crate::types::Connection, channels: &mut Vec<Channel>| -> usize {
            *by_uniq.entry(conn.uniq).or_insert_with(|| {
                channels.push(Channel::new(conn, config.channel_delay));
                channels.len() - 1
            })
        };

        let mut src_out = vec![0usize; n];
        let mut dst_in = vec![0usize; n];
        for id in 0..n {
            let src_rpp = RouterPortPair::new(Id::src(id), 0);
            let dst_rpp = RouterPortPair::new(Id::dst(id), 0);
            let src_conn = topology.find_forward(src_rpp).expect("source is not connected");
            let dst_conn = topology.find_reverse(dst_rpp).expect("destination is not connected");
            src_out[id] = register(src_conn, &mut channels);
            dst_in[id] = register(dst_conn, &mut channels);
        }

        let mut router_in = vec![vec![0usize; config.radix]; n];
        let mut router_out = vec![vec![0usize; config.radix]; n];
        for id in 0..n {
            for port in 0..config.radix {
                let rpp = RouterPortPair::new(Id::rtr(id), port);
                let out_conn = topology.find_forward(rpp).expect("router output port is not connected");
                let in_conn = topology.find_reverse(rpp).expect("router input port is not connected");
                router_out[id][port] = register(out_conn, &mut channels);
                router_in[id][port] = register(in_conn, &mut channels);
            }
        }

        let mut eventq = EventQueue::new();
        let mut sources = Vec::with_capacity(n);
        let mut destinations = Vec::with_capacity(n);
        for id in 0..n {
            let dst_terminal = (id + n / 2) % n;
            sources.push(Router::new(
                Id::src(id),
                1,
                vec![],
                vec![src_out[id]],
                config.buffer_depth,
                config.packet_size,
                routing,
                dst_terminal,
            ));
            destinations.push(Router::new(
                Id::dst(id),
                1,
                vec![dst_in[id]],
                vec![],
                config.buffer_depth,
                config.packet_size,
                routing,
                0,
            ));
            eventq.schedule(0, Event::tick(Id::src(id)));
        }

        let mut routers = Vec::with_capacity(n);
        for id in 0..n {
            routers.push(Router::new(
                Id::rtr(id),
                config.radix,
                router_in[id].clone(),
                router_out[id].clone(),
                config.buffer_depth,
                config.packet_size,
                routing,
                0,
            ));
        }

        info!(
            "built {} nodes ({} terminals, radix {}) over {} channels",
            n * 3,
            n,
            config.radix,
            channels.len()
        );

        Ok(Self { eventq, channels, sources, destinations, routers, double_tick_count: 0 })
    }

    /// Current simulated time.
    pub fn now(&self) -> Time {
        self.eventq.now()
    }

    /// Number of double-tick guard hits since construction.
    pub fn double_tick_count(&self) -> u64 {
        self.double_tick_count
    }

    /// Flits generated by source `i`.
    pub fn flits_generated(&self, i: usize) -> u64 {
        self.sources[i].flit_gen_count
    }

    /// Flits consumed by destination `i`.
    pub fn flits_arrived(&self, i: usize) -> u64 {
        self.destinations[i].flit_arrive_count
    }

    /// Number of source/destination terminal pairs.
    pub fn terminal_count(&self) -> usize {
        self.sources.len()
    }

    /// `true` once the event queue has drained -- only possible if nothing
    /// keeps self-rescheduling, which does not happen under the default
    /// infinite-offered-load source.
    pub fn is_quiescent(&self) -> bool {
        self.eventq.empty()
    }

    /// Pop and dispatch events until the queue empties or the next pending
    /// event's time would reach or exceed `until` (when `Some`).
    pub fn run_until(&mut self, until: Option<Time>) {
        loop {
            let Some(next_time) = self.eventq.peek_next_time() else { break };
            if let Some(until) = until {
                if next_time >= until {
                    break;
                }
            }
            self.step_one();
        }
    }

    /// Pop and dispatch exactly one event.
    pub fn step_one(&mut self) {
        let event = self.eventq.pop();
        self.dispatch(event);
    }

    fn dispatch(&mut self, event: Event) {
        let id = event.target;
        let double = if id.is_src() {
            self.sources[id.index].tick(&mut self.channels, &mut self.eventq)
        } else if id.is_dst() {
            self.destinations[id.index].tick(&mut self.channels, &mut self.eventq)
        } else {
            self.routers[id.index].tick(&mut self.channels, &mut self.eventq)
        };
        if double {
            self.double_tick_count += 1;
        }
    }

    /// Render the per-router state dump used by the interactive debugger's
    /// `p` command.
    pub fn print_state(&self) -> String {
        let mut out = String::new();
        for router in &self.routers {
            router.print_state(&self.channels, &mut out).expect("formatting to a String cannot fail");
        }
        out
    }

    /// Render the final report, matching the reference `Sim::report` output.
    pub fn report(&self) -> String {
        let mut out = String::new();
        writeln!(out).unwrap();
        writeln!(out, "==== SIMULATION RESULT ====").unwrap();
        writeln!(out, "# of ticks: {}", self.now()).unwrap();
        writeln!(out, "# of double ticks: {}", self.double_tick_count).unwrap();
        writeln!(out).unwrap();
        for (i, src) in self.sources.iter().enumerate() {
            writeln!(out, "[{}] # of flits generated: {}", Id::src(i), src.flit_gen_count).unwrap();
        }
        for (i, dst) in self.destinations.iter().enumerate() {
            writeln!(out, "[{}] # of flits arrived: {}", Id::dst(i), dst.flit_arrive_count).unwrap();
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::TopologyKind;

    fn ring_config() -> SimConfig {
        SimConfig::new(TopologyKind::Ring, 4, 1, 8, 4).unwrap()
    }

    #[test]
    fn build_seeds_a_tick_per_source() {
        let sim = Simulator::build(&ring_config()).unwrap();
        assert_eq!(sim.terminal_count(), 4);
        assert!(!sim.is_quiescent());
    }

    #[test]
    fn running_generates_and_delivers_flits() {
        let mut sim = Simulator::build(&ring_config()).unwrap();
        sim.run_until(Some(200));
        let total_generated: u64 = (0..4).map(|i| sim.flits_generated(i)).sum();
        let total_arrived: u64 = (0..4).map(|i| sim.flits_arrived(i)).sum();
        assert!(total_generated > 0);
        assert!(total_arrived > 0);
        assert!(total_arrived <= total_generated);
    }

    #[test]
    fn report_contains_every_terminal() {
        let mut sim = Simulator::build(&ring_config()).unwrap();
        sim.run_until(Some(50));
        let report = sim.report();
        for i in 0..4 {
            assert!(report.contains(&format!("[Src {i}]")));
            assert!(report.contains(&format!("[Dst {i}]")));
        }
    }

    #[test]
    fn torus_builds_and_runs() {
        let cfg = SimConfig::new(TopologyKind::Torus { dims: 2 }, 3, 1, 8, 4).unwrap();
        let mut sim = Simulator::build(&cfg).unwrap();
        sim.run_until(Some(200));
        let total_arrived: u64 = (0..9).map(|i| sim.flits_arrived(i)).sum();
        assert!(total_arrived > 0);
    }
}
