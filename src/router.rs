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

//! The router: a five-stage virtual-channel pipeline for internal nodes, and
//! a pair of trivial generate/consume pipelines for terminal nodes. Every
//! node in the simulation -- source, destination, or router -- is an
//! instance of this single type, dispatching on [`Id::kind`].

use std::collections::VecDeque;

use log::{debug, trace};

use crate::channel::Channel;
use crate::event::{Event, EventQueue};
use crate::topology::Topology;
use crate::types::{Flit, FlitType, Id, RouteInfo, Time};

/// Lifecycle state of a virtual channel, shared by input and output units.
/// Output units only ever occupy `Idle`, `Active`, or `CreditWait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalState {
    /// No flit occupies this unit.
    Idle,
    /// An input unit with a flit at the head of its buffer awaiting RC.
    Routing,
    /// Routed, waiting for VC allocation to grant an output VC.
    VcWait,
    /// Holds a granted, credited VC; eligible for SA.
    Active,
    /// Holds a granted VC but the output side has run out of credit.
    CreditWait,
}

/// Which pipeline stage an input unit's head-of-line flit is queued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// No flit in flight through the pipeline.
    Idle,
    /// Awaiting route computation.
    Rc,
    /// Routed; awaiting VC allocation.
    Va,
    /// VC granted; awaiting switch allocation.
    Sa,
}

/// Per-port input-side state.
#[derive(Debug)]
struct InputUnit {
    global: GlobalState,
    next_global: GlobalState,
    route_port: Option<usize>,
    stage: PipelineStage,
    buf: VecDeque<Flit>,
    st_ready: Option<Flit>,
}

impl InputUnit {
    fn new() -> Self {
        Self {
            global: GlobalState::Idle,
            next_global: GlobalState::Idle,
            route_port: None,
            stage: PipelineStage::Idle,
            buf: VecDeque::new(),
            st_ready: None,
        }
    }
}

/// Per-port output-side state.
#[derive(Debug)]
struct OutputUnit {
    global: GlobalState,
    next_global: GlobalState,
    input_port: Option<usize>,
    credit_count: usize,
    buf_credit: bool,
}

impl OutputUnit {
    fn new(buf_size: usize) -> Self {
        Self {
            global: GlobalState::Idle,
            next_global: GlobalState::Idle,
            input_port: None,
            credit_count: buf_size,
            buf_credit: false,
        }
    }
}

/// The traffic pattern driving source generation: every source continuously
/// offers load to one fixed destination.
#[derive(Debug, Clone, Copy)]
pub struct RoutingDesc {
    /// Number of routers per ring dimension (`k`).
    pub radix: usize,
    /// Number of dimensions (`r`); 1 for a plain ring.
    pub dims: usize,
}

/// A node in the network: a source terminal, destination terminal, or
/// internal router, depending on `id.kind`.
#[derive(Debug)]
pub struct Router {
    id: Id,
    radix: usize,
    last_tick: Time,
    reschedule_next_tick: bool,
    /// Index, into the simulator's shared channel array, of each input port.
    input_channels: Vec<usize>,
    /// Index, into the simulator's shared channel array, of each output port.
    output_channels: Vec<usize>,
    input_units: Vec<InputUnit>,
    output_units: Vec<OutputUnit>,
    input_buf_size: usize,
    va_last_grant_input: usize,
    sa_last_grant_input: usize,
    flit_payload_counter: i64,
    packet_size: i64,
    routing: RoutingDesc,
    dst_terminal: usize,
    /// Wall-clock of the tick currently in progress, for trace prefixes.
    current_time: Time,
    /// Flits generated, meaningful only for a source node.
    pub flit_gen_count: u64,
    /// Flits consumed, meaningful only for a destination node.
    pub flit_arrive_count: u64,
}

impl Router {
    /// Construct a node. `input_buf_size` bounds how many flits may sit in
    /// any one input unit's buffer at once. `routing` and `dst_terminal` are
    /// only consulted by source nodes.
    pub fn new(
        id: Id,
        radix: usize,
        input_channels: Vec<usize>,
        output_channels: Vec<usize>,
        input_buf_size: usize,
        packet_size: i64,
        routing: RoutingDesc,
        dst_terminal: usize,
    ) -> Self {
        assert!(packet_size >= 1, "packet_size must be at least 1");
        let mut input_units: Vec<InputUnit> = (0..radix).map(|_| InputUnit::new()).collect();
        let mut output_units: Vec<OutputUnit> =
            (0..radix).map(|_| OutputUnit::new(input_buf_size)).collect();

        if !id.is_rtr() {
            assert_eq!(radix, 1, "terminal nodes have exactly one port");
            input_units[0].route_port = Some(0);
            output_units[0].input_port = Some(0);
        }

        Self {
            id,
            radix,
            last_tick: -1,
            reschedule_next_tick: false,
            input_channels,
            output_channels,
            input_units,
            output_units,
            input_buf_size,
            va_last_grant_input: 0,
            sa_last_grant_input: 0,
            flit_payload_counter: 0,
            packet_size,
            routing,
            dst_terminal,
            current_time: -1,
            flit_gen_count: 0,
            flit_arrive_count: 0,
        }
    }

    fn trace_prefix(&self) -> String {
        crate::formatter::trace_prefix(self.current_time, self.id)
    }

    /// This node's identity.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Run one cycle for this node. Returns `true` if this was a double
    /// tick -- the clock has not advanced since the last call -- in which
    /// case nothing else happens, matching the reference implementation's
    /// guard in `router_tick`.
    pub fn tick(&mut self, channels: &mut [Channel], eq: &mut EventQueue) -> bool {
        self.current_time = eq.now();
        if eq.now() == self.last_tick {
            trace!("{} double tick", self.trace_prefix());
            return true;
        }

        self.reschedule_next_tick = false;

        if self.id.is_src() {
            self.source_generate(channels, eq);
            self.credit_update();
            self.fetch_credit(channels, eq);
        } else if self.id.is_dst() {
            self.destination_consume(channels, eq);
            self.fetch_flit(channels, eq);
        } else {
            // Reverse dependency order: a flit that advances one stage this
            // cycle must not be visible to an earlier stage in the same
            // cycle.
            self.switch_traverse(channels, eq);
            self.switch_alloc();
            self.vc_alloc();
            self.route_compute();
            self.credit_update();
            self.fetch_credit(channels, eq);
            self.fetch_flit(channels, eq);
        }

        self.update_states();

        if self.reschedule_next_tick {
            eq.reschedule(1, Event::tick(self.id));
        }

        self.last_tick = eq.now();
        false
    }

    fn source_generate(&mut self, channels: &mut [Channel], eq: &mut EventQueue) {
        let prefix = self.trace_prefix();
        let ou = &mut self.output_units[0];
        if ou.credit_count == 0 {
            trace!("{} credit stall", prefix);
            return;
        }

        let src = self.id.index;
        let dst = self.dst_terminal;
        let flit_type = if self.flit_payload_counter == self.packet_size - 1 {
            FlitType::Tail
        } else if self.flit_payload_counter == 0 {
            FlitType::Head
        } else {
            FlitType::Body
        };

        let path = Topology::route(src, dst, self.routing.radix, self.routing.dims);
        let flit = Flit {
            flit_type,
            route_info: RouteInfo { src, dst, path, idx: 0 },
            payload: self.flit_payload_counter,
        };

        if flit_type == FlitType::Tail {
            self.flit_payload_counter = 0;
        } else {
            self.flit_payload_counter += 1;
        }

        debug!("{} generated {flit}", prefix);
        channels[self.output_channels[0]].put_flit(flit, eq);
        ou.credit_count -= 1;
        self.flit_gen_count += 1;
        self.reschedule_next_tick = true;
    }

    fn destination_consume(&mut self, channels: &mut [Channel], eq: &mut EventQueue) {
        let prefix = self.trace_prefix();
        let iu = &mut self.input_units[0];
        if let Some(flit) = iu.buf.pop_front() {
            debug!("{} flit arrived {flit}", prefix);
            assert!(iu.buf.is_empty(), "destination input buffer should hold at most one flit");
            self.flit_arrive_count += 1;
            channels[self.input_channels[0]].put_credit(crate::types::Credit, eq);
            self.reschedule_next_tick = true;
        }
    }

    fn fetch_flit(&mut self, channels: &mut [Channel], eq: &mut EventQueue) {
        for iport in 0..self.radix {
            let Some(flit) = channels[self.input_channels[iport]].try_get_flit(eq) else { continue };
            let iu = &mut self.input_units[iport];
            if iu.buf.is_empty() {
                self.reschedule_next_tick = true;
                if iu.next_global == GlobalState::Idle {
                    iu.next_global = GlobalState::Routing;
                    iu.stage = PipelineStage::Rc;
                }
            }
            iu.buf.push_back(flit);
            assert!(iu.buf.len() <= self.input_buf_size, "input buffer overflow on port {iport}");
        }
    }

    fn fetch_credit(&mut self, channels: &mut [Channel], eq: &mut EventQueue) {
        for oport in 0..self.radix {
            if channels[self.output_channels[oport]].try_get_credit(eq).is_some() {
                let ou = &mut self.output_units[oport];
                assert!(!ou.buf_credit, "more than one credit in flight to oport {oport}");
                ou.buf_credit = true;
                self.reschedule_next_tick = true;
            }
        }
    }

    fn credit_update(&mut self) {
        for oport in 0..self.radix {
            if !self.output_units[oport].buf_credit {
                continue;
            }
            self.output_units[oport].buf_credit = false;
            trace!("{} credit update on oport {oport}", self.trace_prefix());

            if self.output_units[oport].credit_count == 0 {
                if self.output_units[oport].next_global == GlobalState::CreditWait {
                    let iport = self.output_units[oport]
                        .input_port
                        .expect("credit-waiting output unit has no input_port");
                    assert_eq!(self.input_units[iport].next_global, GlobalState::CreditWait);
                    self.input_units[iport].next_global = GlobalState::Active;
                    self.output_units[oport].next_global = GlobalState::Active;
                }
                self.reschedule_next_tick = true;
            }
            self.output_units[oport].credit_count += 1;
        }
    }

    fn route_compute(&mut self) {
        let prefix = self.trace_prefix();
        for iport in 0..self.radix {
            let iu = &mut self.input_units[iport];
            if iu.global != GlobalState::Routing {
                continue;
            }
            let flit = iu.buf.front_mut().expect("routing input unit has an empty buffer");
            assert!(flit.route_info.idx < flit.route_info.path.len());
            let port = flit.route_info.path[flit.route_info.idx];
            flit.route_info.idx += 1;
            trace!("{} RC success on iport {iport}, oport {port}", prefix);

            iu.route_port = Some(port);
            iu.next_global = GlobalState::VcWait;
            iu.stage = PipelineStage::Va;
            self.reschedule_next_tick = true;
        }
    }

    /// Round-robin over input ports, starting just past the last-granted
    /// one, for VCs requesting `out_port`.
    fn vc_arbit_round_robin(&self, out_port: usize) -> Option<usize> {
        let mut iport = (self.va_last_grant_input + 1) % self.radix;
        for _ in 0..self.radix {
            let iu = &self.input_units[iport];
            if iu.global == GlobalState::VcWait && iu.route_port == Some(out_port) {
                return Some(iport);
            }
            iport = (iport + 1) % self.radix;
        }
        None
    }

    fn vc_alloc(&mut self) {
        for oport in 0..self.radix {
            if self.output_units[oport].global != GlobalState::Idle {
                continue;
            }
            let Some(iport) = self.vc_arbit_round_robin(oport) else { continue };
            self.va_last_grant_input = iport;

            let has_credit = self.output_units[oport].credit_count > 0;
            let next = if has_credit { GlobalState::Active } else { GlobalState::CreditWait };
            self.input_units[iport].next_global = next;
            self.output_units[oport].next_global = next;
            self.output_units[oport].input_port = Some(iport);
            self.input_units[iport].stage = PipelineStage::Sa;
            trace!("{} VA grant iport {iport} -> oport {oport}", self.trace_prefix());
            self.reschedule_next_tick = true;
        }
    }

    /// Round-robin over input ports for switch allocation, requiring both a
    /// granted active VC and a non-empty buffer (an upstream router may have
    /// granted the VC without yet delivering a flit).
    fn sa_arbit_round_robin(&self, out_port: usize) -> Option<usize> {
        let mut iport = (self.sa_last_grant_input + 1) % self.radix;
        for _ in 0..self.radix {
            let iu = &self.input_units[iport];
            if iu.stage == PipelineStage::Sa
                && iu.route_port == Some(out_port)
                && iu.global == GlobalState::Active
                && !iu.buf.is_empty()
            {
                return Some(iport);
            }
            iport = (iport + 1) % self.radix;
        }
        None
    }

    fn switch_alloc(&mut self) {
        let prefix = self.trace_prefix();
        for oport in 0..self.radix {
            if self.output_units[oport].global != GlobalState::Active {
                continue;
            }
            let Some(iport) = self.sa_arbit_round_robin(oport) else { continue };
            self.sa_last_grant_input = iport;

            let iu = &mut self.input_units[iport];
            let flit = iu.buf.pop_front().expect("SA granted an empty input unit");
            assert!(iu.st_ready.is_none(), "switch-traverse slot already occupied");
            trace!("{} SA success iport {iport} -> oport {oport}", prefix);

            let ou = &mut self.output_units[oport];
            assert!(ou.credit_count > 0);
            ou.credit_count -= 1;

            let is_tail = flit.flit_type == FlitType::Tail;
            iu.st_ready = Some(flit);

            if is_tail {
                ou.next_global = GlobalState::Idle;
                if iu.buf.is_empty() {
                    iu.next_global = GlobalState::Idle;
                    iu.stage = PipelineStage::Idle;
                } else {
                    iu.next_global = GlobalState::Routing;
                    iu.stage = PipelineStage::Rc;
                }
                self.reschedule_next_tick = true;
            } else if ou.credit_count == 0 {
                iu.next_global = GlobalState::CreditWait;
                ou.next_global = GlobalState::CreditWait;
            } else {
                iu.next_global = GlobalState::Active;
                iu.stage = PipelineStage::Sa;
                self.reschedule_next_tick = true;
            }
        }
    }

    fn switch_traverse(&mut self, channels: &mut [Channel], eq: &mut EventQueue) {
        for iport in 0..self.radix {
            let Some(flit) = self.input_units[iport].st_ready.take() else { continue };
            let oport = self.input_units[iport]
                .route_port
                .expect("switch-traverse-ready flit has no routed output port");
            debug!("{} ST {flit} iport {iport} -> oport {oport}", self.trace_prefix());
            channels[self.output_channels[oport]].put_flit(flit, eq);
            channels[self.input_channels[iport]].put_credit(crate::types::Credit, eq);
        }
    }

    fn update_states(&mut self) {
        let mut changed = false;
        for port in 0..self.radix {
            let iu = &mut self.input_units[port];
            if iu.global != iu.next_global {
                iu.global = iu.next_global;
                changed = true;
            }
            let ou = &mut self.output_units[port];
            if ou.global != ou.next_global {
                assert!(!(ou.next_global == GlobalState::CreditWait && ou.credit_count > 0));
                ou.global = ou.next_global;
                changed = true;
            }
        }
        if changed {
            self.reschedule_next_tick = true;
        }
    }

    /// Render the per-port input/output/channel state, matching the
    /// reference debugger's `p` command.
    pub fn print_state(&self, channels: &[Channel], out: &mut dyn std::fmt::Write) -> std::fmt::Result {
        writeln!(out, "[{}]", self.id)?;
        for (i, iu) in self.input_units.iter().enumerate() {
            write!(out, " Input[{i}]: [{}] R={:>2} {{", state_letter(iu.global), port_str(iu.route_port))?;
            for flit in &iu.buf {
                write!(out, "{flit},")?;
            }
            write!(out, "}} ST:")?;
            if let Some(flit) = &iu.st_ready {
                write!(out, "{flit}")?;
            }
            writeln!(out)?;
        }
        for (i, ou) in self.output_units.iter().enumerate() {
            writeln!(
                out,
                "Output[{i}]: [{}] I={:>2}, C={:>2}",
                state_letter(ou.global),
                port_str(ou.input_port),
                ou.credit_count
            )?;
        }
        for (i, &ch_idx) in self.output_channels.iter().enumerate() {
            write!(out, "Channel[{i}]: {{")?;
            channels[ch_idx].fmt_inflight(out)?;
            writeln!(out, "}}")?;
        }
        Ok(())
    }
}

fn state_letter(state: GlobalState) -> char {
    match state {
        GlobalState::Idle => 'I',
        GlobalState::Routing => 'R',
        GlobalState::VcWait => 'V',
        GlobalState::Active => 'A',
        GlobalState::CreditWait => 'C',
    }
}

fn port_str(port: Option<usize>) -> String {
    match port {
        Some(p) => p.to_string(),
        None => "-1".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{Connection, RouterPortPair};

    fn terminal_pair(delay: Time) -> (Router, Router, Vec<Channel>, EventQueue) {
        let eq = EventQueue::new();

        let src_to_rtr = Connection {
            src: RouterPortPair::new(Id::src(0), 0),
            dst: RouterPortPair::new(Id::rtr(0), 0),
            uniq: 0,
        };
        let rtr_to_dst = Connection {
            src: RouterPortPair::new(Id::rtr(0), 0),
            dst: RouterPortPair::new(Id::dst(0), 0),
            uniq: 1,
        };
        let channels = vec![Channel::new(src_to_rtr, delay), Channel::new(rtr_to_dst, delay)];

        let routing = RoutingDesc { radix: 1, dims: 1 };
        let src = Router::new(Id::src(0), 1, vec![], vec![0], 8, 1, routing, 0);
        let dst = Router::new(Id::dst(0), 1, vec![1], vec![], 8, 1, routing, 0);

        (src, dst, channels, eq)
    }

    #[test]
    fn source_generates_when_credited() {
        let (mut src, _dst, mut channels, mut eq) = terminal_pair(1);
        let double = src.tick(&mut channels, &mut eq);
        assert!(!double);
        assert_eq!(src.flit_gen_count, 1);
    }

    #[test]
    fn source_stalls_without_credit() {
        let (mut src, _dst, mut channels, mut eq) = terminal_pair(1);
        for _ in 0..9 {
            src.tick(&mut channels, &mut eq);
            if eq.peek_next_time().is_some() {
                eq.pop();
            }
        }
        // with an 8-deep credit pool and no credit ever returned, generation
        // must eventually stall.
        assert!(src.flit_gen_count <= 8);
    }

    #[test]
    fn double_tick_is_a_no_op() {
        let (mut src, _dst, mut channels, mut eq) = terminal_pair(1);
        src.tick(&mut channels, &mut eq);
        assert!(src.tick(&mut channels, &mut eq));
        assert_eq!(src.flit_gen_count, 1);
    }
}
