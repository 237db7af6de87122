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

//! End-to-end scenarios exercising the whole pipeline through
//! [`crate::network::Simulator`], as opposed to the per-module unit tests
//! that live alongside each file. Internal router and channel state is
//! private by design, so these tests observe the system the same way the
//! CLI binary does: generated/arrived counters, double-tick count, and
//! whether a run completes without a fatal assertion.

use crate::config::{SimConfig, TopologyKind};
use crate::network::Simulator;

fn ring(radix: usize, packet_size: i64, buffer_depth: usize) -> SimConfig {
    SimConfig::new(TopologyKind::Ring, radix, 1, buffer_depth, packet_size).unwrap()
}

#[test]
fn four_ring_every_destination_receives_at_least_one_packet() {
    let cfg = ring(4, 4, 8);
    let mut sim = Simulator::build(&cfg).unwrap();
    sim.run_until(Some(10_000));

    for i in 0..4 {
        assert!(sim.flits_arrived(i) >= 1, "destination {i} received nothing");
    }
    assert_eq!(sim.double_tick_count(), 0);
}

#[test]
fn conservation_arrived_never_exceeds_generated() {
    let cfg = ring(6, 3, 4);
    let mut sim = Simulator::build(&cfg).unwrap();

    for checkpoint in [10, 100, 1_000, 5_000] {
        sim.run_until(Some(checkpoint));
        let generated: u64 = (0..6).map(|i| sim.flits_generated(i)).sum();
        let arrived: u64 = (0..6).map(|i| sim.flits_arrived(i)).sum();
        assert!(arrived <= generated, "arrived {arrived} exceeded generated {generated} at t={checkpoint}");
    }
}

#[test]
fn tight_buffering_runs_without_tripping_the_credit_invariant() {
    // A single-slot buffer forces every output unit into CreditWait as soon
    // as it sends a flit; if `OU.credit_count` ever went negative or the
    // CreditWait/credit_count invariant broke, `router::credit_update` and
    // `switch_traverse` would panic well before 2000 cycles elapse.
    let cfg = ring(4, 4, 1);
    let mut sim = Simulator::build(&cfg).unwrap();
    sim.run_until(Some(2_000));
    assert_eq!(sim.double_tick_count(), 0);
}

#[test]
fn single_step_advances_exactly_one_dispatch_at_a_time() {
    let cfg = ring(4, 4, 8);
    let mut sim = Simulator::build(&cfg).unwrap();
    let before = sim.now();
    sim.step_one();
    assert!(sim.now() >= before);
}

#[test]
fn torus_conservation_holds_under_multiple_dimensions() {
    let cfg = SimConfig::new(TopologyKind::Torus { dims: 2 }, 4, 1, 4, 4).unwrap();
    let mut sim = Simulator::build(&cfg).unwrap();
    sim.run_until(Some(3_000));

    let n = sim.terminal_count();
    let generated: u64 = (0..n).map(|i| sim.flits_generated(i)).sum();
    let arrived: u64 = (0..n).map(|i| sim.flits_arrived(i)).sum();
    assert!(arrived <= generated);
    assert!(generated > 0);
    assert_eq!(sim.double_tick_count(), 0);
}

#[test]
fn report_lists_every_terminal_exactly_once() {
    use pretty_assertions::assert_eq;

    let cfg = ring(4, 4, 8);
    let mut sim = Simulator::build(&cfg).unwrap();
    sim.run_until(Some(100));
    let report = sim.report();

    let generated_lines: Vec<&str> =
        report.lines().filter(|l| l.contains("flits generated")).collect();
    let arrived_lines: Vec<&str> =
        report.lines().filter(|l| l.contains("flits arrived")).collect();
    assert_eq!(generated_lines.len(), 4);
    assert_eq!(arrived_lines.len(), 4);
}

#[test_log::test]
fn route_computation_is_observable_via_trace_level_logging() {
    // Run with RUST_LOG=trace (or under `test-log`'s default capture) to see
    // per-flit `trace!` lines; this just asserts the run itself completes,
    // exercising the logging path without parsing captured output.
    let cfg = ring(4, 4, 8);
    let mut sim = Simulator::build(&cfg).unwrap();
    sim.run_until(Some(50));
    assert_eq!(sim.double_tick_count(), 0);
}
