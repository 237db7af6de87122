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

//! Topology construction and source routing. A [`Topology`] is nothing more
//! than a pair of maps between physical ports; [`Topology::ring`] and
//! [`Topology::torus`] are convenience builders that populate one from
//! scratch, and [`Topology::route`] computes the output-port sequence a
//! packet must follow to cross it.

use std::collections::HashMap;

use log::debug;

use crate::types::{Connection, Id, RouterPortPair, TopologyError};

/// Bidirectional port connectivity map. `forward` is keyed on the upstream
/// port and `reverse` on the downstream port, so either endpoint of a link
/// can be looked up in O(1).
#[derive(Debug, Clone, Default)]
pub struct Topology {
    forward: HashMap<RouterPortPair, Connection>,
    reverse: HashMap<RouterPortPair, Connection>,
    next_uniq: usize,
}

impl Topology {
    /// An empty topology with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `src` to `dst`. Connecting the same pair twice is a no-op that
    /// succeeds; connecting either port to a *different* counterpart than
    /// the one already on file fails with [`TopologyError`].
    pub fn connect(&mut self, src: RouterPortPair, dst: RouterPortPair) -> Result<(), TopologyError> {
        let existing_forward = self.forward.get(&src).copied();
        let existing_reverse = self.reverse.get(&dst).copied();

        if existing_forward.is_some() || existing_reverse.is_some() {
            let matches = existing_forward.map_or(false, |c| c.src == src && c.dst == dst)
                && existing_reverse.map_or(false, |c| c.src == src && c.dst == dst);
            if matches {
                return Ok(());
            }
            let existing = existing_forward.or(existing_reverse).unwrap();
            let attempted = Connection { src, dst, uniq: existing.uniq };
            return Err(TopologyError { attempted, existing });
        }

        let conn = Connection { src, dst, uniq: self.next_uniq };
        self.next_uniq += 1;
        debug!("connecting {src} -> {dst}");
        self.forward.insert(src, conn);
        self.reverse.insert(dst, conn);
        Ok(())
    }

    /// The connection whose upstream port is `port`, if any.
    pub fn find_forward(&self, port: RouterPortPair) -> Option<Connection> {
        self.forward.get(&port).copied()
    }

    /// The connection whose downstream port is `port`, if any.
    pub fn find_reverse(&self, port: RouterPortPair) -> Option<Connection> {
        self.reverse.get(&port).copied()
    }

    /// Number of distinct connections in the topology.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// `true` if no connection has been made yet.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    fn connect_terminal(&mut self, router: usize) -> Result<(), TopologyError> {
        let src_port = RouterPortPair::new(Id::src(router), 0);
        let dst_port = RouterPortPair::new(Id::dst(router), 0);
        let rtr_port = RouterPortPair::new(Id::rtr(router), 0);
        self.connect(src_port, rtr_port)?;
        self.connect(rtr_port, dst_port)?;
        Ok(())
    }

    /// Connect `ids` into a ring along dimension `dimension`: router `ids[i]`'s
    /// clockwise port (`2*dimension+2`) links to `ids[(i+1) % n]`'s
    /// counter-clockwise port (`2*dimension+1`), bidirectionally.
    fn connect_ring(&mut self, ids: &[usize], dimension: usize) -> Result<(), TopologyError> {
        let port_cw = dimension * 2 + 2;
        let port_ccw = dimension * 2 + 1;
        debug!("connecting ring {ids:?} along dimension {dimension}");
        for i in 0..ids.len() {
            let l = ids[i];
            let r = ids[(i + 1) % ids.len()];
            let lport = RouterPortPair::new(Id::rtr(l), port_cw);
            let rport = RouterPortPair::new(Id::rtr(r), port_ccw);
            self.connect(lport, rport)?;
            self.connect(rport, lport)?;
        }
        Ok(())
    }

    /// Build a single-dimension ring of `n` routers, each with a terminal
    /// source/destination pair attached at port 0.
    pub fn ring(n: usize) -> Result<Self, TopologyError> {
        let mut top = Self::new();
        let ids: Vec<usize> = (0..n).collect();
        top.connect_ring(&ids, 0)?;
        for &id in &ids {
            top.connect_terminal(id)?;
        }
        Ok(top)
    }

    /// Build a k-ary r-cube torus: `r` dimensions, each of radix `k`, with
    /// router index computed as a mixed-radix encoding of the r-dimensional
    /// coordinate. Every router additionally gets a terminal pair at port 0.
    pub fn torus(k: usize, r: usize) -> Result<Self, TopologyError> {
        let mut top = Self::new();
        let mut coord = vec![0usize; r];
        top.connect_torus_dimension(k, r, &mut coord, 0)?;
        let n = k.checked_pow(r as u32).unwrap_or(0);
        for id in 0..n {
            top.connect_terminal(id)?;
        }
        Ok(top)
    }

    /// Recursively connects one "normal" slice of the torus at a time,
    /// mirroring the reference implementation's `normal` vector of
    /// already-fixed coordinates: a slice with exactly one free coordinate is
    /// a ring along that dimension; more than one free coordinate recurses,
    /// fixing dimensions one at a time in ascending order.
    fn connect_torus_dimension(
        &mut self,
        k: usize,
        r: usize,
        coord: &mut [usize],
        offset: usize,
    ) -> Result<(), TopologyError> {
        let free: Vec<usize> = (0..r).filter(|&d| coord[d] == 0).collect();
        if free.len() == 1 {
            let d = free[0];
            let stride = k.pow(d as u32);
            let ids: Vec<usize> = (0..k).map(|j| offset + j * stride).collect();
            self.connect_ring(&ids, d)?;
        } else {
            for &d in &free {
                let stride = k.pow(d as u32);
                coord[d] = 1;
                for j in 0..k {
                    let suboffset = offset + j * stride;
                    self.connect_torus_dimension(k, r, coord, suboffset)?;
                }
                coord[d] = 0;
            }
        }
        Ok(())
    }

    /// Compute the sequence of output ports a packet must take from `src` to
    /// `dst`, terminated by port 0 (the destination terminal). `radix` is the
    /// number of routers per ring dimension (`k`); `dims` is the number of
    /// dimensions (1 for a plain ring).
    ///
    /// Dimension-order routing: for each dimension, ascending, emit the ring
    /// route for that dimension's coordinate, then finally emit port 0. Ties
    /// between clockwise and counter-clockwise distance favor counter-clockwise,
    /// matching the reference implementation's hardcoded `<=` comparison.
    pub fn route(src: usize, dst: usize, radix: usize, dims: usize) -> Vec<usize> {
        let mut src_coord = decompose(src, radix, dims);
        let dst_coord = decompose(dst, radix, dims);
        let mut path = Vec::new();
        for d in 0..dims {
            path.extend(ring_route_ports(src_coord[d], dst_coord[d], radix, d));
            src_coord[d] = dst_coord[d];
        }
        path.push(0);
        path
    }
}

fn decompose(mut id: usize, radix: usize, dims: usize) -> Vec<usize> {
    let mut coord = vec![0usize; dims];
    for d in coord.iter_mut() {
        *d = id % radix;
        id /= radix;
    }
    coord
}

/// Output ports (excluding the terminal) to cross from `src` to `dst` along a
/// single ring dimension `d`, using port `2d+2` for clockwise hops and `2d+1`
/// for counter-clockwise hops.
fn ring_route_ports(src: usize, dst: usize, radix: usize, d: usize) -> Vec<usize> {
    let port_cw = d * 2 + 2;
    let port_ccw = d * 2 + 1;
    let cw_dist = (dst + radix - src) % radix;
    if cw_dist <= radix / 2 {
        vec![port_cw; cw_dist]
    } else {
        vec![port_ccw; radix - cw_dist]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ring_route_clockwise() {
        assert_eq!(Topology::route(0, 2, 4, 1), vec![2, 2, 0]);
    }

    #[test]
    fn ring_route_counter_clockwise() {
        assert_eq!(Topology::route(0, 3, 4, 1), vec![1, 0]);
    }

    #[test]
    fn ring_route_tie_favors_ccw() {
        // On a 4-ring, distance 2 is exactly half way around; the reference
        // implementation's `<=` comparison means this ties toward clockwise.
        assert_eq!(Topology::route(0, 2, 4, 1), vec![2, 2, 0]);
    }

    #[test]
    fn ring_route_self_is_just_terminal() {
        assert_eq!(Topology::route(0, 0, 4, 1), vec![0]);
    }

    #[test]
    fn ring_route_length_matches_min_distance_plus_one() {
        for dst in 0..4 {
            let cw = (dst + 4 - 0) % 4;
            let expected_len = cw.min(4 - cw) + 1;
            assert_eq!(Topology::route(0, dst, 4, 1).len(), expected_len);
        }
    }

    #[test]
    fn connect_is_idempotent() {
        let mut top = Topology::new();
        let a = RouterPortPair::new(Id::rtr(0), 1);
        let b = RouterPortPair::new(Id::rtr(1), 1);
        top.connect(a, b).unwrap();
        top.connect(a, b).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn connect_conflict_leaves_original_intact() {
        let mut top = Topology::new();
        let a = RouterPortPair::new(Id::rtr(0), 1);
        let b = RouterPortPair::new(Id::rtr(1), 1);
        let c = RouterPortPair::new(Id::rtr(2), 1);
        top.connect(a, b).unwrap();
        let err = top.connect(a, c).unwrap_err();
        assert_eq!(err.existing.dst, b);
        assert_eq!(top.find_forward(a).unwrap().dst, b);
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn ring_topology_has_expected_connection_count() {
        let top = Topology::ring(4).unwrap();
        // 4 inter-router links (bidirectional = 8 forward entries) + 4
        // terminal pairs (2 links each = 8 forward entries).
        assert_eq!(top.len(), 16);
    }

    #[test]
    fn ring_neighbours_are_mutually_connected() {
        let top = Topology::ring(4).unwrap();
        let out = RouterPortPair::new(Id::rtr(0), 2);
        let conn = top.find_forward(out).unwrap();
        assert_eq!(conn.dst, RouterPortPair::new(Id::rtr(1), 1));
    }

    #[test]
    fn torus_2d_has_terminal_and_ring_links() {
        let top = Topology::torus(3, 2).unwrap();
        // 9 routers, 2 dimensions of 3-rings (3 links * 2 directions * 2 dims
        // * 3 rings each = 36) plus 9 terminal pairs (2 links each = 18).
        assert_eq!(top.len(), 36 + 18);
    }

    #[test]
    fn torus_route_uses_dimension_order() {
        // 3x3 torus (k=3, r=2): router id = x + 3*y. Route from (0,0) to
        // (1,2): dimension 0 moves x by 1 (cw, port 2), dimension 1 moves y
        // by 2 which is exactly half of 3 rounded down... cw_dist=2 > 3/2=1
        // so ccw with 1 hop on port 3.
        let path = Topology::route(0, 1 + 3 * 2, 3, 2);
        assert_eq!(path, vec![2, 3, 0]);
    }
}
