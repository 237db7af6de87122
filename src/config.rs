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

//! Plain configuration data for a simulation run. Nothing here is wired to
//! `serde`: the CLI is the only producer, and there is no saved-scenario
//! format in scope.

use thiserror::Error;

use crate::types::Time;

/// The shape of the network to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
    /// A single-dimension ring of `radix` routers.
    Ring,
    /// A k-ary r-cube torus of `radix^dims` routers.
    Torus {
        /// Number of dimensions.
        dims: usize,
    },
}

/// Error returned by [`SimConfig::new`] when the requested parameters cannot
/// describe a valid network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `radix` was zero or one, which cannot form a ring or torus dimension.
    #[error("radix must be at least 2 to form a ring, got {0}")]
    RadixTooSmall(usize),
    /// A torus was requested with zero dimensions.
    #[error("torus must have at least 1 dimension, got 0")]
    ZeroDimensions,
    /// The per-channel delay was zero.
    #[error("channel delay must be at least 1 cycle, got 0")]
    ZeroDelay,
    /// The per-port buffer depth was zero.
    #[error("buffer depth must be at least 1, got 0")]
    ZeroBufferDepth,
    /// The packet size was zero.
    #[error("packet_size must be at least 1, got 0")]
    ZeroPacketSize,
}

/// Configuration for a single simulation run: topology shape and size, link
/// delay, per-port buffer depth, and packet size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Ring or torus, with its dimensionality.
    pub topology: TopologyKind,
    /// Routers per ring dimension.
    pub radix: usize,
    /// Cycles a flit or credit spends in flight on any channel.
    pub channel_delay: Time,
    /// Input/output unit buffer depth.
    pub buffer_depth: usize,
    /// Flits per packet; `packet_size - 1` is the Tail's payload counter.
    pub packet_size: i64,
}

impl SimConfig {
    /// Construct and validate a configuration.
    pub fn new(
        topology: TopologyKind,
        radix: usize,
        channel_delay: Time,
        buffer_depth: usize,
        packet_size: i64,
    ) -> Result<Self, ConfigError> {
        if radix < 2 {
            return Err(ConfigError::RadixTooSmall(radix));
        }
        if let TopologyKind::Torus { dims } = topology {
            if dims == 0 {
                return Err(ConfigError::ZeroDimensions);
            }
        }
        if channel_delay < 1 {
            return Err(ConfigError::ZeroDelay);
        }
        if buffer_depth == 0 {
            return Err(ConfigError::ZeroBufferDepth);
        }
        if packet_size < 1 {
            return Err(ConfigError::ZeroPacketSize);
        }
        Ok(Self { topology, radix, channel_delay, buffer_depth, packet_size })
    }

    /// Number of dimensions of the ring/torus (1 for a plain ring).
    pub fn dims(&self) -> usize {
        match self.topology {
            TopologyKind::Ring => 1,
            TopologyKind::Torus { dims } => dims,
        }
    }

    /// Total number of routers (and terminal pairs) in the network.
    pub fn terminal_count(&self) -> usize {
        self.radix.pow(self.dims() as u32)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_degenerate_radix() {
        assert_eq!(SimConfig::new(TopologyKind::Ring, 1, 1, 4, 4), Err(ConfigError::RadixTooSmall(1)));
    }

    #[test]
    fn rejects_zero_dimension_torus() {
        assert_eq!(
            SimConfig::new(TopologyKind::Torus { dims: 0 }, 3, 1, 4, 4),
            Err(ConfigError::ZeroDimensions)
        );
    }

    #[test]
    fn ring_terminal_count_matches_radix() {
        let cfg = SimConfig::new(TopologyKind::Ring, 4, 1, 4, 4).unwrap();
        assert_eq!(cfg.terminal_count(), 4);
    }

    #[test]
    fn torus_terminal_count_is_radix_to_the_dims() {
        let cfg = SimConfig::new(TopologyKind::Torus { dims: 2 }, 3, 1, 4, 4).unwrap();
        assert_eq!(cfg.terminal_count(), 9);
    }
}
