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

//! Command-line entry point: `sim [debug] TERMINALS ROUTERS RADIX`.

use clap::Parser;
use thiserror::Error;

use torusim::config::{SimConfig, TopologyKind};
use torusim::interactive;
use torusim::network::Simulator;

const DEFAULT_CHANNEL_DELAY: i64 = 1;
const DEFAULT_BUFFER_DEPTH: usize = 8;
const DEFAULT_PACKET_SIZE: i64 = 4;
const DEFAULT_RUN_CYCLES: i64 = 10_000;

/// A ring topology of `radix` routers, each with one attached source and
/// one attached destination terminal.
#[derive(Parser, Debug)]
#[command(name = "sim", about = "Cycle-accurate interconnection network simulator")]
struct Cli {
    /// Enter the interactive debugger instead of running to completion.
    #[arg(long = "debug", short = 'd')]
    debug: bool,

    /// Number of source/destination terminal pairs. Must equal ROUTERS.
    terminals: usize,

    /// Number of routers in the ring. Must equal TERMINALS and RADIX.
    routers: usize,

    /// Ring radix: the number of routers.
    radix: usize,
}

/// Malformed CLI arguments, the only "user input error" surface `main`
/// itself is responsible for (the debugger handles its own separately).
#[derive(Debug, Error)]
enum CliError {
    #[error("TERMINALS ({terminals}), ROUTERS ({routers}) and RADIX ({radix}) must all agree for a ring network")]
    SizeMismatch { terminals: usize, routers: usize, radix: usize },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();

    if cli.terminals != cli.routers || cli.routers != cli.radix {
        return Err(Box::new(CliError::SizeMismatch {
            terminals: cli.terminals,
            routers: cli.routers,
            radix: cli.radix,
        }));
    }

    let config = SimConfig::new(
        TopologyKind::Ring,
        cli.radix,
        DEFAULT_CHANNEL_DELAY,
        DEFAULT_BUFFER_DEPTH,
        DEFAULT_PACKET_SIZE,
    )?;
    let mut sim = Simulator::build(&config)?;

    if cli.debug {
        interactive::run(&mut sim);
    } else {
        sim.run_until(Some(DEFAULT_RUN_CYCLES));
    }

    println!("{}", sim.report());
    Ok(())
}
