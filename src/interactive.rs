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

//! A line-oriented debugger: `n` steps one cycle, `c N` runs until cycle
//! `N`, `p` prints router state, `q` quits, and an empty line is a no-op.
//! Mirrors the reference implementation's `sim_debug_step`.

use std::io::{self, BufRead, Write};

use crate::network::Simulator;

/// The result of interpreting one debugger command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Advance exactly one cycle.
    Step,
    /// Run until the given cycle.
    ContinueUntil(i64),
    /// Print all router state.
    Print,
    /// Quit the debugger.
    Quit,
    /// Blank line; do nothing.
    Noop,
}

/// Parse one line of debugger input. Unrecognized input is treated as
/// [`DebugCommand::Noop`] after printing a message, matching the reference
/// implementation's "Unknown command." behavior.
pub fn parse_command(line: &str) -> Result<DebugCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(DebugCommand::Noop);
    }
    if line == "q" {
        return Ok(DebugCommand::Quit);
    }
    if line == "n" {
        return Ok(DebugCommand::Step);
    }
    if line == "p" {
        return Ok(DebugCommand::Print);
    }
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("c") => {
            let arg = tokens.next().ok_or("No argument given.")?;
            let until: i64 = arg.parse().map_err(|_| "Invalid command.".to_string())?;
            Ok(DebugCommand::ContinueUntil(until))
        }
        _ => Err("Unknown command.".to_string()),
    }
}

/// Drive an interactive debugging session over stdin/stdout until `q` or EOF.
pub fn run(sim: &mut Simulator) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("(@{}) > ", sim.now());
        stdout.flush().ok();
        line.clear();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        match parse_command(&line) {
            Ok(DebugCommand::Quit) => break,
            Ok(DebugCommand::Noop) => {}
            Ok(DebugCommand::Step) => {
                let until = sim.now() + 1;
                sim.run_until(Some(until));
            }
            Ok(DebugCommand::Print) => print!("{}", sim.print_state()),
            Ok(DebugCommand::ContinueUntil(until)) => sim.run_until(Some(until)),
            Err(message) => println!("{message}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command(""), Ok(DebugCommand::Noop));
        assert_eq!(parse_command("n"), Ok(DebugCommand::Step));
        assert_eq!(parse_command("p"), Ok(DebugCommand::Print));
        assert_eq!(parse_command("q"), Ok(DebugCommand::Quit));
    }

    #[test]
    fn parses_continue_with_argument() {
        assert_eq!(parse_command("c 42"), Ok(DebugCommand::ContinueUntil(42)));
    }

    #[test]
    fn rejects_continue_without_argument() {
        assert_eq!(parse_command("c"), Err("No argument given.".to_string()));
    }

    #[test]
    fn rejects_continue_with_garbage_argument() {
        assert_eq!(parse_command("c abc"), Err("Invalid command.".to_string()));
    }

    #[test]
    fn rejects_unknown_command() {
        assert_eq!(parse_command("xyz"), Err("Unknown command.".to_string()));
    }
}
