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

//! Small formatting helpers shared by the trace log and the debugger's
//! state dump, kept separate from [`crate::router`] so the pipeline logic
//! doesn't have to think about presentation.

use crate::types::{Id, Time};

/// Build the `[@<time>] [<NodeIdStr>]` prefix every trace line starts with,
/// mirroring the reference implementation's `debugf()`.
pub fn trace_prefix(time: Time, id: Id) -> String {
    format!("[@{time}] [{id}]")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefix_matches_reference_format() {
        assert_eq!(trace_prefix(42, Id::rtr(3)), "[@42] [Rtr 3]");
    }
}
