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

//! A point-to-point link between two router ports: a fixed-delay flit FIFO
//! in one direction and a fixed-delay credit FIFO in the other. The event
//! queue driving delivery is owned centrally by the simulator and passed in
//! by reference, rather than shared by `Rc<RefCell<_>>`, so that channels,
//! routers and the queue stay three plain sibling fields instead of a web of
//! interior-mutable cross-references.

use std::collections::VecDeque;
use std::fmt;

use crate::event::{Event, EventQueue};
use crate::types::{Connection, Credit, Flit, Time};

struct Timed<T> {
    time: Time,
    payload: T,
}

/// A single physical channel connecting an upstream output port to a
/// downstream input port, plus the credit return path running the other way.
pub struct Channel {
    /// The connection this channel implements.
    pub conn: Connection,
    /// Cycles a flit or credit spends in flight before it may be fetched.
    pub delay: Time,
    flits: VecDeque<Timed<Flit>>,
    credits: VecDeque<Timed<Credit>>,
}

impl Channel {
    /// Construct a channel of `delay` cycles over `conn`.
    pub fn new(conn: Connection, delay: Time) -> Self {
        assert!(delay >= 1, "channel delay must be at least 1 cycle, got {delay}");
        Self { conn, delay, flits: VecDeque::new(), credits: VecDeque::new() }
    }

    /// Send `flit` downstream; it becomes available to [`Channel::try_get_flit`]
    /// `delay` cycles from now, at which point the destination node is
    /// automatically rescheduled.
    pub fn put_flit(&mut self, flit: Flit, eq: &mut EventQueue) {
        let time = eq.now() + self.delay;
        self.flits.push_back(Timed { time, payload: flit });
        eq.reschedule(self.delay, Event::tick(self.conn.dst.id));
    }

    /// Send a credit back upstream; symmetric to [`Channel::put_flit`], but
    /// it reschedules the *source* of the connection.
    pub fn put_credit(&mut self, credit: Credit, eq: &mut EventQueue) {
        let time = eq.now() + self.delay;
        self.credits.push_back(Timed { time, payload: credit });
        eq.reschedule(self.delay, Event::tick(self.conn.src.id));
    }

    /// Pop the next flit if its delivery time has arrived. Asserts the
    /// in-flight entry is never fetched early (a delivery time in the future
    /// would mean the scheduler woke this node up too soon).
    pub fn try_get_flit(&mut self, eq: &EventQueue) -> Option<Flit> {
        let now = eq.now();
        let ready = self.flits.front().is_some_and(|f| now >= f.time);
        if !ready {
            return None;
        }
        let front = self.flits.pop_front().unwrap();
        assert_eq!(now, front.time, "stale flit fetched at {now}, due at {}", front.time);
        Some(front.payload)
    }

    /// Pop the next credit if its delivery time has arrived. See
    /// [`Channel::try_get_flit`] for the staleness invariant.
    pub fn try_get_credit(&mut self, eq: &EventQueue) -> Option<Credit> {
        let now = eq.now();
        let ready = self.credits.front().is_some_and(|c| now >= c.time);
        if !ready {
            return None;
        }
        let front = self.credits.pop_front().unwrap();
        assert_eq!(now, front.time, "stale credit fetched at {now}, due at {}", front.time);
        Some(front.payload)
    }

    /// Render the flits currently in flight, for the debugger's `p` command.
    pub fn fmt_inflight(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for tf in &self.flits {
            write!(out, "{}:{},", tf.time, tf.payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{FlitType, Id, RouterPortPair};

    fn make_channel(delay: Time) -> (Channel, EventQueue) {
        let eq = EventQueue::new();
        let conn = Connection {
            src: RouterPortPair::new(Id::rtr(0), 2),
            dst: RouterPortPair::new(Id::rtr(1), 1),
            uniq: 0,
        };
        (Channel::new(conn, delay), eq)
    }

    #[test]
    fn flit_not_available_before_delay_elapses() {
        let (mut ch, mut eq) = make_channel(2);
        ch.put_flit(Flit::new(FlitType::Head, 0, 1, 0), &mut eq);
        assert!(ch.try_get_flit(&eq).is_none());
        eq.pop();
        assert_eq!(eq.now(), 2);
        assert!(ch.try_get_flit(&eq).is_some());
    }

    #[test]
    fn credit_round_trips_after_delay() {
        let (mut ch, mut eq) = make_channel(1);
        ch.put_credit(Credit, &mut eq);
        eq.pop();
        assert!(ch.try_get_credit(&eq).is_some());
        assert!(ch.try_get_credit(&eq).is_none());
    }

    #[test]
    fn put_reschedules_the_downstream_target() {
        let (mut ch, mut eq) = make_channel(3);
        ch.put_flit(Flit::new(FlitType::Head, 0, 1, 0), &mut eq);
        assert_eq!(eq.peek_next_time(), Some(3));
        let ev = eq.pop();
        assert_eq!(ev.target, Id::rtr(1));
    }
}
