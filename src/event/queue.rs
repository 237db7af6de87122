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

//! The time-ordered priority queue. Every router tick, and every delayed
//! flit/credit delivery, is driven by popping the earliest entry here.

use std::cmp::Reverse;

use priority_queue::PriorityQueue;

use super::Event;
use crate::types::Time;

/// A queue entry. `seq` makes every entry unique even when two events target
/// the same node at the same time, which [`PriorityQueue`] requires (it is
/// keyed: pushing an already-present key merely updates its priority rather
/// than inserting a second entry). Tagging every push with a fresh sequence
/// number turns the keyed queue into the plain multi-set time-ordered queue
/// the simulator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Entry {
    event: Event,
    seq: u64,
}

/// Time-ordered event queue. Pops the earliest-scheduled event first; among
/// events scheduled for the same cycle, the one scheduled earliest (smallest
/// `seq`) pops first, giving a deterministic FIFO tie-break.
#[derive(Debug)]
pub struct EventQueue {
    pq: PriorityQueue<Entry, Reverse<(Time, u64)>>,
    now: Time,
    next_seq: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Construct an empty queue with the clock at time zero.
    pub fn new() -> Self {
        Self { pq: PriorityQueue::new(), now: 0, next_seq: 0 }
    }

    /// Schedule `event` at an absolute `time`. `time` must not be in the past.
    pub fn schedule(&mut self, time: Time, event: Event) {
        assert!(
            time >= self.now,
            "cannot schedule {event:?} at {time} when the clock already reads {}",
            self.now
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pq.push(Entry { event, seq }, Reverse((time, seq)));
    }

    /// Schedule `event` at `now() + rel_time`.
    pub fn reschedule(&mut self, rel_time: Time, event: Event) {
        self.schedule(self.now + rel_time, event);
    }

    /// Remove and return the earliest-scheduled event, advancing the clock to
    /// its time. Panics if the queue is empty; popping from an empty queue
    /// is a simulator bug, never a user error.
    pub fn pop(&mut self) -> Event {
        let (entry, Reverse((time, _))) =
            self.pq.pop().expect("pop() called on an empty event queue");
        assert!(time >= self.now, "time went backward: {time} < {}", self.now);
        self.now = time;
        entry.event
    }

    /// The time of the earliest pending event, without popping it.
    pub fn peek_next_time(&self) -> Option<Time> {
        self.pq.peek().map(|(_, Reverse((time, _)))| *time)
    }

    /// The current simulation clock.
    pub fn now(&self) -> Time {
        self.now
    }

    /// `true` if there is nothing left to process.
    pub fn empty(&self) -> bool {
        self.pq.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pq.len()
    }

    /// `true` if `len() == 0`. Provided alongside [`EventQueue::empty`] to
    /// satisfy clippy's `len_without_is_empty` lint on downstream users.
    pub fn is_empty(&self) -> bool {
        self.empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Id;

    #[test]
    fn orders_by_time() {
        let mut q = EventQueue::new();
        q.schedule(5, Event::tick(Id::rtr(0)));
        q.schedule(1, Event::tick(Id::rtr(1)));
        q.schedule(3, Event::tick(Id::rtr(2)));
        assert_eq!(q.pop().target, Id::rtr(1));
        assert_eq!(q.now(), 1);
        assert_eq!(q.pop().target, Id::rtr(2));
        assert_eq!(q.pop().target, Id::rtr(0));
        assert!(q.empty());
    }

    #[test]
    fn ties_break_fifo() {
        let mut q = EventQueue::new();
        q.schedule(0, Event::tick(Id::rtr(0)));
        q.schedule(0, Event::tick(Id::rtr(1)));
        q.schedule(0, Event::tick(Id::rtr(2)));
        assert_eq!(q.pop().target, Id::rtr(0));
        assert_eq!(q.pop().target, Id::rtr(1));
        assert_eq!(q.pop().target, Id::rtr(2));
    }

    #[test]
    fn duplicate_target_both_fire() {
        // Two ticks scheduled for the same router at different times must
        // both be delivered -- a keyed priority queue without the `seq`
        // wrapper would silently collapse these into one entry.
        let mut q = EventQueue::new();
        q.schedule(2, Event::tick(Id::rtr(0)));
        q.schedule(5, Event::tick(Id::rtr(0)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().target, Id::rtr(0));
        assert_eq!(q.now(), 2);
        assert_eq!(q.pop().target, Id::rtr(0));
        assert_eq!(q.now(), 5);
    }

    #[test]
    fn reschedule_is_relative_to_now() {
        let mut q = EventQueue::new();
        q.schedule(4, Event::tick(Id::rtr(0)));
        assert_eq!(q.pop().target, Id::rtr(0));
        q.reschedule(3, Event::tick(Id::rtr(1)));
        assert_eq!(q.peek_next_time(), Some(7));
    }

    #[test]
    #[should_panic(expected = "cannot schedule")]
    fn rejects_scheduling_into_the_past() {
        let mut q = EventQueue::new();
        q.schedule(4, Event::tick(Id::rtr(0)));
        let _ = q.pop();
        q.schedule(1, Event::tick(Id::rtr(0)));
    }
}
