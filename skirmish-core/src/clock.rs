//! World clock and scheduled events.
//!
//! Events are queued by fire time, ties broken by insertion order. The clock
//! only moves forward: it advances to each event's fire time as the event
//! fires, then to the requested target.

use crate::dispatch::Command;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What happens when an event fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Commands executed in order when the event fires.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Free-form data for registered handlers.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventPayload {
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub name: String,
    pub at_min: u32,
    pub seq: u64,
    pub payload: EventPayload,
}

/// Queue summary of a scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub name: String,
    pub at_min: u32,
    pub seq: u64,
}

/// Orders events by (fire time, sequence).
#[derive(Debug, Clone)]
struct OrderedEvent(ScheduledEvent);

impl OrderedEvent {
    fn key(&self) -> (u32, u64) {
        (self.0.at_min, self.0.seq)
    }
}

impl PartialEq for OrderedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OrderedEvent {}

impl PartialOrd for OrderedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[derive(Debug, Clone)]
pub struct EventClock {
    now: u32,
    next_seq: u64,
    queue: BinaryHeap<Reverse<OrderedEvent>>,
}

impl EventClock {
    pub fn new(start_min: u32) -> Self {
        Self {
            now: start_min,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current time in minutes.
    pub fn now(&self) -> u32 {
        self.now
    }

    /// Sequence number the next scheduled event will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn schedule(&mut self, name: &str, at_min: u32, payload: EventPayload) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(OrderedEvent(ScheduledEvent {
            name: name.to_string(),
            at_min,
            seq,
            payload,
        })));
        seq
    }

    /// Pop the earliest event due at or before `until`, moving the clock to it.
    ///
    /// Events scheduled in the past fire at the current time instead.
    pub fn pop_due(&mut self, until: u32) -> Option<ScheduledEvent> {
        let Reverse(next) = self.queue.peek()?;
        if next.0.at_min > until {
            return None;
        }
        let Reverse(OrderedEvent(event)) = self.queue.pop()?;
        self.now = self.now.max(event.at_min);
        Some(event)
    }

    /// Move the clock forward to `target`. Earlier targets are ignored.
    pub fn advance_to(&mut self, target: u32) {
        self.now = self.now.max(target);
    }

    /// Pending events in firing order.
    pub fn pending(&self) -> Vec<PendingEvent> {
        let mut events: Vec<&OrderedEvent> = self.queue.iter().map(|Reverse(e)| e).collect();
        events.sort();
        events
            .into_iter()
            .map(|e| PendingEvent {
                name: e.0.name.clone(),
                at_min: e.0.at_min,
                seq: e.0.seq,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Format minutes since midnight as `HH:MM` (days wrap).
pub fn clock_label(minutes: u32) -> String {
    let day = minutes % (24 * 60);
    format!("{:02}:{:02}", day / 60, day % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_then_insertion_order() {
        let mut clock = EventClock::new(0);
        clock.schedule("late", 20, EventPayload::default());
        clock.schedule("first", 5, EventPayload::default());
        clock.schedule("second", 5, EventPayload::default());

        let mut fired = Vec::new();
        while let Some(event) = clock.pop_due(30) {
            fired.push((event.name, clock.now()));
        }
        assert_eq!(
            fired,
            vec![
                ("first".to_string(), 5),
                ("second".to_string(), 5),
                ("late".to_string(), 20)
            ]
        );
    }

    #[test]
    fn test_not_yet_due_stays_queued() {
        let mut clock = EventClock::new(0);
        clock.schedule("ambush", 10, EventPayload::default());
        assert!(clock.pop_due(9).is_none());
        assert_eq!(clock.len(), 1);
        assert_eq!(clock.pending()[0].name, "ambush");
    }

    #[test]
    fn test_past_event_never_moves_clock_back() {
        let mut clock = EventClock::new(100);
        clock.schedule("stale", 40, EventPayload::default());
        let event = clock.pop_due(100).unwrap();
        assert_eq!(event.at_min, 40);
        assert_eq!(clock.now(), 100);
        clock.advance_to(90);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn test_clock_label() {
        assert_eq!(clock_label(480), "08:00");
        assert_eq!(clock_label(24 * 60 + 75), "01:15");
    }
}
