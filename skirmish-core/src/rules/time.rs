//! Scheduling events and advancing the world clock.

use super::{Effect, Resolution};
use crate::clock::{clock_label, EventPayload, ScheduledEvent};
use crate::dispatch::ToolResult;
use crate::error::EngineError;
use crate::world::{World, WorldState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub name: String,
    pub at_min: u32,
    pub seq: u64,
    pub now: u32,
}

/// Report of one event fired during a time advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredEvent {
    pub name: String,
    pub at_min: u32,
    pub seq: u64,
    /// Results of the payload commands, in order.
    pub results: Vec<ToolResult>,
    /// Lines returned by the registered handler.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub from: u32,
    pub to: u32,
    pub fired: Vec<FiredEvent>,
}

pub fn resolve_schedule_event(
    state: &WorldState,
    name: &str,
    at_min: u32,
    payload: EventPayload,
) -> Result<Resolution<ScheduleOutcome>, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidArgument(
            "event name must not be empty".to_string(),
        ));
    }
    let seq = state.clock.next_seq();
    let now = state.clock.now();
    let line = if at_min <= now {
        format!("{name} is due now ({}).", clock_label(now))
    } else {
        format!("{name} is scheduled for {}.", clock_label(at_min))
    };
    Ok(Resolution::new(ScheduleOutcome {
        name: name.to_string(),
        at_min,
        seq,
        now,
    })
    .with_effect(Effect::EventScheduled {
        name: name.to_string(),
        at_min,
        seq,
        payload,
    })
    .narrate(line))
}

impl World {
    /// Queue an event at absolute minute `at_min`.
    pub fn schedule_event(
        &mut self,
        name: &str,
        at_min: u32,
        payload: EventPayload,
    ) -> Result<Resolution<ScheduleOutcome>, EngineError> {
        let resolution = resolve_schedule_event(&self.state, name, at_min, payload)?;
        debug!(name, at_min, seq = resolution.outcome.seq, "event scheduled");
        Ok(self.commit(resolution))
    }

    /// Move the clock forward `minutes`, firing every event that falls due.
    ///
    /// Events scheduled while firing are fired too if they are due before the
    /// target. If more than `rules.max_events_per_advance` events fire, the
    /// state is rolled back to before the call and the advance fails.
    pub fn advance_time(&mut self, minutes: u32) -> Result<Resolution<AdvanceOutcome>, EngineError> {
        if self.advancing {
            return Err(EngineError::InvalidArgument(
                "advance_time cannot be called while events are firing".to_string(),
            ));
        }

        let from = self.state.clock.now();
        let target = from.saturating_add(minutes);
        let limit = self.state.rules.max_events_per_advance;
        let saved = self.state.clone();

        self.advancing = true;
        let fired = self.fire_due(target, limit);
        self.advancing = false;

        let fired = match fired {
            Ok(fired) => fired,
            Err(err) => {
                warn!(limit, from, target, "event budget exceeded, restoring state");
                self.state = saved;
                return Err(err);
            }
        };
        self.state.clock.advance_to(target);

        let mut narrative: Vec<String> = fired
            .iter()
            .map(|event| format!("{}: {}", clock_label(event.at_min), event.name))
            .collect();
        for event in &fired {
            narrative.extend(event.results.iter().flat_map(|r| r.text_blocks.iter().cloned()));
            narrative.extend(event.notes.iter().cloned());
        }
        narrative.push(format!("The time is now {}.", clock_label(target)));

        debug!(from, to = target, fired = fired.len(), "time advanced");
        Ok(Resolution {
            outcome: AdvanceOutcome {
                from,
                to: target,
                fired,
            },
            effects: Vec::new(),
            narrative,
        })
    }

    fn fire_due(&mut self, target: u32, limit: usize) -> Result<Vec<FiredEvent>, EngineError> {
        let mut fired = Vec::new();
        while let Some(event) = self.state.clock.pop_due(target) {
            if fired.len() >= limit {
                return Err(EngineError::EventBudgetExceeded { limit });
            }
            info!(event = %event.name, at_min = event.at_min, seq = event.seq, "event fired");
            fired.push(self.fire(event));
        }
        Ok(fired)
    }

    fn fire(&mut self, event: ScheduledEvent) -> FiredEvent {
        let mut results = Vec::with_capacity(event.payload.commands.len());
        for command in event.payload.commands.iter().cloned() {
            results.push(self.execute(command));
        }

        let notes = match self.handlers.get(&event.name).cloned() {
            Some(handler) => match handler.handle(self, &event) {
                Ok(notes) => notes,
                Err(err) => {
                    warn!(event = %event.name, error = %err, "event handler failed");
                    vec![format!("{} handler failed: {err}", event.name)]
                }
            },
            None => Vec::new(),
        };

        FiredEvent {
            name: event.name,
            at_min: event.at_min,
            seq: event.seq,
            results,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActorConfig, RulesConfig, WorldConfig};
    use crate::dispatch::{AddMarkArgs, AdjustTensionArgs, Command};

    fn dawn(max_events: usize) -> World {
        let rules = RulesConfig {
            start_time_min: 0,
            max_events_per_advance: max_events,
            ..RulesConfig::default()
        };
        let config = WorldConfig::new()
            .with_actor(ActorConfig::new("Amiya", 12, 13).at(0, 0))
            .with_rules(rules);
        World::new(config).unwrap()
    }

    #[test]
    fn test_event_fires_at_its_own_time() {
        let mut world = dawn(16);
        world.on_event("ambush", |world: &mut World, event: &ScheduledEvent| {
            Ok(vec![format!("ambush at {} (clock {})", event.at_min, world.now())])
        });
        world.schedule_event("ambush", 10, EventPayload::default()).unwrap();

        let result = world.advance_time(15).unwrap();
        assert_eq!(result.outcome.fired.len(), 1);
        assert_eq!(result.outcome.fired[0].notes, vec!["ambush at 10 (clock 10)".to_string()]);
        assert_eq!(world.now(), 15);
    }

    #[test]
    fn test_events_fire_in_time_then_schedule_order() {
        let mut world = dawn(16);
        world.schedule_event("late", 12, EventPayload::default()).unwrap();
        world.schedule_event("first", 5, EventPayload::default()).unwrap();
        world.schedule_event("second", 5, EventPayload::default()).unwrap();
        world.schedule_event("tomorrow", 100, EventPayload::default()).unwrap();

        let result = world.advance_time(20).unwrap();
        let names: Vec<&str> = result.outcome.fired.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "late"]);
        assert_eq!(world.state().clock().len(), 1);
    }

    #[test]
    fn test_payload_commands_run_and_failures_are_reported() {
        let mut world = dawn(16);
        let payload = EventPayload::default()
            .with_command(Command::AdjustTension(AdjustTensionArgs { delta: 2 }))
            .with_command(Command::AddMark(AddMarkArgs { text: String::new() }));
        world.schedule_event("storm", 3, payload).unwrap();

        let result = world.advance_time(5).unwrap();
        let fired = &result.outcome.fired[0];
        assert!(fired.results[0].ok);
        assert!(!fired.results[1].ok);
        assert_eq!(fired.results[1].error_reason.as_deref(), Some("InvalidArgument"));
        assert_eq!(world.state().mood().tension, 3);
    }

    #[test]
    fn test_handler_can_schedule_follow_up() {
        let mut world = dawn(16);
        world.on_event("alarm", |world: &mut World, event: &ScheduledEvent| {
            world.schedule_event("guards", event.at_min + 2, EventPayload::default())?;
            Ok(Vec::new())
        });
        world.schedule_event("alarm", 4, EventPayload::default()).unwrap();

        let result = world.advance_time(10).unwrap();
        let times: Vec<u32> = result.outcome.fired.iter().map(|e| e.at_min).collect();
        assert_eq!(times, vec![4, 6]);
    }

    #[test]
    fn test_runaway_handler_restores_state() {
        let mut world = dawn(8);
        world.on_event("echo", |world: &mut World, event: &ScheduledEvent| {
            world.adjust_tension(1);
            world.schedule_event("echo", event.at_min, EventPayload::default())?;
            Ok(Vec::new())
        });
        world.schedule_event("echo", 1, EventPayload::default()).unwrap();

        let err = world.advance_time(5).unwrap_err();
        assert_eq!(err, EngineError::EventBudgetExceeded { limit: 8 });
        assert_eq!(world.now(), 0);
        assert_eq!(world.state().mood().tension, 1);
        assert_eq!(world.state().clock().len(), 1);
    }

    #[test]
    fn test_nested_advance_rejected() {
        let mut world = dawn(16);
        world.on_event("nap", |world: &mut World, _event: &ScheduledEvent| {
            world.advance_time(60)?;
            Ok(Vec::new())
        });
        world.schedule_event("nap", 1, EventPayload::default()).unwrap();

        let result = world.advance_time(2).unwrap();
        assert!(result.outcome.fired[0].notes[0].contains("handler failed"));
        assert_eq!(world.now(), 2);
    }

    #[test]
    fn test_past_event_fires_without_rewinding() {
        let mut world = dawn(16);
        world.advance_time(30).unwrap();
        world.schedule_event("late news", 10, EventPayload::default()).unwrap();
        let result = world.advance_time(0).unwrap();
        assert_eq!(result.outcome.fired.len(), 1);
        assert_eq!(world.now(), 30);
    }
}
