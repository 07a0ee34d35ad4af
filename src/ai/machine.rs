//! Finite state machine with interval tasks
//!
//! Drives per-entity behavior as a fixed enumerated state type plus a
//! dispatch table: each state owns an optional enter/exit handler and an
//! ordered list of tasks, every handler a plain `fn` over an explicit
//! context so behaviors stay unit-testable without a live engine.
//!
//! Task intervals are soft timers: a task accumulates frame time and fires
//! once the accumulator reaches its interval, then resets. An interval of
//! zero fires every tick.
//!
//! # Transition semantics
//!
//! A task signals a transition by returning `Some(next)`. The exit and
//! enter handlers run immediately, but the remaining tasks of the state
//! that was active when the tick started still execute. Same-tick
//! re-entrant transitions are therefore possible; task bodies must treat
//! missing context (a cleared target, a dead grid) as a normal branch.

use std::fmt;

/// A periodic action within one state.
///
/// The action receives the machine context and the time spent in the
/// current state, and may request a transition.
pub struct Task<S, C> {
    /// Seconds between firings; zero fires every tick
    pub interval: f32,
    /// Accumulated time since the last firing
    elapsed: f32,
    /// The action to run when due
    pub action: fn(&mut C, f32) -> Option<S>,
}

impl<S, C> Task<S, C> {
    /// Create a task firing every `interval` seconds
    #[must_use]
    pub fn new(interval: f32, action: fn(&mut C, f32) -> Option<S>) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            action,
        }
    }

    /// Create a task that fires on every tick
    #[must_use]
    pub fn every_tick(action: fn(&mut C, f32) -> Option<S>) -> Self {
        Self::new(0.0, action)
    }
}

/// One state's entry in the dispatch table
pub struct StateDef<S, C> {
    /// The state this entry defines
    pub state: S,
    /// Runs on entry; receives the previous state
    pub enter: Option<fn(&mut C, S)>,
    /// Runs on exit; receives the next state
    pub exit: Option<fn(&mut C, S)>,
    /// Tasks run while the state is active, in order
    pub tasks: Vec<Task<S, C>>,
}

impl<S, C> StateDef<S, C> {
    /// Create a state entry with no handlers or tasks
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state,
            enter: None,
            exit: None,
            tasks: Vec::new(),
        }
    }

    /// Set the enter handler
    #[must_use]
    pub fn on_enter(mut self, enter: fn(&mut C, S)) -> Self {
        self.enter = Some(enter);
        self
    }

    /// Set the exit handler
    #[must_use]
    pub fn on_exit(mut self, exit: fn(&mut C, S)) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Append a task
    #[must_use]
    pub fn with_task(mut self, task: Task<S, C>) -> Self {
        self.tasks.push(task);
        self
    }
}

/// A finite state machine over a fixed state enumeration.
///
/// Exactly one state is active at a time. Transitions are immediate value
/// assignments, never queued.
pub struct Machine<S, C> {
    table: Vec<StateDef<S, C>>,
    current: S,
    time_in_state: f32,
}

impl<S: Copy + PartialEq + fmt::Debug, C> Machine<S, C> {
    /// Create a machine starting in `initial`.
    ///
    /// Panics if `initial` has no entry in the table; a machine without its
    /// own state is a construction bug, not a runtime condition.
    #[must_use]
    pub fn new(initial: S, table: Vec<StateDef<S, C>>) -> Self {
        assert!(
            table.iter().any(|def| def.state == initial),
            "initial state {initial:?} missing from dispatch table"
        );
        Self {
            table,
            current: initial,
            time_in_state: 0.0,
        }
    }

    /// The active state
    #[must_use]
    pub fn current(&self) -> S {
        self.current
    }

    /// Seconds spent in the active state
    #[must_use]
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Advance all due tasks of the active state by `dt` seconds.
    ///
    /// Tasks belonging to the state that was active at tick start run to
    /// completion even if one of them transitions the machine.
    pub fn tick(&mut self, dt: f32, ctx: &mut C) {
        self.time_in_state += dt;
        let Some(active) = self.index_of(self.current) else {
            return;
        };
        for task_index in 0..self.table[active].tasks.len() {
            let due = {
                let task = &mut self.table[active].tasks[task_index];
                task.elapsed += dt;
                if task.elapsed >= task.interval {
                    task.elapsed = 0.0;
                    true
                } else {
                    false
                }
            };
            if !due {
                continue;
            }
            let action = self.table[active].tasks[task_index].action;
            if let Some(next) = action(ctx, self.time_in_state) {
                self.apply_transition(next, ctx);
            }
        }
    }

    /// Force a transition from outside the task list
    pub fn set_state(&mut self, next: S, ctx: &mut C) {
        if next != self.current {
            self.apply_transition(next, ctx);
        }
    }

    fn apply_transition(&mut self, next: S, ctx: &mut C) {
        let previous = self.current;
        if let Some(index) = self.index_of(previous) {
            if let Some(exit) = self.table[index].exit {
                exit(ctx, next);
            }
        }
        self.current = next;
        self.time_in_state = 0.0;
        if let Some(index) = self.index_of(next) {
            for task in &mut self.table[index].tasks {
                task.elapsed = 0.0;
            }
            if let Some(enter) = self.table[index].enter {
                enter(ctx, previous);
            }
        }
    }

    fn index_of(&self, state: S) -> Option<usize> {
        self.table.iter().position(|def| def.state == state)
    }
}

impl<S: Copy + fmt::Debug, C> fmt::Debug for Machine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("current", &self.current)
            .field("time_in_state", &self.time_in_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Rest,
        Hunt,
    }

    #[derive(Default)]
    struct Ctx {
        prey_visible: bool,
        enters: Vec<&'static str>,
        fired: u32,
        late_fired: u32,
    }

    fn seek(ctx: &mut Ctx, _time: f32) -> Option<Mode> {
        ctx.fired += 1;
        ctx.prey_visible.then_some(Mode::Hunt)
    }

    fn after_seek(ctx: &mut Ctx, _time: f32) -> Option<Mode> {
        ctx.late_fired += 1;
        None
    }

    fn note_hunt(ctx: &mut Ctx, _previous: Mode) {
        ctx.enters.push("hunt");
    }

    fn note_rest_exit(ctx: &mut Ctx, _next: Mode) {
        ctx.enters.push("rest-exit");
    }

    fn machine() -> Machine<Mode, Ctx> {
        Machine::new(
            Mode::Rest,
            vec![
                StateDef::new(Mode::Rest)
                    .on_exit(note_rest_exit)
                    .with_task(Task::new(1.0, seek))
                    .with_task(Task::every_tick(after_seek)),
                StateDef::new(Mode::Hunt).on_enter(note_hunt),
            ],
        )
    }

    #[test]
    fn test_interval_gates_firing() {
        let mut fsm = machine();
        let mut ctx = Ctx::default();
        fsm.tick(0.4, &mut ctx);
        fsm.tick(0.4, &mut ctx);
        assert_eq!(ctx.fired, 0);
        fsm.tick(0.4, &mut ctx);
        assert_eq!(ctx.fired, 1);
    }

    #[test]
    fn test_transition_runs_exit_then_enter() {
        let mut fsm = machine();
        let mut ctx = Ctx {
            prey_visible: true,
            ..Default::default()
        };
        fsm.tick(1.0, &mut ctx);
        assert_eq!(fsm.current(), Mode::Hunt);
        assert_eq!(ctx.enters, vec!["rest-exit", "hunt"]);
    }

    #[test]
    fn test_time_in_state_resets_on_transition() {
        let mut fsm = machine();
        let mut ctx = Ctx {
            prey_visible: true,
            ..Default::default()
        };
        fsm.tick(1.0, &mut ctx);
        assert!(fsm.time_in_state() < 1.0);
    }

    #[test]
    fn test_later_tasks_still_run_after_transition() {
        // The tick-start state's task list runs to completion even when an
        // earlier task transitions the machine.
        let mut fsm = machine();
        let mut ctx = Ctx {
            prey_visible: true,
            ..Default::default()
        };
        fsm.tick(1.0, &mut ctx);
        assert_eq!(fsm.current(), Mode::Hunt);
        assert_eq!(ctx.late_fired, 1);
    }

    #[test]
    fn test_forced_transition() {
        let mut fsm = machine();
        let mut ctx = Ctx::default();
        fsm.set_state(Mode::Hunt, &mut ctx);
        assert_eq!(fsm.current(), Mode::Hunt);
        assert_eq!(ctx.enters, vec!["rest-exit", "hunt"]);
    }

    #[test]
    fn test_task_accumulators_reset_on_entry() {
        let mut fsm = machine();
        let mut ctx = Ctx::default();
        fsm.tick(0.9, &mut ctx);
        fsm.set_state(Mode::Hunt, &mut ctx);
        fsm.set_state(Mode::Rest, &mut ctx);
        // The near-due accumulator was cleared on re-entry.
        fsm.tick(0.2, &mut ctx);
        assert_eq!(ctx.fired, 0);
    }
}
