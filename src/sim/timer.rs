//! Cancellable deferred tasks
//!
//! A scheduled task is addressed by a [`TimerToken`] carrying the slot's
//! generation, so a stale token can never cancel a newer task that reused
//! the slot. Tasks fire at most once.

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    generation: u32,
    remaining: f32,
    /// Scheduling sequence, breaks ties between tasks due on the same tick
    seq: u64,
    task: Option<T>,
}

/// Set of pending deferred tasks advanced by the simulation tick
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            next_seq: 0,
        }
    }

    /// Run `task` after `delay` seconds of advanced time
    pub fn schedule(&mut self, delay: f32, task: T) -> TimerToken {
        let seq = self.next_seq;
        self.next_seq += 1;
        let remaining = delay.max(0.0);

        if let Some(slot) = self.free.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.remaining = remaining;
            entry.seq = seq;
            entry.task = Some(task);
            return TimerToken {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            remaining,
            seq,
            task: Some(task),
        });
        TimerToken {
            slot,
            generation: 0,
        }
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        self.take(token).is_some()
    }

    /// Cancel a pending task and hand back its payload
    pub fn take(&mut self, token: TimerToken) -> Option<T> {
        let entry = self.entries.get_mut(token.slot as usize)?;
        if entry.generation != token.generation {
            return None;
        }
        let task = entry.task.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(token.slot);
        Some(task)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.entries
            .get(token.slot as usize)
            .is_some_and(|e| e.generation == token.generation && e.task.is_some())
    }

    /// Seconds left before the task fires
    pub fn remaining(&self, token: TimerToken) -> Option<f32> {
        if self.is_pending(token) {
            Some(self.entries[token.slot as usize].remaining)
        } else {
            None
        }
    }

    /// Number of pending tasks
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.task.is_some()).count()
    }

    /// Advance time and return the tasks that came due, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        let mut due: Vec<(f32, u64, u32)> = Vec::new();
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.task.is_none() {
                continue;
            }
            entry.remaining -= dt;
            if entry.remaining <= 0.0 {
                due.push((entry.remaining, entry.seq, slot as u32));
            }
        }

        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut fired = Vec::with_capacity(due.len());
        for (_, _, slot) in due {
            let entry = &mut self.entries[slot as usize];
            if let Some(task) = entry.task.take() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot);
                fired.push(task);
            }
        }
        fired
    }

    /// Drop every pending task without firing it
    pub fn cancel_all(&mut self) {
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.task.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_once_after_delay() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.schedule(1.0, "unload");

        assert!(scheduler.advance(0.5).is_empty());
        assert!(scheduler.is_pending(token));
        assert_eq!(scheduler.advance(0.5), vec!["unload"]);
        assert!(!scheduler.is_pending(token));
        assert!(scheduler.advance(10.0).is_empty());
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.schedule(0.5, 1);
        assert!(scheduler.cancel(token));
        assert!(!scheduler.cancel(token));
        assert!(scheduler.advance(1.0).is_empty());
    }

    #[test]
    fn test_stale_token_cannot_cancel_reused_slot() {
        let mut scheduler = Scheduler::new();
        let old = scheduler.schedule(0.1, 'a');
        assert_eq!(scheduler.advance(0.2), vec!['a']);

        let new = scheduler.schedule(1.0, 'b');
        assert!(!scheduler.cancel(old));
        assert!(scheduler.is_pending(new));
        assert_eq!(scheduler.advance(1.0), vec!['b']);
    }

    #[test]
    fn test_due_tasks_fire_earliest_first() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.3, "late");
        scheduler.schedule(0.1, "early");
        scheduler.schedule(0.1, "early-second");
        assert_eq!(scheduler.advance(1.0), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_cancel_all_clears_pending() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.schedule(0.5, ());
        scheduler.schedule(0.7, ());
        assert_eq!(scheduler.pending(), 2);

        scheduler.cancel_all();
        assert_eq!(scheduler.pending(), 0);
        assert!(!scheduler.is_pending(token));
        assert!(scheduler.advance(5.0).is_empty());
    }

    #[test]
    fn test_remaining_tracks_time() {
        let mut scheduler = Scheduler::new();
        let token = scheduler.schedule(2.0, ());
        let _ = scheduler.advance(0.5);
        let remaining = scheduler.remaining(token).unwrap();
        assert!((remaining - 1.5).abs() < 1e-6);
    }
}
