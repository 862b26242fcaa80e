use std::fmt;

enum TimerCallback {
    Once(Option<Box<dyn FnOnce()>>),
    Every(Box<dyn FnMut()>),
}

struct TimerTask {
    due_ms: u64,
    interval_ms: Option<u64>,
    order: u64,
    callback: TimerCallback,
}

/// Millisecond clock driving delayed and repeating callbacks inside a tick.
#[derive(Default)]
pub struct Timer {
    now_ms: u64,
    next_order: u64,
    tasks: Vec<TimerTask>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("now_ms", &self.now_ms)
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl Timer {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn after(&mut self, delay_ms: u64, callback: impl FnOnce() + 'static) {
        self.schedule(
            delay_ms,
            None,
            TimerCallback::Once(Some(Box::new(callback))),
        );
    }

    pub fn every(&mut self, interval_ms: u64, callback: impl FnMut() + 'static) {
        self.schedule(
            interval_ms,
            Some(interval_ms),
            TimerCallback::Every(Box::new(callback)),
        );
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Moves the clock forward and runs every callback that came due, in due order.
    /// Repeating tasks fire at most once per call. Returns the number of callbacks run.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let now = self.now_ms;

        let (mut due, waiting): (Vec<TimerTask>, Vec<TimerTask>) = self
            .tasks
            .drain(..)
            .partition(|task| task.due_ms <= now);
        self.tasks = waiting;
        due.sort_by_key(|task| (task.due_ms, task.order));

        let fired = due.len();
        for mut task in due {
            match &mut task.callback {
                TimerCallback::Once(callback) => {
                    if let Some(callback) = callback.take() {
                        callback();
                    }
                }
                TimerCallback::Every(callback) => callback(),
            }
            if let Some(interval_ms) = task.interval_ms {
                task.due_ms = next_due(task.due_ms, interval_ms, now);
                self.tasks.push(task);
            }
        }
        fired
    }

    fn schedule(&mut self, delay_ms: u64, interval_ms: Option<u64>, callback: TimerCallback) {
        let order = self.next_order;
        self.next_order = self.next_order.saturating_add(1);
        self.tasks.push(TimerTask {
            due_ms: self.now_ms.saturating_add(delay_ms),
            interval_ms,
            order,
            callback,
        });
    }
}

fn next_due(previous_due_ms: u64, interval_ms: u64, now_ms: u64) -> u64 {
    if interval_ms == 0 {
        return now_ms.saturating_add(1);
    }
    let mut due = previous_due_ms.saturating_add(interval_ms);
    if due <= now_ms {
        // Skip missed periods instead of replaying them.
        let missed = (now_ms - due) / interval_ms + 1;
        due = due.saturating_add(missed.saturating_mul(interval_ms));
    }
    due
}
