use std::{
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::speech::UnavailableBackendError;

/// Callback run on every tick of a schedule.
pub type Tick = Box<dyn FnMut() + Send + 'static>;

/// Timer is the service recurring announcements are scheduled with.
pub trait Timer: Send {
    /// Run `tick` every `every`, the first time after one full period has elapsed. The schedule
    /// lives until the returned handle is cancelled.
    fn schedule(
        &self,
        every: Duration,
        tick: Tick,
    ) -> Result<Box<dyn ScheduleHandle>, UnavailableBackendError>;
}

pub trait ScheduleHandle: Send {
    /// Stop the schedule. No tick starts after this returns. Cancelling twice is a no-op.
    fn cancel(&mut self);
}

/// ThreadTimer runs each schedule on its own thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTimer;

impl Timer for ThreadTimer {
    fn schedule(
        &self,
        every: Duration,
        mut tick: Tick,
    ) -> Result<Box<dyn ScheduleHandle>, UnavailableBackendError> {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("speaking-clock-timer".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + every;
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match cancel_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        // Cancelled, or the handle was dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    deadline += every;
                    // Skip the deadlines a slow tick made us miss
                    let now = Instant::now();
                    while deadline <= now {
                        deadline += every;
                    }
                }
            })
            .map_err(UnavailableBackendError::Timer)?;

        Ok(Box::new(ThreadSchedule {
            cancel: Some(cancel_tx),
            thread: Some(thread),
        }))
    }
}

struct ThreadSchedule {
    cancel: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ScheduleHandle for ThreadSchedule {
    fn cancel(&mut self) {
        drop(self.cancel.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("timer thread panicked");
            }
        }
    }
}

impl Drop for ThreadSchedule {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// ManualTimer never fires on its own. Time only moves when [ManualTimer::advance] is called,
/// which runs every tick that falls due, in order. Clones share the same virtual time.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    schedules: Vec<ManualSchedule>,
}

struct ManualSchedule {
    id: u64,
    every: Duration,
    due: Duration,
    tick: Tick,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    /// Number of schedules that haven't been cancelled.
    pub fn active_schedules(&self) -> usize {
        self.lock().schedules.len()
    }

    /// Move time forward by `by`, firing due ticks along the way. While a tick runs,
    /// [ManualTimer::elapsed] reads the instant it was due at.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let (id, mut tick) = {
                let mut state = self.lock();
                let next = state
                    .schedules
                    .iter_mut()
                    .filter(|schedule| schedule.due <= target)
                    .min_by_key(|schedule| (schedule.due, schedule.id));
                let Some(schedule) = next else {
                    break;
                };
                let due = schedule.due;
                schedule.due += schedule.every;
                let taken = (schedule.id, std::mem::replace(&mut schedule.tick, Box::new(|| {})));
                state.now = due;
                taken
            };

            // Unlocked, so the tick may use the timer
            tick();

            let mut state = self.lock();
            if let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == id) {
                schedule.tick = tick;
            }
        }
        self.lock().now = target;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for ManualTimer {
    fn schedule(
        &self,
        every: Duration,
        tick: Tick,
    ) -> Result<Box<dyn ScheduleHandle>, UnavailableBackendError> {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + every;
        state.schedules.push(ManualSchedule {
            id,
            every,
            due,
            tick,
        });
        Ok(Box::new(ManualHandle {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct ManualHandle {
    id: u64,
    state: Arc<Mutex<ManualState>>,
}

impl ScheduleHandle for ManualHandle {
    fn cancel(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.schedules.retain(|schedule| schedule.id != self.id);
    }
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
