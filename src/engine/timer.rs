//! Timer loop - Interval callbacks on a single-threaded clock.
//!
//! Intervals never run on another thread. The loop keeps a millisecond
//! clock; [`advance`] moves it forward and fires every timer that came due,
//! in due order. The real-time driver [`run`] sleeps until the next deadline
//! and advances the clock by the elapsed wall time, so production and tests
//! share one code path.
//!
//! # Pattern
//!
//! - `interval()` fires once immediately, then every `period_ms`
//! - Callbacks may add or cancel timers while running
//! - `cancel()` is idempotent
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::engine::timer;
//!
//! let id = timer::interval(250, || println!("tick"));
//! timer::advance(1000); // ticks at 250, 500, 750, 1000
//! timer::cancel(id);
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// Timer Queue
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    period_ms: u64,
    due_ms: u64,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    /// Earliest timer due at or before `deadline`. Ties go to the older timer.
    fn next_due(&self, deadline: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= deadline)
            .min_by_key(|(_, t)| (t.due_ms, t.id.0))
            .map(|(i, _)| i)
    }
}

thread_local! {
    static QUEUE: RefCell<TimerQueue> = RefCell::new(TimerQueue::default());
}

// =============================================================================
// Public API
// =============================================================================

/// Run `callback` now and then every `period_ms`.
///
/// Returns `None` for a zero period, which would never yield to the loop.
pub fn interval(period_ms: u64, callback: impl Fn() + 'static) -> Option<TimerId> {
    if period_ms == 0 {
        return None;
    }

    let callback: Rc<dyn Fn()> = Rc::new(callback);
    let id = QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let id = TimerId(queue.next_id);
        queue.next_id += 1;
        let due_ms = queue.now_ms + period_ms;
        queue.timers.push(Timer {
            id,
            period_ms,
            due_ms,
            callback: callback.clone(),
        });
        id
    });

    callback();
    Some(id)
}

/// Stop a timer. Unknown or already cancelled ids are ignored.
pub fn cancel(id: TimerId) {
    QUEUE.with(|queue| queue.borrow_mut().timers.retain(|t| t.id != id));
}

/// Whether the timer is still scheduled.
pub fn is_active(id: TimerId) -> bool {
    QUEUE.with(|queue| queue.borrow().timers.iter().any(|t| t.id == id))
}

/// Current loop time in milliseconds.
pub fn now() -> u64 {
    QUEUE.with(|queue| queue.borrow().now_ms)
}

/// Number of scheduled timers.
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().timers.len())
}

/// Milliseconds until the next timer is due, if any.
pub fn until_next() -> Option<u64> {
    QUEUE.with(|queue| {
        let queue = queue.borrow();
        queue
            .timers
            .iter()
            .map(|t| t.due_ms.saturating_sub(queue.now_ms))
            .min()
    })
}

/// Move the clock forward by `ms`, firing every timer that comes due.
///
/// Returns the number of callbacks that ran.
pub fn advance(ms: u64) -> usize {
    let deadline = now() + ms;
    let mut fired = 0;

    loop {
        // Pick and reschedule under the borrow, run the callback outside it.
        let callback = QUEUE.with(|queue| {
            let mut queue = queue.borrow_mut();
            let index = queue.next_due(deadline)?;
            let due = queue.timers[index].due_ms;
            queue.now_ms = due;
            let timer = &mut queue.timers[index];
            timer.due_ms += timer.period_ms;
            Some(timer.callback.clone())
        });

        let Some(callback) = callback else { break };
        callback();
        fired += 1;
    }

    QUEUE.with(|queue| queue.borrow_mut().now_ms = deadline);
    fired
}

/// Drive the loop in real time until `should_quit` returns true.
///
/// Sleeps until the next deadline (at most `max_sleep`), then advances the
/// clock to the wall time passed since the loop started. Sub-millisecond
/// remainders carry over to the next step instead of being dropped.
pub fn run(max_sleep: Duration, mut should_quit: impl FnMut() -> bool) {
    let start = Instant::now();
    let mut advanced: u64 = 0;
    while !should_quit() {
        let wait = until_next()
            .map(Duration::from_millis)
            .unwrap_or(max_sleep)
            .min(max_sleep);
        thread::sleep(wait);

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        advance(elapsed.saturating_sub(advanced));
        advanced = advanced.max(elapsed);
    }
}

/// Drop every timer and rewind the clock (for testing).
pub fn reset_timers() {
    QUEUE.with(|queue| *queue.borrow_mut() = TimerQueue::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() {
        reset_timers();
    }

    #[test]
    fn test_interval_fires_immediately_and_periodically() {
        setup();

        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        interval(250, move || t.set(t.get() + 1));
        assert_eq!(ticks.get(), 1);

        advance(1000);
        assert_eq!(ticks.get(), 5);
        assert_eq!(now(), 1000);
    }

    #[test]
    fn test_zero_period_is_rejected() {
        setup();

        assert!(interval(0, || {}).is_none());
        assert_eq!(pending(), 0);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        setup();

        let ticks = Rc::new(Cell::new(0));
        let t = ticks.clone();
        let id = interval(100, move || t.set(t.get() + 1)).unwrap();

        advance(250);
        assert_eq!(ticks.get(), 3);

        cancel(id);
        assert!(!is_active(id));
        advance(1000);
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        setup();

        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        interval(300, move || o.borrow_mut().push(("slow", now())));
        let o = order.clone();
        interval(200, move || o.borrow_mut().push(("fast", now())));
        order.borrow_mut().clear();

        advance(600);
        assert_eq!(
            *order.borrow(),
            vec![("fast", 200), ("slow", 300), ("fast", 400), ("slow", 600), ("fast", 600)]
        );
    }

    #[test]
    fn test_callback_can_cancel_itself() {
        setup();

        let ticks = Rc::new(Cell::new(0));
        let own_id: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let t = ticks.clone();
        let own = own_id.clone();
        let id = interval(100, move || {
            t.set(t.get() + 1);
            if t.get() == 2 {
                if let Some(id) = own.get() {
                    cancel(id);
                }
            }
        });
        own_id.set(id);

        advance(1000);
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn test_until_next() {
        setup();

        assert_eq!(until_next(), None);
        interval(500, || {});
        advance(200);
        assert_eq!(until_next(), Some(300));
    }

    #[test]
    fn test_run_tracks_wall_clock() {
        setup();

        let ticks = Rc::new(Cell::new(0u64));
        let t = ticks.clone();
        interval(1, move || t.set(t.get() + 1));

        let wall = Instant::now();
        run(Duration::from_millis(50), || wall.elapsed() >= Duration::from_millis(300));

        let wall_ms = wall.elapsed().as_millis() as u64;
        assert!(now() >= 290, "clock: {}", now());
        assert!(wall_ms - now() <= 5, "clock {} lags wall time {}", now(), wall_ms);
        assert_eq!(ticks.get(), now() + 1);
    }
}
