use std::time::Duration;

pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// Sleeps the calling thread; on a runtime worker the sleep is moved off the
/// scheduler with `block_in_place`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::task::block_in_place(|| std::thread::sleep(duration));
        } else {
            std::thread::sleep(duration);
        }
    }
}

pub trait Clock {
    fn now_unix_seconds(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_seconds(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
