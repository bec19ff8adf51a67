//! Progress tracking
//!
//! Scrape units only ever increment a shared atomic counter. The
//! [`ProgressAggregator`] polls it from its own thread and hands every change
//! to a [`ProgressSink`].

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

/// Shared count of processed items
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter(Arc<AtomicUsize>);

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Percentage complete, clamped to 100. An empty run is complete.
pub fn percent(processed: usize, total: usize) -> u64 {
    if total == 0 {
        return 100;
    }
    (processed.min(total) * 100 / total) as u64
}

/// Receives progress updates
pub trait ProgressSink: Send {
    fn render(&mut self, percent: u64, processed: usize, total: usize);

    fn finish(&mut self) {}
}

/// Discards updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn render(&mut self, _percent: u64, _processed: usize, _total: usize) {}
}

/// Overwritable percentage bar on standard output
pub struct TerminalProgress {
    bar: ProgressBar,
    label: String,
}

impl TerminalProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
        let style = ProgressStyle::with_template("{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);

        Self {
            bar,
            label: label.to_string(),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn render(&mut self, percent: u64, processed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(processed as u64);
        self.bar.set_message(format!("{} {percent:>3}%", self.label));
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

/// Background poller rendering the counter until every item is processed
#[derive(Debug)]
pub struct ProgressAggregator {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ProgressAggregator {
    /// Start polling `counter` every `interval`
    pub fn spawn(counter: ProgressCounter, total: usize, interval: Duration, mut sink: Box<dyn ProgressSink>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut last = None;
            loop {
                // Read the flag first so the final count is always rendered
                let stopping = stop_flag.load(Ordering::Acquire);
                let processed = counter.get();
                if last != Some(processed) {
                    sink.render(percent(processed, total), processed, total);
                    last = Some(processed);
                }
                if processed >= total || stopping {
                    break;
                }
                thread::sleep(interval);
            }
            sink.finish();
        });

        Self { stop, handle }
    }

    /// Stop polling once the dispatcher is done and wait for the last render
    pub fn finish(self) {
        self.stop.store(true, Ordering::Release);
        if self.handle.join().is_err() {
            warn!("Progress reporter panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<u64>>>);

    impl ProgressSink for Recorder {
        fn render(&mut self, percent: u64, _processed: usize, _total: usize) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(percent);
            }
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(4, 4), 100);
        assert_eq!(percent(9, 4), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_counter_is_shared() {
        let counter = ProgressCounter::new();
        let clone = counter.clone();
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..250 {
                        clone.increment();
                    }
                });
            }
        });
        assert_eq!(counter.get(), 1000);
    }

    #[test]
    fn test_aggregator_ends_at_total() {
        let counter = ProgressCounter::new();
        let recorder = Recorder::default();
        let aggregator =
            ProgressAggregator::spawn(counter.clone(), 5, Duration::from_millis(1), Box::new(recorder.clone()));

        for _ in 0..5 {
            counter.increment();
            thread::sleep(Duration::from_millis(2));
        }
        aggregator.finish();

        let seen = recorder.0.lock().map(|seen| seen.clone()).unwrap_or_default();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_aggregator_stops_without_progress() {
        let aggregator = ProgressAggregator::spawn(
            ProgressCounter::new(),
            10,
            Duration::from_millis(1),
            Box::new(NullProgress),
        );
        aggregator.finish();
    }
}
