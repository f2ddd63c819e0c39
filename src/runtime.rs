use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::TICKS_PER_SECOND;

/// Unified event type consumed by the host loop
#[derive(Clone, Debug)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize,
}

/// Where key presses and resizes come from
pub trait TermEventSource: Send + 'static {
    /// Wait at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TermEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<TermEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(TermEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(TermEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TermEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TermEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Frame length provider
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The game cadence: 60 ticks per second
    pub fn game_rate() -> Self {
        Self::new(Duration::from_secs(1) / TICKS_PER_SECOND)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for driving the loop without a terminal
pub struct TestEventSource {
    rx: Receiver<TermEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TermEvent>) -> Self {
        Self { rx }
    }
}

impl TermEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TermEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Paces the host loop: one call per frame, returning every event that arrived
/// during the frame in arrival order.
pub struct Runner<E: TermEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TermEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks until the end of the current frame and returns the events it collected.
    pub fn next_frame(&self) -> Vec<TermEvent> {
        let deadline = Instant::now() + self.ticker.interval();
        let mut batch = Vec::new();

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.event_source.recv_timeout(deadline - now) {
                Ok(ev) => batch.push(ev),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    break;
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn empty_frame_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        assert!(runner.next_frame().is_empty());
    }

    #[test]
    fn frame_collects_pending_events_in_order() {
        let (tx, rx) = mpsc::channel();
        for c in ['a', 'b'] {
            tx.send(TermEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
                .unwrap();
        }
        tx.send(TermEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

        let frame = runner.next_frame();

        assert_eq!(frame.len(), 3);
        assert!(matches!(&frame[0], TermEvent::Key(k) if k.code == KeyCode::Char('a')));
        assert!(matches!(&frame[1], TermEvent::Key(k) if k.code == KeyCode::Char('b')));
        assert!(matches!(frame[2], TermEvent::Resize));
    }

    #[test]
    fn disconnected_source_still_paces() {
        let (tx, rx) = mpsc::channel::<TermEvent>();
        drop(tx);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let started = Instant::now();
        assert!(runner.next_frame().is_empty());
        assert!(started.elapsed() >= Duration::from_millis(4));
    }

    #[test]
    fn game_rate_is_sixty_hertz() {
        assert_eq!(FixedTicker::game_rate().interval(), Duration::from_nanos(16_666_666));
    }
}
