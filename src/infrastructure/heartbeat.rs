use crate::messaging::{ConnectionEvent, EventSender};
use crate::types::constants::{ACK_TIMEOUT, PROBE_INTERVAL, TICK_INTERVAL};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Timing parameters of the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// How often the timer evaluates the clock.
    pub tick_interval: Duration,
    /// Minimum time between two probes.
    pub probe_interval: Duration,
    /// How long a probe may stay unacknowledged.
    pub ack_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TICK_INTERVAL),
            probe_interval: Duration::from_millis(PROBE_INTERVAL),
            ack_timeout: Duration::from_millis(ACK_TIMEOUT),
        }
    }
}

/// Outcome of one timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing to do
    Idle,
    /// A probe is due and must be sent now
    SendProbe,
    /// The last probe went unacknowledged past the grace period
    Timeout,
}

/// Last probe sent / last acknowledgment received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatClock {
    pub last_probe_sent: Instant,
    pub last_ack_received: Instant,
}

impl HeartbeatClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last_probe_sent: now,
            last_ack_received: now,
        }
    }

    pub fn probe_sent(&mut self, now: Instant) {
        self.last_probe_sent = now;
    }

    pub fn ack_received(&mut self, now: Instant) {
        self.last_ack_received = now;
    }

    /// Decides what a tick at `now` has to do.
    ///
    /// A probe is due once more than `probe_interval` has passed since the
    /// previous one; a due probe short-circuits the timeout check. Otherwise
    /// the connection is declared lost when the last probe was sent after the
    /// last acknowledgment and at least `ack_timeout` has elapsed since that
    /// probe went out. An acknowledgment older than the probe never vouches
    /// for it, however close it arrived.
    pub fn evaluate(&self, now: Instant, config: &HeartbeatConfig) -> TickAction {
        let since_probe = now.saturating_duration_since(self.last_probe_sent);
        if since_probe > config.probe_interval {
            return TickAction::SendProbe;
        }

        let unacknowledged = self.last_probe_sent > self.last_ack_received;
        if unacknowledged && since_probe >= config.ack_timeout {
            TickAction::Timeout
        } else {
            TickAction::Idle
        }
    }
}

/// Periodic heartbeat scheduler.
///
/// While running, a background task posts [`ConnectionEvent::Tick`] into the
/// event loop every `tick_interval`; the loop then calls [`tick`](Self::tick)
/// and acts on the returned [`TickAction`]. The clock itself is only touched
/// from the event loop.
pub struct HeartbeatTimer {
    config: HeartbeatConfig,
    clock: HeartbeatClock,
    ticker: Option<JoinHandle<()>>,
    events: EventSender,
}

impl HeartbeatTimer {
    pub fn new(config: HeartbeatConfig, events: EventSender) -> Self {
        Self {
            config,
            clock: HeartbeatClock::new(Instant::now()),
            ticker: None,
            events,
        }
    }

    pub fn clock(&self) -> &HeartbeatClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut HeartbeatClock {
        &mut self.clock
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Sets both timestamps to `now`
    pub fn reset(&mut self, now: Instant) {
        self.clock = HeartbeatClock::new(now);
    }

    /// Starts ticking, restarting if already running.
    pub fn start(&mut self) {
        if self.is_running() {
            self.stop();
        }

        let events = self.events.clone();
        let period = self.config.tick_interval;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval_timer = time::interval_at(Instant::now() + period, period);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;

                if events.send(ConnectionEvent::Tick).is_err() {
                    // Event loop dropped, exit heartbeat task
                    break;
                }
            }
        }));

        tracing::info!(
            "Heartbeat timer started (tick every {}ms)",
            period.as_millis()
        );
    }

    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            tracing::debug!("Heartbeat timer stopped");
        }
    }

    /// Evaluates the clock for a tick at `now`.
    ///
    /// Records the probe as sent when one is due. Ticks that arrive after
    /// [`stop`](Self::stop) are ignored.
    pub fn tick(&mut self, now: Instant) -> TickAction {
        if !self.is_running() {
            return TickAction::Idle;
        }

        let action = self.clock.evaluate(now, &self.config);
        if action == TickAction::SendProbe {
            self.clock.probe_sent(now);
        }
        action
    }

    pub fn ack_received(&mut self, now: Instant) {
        self.clock.ack_received(now);
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
