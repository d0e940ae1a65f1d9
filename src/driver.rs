//! # Run Driver
//!
//! Single-task event loop that owns a [`RunSession`] and serializes the
//! three inputs it reacts to: user commands, the geolocation stream and
//! the one-second timer. Every resulting [`RunEvent`] goes to an
//! [`EventSink`].
//!
//! - The timer is only polled while the run is `Running`, and restarts
//!   from zero on start and resume. Ticks that came due while idle or
//!   paused are discarded, so a paused run never accumulates time.
//! - Geolocation errors arrive as items of the stream and become advisory
//!   events. A closed location stream ends location input only; the run
//!   keeps ticking until it is ended.
//! - Closing the command channel (or sending [`RunCommand::Shutdown`])
//!   stops the loop and returns the session and sink to the caller.
//!
//! The tick source is injectable: [`IntervalTicker`] is a real tokio
//! interval, [`ChannelTicker`] steps on demand for deterministic tests.

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::course::Course;
use crate::error::RunError;
use crate::location::LocationUpdate;
use crate::session::{RunEvent, RunSession, RunStatus};

/// Buffer size for the command channel.
const COMMAND_BUFFER: usize = 32;
/// Buffer size for the location channel.
const LOCATION_BUFFER: usize = 64;

/// User actions forwarded to the session.
#[derive(Debug, Clone)]
pub enum RunCommand {
    Start(Course),
    Pause,
    Resume,
    TogglePause,
    DismissArrival,
    End,
    Shutdown,
}

/// Receiver of everything the UI should react to.
pub trait EventSink: Send {
    fn on_event(&mut self, event: RunEvent);

    /// Usage errors from commands (ending an idle run, rejected restart).
    fn on_error(&mut self, err: RunError) {
        warn!("[RunDriver] Command failed: {}", err);
    }
}

impl EventSink for Vec<RunEvent> {
    fn on_event(&mut self, event: RunEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::UnboundedSender<RunEvent> {
    fn on_event(&mut self, event: RunEvent) {
        if self.send(event).is_err() {
            debug!("[RunDriver] Event receiver dropped");
        }
    }
}

/// Source of one-second ticks.
pub trait TickSource: Send {
    /// Resolves at the next tick; `false` once the source has ended.
    fn next_tick(&mut self) -> impl Future<Output = bool> + Send;

    /// Restart the period from now. Ticks already due are discarded.
    fn reset(&mut self) {}
}

/// Wall-clock ticker backed by a tokio interval.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        // First tick one full period from now, not immediately
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicker {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// Ticker driven by explicit sends, for tests and simulations.
#[derive(Debug)]
pub struct ChannelTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ChannelTicker {
    /// Returns the ticker and the sender that steps it.
    pub fn new() -> (Self, mpsc::UnboundedSender<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

impl TickSource for ChannelTicker {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Drop ticks sent while the clock was stopped.
    fn reset(&mut self) {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("[RunDriver] Discarded {} stale ticks", dropped);
        }
    }
}

/// Cloneable handle for feeding a running [`RunDriver`].
#[derive(Debug, Clone)]
pub struct RunDriverHandle {
    commands: mpsc::Sender<RunCommand>,
    locations: mpsc::Sender<LocationUpdate>,
}

impl RunDriverHandle {
    /// Send a command. Returns `false` if the driver has stopped.
    pub async fn send(&self, command: RunCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Forward a location update. Returns `false` if the driver has stopped.
    pub async fn send_location(&self, update: LocationUpdate) -> bool {
        self.locations.send(update).await.is_ok()
    }

    /// Forward a location update from a synchronous callback. A full buffer
    /// drops the update, which the session treats as a skipped cycle.
    pub fn try_send_location(&self, update: LocationUpdate) -> bool {
        match self.locations.try_send(update) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("[RunDriver] Location buffer full, dropping update");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Ask the driver to stop after the commands already queued.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(RunCommand::Shutdown).await;
    }
}

/// Event loop owning a run session.
pub struct RunDriver<T: TickSource, S: EventSink> {
    session: RunSession,
    ticker: T,
    sink: S,
    commands: mpsc::Receiver<RunCommand>,
    locations: mpsc::Receiver<LocationUpdate>,
}

impl<T: TickSource, S: EventSink> RunDriver<T, S> {
    pub fn new(session: RunSession, ticker: T, sink: S) -> (Self, RunDriverHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (location_tx, location_rx) = mpsc::channel(LOCATION_BUFFER);

        let driver = Self {
            session,
            ticker,
            sink,
            commands: command_rx,
            locations: location_rx,
        };
        let handle = RunDriverHandle {
            commands: command_tx,
            locations: location_tx,
        };
        (driver, handle)
    }

    /// Run until shutdown. Returns the session and sink.
    pub async fn run(self) -> (RunSession, S) {
        let RunDriver {
            mut session,
            mut ticker,
            mut sink,
            mut commands,
            mut locations,
        } = self;

        let mut locations_open = true;
        let mut ticks_open = true;
        info!("[RunDriver] Started");

        loop {
            let running = session.status() == RunStatus::Running;

            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        info!("[RunDriver] Command channel closed");
                        break;
                    };
                    if matches!(command, RunCommand::Shutdown) {
                        break;
                    }
                    handle_command(&mut session, &mut ticker, &mut sink, command);
                }

                update = locations.recv(), if locations_open => {
                    match update {
                        Some(update) => {
                            for event in session.apply_update(update) {
                                sink.on_event(event);
                            }
                        }
                        None => {
                            info!("[RunDriver] Location stream closed");
                            locations_open = false;
                        }
                    }
                }

                alive = ticker.next_tick(), if running && ticks_open => {
                    if alive {
                        session.tick();
                    } else {
                        warn!("[RunDriver] Tick source ended");
                        ticks_open = false;
                    }
                }
            }
        }

        info!("[RunDriver] Stopped");
        (session, sink)
    }
}

fn handle_command<T: TickSource, S: EventSink>(
    session: &mut RunSession,
    ticker: &mut T,
    sink: &mut S,
    command: RunCommand,
) {
    debug!("[RunDriver] Command {:?}", command_name(&command));

    let was_running = session.status() == RunStatus::Running;
    let events = match command {
        RunCommand::Start(course) => match session.start(course) {
            Ok(events) => events,
            Err(err) => {
                sink.on_error(err);
                return;
            }
        },
        RunCommand::Pause => session.pause(),
        RunCommand::Resume => session.resume(),
        RunCommand::TogglePause => session.toggle_pause(),
        RunCommand::DismissArrival => match session.dismiss_arrival() {
            Some(point) => vec![RunEvent::ArrivalCleared { point }],
            None => Vec::new(),
        },
        RunCommand::End => match session.end() {
            Ok(summary) => vec![RunEvent::Ended { summary }],
            Err(err) => {
                sink.on_error(err);
                return;
            }
        },
        RunCommand::Shutdown => Vec::new(),
    };

    // Fresh one-second period whenever the clock (re)starts
    let now_running = session.status() == RunStatus::Running;
    if now_running && (!was_running || events.iter().any(|e| matches!(e, RunEvent::Started { .. }))) {
        ticker.reset();
    }

    for event in events {
        sink.on_event(event);
    }
}

fn command_name(command: &RunCommand) -> &'static str {
    match command {
        RunCommand::Start(_) => "start",
        RunCommand::Pause => "pause",
        RunCommand::Resume => "resume",
        RunCommand::TogglePause => "toggle_pause",
        RunCommand::DismissArrival => "dismiss_arrival",
        RunCommand::End => "end",
        RunCommand::Shutdown => "shutdown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationError, LocationSample};
    use crate::{GeoPoint, RunSummary};

    fn course() -> Course {
        Course::new(
            "Harbor",
            vec![GeoPoint::new(33.540, 126.560), GeoPoint::new(33.550, 126.560)],
            vec![],
        )
        .unwrap()
    }

    fn ended_summary(events: &[RunEvent]) -> Option<&RunSummary> {
        events.iter().find_map(|e| match e {
            RunEvent::Ended { summary } => Some(summary),
            _ => None,
        })
    }

    /// Wait for the first event matching `pred`, skipping others.
    async fn wait_for(
        rx: &mut mpsc::UnboundedReceiver<RunEvent>,
        pred: impl Fn(&RunEvent) -> bool,
    ) -> RunEvent {
        loop {
            let event = rx.recv().await.expect("driver stopped");
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_channel_ticks_and_locations() {
        let (ticker, tick_tx) = ChannelTicker::new();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (driver, handle) = RunDriver::new(RunSession::default(), ticker, event_tx);

        let script = async {
            assert!(handle.send(RunCommand::Start(course())).await);
            wait_for(&mut event_rx, |e| matches!(e, RunEvent::Started { .. })).await;

            for _ in 0..3 {
                tick_tx.send(()).unwrap();
            }
            handle.send_location(Ok(LocationSample::new(33.540, 126.560))).await;
            handle.send_location(Ok(LocationSample::new(33.5409, 126.560))).await;
            wait_for(&mut event_rx, |e| matches!(e, RunEvent::DistanceUpdated { .. })).await;

            handle.send(RunCommand::End).await;
            let ended = wait_for(&mut event_rx, |e| matches!(e, RunEvent::Ended { .. })).await;
            handle.shutdown().await;
            ended
        };

        let ((session, _), ended) = tokio::join!(driver.run(), script);

        assert_eq!(session.status(), RunStatus::Idle);
        let RunEvent::Ended { summary } = ended else {
            panic!("expected an ended event");
        };
        assert!((summary.total_distance_km - 0.1).abs() < 0.001);
        assert_eq!(summary.recorded_path.len(), 2);
        assert_eq!(summary.elapsed_seconds, 3);
    }

    #[tokio::test]
    async fn test_ticks_sent_while_paused_are_not_counted() {
        let (ticker, tick_tx) = ChannelTicker::new();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (driver, handle) = RunDriver::new(RunSession::default(), ticker, event_tx);

        let script = async {
            // Ticks before the run starts do not count either
            tick_tx.send(()).unwrap();
            handle.send(RunCommand::Start(course())).await;
            wait_for(&mut event_rx, |e| matches!(e, RunEvent::Started { .. })).await;

            handle.send(RunCommand::Pause).await;
            wait_for(&mut event_rx, |e| *e == RunEvent::Paused).await;
            for _ in 0..3 {
                tick_tx.send(()).unwrap();
            }

            handle.send(RunCommand::Resume).await;
            wait_for(&mut event_rx, |e| *e == RunEvent::Resumed).await;
            handle.send(RunCommand::End).await;
            let ended = wait_for(&mut event_rx, |e| matches!(e, RunEvent::Ended { .. })).await;
            handle.shutdown().await;
            ended
        };

        let (_, ended) = tokio::join!(driver.run(), script);

        let RunEvent::Ended { summary } = ended else {
            panic!("expected an ended event");
        };
        assert_eq!(summary.elapsed_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_pause_freezes_elapsed() {
        let (driver, handle) =
            RunDriver::new(RunSession::default(), IntervalTicker::every_second(), Vec::new());

        let script = async {
            handle.send(RunCommand::Start(course())).await;
            time::sleep(Duration::from_millis(5_500)).await;
            handle.send(RunCommand::Pause).await;
            time::sleep(Duration::from_secs(3)).await;
            handle.send(RunCommand::End).await;
            handle.shutdown().await;
        };

        let ((_, events), ()) = tokio::join!(driver.run(), script);

        assert!(events.contains(&RunEvent::Paused));
        let summary = ended_summary(&events).unwrap();
        assert_eq!(summary.elapsed_seconds, 5);
    }

    #[tokio::test]
    async fn test_location_errors_do_not_stop_run() {
        let (ticker, _tick_tx) = ChannelTicker::new();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (driver, handle) = RunDriver::new(RunSession::default(), ticker, event_tx);

        let script = async {
            handle.send(RunCommand::Start(course())).await;
            handle.send_location(Err(LocationError::PermissionDenied)).await;
            assert!(handle.try_send_location(Ok(LocationSample::new(33.540, 126.560))));
            let event = wait_for(&mut event_rx, |e| {
                matches!(e, RunEvent::LocationUnavailable { .. })
            })
            .await;
            handle.shutdown().await;
            event
        };

        let ((session, _), event) = tokio::join!(driver.run(), script);

        assert_eq!(
            event,
            RunEvent::LocationUnavailable {
                reason: LocationError::PermissionDenied.to_string()
            }
        );
        assert_eq!(session.status(), RunStatus::Running);
    }

    #[tokio::test]
    async fn test_end_without_start_reports_error() {
        #[derive(Default)]
        struct Recorder {
            errors: Vec<RunError>,
        }
        impl EventSink for Recorder {
            fn on_event(&mut self, _event: RunEvent) {}
            fn on_error(&mut self, err: RunError) {
                self.errors.push(err);
            }
        }

        let (ticker, _tick_tx) = ChannelTicker::new();
        let (driver, handle) = RunDriver::new(RunSession::default(), ticker, Recorder::default());

        let script = async {
            handle.send(RunCommand::End).await;
            handle.shutdown().await;
        };

        let ((_, recorder), ()) = tokio::join!(driver.run(), script);
        assert_eq!(recorder.errors.len(), 1);
        assert!(matches!(recorder.errors[0], RunError::NoActiveRun { .. }));
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_driver() {
        let (ticker, _tick_tx) = ChannelTicker::new();
        let (driver, handle) = RunDriver::new(RunSession::default(), ticker, Vec::new());
        drop(handle);
        let (session, events) = driver.run().await;
        assert_eq!(session.status(), RunStatus::Idle);
        assert!(events.is_empty());
    }
}
