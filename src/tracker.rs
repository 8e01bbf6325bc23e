//! Event loop that owns a [`Session`].
//!
//! Commands from the [`TrackerHandle`], the 1 Hz session clock and the
//! location watch are all consumed by one task, so session state is only ever
//! touched from a single place. Observers read state through `watch` channels.

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::location::{LocationService, LocationUpdate, LocationWatch};
use crate::projector::{project, Frame};
use crate::session::{FinishedSession, FixOutcome, Session};
use crate::status::LiveStatus;
use crate::storage::ActivityStore;
use std::future::pending;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval};

/// Session clock period; every tick adds one second of elapsed time
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const COMMAND_CHANNEL_CAPACITY: usize = 16;

enum Command {
    Start(oneshot::Sender<TrackerResult<()>>),
    Stop(oneshot::Sender<Option<FinishedSession>>),
    Shutdown,
}

/// Client side of a running tracker
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<LiveStatus>,
    frame: watch::Receiver<Frame>,
}

impl TrackerHandle {
    /// Begin tracking. Ignored if a session is already running.
    pub async fn start(&self) -> TrackerResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx)).await?;
        rx.await.map_err(|_| TrackerError::TrackerClosed)?
    }

    /// Stop tracking; returns the finished session if one was running
    pub async fn stop(&self) -> TrackerResult<Option<FinishedSession>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(tx)).await?;
        rx.await.map_err(|_| TrackerError::TrackerClosed)
    }

    /// Stop any running session and end the tracker task
    pub async fn shutdown(&self) -> TrackerResult<()> {
        self.send(Command::Shutdown).await
    }

    pub fn status(&self) -> LiveStatus {
        self.status.borrow().clone()
    }

    pub fn frame(&self) -> Frame {
        self.frame.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LiveStatus> {
        self.status.clone()
    }

    pub fn subscribe_frame(&self) -> watch::Receiver<Frame> {
        self.frame.clone()
    }

    async fn send(&self, command: Command) -> TrackerResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TrackerError::TrackerClosed)
    }
}

/// Live resources of a tracking session. Both are `None` while the session is off.
#[derive(Default)]
struct Subscriptions {
    ticker: Option<Interval>,
    watch: Option<LocationWatch>,
}

impl Subscriptions {
    fn open(&mut self, watch: LocationWatch) {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);
        self.ticker = Some(ticker);
        self.watch = Some(watch);
    }

    /// Unregister the location watch and stop the clock
    fn cancel(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.clear();
        }
        self.ticker = None;
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn next_update(watch: &mut Option<LocationWatch>) -> Option<LocationUpdate> {
    match watch {
        Some(watch) => watch.recv().await,
        None => pending().await,
    }
}

pub struct Tracker<L: LocationService> {
    session: Session,
    location: L,
    store: Box<dyn ActivityStore>,
    config: TrackerConfig,
    status_tx: watch::Sender<LiveStatus>,
    frame_tx: watch::Sender<Frame>,
}

impl<L: LocationService> Tracker<L> {
    pub fn new(config: TrackerConfig, location: L, store: impl ActivityStore + 'static) -> Self {
        let session = Session::new(config.fix_lapse_secs, config.watch.timeout_secs());
        let (status_tx, _) = watch::channel(LiveStatus::capture(&session));
        let (frame_tx, _) = watch::channel(project(session.path(), &config.surface));

        Tracker {
            session,
            location,
            store: Box::new(store),
            config,
            status_tx,
            frame_tx,
        }
    }

    /// Run the tracker on its own task
    pub fn spawn(self) -> (TrackerHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = TrackerHandle {
            commands: commands_tx,
            status: self.status_tx.subscribe(),
            frame: self.frame_tx.subscribe(),
        };
        let task = tokio::spawn(self.run(commands_rx));
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut subs = Subscriptions::default();

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Start(reply)) => {
                        let result = self.handle_start(&mut subs);
                        let _ = reply.send(result);
                    }
                    Some(Command::Stop(reply)) => {
                        let finished = self.handle_stop(&mut subs);
                        let _ = reply.send(finished);
                    }
                    Some(Command::Shutdown) | None => {
                        self.handle_stop(&mut subs);
                        break;
                    }
                },

                _ = next_tick(&mut subs.ticker) => self.handle_tick(&mut subs),

                update = next_update(&mut subs.watch) => self.handle_update(update, &mut subs),
            }
        }

        log::info!("Tracker stopped");
    }

    fn handle_start(&mut self, subs: &mut Subscriptions) -> TrackerResult<()> {
        if self.session.is_tracking() {
            log::debug!("start ignored, already tracking");
            return Ok(());
        }

        // Register first: a host without location support leaves the session off
        let watch = self.location.watch_position(&self.config.watch)?;
        self.session.start();
        subs.open(watch);

        self.publish_status();
        self.publish_frame();
        Ok(())
    }

    fn handle_stop(&mut self, subs: &mut Subscriptions) -> Option<FinishedSession> {
        // No update or tick can be handled once the subscriptions are gone
        subs.cancel();

        let finished = self.session.stop(self.config.profile.body_weight_kg);
        if let Some(finished) = &finished {
            if let Err(e) = self
                .store
                .log_activity(&self.config.profile.user_id, &finished.summary)
            {
                log::warn!("Failed to persist activity summary: {}", e);
            }
        }

        self.publish_status();
        self.publish_frame();
        finished
    }

    fn handle_tick(&mut self, subs: &mut Subscriptions) {
        if self.session.on_tick().is_some() {
            subs.cancel();
        }
        self.publish_status();
    }

    fn handle_update(&mut self, update: Option<LocationUpdate>, subs: &mut Subscriptions) {
        match update {
            Some(LocationUpdate::Fix(fix)) => {
                if self.session.on_fix(&fix) == FixOutcome::Accepted {
                    self.publish_frame();
                }
            }
            Some(LocationUpdate::Error(fault)) => {
                if self.session.fail(fault) {
                    subs.cancel();
                }
            }
            None => {
                log::info!("Location stream ended");
                subs.watch = None;
            }
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(LiveStatus::capture(&self.session));
    }

    fn publish_frame(&self) {
        self.frame_tx
            .send_replace(project(self.session.path(), &self.config.surface));
    }
}
