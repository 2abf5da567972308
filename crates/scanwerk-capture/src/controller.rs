// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session controller — a Tokio task that owns the capture state machine and
// drives it from UI commands, blocking-pool results, and the review timer.
//
// The UI talks to it through a `SessionHandle`: commands go over an mpsc
// channel and are answered on oneshots, state changes are
// published on a watch channel. Still capture and perspective correction run
// on `spawn_blocking`; their results come back on oneshots and are matched
// against the current capture ticket, so anything that lands after a cancel
// is simply dropped.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use scanwerk_bridge::{SessionSink, StillCapture};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{CapturedImage, Page, ScanConfig, ScanMode, SessionState};
use scanwerk_document::Rectifier;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, instrument, warn};

use crate::machine::{CaptureTicket, RectifyJob, ScanSession, ShutterOutcome, Step};
use crate::pipeline::FramePipeline;

/// Depth of the command queue between the UI and the controller task.
const COMMAND_QUEUE_DEPTH: usize = 16;

/// The host-side pieces a session needs.
#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn StillCapture>,
    pub rectifier: Arc<dyn Rectifier>,
    pub sink: Arc<dyn SessionSink>,
    pub pipeline: Arc<FramePipeline>,
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub page_count: usize,
    pub rescan: bool,
}

enum Command {
    Shutter(oneshot::Sender<bool>),
    Complete(oneshot::Sender<Result<()>>),
    Cancel(oneshot::Sender<bool>),
    RemoveLast(oneshot::Sender<Result<Option<Page>>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// A blocking-pool job whose answer has not arrived yet.
type Pending<T> = Option<(CaptureTicket, oneshot::Receiver<Result<T>>)>;

/// UI-side handle to a running session.
///
/// Dropping the handle cancels the session.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
}

/// Start a session on the current Tokio runtime.
///
/// The session begins in `Detecting`; the host keeps feeding frames to
/// `collaborators.pipeline` from its camera thread.
#[instrument(skip_all, fields(rescan = mode.is_rescan()))]
pub fn spawn(mode: ScanMode, config: &ScanConfig, collaborators: Collaborators) -> SessionHandle {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (state_tx, state_rx) = watch::channel(SessionState::Idle);

    let actor = Actor {
        machine: ScanSession::new(mode, config),
        review_delay: config.session.review_delay(),
        collaborators,
        state: state_tx,
        capture: None,
        rectify: None,
        review: None,
    };
    tokio::spawn(actor.run(commands_rx));
    info!("capture session started");

    SessionHandle {
        commands: commands_tx,
        state: state_rx,
    }
}

impl SessionHandle {
    /// Press the shutter. `false` if the press was ignored or the session is
    /// over.
    pub async fn shutter(&self) -> bool {
        self.request(Command::Shutter).await.unwrap_or(false)
    }

    /// Finish a scan session, delivering its pages to the sink.
    pub async fn complete(&self) -> Result<()> {
        self.request(Command::Complete)
            .await
            .unwrap_or(Err(ScanwerkError::SessionClosed))
    }

    /// Abort the session. `false` if it had already terminated.
    pub async fn cancel(&self) -> bool {
        self.request(Command::Cancel).await.unwrap_or(false)
    }

    /// Reshoot: drop the most recently captured page.
    pub async fn remove_last_page(&self) -> Result<Option<Page>> {
        self.request(Command::RemoveLast)
            .await
            .unwrap_or(Err(ScanwerkError::SessionClosed))
    }

    /// `None` once the session has terminated.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// The most recently published state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns `None` if the session ended without ever satisfying it.
    pub async fn wait_for(&self, predicate: impl FnMut(&SessionState) -> bool) -> Option<SessionState> {
        let mut state = self.state.clone();
        state.wait_for(predicate).await.ok().map(|s| *s)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(command(tx)).await.ok()?;
        rx.await.ok()
    }
}

struct Actor {
    machine: ScanSession,
    review_delay: Duration,
    collaborators: Collaborators,
    state: watch::Sender<SessionState>,
    capture: Pending<CapturedImage>,
    rectify: Pending<DynamicImage>,
    review: Option<Pin<Box<Sleep>>>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        self.machine.start();
        self.publish();

        while !self.machine.state().is_terminal() {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("session handle dropped");
                        self.cancel();
                    }
                },
                (ticket, result) = settle(&mut self.capture) => {
                    self.capture = None;
                    let step = self.machine.still_captured(ticket, result);
                    self.apply(step);
                }
                (ticket, result) = settle(&mut self.rectify) => {
                    self.rectify = None;
                    let step = self.machine.rectified(ticket, result);
                    self.apply(step);
                }
                () = elapsed(&mut self.review) => {
                    self.review = None;
                    let step = self.machine.review_elapsed();
                    self.apply(step);
                }
            }
        }

        self.collaborators.pipeline.set_frozen(true);
        debug!(state = %self.machine.state(), "session task exiting");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Shutter(reply) => {
                let _ = reply.send(self.shutter());
            }
            Command::Complete(reply) => {
                let _ = reply.send(self.complete());
            }
            Command::Cancel(reply) => {
                let _ = reply.send(self.cancel());
            }
            Command::RemoveLast(reply) => {
                let removed = self.machine.remove_last_page();
                self.publish();
                let _ = reply.send(removed);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot {
                    state: self.machine.state(),
                    page_count: self.machine.pages().len(),
                    rescan: self.machine.mode().is_rescan(),
                });
            }
        }
    }

    fn shutter(&mut self) -> bool {
        let tracked = self.collaborators.pipeline.tracked();
        let ShutterOutcome::Accepted(ticket) = self.machine.press_shutter(tracked) else {
            return false;
        };
        self.publish();

        let (tx, rx) = oneshot::channel();
        let camera = Arc::clone(&self.collaborators.capture);
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(camera.capture_still());
        });
        self.capture = Some((ticket, rx));
        true
    }

    fn complete(&mut self) -> Result<()> {
        let pages = self.machine.complete()?;
        self.collaborators.sink.on_session_finished(pages);
        self.publish();
        Ok(())
    }

    fn cancel(&mut self) -> bool {
        if !self.machine.cancel() {
            return false;
        }
        self.capture = None;
        self.rectify = None;
        self.review = None;
        self.collaborators.sink.on_session_cancelled();
        self.publish();
        true
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Rectify(job) => self.spawn_rectify(job),
            Step::Review(index) => {
                if let Some(page) = self.machine.pages().get(index) {
                    self.collaborators.sink.on_page_captured(page);
                }
                self.review = Some(Box::pin(sleep(self.review_delay)));
            }
            Step::Finished(pages) => {
                for page in &pages {
                    self.collaborators.sink.on_page_captured(page);
                }
                self.collaborators.sink.on_session_finished(pages);
            }
            Step::Resumed | Step::Ignored => {}
        }
        self.publish();
    }

    fn spawn_rectify(&mut self, job: RectifyJob) {
        let (tx, rx) = oneshot::channel();
        let rectifier = Arc::clone(&self.collaborators.rectifier);
        let RectifyJob { ticket, image, quad } = job;
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(rectifier.rectify(&image, &quad));
        });
        self.rectify = Some((ticket, rx));
    }

    /// Publish the machine's state. The overlay is live only while detecting.
    fn publish(&self) {
        let state = self.machine.state();
        self.collaborators
            .pipeline
            .set_frozen(state != SessionState::Detecting);
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "session state published");
        }
    }
}

/// Resolves when the pending job reports; never resolves if there is none.
async fn settle<T>(slot: &mut Pending<T>) -> (CaptureTicket, Result<T>) {
    match slot {
        Some((ticket, rx)) => {
            let result = rx.await.unwrap_or_else(|_| {
                warn!("blocking worker exited without reporting");
                Err(ScanwerkError::Bridge("worker exited without a result".into()))
            });
            (*ticket, result)
        }
        None => pending().await,
    }
}

async fn elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}
