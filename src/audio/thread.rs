use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, trace, warn};

use crate::error::SessionError;

use super::session::AudioSession;
use super::sink::{SourceBytes, create_sink_at, fetch_source, probe_duration};
use super::types::{EventSender, SessionEvent, SessionEventKind};

#[derive(Debug)]
pub(super) enum SinkCmd {
    Bind { url: String, generation: u64 },
    Play,
    Pause,
    Stop,
    Seek(f64),
    Gain(f32),
    Quit,
}

/// Knobs for a rodio-backed session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Cadence of `TimeAdvanced` events while playing.
    pub tick: Duration,
    /// Timeout for fetching an HTTP source.
    pub fetch_timeout: Duration,
    /// Label used in log lines ("player", "preview #12", ...).
    pub label: String,
}

/// An [`AudioSession`] backed by a `rodio` sink living on its own thread.
///
/// The thread owns the output stream and the sink; the handle only sends
/// requests. Fetching and decoding happen on the worker, so `bind` returns
/// immediately and failures surface as `Failed` events.
pub struct RodioSession {
    tx: Sender<SinkCmd>,
    join: Option<JoinHandle<()>>,
}

impl RodioSession {
    pub fn open(events: EventSender, options: SessionOptions) -> Self {
        let (tx, rx) = mpsc::channel::<SinkCmd>();
        let join = thread::Builder::new()
            .name(format!("audio-{}", options.label))
            .spawn(move || run_worker(rx, events, options));

        let join = match join {
            Ok(h) => Some(h),
            Err(e) => {
                // Requests go nowhere and `play` is never answered.
                warn!(error = %e, "failed to spawn audio worker");
                None
            }
        };

        Self { tx, join }
    }

    fn send(&self, cmd: SinkCmd) {
        if let Err(e) = self.tx.send(cmd) {
            trace!(cmd = ?e.0, "audio worker gone, dropping request");
        }
    }
}

impl AudioSession for RodioSession {
    fn bind(&mut self, url: &str, generation: u64) {
        self.send(SinkCmd::Bind {
            url: url.to_string(),
            generation,
        });
    }

    fn play(&mut self) {
        self.send(SinkCmd::Play);
    }

    fn pause(&mut self) {
        self.send(SinkCmd::Pause);
    }

    fn stop(&mut self) {
        self.send(SinkCmd::Stop);
    }

    fn set_position(&mut self, seconds: f64) {
        self.send(SinkCmd::Seek(seconds));
    }

    fn set_gain(&mut self, level: f32) {
        self.send(SinkCmd::Gain(level));
    }

    /// Joins the command loop only; an in-flight fetch is left to finish
    /// on its own thread and its result is discarded.
    fn release(&mut self) {
        self.send(SinkCmd::Quit);
        if let Some(h) = self.join.take() {
            if h.join().is_err() {
                warn!("audio worker thread panicked");
            }
        }
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Upper bound on how long a finished fetch waits to be picked up.
const FETCH_POLL: Duration = Duration::from_millis(10);

/// Result of a background fetch, tagged with the load it belongs to.
pub(super) struct Fetched {
    load: u64,
    url: String,
    result: Result<SourceBytes, SessionError>,
}

/// The currently bound source.
struct Loaded {
    url: String,
    bytes: SourceBytes,
    sink: Sink,
}

pub(super) struct Worker {
    stream: Option<OutputStream>,
    events: EventSender,
    options: SessionOptions,
    fetched_tx: Sender<Fetched>,
    generation: u64,
    /// Bumped by every bind and stop; fetches started under an older value are dropped.
    load: u64,
    fetching: bool,
    loaded: Option<Loaded>,
    playing: bool,
    /// `play` arrived while the source was still being fetched.
    play_pending: bool,
    /// Offset a rebuilt sink starts at (seek while fetching or after the end).
    resume_at: Duration,
    gain: f32,
}

fn run_worker(rx: Receiver<SinkCmd>, events: EventSender, options: SessionOptions) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped; that would
            // scribble over the terminal UI.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            warn!(session = %options.label, error = %e, "no audio output device");
            None
        }
    };

    let (fetched_tx, fetched_rx) = mpsc::channel::<Fetched>();
    let mut worker = Worker::new(stream, events, options, fetched_tx);

    let mut next_tick = Instant::now() + worker.options.tick;
    loop {
        let mut wait = next_tick.saturating_duration_since(Instant::now());
        if worker.fetching {
            wait = wait.min(FETCH_POLL);
        }
        match rx.recv_timeout(wait) {
            Ok(SinkCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                worker.stop();
                debug!(session = %worker.options.label, "audio worker exiting");
                break;
            }
            Ok(cmd) => worker.handle(cmd),
            Err(RecvTimeoutError::Timeout) => {}
        }

        while let Ok(fetched) = fetched_rx.try_recv() {
            worker.finish_load(fetched);
        }

        if Instant::now() >= next_tick {
            worker.tick();
            next_tick = Instant::now() + worker.options.tick;
        }
    }
}

impl Worker {
    pub(super) fn new(
        stream: Option<OutputStream>,
        events: EventSender,
        options: SessionOptions,
        fetched_tx: Sender<Fetched>,
    ) -> Self {
        Self {
            stream,
            events,
            options,
            fetched_tx,
            generation: 0,
            load: 0,
            fetching: false,
            loaded: None,
            playing: false,
            play_pending: false,
            resume_at: Duration::ZERO,
            gain: 1.0,
        }
    }

    fn emit(&self, kind: SessionEventKind) {
        // The receiving side may already be gone during shutdown.
        let _ = self.events.send(SessionEvent::new(self.generation, kind));
    }

    pub(super) fn handle(&mut self, cmd: SinkCmd) {
        match cmd {
            SinkCmd::Bind { url, generation } => self.bind(url, generation),
            SinkCmd::Play => self.play(),
            SinkCmd::Pause => {
                if let Some(l) = &self.loaded {
                    l.sink.pause();
                }
                self.playing = false;
                self.play_pending = false;
            }
            SinkCmd::Stop => self.stop(),
            SinkCmd::Seek(secs) => self.seek(secs),
            SinkCmd::Gain(g) => {
                self.gain = g.clamp(0.0, 1.0);
                if let Some(l) = &self.loaded {
                    l.sink.set_volume(self.gain);
                }
            }
            SinkCmd::Quit => self.stop(),
        }
    }

    fn stop(&mut self) {
        self.load += 1;
        self.fetching = false;
        self.play_pending = false;
        if let Some(l) = self.loaded.take() {
            l.sink.stop();
        }
        self.playing = false;
        self.resume_at = Duration::ZERO;
    }

    /// Start fetching `url` on a helper thread; the command loop stays free.
    fn bind(&mut self, url: String, generation: u64) {
        self.stop();
        self.generation = generation;

        let load = self.load;
        let timeout = self.options.fetch_timeout;
        let tx = self.fetched_tx.clone();
        let fetch_url = url.clone();
        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", self.options.label))
            .spawn(move || {
                let result = fetch_source(&fetch_url, timeout);
                // Nobody is listening once the session has been released.
                let _ = tx.send(Fetched {
                    load,
                    url: fetch_url,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.fetching = true;
                debug!(session = %self.options.label, %url, generation, "fetching source");
            }
            Err(e) => {
                warn!(session = %self.options.label, %url, error = %e, "failed to spawn fetch");
                self.emit(SessionEventKind::Failed(e.to_string()));
            }
        }
    }

    pub(super) fn finish_load(&mut self, fetched: Fetched) {
        if fetched.load != self.load {
            trace!(session = %self.options.label, url = %fetched.url, "dropping stale fetch");
            return;
        }
        self.fetching = false;
        let Fetched { url, result, .. } = fetched;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(session = %self.options.label, %url, error = %e, "failed to fetch source");
                self.play_pending = false;
                self.emit(SessionEventKind::Failed(e.to_string()));
                return;
            }
        };

        let Some(stream) = self.stream.as_ref() else {
            self.play_pending = false;
            self.emit(SessionEventKind::Failed(
                SessionError::Output("no output device".to_string()).to_string(),
            ));
            return;
        };

        match create_sink_at(stream, &url, &bytes, self.resume_at) {
            Ok((sink, total)) => {
                sink.set_volume(self.gain);
                let duration = total.or_else(|| probe_duration(&bytes));
                info!(session = %self.options.label, %url, generation = self.generation, "source bound");
                self.loaded = Some(Loaded { url, bytes, sink });
                self.resume_at = Duration::ZERO;
                if let Some(d) = duration {
                    self.emit(SessionEventKind::MetadataReady {
                        duration: d.as_secs_f64(),
                    });
                }
                if std::mem::take(&mut self.play_pending) {
                    self.play();
                }
            }
            Err(e) => {
                warn!(session = %self.options.label, %url, error = %e, "failed to decode source");
                self.play_pending = false;
                self.emit(SessionEventKind::Failed(e.to_string()));
            }
        }
    }

    fn play(&mut self) {
        if self.fetching {
            // Answered once the fetch lands.
            self.play_pending = true;
            return;
        }
        let Some(stream) = self.stream.as_ref() else {
            let reason = SessionError::Output("no output device".to_string());
            self.emit(SessionEventKind::Rejected(reason.to_string()));
            return;
        };
        let Some(l) = self.loaded.as_mut() else {
            self.emit(SessionEventKind::Rejected(SessionError::NoSource.to_string()));
            return;
        };

        // A drained sink can't be restarted; rebuild it where the last seek left off.
        if l.sink.empty() {
            match create_sink_at(stream, &l.url, &l.bytes, self.resume_at) {
                Ok((sink, _)) => {
                    sink.set_volume(self.gain);
                    l.sink = sink;
                    self.resume_at = Duration::ZERO;
                }
                Err(e) => {
                    self.emit(SessionEventKind::Rejected(e.to_string()));
                    return;
                }
            }
        }

        l.sink.play();
        self.playing = true;
        self.emit(SessionEventKind::Started);
    }

    fn seek(&mut self, secs: f64) {
        let target = match Duration::try_from_secs_f64(secs.max(0.0)) {
            Ok(t) => t,
            Err(e) => {
                warn!(session = %self.options.label, secs, error = %e, "ignoring seek");
                return;
            }
        };

        let Some(l) = self.loaded.as_mut() else {
            // Still fetching (or nothing bound): the sink will be built here.
            self.resume_at = target;
            return;
        };
        if l.sink.empty() {
            self.resume_at = target;
            return;
        }
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        if let Err(e) = l.sink.try_seek(target) {
            // Not every format seeks in place; rebuild the sink and skip into it.
            debug!(session = %self.options.label, error = %e, "try_seek failed, rebuilding sink");
            match create_sink_at(stream, &l.url, &l.bytes, target) {
                Ok((sink, _)) => {
                    sink.set_volume(self.gain);
                    l.sink.stop();
                    if self.playing {
                        sink.play();
                    }
                    l.sink = sink;
                }
                Err(e) => warn!(session = %self.options.label, error = %e, "seek failed"),
            }
        }
    }

    fn tick(&mut self) {
        if !self.playing {
            return;
        }
        let Some(l) = &self.loaded else {
            return;
        };

        if l.sink.empty() {
            self.playing = false;
            self.emit(SessionEventKind::Ended);
        } else {
            let position = l.sink.get_pos().as_secs_f64();
            self.emit(SessionEventKind::TimeAdvanced { position });
        }
    }
}

#[cfg(test)]
impl Worker {
    /// Attach a source whose sink has already played out.
    pub(super) fn attach_drained(&mut self, url: &str) {
        let (sink, _output) = Sink::new();
        self.loaded = Some(Loaded {
            url: url.to_string(),
            bytes: SourceBytes::from(Vec::new()),
            sink,
        });
    }

    pub(super) fn resume_at(&self) -> Duration {
        self.resume_at
    }

    pub(super) fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub(super) fn fetched(
        load: u64,
        url: &str,
        result: Result<SourceBytes, SessionError>,
    ) -> Fetched {
        Fetched {
            load,
            url: url.to_string(),
            result,
        }
    }

    pub(super) fn current_load(&self) -> u64 {
        self.load
    }
}
