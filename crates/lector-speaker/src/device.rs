//! Default-device audio sink backed by `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the stream is
//! confined to a dedicated OS thread and every operation is proxied over
//! a channel. [`DeviceSink`] is the `Send + Sync` handle sessions hold.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use lector_core::{AudioClip, AudioSink, SinkError, SinkFactory};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

enum DeviceCommand {
    Play {
        clip: AudioClip,
        done: oneshot::Sender<Result<(), SinkError>>,
    },
    Stop {
        halted: oneshot::Sender<()>,
    },
    Shutdown,
}

/// `Send + Sync` handle to the dedicated audio output thread.
pub struct DeviceSink {
    commands: mpsc::Sender<DeviceCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl DeviceSink {
    /// Open the default output device on a dedicated thread.
    ///
    /// Blocks until the device reports ready, so call it from a blocking
    /// context.
    pub fn open() -> Result<Self, SinkError> {
        let (command_tx, command_rx) = mpsc::channel::<DeviceCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), SinkError>>();

        let thread = thread::Builder::new()
            .name("lector-audio".into())
            .spawn(move || run_device_loop(&command_rx, &init_tx))
            .map_err(|e| SinkError::Unavailable(format!("failed to spawn audio thread: {e}")))?;

        init_rx
            .recv()
            .map_err(|_| SinkError::Unavailable("audio thread died during init".into()))??;

        Ok(Self {
            commands: command_tx,
            thread: Some(thread),
        })
    }
}

#[async_trait]
impl AudioSink for DeviceSink {
    async fn play(&self, clip: AudioClip) -> Result<(), SinkError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(DeviceCommand::Play {
                clip,
                done: done_tx,
            })
            .map_err(|_| SinkError::Unavailable("audio thread is gone".into()))?;
        done_rx
            .await
            .map_err(|_| SinkError::Playback("audio thread dropped the clip".into()))?
    }

    async fn stop(&self) -> Result<(), SinkError> {
        let (halted_tx, halted_rx) = oneshot::channel();
        self.commands
            .send(DeviceCommand::Stop { halted: halted_tx })
            .map_err(|_| SinkError::Unavailable("audio thread is gone".into()))?;
        halted_rx
            .await
            .map_err(|_| SinkError::Unavailable("audio thread is gone".into()))
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        // Best-effort shutdown; the thread may already be dead.
        let _ = self.commands.send(DeviceCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Body of the audio thread. Owns the output stream for its whole life;
/// the stream never crosses a thread boundary.
fn run_device_loop(
    commands: &mpsc::Receiver<DeviceCommand>,
    init: &mpsc::Sender<Result<(), SinkError>>,
) {
    // Binding kept alive: dropping the stream silences every sink on it.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init.send(Err(SinkError::Unavailable(format!(
                "no default audio output device: {e}"
            ))));
            return;
        }
    };
    if init.send(Ok(())).is_err() {
        return;
    }
    tracing::debug!("audio output device ready");

    let mut current: Option<Arc<Sink>> = None;
    while let Ok(command) = commands.recv() {
        match command {
            DeviceCommand::Play { clip, done } => {
                if let Some(old) = current.take() {
                    old.stop();
                }
                match start_clip(&handle, clip) {
                    Ok(sink) => {
                        spawn_drain_watcher(&sink, done);
                        current = Some(sink);
                    }
                    Err(e) => {
                        let _ = done.send(Err(e));
                    }
                }
            }
            DeviceCommand::Stop { halted } => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                let _ = halted.send(());
            }
            DeviceCommand::Shutdown => break,
        }
    }

    if let Some(sink) = current.take() {
        sink.stop();
    }
    tracing::debug!("audio thread shutting down");
}

/// Decode `clip` and start it on a fresh sink. Reusing a sink would queue
/// sources behind each other instead of replacing them.
fn start_clip(handle: &OutputStreamHandle, clip: AudioClip) -> Result<Arc<Sink>, SinkError> {
    let encoding = clip.encoding;
    let source = Decoder::new(Cursor::new(clip.bytes))
        .map_err(|e| SinkError::Playback(format!("cannot decode {encoding} audio: {e}")))?;
    let sink = Sink::try_new(handle)
        .map_err(|e| SinkError::Playback(format!("cannot open playback sink: {e}")))?;
    sink.append(source);
    Ok(Arc::new(sink))
}

/// Wait on a background thread until the sink drains or is stopped, then
/// resolve the caller's play future.
///
/// `Sink` is Send in rodio 0.20+. `sleep_until_end` returns immediately
/// once `stop()` drops the queued sources, so a stopped clip also resolves.
fn spawn_drain_watcher(sink: &Arc<Sink>, done: oneshot::Sender<Result<(), SinkError>>) {
    let sink = Arc::clone(sink);
    thread::spawn(move || {
        sink.sleep_until_end();
        let _ = done.send(Ok(()));
    });
}

/// Opens the default output device on first use.
pub struct DeviceSinkFactory;

#[async_trait]
impl SinkFactory for DeviceSinkFactory {
    async fn create(&self) -> Result<Arc<dyn AudioSink>, SinkError> {
        let sink = tokio::task::spawn_blocking(DeviceSink::open)
            .await
            .map_err(|e| SinkError::Unavailable(format!("audio init task failed: {e}")))??;
        Ok(Arc::new(sink))
    }
}
