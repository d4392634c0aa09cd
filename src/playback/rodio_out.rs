//! rodio-backed [`AudioOutput`] on a dedicated OS thread.
//!
//! `rodio::OutputStream` is not `Send`, so it lives on one thread for the
//! lifetime of the process. Playback requests are passed over a channel and
//! answered with a [`Sink`], which is freely shareable; the sink is wrapped
//! in a [`PlaybackHandle`] for the controller to poll and halt.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};

use super::{AudioBuffer, AudioOutput, PlaybackError, PlaybackHandle, CHANNELS, SAMPLE_RATE};

enum OutputCommand {
    Open {
        samples: Vec<f32>,
        reply: mpsc::Sender<Result<Sink, String>>,
    },
}

/// Production audio output. Construct once at startup with [`spawn`].
///
/// [`spawn`]: RodioOutput::spawn
pub struct RodioOutput {
    tx: mpsc::Sender<OutputCommand>,
}

impl RodioOutput {
    /// Spawn the output thread. The default device is opened lazily on that
    /// thread; if it cannot be opened, every playback attempt reports a
    /// [`PlaybackError::Output`] instead of crashing the process.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<OutputCommand>();

        thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        log::info!("audio output stream opened");
                        Some(stream)
                    }
                    Err(e) => {
                        log::error!("failed to open audio output: {e}");
                        None
                    }
                };

                while let Ok(OutputCommand::Open { samples, reply }) = rx.recv() {
                    let result = match &stream {
                        Some(stream) => {
                            let sink = Sink::connect_new(stream.mixer());
                            sink.append(SamplesBuffer::new(CHANNELS, SAMPLE_RATE, samples));
                            Ok(sink)
                        }
                        None => Err("no audio output device".to_string()),
                    };
                    let _ = reply.send(result);
                }
            })
            .expect("failed to spawn audio-output thread");

        Self { tx }
    }
}

impl AudioOutput for RodioOutput {
    fn start(&self, audio: AudioBuffer) -> Result<Arc<dyn PlaybackHandle>, PlaybackError> {
        let (reply_tx, reply_rx) = mpsc::channel();

        self.tx
            .send(OutputCommand::Open {
                samples: audio.into_samples(),
                reply: reply_tx,
            })
            .map_err(|_| PlaybackError::Output("audio output thread is gone".into()))?;

        let sink = reply_rx
            .recv()
            .map_err(|_| PlaybackError::Output("audio output thread is gone".into()))?
            .map_err(PlaybackError::Output)?;

        Ok(Arc::new(SinkHandle(sink)))
    }
}

/// [`PlaybackHandle`] over a rodio [`Sink`].
struct SinkHandle(Sink);

impl PlaybackHandle for SinkHandle {
    fn is_done(&self) -> bool {
        self.0.empty()
    }

    fn halt(&self) {
        // Clears the queue; the sink reports empty immediately afterwards.
        self.0.stop();
    }
}
