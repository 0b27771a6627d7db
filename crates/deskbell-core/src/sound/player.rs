use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::PlaybackError;

/// Plays the notification cue
pub trait SoundPlayer: Send + Sync {
    fn play(&self, volume: f32) -> Result<(), PlaybackError>;
}

/// Player for hosts without audio output
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&self, _volume: f32) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// rodio-backed player.
///
/// The cue is read into memory once. `OutputStream` is not `Send`, so it
/// lives on a dedicated audio thread and `play` only queues a request.
pub struct RodioPlayer {
    requests: Mutex<mpsc::Sender<f32>>,
}

impl RodioPlayer {
    /// Load the cue at `path` and open the default output device
    pub fn new(path: &Path) -> Result<Self, PlaybackError> {
        let bytes: Arc<[u8]> = fs::read(path)?.into();
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Arc<[u8]>) -> Result<Self, PlaybackError> {
        // Reject undecodable audio before touching the output device
        Decoder::new(Cursor::new(bytes.clone())).map_err(|e| PlaybackError::Decode(e.to_string()))?;

        let (request_tx, request_rx) = mpsc::channel::<f32>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("deskbell-audio".to_string())
            .spawn(move || audio_thread(bytes, request_rx, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                requests: Mutex::new(request_tx),
            }),
            Ok(Err(e)) => Err(PlaybackError::Unavailable(e)),
            Err(_) => Err(PlaybackError::Unavailable("audio thread exited".to_string())),
        }
    }
}

impl SoundPlayer for RodioPlayer {
    fn play(&self, volume: f32) -> Result<(), PlaybackError> {
        self.requests
            .lock()
            .send(volume)
            .map_err(|_| PlaybackError::Unavailable("audio thread stopped".to_string()))
    }
}

fn audio_thread(bytes: Arc<[u8]>, requests: mpsc::Receiver<f32>, ready: mpsc::Sender<Result<(), String>>) {
    // Output stream handle (must be kept alive for playback)
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => {
            let _ = ready.send(Ok(()));
            output
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    while let Ok(volume) = requests.recv() {
        if let Err(e) = play_once(&handle, &bytes, volume) {
            tracing::warn!(error = %e, "Failed to play notification sound");
        }
    }
}

fn play_once(handle: &OutputStreamHandle, bytes: &Arc<[u8]>, volume: f32) -> Result<(), PlaybackError> {
    let source = Decoder::new(Cursor::new(bytes.clone())).map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|e| PlaybackError::Unavailable(e.to_string()))?;
    sink.set_volume(volume);
    sink.append(source);
    sink.detach();
    Ok(())
}
