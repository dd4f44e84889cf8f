// Notification sinks. The evaluator calls `notify` and moves on; every sink
// does its work off the caller's path and swallows its own failures.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;

use super::model::AlertEvent;
use crate::core::sos::dispatch::SosDispatcher;
use crate::core::sos::model::EmergencyContact;

/// Receiver of proximity notifications.
pub trait AlertSink: Send + Sync {
    /// Fire-and-forget. Must not block the caller.
    fn notify(&self, distance_meters: f64);
}

/// Writes alerts to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn notify(&self, distance_meters: f64) {
        log::warn!("ALERT: destination is {:.0} m away", distance_meters);
    }
}

/// Plays an audio file on a detached thread.
#[derive(Debug, Clone)]
pub struct SoundSink {
    sound_path: PathBuf,
}

impl SoundSink {
    pub fn new(sound_path: impl Into<PathBuf>) -> Self {
        Self {
            sound_path: sound_path.into(),
        }
    }

    fn play(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let mut stream = rodio::OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        let sink = rodio::Sink::connect_new(stream.mixer());
        let source = rodio::Decoder::try_from(File::open(path)?)?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

impl AlertSink for SoundSink {
    fn notify(&self, _distance_meters: f64) {
        let path = self.sound_path.clone();
        let spawned = thread::Builder::new()
            .name("alert-sound".to_string())
            .spawn(move || {
                if let Err(e) = Self::play(&path) {
                    log::warn!("Audio play failed for {:?}: {}", path, e);
                }
            });
        if let Err(e) = spawned {
            log::warn!("Failed to spawn audio thread: {}", e);
        }
    }
}

/// Forwards alert events onto a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AlertEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AlertEvent>) -> Self {
        Self { tx }
    }
}

impl AlertSink for ChannelSink {
    fn notify(&self, distance_meters: f64) {
        if let Err(e) = self.tx.try_send(AlertEvent::new(distance_meters)) {
            log::warn!("Dropped alert event: {}", e);
        }
    }
}

/// Texts the user's active emergency contacts that they are nearly there.
pub struct ContactSink {
    dispatcher: Arc<SosDispatcher>,
    contacts: Vec<EmergencyContact>,
}

impl ContactSink {
    pub fn new(dispatcher: Arc<SosDispatcher>, contacts: Vec<EmergencyContact>) -> Self {
        Self {
            dispatcher,
            contacts,
        }
    }
}

impl AlertSink for ContactSink {
    fn notify(&self, distance_meters: f64) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let contacts = self.contacts.clone();
        let body = format!(
            "BuzzYatra: I am {:.0} m from my destination.",
            distance_meters
        );
        let spawned = thread::Builder::new()
            .name("alert-contacts".to_string())
            .spawn(move || {
                let deliveries = dispatcher.broadcast(&contacts, &body);
                let failed = deliveries.iter().filter(|d| !d.is_delivered()).count();
                if failed > 0 {
                    log::warn!("{} of {} contact notifications failed", failed, deliveries.len());
                }
            });
        if let Err(e) = spawned {
            log::warn!("Failed to spawn contact notifier: {}", e);
        }
    }
}

/// Forwards each alert to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AlertSink for FanoutSink {
    fn notify(&self, distance_meters: f64) {
        for sink in &self.sinks {
            sink.notify(distance_meters);
        }
    }
}

/// Records every notification; shared handle survives boxing.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Arc<std::sync::Mutex<Vec<f64>>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn calls(&self) -> Arc<std::sync::Mutex<Vec<f64>>> {
        Arc::clone(&self.calls)
    }
}

#[cfg(test)]
impl AlertSink for RecordingSink {
    fn notify(&self, distance_meters: f64) {
        self.calls.lock().unwrap().push(distance_meters);
    }
}
