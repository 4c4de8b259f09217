//! Renderer adapter: the one exclusive audio output device.
//!
//! A [`Renderer`] plays a single loaded source at a time. Loading is split into
//! `load` + `prepare_async`; preparation and seeking finish later through a
//! [`RendererEvent`] tagged with the [`InstanceId`] given to `load`, so the
//! coordinator can drop callbacks that belong to a torn-down instance.

mod device;
mod null;

use std::fmt;
use tokio::sync::mpsc;

use crate::domain::TrackMetadata;
use crate::error::RendererError;

pub use device::{RodioFactory, RodioRenderer};
pub use null::{NullMode, NullRenderer, NullRendererFactory, NullRendererHandle, RendererCall};

/// Identity of one loaded source on one renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub fn next(self) -> Self {
        InstanceId(self.0.wrapping_add(1).max(1))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    Prepared {
        instance: InstanceId,
        duration_ms: Option<u64>,
    },
    Completed {
        instance: InstanceId,
    },
    SeekComplete {
        instance: InstanceId,
        position_ms: u64,
    },
    Error {
        instance: InstanceId,
        code: i32,
        message: String,
    },
}

impl RendererEvent {
    pub fn instance(&self) -> InstanceId {
        match self {
            RendererEvent::Prepared { instance, .. }
            | RendererEvent::Completed { instance }
            | RendererEvent::SeekComplete { instance, .. }
            | RendererEvent::Error { instance, .. } => *instance,
        }
    }
}

pub type RendererEventSender = mpsc::Sender<RendererEvent>;
pub type RendererEventReceiver = mpsc::Receiver<RendererEvent>;

/// What to load: a locator (local path or `file://` URL) plus the known duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub locator: String,
    pub duration_ms: Option<u64>,
}

impl From<&TrackMetadata> for MediaSource {
    fn from(track: &TrackMetadata) -> Self {
        Self {
            locator: track.source.clone(),
            duration_ms: track.duration_ms,
        }
    }
}

pub trait Renderer: Send {
    /// Replaces whatever was loaded before; events of the new source carry `instance`.
    fn load(&mut self, instance: InstanceId, source: &MediaSource) -> Result<(), RendererError>;

    /// Returns immediately; completion arrives as [`RendererEvent::Prepared`] or
    /// [`RendererEvent::Error`].
    fn prepare_async(&mut self) -> Result<(), RendererError>;

    fn start(&mut self);

    fn pause(&mut self);

    /// Completion arrives as [`RendererEvent::SeekComplete`].
    fn seek(&mut self, position_ms: u64);

    fn set_volume(&mut self, volume: f32);

    fn is_playing(&self) -> bool;

    fn current_position(&self) -> u64;

    fn release(&mut self);
}

/// Creates renderer instances wired to the coordinator's event channel.
pub trait RendererFactory: Send {
    fn create(&mut self, events: RendererEventSender) -> Result<Box<dyn Renderer>, RendererError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    /// Default output device through rodio.
    Real,
    /// Silent backend that simulates playback on its own clock.
    Null,
}

pub fn open_factory(
    backend: AudioBackend,
    null_track_ms: u64,
) -> Result<Box<dyn RendererFactory>, RendererError> {
    match backend {
        AudioBackend::Real => Ok(Box::new(RodioFactory::open()?)),
        AudioBackend::Null => Ok(Box::new(NullRendererFactory::new(NullMode::Simulated {
            default_track_ms: null_track_ms,
        }))),
    }
}
