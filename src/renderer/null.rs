use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::{
    InstanceId, MediaSource, Renderer, RendererEvent, RendererEventSender, RendererFactory,
};
use crate::error::RendererError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullMode {
    /// 不主动产生任何事件，由调用方通过 channel 注入（测试用）
    Manual,
    /// 自己按时钟推进：立即 prepared / seek complete，播完后 completed
    Simulated { default_track_ms: u64 },
}

/// NullRenderer 收到的调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    Load {
        instance: InstanceId,
        locator: String,
    },
    Prepare,
    Start,
    Pause,
    Seek(u64),
    SetVolume(f32),
    Release,
}

#[derive(Debug, Default)]
struct NullShared {
    calls: Vec<RendererCall>,
    created: usize,
    instance: Option<InstanceId>,
    playing: bool,
    /// 最近一次 start/pause/seek 时的位置
    position_ms: u64,
    volume: f32,
}

/// 观察/操纵 NullRenderer 的句柄，所有由同一工厂创建的实例共享
#[derive(Debug, Clone, Default)]
pub struct NullRendererHandle {
    inner: Arc<Mutex<NullShared>>,
}

impl NullRendererHandle {
    pub fn calls(&self) -> Vec<RendererCall> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&RendererCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// 工厂创建过的 renderer 数量
    pub fn created(&self) -> usize {
        self.inner.lock().created
    }

    pub fn instance(&self) -> Option<InstanceId> {
        self.inner.lock().instance
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn position_ms(&self) -> u64 {
        self.inner.lock().position_ms
    }

    /// 模拟播放推进
    pub fn set_position(&self, position_ms: u64) {
        self.inner.lock().position_ms = position_ms;
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }
}

pub struct NullRendererFactory {
    mode: NullMode,
    handle: NullRendererHandle,
}

impl NullRendererFactory {
    pub fn new(mode: NullMode) -> Self {
        Self {
            mode,
            handle: NullRendererHandle::default(),
        }
    }

    pub fn handle(&self) -> NullRendererHandle {
        self.handle.clone()
    }
}

impl RendererFactory for NullRendererFactory {
    fn create(&mut self, events: RendererEventSender) -> Result<Box<dyn Renderer>, RendererError> {
        let created = {
            let mut shared = self.handle.inner.lock();
            shared.created += 1;
            shared.created
        };
        let events = spawn_forwarder(created, events)?;
        Ok(Box::new(NullRenderer {
            mode: self.mode,
            handle: self.handle.clone(),
            events,
            instance: None,
            duration_ms: None,
            started_at: None,
            generation: Arc::new(AtomicU64::new(0)),
        }))
    }
}

/// 事件经由专门线程按顺序投递给 coordinator
///
/// 通道满时只会延后，不会丢事件；renderer 被 drop 后线程随发送端关闭退出。
fn spawn_forwarder(
    id: usize,
    events: RendererEventSender,
) -> Result<std_mpsc::Sender<RendererEvent>, RendererError> {
    let (tx, rx) = std_mpsc::channel::<RendererEvent>();
    thread::Builder::new()
        .name(format!("null-renderer-events-{id}"))
        .spawn(move || {
            for evt in rx {
                if events.blocking_send(evt).is_err() {
                    tracing::debug!("renderer 事件通道已关闭");
                    break;
                }
            }
        })
        .map_err(|e| RendererError::OutputStream(format!("启动 null renderer 事件线程失败: {e}")))?;
    Ok(tx)
}

/// 静音 renderer：不打开任何设备
pub struct NullRenderer {
    mode: NullMode,
    handle: NullRendererHandle,
    events: std_mpsc::Sender<RendererEvent>,
    instance: Option<InstanceId>,
    duration_ms: Option<u64>,
    started_at: Option<Instant>,
    /// 每次 start/pause/seek/release 递增，让过期的完成计时器失效
    generation: Arc<AtomicU64>,
}

impl NullRenderer {
    fn record(&self, call: RendererCall) {
        tracing::trace!(?call, "null renderer");
        self.handle.inner.lock().calls.push(call);
    }

    fn emit(&self, evt: RendererEvent) {
        if self.events.send(evt).is_err() {
            tracing::warn!("null renderer 事件线程已退出");
        }
    }

    fn elapsed_ms(&self) -> u64 {
        match (self.mode, self.started_at) {
            (NullMode::Simulated { .. }, Some(at)) => at.elapsed().as_millis() as u64,
            _ => 0,
        }
    }

    /// 把时钟推进的部分写回共享位置
    fn settle_position(&mut self) {
        let elapsed = self.elapsed_ms();
        self.started_at = None;
        let mut shared = self.handle.inner.lock();
        shared.position_ms = shared.position_ms.saturating_add(elapsed);
    }

    fn schedule_completion(&self) {
        let NullMode::Simulated { default_track_ms } = self.mode else {
            return;
        };
        let Some(instance) = self.instance else {
            return;
        };
        let total = self.duration_ms.unwrap_or(default_track_ms);
        let remaining = total.saturating_sub(self.handle.position_ms());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let tx = self.events.clone();

        let spawned = thread::Builder::new()
            .name(format!("null-renderer-{}", instance.0))
            .spawn(move || {
                thread::sleep(Duration::from_millis(remaining));
                if current.load(Ordering::SeqCst) == generation {
                    let _ = tx.send(RendererEvent::Completed { instance });
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(%instance, err = %e, "无法启动 null renderer 计时线程");
        }
    }

    fn cancel_completion(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Renderer for NullRenderer {
    fn load(&mut self, instance: InstanceId, source: &MediaSource) -> Result<(), RendererError> {
        self.record(RendererCall::Load {
            instance,
            locator: source.locator.clone(),
        });
        if source.locator.trim().is_empty() {
            return Err(RendererError::InvalidSource(source.locator.clone()));
        }
        self.cancel_completion();
        self.instance = Some(instance);
        self.duration_ms = source.duration_ms;
        self.started_at = None;
        let mut shared = self.handle.inner.lock();
        shared.instance = Some(instance);
        shared.playing = false;
        shared.position_ms = 0;
        Ok(())
    }

    fn prepare_async(&mut self) -> Result<(), RendererError> {
        self.record(RendererCall::Prepare);
        let Some(instance) = self.instance else {
            return Err(RendererError::InvalidSource(String::new()));
        };
        if matches!(self.mode, NullMode::Simulated { .. }) {
            self.emit(RendererEvent::Prepared {
                instance,
                duration_ms: self.duration_ms,
            });
        }
        Ok(())
    }

    fn start(&mut self) {
        self.record(RendererCall::Start);
        if self.instance.is_none() || self.handle.is_playing() {
            return;
        }
        self.handle.inner.lock().playing = true;
        self.started_at = Some(Instant::now());
        self.schedule_completion();
    }

    fn pause(&mut self) {
        self.record(RendererCall::Pause);
        self.cancel_completion();
        self.settle_position();
        self.handle.inner.lock().playing = false;
    }

    fn seek(&mut self, position_ms: u64) {
        self.record(RendererCall::Seek(position_ms));
        let Some(instance) = self.instance else {
            return;
        };
        let playing = self.handle.is_playing();
        self.handle.inner.lock().position_ms = position_ms;
        if playing {
            self.started_at = Some(Instant::now());
            self.schedule_completion();
        }
        if matches!(self.mode, NullMode::Simulated { .. }) {
            self.emit(RendererEvent::SeekComplete {
                instance,
                position_ms,
            });
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(RendererCall::SetVolume(volume));
        self.handle.inner.lock().volume = volume;
    }

    fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    fn current_position(&self) -> u64 {
        self.handle.position_ms().saturating_add(self.elapsed_ms())
    }

    fn release(&mut self) {
        self.record(RendererCall::Release);
        self.cancel_completion();
        self.instance = None;
        self.started_at = None;
        let mut shared = self.handle.inner.lock();
        shared.instance = None;
        shared.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn source(locator: &str, duration_ms: Option<u64>) -> MediaSource {
        MediaSource {
            locator: locator.to_owned(),
            duration_ms,
        }
    }

    #[test]
    fn test_manual_mode_records_calls_without_events() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut factory = NullRendererFactory::new(NullMode::Manual);
        let handle = factory.handle();
        let mut r = factory.create(tx).unwrap();

        r.load(InstanceId(1), &source("a.mp3", None)).unwrap();
        r.prepare_async().unwrap();
        r.start();
        r.seek(500);
        assert!(r.is_playing());
        assert_eq!(r.current_position(), 500);
        r.release();

        assert!(rx.try_recv().is_err());
        assert_eq!(handle.created(), 1);
        assert_eq!(
            handle.calls(),
            vec![
                RendererCall::Load {
                    instance: InstanceId(1),
                    locator: "a.mp3".to_owned()
                },
                RendererCall::Prepare,
                RendererCall::Start,
                RendererCall::Seek(500),
                RendererCall::Release,
            ]
        );
        assert!(!handle.is_playing());
    }

    #[test]
    fn test_simulated_mode_emits_prepared_and_seek_complete() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut factory = NullRendererFactory::new(NullMode::Simulated {
            default_track_ms: 60_000,
        });
        let mut r = factory.create(tx).unwrap();

        r.load(InstanceId(4), &source("a.mp3", Some(1_000))).unwrap();
        r.prepare_async().unwrap();
        assert_eq!(
            rx.blocking_recv().unwrap(),
            RendererEvent::Prepared {
                instance: InstanceId(4),
                duration_ms: Some(1_000)
            }
        );
        r.seek(200);
        assert_eq!(
            rx.blocking_recv().unwrap(),
            RendererEvent::SeekComplete {
                instance: InstanceId(4),
                position_ms: 200
            }
        );
    }

    #[test]
    fn test_simulated_completion_after_duration() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut factory = NullRendererFactory::new(NullMode::Simulated {
            default_track_ms: 60_000,
        });
        let mut r = factory.create(tx).unwrap();

        r.load(InstanceId(2), &source("a.mp3", Some(20))).unwrap();
        r.prepare_async().unwrap();
        assert!(matches!(rx.blocking_recv(), Some(RendererEvent::Prepared { .. })));
        r.start();

        let evt = rx.blocking_recv().unwrap();
        assert_eq!(
            evt,
            RendererEvent::Completed {
                instance: InstanceId(2)
            }
        );
    }

    #[test]
    fn test_full_channel_delays_events_in_order() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut factory = NullRendererFactory::new(NullMode::Simulated {
            default_track_ms: 60_000,
        });
        let mut r = factory.create(tx).unwrap();

        r.load(InstanceId(1), &source("a.mp3", None)).unwrap();
        r.prepare_async().unwrap();
        r.seek(100);
        r.seek(200);

        assert!(matches!(rx.blocking_recv(), Some(RendererEvent::Prepared { .. })));
        for position_ms in [100, 200] {
            assert_eq!(
                rx.blocking_recv().unwrap(),
                RendererEvent::SeekComplete {
                    instance: InstanceId(1),
                    position_ms
                }
            );
        }
    }

    #[test]
    fn test_empty_locator_is_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let mut factory = NullRendererFactory::new(NullMode::Manual);
        let mut r = factory.create(tx).unwrap();
        assert!(matches!(
            r.load(InstanceId(1), &source(" ", None)),
            Err(RendererError::InvalidSource(_))
        ));
    }
}
