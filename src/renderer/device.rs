use parking_lot::Mutex;
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use super::{
    InstanceId, MediaSource, Renderer, RendererEvent, RendererEventSender, RendererFactory,
};
use crate::error::RendererError;

/// 默认输出设备
///
/// `OutputStream` 不能跨线程移动，由专门的设备线程持有；工厂只拿 `Mixer`。
/// 工厂被 drop 时关闭通道，设备线程随之退出并释放输出流。
pub struct RodioFactory {
    mixer: Mixer,
    _shutdown: std_mpsc::Sender<()>,
}

impl RodioFactory {
    pub fn open() -> Result<Self, RendererError> {
        let (tx_ready, rx_ready) = std_mpsc::channel::<Result<Mixer, RendererError>>();
        let (tx_shutdown, rx_shutdown) = std_mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-device".to_owned())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!(err = %e, "初始化音频输出失败");
                        let _ = tx_ready.send(Err(RendererError::OutputStream(e.to_string())));
                        return;
                    }
                };
                let _ = tx_ready.send(Ok(stream.mixer().clone()));
                tracing::info!("音频输出设备已打开");

                let _ = rx_shutdown.recv();
                tracing::debug!("音频输出设备关闭");
                drop(stream);
            })
            .map_err(|e| RendererError::OutputStream(format!("启动音频设备线程失败: {e}")))?;

        let mixer = rx_ready.recv().map_err(|_| RendererError::DeviceGone)??;
        Ok(Self {
            mixer,
            _shutdown: tx_shutdown,
        })
    }
}

impl RendererFactory for RodioFactory {
    fn create(&mut self, events: RendererEventSender) -> Result<Box<dyn Renderer>, RendererError> {
        Ok(Box::new(RodioRenderer::new(self.mixer.clone(), events)))
    }
}

struct ActiveSink {
    sink: Arc<Sink>,
    end_cancel: Arc<AtomicBool>,
}

struct PreparedSink {
    instance: InstanceId,
    sink: Sink,
}

pub struct RodioRenderer {
    mixer: Mixer,
    events: RendererEventSender,
    instance: Option<InstanceId>,
    path: Option<PathBuf>,
    /// 准备线程产出的（暂停状态）sink，`start` 时取走
    prepared: Arc<Mutex<Option<PreparedSink>>>,
    current: Option<ActiveSink>,
    volume: f32,
}

impl RodioRenderer {
    fn new(mixer: Mixer, events: RendererEventSender) -> Self {
        Self {
            mixer,
            events,
            instance: None,
            path: None,
            prepared: Arc::new(Mutex::new(None)),
            current: None,
            volume: 1.0,
        }
    }

    fn stop_current(&mut self) {
        if let Some(cur) = self.current.take() {
            tracing::debug!(
                instance = ?self.instance,
                "Stopping current sink, signaling end check thread to cancel"
            );
            cur.end_cancel.store(true, Ordering::Relaxed);
            cur.sink.stop();
        }
        if let Some(p) = self.prepared.lock().take() {
            p.sink.stop();
        }
    }

    fn take_prepared(&mut self) -> Option<Sink> {
        let instance = self.instance?;
        let mut slot = self.prepared.lock();
        match slot.take() {
            Some(p) if p.instance == instance => Some(p.sink),
            Some(p) => {
                p.sink.stop();
                None
            }
            None => None,
        }
    }

    fn attach_sink(&mut self, instance: InstanceId, sink: Arc<Sink>) {
        let tx_end = self.events.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let sink_end = Arc::clone(&sink);
        let cancel_end = Arc::clone(&cancel);

        tracing::debug!(%instance, "Spawning end check thread");
        let spawned = thread::Builder::new()
            .name(format!("audio-end-check-{}", instance.0))
            .spawn(move || {
                let start = std::time::Instant::now();
                sink_end.sleep_until_end();
                let elapsed = start.elapsed();

                if !cancel_end.load(Ordering::Relaxed) {
                    tracing::debug!(
                        %instance,
                        elapsed_ms = elapsed.as_millis(),
                        "End check thread exiting naturally"
                    );
                    let _ = tx_end.blocking_send(RendererEvent::Completed { instance });
                } else {
                    tracing::debug!(
                        %instance,
                        elapsed_ms = elapsed.as_millis(),
                        "End check thread was cancelled"
                    );
                }
            });
        // 线程创建失败只影响自动切歌，播放本身继续
        if let Err(e) = spawned {
            tracing::warn!(%instance, err = %e, "无法启动播放结束检测线程");
        }

        self.current = Some(ActiveSink {
            sink,
            end_cancel: cancel,
        });
    }

    fn current_sink(&self) -> Option<&Sink> {
        self.current.as_ref().map(|cur| cur.sink.as_ref())
    }
}

impl Renderer for RodioRenderer {
    fn load(&mut self, instance: InstanceId, source: &MediaSource) -> Result<(), RendererError> {
        self.stop_current();
        let path = resolve_path(&source.locator)?;
        tracing::debug!(%instance, path = %path.display(), "加载音源");
        self.instance = Some(instance);
        self.path = Some(path);
        Ok(())
    }

    fn prepare_async(&mut self) -> Result<(), RendererError> {
        let (Some(instance), Some(path)) = (self.instance, self.path.clone()) else {
            return Err(RendererError::InvalidSource(String::new()));
        };
        let mixer = self.mixer.clone();
        let slot = Arc::clone(&self.prepared);
        let tx = self.events.clone();

        thread::Builder::new()
            .name(format!("audio-prepare-{}", instance.0))
            .spawn(move || {
                let evt = match build_sink(&mixer, &path) {
                    Ok((sink, duration_ms)) => {
                        if let Some(old) = slot.lock().replace(PreparedSink { instance, sink }) {
                            old.sink.stop();
                        }
                        RendererEvent::Prepared {
                            instance,
                            duration_ms,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%instance, err = %e, "音源准备失败");
                        RendererEvent::Error {
                            instance,
                            code: e.code(),
                            message: e.to_string(),
                        }
                    }
                };
                let _ = tx.blocking_send(evt);
            })
            .map_err(|e| RendererError::OutputStream(format!("启动准备线程失败: {e}")))?;
        Ok(())
    }

    fn start(&mut self) {
        let Some(instance) = self.instance else {
            return;
        };
        if self.current.is_none() {
            let Some(sink) = self.take_prepared() else {
                tracing::warn!(%instance, "音源尚未准备完成，忽略 start");
                return;
            };
            self.attach_sink(instance, Arc::new(sink));
        }
        if let Some(sink) = self.current_sink() {
            sink.set_volume(self.volume);
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = self.current_sink() {
            sink.pause();
        }
    }

    fn seek(&mut self, position_ms: u64) {
        let Some(instance) = self.instance else {
            return;
        };
        let sink = match &self.current {
            Some(cur) => Arc::clone(&cur.sink),
            None => match self.take_prepared() {
                Some(sink) => {
                    // 尚未 start 的 sink 也需要可 seek，先挂上结束检测
                    let sink = Arc::new(sink);
                    self.attach_sink(instance, Arc::clone(&sink));
                    sink
                }
                None => {
                    tracing::warn!(%instance, position_ms, "没有可 seek 的 sink");
                    return;
                }
            },
        };
        let tx = self.events.clone();
        let spawned = thread::Builder::new()
            .name(format!("audio-seek-{}", instance.0))
            .spawn(move || {
                let evt = match sink.try_seek(Duration::from_millis(position_ms)) {
                    Ok(()) => RendererEvent::SeekComplete {
                        instance,
                        position_ms,
                    },
                    Err(e) => {
                        let err = RendererError::Seek(e.to_string());
                        tracing::warn!(%instance, position_ms, err = %err, "Seek 失败");
                        RendererEvent::Error {
                            instance,
                            code: err.code(),
                            message: err.to_string(),
                        }
                    }
                };
                let _ = tx.blocking_send(evt);
            });
        if let Err(e) = spawned {
            tracing::warn!(%instance, err = %e, "无法启动 seek 线程");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 2.0);
        if let Some(sink) = self.current_sink() {
            sink.set_volume(self.volume);
        }
    }

    fn is_playing(&self) -> bool {
        self.current_sink()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    fn current_position(&self) -> u64 {
        if let Some(sink) = self.current_sink() {
            return sink.get_pos().as_millis() as u64;
        }
        self.prepared
            .lock()
            .as_ref()
            .map(|p| p.sink.get_pos().as_millis() as u64)
            .unwrap_or(0)
    }

    fn release(&mut self) {
        tracing::debug!(instance = ?self.instance, "释放 renderer");
        self.stop_current();
        self.instance = None;
        self.path = None;
    }
}

impl Drop for RodioRenderer {
    fn drop(&mut self) {
        self.stop_current();
    }
}

/// 本地路径或 `file://` URL
fn resolve_path(locator: &str) -> Result<PathBuf, RendererError> {
    let trimmed = locator.trim();
    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    if path.is_empty() || path.contains("://") {
        return Err(RendererError::InvalidSource(locator.to_owned()));
    }
    Ok(PathBuf::from(path))
}

/// 打开并解码音源，返回暂停状态的 sink
fn build_sink(mixer: &Mixer, path: &Path) -> Result<(Sink, Option<u64>), RendererError> {
    let file = File::open(path).map_err(|source| RendererError::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| RendererError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let duration_ms = decoder.total_duration().map(|d| d.as_millis() as u64);

    let sink = Sink::connect_new(mixer);
    sink.pause();
    sink.append(decoder);
    Ok((sink, duration_ms))
}
