use std::sync::Arc;

use super::{CoreEffects, PlaybackAction, PlaybackSnapshot, PlaybackState};
use crate::catalog::Catalog;
use crate::domain::MediaId;
use crate::error::PlaybackError;
use crate::focus::{FocusArbiter, FocusChange, FocusPolicy, FocusSystem};
use crate::messages::NotificationSignal;
use crate::queue::{PlayQueue, QueueEntry, QueueId, queue_from_media_id, queue_from_search, random_queue};
use crate::renderer::{
    InstanceId, MediaSource, Renderer, RendererEvent, RendererEventSender, RendererFactory,
};

const CANNOT_SKIP: &str = "Cannot skip";
const NO_METADATA: &str = "Unable to retrieve metadata";

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub volume: f32,
    pub duck_volume: f32,
    pub random_queue_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            duck_volume: 0.2,
            random_queue_size: 10,
        }
    }
}

/// 当前存活的 renderer 实例
struct LiveRenderer {
    instance: InstanceId,
    renderer: Box<dyn Renderer>,
    prepared: bool,
}

/// 播放状态机
///
/// 所有状态迁移都在同一个执行上下文里串行发生（见 [`super::spawn_player`]）：
/// 用户命令、焦点变化、renderer 回调都以消息的形式进入，这里的方法从不重入。
/// 每个公开方法结束时向 `CoreEffects` 推送一次快照。
pub struct Coordinator {
    state: PlaybackState,
    /// 焦点恢复后是否继续播放；与 `state` 分开保存，焦点丢失不会抹掉播放意图
    resume_on_focus_regain: bool,
    /// 没有 renderer 实例时才是权威位置
    cached_position_ms: u64,
    /// `cached_position_ms` 所属的条目
    current_media_id: Option<MediaId>,
    live: Option<LiveRenderer>,
    error: Option<String>,
    focus: FocusArbiter,
    focus_system: Box<dyn FocusSystem>,
    queue: PlayQueue,
    catalog: Arc<dyn Catalog>,
    factory: Box<dyn RendererFactory>,
    renderer_events: RendererEventSender,
    last_instance: InstanceId,
    random_queue_size: usize,
}

impl Coordinator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        factory: Box<dyn RendererFactory>,
        focus_system: Box<dyn FocusSystem>,
        renderer_events: RendererEventSender,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            state: PlaybackState::Idle,
            resume_on_focus_regain: false,
            cached_position_ms: 0,
            current_media_id: None,
            live: None,
            error: None,
            focus: FocusArbiter::new(config.volume, config.duck_volume),
            focus_system,
            queue: PlayQueue::default(),
            catalog,
            factory,
            renderer_events,
            last_instance: InstanceId(0),
            random_queue_size: config.random_queue_size,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn resume_on_focus_regain(&self) -> bool {
        self.resume_on_focus_regain
    }

    pub fn cached_position_ms(&self) -> u64 {
        self.cached_position_ms
    }

    pub fn live_instance(&self) -> Option<InstanceId> {
        self.live.as_ref().map(|l| l.instance)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let renderer_playing = self.live.as_ref().is_some_and(|l| l.renderer.is_playing());
        PlaybackSnapshot {
            state: self.state,
            position_ms: self.position_ms(),
            actions: PlaybackAction::available(renderer_playing),
            active_queue_id: self.queue.current().map(|e| e.queue_id),
            error_message: self.error.clone(),
            focus: self.focus.state(),
            resume_on_focus_regain: self.resume_on_focus_regain,
        }
    }

    /// 初始 IDLE 快照
    pub fn init(&mut self, effects: &mut CoreEffects) {
        tracing::info!("播放服务已启动");
        self.publish(effects);
    }

    // ===== 命令 =====

    pub fn play(&mut self, effects: &mut CoreEffects) {
        tracing::debug!(state = ?self.state, "play");
        let mut rebuilt = false;
        if self.queue.is_empty() {
            match random_queue(self.catalog.as_ref(), self.random_queue_size) {
                Ok(queue) => {
                    tracing::info!(len = queue.len(), "队列为空，随机挑选曲目");
                    self.set_queue(queue, effects);
                    rebuilt = true;
                }
                Err(e) => {
                    self.report(PlaybackError::from(e), effects);
                    return;
                }
            }
        }
        let Some(entry) = self.queue.current().cloned() else {
            tracing::debug!("没有当前曲目，忽略 play");
            return;
        };
        effects.notify(NotificationSignal::PlaybackStarted);
        self.play_entry(&entry, effects);
        if rebuilt {
            self.emit_current_metadata(effects);
        }
    }

    pub fn play_from_id(&mut self, media_id: &MediaId, effects: &mut CoreEffects) {
        tracing::debug!(%media_id, "play from media id");
        let reused = self.queue.is_same_category(media_id) && self.queue.seek_to_media(media_id);
        if !reused {
            match queue_from_media_id(media_id, self.catalog.as_ref()) {
                Ok(queue) => self.set_queue(queue, effects),
                Err(e) => {
                    self.report(PlaybackError::from(e), effects);
                    return;
                }
            }
        }
        self.play(effects);
        self.emit_current_metadata(effects);
    }

    /// 空查询等价于随机播放
    pub fn play_from_search(&mut self, query: &str, effects: &mut CoreEffects) {
        let query = query.trim();
        tracing::debug!(query, "play from search");
        let built = if query.is_empty() {
            random_queue(self.catalog.as_ref(), self.random_queue_size)
        } else {
            queue_from_search(query, self.catalog.as_ref())
        };
        match built {
            Ok(queue) => self.set_queue(queue, effects),
            Err(e) => {
                self.report(PlaybackError::from(e), effects);
                return;
            }
        }
        self.play(effects);
        self.emit_current_metadata(effects);
    }

    pub fn skip_to_queue_item(&mut self, queue_id: QueueId, effects: &mut CoreEffects) {
        if !self.queue.seek_to_id(queue_id) {
            tracing::debug!(%queue_id, "队列中没有该条目，忽略");
            return;
        }
        self.play(effects);
        self.emit_current_metadata(effects);
    }

    /// 越过队列边界时停止并报告 "Cannot skip"
    pub fn skip(&mut self, delta: isize, effects: &mut CoreEffects) {
        if self.queue.skip(delta) {
            self.play(effects);
        } else {
            tracing::debug!(delta, index = ?self.queue.current_index(), "无法跳转");
            self.stop_with_error(Some(CANNOT_SKIP), effects);
        }
        self.emit_current_metadata(effects);
    }

    pub fn pause(&mut self, effects: &mut CoreEffects) {
        tracing::debug!(state = ?self.state, "pause");
        self.resume_on_focus_regain = false;
        let pausable = matches!(self.state, PlaybackState::Playing | PlaybackState::Buffering);
        let Some(live) = self.live.as_mut().filter(|_| pausable) else {
            tracing::debug!(state = ?self.state, "当前状态不可暂停");
            self.publish(effects);
            return;
        };
        if live.renderer.is_playing() {
            live.renderer.pause();
        }
        // 正在 seek 时保留目标位置
        if self.state == PlaybackState::Playing {
            self.cached_position_ms = live.renderer.current_position();
        }
        self.focus.release(self.focus_system.as_mut());
        self.transition(PlaybackState::Paused);
        effects.notify(NotificationSignal::PlaybackStopped);
        self.publish(effects);
    }

    pub fn stop(&mut self, effects: &mut CoreEffects) {
        self.stop_with_error(None, effects);
    }

    pub fn seek_to(&mut self, position_ms: u64, effects: &mut CoreEffects) {
        tracing::debug!(position_ms, state = ?self.state, "seek");
        match self.live.as_mut().filter(|l| l.prepared) {
            Some(live) => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Buffering;
                }
                // seek 完成前恢复播放时以此为准
                self.cached_position_ms = position_ms;
                live.renderer.seek(position_ms);
            }
            None => {
                self.cached_position_ms = position_ms;
                if let Some(entry) = self.queue.current() {
                    self.current_media_id = Some(entry.media_id.clone());
                }
            }
        }
        self.publish(effects);
    }

    /// 停止播放，释放焦点与 renderer
    pub fn shutdown(&mut self, effects: &mut CoreEffects) {
        tracing::info!(state = ?self.state, "播放服务关闭");
        self.stop_with_error(None, effects);
    }

    // ===== 异步事件 =====

    pub fn on_renderer_event(&mut self, evt: RendererEvent, effects: &mut CoreEffects) {
        let instance = evt.instance();
        if self.live_instance() != Some(instance) {
            let err = PlaybackError::StaleEvent(instance);
            tracing::debug!(?evt, live = ?self.live_instance(), "{err}");
            return;
        }
        match evt {
            RendererEvent::Prepared { duration_ms, .. } => {
                tracing::debug!(%instance, ?duration_ms, "renderer 已准备");
                if let Some(live) = self.live.as_mut() {
                    live.prepared = true;
                }
                self.apply_focus_policy();
            }
            RendererEvent::Completed { .. } => {
                tracing::debug!(%instance, "曲目播放结束");
                self.on_completion(effects);
                return;
            }
            RendererEvent::SeekComplete { position_ms, .. } => {
                self.on_seek_complete(position_ms);
            }
            RendererEvent::Error { code, message, .. } => {
                self.fail(PlaybackError::RendererRuntime { code, message });
            }
        }
        self.publish(effects);
    }

    pub fn on_focus_change(&mut self, change: FocusChange, effects: &mut CoreEffects) {
        tracing::debug!(?change, state = ?self.state, "音频焦点变化");
        if self.focus.on_change(change).is_none() {
            return;
        }
        if matches!(change, FocusChange::Loss | FocusChange::LossTransient)
            && self.state == PlaybackState::Playing
        {
            self.resume_on_focus_regain = true;
        }
        self.apply_focus_policy();
        self.publish(effects);
    }

    // ===== 内部 =====

    fn play_entry(&mut self, entry: &QueueEntry, effects: &mut CoreEffects) {
        self.resume_on_focus_regain = true;
        if let Err(e) = self.focus.request(self.focus_system.as_mut()) {
            self.resume_on_focus_regain = false;
            if self.live.is_some() {
                self.apply_focus_policy();
            } else if self.state != PlaybackState::Paused {
                self.transition(PlaybackState::Stopped);
            }
            self.report(e, effects);
            return;
        }

        let media_changed = self.current_media_id.as_ref() != Some(&entry.media_id);
        if media_changed {
            self.cached_position_ms = 0;
            self.current_media_id = Some(entry.media_id.clone());
        }

        let reusable = !media_changed
            && matches!(
                self.state,
                PlaybackState::Paused | PlaybackState::Buffering | PlaybackState::Playing
            );
        match self.live.as_ref().filter(|_| reusable).map(|l| l.prepared) {
            Some(true) => self.apply_focus_policy(),
            // 暂停于加载过程中：等待 prepared
            Some(false) => self.transition(PlaybackState::Buffering),
            None => self.load_entry(entry, media_changed),
        }
        self.publish(effects);
    }

    /// 为条目创建（或复用）renderer 并开始异步准备
    fn load_entry(&mut self, entry: &QueueEntry, media_changed: bool) {
        self.transition(PlaybackState::Stopped);
        self.error = None;

        let renderer = match self.live.take() {
            Some(live) if !media_changed => live.renderer,
            previous => {
                if let Some(mut old) = previous {
                    tracing::debug!(instance = %old.instance, "释放 renderer 实例");
                    old.renderer.release();
                }
                match self.factory.create(self.renderer_events.clone()) {
                    Ok(r) => r,
                    Err(e) => {
                        self.fail(PlaybackError::RendererLoad(e));
                        return;
                    }
                }
            }
        };

        self.last_instance = self.last_instance.next();
        let mut live = LiveRenderer {
            instance: self.last_instance,
            renderer,
            prepared: false,
        };
        let source = MediaSource::from(entry.track.as_ref());
        tracing::info!(
            instance = %live.instance,
            queue_id = %entry.queue_id,
            media_id = %entry.media_id,
            title = %entry.track.title,
            "加载曲目"
        );
        let loaded = live
            .renderer
            .load(live.instance, &source)
            .and_then(|()| live.renderer.prepare_async());
        if let Err(e) = loaded {
            live.renderer.release();
            self.fail(PlaybackError::RendererLoad(e));
            return;
        }
        self.live = Some(live);
        self.transition(PlaybackState::Buffering);
    }

    /// 按焦点状态调整输出
    ///
    /// | focus | 动作 |
    /// |---|---|
    /// | NONE | 正在播放则暂停 |
    /// | DUCK-ALLOWED | 降低音量，需要时恢复播放 |
    /// | FULL | 正常音量，需要时恢复播放 |
    fn apply_focus_policy(&mut self) {
        let policy = self.focus.policy();
        tracing::debug!(?policy, state = ?self.state, resume = self.resume_on_focus_regain, "应用焦点策略");
        let Some(live) = self.live.as_mut() else {
            return;
        };
        match policy {
            FocusPolicy::Silent => {
                if live.renderer.is_playing() {
                    live.renderer.pause();
                }
                if self.state == PlaybackState::Playing {
                    self.cached_position_ms = live.renderer.current_position();
                    self.transition(PlaybackState::Paused);
                }
            }
            FocusPolicy::Ducked(volume) | FocusPolicy::Normal(volume) => {
                live.renderer.set_volume(volume);
                if !self.resume_on_focus_regain || !live.prepared {
                    return;
                }
                if !live.renderer.is_playing() {
                    if self.cached_position_ms == live.renderer.current_position() {
                        live.renderer.start();
                        self.transition(PlaybackState::Playing);
                    } else {
                        tracing::debug!(position_ms = self.cached_position_ms, "恢复前先 seek");
                        live.renderer.seek(self.cached_position_ms);
                        self.transition(PlaybackState::Buffering);
                    }
                }
                self.resume_on_focus_regain = false;
            }
        }
    }

    fn on_seek_complete(&mut self, position_ms: u64) {
        tracing::debug!(position_ms, state = ?self.state, "seek 完成");
        self.cached_position_ms = position_ms;
        if self.state != PlaybackState::Buffering {
            return;
        }
        let policy = self.focus.policy();
        let Some(live) = self.live.as_mut() else {
            return;
        };
        match policy.volume() {
            Some(volume) => {
                live.renderer.set_volume(volume);
                live.renderer.start();
                self.transition(PlaybackState::Playing);
            }
            None => {
                // 没有焦点时不能出声，等焦点回来
                self.resume_on_focus_regain = true;
                self.transition(PlaybackState::Paused);
            }
        }
    }

    fn on_completion(&mut self, effects: &mut CoreEffects) {
        if self.queue.skip(1) {
            self.play(effects);
            self.emit_current_metadata(effects);
        } else {
            tracing::info!("已到队列末尾");
            self.stop(effects);
        }
    }

    fn stop_with_error(&mut self, error: Option<&str>, effects: &mut CoreEffects) {
        tracing::debug!(state = ?self.state, ?error, "stop");
        self.cached_position_ms = self.position_ms();
        self.focus.release(self.focus_system.as_mut());
        self.release_renderer();
        self.resume_on_focus_regain = false;
        self.error = None;
        self.transition(PlaybackState::Stopped);
        effects.notify(NotificationSignal::PlaybackStopped);
        match error {
            Some(message) => self.publish_error(message, effects),
            None => self.publish(effects),
        }
    }

    /// 进入 ERROR；焦点和 renderer 保留，等待调用方 stop
    fn fail(&mut self, err: PlaybackError) {
        tracing::warn!(err = %err, state = ?self.state, "播放失败");
        if let Some(live) = self.live.as_mut()
            && live.renderer.is_playing()
        {
            live.renderer.pause();
        }
        self.error = Some(err.user_message());
        self.transition(PlaybackState::Error);
    }

    /// 只在快照里报告错误，内部状态不变
    fn report(&self, err: PlaybackError, effects: &mut CoreEffects) {
        tracing::warn!(err = %err, state = ?self.state, "播放请求失败");
        self.publish_error(&err.user_message(), effects);
    }

    fn release_renderer(&mut self) {
        if let Some(mut live) = self.live.take() {
            tracing::debug!(instance = %live.instance, "释放 renderer 实例");
            live.renderer.release();
        }
    }

    fn set_queue(&mut self, queue: PlayQueue, effects: &mut CoreEffects) {
        self.queue = queue;
        effects.emit_queue(&self.queue);
    }

    fn emit_current_metadata(&mut self, effects: &mut CoreEffects) {
        let Some(entry) = self.queue.current() else {
            return;
        };
        match self.catalog.lookup(&entry.track.id) {
            Some(track) => effects.emit_metadata(track),
            None => {
                tracing::warn!(media_id = %entry.media_id, "曲库中找不到元数据");
                effects.emit_metadata_error(entry.media_id.clone());
                self.publish_error(NO_METADATA, effects);
            }
        }
    }

    fn position_ms(&self) -> u64 {
        match &self.live {
            Some(live) if live.prepared && self.state != PlaybackState::Buffering => {
                live.renderer.current_position()
            }
            _ => self.cached_position_ms,
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "播放状态迁移");
            self.state = next;
        }
    }

    fn publish(&self, effects: &mut CoreEffects) {
        self.emit_snapshot(self.snapshot(), effects);
    }

    fn publish_error(&self, message: &str, effects: &mut CoreEffects) {
        self.emit_snapshot(self.snapshot().with_error(message), effects);
    }

    fn emit_snapshot(&self, snapshot: PlaybackSnapshot, effects: &mut CoreEffects) {
        let notify = matches!(snapshot.state, PlaybackState::Playing | PlaybackState::Paused);
        effects.emit_state(snapshot);
        if notify {
            effects.notify(NotificationSignal::NotificationRequired);
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.focus.release(self.focus_system.as_mut());
        self.release_renderer();
    }
}
