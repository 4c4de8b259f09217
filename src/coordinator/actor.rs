use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::commands::{self, CommandSurface};
use super::effects::{CoreEffects, run_effects};
use super::machine::Coordinator;
use crate::catalog::Catalog;
use crate::error::PlaybackError;
use crate::focus::{FocusChange, FocusHub};
use crate::messages::{SessionEvent, TransportCommand};
use crate::renderer::{RendererEvent, RendererFactory};
use crate::settings::PlayerSettings;

/// 在焦点仲裁器里登记的名字
pub const FOCUS_CLIENT_NAME: &str = "queue-player";

enum CoreMsg {
    Transport(TransportCommand),
    Renderer(RendererEvent),
    Focus(FocusChange),
}

fn reduce(msg: CoreMsg, coordinator: &mut Coordinator, effects: &mut CoreEffects) -> bool {
    match msg {
        CoreMsg::Transport(cmd) => return commands::dispatch(cmd, coordinator, effects),
        CoreMsg::Renderer(evt) => coordinator.on_renderer_event(evt, effects),
        CoreMsg::Focus(change) => coordinator.on_focus_change(change, effects),
    }
    false
}

/// 运行中的播放服务
pub struct PlayerService {
    pub surface: CommandSurface,
    pub events: mpsc::Receiver<SessionEvent>,
    join: JoinHandle<()>,
}

impl PlayerService {
    /// 停止播放（释放焦点和 renderer）并等待 actor 退出
    pub async fn shutdown(self) -> Result<(), PlaybackError> {
        let Self {
            surface,
            events,
            join,
        } = self;
        // 不再消费事件，避免 actor 阻塞在发送上
        drop(events);
        if surface.send(TransportCommand::Shutdown).await.is_err() {
            tracing::debug!("actor 已退出");
        }
        join.await.map_err(|e| {
            tracing::error!(err = %e, "播放 actor 异常退出");
            PlaybackError::CoordinatorClosed
        })
    }
}

/// 启动播放 actor
///
/// 用户命令、renderer 回调、焦点变化三路消息在同一个任务里串行处理，
/// 每条消息产生的副作用处理完之后才取下一条。
pub fn spawn_player(
    catalog: Arc<dyn Catalog>,
    factory: Box<dyn RendererFactory>,
    focus: &FocusHub,
    settings: &PlayerSettings,
) -> PlayerService {
    let capacity = settings.channel_capacity.max(1);
    let (tx_cmd, mut rx_cmd) = mpsc::channel::<TransportCommand>(capacity);
    let (tx_evt, rx_evt) = mpsc::channel::<SessionEvent>(capacity);
    let (tx_renderer, mut rx_renderer) = mpsc::channel::<RendererEvent>(capacity);
    let (tx_focus, mut rx_focus) = mpsc::channel::<FocusChange>(capacity);

    let focus_client = focus.client(FOCUS_CLIENT_NAME, tx_focus);
    let config = settings.coordinator_config();

    let join = tokio::spawn(async move {
        let mut coordinator = Coordinator::new(
            catalog,
            factory,
            Box::new(focus_client),
            tx_renderer,
            config,
        );
        let mut effects = CoreEffects::default();
        coordinator.init(&mut effects);
        run_effects(effects, &tx_evt).await;

        loop {
            let msg = tokio::select! {
                biased;
                Some(evt) = rx_renderer.recv() => CoreMsg::Renderer(evt),
                Some(change) = rx_focus.recv() => CoreMsg::Focus(change),
                maybe_cmd = rx_cmd.recv() => match maybe_cmd {
                    Some(cmd) => CoreMsg::Transport(cmd),
                    // 所有控制端都已断开
                    None => CoreMsg::Transport(TransportCommand::Shutdown),
                },
            };

            let mut effects = CoreEffects::default();
            let should_quit = reduce(msg, &mut coordinator, &mut effects);
            run_effects(effects, &tx_evt).await;
            if should_quit {
                break;
            }
        }
        tracing::info!("播放 actor 已退出");
    });

    PlayerService {
        surface: CommandSurface::new(tx_cmd),
        events: rx_evt,
        join,
    }
}
