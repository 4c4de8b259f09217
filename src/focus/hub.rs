use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{FocusChange, FocusGrant, FocusRequestKind, FocusSystem};

struct Listener {
    name: String,
    tx: mpsc::Sender<FocusChange>,
}

#[derive(Default)]
struct HubState {
    next_client: u64,
    /// 栈顶为当前焦点持有者
    stack: Vec<u64>,
    listeners: HashMap<u64, Listener>,
    locked: bool,
}

impl HubState {
    fn notify(&self, client: u64, change: FocusChange) {
        let Some(listener) = self.listeners.get(&client) else {
            return;
        };
        tracing::debug!(client = %listener.name, ?change, "下发焦点变化");
        if let Err(e) = listener.tx.try_send(change) {
            tracing::warn!(client = %listener.name, ?change, err = %e, "焦点变化通知发送失败");
        }
    }

    fn top(&self) -> Option<u64> {
        self.stack.last().copied()
    }

    fn abandon(&mut self, client: u64) {
        let was_top = self.top() == Some(client);
        self.stack.retain(|&c| c != client);
        if was_top && let Some(next) = self.top() {
            self.notify(next, FocusChange::Gain);
        }
    }
}

/// 进程内的音频焦点仲裁器
///
/// 语义与系统音频焦点栈一致：新的请求者压栈成为持有者，原持有者收到与请求类型
/// 对应的 LOSS 通知（永久 LOSS 时直接出栈）；栈顶放弃焦点后，下一个持有者收到 GAIN。
#[derive(Clone, Default)]
pub struct FocusHub {
    inner: Arc<Mutex<HubState>>,
}

impl FocusHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个客户端，焦点变化通过 `listener` 通知
    pub fn client(&self, name: impl Into<String>, listener: mpsc::Sender<FocusChange>) -> FocusClient {
        let name = name.into();
        let mut state = self.inner.lock();
        let id = state.next_client;
        state.next_client += 1;
        state.listeners.insert(
            id,
            Listener {
                name: name.clone(),
                tx: listener,
            },
        );
        FocusClient {
            hub: Arc::clone(&self.inner),
            id,
            name,
        }
    }

    /// 锁定期间（例如通话中）所有请求都会被拒绝
    pub fn set_locked(&self, locked: bool) {
        self.inner.lock().locked = locked;
    }

    /// 当前持有者的名字
    pub fn holder(&self) -> Option<String> {
        let state = self.inner.lock();
        state
            .top()
            .and_then(|id| state.listeners.get(&id))
            .map(|l| l.name.clone())
    }
}

pub struct FocusClient {
    hub: Arc<Mutex<HubState>>,
    id: u64,
    name: String,
}

impl FocusClient {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FocusSystem for FocusClient {
    fn request(&mut self, kind: FocusRequestKind) -> FocusGrant {
        let mut state = self.hub.lock();
        if state.locked {
            tracing::debug!(client = %self.name, ?kind, "焦点已锁定，拒绝请求");
            return FocusGrant::Denied;
        }
        if let Some(prev) = state.top()
            && prev != self.id
        {
            let loss = kind.loss_for_previous_holder();
            state.notify(prev, loss);
            if loss == FocusChange::Loss {
                state.stack.retain(|&c| c != prev);
            }
        }
        state.stack.retain(|&c| c != self.id);
        state.stack.push(self.id);
        tracing::debug!(client = %self.name, ?kind, "焦点已授予");
        FocusGrant::Granted
    }

    fn abandon(&mut self) {
        tracing::debug!(client = %self.name, "放弃焦点");
        self.hub.lock().abandon(self.id);
    }
}

impl Drop for FocusClient {
    fn drop(&mut self) {
        let mut state = self.hub.lock();
        state.abandon(self.id);
        state.listeners.remove(&self.id);
    }
}
