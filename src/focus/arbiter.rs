use super::{FocusChange, FocusGrant, FocusRequestKind, FocusState, FocusSystem};
use crate::error::PlaybackError;

/// 焦点状态对输出的要求
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPolicy {
    /// 不能出声：正在播放则暂停
    Silent,
    /// 降低音量继续播放
    Ducked(f32),
    /// 正常音量
    Normal(f32),
}

impl FocusPolicy {
    pub fn volume(self) -> Option<f32> {
        match self {
            FocusPolicy::Silent => None,
            FocusPolicy::Ducked(v) | FocusPolicy::Normal(v) => Some(v),
        }
    }
}

#[derive(Debug)]
pub struct FocusArbiter {
    state: FocusState,
    /// 是否在系统焦点栈中登记（请求成功后，直到 abandon 或永久失去）
    registered: bool,
    volume: f32,
    duck_volume: f32,
}

impl FocusArbiter {
    pub fn new(volume: f32, duck_volume: f32) -> Self {
        Self {
            state: FocusState::None,
            registered: false,
            volume,
            duck_volume,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// 已经是 FULL 时不会再向系统请求
    pub fn request(&mut self, system: &mut dyn FocusSystem) -> Result<FocusState, PlaybackError> {
        if self.state == FocusState::Full {
            return Ok(self.state);
        }
        match system.request(FocusRequestKind::Gain) {
            FocusGrant::Granted => {
                tracing::debug!(from = ?self.state, "音频焦点请求成功");
                self.state = FocusState::Full;
                self.registered = true;
                Ok(self.state)
            }
            FocusGrant::Denied => {
                tracing::warn!(state = ?self.state, "音频焦点请求被拒绝");
                Err(PlaybackError::FocusDenied)
            }
        }
    }

    /// 放弃焦点；未登记时不会重复调用系统。返回是否真正调用了 abandon
    pub fn release(&mut self, system: &mut dyn FocusSystem) -> bool {
        let abandoned = if self.registered {
            system.abandon();
            true
        } else {
            false
        };
        self.registered = false;
        self.state = FocusState::None;
        abandoned
    }

    /// 未登记时（已 release 或永久失去焦点）的通知是过期的，返回 `None`
    pub fn on_change(&mut self, change: FocusChange) -> Option<FocusState> {
        if !self.registered {
            tracing::debug!(?change, "未持有焦点，忽略过期的焦点通知");
            return None;
        }
        self.state = match change {
            FocusChange::Gain => FocusState::Full,
            FocusChange::Loss => {
                self.registered = false;
                FocusState::None
            }
            FocusChange::LossTransient => FocusState::None,
            FocusChange::LossTransientCanDuck => FocusState::DuckAllowed,
        };
        Some(self.state)
    }

    pub fn policy(&self) -> FocusPolicy {
        match self.state {
            FocusState::None => FocusPolicy::Silent,
            FocusState::DuckAllowed => FocusPolicy::Ducked(self.volume * self.duck_volume),
            FocusState::Full => FocusPolicy::Normal(self.volume),
        }
    }
}
