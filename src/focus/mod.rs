//! 音频焦点
//!
//! [`FocusArbiter`] 记录本进程与共享音频输出的关系（NONE / DUCK-ALLOWED / FULL），
//! [`FocusSystem`] 是系统侧的焦点仲裁接口；[`FocusHub`] 是进程内的实现，
//! 在多个客户端之间按栈语义分配焦点。

mod arbiter;
mod hub;

use serde::{Deserialize, Serialize};

pub use arbiter::{FocusArbiter, FocusPolicy};
pub use hub::{FocusClient, FocusHub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    None,
    DuckAllowed,
    Full,
}

/// 系统下发的焦点变化通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequestKind {
    /// 长期独占
    Gain,
    /// 短暂独占（如提示音），原持有者之后会收回焦点
    GainTransient,
    /// 短暂占用，原持有者可以降低音量继续播放
    GainTransientMayDuck,
}

impl FocusRequestKind {
    /// 新请求对原持有者造成的焦点损失
    pub fn loss_for_previous_holder(self) -> FocusChange {
        match self {
            FocusRequestKind::Gain => FocusChange::Loss,
            FocusRequestKind::GainTransient => FocusChange::LossTransient,
            FocusRequestKind::GainTransientMayDuck => FocusChange::LossTransientCanDuck,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGrant {
    Granted,
    Denied,
}

/// 系统焦点仲裁接口；焦点变化以 [`FocusChange`] 异步通知
pub trait FocusSystem: Send {
    fn request(&mut self, kind: FocusRequestKind) -> FocusGrant;

    fn abandon(&mut self);
}
