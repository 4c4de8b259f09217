//! 播放服务与外部协作者之间的消息

pub mod session;
pub mod transport;

pub use session::{NotificationSignal, SessionEvent};
pub use transport::{Extras, TransportCommand};
