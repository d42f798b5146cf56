//! # 德州扑克牌桌同步核心库
//!
//! 这个 `core` crate 负责让本地的牌桌视图与远端权威游戏引擎保持同步：
//! 线上信封的编解码、重复消息过滤、快照应用、玩家动作编码，
//! 以及一个牌桌视图独占的连接状态机。
//! 它不做任何 I/O，socket、定时器和渲染都由宿主通过 trait 接入，
//! 因此可以被命令行客户端、浏览器前端等任何上层应用复用。

mod action;
mod config;
mod connection;
mod dedup;
mod dispatch;
mod error;
mod message;
mod reducer;
mod session;
mod state;

pub use action::*;
pub use config::*;
pub use connection::*;
pub use dedup::*;
pub use dispatch::*;
pub use error::*;
pub use message::*;
pub use reducer::apply;
pub use session::*;
pub use state::*;
