//! # 德州扑克牌桌同步客户端
//!
//! 基于 tokio 与 tokio-tungstenite 的宿主：负责真实的 socket、定时器与终端输入输出，
//! 协议逻辑全部交给 `holdem_view_core` 的连接管理器。

pub mod cli;
pub mod command;
pub mod console;
pub mod driver;
pub mod session_file;
pub mod transport;

use holdem_view_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}
