use thiserror::Error;

/// 外层信封解码失败：原始字符串不是合法 JSON，或缺少 `type` 字段。
/// 处理方式：记录日志、丢弃该消息、状态不变。
#[derive(Debug, Error)]
#[error("信封解码失败: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// 外层信封正常，但内层负载形状不符。
/// 处理方式：记录日志、状态不变。
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("负载 JSON 不符合预期结构: {0}")]
    Json(#[from] serde_json::Error),
    /// `end` 消息应为 `winnerIndex:winnerRank`
    #[error("无法解析结束消息: {0:?}")]
    GameResult(String),
}

/// 传输层（socket）错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("无法建立连接: {0}")]
    Open(String),
    #[error("发送失败: {0}")]
    Send(String),
    #[error("连接异常: {0}")]
    Socket(String),
    #[error("当前没有可用的连接")]
    NotConnected,
}

/// 用户动作在编码前的校验失败，不会发送到线上。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("加注必须提供金额")]
    MissingAmount,
    #[error("无效的金额: {0:?}")]
    InvalidAmount(String),
    #[error("动作 {0} 不能发送")]
    NotSendable(&'static str),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无效的 API 地址: {0}")]
    Url(#[from] url::ParseError),
    #[error("API 地址缺少主机名: {0}")]
    MissingHost(String),
    #[error("去重窗口只能是 1 或 2，收到 {0}")]
    DedupDepth(u8),
}
