use crate::error::{DecodeError, ParseError};
use crate::state::ActionKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- 线上信封 ---
// 外层 `{type, data}` 只负责路由，`data` 通常又是一段 JSON 字符串，
// 由知道其结构的处理器自己解析。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    // 引擎 (Go) 的零值是空字符串
    #[serde(default)]
    pub data: String,
}

/// 消息类型。未知类型会原样保留，交给默认处理器报告。
/// 相等与哈希都按线上名称比较，`Unknown("state")` 与 `State` 视为同一类型。
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// 服务器 -> 客户端：牌桌快照
    State,
    /// 服务器 -> 客户端：引擎拒绝了动作等错误
    Error,
    /// 服务器 -> 客户端：可选动作或输入提示
    Input,
    /// 客户端 -> 服务器：玩家动作
    Action,
    Status,
    Players,
    /// 新的一局开始
    Start,
    /// 一局结束，`winnerIndex:winnerRank`
    End,
    Unknown(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::State => "state",
            MessageKind::Error => "error",
            MessageKind::Input => "input",
            MessageKind::Action => "action",
            MessageKind::Status => "status",
            MessageKind::Players => "players",
            MessageKind::Start => "start",
            MessageKind::End => "end",
            MessageKind::Unknown(raw) => raw,
        }
    }
}

impl From<String> for MessageKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "state" => MessageKind::State,
            "error" => MessageKind::Error,
            "input" => MessageKind::Input,
            "action" => MessageKind::Action,
            "status" => MessageKind::Status,
            "players" => MessageKind::Players,
            "start" => MessageKind::Start,
            "end" => MessageKind::End,
            _ => MessageKind::Unknown(raw),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl PartialEq for MessageKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for MessageKind {}

impl std::hash::Hash for MessageKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Envelope {
    pub fn new(kind: MessageKind, data: impl Into<String>) -> Self {
        // 把携带已知名称的 `Unknown` 归一化
        let kind = MessageKind::from(String::from(kind));
        Envelope { kind, data: data.into() }
    }

    /// 解码一条原始消息
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 编码为线上格式。
    /// 键的顺序固定为 `type` 在前、`data` 在后，引擎端按字节比对。
    pub fn encode(&self) -> String {
        encode_pair(self.kind.as_str(), &self.data)
    }
}

/// 线上所有 `{type, data}` 结构（包括 `action` 的内层负载）共用的编码
pub(crate) fn encode_pair(kind: &str, data: &str) -> String {
    format!(r#"{{"type":{},"data":{}}}"#, Value::from(kind), Value::from(data))
}

/// 一次投递可能包含多条以换行分隔的信封，逐条独立解码
pub fn decode_batch(raw: &str) -> impl Iterator<Item = (&str, Result<Envelope, DecodeError>)> {
    split_batch(raw).map(|line| (line, Envelope::decode(line)))
}

/// 按换行拆分，忽略空行
pub fn split_batch(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

// --- 内层负载 ---

/// `input` 消息：可选动作列表（冒号分隔），或旧版本引擎的自由文本提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPrompt {
    Actions(Vec<ActionKind>),
    Text(String),
}

impl InputPrompt {
    pub fn parse(data: &str) -> Self {
        let actions: Option<Vec<ActionKind>> = data
            .split(':')
            .map(|name| ActionKind::from_name(name.trim()))
            .collect();
        match actions {
            Some(actions) if !data.trim().is_empty() => InputPrompt::Actions(actions),
            _ => InputPrompt::Text(data.to_string()),
        }
    }
}

/// `end` 消息：获胜者座位与牌型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Option<usize>,
    pub rank: String,
}

impl GameResult {
    pub fn parse(data: &str) -> Result<Self, ParseError> {
        let (index, rank) = data
            .split_once(':')
            .ok_or_else(|| ParseError::GameResult(data.to_string()))?;
        let index: i64 = index
            .trim()
            .parse()
            .map_err(|_| ParseError::GameResult(data.to_string()))?;
        Ok(GameResult {
            // 与快照一致，-1 表示没有获胜者
            winner: usize::try_from(index).ok(),
            rank: rank.to_string(),
        })
    }
}

/// `players` 消息：冒号分隔的玩家名
pub fn parse_player_names(data: &str) -> Vec<String> {
    data.split(':')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
