use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 公共牌的固定槽位数。未翻开的位置用 [`UNKNOWN_CARD`] 占位。
pub const BOARD_SLOTS: usize = 5;
/// 未知/未翻开的牌
pub const UNKNOWN_CARD: &str = "";

/// 引擎推送的牌桌快照。
/// 线上字段名沿用引擎的 PascalCase 命名。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableState {
    pub active_bet: u32,
    pub pot: u32,
    #[serde(default)]
    pub round: Round,
    // -1 表示当前没有行动者
    #[serde(with = "seat_index")]
    pub current_player: Option<usize>,
    // 引擎在发牌前会发送 null
    #[serde(default, deserialize_with = "null_as_empty")]
    pub community_cards: Vec<String>,
    pub players: Vec<Player>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub best_hand: Option<Vec<String>>,
    #[serde(default)]
    pub best_rank: String,
    #[serde(default, alias = "Winner")]
    pub game_winner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub action: ActionKind,
    pub assets: u32,
    pub bet: u32,
    /// 只有自己的座位会带两张底牌，其他玩家为空
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hole_cards: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Round {
    // 开局前引擎会发送空字符串
    #[default]
    #[serde(rename = "preflop", alias = "")]
    PreFlop,
    #[serde(rename = "flop")]
    Flop,
    #[serde(rename = "turn")]
    Turn,
    #[serde(rename = "river")]
    River,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    #[default]
    #[serde(alias = "")]
    None,
    Fold,
    Call,
    Raise,
    Check,
}

// --- TableState 的实现方法 ---

impl TableState {
    /// 已翻开的公共牌数量（不计占位符）
    pub fn revealed_cards(&self) -> usize {
        self.community_cards
            .iter()
            .filter(|c| c.as_str() != UNKNOWN_CARD)
            .count()
    }

    /// 本地玩家的座位：第一个带有底牌的玩家。
    /// 没有找到时说明是观战或尚未发牌。
    pub fn my_seat(&self) -> Option<usize> {
        self.players.iter().position(|p| !p.hole_cards.is_empty())
    }

    /// 按名字匹配获胜者的座位
    pub fn winner_index(&self) -> Option<usize> {
        if self.game_winner.is_empty() {
            return None;
        }
        self.players.iter().position(|p| p.name == self.game_winner)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player.and_then(|idx| self.players.get(idx))
    }
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::None => "none",
            ActionKind::Fold => "fold",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
            ActionKind::Check => "check",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(ActionKind::None),
            "fold" => Some(ActionKind::Fold),
            "call" => Some(ActionKind::Call),
            "raise" => Some(ActionKind::Raise),
            "check" => Some(ActionKind::Check),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 引擎用 -1 表示“没有座位”，这里映射为 `None`
mod seat_index {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(idx) => serializer.serialize_i64(*idx as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}
