use crate::error::ParseError;
use crate::state::{TableState, BOARD_SLOTS, UNKNOWN_CARD};
use tracing::warn;

/// 把一份快照应用到当前牌桌状态上，返回新的状态。
///
/// - `previous` 不会被修改；解析失败时调用方手里的状态保持原样。
/// - 公共牌补齐到 5 个槽位，未翻开的位置为 [`UNKNOWN_CARD`]。
pub fn apply(previous: &TableState, incoming: &str) -> Result<TableState, ParseError> {
    let mut next: TableState = serde_json::from_str(incoming)?;
    pad_board(&mut next.community_cards);

    // 引擎是权威方，只在一手牌中途公共牌变少时提示
    let (before, after) = (previous.revealed_cards(), next.revealed_cards());
    if after < before && after != 0 {
        warn!("公共牌数量从 {} 减少到 {}，但没有收到新一局的信号", before, after);
    }

    Ok(next)
}

fn pad_board(cards: &mut Vec<String>) {
    if cards.len() > BOARD_SLOTS {
        warn!("公共牌超过 {} 张，多余的被截断: {:?}", BOARD_SLOTS, cards);
        cards.truncate(BOARD_SLOTS);
    }
    cards.resize(BOARD_SLOTS, UNKNOWN_CARD.to_string());
}
