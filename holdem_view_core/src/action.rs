use crate::error::ActionError;
use crate::message::{encode_pair, Envelope, MessageKind};
use crate::state::ActionKind;

/// 将一个玩家动作编码为发往引擎的信封。
///
/// 外层 `{type: "action", data: <内层 JSON 字符串>}`，内层同样是 `{type, data}`，
/// 引擎按这个双层结构解码，不能改变。
pub fn encode_action(kind: ActionKind, amount: Option<u32>) -> Result<Envelope, ActionError> {
    let data = match kind {
        ActionKind::None => return Err(ActionError::NotSendable(kind.as_str())),
        ActionKind::Raise => amount.ok_or(ActionError::MissingAmount)?.to_string(),
        ActionKind::Fold | ActionKind::Call | ActionKind::Check => String::new(),
    };
    // 加注金额以字符串形式放在内层 `data` 中
    Ok(Envelope::new(MessageKind::Action, encode_pair(kind.as_str(), &data)))
}

/// 解析用户输入的加注金额
pub fn parse_amount(input: &str) -> Result<u32, ActionError> {
    input
        .trim()
        .parse()
        .map_err(|_| ActionError::InvalidAmount(input.to_string()))
}
