use crate::driver::Command;
use holdem_view_core::{parse_amount, ActionError, ActionKind};
use thiserror::Error;

pub const HELP: &str = "\
可用命令:
  fold                      - 弃牌
  check                     - 过牌
  call                      - 跟注
  raise <金额>              - 加注
  exit                      - 退出";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("用法: raise <金额>")]
    MissingAmount,
    #[error(transparent)]
    Amount(#[from] ActionError),
    #[error("未知命令: {0}")]
    Unknown(String),
}

/// 解析一行用户输入，空行返回 `None`
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let command = match parts.first().copied() {
        None => return Ok(None),
        Some("exit") | Some("quit") => Command::Quit,
        Some("raise") => {
            let amount = parts.get(1).ok_or(CommandError::MissingAmount)?;
            Command::Act { kind: ActionKind::Raise, amount: Some(parse_amount(amount)?) }
        }
        Some(name) => match ActionKind::from_name(name) {
            Some(kind) if kind != ActionKind::None => Command::Act { kind, amount: None },
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        },
    };
    Ok(Some(command))
}
