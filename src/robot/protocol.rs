//! Wire protocol to the toy's ESP32 module.
//!
//! Self-contained: no imports from other kento_controller modules.

use anyhow::{bail, Result};

/// 期待するack
pub const ACK: &[u8; 2] = b"OK";
/// ackの固定長
pub const ACK_LEN: usize = 2;
/// サーボ角度の上限
pub const MAX_ANGLE: u8 = 180;
/// コマンドの固定長
pub const COMMAND_LEN: usize = 3;

/// サーボ種別（ワイヤ上の値に対応）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServoKind {
    Trigger1 = 0,
    Trigger2 = 1,
    Weave = 2,
}

impl ServoKind {
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Trigger1),
            1 => Some(Self::Trigger2),
            2 => Some(Self::Weave),
            _ => None,
        }
    }

    /// 表示・ログ用ラベル
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trigger1 => "Trigger1",
            Self::Trigger2 => "Trigger2",
            Self::Weave => "Weave",
        }
    }
}

/// 3バイト固定長のサーボコマンド
///
/// ワイヤ順: (toy_id, servo_type, angle)。フレーミングも
/// シーケンス番号もない。1接続につき同時1コマンドのみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub toy_id: u8,
    pub servo: ServoKind,
    pub angle: u8,
}

impl Command {
    pub fn new(toy_id: u8, servo: ServoKind, angle: u8) -> Result<Self> {
        if toy_id > 1 {
            bail!("toy_id out of range: {}", toy_id);
        }
        if angle > MAX_ANGLE {
            bail!("angle out of range: {}", angle);
        }
        Ok(Self { toy_id, servo, angle })
    }

    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        [self.toy_id, self.servo.as_byte(), self.angle]
    }

    pub fn decode(bytes: &[u8; COMMAND_LEN]) -> Result<Self> {
        let servo = match ServoKind::from_byte(bytes[1]) {
            Some(s) => s,
            None => bail!("unknown servo type: {}", bytes[1]),
        };
        Self::new(bytes[0], servo, bytes[2])
    }
}
