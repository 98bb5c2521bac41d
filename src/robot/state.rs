use crate::robot::calibration::CalibrationProfile;

/// トイ1台分のサーボ位置
///
/// 1つのToyClientが専有し、ack成功時のみ更新される。つまり
/// 「最後に確認が取れたコマンド」の角度を保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyState {
    pub toy_id: u8,
    pub trigger1_pos: u8,
    pub trigger2_pos: u8,
    pub weave_pos: u8,
}

impl ToyState {
    /// ニュートラル角度で初期化
    pub fn new(profile: &CalibrationProfile) -> Self {
        Self {
            toy_id: profile.toy_id,
            trigger1_pos: profile.trigger1.neutral,
            trigger2_pos: profile.trigger2.neutral,
            weave_pos: profile.weave.neutral,
        }
    }

    /// トリガー1のトグル先角度（neutral ⇄ active）
    pub fn next_trigger1(&self, profile: &CalibrationProfile) -> u8 {
        if self.trigger1_pos == profile.trigger1.neutral {
            profile.trigger1.active
        } else {
            profile.trigger1.neutral
        }
    }

    /// トリガー2のトグル先角度
    pub fn next_trigger2(&self, profile: &CalibrationProfile) -> u8 {
        if self.trigger2_pos == profile.trigger2.neutral {
            profile.trigger2.active
        } else {
            profile.trigger2.neutral
        }
    }
}
