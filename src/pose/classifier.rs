use serde::{Deserialize, Serialize};

use crate::config::ZoneConfig;
use crate::pose::keypoint::{KeypointIndex, KeypointSet};
use crate::pose::zone::{Zone, ZoneLayout};

/// 格闘ポーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightingPose {
    Guard,
    WeaveRight,
    WeaveLeft,
    PunchRight,
    PunchLeft,
}

impl FightingPose {
    /// 表示・ログ用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::WeaveRight => "weave_right",
            Self::WeaveLeft => "weave_left",
            Self::PunchRight => "punch_right",
            Self::PunchLeft => "punch_left",
        }
    }
}

/// ゾーン占有からポーズラベルを決める分類器
///
/// ZoneLayoutは最初のフレーム幅で構築し、幅が変わらない限り使い回す。
pub struct PoseClassifier {
    center_fraction: f32,
    buffer_fraction: f32,
    layout: Option<ZoneLayout>,
}

impl PoseClassifier {
    pub fn new(center_fraction: f32, buffer_fraction: f32) -> Self {
        Self {
            center_fraction,
            buffer_fraction,
            layout: None,
        }
    }

    pub fn from_config(config: &ZoneConfig) -> Self {
        Self::new(config.center_fraction, config.buffer_fraction)
    }

    pub fn layout(&self) -> Option<&ZoneLayout> {
        self.layout.as_ref()
    }

    fn layout_for(&mut self, frame_width: u32) -> ZoneLayout {
        match self.layout {
            Some(layout) if layout.frame_width() == frame_width => layout,
            _ => {
                let layout =
                    ZoneLayout::new(frame_width, self.center_fraction, self.buffer_fraction);
                self.layout = Some(layout);
                layout
            }
        }
    }

    /// 1フレーム分のキーポイントをポーズに分類する
    ///
    /// パンチ判定がウィーブ判定より先。頭が流れたままの速いパンチを
    /// ウィーブと誤認しないため、この順序は固定。
    pub fn classify(&mut self, frame_width: u32, keys: &KeypointSet) -> FightingPose {
        let layout = self.layout_for(frame_width);

        let nose = keys.get(KeypointIndex::Nose);
        let left_eye = keys.get(KeypointIndex::LeftEye);
        let right_eye = keys.get(KeypointIndex::RightEye);
        let face_x = (nose.x + left_eye.x + right_eye.x) / 3.0;

        let face_zone = layout.classify(face_x);
        let left_hand_zone = layout.classify(keys.get(KeypointIndex::LeftWrist).x);
        let right_hand_zone = layout.classify(keys.get(KeypointIndex::RightWrist).x);

        // 逆側ゾーンに入った手首はパンチ
        if left_hand_zone == Some(Zone::Right) {
            return FightingPose::PunchRight;
        }
        if right_hand_zone == Some(Zone::Left) {
            return FightingPose::PunchLeft;
        }

        match face_zone {
            Some(Zone::Left) => FightingPose::WeaveLeft,
            Some(Zone::Right) => FightingPose::WeaveRight,
            _ => FightingPose::Guard,
        }
    }
}
