use crate::pose::FightingPose;

/// トイが提供する格闘アクション
///
/// 実装はToyClient。テストではモックに差し替える。
pub trait FightControl {
    fn toggle_trigger1(&mut self) -> bool;
    fn toggle_trigger2(&mut self) -> bool;
    fn weave_right(&mut self) -> bool;
    fn weave_left(&mut self) -> bool;
    fn guard(&mut self) -> bool;
}

/// 安定化済みポーズをアクチュエータ呼び出しに変換するディスパッチャ
///
/// エッジトリガ: ポーズが変化したフレームでのみ1回だけ発火する。
/// 同じポーズを保持し続けても再送はしない。
pub struct PoseDispatcher {
    last_pose: Option<FightingPose>,
}

impl PoseDispatcher {
    pub fn new() -> Self {
        Self { last_pose: None }
    }

    pub fn last_pose(&self) -> Option<FightingPose> {
        self.last_pose
    }

    /// ポーズ変化時のみ対応アクションを1回呼ぶ
    ///
    /// 戻り値: 発火しなければNone、発火したらアクションの成否。
    /// 失敗してもlast_poseは進める。失敗コマンドは破棄であり、
    /// 次の送信機会は次のポーズ遷移。
    pub fn dispatch<C: FightControl>(
        &mut self,
        pose: FightingPose,
        control: &mut C,
    ) -> Option<bool> {
        if self.last_pose == Some(pose) {
            return None;
        }

        let ok = match pose {
            FightingPose::PunchRight => control.toggle_trigger1(),
            FightingPose::PunchLeft => control.toggle_trigger2(),
            FightingPose::WeaveRight => control.weave_right(),
            FightingPose::WeaveLeft => control.weave_left(),
            FightingPose::Guard => control.guard(),
        };

        self.last_pose = Some(pose);
        Some(ok)
    }

    pub fn reset(&mut self) {
        self.last_pose = None;
    }
}

impl Default for PoseDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
