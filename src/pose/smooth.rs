use std::collections::VecDeque;

use crate::config::SmoothConfig;
use crate::pose::classifier::FightingPose;

/// ポーズラベルのデバウンスフィルタ
///
/// 直近history_length個の生ラベルをFIFOで保持し、全一致のときだけ
/// 最新値を通す。不一致なら最古値を返して前の安定値を保つ。
/// ポーズ切替にはhistory_lengthフレームの連続一致が必要になる。
pub struct PoseSmoother {
    history: VecDeque<FightingPose>,
    history_length: usize,
}

impl PoseSmoother {
    pub fn new(history_length: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(history_length.max(1)),
            history_length: history_length.max(1),
        }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.history_length)
    }

    /// 生ラベルを1つ取り込み、安定化済みラベルを返す
    ///
    /// 検出なしフレームでは呼ばない。観測なしはポーズではない。
    pub fn apply(&mut self, pose: FightingPose) -> FightingPose {
        self.history.push_back(pose);
        if self.history.len() > self.history_length {
            self.history.pop_front();
        }

        if self.history.iter().all(|p| *p == pose) {
            pose
        } else {
            // 窓は直前のpush_backで必ず非空
            self.history.front().copied().unwrap_or(pose)
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FightingPose::*;

    fn feed(smoother: &mut PoseSmoother, poses: &[FightingPose]) -> Vec<FightingPose> {
        poses.iter().map(|p| smoother.apply(*p)).collect()
    }

    #[test]
    fn test_unanimous_window_passes_newest() {
        let mut s = PoseSmoother::new(3);
        let out = feed(&mut s, &[Guard, Guard, Guard]);
        assert_eq!(out, vec![Guard, Guard, Guard]);
    }

    #[test]
    fn test_single_outlier_holds_oldest() {
        let mut s = PoseSmoother::new(3);
        let out = feed(&mut s, &[Guard, PunchRight, Guard]);
        // 外れ値1フレームでは切り替わらない
        assert_eq!(out, vec![Guard, Guard, Guard]);
    }

    #[test]
    fn test_three_consecutive_switches() {
        let mut s = PoseSmoother::new(3);
        feed(&mut s, &[Guard, Guard, Guard]);
        let out = feed(&mut s, &[PunchRight, PunchRight, PunchRight]);
        // 窓が埋まるまで旧値を保持し、3連続目で切替
        assert_eq!(out, vec![Guard, Guard, PunchRight]);
    }

    #[test]
    fn test_first_frames_pass_through() {
        let mut s = PoseSmoother::new(3);
        assert_eq!(s.apply(WeaveLeft), WeaveLeft);
        assert_eq!(s.apply(WeaveLeft), WeaveLeft);
    }

    #[test]
    fn test_disagreement_in_partial_window() {
        let mut s = PoseSmoother::new(3);
        assert_eq!(s.apply(Guard), Guard);
        assert_eq!(s.apply(WeaveRight), Guard);
    }

    #[test]
    fn test_reset_clears_window() {
        let mut s = PoseSmoother::new(3);
        feed(&mut s, &[Guard, Guard, Guard]);
        s.reset();
        // リセット後は最初の観測がそのまま通る
        assert_eq!(s.apply(PunchLeft), PunchLeft);
    }

    #[test]
    fn test_window_length_one_never_holds() {
        let mut s = PoseSmoother::new(1);
        assert_eq!(s.apply(Guard), Guard);
        assert_eq!(s.apply(PunchRight), PunchRight);
        assert_eq!(s.apply(Guard), Guard);
    }
}
