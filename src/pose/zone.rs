/// 画面を左右に三分割したゾーン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Left,
    Center,
    Right,
}

/// ゾーン境界レイアウト
///
/// 中央ゾーンがframe_widthのcenter_fraction分を占め、残りを左右が
/// 等分する。境界は幅が決まった時点で一度だけ計算する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneLayout {
    frame_width: u32,
    left_boundary: u32,
    right_boundary: u32,
    buffer: u32,
}

impl ZoneLayout {
    pub fn new(frame_width: u32, center_fraction: f32, buffer_fraction: f32) -> Self {
        let middle_zone_width = (frame_width as f32 * center_fraction) as u32;
        let side_zone_width = (frame_width - middle_zone_width) / 2;

        Self {
            frame_width,
            left_boundary: side_zone_width,
            right_boundary: frame_width - side_zone_width,
            buffer: (frame_width as f32 * buffer_fraction) as u32,
        }
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn left_boundary(&self) -> u32 {
        self.left_boundary
    }

    pub fn right_boundary(&self) -> u32 {
        self.right_boundary
    }

    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    /// X座標のゾーン判定
    ///
    /// デッドゾーン（境界±buffer）内はNone。buffer=0ではNoneは出ない。
    pub fn classify(&self, x: f32) -> Option<Zone> {
        let left = self.left_boundary as f32;
        let right = self.right_boundary as f32;
        let buffer = self.buffer as f32;

        if x < left - buffer {
            Some(Zone::Left)
        } else if x > right + buffer {
            Some(Zone::Right)
        } else if x >= left + buffer && x <= right - buffer {
            Some(Zone::Center)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_within_frame() {
        for width in [1u32, 2, 100, 320, 640, 1280, 1920, 4096] {
            let layout = ZoneLayout::new(width, 0.36, 0.0);
            assert!(layout.left_boundary() <= layout.right_boundary(), "width={}", width);
            assert!(layout.right_boundary() <= width, "width={}", width);
        }
    }

    #[test]
    fn test_layout_640() {
        // 640 * 0.36 = 230, side = (640 - 230) / 2 = 205
        let layout = ZoneLayout::new(640, 0.36, 0.0);
        assert_eq!(layout.left_boundary(), 205);
        assert_eq!(layout.right_boundary(), 435);
        assert_eq!(layout.buffer(), 0);
    }

    #[test]
    fn test_classify_partitions_axis() {
        let layout = ZoneLayout::new(640, 0.36, 0.0);
        assert_eq!(layout.classify(0.0), Some(Zone::Left));
        assert_eq!(layout.classify(100.0), Some(Zone::Left));
        assert_eq!(layout.classify(204.9), Some(Zone::Left));
        assert_eq!(layout.classify(205.0), Some(Zone::Center));
        assert_eq!(layout.classify(320.0), Some(Zone::Center));
        assert_eq!(layout.classify(435.0), Some(Zone::Center));
        assert_eq!(layout.classify(435.1), Some(Zone::Right));
        assert_eq!(layout.classify(639.0), Some(Zone::Right));
    }

    #[test]
    fn test_classify_buffer_zero_never_none() {
        let layout = ZoneLayout::new(640, 0.36, 0.0);
        for x in 0..640 {
            assert!(layout.classify(x as f32).is_some(), "x={}", x);
        }
    }

    #[test]
    fn test_classify_buffer_dead_zone() {
        // buffer = 640 * 0.05 = 32
        let layout = ZoneLayout::new(640, 0.36, 0.05);
        assert_eq!(layout.buffer(), 32);
        // 左境界205の手前側・奥側バッファ内はNone
        assert_eq!(layout.classify(180.0), None);
        assert_eq!(layout.classify(220.0), None);
        assert_eq!(layout.classify(205.0 - 33.0), Some(Zone::Left));
        assert_eq!(layout.classify(205.0 + 32.0), Some(Zone::Center));
        // 右境界435も同様
        assert_eq!(layout.classify(440.0), None);
        assert_eq!(layout.classify(435.0 + 33.0), Some(Zone::Right));
        assert_eq!(layout.classify(435.0 - 32.0), Some(Zone::Center));
    }
}
