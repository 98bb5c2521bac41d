pub mod classifier;
pub mod keypoint;
pub mod smooth;
pub mod zone;

pub use classifier::{FightingPose, PoseClassifier};
pub use keypoint::{Keypoint, KeypointIndex, KeypointSet};
pub use smooth::PoseSmoother;
pub use zone::{Zone, ZoneLayout};
