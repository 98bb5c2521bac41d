pub mod calibration;
pub mod client;
pub mod dispatch;
pub mod protocol;
pub mod state;

pub use calibration::{
    load_calibration, save_calibration, CalibrationProfile, CalibrationSet, ServoRange, WeaveRange,
};
pub use client::ToyClient;
pub use dispatch::{FightControl, PoseDispatcher};
pub use protocol::{Command, ServoKind, ACK, ACK_LEN, COMMAND_LEN, MAX_ANGLE};
pub use state::ToyState;
