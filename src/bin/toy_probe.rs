use std::time::Duration;

use kento_controller::config::Config;
use kento_controller::robot::{load_calibration, CalibrationSet, FightControl, ToyClient};

fn main() {
    let config = Config::load_or_default("config.toml");

    let calibration = match &config.toys.calibration_file {
        Some(path) => match load_calibration(path) {
            Ok(set) => set,
            Err(e) => {
                eprintln!("calibration load failed: {e:#}");
                CalibrationSet::default()
            }
        },
        None => CalibrationSet::default(),
    };

    println!("=== トイプローブ ===");
    println!();

    let timeout = Duration::from_secs(config.toys.io_timeout_secs);
    for toy_id in 0..2u8 {
        let addr = config.toys.addr_for(toy_id);
        print!("toy{} ({}): ", toy_id, addr);

        let profile = match calibration.profile_for(toy_id) {
            Ok(p) => p,
            Err(e) => {
                println!("no profile ({e})");
                continue;
            }
        };

        let mut client = ToyClient::new(addr.to_string(), profile).with_timeout(timeout);
        if !client.connect() {
            println!("connect failed");
            continue;
        }
        print!("connected");

        // ガードで全サーボの疎通を確認
        if client.guard() {
            let state = client.state();
            println!(
                ", guard ok (trigger1={} trigger2={} weave={})",
                state.trigger1_pos, state.trigger2_pos, state.weave_pos
            );
        } else {
            println!(", guard FAILED");
        }
        client.close();
    }
}
