use anyhow::Result;
use std::io::{self, Write};
use std::time::Duration;

use kento_controller::config::Config;
use kento_controller::robot::{
    load_calibration, CalibrationSet, FightControl, ServoKind, ToyClient,
};

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);

    let calibration = match &config.toys.calibration_file {
        Some(path) => load_calibration(path)?,
        None => CalibrationSet::default(),
    };

    println!("=== Kento Controller - Toy Test ===");
    println!("トイ0: {}", config.toys.addr0);
    println!("トイ1: {}", config.toys.addr1);
    println!();
    println!("コマンド:");
    println!("  t 0|1         - 操作対象のトイを切替");
    println!("  p1 / p2       - トリガー1/2をトグル");
    println!("  wl / wr       - ウィーブ左/右");
    println!("  g             - ガード（全サーボをニュートラルへ）");
    println!("  s servo angle - サーボを直接設定 (例: s 2 90)");
    println!("  q             - 終了");
    println!();

    let timeout = Duration::from_secs(config.toys.io_timeout_secs);
    let mut clients = [
        ToyClient::new(config.toys.addr0.clone(), calibration.profile_for(0)?)
            .with_timeout(timeout),
        ToyClient::new(config.toys.addr1.clone(), calibration.profile_for(1)?)
            .with_timeout(timeout),
    ];
    let mut active = 0usize;

    loop {
        print!("toy{}> ", active);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        let client = &mut clients[active];
        match parts[0] {
            "t" if parts.len() == 2 => match parts[1] {
                "0" => active = 0,
                "1" => active = 1,
                _ => println!("トイIDは0か1"),
            },
            "p1" => report("trigger1", client.toggle_trigger1(), client.state().trigger1_pos),
            "p2" => report("trigger2", client.toggle_trigger2(), client.state().trigger2_pos),
            "wl" => report("weave", client.weave_left(), client.state().weave_pos),
            "wr" => report("weave", client.weave_right(), client.state().weave_pos),
            "g" => {
                if client.guard() {
                    println!("guard: 全サーボをニュートラルに戻しました");
                } else {
                    println!("guard: 一部送信失敗");
                }
            }
            "s" if parts.len() == 3 => {
                let servo: u8 = parts[1].parse()?;
                let angle: u8 = parts[2].parse()?;
                match ServoKind::from_byte(servo) {
                    Some(kind) => {
                        if client.set_servo(kind, angle) {
                            println!("{} -> {}度", kind.name(), angle);
                        } else {
                            println!("{}: 送信失敗", kind.name());
                        }
                    }
                    None => println!("サーボ種別は0〜2"),
                }
            }
            "q" => break,
            _ => println!("不明なコマンド"),
        }
    }

    for client in &mut clients {
        client.close();
    }
    println!("終了します");
    Ok(())
}

fn report(name: &str, ok: bool, pos: u8) {
    if ok {
        println!("{} -> {}度", name, pos);
    } else {
        println!("{}: 送信失敗", name);
    }
}
