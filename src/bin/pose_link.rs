//! Pose link: receives keypoint frames from the ml-model process over TCP
//! and drives one toy robot through the classify → smooth → dispatch pipeline.
//!
//! The ml-model process is the TCP client; this binary is the listener.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use kento_controller::config::Config;
use kento_controller::feed::{self, ControllerMessage, ModelMessage};
use kento_controller::pose::{PoseClassifier, PoseSmoother};
use kento_controller::robot::{
    load_calibration, CalibrationSet, FightControl, PoseDispatcher, ToyClient,
};

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/pose_link_{}.log", ts);
    let file = std::fs::File::create(&path)?;
    eprintln!("Log: {}", path);
    Ok(Arc::new(Mutex::new(std::io::BufWriter::new(file))))
}

macro_rules! log {
    ($logfile:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        eprintln!("{}", msg);
        if let Ok(mut f) = $logfile.lock() {
            let _ = writeln!(f, "{}", msg);
            let _ = f.flush();
        }
    }};
}

// ---------------------------------------------------------------------------
// Frame pipeline
// ---------------------------------------------------------------------------

struct Pipeline {
    classifier: PoseClassifier,
    smoother: PoseSmoother,
    dispatcher: PoseDispatcher,
}

async fn run_session(
    stream: &mut feed::MessageStream,
    pipeline: &mut Pipeline,
    toy: &mut ToyClient,
    toy_id: u8,
    force_guard: &AtomicBool,
    verbose: bool,
    logfile: &LogFile,
) -> Result<()> {
    let mut frame_count = 0u32;
    let mut detected_count = 0u32;
    let mut fps_timer = Instant::now();

    loop {
        let msg: ModelMessage = feed::recv_message(stream).await?;

        // 手動/シグナルによるガード要求
        if force_guard.swap(false, Ordering::Relaxed) {
            let ok = toy.guard();
            pipeline.dispatcher.reset();
            log!(logfile, "[guard] forced reset: {}", if ok { "ok" } else { "failed" });
        }

        let ModelMessage::KeypointFrame {
            frame_width,
            keypoints,
            ..
        } = msg;
        frame_count += 1;

        // 検出なしフレームは観測なし。平滑化窓は進めない。
        if let Some(keys) = keypoints {
            detected_count += 1;
            let raw = pipeline.classifier.classify(frame_width, &keys);
            let stable = pipeline.smoother.apply(raw);

            if verbose {
                log!(logfile, "[pose] raw={} stable={}", raw.label(), stable.label());
            }

            if let Some(actuated) = pipeline.dispatcher.dispatch(stable, toy) {
                log!(
                    logfile,
                    "[pose] {} -> {}",
                    stable.label(),
                    if actuated { "ok" } else { "send failed" }
                );
                let update = ControllerMessage::PoseUpdate {
                    toy_id,
                    pose: stable,
                    actuated,
                };
                feed::send_message(stream, &update).await?;
            }
        }

        // 統計（1秒に1回）
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            log!(
                logfile,
                "FPS: {:.1} (detected: {})",
                frame_count as f32 / elapsed,
                detected_count
            );
            frame_count = 0;
            detected_count = 0;
            fps_timer = Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_default("config.toml");
    let logfile = open_log_file()?;

    log!(logfile, "Pose Link ({})", env!("GIT_VERSION"));
    log!(logfile, "Listen: {}", config.link.listen_addr);
    log!(
        logfile,
        "Toy {}: {}",
        config.link.toy_id,
        config.toys.addr_for(config.link.toy_id)
    );
    log!(
        logfile,
        "Zone: center={} buffer={}",
        config.zone.center_fraction,
        config.zone.buffer_fraction
    );
    log!(logfile, "Smooth: history={}", config.smooth.history_length);

    let calibration = match &config.toys.calibration_file {
        Some(path) => {
            let set = load_calibration(path)?;
            log!(logfile, "Calibration: {}", path);
            set
        }
        None => CalibrationSet::default(),
    };

    let toy_id = config.link.toy_id;
    let timeout = Duration::from_secs(config.toys.io_timeout_secs);
    let mut toy = ToyClient::new(
        config.toys.addr_for(toy_id).to_string(),
        calibration.profile_for(toy_id)?,
    )
    .with_timeout(timeout);

    // 起動時に既知の姿勢へ戻しておく
    if toy.guard() {
        log!(logfile, "Initial guard ok");
    } else {
        log!(logfile, "Toy unreachable at startup (will retry on demand)");
    }

    // SIGUSR1 → 強制ガード
    let force_guard = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&force_guard))?;

    // コンソール入力スレッド: 'g' + Enter → 強制ガード
    {
        let flag = Arc::clone(&force_guard);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                if stdin.read_line(&mut line).is_ok() && line.trim() == "g" {
                    eprintln!("[input] guard triggered");
                    flag.store(true, Ordering::Relaxed);
                }
            }
        });
    }

    let mut pipeline = Pipeline {
        classifier: PoseClassifier::from_config(&config.zone),
        smoother: PoseSmoother::from_config(&config.smooth),
        dispatcher: PoseDispatcher::new(),
    };

    let bind_addr: std::net::SocketAddr = config
        .link
        .listen_addr
        .parse()
        .context("invalid listen_addr")?;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log!(logfile, "Listening on {}", bind_addr);
    log!(logfile, "Press 'g' + Enter (or SIGUSR1) to force guard");
    log!(logfile, "");

    loop {
        let (tcp, addr) = listener.accept().await?;
        tcp.set_nodelay(true)?;
        log!(logfile, "Model connected: {}", addr);

        let mut stream = feed::message_stream(tcp);
        if let Err(e) = feed::send_message(&mut stream, &ControllerMessage::Ready).await {
            log!(logfile, "[session] handshake failed: {e:#}");
            continue;
        }

        if let Err(e) = run_session(
            &mut stream,
            &mut pipeline,
            &mut toy,
            toy_id,
            &force_guard,
            config.link.verbose,
            &logfile,
        )
        .await
        {
            log!(logfile, "[session] ended: {e:#}");
        }

        // ストリームが切れたら平滑化窓と前回ポーズは持ち越さない
        pipeline.smoother.reset();
        pipeline.dispatcher.reset();
        log!(logfile, "Waiting for model to reconnect...");
    }
}
