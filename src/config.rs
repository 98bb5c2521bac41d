use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub zone: ZoneConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub toys: ToysConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZoneConfig {
    /// 中央ゾーンが画面幅に占める割合
    #[serde(default = "default_center_fraction")]
    pub center_fraction: f32,
    /// デッドゾーン幅の割合（0で無効）
    #[serde(default = "default_buffer_fraction")]
    pub buffer_fraction: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothConfig {
    /// ポーズ確定に必要な連続フレーム数
    #[serde(default = "default_history_length")]
    pub history_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// ml-modelプロセスからの接続を待ち受けるアドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// このリンクが駆動するトイID (0 or 1)
    #[serde(default)]
    pub toy_id: u8,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToysConfig {
    /// トイ0のアドレス
    #[serde(default = "default_addr0")]
    pub addr0: String,
    /// トイ1のアドレス
    #[serde(default = "default_addr1")]
    pub addr1: String,
    /// 接続・送受信タイムアウト（秒）
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    /// キャリブレーションJSONのパス（省略時は組み込み値）
    #[serde(default)]
    pub calibration_file: Option<String>,
}

fn default_center_fraction() -> f32 { 0.36 }
fn default_buffer_fraction() -> f32 { 0.0 }
fn default_history_length() -> usize { 3 }
fn default_listen_addr() -> String { "127.0.0.1:8700".to_string() }
fn default_addr0() -> String { "192.168.4.1:8080".to_string() }
fn default_addr1() -> String { "192.168.4.2:8080".to_string() }
fn default_io_timeout_secs() -> u64 { 5 }

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            center_fraction: default_center_fraction(),
            buffer_fraction: default_buffer_fraction(),
        }
    }
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            history_length: default_history_length(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            toy_id: 0,
            verbose: false,
        }
    }
}

impl Default for ToysConfig {
    fn default() -> Self {
        Self {
            addr0: default_addr0(),
            addr1: default_addr1(),
            io_timeout_secs: default_io_timeout_secs(),
            calibration_file: None,
        }
    }
}

impl ToysConfig {
    /// トイIDに対応するアドレス
    pub fn addr_for(&self, toy_id: u8) -> &str {
        if toy_id == 0 {
            &self.addr0
        } else {
            &self.addr1
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読めなければデフォルト設定で続行
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("config load failed ({}), using defaults", e);
                Config::default()
            }
        }
    }
}
