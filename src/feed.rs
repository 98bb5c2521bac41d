//! TCP protocol for ml-model ↔ controller communication.
//!
//! Self-contained: no imports from other kento_controller modules
//! except the shared pose types.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::pose::{FightingPose, KeypointSet};

// --- Message types ---

/// モデル → controller
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ModelMessage {
    /// 1フレーム分のキーポイント。検出なしはkeypoints: None
    KeypointFrame {
        timestamp_us: u64,
        frame_width: u32,
        keypoints: Option<KeypointSet>,
    },
}

/// controller → モデル
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ControllerMessage {
    Ready,
    /// 安定化済みポーズの通知（UI表示用）
    PoseUpdate {
        toy_id: u8,
        pose: FightingPose,
        actuated: bool,
    },
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(64 * 1024) // キーポイントフレームは小さい
        .new_codec();
    Framed::new(stream, codec)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    let data = bincode::serialize(msg)?;
    stream.send(Bytes::from(data)).await?;
    Ok(())
}

/// Receive and deserialize a message.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<T> {
    match stream.next().await {
        Some(Ok(bytes)) => Ok(bincode::deserialize(&bytes)?),
        Some(Err(e)) => Err(e.into()),
        None => Err(anyhow::anyhow!("connection closed")),
    }
}
