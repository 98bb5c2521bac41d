use anyhow::Context as _;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::robot::calibration::CalibrationProfile;
use crate::robot::dispatch::FightControl;
use crate::robot::protocol::{Command, ServoKind, ACK, ACK_LEN};
use crate::robot::state::ToyState;

/// トイへの接続状態
///
/// I/O失敗時は必ずDisconnectedへ戻す。ソケットの使い回しはしない。
#[derive(Debug)]
enum Connection {
    Disconnected,
    Connecting,
    Connected(TcpStream),
}

impl Connection {
    fn is_connected(&self) -> bool {
        matches!(self, Connection::Connected(_))
    }
}

/// トイ1台と通信するクライアント
///
/// 接続は遅延確立。コマンド送信時に未接続なら接続から試みる。
/// バックグラウンドでの再接続はせず、次のコマンドが再接続の契機。
pub struct ToyClient {
    addr: String,
    io_timeout: Duration,
    conn: Connection,
    profile: CalibrationProfile,
    state: ToyState,
}

impl ToyClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(addr: impl Into<String>, profile: CalibrationProfile) -> Self {
        Self {
            addr: addr.into(),
            io_timeout: Self::DEFAULT_TIMEOUT,
            conn: Connection::Disconnected,
            state: ToyState::new(&profile),
            profile,
        }
    }

    /// 接続・送受信タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state(&self) -> &ToyState {
        &self.state
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// トイへ接続する
    pub fn connect(&mut self) -> bool {
        self.conn = Connection::Connecting;
        match self.try_connect() {
            Ok(stream) => {
                self.conn = Connection::Connected(stream);
                true
            }
            Err(e) => {
                eprintln!("[toy{}] connection failed: {:#}", self.state.toy_id, e);
                self.conn = Connection::Disconnected;
                false
            }
        }
    }

    fn try_connect(&self) -> anyhow::Result<TcpStream> {
        let addr = self
            .addr
            .to_socket_addrs()?
            .next()
            .context("address did not resolve")?;
        let stream = TcpStream::connect_timeout(&addr, self.io_timeout)?;
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// サーボ1個に角度を送り、ackを待つ
    ///
    /// ackがb"OK"以外、またはI/O失敗なら接続を破棄してfalse。
    /// 呼び出し側へ例外は投げない。
    pub fn set_servo(&mut self, servo: ServoKind, angle: u8) -> bool {
        // 範囲外はワイヤに触れる前に弾く
        let cmd = match Command::new(self.state.toy_id, servo, angle) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("[toy{}] invalid command: {}", self.state.toy_id, e);
                return false;
            }
        };

        if !self.conn.is_connected() && !self.connect() {
            return false;
        }

        match self.exchange(&cmd) {
            Ok(ack) if &ack == ACK => true,
            Ok(ack) => {
                eprintln!("[toy{}] unexpected ack: {:?}", self.state.toy_id, ack);
                self.conn = Connection::Disconnected;
                false
            }
            Err(e) => {
                eprintln!(
                    "[toy{}] failed to set {}: {}",
                    self.state.toy_id,
                    servo.name(),
                    e
                );
                self.conn = Connection::Disconnected;
                false
            }
        }
    }

    fn exchange(&mut self, cmd: &Command) -> std::io::Result<[u8; ACK_LEN]> {
        let stream = match &mut self.conn {
            Connection::Connected(stream) => stream,
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "not connected",
                ))
            }
        };

        stream.write_all(&cmd.encode())?;
        let mut ack = [0u8; ACK_LEN];
        stream.read_exact(&mut ack)?;
        Ok(ack)
    }

    /// 接続を解放する。何度呼んでも安全。
    pub fn close(&mut self) {
        self.conn = Connection::Disconnected;
    }
}

impl FightControl for ToyClient {
    /// トリガー1をneutral⇄activeでトグルする
    ///
    /// 送信先角度は先に計算するが、ToyStateの更新はack成功後。
    fn toggle_trigger1(&mut self) -> bool {
        let next = self.state.next_trigger1(&self.profile);
        let ok = self.set_servo(ServoKind::Trigger1, next);
        if ok {
            self.state.trigger1_pos = next;
        }
        ok
    }

    fn toggle_trigger2(&mut self) -> bool {
        let next = self.state.next_trigger2(&self.profile);
        let ok = self.set_servo(ServoKind::Trigger2, next);
        if ok {
            self.state.trigger2_pos = next;
        }
        ok
    }

    fn weave_right(&mut self) -> bool {
        let angle = self.profile.weave.right;
        let ok = self.set_servo(ServoKind::Weave, angle);
        if ok {
            self.state.weave_pos = angle;
        }
        ok
    }

    fn weave_left(&mut self) -> bool {
        let angle = self.profile.weave.left;
        let ok = self.set_servo(ServoKind::Weave, angle);
        if ok {
            self.state.weave_pos = angle;
        }
        ok
    }

    /// 全サーボをニュートラルへ戻す
    ///
    /// 3サーボは独立に送る。途中で失敗しても残りは試し、
    /// 全成功のときだけtrue。
    fn guard(&mut self) -> bool {
        let t1 = self.set_servo(ServoKind::Trigger1, self.profile.trigger1.neutral);
        if t1 {
            self.state.trigger1_pos = self.profile.trigger1.neutral;
        }
        let t2 = self.set_servo(ServoKind::Trigger2, self.profile.trigger2.neutral);
        if t2 {
            self.state.trigger2_pos = self.profile.trigger2.neutral;
        }
        let w = self.set_servo(ServoKind::Weave, self.profile.weave.neutral);
        if w {
            self.state.weave_pos = self.profile.weave.neutral;
        }
        t1 && t2 && w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{SocketAddr, TcpListener};
    use std::sync::mpsc;
    use std::thread;

    const RECV_WAIT: Duration = Duration::from_secs(1);

    /// 疑似トイサーバ
    ///
    /// 受け取った3バイトコマンドをチャネルへ流し、用意した応答を
    /// 順番に返す。応答が尽きるかクライアントが切断したら次のacceptへ。
    fn spawn_fake_toy(
        responses: Vec<&'static [u8]>,
        accepts: usize,
    ) -> (SocketAddr, mpsc::Receiver<[u8; 3]>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut responses = responses.into_iter();
            for _ in 0..accepts {
                let (mut stream, _) = match listener.accept() {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                loop {
                    let mut buf = [0u8; 3];
                    if stream.read_exact(&mut buf).is_err() {
                        break;
                    }
                    let _ = tx.send(buf);
                    match responses.next() {
                        Some(resp) => {
                            if stream.write_all(resp).is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        });

        (addr, rx)
    }

    fn client_for(addr: SocketAddr, toy_id: u8) -> ToyClient {
        ToyClient::new(addr.to_string(), CalibrationProfile::for_toy(toy_id).unwrap())
            .with_timeout(Duration::from_millis(500))
    }

    #[test]
    fn test_toggle_trigger1_end_to_end() {
        let (addr, rx) = spawn_fake_toy(vec![b"OK", b"OK"], 1);
        let mut client = client_for(addr, 0);

        // 150 → 90
        assert!(client.toggle_trigger1());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 0, 90]);
        assert_eq!(client.state().trigger1_pos, 90);

        // 90 → 150（同一接続のまま、accepts=1なので再接続なら失敗する）
        assert!(client.toggle_trigger1());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 0, 150]);
        assert_eq!(client.state().trigger1_pos, 150);
    }

    #[test]
    fn test_bad_ack_resets_connection_and_state() {
        let (addr, rx) = spawn_fake_toy(vec![b"NG", b"OK"], 2);
        let mut client = client_for(addr, 0);

        assert!(!client.toggle_trigger1());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 0, 90]);
        // 角度は未コミットのまま
        assert_eq!(client.state().trigger1_pos, 150);
        assert!(!client.is_connected());

        // 次の呼び出しで再接続して成功する
        assert!(client.toggle_trigger1());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 0, 90]);
        assert_eq!(client.state().trigger1_pos, 90);
    }

    #[test]
    fn test_weave_absolute_positions() {
        let (addr, rx) = spawn_fake_toy(vec![b"OK", b"OK", b"OK"], 1);
        let mut client = client_for(addr, 0);

        assert!(client.weave_left());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 2, 135]);
        assert_eq!(client.state().weave_pos, 135);

        assert!(client.weave_right());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 2, 45]);

        // トグルではなく絶対指定なので繰り返しても同じ角度
        assert!(client.weave_right());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 2, 45]);
        assert_eq!(client.state().weave_pos, 45);
    }

    #[test]
    fn test_guard_sends_all_neutrals() {
        let (addr, rx) = spawn_fake_toy(vec![b"OK", b"OK", b"OK"], 1);
        let mut client = client_for(addr, 1);

        assert!(client.guard());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [1, 0, 180]);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [1, 1, 20]);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [1, 2, 110]);
    }

    #[test]
    fn test_guard_failures_are_independent() {
        // 2個目のサーボでackが壊れても3個目は送られる
        let (addr, rx) = spawn_fake_toy(vec![b"OK", b"NG", b"OK"], 2);
        let mut client = client_for(addr, 0);

        assert!(!client.guard());
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 0, 150]);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 1, 30]);
        // 再接続してウィーブも試している
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), [0, 2, 90]);
        assert_eq!(client.state().weave_pos, 90);
    }

    #[test]
    fn test_connect_refused() {
        // 一度bindして即closeしたポートは接続拒否になる
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let mut client = client_for(addr, 0);

        assert!(!client.connect());
        assert!(!client.weave_left());
        assert_eq!(client.state().weave_pos, 90);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (addr, _rx) = spawn_fake_toy(vec![b"OK"], 1);
        let mut client = client_for(addr, 0);

        assert!(client.connect());
        client.close();
        assert!(!client.is_connected());
        client.close();
        client.close();
    }

    #[test]
    fn test_rejects_out_of_range_angle_without_io() {
        // 接続先が存在しなくても手元で弾く
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let mut client = client_for(addr, 0);
        assert!(!client.set_servo(ServoKind::Weave, 181));
    }
}
