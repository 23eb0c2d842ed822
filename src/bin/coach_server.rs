//! Coach server: receives webcam frames over WebSocket, runs ONNX pose
//! estimation, and streams per-frame joint-angle feedback back to the client.
//!
//! Each frame arrives as a data-URI base64 text message; each response is a
//! JSON object with the angle, feedback string, and normalized landmarks.

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use form_coach::analyzer::FrameAnalyzer;
use form_coach::config::Config;
use form_coach::pose::{ModelType, OnnxPoseEstimator};
use form_coach::protocol::{self, AnalysisResult};

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

type LogFile = Arc<Mutex<std::io::BufWriter<std::fs::File>>>;

fn open_log_file() -> Result<LogFile> {
    std::fs::create_dir_all("logs")?;
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = format!("logs/coach_{}.log", ts);
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
// Per-connection session
// ---------------------------------------------------------------------------

async fn run_session(
    stream: TcpStream,
    peer: SocketAddr,
    model_type: ModelType,
    config: Arc<Config>,
    logfile: LogFile,
) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut sink, mut reader) = ws.split();

    // One model session per connection: channels never share mutable state.
    let detector = OnnxPoseEstimator::new(
        &config.model_path,
        model_type,
        config.analysis.min_pose_confidence,
    )?;
    let mut analyzer = FrameAnalyzer::new(detector, config.analysis.clone());
    log!(logfile, "[ws] {}: model session ready", peer);

    // Strictly serial: one frame in flight per channel. The next message is
    // only read after the previous response has been sent.
    while let Some(msg) = reader.next().await {
        match msg? {
            Message::Text(text) => {
                let started = Instant::now();
                let (returned, result) = tokio::task::spawn_blocking(move || {
                    let result = match protocol::decode_frame_payload(&text) {
                        Ok(bytes) => analyzer.analyze(&bytes),
                        Err(_) => AnalysisResult::decode_failed(),
                    };
                    (analyzer, result)
                })
                .await?;
                analyzer = returned;

                if config.verbose {
                    let tag = result
                        .error
                        .as_deref()
                        .or(result.feedback.as_deref())
                        .unwrap_or("-");
                    log!(
                        logfile,
                        "[verbose] {}: angle={} {} ({:.1}ms)",
                        peer,
                        result.angle,
                        tag,
                        started.elapsed().as_secs_f64() * 1000.0
                    );
                }

                let json = serde_json::to_string(&result)?;
                sink.send(Message::Text(json)).await?;
            }
            Message::Close(_) => break,
            // Binary frames are not part of the protocol; ping/pong are
            // handled by tungstenite itself.
            _ => {}
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::load_or_default("coach_server.toml"));
    let logfile = open_log_file()?;
    log!(logfile, "Coach Server ({})", env!("GIT_VERSION"));
    log!(
        logfile,
        "[config] listen_addr={} model={} model_path={} verbose={}",
        config.listen_addr,
        config.model,
        config.model_path,
        config.verbose
    );

    // Fail fast on a bad model setup instead of erroring per connection.
    let model_type = ModelType::from_name(&config.model).with_context(|| {
        format!(
            "unknown model '{}' (expected yolov8 | yolo11 | movenet)",
            config.model
        )
    })?;
    if !Path::new(&config.model_path).exists() {
        bail!("model file not found: {}", config.model_path);
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    log!(logfile, "[ws] listening on {}", config.listen_addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        log!(logfile, "[ws] client connected: {}", peer);

        let config = Arc::clone(&config);
        let logfile = Arc::clone(&logfile);
        tokio::spawn(async move {
            match run_session(stream, peer, model_type, config, Arc::clone(&logfile)).await {
                Ok(()) => log!(logfile, "[ws] client disconnected: {}", peer),
                Err(e) => log!(logfile, "[ws] session {} ended: {e:#}", peer),
            }
        });
    }
}
