//! Position feed for the CLI
//!
//! Reads one JSON object per line (`{"lat": 52.28, "lon": -1.54}`) from a
//! file or stdin and forwards each fix to the navigation controller.

use std::path::PathBuf;

use log::{debug, warn};
use rally_copilot::PositionUpdate;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffer between the reader and the controller
pub const FEED_CHANNEL_CAPACITY: usize = 64;

/// Parse a single feed line; `None` for blank lines and comments
pub fn parse_line(line: &str) -> Option<Result<PositionUpdate, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Forward every parsable line of `reader` into `tx`, returning how many were sent
pub async fn forward_lines<R>(reader: R, tx: mpsc::Sender<PositionUpdate>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut sent = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            None => continue,
            Some(Ok(update)) => {
                if tx.send(update).await.is_err() {
                    debug!("Navigation driver gone, stopping feed at line {line_no}");
                    break;
                }
                sent += 1;
            }
            Some(Err(e)) => warn!("⚠️  Skipping feed line {line_no}: {e}"),
        }
    }

    Ok(sent)
}

/// Spawn the feed reader; `-` reads stdin
///
/// Returns the receiving end for `PositionSource::Live` together with the
/// reader task. The channel closes when the input is exhausted.
pub fn spawn_position_feed(
    path: PathBuf,
) -> (
    mpsc::Receiver<PositionUpdate>,
    JoinHandle<std::io::Result<usize>>,
) {
    let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        if path.as_os_str() == "-" {
            forward_lines(BufReader::new(tokio::io::stdin()), tx).await
        } else {
            let file = tokio::fs::File::open(&path).await?;
            forward_lines(BufReader::new(file), tx).await
        }
    });

    (rx, task)
}
