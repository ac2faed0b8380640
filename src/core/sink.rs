//! Output sinks for callouts
//!
//! The engine produces strings; speaking and displaying them belongs to the
//! host. `SpeechQueue` turns a blocking speech engine into a sink that never
//! blocks the caller: utterances are queued to a single worker task and
//! nothing is ever reported back.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::core::error::{Error, Result};

/// Receives callouts to be spoken. Implementations must return immediately.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str);
}

/// Receives callouts to be shown. May be called from any thread.
pub trait DisplaySink: Send + Sync {
    fn display(&self, text: &str);
}

impl<F> SpeechSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn speak(&self, text: &str) {
        self(text)
    }
}

impl<F> DisplaySink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn display(&self, text: &str) {
        self(text)
    }
}

/// Blocking text-to-speech backend
pub trait SpeechEngine: Send + Sync + 'static {
    /// Speak `text`, returning once the utterance has finished
    fn say(&self, text: &str) -> Result<()>;
}

/// Speech engine for hosts without audio: logs what would be spoken
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeechEngine;

impl SpeechEngine for LogSpeechEngine {
    fn say(&self, text: &str) -> Result<()> {
        info!("[Would speak]: {text}");
        Ok(())
    }
}

/// Fire-and-forget speech dispatch onto a dedicated worker task
#[derive(Debug, Clone)]
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl SpeechQueue {
    /// Start the worker on the current tokio runtime.
    ///
    /// Utterances are spoken one at a time in submission order. Once queued an
    /// utterance cannot be cancelled; engine failures are logged and the
    /// worker moves on to the next one.
    pub fn spawn(engine: Arc<dyn SpeechEngine>) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::InvalidInput(format!("speech queue needs a tokio runtime: {e}")))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        handle.spawn(async move {
            while let Some(text) = rx.recv().await {
                let engine = Arc::clone(&engine);
                match tokio::task::spawn_blocking(move || engine.say(&text)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("⚠️  {e}"),
                    Err(e) => warn!("⚠️  Speech engine panicked: {e}"),
                }
            }
            debug!("Speech queue closed");
        });

        Ok(Self { tx })
    }
}

impl SpeechSink for SpeechQueue {
    fn speak(&self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            warn!("Speech worker gone, dropping callout: {text}");
        }
    }
}
