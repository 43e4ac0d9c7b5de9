//! Background thread driving an [`Engine`].
//!
//! ## Design
//!
//! - One thread owns the engine; callers talk to it over an mpsc channel
//! - The debounce timer is the `recv_timeout` of that channel
//! - Commands already queued are drained and coalesced before each run
//! - The latest state is mirrored into a shared snapshot behind an `RwLock`

use super::engine::{Authority, Engine, SyncState};
use crate::models::{Document, DocumentEdit};
use crate::validator::ValidationError;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

/// Command sent to the worker thread.
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Text edit from the text view
    TextChanged(String),
    /// New document from the structural view
    StructureChanged(Document),
    /// Single structural edit
    Edit(DocumentEdit),
    /// Leave the error state
    ClearError,
    /// Run the pending pipeline now
    ForceSync,
    /// Stop the worker
    Shutdown,
}

/// Copy of the engine's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Engine state
    pub state: SyncState,
    /// Last published document
    pub document: Document,
    /// Current text
    pub text: String,
    /// Diagnostics of the last successful parse
    pub diagnostics: Vec<ValidationError>,
    /// View that made the last edit
    pub authority: Authority,
    /// Publication counter
    pub revision: u64,
    /// A text edit is waiting for its debounce
    pub pending: bool,
}

impl SyncSnapshot {
    fn capture(engine: &Engine) -> Self {
        Self {
            state: engine.current_state().clone(),
            document: engine.current_document().clone(),
            text: engine.current_text().to_string(),
            diagnostics: engine.current_diagnostics().to_vec(),
            authority: engine.authority(),
            revision: engine.revision(),
            pending: engine.has_pending_edit(),
        }
    }
}

/// Handle to an engine running on its own thread.
///
/// Dropping the handle stops the thread.
pub struct SyncWorker {
    command_tx: mpsc::Sender<SyncCommand>,
    snapshot: Arc<RwLock<SyncSnapshot>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Moves `engine` onto a new worker thread.
    ///
    /// Subscribe to the engine before spawning to receive its events.
    #[must_use]
    pub fn spawn(engine: Engine) -> Self {
        let (tx, rx) = mpsc::channel::<SyncCommand>();
        let snapshot = Arc::new(RwLock::new(SyncSnapshot::capture(&engine)));
        let shared = Arc::clone(&snapshot);

        let handle = thread::spawn(move || run(engine, &rx, &shared));

        Self {
            command_tx: tx,
            snapshot,
            handle: Some(handle),
        }
    }

    /// Sends a command; returns false if the worker has stopped.
    pub fn send(&self, command: SyncCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// Reports a text edit.
    pub fn text_changed(&self, text: impl Into<String>) -> bool {
        self.send(SyncCommand::TextChanged(text.into()))
    }

    /// Reports a new document from the structural view.
    pub fn structure_changed(&self, document: Document) -> bool {
        self.send(SyncCommand::StructureChanged(document))
    }

    /// Requests a structural edit.
    ///
    /// Returns true once queued; a rejected edit is reported to subscribers
    /// as [`crate::sync::SyncEvent::EditRejected`].
    pub fn apply_edit(&self, edit: DocumentEdit) -> bool {
        self.send(SyncCommand::Edit(edit))
    }

    /// Requests leaving the error state.
    pub fn clear_error(&self) -> bool {
        self.send(SyncCommand::ClearError)
    }

    /// Requests an immediate pipeline run.
    pub fn force_sync(&self) -> bool {
        self.send(SyncCommand::ForceSync)
    }

    /// Latest snapshot of the engine.
    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops the worker and waits for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("sync worker thread panicked");
            }
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut engine: Engine, rx: &mpsc::Receiver<SyncCommand>, shared: &RwLock<SyncSnapshot>) {
    tracing::debug!("sync worker started");

    loop {
        let first = match engine.time_until_deadline() {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        let batch = coalesce(first.into_iter().chain(rx.try_iter()).collect());
        let mut stop = false;
        for command in batch {
            if matches!(command, SyncCommand::Shutdown) {
                stop = true;
                break;
            }
            handle(&mut engine, command);
        }

        engine.poll();
        *shared.write().unwrap_or_else(PoisonError::into_inner) = SyncSnapshot::capture(&engine);

        if stop {
            break;
        }
    }

    tracing::debug!("sync worker stopped");
}

fn handle(engine: &mut Engine, command: SyncCommand) {
    match command {
        SyncCommand::TextChanged(text) => engine.on_text_changed(text),
        SyncCommand::StructureChanged(document) => engine.on_structure_changed(document),
        SyncCommand::Edit(edit) => {
            if let Err(e) = engine.apply_edit(edit) {
                tracing::warn!("structural edit rejected: {e}");
            }
        }
        SyncCommand::ClearError => engine.clear_error(),
        SyncCommand::ForceSync => engine.force_sync(),
        SyncCommand::Shutdown => {}
    }
}

/// Collapses runs of consecutive text edits into the last one.
fn coalesce(commands: Vec<SyncCommand>) -> Vec<SyncCommand> {
    let mut out: Vec<SyncCommand> = Vec::with_capacity(commands.len());
    for command in commands {
        if matches!(command, SyncCommand::TextChanged(_))
            && matches!(out.last(), Some(SyncCommand::TextChanged(_)))
        {
            out.pop();
        }
        out.push(command);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::EngineOptions;
    use std::time::Duration;

    #[test]
    fn test_coalesce_keeps_last_text() {
        let batch = coalesce(vec![
            SyncCommand::TextChanged("a".to_string()),
            SyncCommand::TextChanged("b".to_string()),
            SyncCommand::ClearError,
            SyncCommand::TextChanged("c".to_string()),
        ]);
        assert_eq!(batch.len(), 3);
        assert!(matches!(&batch[0], SyncCommand::TextChanged(t) if t == "b"));
        assert!(matches!(&batch[2], SyncCommand::TextChanged(t) if t == "c"));
    }

    #[test]
    fn test_worker_force_sync() {
        let options = EngineOptions::default().with_debounce(Duration::from_secs(60));
        let mut engine = Engine::with_options("", options, crate::sync::SystemClock);
        let events = engine.subscribe();
        let worker = SyncWorker::spawn(engine);

        worker.text_changed("map(\"A\", \"B\");");
        worker.force_sync();

        let published = events
            .iter()
            .find(|e| matches!(e, crate::sync::SyncEvent::DocumentPublished { .. }));
        assert!(published.is_some());

        worker.shutdown();
    }
}
