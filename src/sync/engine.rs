//! Synchronization state machine between a text view and a structural view
//! of one script.
//!
//! The engine is the single owner of the authoritative [`Document`] and
//! script text. Text edits are debounced and re-parsed; structural edits are
//! applied immediately and re-generated into text. Observers receive state
//! transitions, published content and errors as [`SyncEvent`]s.
//!
//! The engine does no I/O and spawns no threads. Time only advances through
//! its [`Clock`]; call [`Engine::poll`] when [`Engine::next_deadline`] has
//! passed (the [`super::SyncWorker`] does this for you).

use super::clock::{Clock, SystemClock};
use crate::codegen::{generate_with, FormatOptions};
use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_INPUT_BYTES};
use crate::models::{Document, DocumentEdit, EditError};
use crate::parser::{parse_with_limit, ParseError};
use crate::validator::{validate, ValidationError};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// Error held by the engine while in [`SyncState::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The text could not be parsed
    Parse(ParseError),
    /// The text parsed but has an error-severity validation issue
    Validation(ValidationError),
}

impl SyncError {
    /// 1-based line and column of the error.
    #[must_use]
    pub const fn position(&self) -> (usize, usize) {
        match self {
            Self::Parse(e) => (e.line, e.column),
            Self::Validation(e) => (e.line, e.column),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Validation(e) => write!(f, "Validation error: {e}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

/// Engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Text and document agree; nothing pending
    Idle,
    /// Parsing text
    Parsing,
    /// Generating text from the document
    Generating,
    /// Publishing the result
    Syncing,
    /// Last pipeline run failed
    Error(SyncError),
}

impl SyncState {
    /// Returns true for the error state.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Parsing => write!(f, "parsing"),
            Self::Generating => write!(f, "generating"),
            Self::Syncing => write!(f, "syncing"),
            Self::Error(_) => write!(f, "error"),
        }
    }
}

/// Which view made the last edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The text editor
    Text,
    /// The structural editor
    Structure,
}

/// Notification sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The engine moved to a new state
    StateChanged(SyncState),
    /// A document parsed from text was published
    DocumentPublished {
        /// Revision of this publication
        revision: u64,
        /// The new document
        document: Document,
    },
    /// Text generated from the document was published
    TextPublished {
        /// Revision of this publication
        revision: u64,
        /// The new text
        text: String,
    },
    /// A pipeline run failed
    Error(SyncError),
    /// A structural edit could not be applied; nothing changed
    EditRejected(EditError),
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Quiet period after the last text edit before re-parsing
    pub debounce: Duration,
    /// Layout of generated text
    pub format: FormatOptions,
    /// Longest text accepted by the parser
    pub max_input_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            format: FormatOptions::default(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl EngineOptions {
    /// Sets the debounce interval.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Bidirectional text/document synchronizer.
pub struct Engine {
    options: EngineOptions,
    clock: Box<dyn Clock>,
    state: SyncState,
    document: Document,
    text: String,
    diagnostics: Vec<ValidationError>,
    authority: Authority,
    revision: u64,
    /// When the pending text edit becomes due
    deadline: Option<Instant>,
    subscribers: Vec<Sender<SyncEvent>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("authority", &self.authority)
            .field("revision", &self.revision)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine with default options and the system clock.
    ///
    /// The initial text is parsed immediately. If it does not parse, the
    /// engine starts in the error state with an empty document.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapsync::sync::{Engine, SyncState};
    ///
    /// let engine = Engine::new("map(\"CapsLock\", \"Escape\");");
    /// assert_eq!(*engine.current_state(), SyncState::Idle);
    /// assert_eq!(engine.current_document().entries.len(), 1);
    /// ```
    #[must_use]
    pub fn new(initial_text: &str) -> Self {
        Self::with_options(initial_text, EngineOptions::default(), SystemClock)
    }

    /// Creates an engine with explicit options and time source.
    pub fn with_options(initial_text: &str, options: EngineOptions, clock: impl Clock + 'static) -> Self {
        let mut engine = Self {
            options,
            clock: Box::new(clock),
            state: SyncState::Idle,
            document: Document::new(),
            text: initial_text.to_string(),
            diagnostics: Vec::new(),
            authority: Authority::Text,
            revision: 0,
            deadline: None,
            subscribers: Vec::new(),
        };
        engine.run_text_pipeline();
        engine
    }

    /// Records a text edit and restarts the debounce timer.
    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.authority = Authority::Text;
        let deadline = self.clock.now() + self.options.debounce;
        self.deadline = Some(deadline);
        tracing::trace!(bytes = self.text.len(), "text edit scheduled");
    }

    /// Replaces the document from the structural view.
    ///
    /// Cancels any pending text edit and publishes freshly generated text.
    /// If the generated text does not parse back, the engine enters the
    /// error state and keeps its previous document, text and pending edit.
    pub fn on_structure_changed(&mut self, document: Document) {
        let previous_document = std::mem::replace(&mut self.document, document);
        let previous_authority = std::mem::replace(&mut self.authority, Authority::Structure);
        let pending = self.deadline.take();

        if self.run_structure_pipeline() {
            if pending.is_some() {
                tracing::debug!("pending text edit cancelled by structural edit");
            }
        } else {
            tracing::warn!("structural edit rolled back: generated text does not parse");
            self.document = previous_document;
            self.authority = previous_authority;
            self.deadline = pending;
        }
    }

    /// Applies one structural edit to the current document.
    ///
    /// On error nothing changes and subscribers receive
    /// [`SyncEvent::EditRejected`].
    pub fn apply_edit(&mut self, edit: DocumentEdit) -> Result<(), EditError> {
        let mut document = self.document.clone();
        if let Err(err) = edit.apply(&mut document) {
            tracing::debug!("structural edit rejected: {err}");
            self.emit(&SyncEvent::EditRejected(err.clone()));
            return Err(err);
        }
        self.on_structure_changed(document);
        Ok(())
    }

    /// Leaves the error state without touching content.
    pub fn clear_error(&mut self) {
        if self.state.is_error() {
            self.set_state(SyncState::Idle);
        }
    }

    /// Runs the pipeline of the current authority now, skipping the debounce.
    pub fn force_sync(&mut self) {
        match self.authority {
            Authority::Text => {
                self.deadline = None;
                self.run_text_pipeline();
            }
            Authority::Structure => {
                self.run_structure_pipeline();
            }
        }
    }

    /// Runs the pending text pipeline if its debounce has elapsed.
    ///
    /// Returns true if a pipeline ran.
    pub fn poll(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.deadline = None;
                self.run_text_pipeline();
                true
            }
            _ => false,
        }
    }

    /// When the pending text edit becomes due, if any.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the pending text edit becomes due, measured on the
    /// engine's clock.
    #[must_use]
    pub fn time_until_deadline(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Returns true while a text edit waits for its debounce.
    #[must_use]
    pub const fn has_pending_edit(&self) -> bool {
        self.deadline.is_some()
    }

    /// Current state.
    #[must_use]
    pub const fn current_state(&self) -> &SyncState {
        &self.state
    }

    /// Last published document.
    #[must_use]
    pub const fn current_document(&self) -> &Document {
        &self.document
    }

    /// Current text, including edits still waiting for their debounce.
    #[must_use]
    pub fn current_text(&self) -> &str {
        &self.text
    }

    /// Error of the current state, if in the error state.
    #[must_use]
    pub const fn current_error(&self) -> Option<&SyncError> {
        match &self.state {
            SyncState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// All validation issues (errors and warnings) of the last successful
    /// parse.
    #[must_use]
    pub fn current_diagnostics(&self) -> &[ValidationError] {
        &self.diagnostics
    }

    /// View that made the last edit.
    #[must_use]
    pub const fn authority(&self) -> Authority {
        self.authority
    }

    /// Number of publications so far.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Options the engine runs with.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Registers an observer.
    ///
    /// Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> Receiver<SyncEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// parse -> validate -> publish document.
    fn run_text_pipeline(&mut self) {
        self.set_state(SyncState::Parsing);

        let document = match parse_with_limit(&self.text, self.options.max_input_bytes) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!(line = err.line, column = err.column, "parse failed: {}", err.message);
                self.diagnostics.clear();
                self.fail(SyncError::Parse(err));
                return;
            }
        };

        self.set_state(SyncState::Syncing);
        self.diagnostics = validate(&document);
        self.document = document;
        self.revision += 1;
        tracing::debug!(
            revision = self.revision,
            diagnostics = self.diagnostics.len(),
            "document published"
        );
        self.emit(&SyncEvent::DocumentPublished {
            revision: self.revision,
            document: self.document.clone(),
        });

        match self.diagnostics.iter().find(|d| d.is_error()).cloned() {
            Some(first) => self.fail(SyncError::Validation(first)),
            None => self.set_state(SyncState::Idle),
        }
    }

    /// generate -> format -> re-parse -> publish text.
    ///
    /// Returns false without touching text or revision when the generated
    /// text does not parse.
    fn run_structure_pipeline(&mut self) -> bool {
        self.set_state(SyncState::Generating);
        let text = generate_with(&self.document, &self.options.format);
        if let Err(err) = parse_with_limit(&text, self.options.max_input_bytes) {
            tracing::debug!(
                line = err.line,
                column = err.column,
                "generated text does not parse: {}",
                err.message
            );
            self.fail(SyncError::Parse(err));
            return false;
        }

        self.set_state(SyncState::Syncing);
        self.text = text;
        self.diagnostics.clear();
        self.revision += 1;
        tracing::debug!(revision = self.revision, bytes = self.text.len(), "text published");
        self.emit(&SyncEvent::TextPublished {
            revision: self.revision,
            text: self.text.clone(),
        });

        self.set_state(SyncState::Idle);
        true
    }

    fn fail(&mut self, error: SyncError) {
        self.set_state(SyncState::Error(error.clone()));
        self.emit(&SyncEvent::Error(error));
    }

    fn set_state(&mut self, state: SyncState) {
        tracing::trace!(from = %self.state, to = %state, "state change");
        self.state = state.clone();
        self.emit(&SyncEvent::StateChanged(state));
    }

    fn emit(&mut self, event: &SyncEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mapping, Scope};
    use crate::sync::ManualClock;

    fn engine_with_clock(text: &str) -> (Engine, ManualClock) {
        let clock = ManualClock::new();
        let engine = Engine::with_options(text, EngineOptions::default(), clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_initial_parse_is_synchronous() {
        let (engine, _) = engine_with_clock("map(\"A\", \"B\");");
        assert_eq!(*engine.current_state(), SyncState::Idle);
        assert_eq!(engine.revision(), 1);
        assert!(!engine.has_pending_edit());
    }

    #[test]
    fn test_initial_parse_failure() {
        let (engine, _) = engine_with_clock("map(\"A\"");
        assert!(matches!(engine.current_error(), Some(SyncError::Parse(_))));
        assert!(engine.current_document().is_empty());
        assert_eq!(engine.current_text(), "map(\"A\"");
    }

    #[test]
    fn test_text_edit_waits_for_debounce() {
        let (mut engine, clock) = engine_with_clock("");
        engine.on_text_changed("map(\"A\", \"B\");");
        assert_eq!(engine.current_text(), "map(\"A\", \"B\");");
        assert!(engine.current_document().is_empty());

        clock.advance_ms(499);
        assert!(!engine.poll());
        clock.advance_ms(1);
        assert!(engine.poll());
        assert_eq!(engine.current_document().entries.len(), 1);
    }

    #[test]
    fn test_structural_edit_cancels_pending_text() {
        let (mut engine, clock) = engine_with_clock("map(\"A\", \"B\");");
        engine.on_text_changed("map(\"X\", \"Y\");");
        engine
            .apply_edit(DocumentEdit::SetMapping {
                scope: Scope::Global,
                mapping: Mapping::simple("C", "D"),
            })
            .unwrap();

        assert!(!engine.has_pending_edit());
        assert_eq!(engine.authority(), Authority::Structure);
        assert_eq!(engine.current_text(), "map(\"A\", \"B\");\nmap(\"C\", \"D\");\n");

        clock.advance_ms(1000);
        assert!(!engine.poll());
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let (mut engine, _) = engine_with_clock("map(\"A\", \"B\");");
        let rx = engine.subscribe();
        let err = engine
            .apply_edit(DocumentEdit::RemoveDevice { index: 0 })
            .unwrap_err();
        assert_eq!(err, EditError::DeviceNotFound(0));
        assert_eq!(engine.revision(), 1);
        assert_eq!(engine.current_text(), "map(\"A\", \"B\");");

        let events: Vec<SyncEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![SyncEvent::EditRejected(EditError::DeviceNotFound(0))]);
    }

    #[test]
    fn test_unparsable_structure_rolls_back() {
        let (mut engine, _) = engine_with_clock("map(\"A\", \"B\");");
        engine.on_text_changed("map(\"X\", \"Y\");");
        let before = engine.current_document().clone();

        let broken = before
            .clone()
            .with_mapping(Mapping::macro_sequence("F1", Vec::<String>::new()));
        engine.on_structure_changed(broken);

        assert!(matches!(engine.current_error(), Some(SyncError::Parse(_))));
        assert_eq!(*engine.current_document(), before);
        assert_eq!(engine.current_text(), "map(\"X\", \"Y\");");
        assert_eq!(engine.authority(), Authority::Text);
        assert!(engine.has_pending_edit());
        assert_eq!(engine.revision(), 1);
    }

    #[test]
    fn test_clear_error_keeps_content() {
        let (mut engine, _) = engine_with_clock("map(\"A\"");
        engine.clear_error();
        assert_eq!(*engine.current_state(), SyncState::Idle);
        assert_eq!(engine.current_text(), "map(\"A\"");

        engine.clear_error();
        assert_eq!(*engine.current_state(), SyncState::Idle);
    }

    #[test]
    fn test_validation_error_still_publishes() {
        let (mut engine, _) = engine_with_clock("");
        engine.on_text_changed("map(\"Nope\", \"A\");");
        engine.force_sync();

        assert!(matches!(engine.current_error(), Some(SyncError::Validation(_))));
        assert_eq!(engine.current_document().entries.len(), 1);
        assert_eq!(engine.current_diagnostics().len(), 1);
    }

    #[test]
    fn test_warnings_do_not_enter_error_state() {
        let (mut engine, _) = engine_with_clock("");
        engine.on_text_changed("device(\"a\") { }\ndevice(\"a\") { }");
        engine.force_sync();

        assert_eq!(*engine.current_state(), SyncState::Idle);
        assert_eq!(engine.current_diagnostics().len(), 1);
    }

    #[test]
    fn test_event_sequence_for_text_edit() {
        let (mut engine, clock) = engine_with_clock("");
        let rx = engine.subscribe();
        engine.on_text_changed("map(\"A\", \"B\");");
        clock.advance_ms(500);
        engine.poll();

        let events: Vec<SyncEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], SyncEvent::StateChanged(SyncState::Parsing));
        assert_eq!(events[1], SyncEvent::StateChanged(SyncState::Syncing));
        assert!(matches!(events[2], SyncEvent::DocumentPublished { revision: 2, .. }));
        assert_eq!(events[3], SyncEvent::StateChanged(SyncState::Idle));
    }

    #[test]
    fn test_force_sync_structure_regenerates() {
        let (mut engine, _) = engine_with_clock("map( \"A\",\"B\" );");
        engine.on_structure_changed(engine.current_document().clone());
        assert_eq!(engine.current_text(), "map(\"A\", \"B\");\n");

        engine.force_sync();
        assert_eq!(engine.authority(), Authority::Structure);
        assert_eq!(engine.revision(), 3);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let (mut engine, _) = engine_with_clock("");
        drop(engine.subscribe());
        engine.force_sync();
        assert!(engine.subscribers.is_empty());
    }
}
