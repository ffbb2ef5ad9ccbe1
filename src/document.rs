//! The current document and everything that replaces, writes or imports into it.
//!
//! [`DocumentState`] never touches the terminal. Each operation returns [`Step`]s that tell the
//! shell what to show next; background results come back through [`DocumentState::poll`].

use crate::encoding::{TextEncoding, SAVE_ENCODINGS};
use crate::error::Error;
use crate::guard::{CloseGuard, GuardChoice, GuardOutcome, PendingAction};
use crate::recent::RecentFiles;
use crate::settings::SettingsStore;
use crate::worker::{WorkerEvent, Workers};
use crate::{loader, saver, web};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Metadata about the text the shell is editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// `None` until the document is saved or loaded.
    pub path: Option<PathBuf>,
    pub encoding: TextEncoding,
    pub modified: bool,
}

impl Document {
    /// File name for titles and the status bar.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| "Unnamed".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// An instruction for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do.
    Idle,
    /// A background task started.
    Busy { message: String },
    /// Ask Save / Discard / Cancel about unsaved changes.
    Confirm,
    /// Ask for a path to save to, then call `save_as` or `cancel_save_as`.
    AskPath,
    /// The text cannot be saved as `encoding`; offer [`SAVE_ENCODINGS`], then call
    /// `save_with_encoding` or `cancel_encoding_prompt`.
    AskEncoding { encoding: String },
    /// Start over with an empty buffer.
    Reset,
    /// Replace the buffer with a freshly loaded file.
    Loaded { text: String },
    Progress { bytes_read: u64, total: u64 },
    Saved { path: PathBuf },
    /// Replace the buffer with imported text. The document is now modified.
    Imported { text: String },
    Failed { message: String },
    Quit,
}

#[derive(Debug)]
enum Task {
    Load { generation: u64, requested: PathBuf, recent: bool },
    Save { generation: u64, revision: u64, retry: bool },
    Fetch { generation: u64 },
}

impl Task {
    fn generation(&self) -> u64 {
        match self {
            Self::Load { generation, .. }
            | Self::Save { generation, .. }
            | Self::Fetch { generation } => *generation,
        }
    }
}

pub struct DocumentState {
    doc: Document,
    guard: CloseGuard,
    recent: RecentFiles,
    workers: Workers,
    task: Option<Task>,
    /// Bumped on every edit; a save only clears `modified` if no edit followed its snapshot.
    revision: u64,
    web_timeout: Duration,
}

impl DocumentState {
    pub fn new(store: Box<dyn SettingsStore>, web_timeout: Duration) -> Self {
        Self {
            doc: Document::default(),
            guard: CloseGuard::new(),
            recent: RecentFiles::load(store),
            workers: Workers::new(),
            task: None,
            revision: 0,
            web_timeout,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    /// Record a content edit.
    pub fn mark_modified(&mut self) {
        self.doc.modified = true;
        self.revision += 1;
    }

    // ---- replacing the document -------------------------------------------------------

    pub fn new_document(&mut self) -> Step {
        self.gate(PendingAction::New)
    }

    pub fn open(&mut self, path: PathBuf) -> Step {
        self.gate(PendingAction::Open { path, recent: false })
    }

    /// Like `open`, but a file that has disappeared is dropped from the recent list.
    pub fn open_recent(&mut self, path: PathBuf) -> Step {
        self.gate(PendingAction::Open { path, recent: true })
    }

    pub fn quit(&mut self) -> Step {
        self.gate(PendingAction::Quit)
    }

    /// Answer the unsaved-changes prompt. `text` is the current buffer, used if the user
    /// chose to save.
    pub fn choose(&mut self, choice: GuardChoice, text: &str) -> Step {
        match self.guard.choose(choice) {
            GuardOutcome::Proceed(action) => self.proceed(action),
            GuardOutcome::Save => self.save(text),
            GuardOutcome::Cancelled | GuardOutcome::Ignored => Step::Idle,
        }
    }

    fn gate(&mut self, action: PendingAction) -> Step {
        match self.guard.request(action, self.doc.modified) {
            Some(action) => self.proceed(action),
            None => Step::Confirm,
        }
    }

    fn proceed(&mut self, action: PendingAction) -> Step {
        match action {
            PendingAction::New => {
                self.task = None;
                self.doc = Document::default();
                tracing::info!(target: "document", "new document");
                Step::Reset
            }
            PendingAction::Open { path, recent } => self.start_load(path, recent),
            PendingAction::Quit => Step::Quit,
        }
    }

    fn start_load(&mut self, path: PathBuf, recent: bool) -> Step {
        let generation = self.workers.next_generation();
        let message = format!("Opening {}...", path.display());
        match loader::spawn_load(path.clone(), generation, self.workers.sender()) {
            Ok(()) => {
                self.task = Some(Task::Load { generation, requested: path, recent });
                Step::Busy { message }
            }
            Err(e) => Step::Failed { message: e.to_string() },
        }
    }

    // ---- saving ------------------------------------------------------------------------

    /// Save to the current path, or ask for one.
    pub fn save(&mut self, text: &str) -> Step {
        match self.doc.path.clone() {
            Some(path) => self.start_save(path, text, self.doc.encoding, false),
            None => Step::AskPath,
        }
    }

    pub fn save_as(&mut self, path: PathBuf, text: &str) -> Step {
        self.doc.path = Some(path);
        self.save(text)
    }

    /// The save-as prompt was dismissed.
    pub fn cancel_save_as(&mut self) -> Step {
        self.guard.save_finished(false);
        Step::Idle
    }

    /// Retry a failed save once with an encoding from [`SAVE_ENCODINGS`].
    pub fn save_with_encoding(&mut self, label: &str, text: &str) -> Step {
        let chosen = SAVE_ENCODINGS
            .iter()
            .find(|l| l.eq_ignore_ascii_case(label.trim()))
            .and_then(|l| TextEncoding::from_label(l));
        let (Some(encoding), Some(path)) = (chosen, self.doc.path.clone()) else {
            self.guard.save_finished(false);
            return Step::Failed { message: format!("Cannot save as '{label}'") };
        };
        self.start_save(path, text, encoding, true)
    }

    /// The encoding chooser was dismissed.
    pub fn cancel_encoding_prompt(&mut self) -> Step {
        self.guard.save_finished(false);
        Step::Idle
    }

    fn start_save(&mut self, path: PathBuf, text: &str, encoding: TextEncoding, retry: bool) -> Step {
        let generation = self.workers.next_generation();
        let message = format!("Saving {}...", path.display());
        match saver::spawn_save(path, text.to_string(), encoding, generation, self.workers.sender()) {
            Ok(()) => {
                self.task = Some(Task::Save { generation, revision: self.revision, retry });
                Step::Busy { message }
            }
            Err(e) => {
                self.guard.save_finished(false);
                Step::Failed { message: e.to_string() }
            }
        }
    }

    // ---- web import --------------------------------------------------------------------

    /// Fetch `url` in the background. Invalid URLs fail before any network activity.
    pub fn import(&mut self, url: &str) -> Step {
        let url = match web::validate_url(url) {
            Ok(url) => url,
            Err(e) => return Step::Failed { message: e.to_string() },
        };
        let generation = self.workers.next_generation();
        let message = format!("Importing {url}...");
        match web::spawn_fetch(url, self.web_timeout, generation, self.workers.sender()) {
            Ok(()) => {
                self.task = Some(Task::Fetch { generation });
                Step::Busy { message }
            }
            Err(e) => Step::Failed { message: e.to_string() },
        }
    }

    /// Forget an in-flight import. Returns whether there was one.
    pub fn cancel_import(&mut self) -> bool {
        if matches!(self.task, Some(Task::Fetch { .. })) {
            self.task = None;
            tracing::info!(target: "document", "import cancelled");
            return true;
        }
        false
    }

    // ---- recent files ------------------------------------------------------------------

    pub fn recent(&self) -> &[PathBuf] {
        self.recent.list()
    }

    pub fn remove_recent(&mut self, path: &Path) -> Step {
        match self.recent.remove(path) {
            Ok(()) => Step::Idle,
            Err(e) => Step::Failed { message: e.to_string() },
        }
    }

    pub fn clear_recent(&mut self) -> Step {
        match self.recent.clear() {
            Ok(()) => Step::Idle,
            Err(e) => Step::Failed { message: e.to_string() },
        }
    }

    // ---- background results ------------------------------------------------------------

    /// Apply everything the workers have delivered so far.
    pub fn poll(&mut self) -> Vec<Step> {
        let events = self.workers.drain();
        events.into_iter().flat_map(|ev| self.handle(ev)).collect()
    }

    /// Block up to `timeout` for one worker event and apply it.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Step> {
        match self.workers.recv_timeout(timeout) {
            Some(ev) => self.handle(ev),
            None => Vec::new(),
        }
    }

    /// Wait until no task is in flight or `timeout` passes, collecting every step.
    pub fn settle(&mut self, timeout: Duration) -> Vec<Step> {
        let deadline = Instant::now() + timeout;
        let mut steps = Vec::new();
        while self.is_busy() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            steps.extend(self.wait(left));
        }
        steps
    }

    fn handle(&mut self, event: WorkerEvent) -> Vec<Step> {
        if self.task.as_ref().map(Task::generation) != Some(event.generation()) {
            tracing::debug!(target: "worker", generation = event.generation(), "dropping stale event");
            return Vec::new();
        }
        match event {
            WorkerEvent::LoadProgress { bytes_read, total, .. } => {
                vec![Step::Progress { bytes_read, total }]
            }
            WorkerEvent::Loaded { result, .. } => {
                let Some(Task::Load { requested, recent, .. }) = self.task.take() else {
                    return Vec::new();
                };
                match result {
                    Ok(loaded) => {
                        if let Err(e) = self.recent.add(&loaded.path) {
                            tracing::warn!(target: "recent", error = %e, "could not record recent file");
                        }
                        self.doc = Document {
                            path: Some(loaded.path),
                            encoding: loaded.encoding,
                            modified: false,
                        };
                        vec![Step::Loaded { text: loaded.text }]
                    }
                    Err(e) => {
                        if recent && e.is_not_found() {
                            if let Err(e) = self.recent.remove(&requested) {
                                tracing::warn!(target: "recent", error = %e, "could not prune recent file");
                            }
                        }
                        vec![Step::Failed { message: e.to_string() }]
                    }
                }
            }
            WorkerEvent::Saved { result, .. } => {
                let Some(Task::Save { revision, retry, .. }) = self.task.take() else {
                    return Vec::new();
                };
                match result {
                    Ok(saved) => {
                        if let Err(e) = self.recent.add(&saved.path) {
                            tracing::warn!(target: "recent", error = %e, "could not record recent file");
                        }
                        self.doc.path = Some(saved.path.clone());
                        self.doc.encoding = saved.encoding;
                        if revision == self.revision {
                            self.doc.modified = false;
                        }
                        let mut steps = vec![Step::Saved { path: saved.path }];
                        if let Some(action) = self.guard.save_finished(true) {
                            steps.push(self.proceed(action));
                        }
                        steps
                    }
                    Err(Error::Unrepresentable { encoding }) if !retry => {
                        vec![Step::AskEncoding { encoding }]
                    }
                    Err(e) => {
                        self.guard.save_finished(false);
                        vec![Step::Failed { message: e.to_string() }]
                    }
                }
            }
            WorkerEvent::Fetched { result, .. } => {
                self.task = None;
                match result {
                    Ok(text) => {
                        self.mark_modified();
                        vec![Step::Imported { text }]
                    }
                    Err(e) => vec![Step::Failed { message: e.to_string() }],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recent::RECENT_FILES_KEY;
    use crate::settings::MemorySettings;
    use std::fs;

    const WAIT: Duration = Duration::from_secs(10);

    fn state() -> (DocumentState, MemorySettings) {
        let store = MemorySettings::new();
        (DocumentState::new(Box::new(store.clone()), Duration::from_secs(1)), store)
    }

    /// Run `step` to completion and return the last non-progress step.
    fn finish(ds: &mut DocumentState, first: Step) -> Vec<Step> {
        let mut steps = vec![first];
        steps.extend(ds.settle(WAIT));
        steps.retain(|s| !matches!(s, Step::Progress { .. } | Step::Busy { .. }));
        steps
    }

    #[test]
    fn new_document_is_clean_utf8_and_unnamed() {
        let (mut ds, _) = state();
        assert_eq!(ds.new_document(), Step::Reset);
        assert_eq!(ds.document(), &Document::default());
        assert_eq!(ds.document().display_name(), "Unnamed");
        ds.mark_modified();
        assert!(ds.document().modified);
    }

    #[test]
    fn open_loads_text_and_registers_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, "hello").unwrap();
        let (mut ds, store) = state();

        let first = ds.open(path.clone());
        assert!(matches!(first, Step::Busy { .. }));
        let steps = finish(&mut ds, first);
        assert_eq!(steps, vec![Step::Loaded { text: "hello".into() }]);

        let canonical = fs::canonicalize(&path).unwrap();
        assert_eq!(ds.document().path.as_deref(), Some(canonical.as_path()));
        assert!(!ds.document().modified);
        assert_eq!(ds.recent(), [canonical]);
        assert!(store.get(RECENT_FILES_KEY).is_some());
    }

    #[test]
    fn missing_file_fails_and_leaves_document_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ds, _) = state();
        ds.mark_modified();
        let before = ds.document().clone();
        // Modified, so the guard asks first.
        assert_eq!(ds.open(dir.path().join("missing.txt")), Step::Confirm);
        let first = ds.choose(GuardChoice::Discard, "");
        let steps = finish(&mut ds, first);
        match &steps[..] {
            [Step::Failed { message }] => assert!(message.starts_with("File does not exist")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ds.document(), &before);
    }

    #[test]
    fn vanished_recent_entry_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        fs::write(&path, "x").unwrap();
        let (mut ds, _) = state();
        let first = ds.open(path.clone());
        finish(&mut ds, first);
        let canonical = ds.recent()[0].clone();
        fs::remove_file(&path).unwrap();

        let first = ds.open_recent(canonical);
        let steps = finish(&mut ds, first);
        assert!(matches!(steps[..], [Step::Failed { .. }]));
        assert!(ds.recent().is_empty());
    }

    #[test]
    fn save_without_path_asks_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let (mut ds, _) = state();
        ds.mark_modified();
        assert_eq!(ds.save("line one\nline two"), Step::AskPath);

        let first = ds.save_as(path.clone(), "line one\nline two");
        let steps = finish(&mut ds, first);
        assert!(matches!(steps[..], [Step::Saved { .. }]));
        assert!(!ds.document().modified);

        let first = ds.open(path);
        let steps = finish(&mut ds, first);
        assert_eq!(steps, vec![Step::Loaded { text: "line one\nline two".into() }]);
    }

    #[test]
    fn edit_during_save_keeps_modified() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ds, _) = state();
        ds.mark_modified();
        let first = ds.save_as(dir.path().join("a.txt"), "v1");
        ds.mark_modified();
        finish(&mut ds, first);
        assert!(ds.document().modified);
    }

    #[test]
    fn unrepresentable_save_asks_for_encoding_then_retries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.txt");
        let (mut ds, _) = state();
        ds.doc.encoding = TextEncoding::Latin1;
        ds.mark_modified();

        let first = ds.save_as(path.clone(), "日本語");
        let steps = finish(&mut ds, first);
        assert_eq!(steps, vec![Step::AskEncoding { encoding: "ISO-8859-1".into() }]);
        assert!(ds.document().modified);

        let first = ds.save_with_encoding("UTF-8", "日本語");
        let steps = finish(&mut ds, first);
        assert!(matches!(steps[..], [Step::Saved { .. }]));
        assert_eq!(ds.document().encoding, TextEncoding::Utf8);
        assert!(!ds.document().modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), "日本語");
    }

    #[test]
    fn retry_is_only_offered_once() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ds, _) = state();
        ds.doc.encoding = TextEncoding::Latin1;
        let first = ds.save_as(dir.path().join("x.txt"), "日本");
        finish(&mut ds, first);
        let first = ds.save_with_encoding("Windows-1252", "日本");
        let steps = finish(&mut ds, first);
        assert!(matches!(steps[..], [Step::Failed { .. }]));
    }

    #[test]
    fn guard_cancel_keeps_everything() {
        let (mut ds, _) = state();
        ds.mark_modified();
        assert_eq!(ds.quit(), Step::Confirm);
        assert_eq!(ds.choose(GuardChoice::Cancel, "text"), Step::Idle);
        assert!(ds.document().modified);
        // A clean document quits without asking.
        let (mut clean, _) = state();
        assert_eq!(clean.quit(), Step::Quit);
    }

    #[test]
    fn guard_save_then_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        let (mut ds, _) = state();
        ds.doc.path = Some(path.clone());
        ds.mark_modified();

        assert_eq!(ds.new_document(), Step::Confirm);
        let first = ds.choose(GuardChoice::Save, "kept");
        let steps = finish(&mut ds, first);
        assert!(matches!(steps[..], [Step::Saved { .. }, Step::Reset]));
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
        assert_eq!(ds.document(), &Document::default());
    }

    #[test]
    fn guard_save_cancelled_at_path_prompt_aborts() {
        let (mut ds, _) = state();
        ds.mark_modified();
        assert_eq!(ds.quit(), Step::Confirm);
        assert_eq!(ds.choose(GuardChoice::Save, "t"), Step::AskPath);
        assert_eq!(ds.cancel_save_as(), Step::Idle);
        assert!(ds.document().modified);
        // Nothing is pending any more: a later unrelated save does not quit.
        assert!(ds.guard.pending().is_none());
    }

    #[test]
    fn http_import_is_rejected_without_network() {
        let (mut ds, _) = state();
        match ds.import("http://example.com") {
            Step::Failed { message } => assert!(message.contains("valid HTTPS URL")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!ds.is_busy());
        assert!(!ds.document().modified);
    }

    #[test]
    fn stale_events_are_ignored() {
        let (mut ds, _) = state();
        ds.workers
            .sender()
            .send(WorkerEvent::Fetched { generation: 999, result: Ok("late".into()) })
            .unwrap();
        assert!(ds.poll().is_empty());
        assert!(!ds.document().modified);
    }
}
