use super::error::TranscriptionError;
use super::segment::{read_segments, Segment};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default whisper.cpp CLI executable name
pub const DEFAULT_EXECUTABLE: &str = "whisper-cli";

/// Substring identifying a progress line on the recognizer's stderr
pub const PROGRESS_MARKER: &str = "progress =";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared display channel for progress output
type SharedDisplay = Arc<Mutex<Box<dyn Write + Send>>>;

/// How much recognizer output reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Progress line only
    #[default]
    Normal,
    /// Also forward the recognizer's stdout
    Verbose,
    /// Also echo every non-progress diagnostic line
    Trace,
}

/// Runs the whisper.cpp CLI as a subprocess and parses its JSON output
///
/// One subprocess per [`Transcriber::transcribe`] call. Progress lines from
/// the recognizer's stderr are redrawn in place on the display channel
/// (stderr by default) while the full stream is captured for error reports.
pub struct Transcriber {
    executable: String,
    model_path: PathBuf,
    verbosity: Verbosity,
    display: SharedDisplay,
    child: Arc<Mutex<Option<Child>>>,
    terminated: Arc<AtomicBool>,
}

/// Terminates a running transcription from another thread
#[derive(Clone)]
pub struct TerminationHandle {
    child: Arc<Mutex<Option<Child>>>,
    terminated: Arc<AtomicBool>,
}

impl TerminationHandle {
    /// Kills the recognizer if running; later calls on the same
    /// [`Transcriber`] fail immediately
    ///
    /// Returns true if a running process was signalled.
    pub fn terminate(&self) -> bool {
        self.terminated.store(true, Ordering::SeqCst);
        kill_running(&self.child)
    }

    /// Whether termination has been requested
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Transcriber {
    /// Creates a transcriber for an already provisioned model
    ///
    /// `executable` is looked up on `PATH` unless it contains a path separator.
    pub fn new(executable: impl Into<String>, model_path: impl Into<PathBuf>, verbosity: Verbosity) -> Self {
        Self {
            executable: executable.into(),
            model_path: model_path.into(),
            verbosity,
            display: Arc::new(Mutex::new(Box::new(io::stderr()))),
            child: Arc::new(Mutex::new(None)),
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the display channel progress is written to
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn Write + Send>) -> Self {
        self.display = Arc::new(Mutex::new(display));
        self
    }

    /// Model file passed to the recognizer
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Handle for terminating the subprocess from another thread
    #[must_use]
    pub fn termination_handle(&self) -> TerminationHandle {
        TerminationHandle {
            child: Arc::clone(&self.child),
            terminated: Arc::clone(&self.terminated),
        }
    }

    /// Transcribes an audio file into segments in engine order
    ///
    /// # Errors
    /// - `EngineNotFound` if the executable is not resolvable (nothing is spawned)
    /// - `ModelNotFound` if the model file is missing
    /// - `TranscriptionFailed` on non-zero exit, carrying the captured stderr
    /// - `Parse` if the JSON output is missing or malformed
    pub fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>, TranscriptionError> {
        let executable = resolve_executable(&self.executable)?;

        if !self.model_path.exists() {
            return Err(TranscriptionError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }

        if self.terminated.load(Ordering::SeqCst) {
            return Err(TranscriptionError::TranscriptionFailed {
                diagnostics: "terminated by request before start".to_owned(),
            });
        }

        let _span = tracing::debug_span!("transcription", audio = %audio_path.display()).entered();

        let output_base = unique_output_base();
        let output_file = OutputFile::new(json_output_path(&output_base));

        tracing::info!(
            executable = %executable.display(),
            model = %self.model_path.display(),
            audio = %audio_path.display(),
            "starting recognizer"
        );

        let start = Instant::now();
        let mut command = Command::new(&executable);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(audio_path)
            .arg("-oj")
            .arg("-of")
            .arg(&output_base)
            .args(["--print-progress", "true"])
            .stdin(Stdio::null())
            .stdout(if self.verbosity >= Verbosity::Verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped());
        // Own group, so termination also reaches anything a wrapper script forks
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|e| TranscriptionError::TranscriptionFailed {
                diagnostics: format!("failed to start {}: {e}", executable.display()),
            })?;

        let captured = Arc::new(Mutex::new(String::new()));
        let reader = child
            .stderr
            .take()
            .map(|stderr| self.spawn_diagnostic_reader(stderr, Arc::clone(&captured)));

        let status = self.wait_for_exit(child);

        if let Some(reader) = reader {
            match reader {
                Ok(handle) => {
                    if handle.join().is_err() {
                        tracing::warn!("diagnostic reader thread panicked");
                    }
                }
                Err(e) => tracing::warn!("failed to start diagnostic reader: {}", e),
            }
        }
        self.finish_progress_line();

        let status = status?;
        let diagnostics = std::mem::take(&mut *lock(&captured));

        tracing::debug!(
            status = %status,
            elapsed_ms = start.elapsed().as_millis(),
            "recognizer exited"
        );

        if !status.success() {
            let diagnostics = if self.terminated.load(Ordering::SeqCst) {
                format!("terminated by request ({status})\n{diagnostics}")
            } else {
                diagnostics
            };
            return Err(TranscriptionError::TranscriptionFailed { diagnostics });
        }

        let segments = read_segments(output_file.path())?;

        tracing::info!(
            segments = segments.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "transcription completed"
        );

        Ok(segments)
    }

    fn spawn_diagnostic_reader<R>(
        &self,
        stream: R,
        captured: Arc<Mutex<String>>,
    ) -> io::Result<JoinHandle<()>>
    where
        R: Read + Send + 'static,
    {
        let mut sink = DiagnosticSink::new(captured, Arc::clone(&self.display), self.verbosity);
        thread::Builder::new()
            .name("recognizer-stderr".to_owned())
            .spawn(move || sink.drain(BufReader::new(stream)))
    }

    /// Polls for exit so the child slot is never locked across a blocking wait
    fn wait_for_exit(&self, child: Child) -> Result<ExitStatus, TranscriptionError> {
        let running = RunningChild::new(&self.child, child);

        // terminate() may have raced the spawn
        if self.terminated.load(Ordering::SeqCst) {
            kill_running(&self.child);
        }

        loop {
            match running.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(TranscriptionError::TranscriptionFailed {
                        diagnostics: format!("failed to wait for recognizer: {e}"),
                    })
                }
            }
        }
    }

    fn finish_progress_line(&self) {
        let mut display = lock(&self.display);
        if let Err(e) = display.write_all(b"\n").and_then(|()| display.flush()) {
            tracing::debug!("failed to write to display: {}", e);
        }
    }
}

/// Owns the child while it runs; kills and reaps it if dropped early
struct RunningChild<'a> {
    slot: &'a Mutex<Option<Child>>,
}

impl<'a> RunningChild<'a> {
    fn new(slot: &'a Mutex<Option<Child>>, child: Child) -> Self {
        *lock(slot) = Some(child);
        Self { slot }
    }

    fn try_wait(&self) -> io::Result<Option<ExitStatus>> {
        let mut slot = lock(self.slot);
        let Some(child) = slot.as_mut() else {
            return Err(io::Error::other("recognizer process handle lost"));
        };
        let status = child.try_wait()?;
        if status.is_some() {
            slot.take();
        }
        Ok(status)
    }
}

impl Drop for RunningChild<'_> {
    fn drop(&mut self) {
        if let Some(mut child) = lock(self.slot).take() {
            let _ = kill_tree(&mut child);
            let _ = child.wait();
        }
    }
}

fn kill_running(slot: &Mutex<Option<Child>>) -> bool {
    lock(slot).as_mut().is_some_and(|child| match kill_tree(child) {
        Ok(()) => {
            tracing::info!(pid = child.id(), "recognizer terminated");
            true
        }
        Err(e) => {
            tracing::debug!("failed to kill recognizer: {}", e);
            false
        }
    })
}

/// Kills the recognizer's whole process group, falling back to the child alone
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    match kill_process_group(child.id()) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("failed to signal process group: {}", e);
            child.kill()
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

// SAFETY: killpg takes no pointers. The group leader is still unreaped while
// it sits in the child slot, so the group id cannot have been reused.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_group(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid).map_err(io::Error::other)?;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Buffers are left consistent by every writer, so a poisoned lock is still usable
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Routes recognizer stderr lines to the capture buffer and the display
struct DiagnosticSink {
    captured: Arc<Mutex<String>>,
    display: SharedDisplay,
    verbosity: Verbosity,
    progress_active: bool,
}

impl DiagnosticSink {
    fn new(captured: Arc<Mutex<String>>, display: SharedDisplay, verbosity: Verbosity) -> Self {
        Self {
            captured,
            display,
            verbosity,
            progress_active: false,
        }
    }

    /// Reads until EOF; must keep draining so the recognizer never blocks on a full pipe
    fn drain<R: BufRead>(&mut self, mut reader: R) {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    self.handle_line(line.trim_end_matches(['\n', '\r']));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!("stopped reading recognizer stderr: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        {
            let mut captured = lock(&self.captured);
            captured.push_str(line);
            captured.push('\n');
        }

        let result = if line.contains(PROGRESS_MARKER) {
            self.progress_active = true;
            self.show(&format!("\r{}", line.trim()))
        } else if self.verbosity >= Verbosity::Trace {
            let prefix = if self.progress_active { "\n" } else { "" };
            self.progress_active = false;
            self.show(&format!("{prefix}{line}\n"))
        } else {
            Ok(())
        };

        if let Err(e) = result {
            tracing::debug!("failed to write to display: {}", e);
        }
    }

    fn show(&self, text: &str) -> io::Result<()> {
        let mut display = lock(&self.display);
        display.write_all(text.as_bytes())?;
        display.flush()
    }
}

/// Fresh `<temp>/whisper-minutes-<uuid>` prefix passed to `-of`
fn unique_output_base() -> PathBuf {
    std::env::temp_dir().join(format!("whisper-minutes-{}", Uuid::new_v4()))
}

/// The recognizer appends `.json` to the `-of` prefix
fn json_output_path(base: &Path) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".json");
    PathBuf::from(path)
}

/// Removes the recognizer output on drop, whatever the outcome
struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Resolves the recognizer on `PATH`, or checks an explicit path
fn resolve_executable(name: &str) -> Result<PathBuf, TranscriptionError> {
    let not_found = || TranscriptionError::EngineNotFound {
        executable: name.to_owned(),
    };

    let candidate = Path::new(name);
    if name.is_empty() {
        return Err(not_found());
    }
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let paths = std::env::var_os("PATH").ok_or_else(not_found)?;
    std::env::split_paths(&paths)
        .flat_map(|dir| executable_candidates(&dir, name))
        .find(|path| is_executable(path))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(not(unix))]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name), dir.join(format!("{name}.exe"))]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
