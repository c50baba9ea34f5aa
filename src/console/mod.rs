// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Synchronized console output.
//!
//! Every write to the terminal (output lines, the progress line, banner and
//! summary text) and to the optional log file goes through a single mutex
//! owned by [`Console`]. A line is therefore always written in one piece and
//! the progress line is never drawn in the middle of a host's output.

mod line;
mod progress;
mod terminal;

pub use line::{format_output_line, StreamKind};
pub use progress::{Progress, PROGRESS_CLEAR_WIDTH};
pub use terminal::{is_tty, should_use_colors};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Rendering options for the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Draw the carriage-return based progress line
    pub interactive: bool,
    /// Color the stream arrows
    pub colors: bool,
}

impl ConsoleOptions {
    /// Detect capabilities of the process stdout.
    pub fn detect() -> Self {
        Self {
            interactive: is_tty(),
            colors: should_use_colors(),
        }
    }

    /// Plain output suitable for pipes and files.
    pub fn plain() -> Self {
        Self {
            interactive: false,
            colors: false,
        }
    }
}

/// Append-only copy of the output without color codes
pub struct LogSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogSink {
    /// Create (or truncate) the log file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct ConsoleInner {
    out: Box<dyn Write + Send>,
    /// Set once a terminal write fails; later terminal writes are skipped
    terminal_failed: bool,
    log: Option<LogSink>,
    log_failure: Option<String>,
    progress_width: usize,
    /// Most advanced progress drawn so far
    shown: Option<Progress>,
}

impl ConsoleInner {
    fn clear_progress(&mut self, interactive: bool) -> io::Result<()> {
        if !interactive {
            return Ok(());
        }
        let width = self.progress_width.max(PROGRESS_CLEAR_WIDTH);
        write!(self.out, "\r{:width$}\r", "")
    }

    /// Draw `progress`, or the last drawn one if that is further along.
    fn render_progress(&mut self, interactive: bool, progress: Progress) -> io::Result<()> {
        if !interactive {
            return Ok(());
        }
        let progress = match self.shown {
            Some(shown) if shown.total == progress.total && shown.complete > progress.complete => {
                shown
            }
            _ => progress,
        };
        self.shown = Some(progress);

        let text = progress.to_string();
        self.progress_width = text.chars().count();
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    fn erase_progress(&mut self, interactive: bool) -> io::Result<()> {
        self.clear_progress(interactive)?;
        self.out.flush()
    }

    fn redraw_progress(&mut self, interactive: bool, progress: Progress) -> io::Result<()> {
        self.clear_progress(interactive)?;
        self.render_progress(interactive, progress)
    }

    fn write_terminal_line(
        &mut self,
        interactive: bool,
        text: &str,
        progress: Progress,
    ) -> io::Result<()> {
        self.clear_progress(interactive)?;
        writeln!(self.out, "{text}")?;
        self.render_progress(interactive, progress)?;
        self.out.flush()
    }

    /// Stop writing to the terminal after the first failure.
    fn check_terminal(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            tracing::warn!("Writing to the terminal failed, output is no longer shown: {}", e);
            self.terminal_failed = true;
        }
    }

    fn write_log_line(&mut self, text: &str) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let result = writeln!(log.writer, "{text}");
        if let Err(e) = result {
            self.fail_log(e);
        }
    }

    fn flush_log(&mut self) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let result = log.writer.flush();
        if let Err(e) = result {
            self.fail_log(e);
        }
    }

    /// Drop the log sink after a write error. Terminal output continues.
    fn fail_log(&mut self, error: io::Error) {
        if let Some(log) = self.log.take() {
            tracing::warn!(
                "Writing log file {} failed, output is no longer logged: {}",
                log.path().display(),
                error
            );
            self.log_failure = Some(format!("{}: {}", log.path().display(), error));
        }
    }
}

/// Shared terminal writer
///
/// Output lines are written to the terminal and the log independently: a
/// failing sink is disabled with a warning and never interrupts draining.
pub struct Console {
    inner: Mutex<ConsoleInner>,
    options: ConsoleOptions,
}

impl Console {
    /// Console writing to the process stdout.
    pub fn stdout(options: ConsoleOptions, log: Option<LogSink>) -> Self {
        Self::new(Box::new(io::stdout()), options, log)
    }

    pub fn new(out: Box<dyn Write + Send>, options: ConsoleOptions, log: Option<LogSink>) -> Self {
        Self {
            inner: Mutex::new(ConsoleInner {
                out,
                terminal_failed: false,
                log,
                log_failure: None,
                progress_width: 0,
                shown: None,
            }),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Erase the progress line.
    pub fn clear_progress(&self) {
        let mut inner = self.lock();
        if inner.terminal_failed {
            return;
        }
        let result = inner.erase_progress(self.options.interactive);
        inner.check_terminal(result);
    }

    /// Redraw the progress line from scratch.
    pub fn update_progress(&self, progress: Progress) {
        let interactive = self.options.interactive;
        let mut inner = self.lock();
        if inner.terminal_failed {
            return;
        }
        let result = inner.redraw_progress(interactive, progress);
        inner.check_terminal(result);
    }

    /// Write one host output line, mirror it to the log and redraw progress.
    pub fn write_output(
        &self,
        address: &str,
        width: usize,
        stream: StreamKind,
        line: &str,
        progress: Progress,
    ) {
        let mut inner = self.lock();

        if !inner.terminal_failed {
            let text = format_output_line(address, width, stream, line, self.options.colors);
            let result = inner.write_terminal_line(self.options.interactive, &text, progress);
            inner.check_terminal(result);
        }

        if inner.log.is_some() {
            let text = format_output_line(address, width, stream, line, false);
            inner.write_log_line(&text);
        }
    }

    /// Print a line of tool text (banner, summary). Not copied to the log.
    pub fn println(&self, text: &str) -> io::Result<()> {
        let mut inner = self.lock();
        writeln!(inner.out, "{text}")?;
        inner.out.flush()
    }

    /// Flush the terminal and the log file.
    pub fn flush(&self) -> io::Result<()> {
        let mut inner = self.lock();
        inner.flush_log();
        if inner.terminal_failed {
            return Ok(());
        }
        inner.out.flush()
    }

    /// Why the log file stopped receiving output, if it did.
    pub fn log_failure(&self) -> Option<String> {
        self.lock().log_failure.clone()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory writer used to inspect console output.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// What a terminal would show after processing carriage returns.
    pub fn visible_lines(raw: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Vec<char> = Vec::new();
        let mut cursor = 0;
        for ch in raw.chars() {
            match ch {
                '\r' => cursor = 0,
                '\n' => {
                    lines.push(current.iter().collect::<String>().trim_end().to_string());
                    current.clear();
                    cursor = 0;
                }
                c => {
                    if cursor < current.len() {
                        current[cursor] = c;
                    } else {
                        current.push(c);
                    }
                    cursor += 1;
                }
            }
        }
        lines.push(current.iter().collect::<String>().trim_end().to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{visible_lines, SharedBuffer};
    use super::*;

    fn interactive() -> ConsoleOptions {
        ConsoleOptions {
            interactive: true,
            colors: false,
        }
    }

    #[test]
    fn test_write_output_redraws_progress() {
        let buffer = SharedBuffer::default();
        let console = Console::new(Box::new(buffer.clone()), interactive(), None);

        console.update_progress(Progress::new(0, 2));
        console
            .write_output("a", 2, StreamKind::Stdout, "hello", Progress::new(0, 2));

        let lines = visible_lines(&buffer.contents());
        assert_eq!(lines, vec!["  a -> hello", "[0/2] 0.00% complete"]);
    }

    #[test]
    fn test_clear_and_render_is_idempotent() {
        let once = SharedBuffer::default();
        let console = Console::new(Box::new(once.clone()), interactive(), None);
        console.clear_progress();
        console.update_progress(Progress::new(1, 3));

        let twice = SharedBuffer::default();
        let console = Console::new(Box::new(twice.clone()), interactive(), None);
        for _ in 0..2 {
            console.clear_progress();
            console.update_progress(Progress::new(1, 3));
        }

        assert_eq!(
            visible_lines(&once.contents()),
            visible_lines(&twice.contents())
        );
        assert_eq!(
            visible_lines(&twice.contents()),
            vec!["[1/3] 33.33% complete"]
        );
    }

    #[test]
    fn test_clear_covers_wide_progress_line() {
        let buffer = SharedBuffer::default();
        let console = Console::new(Box::new(buffer.clone()), interactive(), None);
        console.update_progress(Progress::new(9999, 10000));
        console.clear_progress();

        assert_eq!(visible_lines(&buffer.contents()), vec![""]);
    }

    #[test]
    fn test_plain_console_has_no_progress() {
        let buffer = SharedBuffer::default();
        let console = Console::new(Box::new(buffer.clone()), ConsoleOptions::plain(), None);

        console.update_progress(Progress::new(1, 2));
        console
            .write_output("host", 4, StreamKind::Stderr, "oops", Progress::new(1, 2));
        console.clear_progress();

        assert_eq!(buffer.contents(), " host -> oops\n");
    }

    #[test]
    fn test_log_sink_receives_uncolored_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = LogSink::create(&path).unwrap();
        assert_eq!(log.path(), path.as_path());

        let buffer = SharedBuffer::default();
        let options = ConsoleOptions {
            interactive: true,
            colors: true,
        };
        let console = Console::new(Box::new(buffer.clone()), options, Some(log));
        console
            .write_output("bb", 3, StreamKind::Stdout, "ok", Progress::new(0, 1));
        console.println("banner").unwrap();
        console.flush().unwrap();

        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged, "  bb -> ok\n");
        assert!(buffer.contents().contains("\x1b["));
    }

    #[test]
    fn test_log_sink_create_fails_for_missing_directory() {
        let result = LogSink::create(Path::new("/nonexistent/gssh/run.log"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stale_progress_does_not_replace_newer() {
        let buffer = SharedBuffer::default();
        let console = Console::new(Box::new(buffer.clone()), interactive(), None);

        console.update_progress(Progress::new(2, 3));
        console.write_output("a", 1, StreamKind::Stdout, "late", Progress::new(1, 3));

        let lines = visible_lines(&buffer.contents());
        assert_eq!(lines, vec![" a -> late", "[2/3] 66.67% complete"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_full_log_device_disables_log_only() {
        let log = LogSink::create(Path::new("/dev/full")).unwrap();
        let buffer = SharedBuffer::default();
        let console = Console::new(
            Box::new(buffer.clone()),
            ConsoleOptions::plain(),
            Some(log),
        );

        for i in 0..2000 {
            let line = format!("line {i}");
            console.write_output("h", 1, StreamKind::Stdout, &line, Progress::new(0, 1));
        }
        console.flush().unwrap();

        let contents = buffer.contents();
        assert_eq!(contents.lines().count(), 2000);
        assert!(contents.ends_with(" h -> line 1999\n"));
        assert!(console.log_failure().unwrap().starts_with("/dev/full: "));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_terminal_keeps_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = LogSink::create(&path).unwrap();
        let console = Console::new(Box::new(ClosedPipe), interactive(), Some(log));

        console.update_progress(Progress::new(0, 1));
        console.write_output("h", 1, StreamKind::Stdout, "one", Progress::new(0, 1));
        console.write_output("h", 1, StreamKind::Stderr, "two", Progress::new(0, 1));
        console.clear_progress();
        console.flush().unwrap();

        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged, " h -> one\n h -> two\n");
        assert!(console.log_failure().is_none());
    }
}
