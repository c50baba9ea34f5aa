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

//! Line-by-line draining of one session output stream.

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::host::RemoteHost;
use crate::console::{Console, Progress, StreamKind};

/// Consumes one stream of a session until end-of-stream.
pub struct OutputDrainer<'a> {
    host: &'a RemoteHost,
    stream: StreamKind,
    console: &'a Console,
    width: usize,
}

impl<'a> OutputDrainer<'a> {
    pub fn new(host: &'a RemoteHost, stream: StreamKind, console: &'a Console, width: usize) -> Self {
        Self {
            host,
            stream,
            console,
            width,
        }
    }

    /// Forward every line of `reader` to the console and count it.
    ///
    /// Only read errors end the drain early. Console and log failures are
    /// handled by the console itself.
    ///
    /// `progress` is sampled before each line so the redrawn progress line
    /// reflects the group state at that moment. A final line without a
    /// trailing newline is forwarded like any other. Returns the number of
    /// lines drained.
    pub async fn drain<R, F>(self, reader: R, progress: F) -> io::Result<usize>
    where
        R: AsyncRead + Unpin,
        F: Fn() -> Progress,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(256);
        let mut count = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(trim_line_ending(&buf));
            self.console.write_output(
                self.host.address(),
                self.width,
                self.stream,
                &line,
                progress(),
            );
            self.host.record_line(self.stream);
            count += 1;
        }

        tracing::trace!(
            "{} {} drained ({} lines)",
            self.host.address(),
            self.stream,
            count
        );
        Ok(count)
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::SharedBuffer;
    use crate::console::ConsoleOptions;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    fn plain_console() -> (Console, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let console = Console::new(Box::new(buffer.clone()), ConsoleOptions::plain(), None);
        (console, buffer)
    }

    #[tokio::test]
    async fn test_drain_counts_lines() {
        let (console, buffer) = plain_console();
        let host = RemoteHost::new(0, "root", "bb");

        let drained = OutputDrainer::new(&host, StreamKind::Stdout, &console, 3)
            .drain(Cursor::new(b"one\ntwo\r\nthree\n".to_vec()), Progress::default)
            .await
            .unwrap();

        assert_eq!(drained, 3);
        assert_eq!(host.stdout_lines(), 3);
        assert_eq!(host.stderr_lines(), 0);
        assert_eq!(
            buffer.contents(),
            "  bb -> one\n  bb -> two\n  bb -> three\n"
        );
    }

    #[tokio::test]
    async fn test_drain_forwards_unterminated_last_line() {
        let (console, buffer) = plain_console();
        let host = RemoteHost::new(0, "root", "a");

        OutputDrainer::new(&host, StreamKind::Stderr, &console, 1)
            .drain(Cursor::new(b"first\npartial".to_vec()), Progress::default)
            .await
            .unwrap();

        assert_eq!(host.stderr_lines(), 2);
        assert_eq!(buffer.contents(), " a -> first\n a -> partial\n");
    }

    #[tokio::test]
    async fn test_drain_empty_stream() {
        let (console, buffer) = plain_console();
        let host = RemoteHost::new(0, "root", "a");

        let drained = OutputDrainer::new(&host, StreamKind::Stdout, &console, 1)
            .drain(Cursor::new(Vec::new()), Progress::default)
            .await
            .unwrap();

        assert_eq!(drained, 0);
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn test_drain_keeps_blank_and_invalid_utf8_lines() {
        let (console, buffer) = plain_console();
        let host = RemoteHost::new(0, "root", "a");

        OutputDrainer::new(&host, StreamKind::Stdout, &console, 1)
            .drain(Cursor::new(b"\n\xff\xfe\n".to_vec()), Progress::default)
            .await
            .unwrap();

        assert_eq!(host.stdout_lines(), 2);
        assert_eq!(buffer.contents(), " a -> \n a -> \u{fffd}\u{fffd}\n");
    }

    /// Yields some data, then fails the way a broken pipe would.
    struct FailingReader {
        data: Option<Vec<u8>>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.data.take() {
                Some(data) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "connection reset",
                ))),
            }
        }
    }

    #[tokio::test]
    async fn test_drain_propagates_read_errors() {
        let (console, buffer) = plain_console();
        let host = RemoteHost::new(0, "root", "a");
        let reader = FailingReader {
            data: Some(b"before\n".to_vec()),
        };

        let err = OutputDrainer::new(&host, StreamKind::Stdout, &console, 1)
            .drain(reader, Progress::default)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(host.stdout_lines(), 1);
        assert_eq!(buffer.contents(), " a -> before\n");
    }
}
