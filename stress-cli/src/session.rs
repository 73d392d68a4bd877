//! The session dispatch loop.
//!
//! Consumes decoded instructions from the connection, classifies them by
//! opcode, tracks per-frame metrics and enforces the session time limit.
//! A frame is the span between two consecutive `sync` instructions; its
//! metrics are the duration and the byte volume of non-sync traffic in
//! that span.

use std::time::Duration;

use stress_client::{InstructionReader, InstructionWriter};
use tokio::time::Instant;

/// How the session ended. All variants are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The configured time limit was reached: a clean, deliberate stop.
    TimeLimit,
    /// The remote signalled an `error` instruction; carries its detail
    /// message. An expected termination signal, not a local defect.
    RemoteError(String),
    /// The stream closed (or failed) without either of the above.
    StreamClosed,
}

/// Metrics for one completed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStats {
    /// Time since the previous frame boundary.
    pub duration: Duration,
    /// Accumulated argument bytes of non-sync instructions in the frame.
    pub bytes: usize,
}

/// Result of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// The terminal state.
    pub end: SessionEnd,
    /// Metrics for every non-empty frame, in order.
    pub frames: Vec<FrameStats>,
}

/// One stress session over an established connection.
///
/// The session clock starts when the value is created, which should
/// happen right after the connection is established.
#[derive(Debug)]
pub struct Session {
    started_at: Instant,
    time_limit: Duration,
}

impl Session {
    /// Create a session starting now. A zero `time_limit` means
    /// unlimited.
    pub fn new(time_limit: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            time_limit,
        }
    }

    /// Run the dispatch loop until a terminal state.
    ///
    /// `writer` is `Some` only when this loop is the connection's writer
    /// (load generator disabled); then every `sync` is echoed back.
    /// Passing `None` makes the loop read-only, upholding the
    /// single-writer invariant by ownership rather than locking.
    pub async fn run<R, W>(self, mut reader: R, mut writer: Option<W>) -> SessionReport
    where
        R: InstructionReader,
        W: InstructionWriter,
    {
        let deadline = (!self.time_limit.is_zero()).then(|| self.started_at + self.time_limit);
        let mut frame_start = self.started_at;
        let mut bytes: usize = 0;
        let mut frames = Vec::new();

        loop {
            // Checked before reading so a pending instruction is never
            // consumed once the limit has passed.
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::info!("Time limit reached.");
                    return SessionReport {
                        end: SessionEnd::TimeLimit,
                        frames,
                    };
                }
            }

            let next = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, reader.read_instruction()).await {
                        Ok(result) => result,
                        // A silent remote must not stall past the limit.
                        Err(_) => {
                            tracing::info!("Time limit reached.");
                            return SessionReport {
                                end: SessionEnd::TimeLimit,
                                frames,
                            };
                        }
                    }
                }
                None => reader.read_instruction().await,
            };

            let instruction = match next {
                Ok(Some(instruction)) => instruction,
                Ok(None) => {
                    tracing::error!("End of instruction stream.");
                    return SessionReport {
                        end: SessionEnd::StreamClosed,
                        frames,
                    };
                }
                Err(e) => {
                    tracing::error!("Error reading instruction stream: {}", e);
                    return SessionReport {
                        end: SessionEnd::StreamClosed,
                        frames,
                    };
                }
            };

            match instruction.opcode.as_str() {
                "sync" => {
                    let now = Instant::now();
                    if bytes != 0 {
                        let stats = FrameStats {
                            duration: now - frame_start,
                            bytes,
                        };
                        tracing::info!(
                            "Frame duration={}ms, {} bytes",
                            stats.duration.as_millis(),
                            stats.bytes
                        );
                        frames.push(stats);
                    }

                    // Echo only when this loop owns the writer.
                    if let Some(writer) = writer.as_mut() {
                        if let Err(e) = writer.write_instruction(&instruction).await {
                            tracing::error!("Failed to echo sync: {}", e);
                            return SessionReport {
                                end: SessionEnd::StreamClosed,
                                frames,
                            };
                        }
                    }

                    frame_start = now;
                    bytes = 0;
                }
                "error" => {
                    let detail = instruction.args.first().cloned().unwrap_or_default();
                    tracing::error!("Error from remote: {}", detail);
                    return SessionReport {
                        end: SessionEnd::RemoteError(detail),
                        frames,
                    };
                }
                _ => {
                    bytes += instruction
                        .args
                        .iter()
                        .map(|arg| arg.chars().count())
                        .sum::<usize>();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stress_client::{MockConnection, MockWriter};
    use stress_proto::Instruction;

    fn inst(opcode: &str, args: &[&str]) -> Instruction {
        Instruction::new(opcode, args.iter().map(|s| s.to_string()).collect())
    }

    /// The §8 reference sequence: X(3), X(5), sync, Y(2).
    fn reference_script(conn: &MockConnection) {
        conn.queue_instruction(inst("img", &["abc"]));
        conn.queue_instruction(inst("img", &["abcde"]));
        conn.queue_instruction(inst("sync", &["1000"]));
        conn.queue_instruction(inst("rect", &["xy"]));
    }

    #[tokio::test(start_paused = true)]
    async fn sync_emits_frame_and_echoes_when_sole_writer() {
        let conn = MockConnection::new();
        reference_script(&conn);

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;

        // One frame of 3 + 5 bytes; the trailing rect lands in the next,
        // never-completed frame.
        assert_eq!(report.frames.len(), 1);
        assert_eq!(report.frames[0].bytes, 8);

        let echoed = conn.written_instructions();
        assert_eq!(echoed, vec![inst("sync", &["1000"])]);

        // Stream ends after the script.
        assert_eq!(report.end, SessionEnd::StreamClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn counter_resets_at_frame_boundary() {
        let conn = MockConnection::new();
        reference_script(&conn);
        // Close the second frame so its counter is observable.
        conn.queue_instruction(inst("sync", &["2000"]));

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;

        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.frames[0].bytes, 8);
        assert_eq!(report.frames[1].bytes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_frames_are_not_recorded() {
        let conn = MockConnection::new();
        conn.queue_instruction(inst("sync", &["1"]));
        conn.queue_instruction(inst("sync", &["2"]));

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;

        assert!(report.frames.is_empty());
        // Both syncs are still echoed.
        assert_eq!(conn.written_instructions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hammer_mode_never_writes() {
        let conn = MockConnection::new();
        reference_script(&conn);

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), None::<MockWriter>).await;

        assert_eq!(report.frames.len(), 1);
        assert_eq!(report.frames[0].bytes, 8);
        assert!(conn.written_instructions().is_empty());
        assert!(conn.written_raw().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_ends_without_consuming_pending_input() {
        let conn = MockConnection::new();
        conn.queue_instruction(inst("img", &["abc"]));

        let session = Session::new(Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(150)).await;

        let report = session.run(conn.reader(), Some(conn.writer())).await;
        assert_eq!(report.end, SessionEnd::TimeLimit);
        assert_eq!(conn.unread_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_ends_session_without_further_reads() {
        let conn = MockConnection::new();
        conn.queue_instruction(inst("error", &["connection refused"]));
        conn.queue_instruction(inst("img", &["never read"]));

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;

        assert_eq!(
            report.end,
            SessionEnd::RemoteError("connection refused".to_string())
        );
        assert_eq!(conn.unread_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_without_detail() {
        let conn = MockConnection::new();
        conn.queue_instruction(inst("error", &[]));

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;
        assert_eq!(report.end, SessionEnd::RemoteError(String::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_stream_is_distinct_from_time_limit() {
        let conn = MockConnection::new();

        let session = Session::new(Duration::from_millis(100));
        let report = session.run(conn.reader(), Some(conn.writer())).await;
        assert_eq!(report.end, SessionEnd::StreamClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn read_error_ends_stream_closed() {
        let conn = MockConnection::new();
        conn.fail_next_read("connection reset");

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;
        assert_eq!(report.end, SessionEnd::StreamClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn byte_counter_uses_code_points() {
        let conn = MockConnection::new();
        conn.queue_instruction(inst("name", &["héllo"]));
        conn.queue_instruction(inst("sync", &["1"]));

        let session = Session::new(Duration::ZERO);
        let report = session.run(conn.reader(), Some(conn.writer())).await;
        // 5 code points, although 6 bytes of UTF-8.
        assert_eq!(report.frames[0].bytes, 5);
    }
}
