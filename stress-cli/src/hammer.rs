//! The load generator ("hammer").
//!
//! Continuously writes random, syntactically well-formed protocol
//! elements whose boundaries never line up with coherent instruction
//! framing, exercising the remote parser's robustness. Every element
//! names a reserved opcode (leading `_`), which no real protocol opcode
//! uses, so the remote side can never interpret the traffic.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use stress_client::{InstructionWriter, TransportError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Maximum random element content length, in characters.
pub const MAX_CONTENT_LENGTH: usize = 1024;

/// Lowest codepoint used in random element content.
const MIN_CHAR: u8 = 0x20;
/// Highest codepoint used in random element content.
const MAX_CHAR: u8 = 0x7F;

/// How the hammer task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HammerOutcome {
    /// The shutdown signal fired.
    Stopped,
    /// A write failed; the generator stopped without affecting the
    /// session outcome.
    WriteFailed,
}

/// Produce one random protocol element, terminator included.
///
/// The element is `decimal(1 + L)` + `.` + `_` + `L` random characters in
/// `[0x20, 0x7F]`, with `L` uniform in `[1, 1024]` and a terminator
/// chosen uniformly from `,` and `;`. The `1 +` in the length prefix
/// accounts for the `_` sentinel; the declared length must stay
/// numerically exact or the traffic stops being well-formed.
pub fn random_element<R: Rng>(rng: &mut R) -> String {
    let length = rng.gen_range(1..=MAX_CONTENT_LENGTH);
    let mut element = String::with_capacity(length + 8);
    element.push_str(&(length + 1).to_string());
    element.push('.');
    element.push('_');
    for _ in 0..length {
        element.push(rng.gen_range(MIN_CHAR..=MAX_CHAR) as char);
    }
    element.push(if rng.gen_bool(0.5) { ',' } else { ';' });
    element
}

/// Write `s` through the raw channel in random-length chunks, simulating
/// arbitrary network segmentation.
///
/// Chunk sizes are drawn uniformly from `[1, len(s)]` and clamped to the
/// remaining length, so the loop always makes progress and the emitted
/// chunks concatenate back to `s` exactly. The first write failure is
/// returned; nothing is retried.
pub async fn write_randomly<R, W>(
    writer: &mut W,
    rng: &mut R,
    s: &str,
) -> Result<(), TransportError>
where
    R: Rng,
    W: InstructionWriter + ?Sized,
{
    let original_len = s.len();
    let mut remaining = s.as_bytes();
    while !remaining.is_empty() {
        let size = rng.gen_range(1..=original_len).min(remaining.len());
        let (chunk, rest) = remaining.split_at(size);
        writer.write_raw(chunk).await?;
        remaining = rest;
    }
    Ok(())
}

/// Spawn the hammer on its own task.
///
/// The task loops forever: synthesize an element, fragment-write it,
/// optionally pause for `pacing`, repeat. It never reads from the
/// connection. It ends when `shutdown` is signalled or a write fails,
/// and reports which through its join handle.
pub fn spawn_hammer<W>(
    mut writer: W,
    mut rng: StdRng,
    pacing: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<HammerOutcome>
where
    W: InstructionWriter + 'static,
{
    tokio::spawn(async move {
        loop {
            let element = random_element(&mut rng);
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    tracing::debug!("Hammer stopped");
                    return HammerOutcome::Stopped;
                }
                result = write_randomly(&mut writer, &mut rng, &element) => {
                    if let Err(e) = result {
                        tracing::debug!("Hammer write failed: {}", e);
                        return HammerOutcome::WriteFailed;
                    }
                }
            }
            if let Some(pause) = pacing {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => {
                        tracing::debug!("Hammer stopped");
                        return HammerOutcome::Stopped;
                    }
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }
    })
}
