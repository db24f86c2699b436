//! Size-adaptive compression retry loop (spec §4.6).
//!
//! The orchestrator never mutates a previous attempt's bytes: each rung of
//! the ladder is a complete, independent assembly, so `1.001`/`14.999`/CNT
//! invariants always hold on whatever gets returned. Mirrors the teacher's
//! `Compressor` enum dispatch (`encoder/compression/mod.rs`) in spirit: one
//! algorithm, uniformly invoked, the caller supplies the "how" per rung.

use crate::config::Config;
use crate::error::{EftError, EftResult};
use crate::scratch::CancellationToken;

/// One rung of the compression ladder: either no compression, or WSQ at a
/// specific bitrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rung {
    None,
    Wsq(f32),
}

impl std::fmt::Display for Rung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rung::None => write!(f, "NONE"),
            Rung::Wsq(bitrate) => write!(f, "WSQ@{bitrate}"),
        }
    }
}

/// Result of a full orchestrated run: the smallest assembly produced, the
/// rung that produced it, and `Some(SizeBudgetExceeded)` if the ladder was
/// exhausted without meeting the ceiling.
pub struct OrchestratorResult {
    pub bytes: Vec<u8>,
    pub rung: Rung,
    pub warning: Option<EftError>,
}

/// Drives `assemble` across `NONE` then the configured bitrate ladder,
/// stopping at the first rung whose output is within `config.size_ceiling_bytes`.
///
/// `assemble` must perform one complete, independent assembly for the given
/// rung and return its bytes. Checked for cancellation between rungs via
/// `token`.
pub fn run<F>(config: &Config, token: &CancellationToken, mut assemble: F) -> EftResult<OrchestratorResult>
where
    F: FnMut(Rung) -> EftResult<Vec<u8>>,
{
    let mut rungs = Vec::with_capacity(1 + config.bitrate_ladder.len());
    rungs.push(Rung::None);
    rungs.extend(config.bitrate_ladder.iter().copied().map(Rung::Wsq));

    let mut smallest: Option<(Rung, Vec<u8>)> = None;

    for rung in rungs {
        token.check()?;
        let bytes = match assemble(rung) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%rung, error = %err, "codec step failed, trying next rung");
                continue;
            }
        };
        let size = bytes.len();
        tracing::info!(%rung, size, ceiling = config.size_ceiling_bytes, "assembled attempt");
        let fits = size <= config.size_ceiling_bytes;
        let is_smaller = smallest.as_ref().map(|(_, b)| size < b.len()).unwrap_or(true);
        if is_smaller {
            smallest = Some((rung, bytes));
        }
        if fits {
            let (rung, bytes) = smallest.unwrap();
            return Ok(OrchestratorResult {
                bytes,
                rung,
                warning: None,
            });
        }
    }

    match smallest {
        Some((rung, bytes)) => {
            let warning = EftError::SizeBudgetExceeded {
                smallest_bytes: bytes.len(),
                ceiling: config.size_ceiling_bytes,
            };
            tracing::warn!(%rung, smallest_bytes = bytes.len(), "bitrate ladder exhausted");
            Ok(OrchestratorResult {
                bytes,
                rung,
                warning: Some(warning),
            })
        }
        None => Err(EftError::CodecFailure(
            "every rung of the compression ladder failed".to_string(),
        )),
    }
}
