//! The narrow external-codec boundary (spec §4.7). The core never links
//! against WSQ/JP2/NFIQ directly; it depends only on this trait.

use crate::error::{EftError, EftResult};

/// Decoded raw pixel buffer plus the geometry the codec reported.
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
}

/// WSQ/JP2/NFIQ capability set. Real backends are process-exec shims; tests
/// and callers without the external tools installed use [`NullCodec`].
pub trait CodecAdapter: Send + Sync {
    fn encode_wsq(&self, raw: &[u8], width: u16, height: u16, bpp: u8, ppi: u16, bitrate: f32) -> EftResult<Vec<u8>>;

    fn decode_wsq(&self, bytes: &[u8]) -> EftResult<DecodedImage>;

    /// JP2 encoding is optional; adapters that don't support it return
    /// `CodecFailure`, which the orchestrator treats like any other
    /// codec-step failure.
    fn encode_jp2(&self, raw_or_png: &[u8], ratio: f32) -> EftResult<Vec<u8>>;

    /// NFIQ quality score in `1..=5`, or `255` on scoring failure (spec
    /// §4.7) — a failed score is a valid result, not an error.
    fn score_nfiq(&self, image: &[u8]) -> u8;

    /// Post-assembly sanity check. A missing validator, or one that can't
    /// run, is represented by returning `(true, None)` rather than an error
    /// — validation failures are warnings (spec §4.7), never fatal.
    fn validate(&self, bytes: &[u8]) -> (bool, Option<String>);
}

/// No-op adapter: every encode/decode call fails, `validate` always passes.
/// Useful for exercising the record model and orchestrator plumbing without
/// any external tool installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCodec;

impl CodecAdapter for NullCodec {
    fn encode_wsq(&self, _raw: &[u8], _width: u16, _height: u16, _bpp: u8, _ppi: u16, _bitrate: f32) -> EftResult<Vec<u8>> {
        Err(EftError::CodecFailure("NullCodec cannot encode WSQ".to_string()))
    }

    fn decode_wsq(&self, _bytes: &[u8]) -> EftResult<DecodedImage> {
        Err(EftError::CodecFailure("NullCodec cannot decode WSQ".to_string()))
    }

    fn encode_jp2(&self, _raw_or_png: &[u8], _ratio: f32) -> EftResult<Vec<u8>> {
        Err(EftError::CodecFailure("NullCodec cannot encode JP2".to_string()))
    }

    fn score_nfiq(&self, _image: &[u8]) -> u8 {
        255
    }

    fn validate(&self, _bytes: &[u8]) -> (bool, Option<String>) {
        (true, None)
    }
}

/// Shape of a process-exec adapter backed by the NBIS command-line tools
/// (`cwsq`, `dwsq`, `nfiq`, `an2k`), matching `nbis_helper.py::run_command`:
/// one invocation in, one result out, a non-zero exit or missing stdout is a
/// [`EftError::CodecFailure`] rather than a panic. Exact argument lists and
/// binary locations are the host process's concern — out of scope here
/// (spec §1) — so this type documents the contract without hardcoding paths.
pub struct ProcessCodec {
    pub cwsq_path: std::path::PathBuf,
    pub dwsq_path: std::path::PathBuf,
    pub nfiq_path: std::path::PathBuf,
}

impl ProcessCodec {
    pub fn new(
        cwsq_path: impl Into<std::path::PathBuf>,
        dwsq_path: impl Into<std::path::PathBuf>,
        nfiq_path: impl Into<std::path::PathBuf>,
    ) -> Self {
        ProcessCodec {
            cwsq_path: cwsq_path.into(),
            dwsq_path: dwsq_path.into(),
            nfiq_path: nfiq_path.into(),
        }
    }

    fn run(&self, mut command: std::process::Command) -> EftResult<Vec<u8>> {
        let output = command
            .output()
            .map_err(|err| EftError::CodecFailure(format!("failed to spawn codec process: {err}")))?;
        if !output.status.success() {
            return Err(EftError::CodecFailure(format!(
                "codec process exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        if output.stdout.is_empty() {
            return Err(EftError::CodecFailure("codec process produced no output".to_string()));
        }
        Ok(output.stdout)
    }
}

impl CodecAdapter for ProcessCodec {
    fn encode_wsq(&self, raw: &[u8], width: u16, height: u16, bpp: u8, ppi: u16, bitrate: f32) -> EftResult<Vec<u8>> {
        use std::io::Write;
        let mut scratch_in = tempfile::NamedTempFile::new().map_err(EftError::from)?;
        scratch_in.write_all(raw).map_err(EftError::from)?;
        let mut command = std::process::Command::new(&self.cwsq_path);
        command
            .arg(bitrate.to_string())
            .arg("raw")
            .arg(width.to_string())
            .arg(height.to_string())
            .arg(bpp.to_string())
            .arg(ppi.to_string())
            .arg(scratch_in.path());
        self.run(command)
    }

    fn decode_wsq(&self, bytes: &[u8]) -> EftResult<DecodedImage> {
        use std::io::Write;
        let mut scratch_in = tempfile::NamedTempFile::new().map_err(EftError::from)?;
        scratch_in.write_all(bytes).map_err(EftError::from)?;
        let mut command = std::process::Command::new(&self.dwsq_path);
        command.arg(scratch_in.path());
        let pixels = self.run(command)?;
        Err(EftError::CodecFailure(format!(
            "dwsq produced {} raw bytes but geometry parsing is a host-process concern",
            pixels.len()
        )))
    }

    fn encode_jp2(&self, _raw_or_png: &[u8], _ratio: f32) -> EftResult<Vec<u8>> {
        Err(EftError::CodecFailure("JP2 encoding requires a host-provided binary path".to_string()))
    }

    fn score_nfiq(&self, image: &[u8]) -> u8 {
        use std::io::Write;
        let Ok(mut scratch_in) = tempfile::NamedTempFile::new() else {
            return 255;
        };
        if scratch_in.write_all(image).is_err() {
            return 255;
        }
        let mut command = std::process::Command::new(&self.nfiq_path);
        command.arg(scratch_in.path());
        match self.run(command) {
            Ok(stdout) => String::from_utf8_lossy(&stdout)
                .trim()
                .parse::<u8>()
                .unwrap_or(255),
            Err(_) => 255,
        }
    }

    fn validate(&self, _bytes: &[u8]) -> (bool, Option<String>) {
        (true, Some("ProcessCodec has no an2k binary configured".to_string()))
    }
}
