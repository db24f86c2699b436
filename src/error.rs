use std::fmt;
use std::io;

/// Error taxonomy for the EFT codec.
///
/// The list of variants may grow. Matching against this exhaustively is not
/// covered by interface stability guarantees.
#[derive(Debug)]
#[non_exhaustive]
pub enum EftError {
    /// A biographic value violates a Type-2 rule the encoder cannot
    /// auto-fix, or an image asset has a zero dimension.
    InvalidInput(String),

    /// The length solver did not converge within its iteration cap.
    LengthUnstable { record_type: u16, idc: u16 },

    /// An external codec invocation failed or returned no output.
    CodecFailure(String),

    /// The bitrate ladder was exhausted and the file still exceeds the size
    /// ceiling. Non-fatal: callers receive this alongside the smallest file
    /// that was produced.
    SizeBudgetExceeded { smallest_bytes: usize, ceiling: usize },

    /// The decoder reached an unrecoverable state: bad tag shape, impossible
    /// length, or a truncated binary header.
    ParseFailure { offset: usize, reason: String },

    /// A post-assembly validator disagreed with the encoder. The file is
    /// still returned to the caller.
    ValidationWarning(String),

    /// The operation was cancelled at a checkpoint between records.
    Cancelled,

    /// Underlying I/O error.
    Io(io::Error),
}

impl fmt::Display for EftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EftError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EftError::LengthUnstable { record_type, idc } => write!(
                f,
                "length solver did not converge for record type {record_type} (IDC {idc})"
            ),
            EftError::CodecFailure(msg) => write!(f, "codec failure: {msg}"),
            EftError::SizeBudgetExceeded {
                smallest_bytes,
                ceiling,
            } => write!(
                f,
                "size budget exceeded: smallest produced file was {smallest_bytes} bytes, ceiling is {ceiling}"
            ),
            EftError::ParseFailure { offset, reason } => {
                write!(f, "parse failure at offset {offset}: {reason}")
            }
            EftError::ValidationWarning(msg) => write!(f, "validation warning: {msg}"),
            EftError::Cancelled => write!(f, "operation cancelled"),
            EftError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for EftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EftError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EftError {
    fn from(err: io::Error) -> Self {
        EftError::Io(err)
    }
}

/// Result of an encoding/decoding operation.
pub type EftResult<T> = Result<T, EftError>;
