use super::class_file::SectionKind;
use super::code::Label;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The byte sink would grow past its configured capacity
    BufferCapacityExceeded {
        capacity: usize,
        position: usize,
        requested: usize,
    },

    /// A patch targets bytes that were never written (indicates a framing bug)
    InvalidPatchOffset {
        offset: usize,
        width: usize,
        written: usize,
    },

    /// An operand does not fit any encoding supported by its instruction
    OperandRange { instruction: String, value: i64 },

    /// An operation was invoked outside of the section where it is valid
    ProtocolState {
        operation: &'static str,
        state: &'static str,
    },

    /// A count or length no longer fits in its reserved field
    SectionOverflow { kind: SectionKind, value: u64 },

    /// Method code array is longer than the 65535 bytes the format allows
    MethodCodeOverflow(usize),

    /// A label was marked twice
    DuplicateLabel(Label),

    /// A label is still referenced by some branch but was never marked
    UnresolvedLabel(Label),

    /// A label which was not reserved by the current code attribute
    UnknownLabel(Label),

    /// A label got marked further away than a jump already waiting on it can reach
    ///
    /// Labels only ever get marked at increasing positions, so that jump can never be patched.
    UnreachableLabel {
        label: Label,
        instruction: String,
        offset: i64,
    },

    IoError(std::io::Error),
}

impl Error {
    /// Fatal errors leave the class in a state that cannot be resumed
    ///
    /// Everything else is raised before any byte of the offending operation reaches the sink.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::BufferCapacityExceeded { .. }
                | Error::InvalidPatchOffset { .. }
                | Error::MethodCodeOverflow(_)
                | Error::UnreachableLabel { .. }
                | Error::IoError(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferCapacityExceeded {
                capacity,
                position,
                requested,
            } => write!(
                f,
                "buffer capacity of {} bytes exceeded writing {} bytes at {}",
                capacity, requested, position
            ),
            Error::InvalidPatchOffset {
                offset,
                width,
                written,
            } => write!(
                f,
                "cannot patch {} bytes at offset {} (only {} bytes written)",
                width, offset, written
            ),
            Error::OperandRange { instruction, value } => {
                write!(f, "operand {} out of range for {}", value, instruction)
            }
            Error::ProtocolState { operation, state } => {
                write!(f, "`{}` is not valid while {}", operation, state)
            }
            Error::SectionOverflow { kind, value } => {
                write!(f, "{:?} section overflowed with value {}", kind, value)
            }
            Error::MethodCodeOverflow(len) => {
                write!(f, "method code is {} bytes long (max is 65535)", len)
            }
            Error::DuplicateLabel(label) => write!(f, "label {:?} marked twice", label),
            Error::UnresolvedLabel(label) => write!(f, "label {:?} never marked", label),
            Error::UnknownLabel(label) => write!(f, "label {:?} was not reserved", label),
            Error::UnreachableLabel {
                label,
                instruction,
                offset,
            } => write!(
                f,
                "label {:?} is {} bytes away from {}, which cannot reach it",
                label, offset, instruction
            ),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}
