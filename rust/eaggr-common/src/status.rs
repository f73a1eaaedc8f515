//! Status codes reported by the native geometry engine.

use crate::error::{Error, ErrorKind};

/// The closed set of return codes every engine entry point reports.
///
/// The numeric values are the ordinals of the engine's C enumeration and must
/// not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0,
    NotImplemented = 1,
    InvalidHandle = 2,
    InvalidParam = 3,
    NullPointer = 4,
    ModelError = 5,
    CellLengthTooLong = 6,
    MemoryAllocationFailure = 7,
    UnknownError = 8,
}

impl StatusCode {
    /// Returns the raw code as passed across the boundary.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// Name of the code as it appears in the engine header.
    pub const fn name(self) -> &'static str {
        match self {
            StatusCode::Success => "DGGS_SUCCESS",
            StatusCode::NotImplemented => "DGGS_NOT_IMPLEMENTED",
            StatusCode::InvalidHandle => "DGGS_INVALID_HANDLE",
            StatusCode::InvalidParam => "DGGS_INVALID_PARAM",
            StatusCode::NullPointer => "DGGS_NULL_POINTER",
            StatusCode::ModelError => "DGGS_MODEL_ERROR",
            StatusCode::CellLengthTooLong => "DGGS_CELL_LENGTH_TOO_LONG",
            StatusCode::MemoryAllocationFailure => "DGGS_MEMORY_ALLOCATION_FAILURE",
            StatusCode::UnknownError => "DGGS_UNKNOWN_ERROR",
        }
    }
}

impl TryFrom<i32> for StatusCode {
    type Error = Error;

    fn try_from(raw: i32) -> Result<Self, Error> {
        let code = match raw {
            0 => StatusCode::Success,
            1 => StatusCode::NotImplemented,
            2 => StatusCode::InvalidHandle,
            3 => StatusCode::InvalidParam,
            4 => StatusCode::NullPointer,
            5 => StatusCode::ModelError,
            6 => StatusCode::CellLengthTooLong,
            7 => StatusCode::MemoryAllocationFailure,
            8 => StatusCode::UnknownError,
            _ => return Err(ErrorKind::UnrecognisedEngineStatus { raw }.into()),
        };
        Ok(code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_raw_values_follow_engine_ordinals() {
        for raw in 0..=8 {
            let code = StatusCode::try_from(raw).unwrap();
            assert_eq!(code.as_raw(), raw);
        }
        assert!(StatusCode::Success.is_success());
        assert!(!StatusCode::ModelError.is_success());
    }

    #[test]
    fn test_status_code_out_of_range() {
        for raw in [-1, 9, 42] {
            let err = StatusCode::try_from(raw).unwrap_err();
            assert!(matches!(
                err.kind(),
                ErrorKind::UnrecognisedEngineStatus { raw: r } if *r == raw
            ));
        }
    }

    #[test]
    fn test_status_code_display() {
        assert_eq!(
            StatusCode::CellLengthTooLong.to_string(),
            "DGGS_CELL_LENGTH_TOO_LONG"
        );
    }
}
