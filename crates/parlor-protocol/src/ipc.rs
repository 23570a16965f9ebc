//! Inter-process call outcome codes.
//!
//! A cross-process matchmaking exchange resolves to exactly one of
//! these three outcomes. The code travels as a single byte inside the
//! reply payload.

/// Outcome of a cross-process matchmaking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IpcOutcome {
    /// The remote call completed and the payload is valid.
    Success = 0,
    /// The remote side answered with an error.
    Error = 1,
    /// No answer arrived within the call's deadline.
    Timeout = 2,
}

impl IpcOutcome {
    /// Returns the wire byte for this outcome.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a wire byte; unknown values yield `None`.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Success),
            1 => Some(Self::Error),
            2 => Some(Self::Timeout),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_codes_round_trip() {
        for outcome in
            [IpcOutcome::Success, IpcOutcome::Error, IpcOutcome::Timeout]
        {
            assert_eq!(IpcOutcome::from_u8(outcome.as_u8()), Some(outcome));
        }
    }

    #[test]
    fn test_unknown_outcome_code_is_none() {
        assert_eq!(IpcOutcome::from_u8(3), None);
        assert_eq!(IpcOutcome::from_u8(255), None);
    }
}
