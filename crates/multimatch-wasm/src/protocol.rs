//! Per-input match invocation.

use crate::bridge::GuestBridge;
use multimatch_core::{Error, Result};

/// Runs one input through the guest.
///
/// Empty inputs short-circuit to no match without touching the guest.
pub(crate) fn match_input(
    bridge: &mut GuestBridge,
    input: &[u8],
    pattern_count: usize,
) -> Result<Option<usize>> {
    if input.is_empty() {
        return Ok(None);
    }
    let raw = bridge.with_guest_bytes(input, |bridge, offset, len| bridge.find(offset, len))?;
    interpret(raw, pattern_count)
}

/// Maps the guest's raw return value to a pattern index.
fn interpret(raw: i32, pattern_count: usize) -> Result<Option<usize>> {
    let Ok(index) = usize::try_from(raw) else {
        return Ok(None);
    };
    if index >= pattern_count {
        return Err(Error::ProtocolViolation {
            message: format!(
                "guest reported pattern {index} but only {pattern_count} are compiled"
            ),
        });
    }
    Ok(Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_is_no_match() {
        assert_eq!(interpret(-1, 3).unwrap(), None);
        assert_eq!(interpret(i32::MIN, 3).unwrap(), None);
    }

    #[test]
    fn test_in_range_index() {
        assert_eq!(interpret(0, 3).unwrap(), Some(0));
        assert_eq!(interpret(2, 3).unwrap(), Some(2));
    }

    #[test]
    fn test_out_of_range_is_protocol_violation() {
        let err = interpret(3, 3).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { .. }));
    }
}
