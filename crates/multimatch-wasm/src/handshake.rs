//! Pattern compilation inside the guest.
//!
//! The pattern set travels as one newline-separated payload. The guest
//! answers with a status code; on failure the host collects whatever
//! diagnostics the guest offers before giving up.

use crate::abi;
use crate::bridge::GuestBridge;
use multimatch_core::{Backend, Error, PatternSet, Result};

/// Compiles `patterns` inside the guest and returns the verified pattern
/// count.
///
/// Patterns that cannot be represented in the payload (empty, or
/// containing the separator) are rejected before the guest is called.
pub(crate) fn compile_patterns(bridge: &mut GuestBridge, patterns: &PatternSet) -> Result<usize> {
    check_representable(patterns)?;

    let payload = patterns.join(abi::PATTERN_SEPARATOR);
    tracing::debug!(
        patterns = patterns.len(),
        payload_bytes = payload.len(),
        "sending pattern payload to guest"
    );

    let status = bridge.with_guest_bytes(payload.as_bytes(), |bridge, offset, len| {
        bridge.init(offset, len)
    })?;

    if status != 0 {
        let message = bridge.read_diagnostic().unwrap_or_default();
        let pattern_index = bridge
            .error_index()
            .or_else(|| index_from_diagnostic(&message));
        tracing::debug!(
            status,
            reason = abi::describe_init_status(status),
            ?pattern_index,
            "guest rejected patterns"
        );
        return Err(Error::CompileError {
            backend: Backend::Guest,
            pattern_index,
            code: Some(status),
            message,
        });
    }

    let reported = bridge.pattern_count()?;
    if usize::try_from(reported).ok() != Some(patterns.len()) {
        return Err(Error::ProtocolViolation {
            message: format!(
                "guest compiled {reported} patterns but {} were sent",
                patterns.len()
            ),
        });
    }
    Ok(patterns.len())
}

fn check_representable(patterns: &PatternSet) -> Result<()> {
    if let Some(index) = patterns.iter().position(str::is_empty) {
        return Err(Error::compile(
            Backend::Guest,
            Some(index),
            "empty patterns cannot be sent to the guest",
        ));
    }
    if let Some(index) = patterns.position_containing(abi::PATTERN_SEPARATOR) {
        return Err(Error::compile(
            Backend::Guest,
            Some(index),
            "pattern contains a newline, which separates patterns in the guest payload",
        ));
    }
    Ok(())
}

/// Extracts `N` from diagnostics of the form "... at pattern N ...".
fn index_from_diagnostic(message: &str) -> Option<usize> {
    const MARKER: &str = "at pattern ";
    let start = message.find(MARKER)? + MARKER.len();
    let digits = message[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_pattern_with_index() {
        let set = PatternSet::new(["ok", ""]).unwrap();
        let err = check_representable(&set).unwrap_err();
        assert!(err.is_compile_error());
        assert_eq!(err.pattern_index(), Some(1));
    }

    #[test]
    fn test_rejects_separator_with_index() {
        let set = PatternSet::new(["a", "b", "c\nd"]).unwrap();
        let err = check_representable(&set).unwrap_err();
        assert_eq!(err.pattern_index(), Some(2));
    }

    #[test]
    fn test_accepts_ordinary_patterns() {
        let set = PatternSet::new([r"^\d{3}-\d{4}$", "error"]).unwrap();
        assert!(check_representable(&set).is_ok());
    }

    #[test]
    fn test_index_from_diagnostic() {
        assert_eq!(
            index_from_diagnostic("Compile error at pattern 3: unmatched ["),
            Some(3)
        );
        assert_eq!(index_from_diagnostic("at pattern 12"), Some(12));
        assert_eq!(index_from_diagnostic("no index here"), None);
        assert_eq!(index_from_diagnostic("at pattern x"), None);
    }
}
