//! Path segment validation
//!
//! Handles segment validation and traversal checks.

use crate::error::PathError;

/// Check that a single segment cannot escape its folder when mapped onto disk
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('\0')
        && !segment.contains('\\')
}

/// Validate one segment of `path`
pub fn validate_segment(path: &str, segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    if !is_safe_segment(segment) {
        return Err(PathError::InvalidSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        });
    }
    Ok(())
}
