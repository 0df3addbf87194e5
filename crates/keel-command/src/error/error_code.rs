//! Error codes for command validation failures.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Argument errors
//! - `E2xx` - Domain rule violations
//! - `E3xx` - Ordering errors

use std::fmt;

/// Error codes for categorizing validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Argument Errors (E1xx)
    // =========================================================================
    /// Missing mandatory argument.
    ///
    /// A command was executed before one of its declared mandatory arguments
    /// was set, typically an element holder nobody has populated.
    E100,

    /// Unknown element.
    ///
    /// An argument refers to an element that is not in the model.
    E101,

    /// Wrong element kind.
    ///
    /// An argument refers to an element of a kind the command cannot use.
    E102,

    /// Unknown diagram.
    E103,

    /// Empty transaction.
    ///
    /// A macro command without children has nothing to execute.
    E104,

    // =========================================================================
    // Domain Rule Violations (E2xx)
    // =========================================================================
    /// Duplicate name.
    ///
    /// Another element in the same namespace already has this name.
    E200,

    /// Invalid multiplicity.
    ///
    /// The lower bound exceeds the upper bound, or the upper bound is zero.
    E201,

    /// Cyclic generalization.
    ///
    /// The new generalization would make a class its own ancestor.
    E202,

    /// Duplicate generalization.
    E203,

    /// Element already present on the diagram.
    E204,

    /// Element not present on the diagram.
    E205,

    /// Element still referenced.
    ///
    /// Removing the element would leave another element with a dangling
    /// reference.
    E206,

    /// Wrong diagram kind.
    ///
    /// A PIM element was shown on a PSM diagram or the other way around.
    E207,

    /// Invalid structural representative.
    E208,

    /// Invalid PSM placement.
    ///
    /// The component does not fit under the requested parent.
    E209,

    // =========================================================================
    // Ordering Errors (E3xx)
    // =========================================================================
    /// No safe removal order.
    ///
    /// The elements reference each other in a cycle, so they cannot be
    /// removed one by one and restored afterwards.
    E300,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E202").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Argument errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Domain rule violations
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            // Ordering errors
            ErrorCode::E300 => "E300",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Argument errors
            ErrorCode::E100 => "missing mandatory argument",
            ErrorCode::E101 => "unknown element",
            ErrorCode::E102 => "wrong element kind",
            ErrorCode::E103 => "unknown diagram",
            ErrorCode::E104 => "empty transaction",
            // Domain rule violations
            ErrorCode::E200 => "duplicate name",
            ErrorCode::E201 => "invalid multiplicity",
            ErrorCode::E202 => "cyclic generalization",
            ErrorCode::E203 => "duplicate generalization",
            ErrorCode::E204 => "element already present",
            ErrorCode::E205 => "element not present",
            ErrorCode::E206 => "element still referenced",
            ErrorCode::E207 => "wrong diagram kind",
            ErrorCode::E208 => "invalid structural representative",
            ErrorCode::E209 => "invalid PSM placement",
            // Ordering errors
            ErrorCode::E300 => "no safe removal order",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E202.to_string(), "E202");
        assert_eq!(ErrorCode::E300.to_string(), "E300");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E100.description(), "missing mandatory argument");
        assert_eq!(ErrorCode::E202.description(), "cyclic generalization");
        assert_eq!(ErrorCode::E300.description(), "no safe removal order");
    }
}
