//! # Outcome of one unit of work.
//!
//! [`WorkResult`] is pure data: exactly one is produced per dequeued item that was
//! not aborted, and it never carries both a value and an error.

/// Tagged outcome of processing one item.
///
/// ## Example
/// ```rust
/// use dynexec::WorkResult;
///
/// let ok: WorkResult<u32, u32> = WorkResult::success(2, 4);
/// assert!(ok.is_success());
/// assert_eq!(ok.output(), Some(&4));
///
/// let failed: WorkResult<u32, u32> = WorkResult::failure(3, "odd input", "");
/// assert_eq!(failed.item(), &3);
/// assert_eq!(failed.message(), Some("odd input"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkResult<I, O> {
    /// The work function returned normally.
    Success {
        /// The original item.
        item: I,
        /// The work function's return value.
        output: O,
    },

    /// The work function failed (error or panic) for this item.
    Failure {
        /// The original item.
        item: I,
        /// Human-readable message.
        message: String,
        /// Opaque diagnostic (trace, error chain); for observability, not recovery.
        diagnostic: String,
    },
}

impl<I, O> WorkResult<I, O> {
    /// Creates a `Success`.
    pub fn success(item: I, output: O) -> Self {
        WorkResult::Success { item, output }
    }

    /// Creates a `Failure`.
    pub fn failure(item: I, message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        WorkResult::Failure {
            item,
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Returns `true` for `Success`.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, WorkResult::Success { .. })
    }

    /// Returns `true` for `Failure`.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, WorkResult::Failure { .. })
    }

    /// The original item.
    pub fn item(&self) -> &I {
        match self {
            WorkResult::Success { item, .. } | WorkResult::Failure { item, .. } => item,
        }
    }

    /// The output, for `Success`.
    pub fn output(&self) -> Option<&O> {
        match self {
            WorkResult::Success { output, .. } => Some(output),
            WorkResult::Failure { .. } => None,
        }
    }

    /// The failure message, for `Failure`.
    pub fn message(&self) -> Option<&str> {
        match self {
            WorkResult::Failure { message, .. } => Some(message),
            WorkResult::Success { .. } => None,
        }
    }

    /// The diagnostic, for `Failure`.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            WorkResult::Failure { diagnostic, .. } => Some(diagnostic),
            WorkResult::Success { .. } => None,
        }
    }

    /// Consumes the result and returns the original item.
    pub fn into_item(self) -> I {
        match self {
            WorkResult::Success { item, .. } | WorkResult::Failure { item, .. } => item,
        }
    }

    /// Converts into a standard `Result`, keeping the item on both sides.
    pub fn into_result(self) -> Result<(I, O), (I, String)> {
        match self {
            WorkResult::Success { item, output } => Ok((item, output)),
            WorkResult::Failure { item, message, .. } => Err((item, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_never_mix() {
        let ok: WorkResult<&str, usize> = WorkResult::success("a", 1);
        assert!(ok.is_success() && !ok.is_failure());
        assert_eq!(ok.message(), None);
        assert_eq!(ok.diagnostic(), None);

        let err: WorkResult<&str, usize> = WorkResult::failure("b", "boom", "trace");
        assert!(err.is_failure() && !err.is_success());
        assert_eq!(err.output(), None);
        assert_eq!(err.diagnostic(), Some("trace"));
    }

    #[test]
    fn into_result_keeps_item() {
        let ok: WorkResult<u8, u8> = WorkResult::success(1, 2);
        assert_eq!(ok.into_result(), Ok((1, 2)));

        let err: WorkResult<u8, u8> = WorkResult::failure(3, "bad", "");
        assert_eq!(err.clone().into_item(), 3);
        assert_eq!(err.into_result(), Err((3, "bad".to_string())));
    }
}
