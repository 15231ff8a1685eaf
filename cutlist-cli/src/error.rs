// ============================================================================
// cutlist-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and the action prefix used in messages
//
// The CLI reports core errors as they are. The only addition is naming the
// action that failed, e.g. "Probing clip.mp4: ffprobe error: ...".

use cutlist_core::{CoreError, CoreResult};

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Names the action a core call was performing when it failed.
pub trait ActionContext<T> {
    /// Prefixes any error with the action described by `action`, which is
    /// only evaluated on failure.
    fn during<F>(self, action: F) -> CliResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ActionContext<T> for CoreResult<T> {
    fn during<F>(self, action: F) -> CliResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CoreError::OperationFailed(format!("{}: {e}", action())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_prefixed_with_the_action() {
        let result: CoreResult<()> = Err(CoreError::PathError("clip.mp4 is missing".to_string()));
        let err = result.during(|| "Probing clip.mp4".to_string()).unwrap_err();
        assert!(matches!(&err, CoreError::OperationFailed(_)));
        assert!(err.to_string().starts_with("Probing clip.mp4: "));
        assert!(err.to_string().contains("clip.mp4 is missing"));
    }

    #[test]
    fn success_skips_the_action() {
        let result: CoreResult<u8> = Ok(7);
        let value = result.during(|| unreachable!("not evaluated on success")).unwrap();
        assert_eq!(value, 7);
    }
}
