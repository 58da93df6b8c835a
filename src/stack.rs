//! Stack growth for the recursive evaluator.
//!
//! Evaluation recurses once per nested expression and once per closure call, with no tail-call
//! elimination. Instead of relying on the size of the thread stack, recursive entry points run
//! inside [`ensure_sufficient_stack`], which allocates a fresh stack segment when the remaining
//! space drops below the red zone. Runaway recursion is bounded only when the host sets an
//! evaluation depth limit.

/// If less than this much stack remains, grow before recursing (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion_does_not_overflow() {
        fn count_down(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
        }

        assert_eq!(count_down(200_000), 200_000);
    }

    #[test]
    fn test_passes_result_through() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
