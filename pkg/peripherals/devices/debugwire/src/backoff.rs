//! A single retry/backoff shape shared by the three retry regimes this crate
//! needs (50 attempts/20ms for byte transfers, 5/20ms for calibration reads,
//! 25 outer attempts for break+sync) rather than three copy-pasted loops.

use std::thread::sleep;
use std::time::Duration;

use common::errors::*;

/// Calls `f` up to `attempts` times, sleeping `delay` between failures.
/// Returns the first `Ok`, or the last `Err` once attempts are exhausted.
pub fn retry<T>(attempts: u32, delay: Duration, mut f: impl FnMut() -> Result<T>) -> Result<T> {
    assert!(attempts > 0);

    let mut last_err = None;
    for attempt in 0..attempts {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt + 1 < attempts {
                    println!("Retrying (attempt {}/{})", attempt + 1, attempts);
                    sleep(delay);
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_returns_first_success() {
        let calls = Cell::new(0);
        let result = retry(5, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(err_msg("not yet"))
            } else {
                Ok(calls.get())
            }
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn retry_gives_up_after_exhausting_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = retry(3, Duration::from_millis(0), || {
            calls.set(calls.get() + 1);
            Err(err_msg("always fails"))
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
