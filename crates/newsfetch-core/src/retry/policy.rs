use std::time::Duration;

/// Classification of a response status for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Other 5xx.
    Http5xx(u16),
    /// Anything else: the response is final.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Do not retry.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff with relative jitter and a cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth per further retry.
    pub multiplier: f64,
    /// Relative jitter amplitude; 0.2 = ±20%.
    pub jitter: f64,
    /// Cap applied before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            multiplier: 2.0,
            jitter: 0.2,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based).
    ///
    /// `jitter_sample` is a value in [-1, 1] (clamped); the caller draws it so
    /// this stays a pure function.
    pub fn backoff_delay(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let exp = attempt.saturating_sub(1).min(30) as i32;
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(exp);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let factor = 1.0 + self.jitter * jitter_sample.clamp(-1.0, 1.0);
        Duration::from_secs_f64((capped * factor).max(0.0))
    }

    /// Whether to retry after attempt `attempt` (1-based) ended with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind, jitter_sample: f64) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Throttled | ErrorKind::Http5xx(_) => {
                RetryDecision::RetryAfter(self.backoff_delay(attempt, jitter_sample))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ms(d: Duration, expected: f64) {
        let got = d.as_secs_f64() * 1000.0;
        assert!((got - expected).abs() < 0.5, "expected ~{expected}ms, got {got}ms");
    }

    #[test]
    fn no_retry_for_other() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Other, 0.0), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_without_jitter() {
        let p = RetryPolicy::default();
        assert_ms(p.backoff_delay(1, 0.0), 250.0);
        assert_ms(p.backoff_delay(2, 0.0), 500.0);
        assert_ms(p.backoff_delay(3, 0.0), 1000.0);
    }

    #[test]
    fn jitter_bounds() {
        let p = RetryPolicy::default();
        assert_ms(p.backoff_delay(1, 1.0), 300.0);
        assert_ms(p.backoff_delay(1, -1.0), 200.0);
        // Out-of-range samples are clamped.
        assert_ms(p.backoff_delay(1, 7.0), 300.0);
    }

    #[test]
    fn capped_before_jitter() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 40;
        assert_eq!(p.backoff_delay(20, 0.0), p.max_delay);
        assert!(p.backoff_delay(u32::MAX, 1.0) <= Duration::from_millis(12_001));
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy::default();
        assert!(matches!(
            p.decide(1, ErrorKind::Throttled, 0.0),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Http5xx(502), 0.0),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Throttled, 0.0), RetryDecision::NoRetry);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let p = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        assert_eq!(p.decide(1, ErrorKind::Http5xx(500), 0.0), RetryDecision::NoRetry);
    }
}
