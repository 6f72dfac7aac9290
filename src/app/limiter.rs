//! Per-client hourly request limiter.
//!
//! Counts live in buckets keyed by `(client, hour)`. Every check drops the
//! buckets of earlier hours, so the store never holds more than one hour of
//! state per client.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::AppError;

pub const DEFAULT_RATE_LIMIT: u32 = 100;

const BUCKET_SECONDS: i64 = 3600;

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    buckets: Mutex<HashMap<(String, i64), u32>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, client: &str) -> Result<(), AppError> {
        self.check_at(client, Utc::now())
    }

    /// Count one request from `client` at `now`.
    pub fn check_at(&self, client: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let hour = now.timestamp().div_euclid(BUCKET_SECONDS);
        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        buckets.retain(|(_, bucket), _| *bucket == hour);
        let count = buckets.entry((client.to_string(), hour)).or_insert(0);
        *count += 1;

        if *count > self.limit {
            Err(AppError::RateLimited { limit: self.limit })
        } else {
            Ok(())
        }
    }

    /// Number of live buckets.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets
            .lock()
            .map(|b| b.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn limit_is_per_client_and_hour() {
        let limiter = RateLimiter::new(2);
        let t = Utc.with_ymd_and_hms(2024, 9, 1, 10, 5, 0).unwrap();

        assert!(limiter.check_at("a", t).is_ok());
        assert!(limiter.check_at("a", t).is_ok());
        assert_eq!(limiter.check_at("a", t), Err(AppError::RateLimited { limit: 2 }));
        assert!(limiter.check_at("b", t).is_ok());

        let next_hour = Utc.with_ymd_and_hms(2024, 9, 1, 11, 0, 0).unwrap();
        assert!(limiter.check_at("a", next_hour).is_ok());
    }

    #[test]
    fn expired_buckets_are_evicted() {
        let limiter = RateLimiter::new(5);
        let t = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        for client in ["a", "b", "c"] {
            limiter.check_at(client, t).unwrap();
        }
        assert_eq!(limiter.tracked(), 3);

        let later = Utc.with_ymd_and_hms(2024, 9, 1, 12, 30, 0).unwrap();
        limiter.check_at("a", later).unwrap();
        assert_eq!(limiter.tracked(), 1);
    }
}
