//! Bounded-retry access to the settings repository.
//!
//! Each attempt that fails is retried after a random wait up to the policy's
//! backoff ceiling. The last error is returned once the attempts run out.
//! Record list queries also retry empty results; a setting id with no rows
//! is a valid answer.

use std::thread;
use std::time::Duration;

use rand::Rng;
use relay_config::RetryPolicy;
use relay_model::{RawRow, Region, RepositoryError, SettingRow, SettingsRepository};
use tracing::{debug, warn};

/// Query the repository for a record list, retrying failures and empty results.
pub fn fetch_with_retry(
    repository: &dyn SettingsRepository,
    region: Region,
    key: &str,
    policy: &RetryPolicy,
) -> Result<Vec<RawRow>, RepositoryError> {
    query_with_retry(repository, region, key, policy, true)
}

fn query_with_retry(
    repository: &dyn SettingsRepository,
    region: Region,
    key: &str,
    policy: &RetryPolicy,
    retry_empty: bool,
) -> Result<Vec<RawRow>, RepositoryError> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        let error = match repository.query(region, key) {
            Ok(rows) if !rows.is_empty() || !retry_empty => {
                debug!(key, rows = rows.len(), attempt, "repository query succeeded");
                return Ok(rows);
            }
            Ok(_) => RepositoryError::Empty { key: key.to_string() },
            Err(e) => e,
        };
        if attempt < attempts {
            warn!(attempt, key, error = %error, "repository query failed, retrying");
            thread::sleep(jittered(policy.backoff_ceiling(attempt)));
        }
        last_err = Some(error);
    }

    Err(RepositoryError::Exhausted {
        key: key.to_string(),
        attempts,
        source: Box::new(last_err.unwrap_or(RepositoryError::Empty { key: key.to_string() })),
    })
}

/// Setting rows for one setting id.
///
/// Only failures are retried; an id without rows yields an empty list.
/// Ergon rows with a blank proposed value are dropped.
pub fn load_setting_rows(
    repository: &dyn SettingsRepository,
    region: Region,
    setting_id: &str,
    policy: &RetryPolicy,
) -> Result<Vec<SettingRow>, RepositoryError> {
    let rows = query_with_retry(repository, region, setting_id, policy, false)?;
    if rows.is_empty() {
        warn!(setting_id, "no setting rows in the repository");
    }
    Ok(rows
        .iter()
        .map(SettingRow::from_raw)
        .filter(|row| region != Region::Ergon || !row.proposed_value.trim().is_empty())
        .collect())
}

fn jittered(ceiling: Duration) -> Duration {
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::rng().random_range(0..=millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_under_ceiling() {
        let ceiling = Duration::from_millis(40);
        for _ in 0..50 {
            assert!(jittered(ceiling) <= ceiling);
        }
        assert_eq!(jittered(Duration::ZERO), Duration::ZERO);
    }
}
