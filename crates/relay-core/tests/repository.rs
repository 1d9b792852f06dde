//! Bounded retry around the settings repository.

use std::cell::RefCell;
use std::collections::VecDeque;

use relay_config::RetryPolicy;
use relay_core::{fetch_with_retry, load_setting_rows};
use relay_model::{RawRow, Region, RepositoryError, SettingsRepository};

/// Repository that replays scripted responses, then keeps failing.
struct ScriptedRepository {
    responses: RefCell<VecDeque<Result<Vec<RawRow>, RepositoryError>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRepository {
    fn new(responses: Vec<Result<Vec<RawRow>, RepositoryError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl SettingsRepository for ScriptedRepository {
    fn query(&self, _region: Region, filter_key: &str) -> Result<Vec<RawRow>, RepositoryError> {
        self.calls.borrow_mut().push(filter_key.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(RepositoryError::Unavailable("connection refused".to_string())))
    }
}

fn setting_row(param: &str, value: &str) -> RawRow {
    RawRow::from([
        ("blockpathenu".to_string(), "Group1".to_string()),
        ("paramnameenu".to_string(), param.to_string()),
        ("proposedsetting".to_string(), value.to_string()),
        ("unitenu".to_string(), "A".to_string()),
    ])
}

#[test]
fn setting_row_failures_are_retried() {
    let repository = ScriptedRepository::new(vec![
        Err(RepositoryError::Query("timeout".to_string())),
        Err(RepositoryError::Query("timeout".to_string())),
        Ok(vec![setting_row("I>", "400")]),
    ]);

    let rows = load_setting_rows(&repository, Region::Energex, "S1", &RetryPolicy::immediate(3))
        .expect("third attempt succeeds");

    assert_eq!(repository.calls(), 3);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].param_name, "I>");
    assert_eq!(rows[0].proposed_value, "400");
}

#[test]
fn setting_id_without_rows_is_not_retried() {
    let repository = ScriptedRepository::new(vec![Ok(Vec::new())]);

    let rows = load_setting_rows(&repository, Region::Energex, "S1", &RetryPolicy::immediate(3))
        .expect("empty rows are a valid answer");

    assert!(rows.is_empty());
    assert_eq!(repository.calls(), 1);
}

#[test]
fn empty_record_lists_are_retried() {
    let repository = ScriptedRepository::new(vec![
        Ok(Vec::new()),
        Ok(vec![setting_row("I>", "400")]),
    ]);

    let rows = fetch_with_retry(&repository, Region::Ergon, "RC-12", &RetryPolicy::immediate(3))
        .expect("second attempt succeeds");

    assert_eq!(repository.calls(), 2);
    assert_eq!(rows.len(), 1);
}

#[test]
fn blank_ergon_settings_are_dropped() {
    let rows = || vec![setting_row("I>", "400"), setting_row("t>", " ")];

    let ergon = ScriptedRepository::new(vec![Ok(rows())]);
    let kept = load_setting_rows(&ergon, Region::Ergon, "S1", &RetryPolicy::immediate(1))
        .expect("rows load");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].param_name, "I>");

    let energex = ScriptedRepository::new(vec![Ok(rows())]);
    let kept = load_setting_rows(&energex, Region::Energex, "S1", &RetryPolicy::immediate(1))
        .expect("rows load");
    assert_eq!(kept.len(), 2);
}

#[test]
fn exhausted_retries_report_last_error() {
    let repository = ScriptedRepository::new(vec![
        Ok(Vec::new()),
        Err(RepositoryError::Query("timeout".to_string())),
    ]);

    let err = fetch_with_retry(&repository, Region::Ergon, "RC-12", &RetryPolicy::immediate(3))
        .expect_err("all attempts fail");

    assert_eq!(repository.calls(), 3);
    match err {
        RepositoryError::Exhausted { key, attempts, source } => {
            assert_eq!(key, "RC-12");
            assert_eq!(attempts, 3);
            assert!(matches!(*source, RepositoryError::Unavailable(_)));
        }
        other => panic!("expected exhausted error, got {other:?}"),
    }
}

#[test]
fn first_success_stops_retrying() {
    let repository = ScriptedRepository::new(vec![Ok(vec![setting_row("t>", "0.5")])]);

    let rows = fetch_with_retry(&repository, Region::Energex, "S9", &RetryPolicy::immediate(3))
        .expect("first attempt succeeds");

    assert_eq!(rows.len(), 1);
    assert_eq!(repository.calls(), 1);
}
