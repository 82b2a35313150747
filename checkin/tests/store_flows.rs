//! Store-level tests of the check-in flows.
//!
//! Effects run for real on a paused tokio clock, against the mock API and
//! in-memory storage.

use checkin_api::{ApiError, ApiReply, AuthSession, EventSummary, Id, RegistrationResource};
use checkin_app::mocks::{MemorySecureStorage, MockCheckinApi};
use checkin_app::providers::storage::{REMEMBER_ME_KEY, TOKEN_KEY, USER_KEY};
use checkin_app::state::{AppEvent, Session};
use checkin_app::{
    CheckinAction, CheckinEnvironment, CheckinReducer, CheckinState, ConfirmationAction,
    EventsAction, LoginAction, Route, ScanAction, ScanPhase, SearchAction, SessionAction,
};
use checkin_core::environment::Clock;
use checkin_runtime::Store;
use checkin_testing::{ManualClock, test_clock};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type TestEnv = CheckinEnvironment<MockCheckinApi, MemorySecureStorage>;
type TestStore = Store<
    CheckinState,
    CheckinAction,
    TestEnv,
    CheckinReducer<MockCheckinApi, MemorySecureStorage>,
>;

struct Harness {
    store: TestStore,
    api: MockCheckinApi,
    storage: MemorySecureStorage,
}

fn harness(state: CheckinState, storage: MemorySecureStorage) -> Harness {
    let api = MockCheckinApi::new();
    let clock = ManualClock::new(test_clock().now());
    let env = CheckinEnvironment::new(api.clone(), storage.clone()).with_clock(Arc::new(clock));
    Harness {
        store: Store::new(state, CheckinReducer::default(), env),
        api,
        storage,
    }
}

/// Signed in, event 7 selected, scanner focused and idle.
fn scanning() -> CheckinState {
    let mut state = CheckinState::default();
    state.session.current = Some(Session {
        token: "tok".into(),
        user: json!({ "name": "Door Staff" }),
    });
    state.session.restoring = false;
    state.app.event = Some(AppEvent {
        id: Id::new("7"),
        name: "Trail".into(),
    });
    state.route = Route::Scan;
    state.scan.focused = true;
    state.scan.phase = ScanPhase::Idle;
    state
}

fn registration(allow_check_in: bool) -> RegistrationResource {
    RegistrationResource {
        allow_check_in,
        bib_number: Some(512),
        ..RegistrationResource::new(Id::new("r-1"))
    }
}

fn scanned(value: &str) -> CheckinAction {
    ScanAction::CodeScanned {
        value: value.to_string(),
    }
    .into()
}

/// Let spawned effects run without reaching any timer.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_double_read_while_validating_sends_one_request() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(scanning(), MemorySecureStorage::new());
    h.api.push_validation(ApiReply::new(None, Ok(registration(true))));
    h.api.close_gate();

    h.store.send(scanned("REG-1")).await?;
    h.store.send(scanned("REG-1")).await?;
    h.store.send(scanned("REG-2")).await?;
    settle().await;

    assert_eq!(h.api.validation_count(), 1);
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Processing);

    h.api.open_gate();
    settle().await;

    assert_eq!(h.api.validation_count(), 1);
    assert_eq!(h.store.state(|s| s.route).await, Route::Confirmation);
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Inactive);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_not_found_rearms_only_after_cooldown() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(scanning(), MemorySecureStorage::new());
    h.api.push_validation(ApiReply::new(Some(json!({ "message": "nope" })), Err(ApiError::NotFound { message: None })));

    h.store.send(scanned("REG-1")).await?;
    settle().await;

    let (phase, error, registration) = h
        .store
        .state(|s| (s.scan.phase, s.scan.error.clone(), s.registration.current.clone()))
        .await;
    assert_eq!(phase, ScanPhase::Cooldown);
    assert_eq!(error.map(|e| e.to_string()).as_deref(), Some("Invalid registration"));
    assert_eq!(registration, None);

    // Reads during the cooldown are dropped
    h.store.send(scanned("REG-1")).await?;
    tokio::time::sleep(Duration::from_millis(1_400)).await;
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Cooldown);
    assert_eq!(h.api.validation_count(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Idle);
    assert_eq!(h.store.running_cancellables(), 0);

    // Re-armed scanner forgot the last read
    h.store.send(scanned("REG-1")).await?;
    settle().await;
    assert_eq!(h.api.validation_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_focus_lost_during_cooldown_keeps_scanner_off() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(scanning(), MemorySecureStorage::new());
    h.api.push_validation(ApiReply::failed(ApiError::NotFound { message: None }));

    h.store.send(scanned("REG-1")).await?;
    settle().await;
    assert_eq!(h.store.running_cancellables(), 1);

    h.store.send(ScanAction::FocusLost.into()).await?;
    settle().await;
    assert_eq!(h.store.running_cancellables(), 0);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Inactive);

    h.store.send(ScanAction::FocusGained.into()).await?;
    let (phase, error) = h.store.state(|s| (s.scan.phase, s.scan.error.clone())).await;
    assert_eq!(phase, ScanPhase::Idle);
    assert_eq!(error, None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_validation_clears_everything() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemorySecureStorage::with_items(HashMap::from([
        (REMEMBER_ME_KEY.to_string(), "true".to_string()),
        (TOKEN_KEY.to_string(), "tok".to_string()),
        (USER_KEY.to_string(), r#"{"name":"Door Staff"}"#.to_string()),
    ]));
    let mut state = scanning();
    state.registration.set(Some(registration(true)));
    let h = harness(state, storage);
    h.api.push_validation(ApiReply::failed(ApiError::Unauthorized { message: None }));

    let mut handle = h.store.send(scanned("REG-1")).await?;
    handle.wait().await;

    let state = h.store.state(Clone::clone).await;
    assert!(!state.is_signed_in());
    assert_eq!(state.registration.current, None);
    assert_eq!(state.app.event, None);
    assert_eq!(state.route, Route::Login);
    assert!(state.login.error.is_some_and(|e| e.is_auth_expired()));
    assert!(h.storage.snapshot().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_scan_without_event_sends_no_validation() -> Result<(), Box<dyn std::error::Error>> {
    let mut state = scanning();
    state.app.event = None;
    let h = harness(state, MemorySecureStorage::new());
    h.api.push_list_events(ApiReply::new(None, Ok(Vec::new())));

    let mut handle = h.store.send(scanned("REG-1")).await?;
    handle.wait().await;

    assert_eq!(h.api.validation_count(), 0);
    assert_eq!(h.store.state(|s| s.route).await, Route::EventSelection);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_blank_search_sends_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(scanning(), MemorySecureStorage::new());

    h.store.send(CheckinAction::Navigate(Route::Search)).await?;
    h.store.send(SearchAction::QueryChanged(" \t ".into()).into()).await?;
    let mut handle = h.store.send(SearchAction::Submit.into()).await?;
    handle.wait().await;

    assert_eq!(h.api.search_count(), 0);
    assert!(!h.store.state(|s| s.search.loading).await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_confirm_pressed_twice_sends_one_request() -> Result<(), Box<dyn std::error::Error>> {
    let mut state = scanning();
    state.route = Route::Confirmation;
    state.scan.focused = false;
    state.scan.phase = ScanPhase::Inactive;
    state.registration.set(Some(registration(true)));
    let h = harness(state, MemorySecureStorage::new());
    h.api.push_confirm(ApiReply::new(Some(json!({ "stats": { "checked_in": 12 } })), Ok(())));
    h.api.close_gate();

    h.store.send(ConfirmationAction::Confirm.into()).await?;
    h.store.send(ConfirmationAction::Confirm.into()).await?;
    settle().await;
    assert_eq!(h.api.confirm_count(), 1);

    h.api.open_gate();
    settle().await;

    let state = h.store.state(Clone::clone).await;
    assert_eq!(h.api.confirm_count(), 1);
    assert_eq!(state.registration.current, None);
    assert_eq!(state.route, Route::Scan);
    assert_eq!(state.scan.phase, ScanPhase::Idle);
    assert_eq!(
        state.app.stats.and_then(|s| s.get("checked_in").cloned()),
        Some(json!(12))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_remembered_session_restored_by_fresh_store() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemorySecureStorage::new();
    let first = harness(CheckinState::default(), storage.clone());
    first.api.push_authenticate(ApiReply::new(
        None,
        Ok(AuthSession {
            token: "tok-9".into(),
            user: json!({ "email": "staff@example.com" }),
        }),
    ));
    first.api.push_list_events(ApiReply::new(None, Ok(Vec::new())));

    first.store.send(SessionAction::SetRememberMe(true).into()).await?;
    let mut handle = first
        .store
        .send(
            LoginAction::Submit {
                email: "staff@example.com".into(),
                password: "pw".into(),
            }
            .into(),
        )
        .await?;
    handle.wait().await;

    // Same backing storage, new store: simulates a restart
    let second = harness(CheckinState::default(), storage.clone());
    second.api.push_list_events(ApiReply::new(None, Ok(Vec::new())));
    let mut handle = second.store.send(SessionAction::Restore.into()).await?;
    handle.wait().await;

    let state = second.store.state(Clone::clone).await;
    assert_eq!(state.session.token(), Some("tok-9"));
    assert!(state.session.remember_me);
    assert!(!state.session.restoring);
    assert_eq!(state.app.profile.map(|p| p.name), Some("Team Member".into()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_session_without_remember_me_is_forgotten() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemorySecureStorage::new();
    let first = harness(CheckinState::default(), storage.clone());
    first.api.push_authenticate(ApiReply::new(
        None,
        Ok(AuthSession {
            token: "tok-9".into(),
            user: json!({ "name": "Ana" }),
        }),
    ));

    let mut handle = first
        .store
        .send(
            LoginAction::Submit {
                email: "ana@example.com".into(),
                password: "pw".into(),
            }
            .into(),
        )
        .await?;
    handle.wait().await;
    assert!(first.store.state(CheckinState::is_signed_in).await);
    assert!(storage.snapshot().is_empty());

    let second = harness(CheckinState::default(), storage);
    let mut handle = second.store.send(SessionAction::Restore.into()).await?;
    handle.wait().await;

    assert!(!second.store.state(CheckinState::is_signed_in).await);
    assert_eq!(second.store.state(|s| s.route).await, Route::Login);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_logout_wins_over_slow_remember_me_write() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemorySecureStorage::new();
    let h = harness(CheckinState::default(), storage.clone());
    h.api.push_authenticate(ApiReply::new(
        None,
        Ok(AuthSession {
            token: "tok-9".into(),
            user: json!({ "name": "Ana" }),
        }),
    ));
    storage.close_write_gate();

    h.store.send(SessionAction::SetRememberMe(true).into()).await?;
    h.store
        .send(
            LoginAction::Submit {
                email: "ana@example.com".into(),
                password: "pw".into(),
            }
            .into(),
        )
        .await?;
    settle().await;
    assert!(h.store.state(CheckinState::is_signed_in).await);

    let mut logout = h.store.send(SessionAction::ClearSession.into()).await?;
    settle().await;
    storage.open_write_gate();
    logout.wait().await;
    settle().await;

    assert!(storage.snapshot().is_empty(), "{:?}", storage.snapshot());
    let restarted = harness(CheckinState::default(), storage);
    let mut handle = restarted.store.send(SessionAction::Restore.into()).await?;
    handle.wait().await;
    assert!(!restarted.store.state(CheckinState::is_signed_in).await);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_storage_restores_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let storage = MemorySecureStorage::new();
    storage.set_fail_reads(true);
    let h = harness(CheckinState::default(), storage);

    let mut handle = h.store.send(SessionAction::Restore.into()).await?;
    handle.wait().await;

    let (signed_in, restoring, route) = h
        .store
        .state(|s| (s.is_signed_in(), s.session.restoring, s.route))
        .await;
    assert!(!signed_in);
    assert!(!restoring);
    assert_eq!(route, Route::Login);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_full_check_in_flow() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness(CheckinState::default(), MemorySecureStorage::new());
    h.api.push_authenticate(ApiReply::new(
        None,
        Ok(AuthSession {
            token: "tok".into(),
            user: json!({ "firstname": "Rui", "lastname": "Costa" }),
        }),
    ));
    h.api.push_list_events(ApiReply::new(
        Some(json!({ "stats": { "events": 1 } })),
        Ok(vec![EventSummary {
            id: Id::new("7"),
            name: "Trail".into(),
        }]),
    ));
    h.api.push_validation(ApiReply::new(None, Ok(registration(true))));
    h.api.push_confirm(ApiReply::new(None, Ok(())));

    let mut handle = h.store.send(SessionAction::Restore.into()).await?;
    handle.wait().await;
    assert_eq!(h.store.state(|s| s.route).await, Route::Login);

    let mut handle = h
        .store
        .send(
            LoginAction::Submit {
                email: "rui@example.com".into(),
                password: "pw".into(),
            }
            .into(),
        )
        .await?;
    handle.wait().await;
    let (route, events) = h.store.state(|s| (s.route, s.app.events.len())).await;
    assert_eq!(route, Route::EventSelection);
    assert_eq!(events, 1);

    h.store.send(EventsAction::Select { id: Id::new("7") }.into()).await?;
    assert_eq!(h.store.state(|s| s.scan.phase).await, ScanPhase::Idle);

    let mut handle = h.store.send(scanned("REG-1")).await?;
    handle.wait().await;
    assert_eq!(h.store.state(|s| s.route).await, Route::Confirmation);

    let mut handle = h.store.send(ConfirmationAction::Confirm.into()).await?;
    handle.wait().await;

    let state = h.store.state(Clone::clone).await;
    assert_eq!(state.route, Route::Scan);
    assert_eq!(state.registration.current, None);
    assert!(state.scan.accepts_codes());
    assert_eq!(h.api.request_count(), 4);

    let mut handle = h.store.send(SessionAction::ClearSession.into()).await?;
    handle.wait().await;
    let state = h.store.state(Clone::clone).await;
    assert_eq!(state.route, Route::Login);
    assert_eq!(state.app, checkin_app::state::AppState::default());
    Ok(())
}
