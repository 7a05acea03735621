//! Session lifecycle through the public SessionManager API
//!
//! Expiry and sliding refresh are driven by a ManualClock; concurrency tests
//! use scoped OS threads hammering one manager.

use sessiongate::auth::{
    AuthError, AuthFailure, Authenticator, CredentialHasher, OsTokenGenerator, SessionManager,
    ALPHABET, SESSION_TOKEN_LEN,
};
use sessiongate::clock::ManualClock;
use sessiongate::session::SessionStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const D: u64 = 10;

fn manager_with_clock() -> (SessionManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let store = SessionStore::with_parts(
        Duration::from_secs(D),
        clock.clone(),
        Arc::new(OsTokenGenerator),
    );
    let manager = SessionManager::with_store(store, CredentialHasher::new(1, 16));
    (manager, clock)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn test_create_then_validate_keeps_session() {
    let (mgr, _) = manager_with_clock();
    let token = mgr.create_session().unwrap();

    assert_eq!(token.len(), SESSION_TOKEN_LEN);
    assert!(token.bytes().all(|b| ALPHABET.contains(&b)));

    mgr.validate_session(&token).unwrap();
    mgr.validate_session(&token).unwrap();
    assert_eq!(mgr.store().len(), 1);
}

#[test]
fn test_expired_session_is_rejected_and_evicted() {
    let (mgr, clock) = manager_with_clock();
    let token = mgr.create_session().unwrap();

    clock.advance(secs(D + 1));
    assert!(matches!(
        mgr.validate_session(&token),
        Err(AuthError::Authentication(AuthFailure::Expired))
    ));
    // Evicted on first observation, so now it is simply unknown.
    assert!(matches!(
        mgr.validate_session(&token),
        Err(AuthError::Authentication(AuthFailure::UnknownToken))
    ));
    assert!(mgr.store().is_empty());
}

#[test]
fn test_sliding_refresh_measures_from_last_validation() {
    let (mgr, clock) = manager_with_clock();
    let token = mgr.create_session().unwrap();

    // t = D-1
    clock.advance(secs(D - 1));
    mgr.validate_session(&token).unwrap();

    // t = 2D-1: 2D-1 since creation, but only D since the last validation.
    clock.advance(secs(D));
    mgr.validate_session(&token).unwrap();

    // Idle for more than D from here expires it.
    clock.advance(secs(D + 1));
    assert!(mgr.validate_session(&token).is_err());
}

#[test]
fn test_end_session_twice_then_validate_fails() {
    let (mgr, _) = manager_with_clock();
    let token = mgr.create_session().unwrap();

    mgr.end_session(&token);
    mgr.end_session(&token);
    assert!(matches!(
        mgr.validate_session(&token),
        Err(AuthError::Authentication(_))
    ));
}

#[test]
fn test_sweep_drops_only_expired_sessions() {
    let (mgr, clock) = manager_with_clock();
    let old = mgr.create_session().unwrap();
    clock.advance(secs(D));
    let young = mgr.create_session().unwrap();
    clock.advance(secs(1));

    assert_eq!(mgr.sweep_expired(), 1);
    assert!(mgr.validate_session(&old).is_err());
    mgr.validate_session(&young).unwrap();
}

#[test]
fn test_concurrent_creation_yields_distinct_tokens() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 250;

    let mgr = SessionManager::new(secs(60), CredentialHasher::new(1, 16));

    let tokens: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| mgr.create_session().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let distinct: HashSet<&String> = tokens.iter().collect();
    assert_eq!(tokens.len(), THREADS * PER_THREAD);
    assert_eq!(distinct.len(), THREADS * PER_THREAD);
    assert_eq!(mgr.store().len(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_mixed_operations_stay_consistent() {
    let mgr = SessionManager::new(secs(60), CredentialHasher::new(1, 16));
    let seeded: Vec<String> = (0..200).map(|_| mgr.create_session().unwrap()).collect();
    let mgr = &mgr;

    std::thread::scope(|s| {
        // Validators on the even tokens
        for chunk in seeded.chunks(50) {
            s.spawn(move || {
                for token in chunk.iter().step_by(2) {
                    mgr.validate_session(token).unwrap();
                }
            });
        }
        // Logout of the odd tokens
        s.spawn(|| {
            for token in seeded.iter().skip(1).step_by(2) {
                mgr.end_session(token);
            }
        });
        // Fresh logins alongside
        s.spawn(|| {
            for _ in 0..100 {
                mgr.create_session().unwrap();
            }
        });
    });

    assert_eq!(mgr.store().len(), 100 + 100);
    for token in seeded.iter().skip(1).step_by(2) {
        assert!(mgr.validate_session(token).is_err());
    }
}
