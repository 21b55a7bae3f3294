//! Two independent connections to one database file, as two server
//! processes sharing a database would have.

mod common;

use common::{Fixture, acme_request, fixture_with, master_key};
use signet_store::{Database, StoreError};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const ROUNDS: usize = 16;

fn two_handles(path: &Path) -> (Fixture, Fixture) {
    let a = fixture_with(Database::open(path).unwrap(), master_key());
    let b = fixture_with(Database::open(path).unwrap(), master_key());
    (a, b)
}

#[test]
fn concurrent_create_of_same_key_id_yields_one_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_handles(&dir.path().join("signet.db"));

    for round in 0..ROUNDS {
        let key_id = format!("key-{round}");
        let barrier = Arc::new(Barrier::new(2));

        let (first, second) = thread::scope(|s| {
            let first = s.spawn(|| {
                barrier.wait();
                a.keys.create(&key_id, None)
            });
            let second = s.spawn(|| {
                barrier.wait();
                b.keys.create(&key_id, None)
            });
            (first.join().unwrap(), second.join().unwrap())
        });

        match (&first, &second) {
            (Ok(_), Err(StoreError::DuplicateKeyId(_))) | (Err(StoreError::DuplicateKeyId(_)), Ok(_)) => {}
            other => panic!("round {round}: unexpected outcomes {other:?}"),
        }

        let stored = a.keys.get(&key_id).unwrap();
        let winner = first.or(second).unwrap();
        assert_eq!(stored.public_key, winner.public_key);
        assert_eq!(a.keys.load_private_key(&key_id).unwrap().public_key(), winner.public_key);
    }
}

#[test]
fn concurrent_issue_and_retire_never_both_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = two_handles(&dir.path().join("signet.db"));

    for round in 0..ROUNDS {
        let key_id = format!("key-{round}");
        a.keys.create(&key_id, None).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let (issued, retired) = thread::scope(|s| {
            let issue = s.spawn(|| {
                barrier.wait();
                a.issuer.issue(&acme_request(&key_id))
            });
            let retire = s.spawn(|| {
                barrier.wait();
                b.keys.retire(&key_id)
            });
            (issue.join().unwrap(), retire.join().unwrap())
        });

        match (&issued, &retired) {
            (Ok(license), Err(StoreError::KeyInUse(_))) => {
                assert_eq!(b.licenses.count_active_for_key(&key_id).unwrap(), 1);
                assert!(b.keys.get(&key_id).is_ok());
                assert_eq!(b.licenses.get(license.record.id).unwrap().key_id, key_id);
            }
            (Err(StoreError::NotFound(_)), Ok(())) => {
                assert_eq!(a.licenses.count_active_for_key(&key_id).unwrap(), 0);
                assert!(matches!(a.keys.get(&key_id), Err(StoreError::NotFound(_))));
            }
            other => panic!("round {round}: unexpected outcomes {other:?}"),
        }
    }
}
