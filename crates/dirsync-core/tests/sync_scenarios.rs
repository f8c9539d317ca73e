//! End-to-end reconciliation scenarios driven through the sync service with
//! in-memory adapters.

mod helpers;

use std::sync::Arc;

use dirsync_core::error::{SyncError, SyncPhase};
use dirsync_core::SyncService;
use helpers::{group, member, user, FakeDirectory, FakeScim, MemoryStateRepository};
use tokio_util::sync::CancellationToken;

fn two_group_directory() -> FakeDirectory {
    FakeDirectory::default()
        .with_group(
            group("g1", "gid-1"),
            vec![member("u1@mail.com", "uid-1"), member("u2@mail.com", "uid-2")],
        )
        .with_group(
            group("g2", "gid-2"),
            vec![member("u2@mail.com", "uid-2"), member("u3@mail.com", "uid-3")],
        )
        .with_user(user("u1@mail.com", "uid-1"))
        .with_user(user("u2@mail.com", "uid-2"))
        .with_user(user("u3@mail.com", "uid-3"))
}

#[tokio::test]
async fn new_tenant_provisions_everything() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());
    let service = SyncService::new(Arc::new(two_group_directory()), scim.clone())
        .with_state(repo.clone());

    let report = service.sync_groups_and_users(&[]).await.unwrap();

    assert_eq!(report.users_created, 3);
    assert_eq!(report.groups_created, 2);
    assert_eq!(report.memberships_created, 4);
    assert_eq!(report.users_deleted, 0);
    assert_eq!(report.groups_deleted, 0);

    assert_eq!(scim.user_emails(), ["u1@mail.com", "u2@mail.com", "u3@mail.com"]);
    assert_eq!(scim.group_names(), ["g1", "g2"]);
    assert_eq!(scim.members_of("g1"), ["u1@mail.com", "u2@mail.com"]);
    assert_eq!(scim.members_of("g2"), ["u2@mail.com", "u3@mail.com"]);

    let snapshot = repo.snapshot().expect("snapshot written");
    assert!(!snapshot.resources.users.hash_code.is_empty());
    assert!(!snapshot.resources.groups.hash_code.is_empty());
    assert!(!snapshot.resources.groups_members.hash_code.is_empty());
    assert_eq!(snapshot.resources.users.items, 3);
    assert_eq!(snapshot.resources.groups.items, 2);
}

#[tokio::test]
async fn steady_state_issues_no_mutations_and_takes_the_fast_path() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());
    let service = SyncService::new(Arc::new(two_group_directory()), scim.clone())
        .with_state(repo.clone());

    service.sync_groups_and_users(&[]).await.unwrap();
    let prior = repo.snapshot().unwrap();
    let mutations_after_first = scim.calls().len();

    // Nothing changed upstream: the second run must short-circuit on the
    // snapshot hashes and leave the target untouched.
    let report = service.sync_groups_and_users(&[]).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(scim.calls().len(), mutations_after_first);

    let refreshed = repo.snapshot().unwrap();
    assert_eq!(refreshed.hash_code, prior.hash_code);
    assert!(refreshed.last_sync >= prior.last_sync);
}

#[tokio::test]
async fn removed_member_deletes_membership_before_user() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());

    let before = FakeDirectory::default()
        .with_group(
            group("g", "gid-1"),
            vec![member("u1@mail.com", "uid-1"), member("u2@mail.com", "uid-2")],
        )
        .with_user(user("u1@mail.com", "uid-1"))
        .with_user(user("u2@mail.com", "uid-2"));

    SyncService::new(Arc::new(before), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();
    let first_run_calls = scim.calls().len();

    let after = FakeDirectory::default()
        .with_group(group("g", "gid-1"), vec![member("u1@mail.com", "uid-1")])
        .with_user(user("u1@mail.com", "uid-1"));

    let report = SyncService::new(Arc::new(after), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();

    assert_eq!(report.memberships_deleted, 1);
    assert_eq!(report.users_deleted, 1);
    assert_eq!(report.users_equal, 1);

    let second_run_calls = scim.calls()[first_run_calls..].to_vec();
    assert_eq!(second_run_calls, ["delete_groups_members", "delete_users"]);

    assert_eq!(scim.members_of("g"), ["u1@mail.com"]);
    assert_eq!(scim.user_emails(), ["u1@mail.com"]);
}

#[tokio::test]
async fn renamed_group_is_deleted_and_recreated() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());

    let before = FakeDirectory::default()
        .with_group(group("old-name", "gid-x"), vec![member("u1@mail.com", "uid-1")])
        .with_user(user("u1@mail.com", "uid-1"));

    SyncService::new(Arc::new(before), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();
    let first_run_calls = scim.calls().len();

    let after = FakeDirectory::default()
        .with_group(group("new-name", "gid-x"), vec![member("u1@mail.com", "uid-1")])
        .with_user(user("u1@mail.com", "uid-1"));

    let report = SyncService::new(Arc::new(after), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();

    assert_eq!(report.groups_deleted, 1);
    assert_eq!(report.groups_created, 1);
    assert_eq!(report.users_deleted, 0);

    let second_run_calls = scim.calls()[first_run_calls..].to_vec();
    assert_eq!(
        second_run_calls,
        ["delete_groups", "create_groups", "create_groups_members"]
    );

    assert_eq!(scim.group_names(), ["new-name"]);
    assert_eq!(scim.members_of("new-name"), ["u1@mail.com"]);
    assert!(scim.members_of("old-name").is_empty());
}

#[tokio::test]
async fn empty_group_on_both_sides_is_a_noop() {
    let seeded_group = {
        let mut g = group("g", "gid-1");
        g.scim_id = "scim-group-1".to_string();
        g
    };
    let scim = Arc::new(FakeScim::seeded(
        Vec::new(),
        vec![seeded_group],
        Default::default(),
    ));
    let repo = Arc::new(MemoryStateRepository::default());

    let directory = FakeDirectory::default().with_group(group("g", "gid-1"), Vec::new());

    let report = SyncService::new(Arc::new(directory), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();

    assert!(report.is_noop());
    assert_eq!(report.groups_equal, 1);
    assert!(scim.calls().is_empty());

    // The empty group is still observed in the snapshot.
    let snapshot = repo.snapshot().unwrap();
    assert_eq!(snapshot.resources.groups_members.items, 1);
    assert!(snapshot.resources.groups_members.resources[0]
        .resources
        .is_empty());
}

#[tokio::test]
async fn changed_group_attributes_are_not_mutated_on_the_target() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());

    let before = FakeDirectory::default().with_group(group("g", "gid-old"), Vec::new());
    SyncService::new(Arc::new(before), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();
    let first_run_calls = scim.calls().len();

    // Same name, different provider id: lands in the update partition,
    // which is carried in state only.
    let after = FakeDirectory::default().with_group(group("g", "gid-new"), Vec::new());
    let report = SyncService::new(Arc::new(after), scim.clone())
        .with_state(repo.clone())
        .sync_groups_and_users(&[])
        .await
        .unwrap();

    assert_eq!(report.groups_changed, 1);
    assert!(report.is_noop());
    assert_eq!(scim.calls().len(), first_run_calls);

    let snapshot = repo.snapshot().unwrap();
    assert_eq!(snapshot.resources.groups.resources[0].ipid, "gid-new");
}

#[tokio::test]
async fn cancellation_aborts_without_a_snapshot() {
    let scim = Arc::new(FakeScim::default());
    let repo = Arc::new(MemoryStateRepository::default());
    let token = CancellationToken::new();
    token.cancel();

    let service = SyncService::new(Arc::new(two_group_directory()), scim.clone())
        .with_state(repo.clone())
        .with_cancellation(token);

    let err = service.sync_groups_and_users(&[]).await.unwrap_err();

    assert!(matches!(err, SyncError::Cancelled { .. }));
    assert!(scim.calls().is_empty());
    assert!(repo.snapshot().is_none());
}

#[tokio::test]
async fn phase_failure_leaves_the_snapshot_unwritten() {
    let scim = Arc::new(FakeScim::failing_on("create_groups"));
    let repo = Arc::new(MemoryStateRepository::default());

    let service = SyncService::new(Arc::new(two_group_directory()), scim.clone())
        .with_state(repo.clone());

    let err = service.sync_groups_and_users(&[]).await.unwrap_err();

    match err {
        SyncError::Phase { phase, .. } => assert_eq!(phase, SyncPhase::CreateGroups),
        other => panic!("expected a phase error, got {other}"),
    }

    // Earlier phases ran; the snapshot did not.
    assert!(scim.calls().contains(&"create_users"));
    assert!(repo.snapshot().is_none());
}

#[tokio::test]
async fn state_disabled_runs_against_the_live_target_every_time() {
    let scim = Arc::new(FakeScim::default());
    let service = SyncService::new(Arc::new(two_group_directory()), scim.clone());

    let first = service.sync_groups_and_users(&[]).await.unwrap();
    assert_eq!(first.users_created, 3);

    // Second run diffs against the now-populated live target: everything is
    // equal, nothing is issued.
    let second = service.sync_groups_and_users(&[]).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.users_equal, 3);
    assert_eq!(second.groups_equal, 2);
}
