/// Service-level tests over the in-memory stores
///
/// These cover the group-join protocol, the task access policy and the
/// credential flows end to end, without a database.

use chrono::{Duration, TimeZone, Utc};
use duotask_shared::auth::authorization::Principal;
use duotask_shared::auth::jwt::TokenCodec;
use duotask_shared::auth::password::{PasswordParams, SecretHasher};
use duotask_shared::models::task::{TaskPriority, TaskStatus};
use duotask_shared::models::user::NewUser;
use duotask_shared::service::accounts::{fetch_self, Accounts, AuthResponse, LoginInput, SignupInput};
use duotask_shared::service::groups::{self, CreateGroupInput, JoinByCodeInput};
use duotask_shared::service::tasks::{self, CreateTaskInput, UpdateTaskInput};
use duotask_shared::service::ServiceError;
use duotask_shared::store::Stores;
use uuid::Uuid;

const SECRET: &str = "service-test-secret-at-least-32-bytes";

fn accounts() -> Accounts {
    Accounts::new(
        TokenCodec::new(SECRET, TokenCodec::default_ttl()),
        SecretHasher::new(PasswordParams {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap(),
    )
}

async fn signup(accounts: &Accounts, stores: &Stores, name: &str, email: &str) -> AuthResponse {
    accounts
        .register(
            stores,
            SignupInput {
                name: name.to_string(),
                email: email.to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .expect("signup should succeed")
}

/// Resolves the principal fresh, as the HTTP layer does per request
async fn principal_for(accounts: &Accounts, stores: &Stores, auth: &AuthResponse) -> Principal {
    let header = format!("Bearer {}", auth.token);
    accounts
        .authenticate(stores, Some(&header))
        .await
        .expect("token should authenticate")
}

fn task_input(title: &str, days_from_now: i64) -> CreateTaskInput {
    CreateTaskInput {
        title: title.to_string(),
        date: Some(Utc::now() + Duration::days(days_from_now)),
        ..Default::default()
    }
}

fn join(code: &str) -> JoinByCodeInput {
    JoinByCodeInput {
        code: code.to_string(),
    }
}

#[tokio::test]
async fn test_household_scenario() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;

    // Created before Alice has a group: never visible to Bob
    let early = tasks::create_task(&stores, &alice, task_input("Early", 1)).await.unwrap();
    assert_eq!(early.group_id, None);

    let group = groups::create_group(
        &stores,
        &alice,
        CreateGroupInput {
            name: Some("Home".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(group.name, "Home");
    assert_eq!(group.members, vec![alice.user_id]);

    let alice = principal_for(&accounts, &stores, &a).await;
    assert_eq!(alice.group_id, Some(group.id));
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;
    let joined = groups::join_by_code(&stores, &bob, join(&code)).await.unwrap();
    assert_eq!(joined.id, group.id);
    assert_eq!(joined.members, vec![alice.user_id, bob.user_id]);

    let bob = principal_for(&accounts, &stores, &b).await;
    assert_eq!(bob.group_id, Some(group.id));

    let later = tasks::create_task(&stores, &alice, task_input("Later", 2)).await.unwrap();
    assert_eq!(later.group_id, Some(group.id));

    let bobs_view = tasks::list_tasks(&stores, &bob, None, None).await.unwrap();
    let ids: Vec<Uuid> = bobs_view.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![later.id]);

    assert!(tasks::get_task(&stores, &bob, later.id).await.is_ok());
    assert_eq!(
        tasks::get_task(&stores, &bob, early.id).await.unwrap_err(),
        ServiceError::task_not_found()
    );

    let alices_view = tasks::list_tasks(&stores, &alice, None, None).await.unwrap();
    assert_eq!(alices_view.len(), 2);

    let view = groups::my_group(&stores, &bob).await.unwrap().unwrap();
    let names: Vec<&str> = view.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[tokio::test]
async fn test_create_group_default_name_and_conflict() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;

    let group = groups::create_group(
        &stores,
        &alice,
        CreateGroupInput {
            name: Some("   ".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(group.name, "Alice's Household");

    let alice = principal_for(&accounts, &stores, &a).await;
    let again = groups::create_group(&stores, &alice, CreateGroupInput::default()).await;
    assert!(matches!(again, Err(ServiceError::Conflict(_))));

    // Still bound to the first group
    let profile = fetch_self(&stores, &alice).await.unwrap();
    assert_eq!(profile.group_id, Some(group.id));
}

#[tokio::test]
async fn test_join_is_idempotent() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;
    let first = groups::join_by_code(&stores, &bob, join(&code)).await.unwrap();

    let bob = principal_for(&accounts, &stores, &b).await;
    let second = groups::join_by_code(&stores, &bob, join(&code)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.members.iter().filter(|m| **m == bob.user_id).count(), 1);
    assert_eq!(second.members.len(), 2);

    // The owner using their own code is also a no-op
    let own = groups::join_by_code(&stores, &alice, join(&code)).await.unwrap();
    assert_eq!(own.members.len(), 2);
}

#[tokio::test]
async fn test_invalid_code_mutates_nothing() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;

    let unknown = groups::join_by_code(&stores, &bob, join("NOSUCHCODE")).await;
    assert_eq!(unknown.unwrap_err(), ServiceError::InvalidCode);

    // A code held by a groupless user is orphaned
    let c = signup(&accounts, &stores, "Carol", "carol@example.com").await;
    stores.users.set_invite_code(c.user.id, "ORPHAN1234").await.unwrap();
    let orphaned = groups::join_by_code(&stores, &bob, join("ORPHAN1234")).await;
    assert_eq!(orphaned.unwrap_err(), ServiceError::InvalidCode);

    let profile = fetch_self(&stores, &bob).await.unwrap();
    assert_eq!(profile.group_id, None);
    assert!(groups::my_group(&stores, &bob).await.unwrap().is_none());
}

#[tokio::test]
async fn test_join_code_length_is_validated() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;

    let too_long = "x".repeat(21);
    for code in ["abc", too_long.as_str()] {
        let result = groups::join_by_code(&stores, &bob, join(code)).await;
        assert!(
            matches!(result, Err(ServiceError::ValidationFailed(ref v)) if v[0].field == "code"),
            "code {:?} should fail validation",
            code
        );
    }
}

#[tokio::test]
async fn test_join_from_other_group_conflicts() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let c = signup(&accounts, &stores, "Carol", "carol@example.com").await;
    let carol = principal_for(&accounts, &stores, &c).await;
    let carols = groups::create_group(&stores, &carol, CreateGroupInput::default()).await.unwrap();
    let carol = principal_for(&accounts, &stores, &c).await;

    let result = groups::join_by_code(&stores, &carol, join(&code)).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    let profile = fetch_self(&stores, &carol).await.unwrap();
    assert_eq!(profile.group_id, Some(carols.id));
}

#[tokio::test]
async fn test_invite_code_requires_group_and_rotates() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    assert_eq!(
        groups::issue_invite_code(&stores, &alice).await.unwrap_err(),
        ServiceError::GroupRequired
    );

    groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let old = groups::issue_invite_code(&stores, &alice).await.unwrap();
    let new = groups::issue_invite_code(&stores, &alice).await.unwrap();
    assert_ne!(old, new);
    assert_eq!(new.len(), 12);

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;
    assert_eq!(
        groups::join_by_code(&stores, &bob, join(&old)).await.unwrap_err(),
        ServiceError::InvalidCode
    );
    assert!(groups::join_by_code(&stores, &bob, join(&new)).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_duplicate_members() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    let group = groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let stores = stores.clone();
            let bob = bob.clone();
            let code = code.clone();
            tokio::spawn(async move { groups::join_by_code(&stores, &bob, join(&code)).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let group = result.expect("task should not panic").expect("join should succeed");
        assert_eq!(group.members.iter().filter(|m| **m == bob.user_id).count(), 1);
    }

    let view = groups::my_group(&stores, &principal_for(&accounts, &stores, &b).await)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.id, group.id);
    assert_eq!(view.members.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_and_join_pick_one_group() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;

    let create = {
        let (stores, bob) = (stores.clone(), bob.clone());
        tokio::spawn(async move { groups::create_group(&stores, &bob, CreateGroupInput::default()).await })
    };
    let joining = {
        let (stores, bob) = (stores.clone(), bob.clone());
        tokio::spawn(async move { groups::join_by_code(&stores, &bob, join(&code)).await })
    };

    let created = create.await.unwrap();
    let joined = joining.await.unwrap();

    let profile = fetch_self(&stores, &bob).await.unwrap();
    match (created, joined) {
        (Ok(group), Err(ServiceError::Conflict(_))) => assert_eq!(profile.group_id, Some(group.id)),
        (Err(ServiceError::Conflict(_)), Ok(group)) => assert_eq!(profile.group_id, Some(group.id)),
        other => panic!("exactly one transition should win: {:?}", other),
    }
}

#[tokio::test]
async fn test_only_owner_mutates() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    groups::create_group(&stores, &alice, CreateGroupInput::default()).await.unwrap();
    let alice = principal_for(&accounts, &stores, &a).await;
    let code = groups::issue_invite_code(&stores, &alice).await.unwrap();

    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;
    groups::join_by_code(&stores, &bob, join(&code)).await.unwrap();
    let bob = principal_for(&accounts, &stores, &b).await;

    let task = tasks::create_task(&stores, &alice, task_input("Dishes", 1)).await.unwrap();

    let update = UpdateTaskInput {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    assert!(matches!(
        tasks::update_task(&stores, &bob, task.id, update.clone()).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        tasks::delete_task(&stores, &bob, task.id).await,
        Err(ServiceError::Forbidden(_))
    ));

    let updated = tasks::update_task(&stores, &alice, task.id, update).await.unwrap();
    assert_eq!(updated.status, TaskStatus::Completed);

    tasks::delete_task(&stores, &alice, task.id).await.unwrap();
    assert_eq!(
        tasks::delete_task(&stores, &alice, task.id).await.unwrap_err(),
        ServiceError::task_not_found()
    );
    assert_eq!(
        tasks::update_task(&stores, &alice, Uuid::new_v4(), UpdateTaskInput::default())
            .await
            .unwrap_err(),
        ServiceError::task_not_found()
    );
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;

    let created = tasks::create_task(
        &stores,
        &alice,
        CreateTaskInput {
            title: "Plan trip".to_string(),
            description: "Book flights".to_string(),
            date: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            tags: vec!["travel".to_string(), "summer".to_string()],
        },
    )
    .await
    .unwrap();

    let updated = tasks::update_task(
        &stores,
        &alice,
        created.id,
        UpdateTaskInput {
            priority: Some(TaskPriority::Urgent),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.priority, TaskPriority::Urgent);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.due_date, created.due_date);
    assert_eq!(updated.status, created.status);
    assert_eq!(updated.tags, created.tags);
    assert_eq!(updated.owner_id, alice.user_id);

    let blank = tasks::update_task(
        &stores,
        &alice,
        created.id,
        UpdateTaskInput {
            title: Some("  ".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(
        blank.unwrap_err(),
        ServiceError::invalid("title", "Title is required")
    );
}

#[tokio::test]
async fn test_create_task_defaults_and_validation() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;

    let task = tasks::create_task(&stores, &alice, task_input("Defaults", 0)).await.unwrap();
    assert_eq!(task.status, TaskStatus::NotStarted);
    assert_eq!(task.priority, TaskPriority::Low);
    assert!(task.tags.is_empty());
    assert_eq!(task.description, "");
    assert_eq!(task.owner_id, alice.user_id);

    let invalid = tasks::create_task(&stores, &alice, CreateTaskInput::default()).await;
    match invalid.unwrap_err() {
        ServiceError::ValidationFailed(violations) => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, vec!["date", "title"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_list_range_and_order() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;

    let day = |d: u32| Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap();
    let mk = |title: &str, d: u32| CreateTaskInput {
        title: title.to_string(),
        date: Some(day(d)),
        ..Default::default()
    };

    let first = tasks::create_task(&stores, &alice, mk("first", 2)).await.unwrap();
    let tie_old = tasks::create_task(&stores, &alice, mk("tie-old", 3)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let tie_new = tasks::create_task(&stores, &alice, mk("tie-new", 3)).await.unwrap();
    let last = tasks::create_task(&stores, &alice, mk("last", 9)).await.unwrap();

    let all = tasks::list_tasks(&stores, &alice, None, None).await.unwrap();
    let ids: Vec<Uuid> = all.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![first.id, tie_new.id, tie_old.id, last.id]);

    // Bounds are inclusive
    let ranged = tasks::list_tasks(&stores, &alice, Some(day(2)), Some(day(3))).await.unwrap();
    let ids: Vec<Uuid> = ranged.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![first.id, tie_new.id, tie_old.id]);

    let open_ended = tasks::list_tasks(&stores, &alice, Some(day(4)), None).await.unwrap();
    assert_eq!(open_ended.len(), 1);
    assert_eq!(open_ended[0].id, last.id);
}

#[tokio::test]
async fn test_groupless_users_see_only_their_own() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;
    let alice = principal_for(&accounts, &stores, &a).await;
    let b = signup(&accounts, &stores, "Bob", "bob@example.com").await;
    let bob = principal_for(&accounts, &stores, &b).await;

    let task = tasks::create_task(&stores, &alice, task_input("Private", 1)).await.unwrap();

    assert!(tasks::list_tasks(&stores, &bob, None, None).await.unwrap().is_empty());
    assert_eq!(
        tasks::get_task(&stores, &bob, task.id).await.unwrap_err(),
        ServiceError::task_not_found()
    );
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email_any_case() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    signup(&accounts, &stores, "Alice", "alice@example.com").await;

    let result = accounts
        .register(
            &stores,
            SignupInput {
                name: "Other".to_string(),
                email: "ALICE@Example.com".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await;
    assert_eq!(
        result.unwrap_err(),
        ServiceError::Conflict("Email already in use".to_string())
    );
}

#[tokio::test]
async fn test_signup_validation() {
    let stores = Stores::in_memory();
    let result = accounts()
        .register(
            &stores,
            SignupInput {
                name: " ".to_string(),
                email: "not-an-email".to_string(),
                password: "123".to_string(),
            },
        )
        .await;

    match result.unwrap_err() {
        ServiceError::ValidationFailed(violations) => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, vec!["email", "name", "password"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_login_failures_are_identical() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    let a = signup(&accounts, &stores, "Alice", "alice@example.com").await;

    let wrong_password = accounts
        .login(
            &stores,
            LoginInput {
                email: "alice@example.com".to_string(),
                password: "not-the-password".to_string(),
            },
        )
        .await
        .unwrap_err();
    let unknown_email = accounts
        .login(
            &stores,
            LoginInput {
                email: "nobody@example.com".to_string(),
                password: "not-the-password".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(wrong_password, ServiceError::InvalidCredentials);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());

    let ok = accounts
        .login(
            &stores,
            LoginInput {
                email: "Alice@Example.com".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(ok.user.id, a.user.id);
}

#[tokio::test]
async fn test_login_with_corrupt_digest_is_a_storage_fault() {
    let stores = Stores::in_memory();
    let accounts = accounts();
    stores
        .users
        .create(NewUser {
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: "$argon2id$invalid".to_string(),
        })
        .await
        .unwrap();

    let err = accounts
        .login(
            &stores,
            LoginInput {
                email: "dana@example.com".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Storage(_)), "{:?}", err);
}

#[tokio::test]
async fn test_authentication_failures_are_uniform() {
    let stores = Stores::in_memory();
    let accounts = accounts();

    let foreign = TokenCodec::new("some-other-secret-at-least-32-bytes", Duration::hours(1))
        .issue(Uuid::new_v4())
        .unwrap();
    let stale = accounts.tokens().issue(Uuid::new_v4()).unwrap();

    let cases = [
        None,
        Some("".to_string()),
        Some("Token abc".to_string()),
        Some("Bearer not-a-jwt".to_string()),
        Some(format!("Bearer {}", foreign)),
        // Valid signature, subject does not exist
        Some(format!("Bearer {}", stale)),
    ];

    for header in cases {
        let result = accounts.authenticate(&stores, header.as_deref()).await;
        assert_eq!(result.unwrap_err(), ServiceError::Unauthenticated, "header {:?}", header);
    }
}
