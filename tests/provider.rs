//! Scenarios that check a Provider keeps its local collection consistent with the remote store

use countdown_tasks::mock_store::{Call, CallKind, MockStore};
use countdown_tasks::provider::notice::{notice_channel, Notice, NoticeReceiver, Operation};
use countdown_tasks::provider::{MutationPolicy, Policies};
use countdown_tasks::traits::RemoteDocument;
use countdown_tasks::{Error, FieldUpdate, InputProblem, Outcome, Provider, TaskFields, TaskId};


fn doc(id: &str, text: &str, deadline: &str, completed: bool) -> RemoteDocument {
    RemoteDocument {
        id: TaskId::from(id),
        fields: TaskFields {
            text: text.to_string(),
            completed,
            deadline: deadline.to_string(),
        },
    }
}

fn initial_documents() -> Vec<RemoteDocument> {
    vec![
        doc("abc123", "Buy milk", "2030-01-01T09:00", false),
        doc("def456", "Pay rent", "2030-02-01T00:00", true),
    ]
}

/// A provider whose local collection has been loaded from a mocked store
async fn loaded_provider(documents: Vec<RemoteDocument>) -> (Provider<MockStore>, NoticeReceiver) {
    let (sender, receiver) = notice_channel();
    let provider = Provider::new(MockStore::with_documents(documents))
        .with_notices(sender);
    provider.load_all().await.unwrap();
    (provider, receiver)
}

/// Calls made after the initial load
fn calls_after_load(provider: &Provider<MockStore>) -> Vec<Call> {
    provider.remote().calls().into_iter()
        .filter(|call| call != &Call::ListAll)
        .collect()
}


#[tokio::test]
async fn test_load_all() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let tasks = provider.tasks().tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id(), &TaskId::from("abc123"));
    assert_eq!(tasks[0].text(), "Buy milk");
    assert_eq!(tasks[1].completed(), true);
}

#[tokio::test]
async fn test_load_failure_leaves_the_collection_empty() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (sender, mut notices) = notice_channel();
    let store = MockStore::with_documents(initial_documents());
    store.fail_next(CallKind::ListAll, 1);
    let provider = Provider::new(store).with_notices(sender);

    assert!(matches!(provider.load_all().await, Err(Error::Unavailable(_))));
    assert!(provider.tasks().is_empty());
    assert!(matches!(notices.try_recv(), Ok(Notice::Failed { operation: Operation::Load, .. })));

    // Nothing prevents trying again
    assert_eq!(provider.load_all().await.unwrap(), 2);
}

#[tokio::test]
async fn test_create_uses_the_remote_id() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(Vec::new()).await;
    provider.remote().queue_ids(vec![TaskId::from("abc123")]);

    let outcome = provider.create("Buy milk", "2030-01-01T09:00").await.unwrap();
    let created = outcome.task().unwrap().clone();
    assert_eq!(created.id(), &TaskId::from("abc123"));

    let tasks = provider.tasks().tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], created);
    assert_eq!(tasks[0].text(), "Buy milk");
    assert_eq!(tasks[0].completed(), false);
    assert_eq!(tasks[0].deadline(), "2030-01-01T09:00");

    assert_eq!(
        provider.remote().document(&TaskId::from("abc123")),
        Some(TaskFields::new("Buy milk".to_string(), "2030-01-01T09:00".to_string()))
    );
    assert_eq!(notices.try_recv().unwrap(), Notice::Created(TaskId::from("abc123")));
}

#[tokio::test]
async fn test_create_with_missing_input_does_nothing() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    let before = provider.tasks().tasks();

    assert_eq!(
        provider.create("", "2030-01-01T09:00").await.unwrap(),
        Outcome::InvalidInput(InputProblem::EmptyText)
    );
    assert_eq!(
        provider.create("Buy milk", "").await.unwrap(),
        Outcome::InvalidInput(InputProblem::EmptyDeadline)
    );
    assert_eq!(
        provider.create_from_dialog(Some(("Buy milk".to_string(), "next week".to_string()))).await.unwrap(),
        Outcome::InvalidInput(InputProblem::UnparseableDeadline("next week".to_string()))
    );
    assert_eq!(provider.create_from_dialog(None).await.unwrap(), Outcome::Cancelled);

    assert_eq!(provider.tasks().tasks(), before);
    assert!(calls_after_load(&provider).is_empty());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_create_failure() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    provider.remote().fail_next(CallKind::Create, 1);

    assert!(provider.create("Buy milk", "2030-01-01T09:00").await.is_err());
    assert_eq!(provider.tasks().len(), 2);
    assert!(matches!(notices.try_recv(), Ok(Notice::Failed { operation: Operation::Create, .. })));
}

#[tokio::test]
async fn test_update_writes_text_and_deadline_only() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    let id = TaskId::from("def456");

    let outcome = provider.update(&id, "Pay the rent", "2030-02-02T00:00").await.unwrap();
    assert!(outcome.is_committed());

    let expected_update = FieldUpdate::new()
        .text("Pay the rent".to_string())
        .deadline("2030-02-02T00:00".to_string());
    assert_eq!(calls_after_load(&provider), vec![Call::UpdateFields(id.clone(), expected_update)]);

    let task = provider.tasks().get(&id).unwrap();
    assert_eq!(task.text(), "Pay the rent");
    assert_eq!(task.deadline(), "2030-02-02T00:00");
    assert_eq!(task.completed(), true);
    assert_eq!(outcome.task(), Some(&task));
    assert_eq!(notices.try_recv().unwrap(), Notice::Updated(id));
}

#[tokio::test]
async fn test_update_of_an_unknown_task_fails_fast() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let ghost = TaskId::from("ghost");

    assert!(matches!(provider.update(&ghost, "Boo", "2030-01-01T09:00").await, Err(Error::UnknownTask(id)) if id == ghost));
    assert!(matches!(provider.toggle_completion(&ghost).await, Err(Error::UnknownTask(_))));
    assert!(matches!(provider.remove(&ghost).await, Err(Error::UnknownTask(_))));
    assert!(calls_after_load(&provider).is_empty());
}

#[tokio::test]
async fn test_update_with_missing_input_does_nothing() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let id = TaskId::from("abc123");

    assert_eq!(provider.update(&id, "Buy milk", "").await.unwrap(), Outcome::InvalidInput(InputProblem::EmptyDeadline));
    assert_eq!(provider.update_from_dialog(&id, None).await.unwrap(), Outcome::Cancelled);
    assert_eq!(provider.tasks().get(&id).unwrap().deadline(), "2030-01-01T09:00");
    assert!(calls_after_load(&provider).is_empty());
}

#[tokio::test]
async fn test_failed_confirmed_update_changes_nothing() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    provider.remote().fail_next(CallKind::UpdateFields, 1);
    let id = TaskId::from("abc123");

    assert!(provider.update(&id, "Buy oat milk", "2030-01-01T10:00").await.is_err());
    assert_eq!(provider.tasks().get(&id).unwrap().text(), "Buy milk");
}

#[tokio::test]
async fn test_failed_optimistic_update_is_rolled_back() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let provider = provider.with_policies(Policies {
        update: MutationPolicy::optimistic(),
        ..Policies::default()
    });
    provider.remote().fail_next(CallKind::UpdateFields, 1);
    let id = TaskId::from("abc123");

    assert!(provider.update(&id, "Buy oat milk", "2030-01-01T10:00").await.is_err());
    let task = provider.tasks().get(&id).unwrap();
    assert_eq!(task.text(), "Buy milk");
    assert_eq!(task.deadline(), "2030-01-01T09:00");
}

#[tokio::test]
async fn test_toggle_is_applied_before_the_remote_answers() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    let id = TaskId::from("abc123");
    provider.remote().hold();

    let toggling = provider.toggle_completion(&id);
    let observing = async {
        tokio::task::yield_now().await;
        let completed_locally = provider.tasks().get(&id).unwrap().completed();
        let completed_remotely = provider.remote().document(&id).unwrap().completed;
        provider.remote().release();
        (completed_locally, completed_remotely)
    };
    let (outcome, (completed_locally, completed_remotely)) = tokio::join!(toggling, observing);

    assert!(completed_locally);
    assert!(completed_remotely == false);
    assert!(outcome.unwrap().task().unwrap().completed());
    assert!(provider.remote().document(&id).unwrap().completed);
    assert_eq!(notices.try_recv().unwrap(), Notice::Toggled { id, completed: true });
}

#[tokio::test]
async fn test_failed_toggle_is_rolled_back_by_default() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    provider.remote().fail_next(CallKind::UpdateFields, 1);
    let id = TaskId::from("abc123");

    assert!(provider.toggle_completion(&id).await.is_err());
    assert_eq!(provider.tasks().get(&id).unwrap().completed(), false);
    assert!(matches!(notices.try_recv(), Ok(Notice::Failed { operation: Operation::Toggle, .. })));

    // The next try goes through
    provider.toggle_completion(&id).await.unwrap();
    assert_eq!(provider.tasks().get(&id).unwrap().completed(), true);
}

#[tokio::test]
async fn test_failed_toggle_without_rollback_stays_flipped() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let provider = provider.with_policies(Policies {
        toggle: MutationPolicy::optimistic_without_rollback(),
        ..Policies::default()
    });
    provider.remote().fail_next(CallKind::UpdateFields, 1);
    let id = TaskId::from("abc123");

    assert!(provider.toggle_completion(&id).await.is_err());
    assert_eq!(provider.tasks().get(&id).unwrap().completed(), true);
    assert_eq!(provider.remote().document(&id).unwrap().completed, false);
}

#[tokio::test]
async fn test_confirmed_toggle_waits_for_the_remote() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, _notices) = loaded_provider(initial_documents()).await;
    let provider = provider.with_policies(Policies {
        toggle: MutationPolicy::confirmed(),
        ..Policies::default()
    });
    let id = TaskId::from("def456");
    provider.remote().hold();

    let toggling = provider.toggle_completion(&id);
    let observing = async {
        tokio::task::yield_now().await;
        let completed_locally = provider.tasks().get(&id).unwrap().completed();
        provider.remote().release();
        completed_locally
    };
    let (outcome, completed_locally) = tokio::join!(toggling, observing);

    assert!(completed_locally);
    assert!(outcome.is_ok());
    assert_eq!(provider.tasks().get(&id).unwrap().completed(), false);
}

#[tokio::test]
async fn test_remove() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    let id = TaskId::from("abc123");

    let outcome = provider.remove(&id).await.unwrap();
    assert_eq!(outcome.task().unwrap().id(), &id);
    assert!(provider.tasks().contains(&id) == false);
    assert_eq!(provider.tasks().len(), 1);
    assert_eq!(provider.remote().document(&id), None);
    assert_eq!(notices.try_recv().unwrap(), Notice::Deleted(id));
}

#[tokio::test]
async fn test_failed_remove_keeps_the_task() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (provider, mut notices) = loaded_provider(initial_documents()).await;
    provider.remote().fail_next(CallKind::Delete, 1);
    let id = TaskId::from("abc123");

    assert!(provider.remove(&id).await.is_err());
    assert!(provider.tasks().contains(&id));
    assert!(matches!(notices.try_recv(), Ok(Notice::Failed { operation: Operation::Remove, .. })));
}
