use std::cell::RefCell;
use todo_core::db::open_db_in_memory;
use todo_core::{
    CreateTodoRequest, ErrorKind, OpContext, Priority, RepoError, RepoResult,
    SqliteTodoRepository, Todo, TodoId, TodoRepository, TodoService, TodoServiceError,
    TodoValidationError,
};

/// In-memory repository that records every call it receives.
#[derive(Default)]
struct RecordingRepo {
    rows: RefCell<Vec<Todo>>,
    calls: RefCell<Vec<&'static str>>,
    fail_with_storage_error: bool,
}

impl RecordingRepo {
    fn failing() -> Self {
        Self {
            fail_with_storage_error: true,
            ..Self::default()
        }
    }

    fn record(&self, call: &'static str) -> RepoResult<()> {
        self.calls.borrow_mut().push(call);
        if self.fail_with_storage_error {
            return Err(RepoError::InvalidData("disk on fire".to_string()));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl TodoRepository for RecordingRepo {
    fn create(&self, _ctx: &OpContext, todo: &mut Todo) -> RepoResult<TodoId> {
        self.record("create")?;
        let mut rows = self.rows.borrow_mut();
        todo.id = rows.len() as TodoId + 1;
        rows.push(todo.clone());
        Ok(todo.id)
    }

    fn fetch_all(&self, _ctx: &OpContext) -> RepoResult<Vec<Todo>> {
        self.record("fetch_all")?;
        Ok(self.rows.borrow().iter().rev().cloned().collect())
    }

    fn get_by_id(&self, _ctx: &OpContext, id: TodoId) -> RepoResult<Todo> {
        self.record("get_by_id")?;
        self.rows
            .borrow()
            .iter()
            .find(|todo| todo.id == id)
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    fn update(&self, _ctx: &OpContext, todo: &Todo) -> RepoResult<()> {
        self.record("update")?;
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|row| row.id == todo.id)
            .ok_or(RepoError::NotFound(todo.id))?;
        *row = todo.clone();
        Ok(())
    }

    fn update_status(
        &self,
        _ctx: &OpContext,
        id: TodoId,
        is_completed: bool,
        updated_at: i64,
    ) -> RepoResult<()> {
        self.record("update_status")?;
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound(id))?;
        row.is_completed = is_completed;
        row.updated_at = updated_at;
        Ok(())
    }

    fn delete(&self, _ctx: &OpContext, id: TodoId) -> RepoResult<bool> {
        self.record("delete")?;
        let mut rows = self.rows.borrow_mut();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }
}

#[test]
fn create_with_empty_title_makes_no_store_calls() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);

    let err = service
        .create_todo(&OpContext::background(), "")
        .unwrap_err();

    assert!(matches!(
        err,
        TodoServiceError::Validation(TodoValidationError::EmptyTitle)
    ));
    assert_eq!(err.kind(), ErrorKind::EmptyTitle);
    assert!(repo.calls().is_empty());
}

#[test]
fn create_delegates_once_and_returns_persisted_todo() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);

    let todo = service
        .create_todo(&OpContext::background(), "買い物に行く")
        .unwrap();

    assert_eq!(todo.id, 1);
    assert!(!todo.is_completed);
    assert_eq!(repo.calls(), ["create"]);
}

#[test]
fn create_with_invalid_priority_makes_no_store_calls() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);

    let err = service
        .create_todo_with(
            &OpContext::background(),
            CreateTodoRequest {
                title: "plan".to_string(),
                priority: Some("urgent".to_string()),
                ..CreateTodoRequest::default()
            },
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(repo.calls().is_empty());
}

#[test]
fn update_todo_revalidates_title_before_delegating() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);
    let ctx = OpContext::background();

    let mut todo = service.create_todo(&ctx, "draft").unwrap();
    todo.title.clear();

    let err = service.update_todo(&ctx, todo).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyTitle);
    assert_eq!(repo.calls(), ["create"]);
}

#[test]
fn update_todo_refreshes_updated_at() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);
    let ctx = OpContext::background();

    let mut todo = service.create_todo(&ctx, "draft").unwrap();
    todo.updated_at = 0;
    todo.description = "more detail".to_string();

    let updated = service.update_todo(&ctx, todo.clone()).unwrap();
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(repo.calls(), ["create", "update", "get_by_id"]);
    assert_eq!(
        service.get_todo_by_id(&ctx, todo.id).unwrap().description,
        "more detail"
    );
}

#[test]
fn storage_errors_are_surfaced_without_retry() {
    let repo = RecordingRepo::failing();
    let service = TodoService::new(&repo);

    let err = service
        .get_all_todos(&OpContext::background())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(repo.calls(), ["fetch_all"]);
}

#[test]
fn not_found_is_identical_for_unknown_and_deleted_ids() {
    let repo = RecordingRepo::default();
    let service = TodoService::new(&repo);
    let ctx = OpContext::background();

    let todo = service.create_todo(&ctx, "short lived").unwrap();
    assert!(service.delete_todo(&ctx, todo.id).unwrap());

    let deleted = service.get_todo_by_id(&ctx, todo.id).unwrap_err();
    let unknown = service.get_todo_by_id(&ctx, 9999).unwrap_err();
    assert_eq!(deleted.kind(), ErrorKind::NotFound);
    assert_eq!(unknown.kind(), ErrorKind::NotFound);
}

// Scenario seeds below run against the SQLite adapter end to end.

#[test]
fn scenario_create_buy_milk() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let todo = service
        .create_todo(&OpContext::background(), "Buy milk")
        .unwrap();

    assert_eq!(todo.id, 1);
    assert_eq!(todo.title, "Buy milk");
    assert!(!todo.is_completed);
}

#[test]
fn scenario_empty_title_creates_no_row() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    assert_eq!(
        service.create_todo(&ctx, "").unwrap_err().kind(),
        ErrorKind::EmptyTitle
    );
    assert!(service.get_all_todos(&ctx).unwrap().is_empty());
}

#[test]
fn scenario_list_returns_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    service.create_todo(&ctx, "A").unwrap();
    service.create_todo(&ctx, "B").unwrap();

    let titles: Vec<_> = service
        .get_all_todos(&ctx)
        .unwrap()
        .into_iter()
        .map(|todo| todo.title)
        .collect();
    assert_eq!(titles, ["B", "A"]);
}

#[test]
fn scenario_status_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    let todo = service.create_todo(&ctx, "toggle me").unwrap();

    service.update_todo_status(&ctx, todo.id, true).unwrap();
    assert!(service.get_todo_by_id(&ctx, todo.id).unwrap().is_completed);

    service.update_todo_status(&ctx, todo.id, true).unwrap();
    assert!(service.get_todo_by_id(&ctx, todo.id).unwrap().is_completed);

    service.update_todo_status(&ctx, todo.id, false).unwrap();
    assert!(!service.get_todo_by_id(&ctx, todo.id).unwrap().is_completed);
}

#[test]
fn scenario_delete_then_get_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    let todo = service.create_todo(&ctx, "Buy milk").unwrap();
    service.delete_todo(&ctx, todo.id).unwrap();

    assert!(matches!(
        service.get_todo_by_id(&ctx, todo.id).unwrap_err(),
        TodoServiceError::NotFound(id) if id == todo.id
    ));
}

#[test]
fn scenario_get_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let err = service
        .get_todo_by_id(&OpContext::background(), 9999)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn status_update_on_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let err = service
        .update_todo_status(&OpContext::background(), 9999, true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_todo_ignores_caller_created_at_and_returns_stored_row() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    let original = service.create_todo(&ctx, "a").unwrap();
    let mut edited = original.clone();
    edited.title = "b".to_string();
    edited.created_at = 9_000_000_000_000;

    let returned = service.update_todo(&ctx, edited).unwrap();
    let stored = service.get_todo_by_id(&ctx, original.id).unwrap();

    assert_eq!(returned, stored);
    assert_eq!(stored.title, "b");
    assert_eq!(stored.created_at, original.created_at);
    assert!(stored.updated_at >= original.created_at);
    assert!(stored.updated_at < 9_000_000_000_000);
}

#[test]
fn create_with_details_persists_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    let created = service
        .create_todo_with(
            &ctx,
            CreateTodoRequest {
                title: "file taxes".to_string(),
                description: Some("before the deadline".to_string()),
                priority: Some("High".to_string()),
                due_date: Some(1_800_000_000_000),
            },
        )
        .unwrap();

    let loaded = service.get_todo_by_id(&ctx, created.id).unwrap();
    assert_eq!(loaded.description, "before the deadline");
    assert_eq!(loaded.priority, Some(Priority::High));
    assert_eq!(loaded.due_date, Some(1_800_000_000_000));
}

#[test]
fn stats_summarize_completion() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let ctx = OpContext::background();

    let first = service.create_todo(&ctx, "one").unwrap();
    service.create_todo(&ctx, "two").unwrap();
    service.update_todo_status(&ctx, first.id, true).unwrap();

    let stats = service.todo_stats(&ctx).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.completion_rate_percent, 50);
}

#[test]
fn expired_deadline_surfaces_cancelled_kind() {
    let conn = open_db_in_memory().unwrap();
    let service = TodoService::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let ctx = OpContext::with_timeout(std::time::Duration::ZERO);
    let err = service.create_todo(&ctx, "too late").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(service
        .get_all_todos(&OpContext::background())
        .unwrap()
        .is_empty());
}
