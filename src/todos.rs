use crate::errors::AppError;
use crate::models::{AppData, NewTodo, Todo, TodoPatch};
use crate::storage::LocalStore;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn list(data: &AppData, project_id: Option<&str>) -> Vec<Todo> {
    let mut todos: Vec<Todo> = data
        .todos
        .iter()
        .filter(|todo| project_id.is_none_or(|id| todo.project_id.as_deref() == Some(id)))
        .cloned()
        .collect();
    todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    todos
}

pub fn add(data: &mut AppData, new: NewTodo, now: DateTime<Utc>) -> Result<Todo, AppError> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let todo = Todo {
        id: Uuid::new_v4(),
        title: title.to_string(),
        priority: new.priority,
        status: new.status,
        repo_id: new.repo_id,
        repo_name: new.repo_name,
        project_id: new.project_id,
        created_at: now,
        updated_at: now,
    };
    data.todos.push(todo.clone());
    Ok(todo)
}

pub fn update(
    data: &mut AppData,
    id: Uuid,
    patch: TodoPatch,
    now: DateTime<Utc>,
) -> Result<Todo, AppError> {
    let todo = data
        .todos
        .iter_mut()
        .find(|todo| todo.id == id)
        .ok_or_else(|| AppError::not_found(format!("todo {id} not found")))?;

    if let Some(title) = patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        todo.title = title.to_string();
    }
    if let Some(priority) = patch.priority {
        todo.priority = priority;
    }
    if let Some(status) = patch.status {
        todo.status = status;
    }
    if patch.repo_id.is_some() {
        todo.repo_id = patch.repo_id;
    }
    if patch.repo_name.is_some() {
        todo.repo_name = patch.repo_name;
    }
    todo.updated_at = now;
    Ok(todo.clone())
}

pub fn remove(data: &mut AppData, id: Uuid) -> Result<(), AppError> {
    let before = data.todos.len();
    data.todos.retain(|todo| todo.id != id);
    if data.todos.len() == before {
        return Err(AppError::not_found(format!("todo {id} not found")));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TodoStore {
    store: LocalStore,
}

impl TodoStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, project_id: Option<&str>) -> Vec<Todo> {
        self.store.read(|data| list(data, project_id)).await
    }

    pub async fn add(&self, new: NewTodo) -> Result<Todo, AppError> {
        self.store.update(|data| add(data, new, Utc::now())).await?
    }

    pub async fn update(&self, id: Uuid, patch: TodoPatch) -> Result<Todo, AppError> {
        self.store
            .update(|data| update(data, id, patch, Utc::now()))
            .await?
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.store.update(|data| remove(data, id)).await?
    }
}
