//! In-memory todo storage. Not a route file: `^_` names are excluded.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    todos: BTreeMap<u64, Todo>,
}

#[derive(Debug, Clone, Default)]
pub struct Store(Arc<Mutex<Inner>>);

impl Store {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn list(&self) -> Vec<Todo> {
        self.inner().todos.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<Todo> {
        self.inner().todos.get(&id).cloned()
    }

    pub fn insert(&self, title: String) -> Todo {
        let mut inner = self.inner();
        inner.next_id += 1;
        let todo = Todo {
            id: inner.next_id,
            title,
            done: false,
        };
        inner.todos.insert(todo.id, todo.clone());
        todo
    }

    pub fn update(&self, id: u64, title: Option<String>, done: Option<bool>) -> Option<Todo> {
        let mut inner = self.inner();
        let todo = inner.todos.get_mut(&id)?;
        if let Some(title) = title {
            todo.title = title;
        }
        if let Some(done) = done {
            todo.done = done;
        }
        Some(todo.clone())
    }

    pub fn remove(&self, id: u64) -> Option<Todo> {
        self.inner().todos.remove(&id)
    }
}
