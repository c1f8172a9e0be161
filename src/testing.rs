//! In-memory stores and fixtures for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::{AppConfig, CookieConfig, JwtConfig, RateLimitConfig, SameSite};
use crate::error::StoreError;
use crate::state::AppState;
use crate::todos::repo::TodoStore;
use crate::todos::repo_types::{NewTodo, Todo, TodoPatch};
use crate::todos::summarizer::{Summarizer, TodoDigest};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn is_empty(&self) -> bool {
        self.users.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_active = active;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn toggle_active(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_active = !u.is_active;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryTodoStore {
    todos: Mutex<HashMap<Uuid, Todo>>,
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn insert(&self, user_id: Uuid, new: NewTodo) -> Result<Todo, StoreError> {
        let now = OffsetDateTime::now_utc();
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            created_at: now,
            updated_at: now,
        };
        self.todos.lock().unwrap().insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.lock().unwrap();
        let mut mine: Vec<Todo> = todos.values().filter(|t| t.user_id == user_id).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.lock().unwrap();
        Ok(todos.get(&id).filter(|t| t.user_id == user_id).cloned())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.lock().unwrap();
        let Some(todo) = todos.get_mut(&id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            todo.title = title;
        }
        if let Some(description) = patch.description {
            todo.description = Some(description);
        }
        if let Some(completed) = patch.completed {
            todo.completed = completed;
        }
        todo.updated_at = OffsetDateTime::now_utc();
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut todos = self.todos.lock().unwrap();
        match todos.get(&id) {
            Some(t) if t.user_id == user_id => {
                todos.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Records how often it is called; renders "<n> todos: <titles>".
#[derive(Default)]
pub struct CountingSummarizer {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingSummarizer {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, todos: &[TodoDigest]) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("summarizer unavailable");
        }
        let titles: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
        Ok(format!("{} todos: {}", todos.len(), titles.join(", ")))
    }
}

pub const ADMIN_EMAIL: &str = "root@x.com";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60 * 24 * 7,
        },
        cookie: CookieConfig {
            name: "access_token".into(),
            secure: false,
            same_site: SameSite::Lax,
        },
        cors_origins: Vec::new(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        summarizer_url: None,
        rate_limit: RateLimitConfig {
            register_per_minute: 1000,
            login_per_minute: 1000,
            client_ip_header: None,
        },
    }
}

/// State over fresh in-memory stores, plus a handle on the summarizer.
pub fn test_state_with(config: AppConfig) -> (AppState, Arc<CountingSummarizer>) {
    let summarizer = Arc::new(CountingSummarizer::default());
    let state = AppState::from_parts(
        Arc::new(config),
        Arc::new(MemoryUserStore::default()),
        Arc::new(MemoryTodoStore::default()),
        summarizer.clone(),
    );
    (state, summarizer)
}

pub fn test_state() -> (AppState, Arc<CountingSummarizer>) {
    test_state_with(test_config())
}
