#![allow(dead_code)]

use async_insert::{DbError, QueueTransport, QueuedMessage, Result, Row, StorageBackend, Translator, Value};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Backend replaying scripted insert results and recording every call.
///
/// With an empty script inserts succeed, unless `fail_always` is set.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<()>>>,
    fail_always: Mutex<Option<String>>,
    calls: Mutex<Vec<(String, Row)>>,
    id_queries: AtomicUsize,
    last_id: Value,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fail_always: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            id_queries: AtomicUsize::new(0),
            last_id: Value::Integer(7),
        })
    }

    pub fn push_ok(&self) {
        self.script.lock().unwrap().push_back(Ok(()));
    }

    pub fn push_err(&self, err: DbError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn fail_always(&self, message: &str) {
        *self.fail_always.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.fail_always.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<(String, Row)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn id_queries(&self) -> usize {
        self.id_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for ScriptedBackend {
    async fn insert(&self, table: &str, row: &Row) -> Result<()> {
        self.calls.lock().unwrap().push((table.to_string(), row.clone()));
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        match self.fail_always.lock().unwrap().as_ref() {
            Some(message) => Err(DbError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    async fn last_generated_id(&self) -> Result<Value> {
        self.id_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.last_id.clone())
    }
}

/// Transport that either accepts and records messages or rejects them.
pub struct ScriptedTransport {
    failing: AtomicBool,
    sent: Mutex<Vec<QueuedMessage>>,
}

impl ScriptedTransport {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn broken() -> Arc<Self> {
        let transport = Self::working();
        transport.failing.store(true, Ordering::SeqCst);
        transport
    }

    pub fn sent(&self) -> Vec<QueuedMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueTransport for ScriptedTransport {
    async fn send(&self, message: QueuedMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Queue("broker unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self { id: None, name: name.to_string() }
    }
}

/// Maps `User` onto the `users` table.
pub struct UserTranslator;

impl Translator<User> for UserTranslator {
    fn translate(&self, user: &User) -> Result<(String, Row)> {
        let mut row = Row::new();
        if let Some(id) = user.id {
            row.insert("id".to_string(), Value::Integer(id));
        }
        row.insert("name".to_string(), Value::from(user.name.as_str()));
        Ok(("users".to_string(), row))
    }
}

/// Translator that cannot map anything.
pub struct BrokenTranslator;

impl Translator<User> for BrokenTranslator {
    fn translate(&self, _user: &User) -> Result<(String, Row)> {
        Err(DbError::Translation("no mapping for User".to_string()))
    }
}

pub fn users_row(name: &str) -> Row {
    let mut row = Row::new();
    row.insert("name".to_string(), Value::from(name));
    row
}

pub fn unique_violation() -> DbError {
    DbError::UniqueViolation {
        table: "users".to_string(),
        column: "name".to_string(),
        value: "a".to_string(),
    }
}
