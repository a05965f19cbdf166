use chrono::{DateTime, Utc};

/// A person using the forum. Identified by a unique, self-asserted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub joined_at: DateTime<Utc>,
    pub name: String,
}

/// An area of discussion holding threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub created_by_id: i64,
    pub name: String,
}

/// A chain of posts with a single subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: i64,
    pub topic_id: i64,
    pub created_by_id: i64,
    pub subject: String,
}

/// One message within a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    pub posted_by_id: i64,
    pub posted_at: DateTime<Utc>,
    pub body: String,
}

// Constructors build transient records (id 0). Timestamps are fixed here,
// before the store ever sees the record.

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            joined_at: Utc::now(),
            name: name.into(),
        }
    }
}

impl Topic {
    pub fn new(created_by_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            created_by_id,
            name: name.into(),
        }
    }
}

impl Thread {
    pub fn new(topic_id: i64, created_by_id: i64, subject: impl Into<String>) -> Self {
        Self {
            id: 0,
            topic_id,
            created_by_id,
            subject: subject.into(),
        }
    }
}

impl Post {
    pub fn new(thread_id: i64, posted_by_id: i64, body: impl Into<String>) -> Self {
        Self {
            id: 0,
            thread_id,
            posted_by_id,
            posted_at: Utc::now(),
            body: body.into(),
        }
    }
}
