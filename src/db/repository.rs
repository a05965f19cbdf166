// Repository pattern - isolates all database side effects
use async_trait::async_trait;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::time::Duration;
use thiserror::Error;

use crate::db::models::{Post, Thread, Topic, User};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Sql(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

/// Repository trait - every read and write the forum performs.
///
/// Records are append-only: nothing here updates or deletes.
#[async_trait]
pub trait ForumRepository: Send + Sync {
    /// Insert a user, returning it with its new ID.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError>;

    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError>;

    /// Return the user with this name, creating it if absent. Safe under
    /// concurrent calls for the same new name: the loser of the insert race
    /// gets the winner's record.
    async fn get_or_create_user_by_name(&self, name: &str) -> Result<User, StoreError>;

    async fn create_topic(&self, topic: Topic) -> Result<Topic, StoreError>;

    /// All topics, ordered case-insensitively by name.
    async fn query_topics(&self) -> Result<Vec<Topic>, StoreError>;

    async fn get_topic_by_id(&self, id: i64) -> Result<Topic, StoreError>;

    async fn create_thread(&self, thread: Thread) -> Result<Thread, StoreError>;

    /// Threads of a topic, newest first.
    async fn query_threads_by_topic_id(&self, topic_id: i64) -> Result<Vec<Thread>, StoreError>;

    async fn get_thread_by_id(&self, id: i64) -> Result<Thread, StoreError>;

    async fn create_post(&self, post: Post) -> Result<Post, StoreError>;

    /// Posts of a thread, oldest first.
    async fn query_posts_by_thread_id(&self, thread_id: i64) -> Result<Vec<Post>, StoreError>;

    /// Atomically insert a thread and its opening post. The post's
    /// `thread_id` is overwritten with the new thread's ID.
    async fn create_thread_with_post(
        &self,
        thread: Thread,
        post: Post,
    ) -> Result<(Thread, Post), StoreError>;
}

/// SQLite implementation
pub struct SqliteForumRepository {
    pool: DbPool,
    timeout: Duration,
}

impl SqliteForumRepository {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run blocking SQLite work off the async runtime, bounded by the
    /// per-call timeout.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut conn)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                tracing::warn!("Store call exceeded {:?}", self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl ForumRepository for SqliteForumRepository {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        self.run(move |conn| insert_user(conn, user)).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.run(move |conn| select_user_by_id(conn, id)).await
    }

    async fn get_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let name = name.to_string();
        self.run(move |conn| select_user_by_name(conn, &name)).await
    }

    async fn get_or_create_user_by_name(&self, name: &str) -> Result<User, StoreError> {
        let name = name.to_string();
        self.run(move |conn| get_or_create_user(conn, &name)).await
    }

    async fn create_topic(&self, topic: Topic) -> Result<Topic, StoreError> {
        self.run(move |conn| insert_topic(conn, topic)).await
    }

    async fn query_topics(&self) -> Result<Vec<Topic>, StoreError> {
        self.run(|conn| select_topics(conn)).await
    }

    async fn get_topic_by_id(&self, id: i64) -> Result<Topic, StoreError> {
        self.run(move |conn| select_topic_by_id(conn, id)).await
    }

    async fn create_thread(&self, thread: Thread) -> Result<Thread, StoreError> {
        self.run(move |conn| insert_thread(conn, thread)).await
    }

    async fn query_threads_by_topic_id(&self, topic_id: i64) -> Result<Vec<Thread>, StoreError> {
        self.run(move |conn| select_threads_by_topic_id(conn, topic_id))
            .await
    }

    async fn get_thread_by_id(&self, id: i64) -> Result<Thread, StoreError> {
        self.run(move |conn| select_thread_by_id(conn, id)).await
    }

    async fn create_post(&self, post: Post) -> Result<Post, StoreError> {
        self.run(move |conn| insert_post(conn, post)).await
    }

    async fn query_posts_by_thread_id(&self, thread_id: i64) -> Result<Vec<Post>, StoreError> {
        self.run(move |conn| select_posts_by_thread_id(conn, thread_id))
            .await
    }

    async fn create_thread_with_post(
        &self,
        thread: Thread,
        post: Post,
    ) -> Result<(Thread, Post), StoreError> {
        self.run(move |conn| {
            // ATOMIC TRANSACTION - no thread without its first post
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let thread = insert_thread(&tx, thread)?;
            let post = insert_post(
                &tx,
                Post {
                    thread_id: thread.id,
                    ..post
                },
            )?;
            tx.commit()?;
            Ok((thread, post))
        })
        .await
    }
}

// --- Row helpers ---

/// Map "no rows" on a keyed lookup to `StoreError::NotFound`.
fn single<T>(result: rusqlite::Result<T>, what: impl FnOnce() -> String) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(what())),
        Err(e) => Err(e.into()),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        joined_at: row.get(1)?,
        name: row.get(2)?,
    })
}

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        created_by_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        created_by_id: row.get(2)?,
        subject: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        posted_by_id: row.get(2)?,
        posted_at: row.get(3)?,
        body: row.get(4)?,
    })
}

// --- Users ---

fn insert_user(conn: &Connection, mut user: User) -> Result<User, StoreError> {
    conn.execute(
        "INSERT INTO users (joined_at, name) VALUES (?1, ?2)",
        params![user.joined_at, user.name],
    )?;
    user.id = conn.last_insert_rowid();
    Ok(user)
}

fn select_user_by_id(conn: &Connection, id: i64) -> Result<User, StoreError> {
    single(
        conn.query_row(
            "SELECT id, joined_at, name FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        ),
        || format!("user {}", id),
    )
}

fn select_user_by_name(conn: &Connection, name: &str) -> Result<User, StoreError> {
    single(
        conn.query_row(
            "SELECT id, joined_at, name FROM users WHERE name = ?1",
            params![name],
            user_from_row,
        ),
        || format!("user {:?}", name),
    )
}

fn get_or_create_user(conn: &Connection, name: &str) -> Result<User, StoreError> {
    match select_user_by_name(conn, name) {
        Ok(user) => return Ok(user),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    match insert_user(conn, User::new(name)) {
        Ok(user) => {
            tracing::info!("Created user {} ({:?})", user.id, user.name);
            Ok(user)
        }
        // Someone else created it between our lookup and insert
        Err(e) if e.is_unique_violation() => {
            tracing::debug!("User {:?} created concurrently, re-fetching", name);
            select_user_by_name(conn, name)
        }
        Err(e) => Err(e),
    }
}

// --- Topics ---

fn insert_topic(conn: &Connection, mut topic: Topic) -> Result<Topic, StoreError> {
    conn.execute(
        "INSERT INTO topics (created_by_id, name) VALUES (?1, ?2)",
        params![topic.created_by_id, topic.name],
    )?;
    topic.id = conn.last_insert_rowid();
    Ok(topic)
}

fn select_topics(conn: &Connection) -> Result<Vec<Topic>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, created_by_id, name FROM topics ORDER BY upper(name), id")?;
    let topics = stmt
        .query_map([], topic_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(topics)
}

fn select_topic_by_id(conn: &Connection, id: i64) -> Result<Topic, StoreError> {
    single(
        conn.query_row(
            "SELECT id, created_by_id, name FROM topics WHERE id = ?1",
            params![id],
            topic_from_row,
        ),
        || format!("topic {}", id),
    )
}

// --- Threads ---

fn insert_thread(conn: &Connection, mut thread: Thread) -> Result<Thread, StoreError> {
    conn.execute(
        "INSERT INTO threads (topic_id, created_by_id, subject) VALUES (?1, ?2, ?3)",
        params![thread.topic_id, thread.created_by_id, thread.subject],
    )?;
    thread.id = conn.last_insert_rowid();
    Ok(thread)
}

fn select_threads_by_topic_id(conn: &Connection, topic_id: i64) -> Result<Vec<Thread>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, topic_id, created_by_id, subject FROM threads
         WHERE topic_id = ?1
         ORDER BY id DESC",
    )?;
    let threads = stmt
        .query_map(params![topic_id], thread_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(threads)
}

fn select_thread_by_id(conn: &Connection, id: i64) -> Result<Thread, StoreError> {
    single(
        conn.query_row(
            "SELECT id, topic_id, created_by_id, subject FROM threads WHERE id = ?1",
            params![id],
            thread_from_row,
        ),
        || format!("thread {}", id),
    )
}

// --- Posts ---

fn insert_post(conn: &Connection, mut post: Post) -> Result<Post, StoreError> {
    conn.execute(
        "INSERT INTO posts (thread_id, posted_by_id, posted_at, body) VALUES (?1, ?2, ?3, ?4)",
        params![post.thread_id, post.posted_by_id, post.posted_at, post.body],
    )?;
    post.id = conn.last_insert_rowid();
    Ok(post)
}

fn select_posts_by_thread_id(conn: &Connection, thread_id: i64) -> Result<Vec<Post>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, thread_id, posted_by_id, posted_at, body FROM posts
         WHERE thread_id = ?1
         ORDER BY id ASC",
    )?;
    let posts = stmt
        .query_map(params![thread_id], post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}
