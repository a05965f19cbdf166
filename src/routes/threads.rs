use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::Form;
use serde::Deserialize;

use crate::auth::current_user;
use crate::db::models::{Post, Thread};
use crate::error::{reject_if, require_text, AppResult};
use crate::markup::body_as_html;
use crate::routes::{parse_id, path_id};
use crate::state::AppState;
use crate::views::{DisplayPost, Html, NewPostTemplate, NewThreadTemplate, OneThreadTemplate};

// --- Forms ---

#[derive(Deserialize)]
pub struct AddThreadForm {
    #[serde(default, rename = "topicID")]
    pub topic_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct AddPostForm {
    #[serde(default, rename = "threadID")]
    pub thread_id: String,
    #[serde(default)]
    pub body: String,
}

// --- Handlers ---

/// POST /add-thread: new thread in a topic, with its first post
pub async fn add_thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AddThreadForm>,
) -> AppResult<Html<NewThreadTemplate>> {
    let topic_id = parse_id(&form.topic_id)?;
    let subject = form.subject.trim();
    let body = form.body.trim();
    reject_if(
        subject.is_empty() || body.is_empty(),
        "To create a thread, both subject and comments are required.",
    )?;

    let user = current_user(&state, &headers).await?;
    let topic = state.store.get_topic_by_id(topic_id).await?;

    let (thread, post) = state
        .store
        .create_thread_with_post(
            Thread::new(topic.id, user.id, subject),
            Post::new(0, user.id, body),
        )
        .await?;
    tracing::info!(
        "User {} created thread {} in topic {}",
        user.id,
        thread.id,
        topic.id
    );

    Ok(Html(NewThreadTemplate { thread, post }))
}

/// POST /add-post: reply within a thread
pub async fn add_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AddPostForm>,
) -> AppResult<Html<NewPostTemplate>> {
    let thread_id = parse_id(&form.thread_id)?;
    let body = require_text(&form.body, "Cannot post comments without any comments.")?;

    let user = current_user(&state, &headers).await?;
    let thread = state.store.get_thread_by_id(thread_id).await?;

    let post = state
        .store
        .create_post(Post::new(thread.id, user.id, body))
        .await?;
    tracing::info!("User {} posted {} in thread {}", user.id, post.id, thread.id);

    Ok(Html(NewPostTemplate { thread, post }))
}

/// GET /threads/{id}: every post in a thread, oldest first
pub async fn one_thread_page(
    State(state): State<AppState>,
    uri: Uri,
) -> AppResult<Html<OneThreadTemplate>> {
    let thread_id = path_id(uri.path())?;

    let thread = state.store.get_thread_by_id(thread_id).await?;
    let topic = state.store.get_topic_by_id(thread.topic_id).await?;
    let posts = state.store.query_posts_by_thread_id(thread.id).await?;

    // Posters repeat within a thread; look each one up once
    let mut names: HashMap<i64, String> = HashMap::new();
    let mut display_posts = Vec::with_capacity(posts.len());
    for post in posts {
        let user_name = match names.get(&post.posted_by_id) {
            Some(name) => name.clone(),
            None => {
                let user = state.store.get_user_by_id(post.posted_by_id).await?;
                names.insert(user.id, user.name.clone());
                user.name
            }
        };

        display_posts.push(DisplayPost {
            body_html: body_as_html(&post.body),
            user_name,
            posted_at: post.posted_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        });
    }

    Ok(Html(OneThreadTemplate {
        topic,
        thread,
        posts: display_posts,
    }))
}
