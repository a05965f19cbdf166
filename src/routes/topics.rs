use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::Form;
use serde::Deserialize;

use crate::auth::current_user;
use crate::db::models::Topic;
use crate::error::{require_text, AppResult};
use crate::routes::path_id;
use crate::state::AppState;
use crate::views::{Html, NewTopicTemplate, ThreadsTemplate, TopicsTemplate};

#[derive(Deserialize)]
pub struct AddTopicForm {
    #[serde(default)]
    pub name: String,
}

/// GET /topics
pub async fn topics_page(State(state): State<AppState>) -> AppResult<Html<TopicsTemplate>> {
    let topics = state.store.query_topics().await?;
    Ok(Html(TopicsTemplate { topics }))
}

/// GET /topics/{id}: one topic and its threads, newest first
pub async fn one_topic_page(
    State(state): State<AppState>,
    uri: Uri,
) -> AppResult<Html<ThreadsTemplate>> {
    let topic_id = path_id(uri.path())?;

    let topic = state.store.get_topic_by_id(topic_id).await?;
    let threads = state.store.query_threads_by_topic_id(topic.id).await?;

    Ok(Html(ThreadsTemplate { topic, threads }))
}

/// POST /add-topic
pub async fn add_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AddTopicForm>,
) -> AppResult<Html<NewTopicTemplate>> {
    let name = require_text(&form.name, "New topic name cannot be blank.")?;

    let user = current_user(&state, &headers).await?;
    let topic = state.store.create_topic(Topic::new(user.id, name)).await?;
    tracing::info!("User {} created topic {} ({:?})", user.id, topic.id, topic.name);

    Ok(Html(NewTopicTemplate { topic }))
}
