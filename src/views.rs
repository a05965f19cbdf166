use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::models::{Post, Thread, Topic};

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate;

#[derive(Template)]
#[template(path = "pages/welcome.html")]
pub struct WelcomeTemplate {
    pub name: String,
}

#[derive(Template)]
#[template(path = "pages/topics.html")]
pub struct TopicsTemplate {
    pub topics: Vec<Topic>,
}

#[derive(Template)]
#[template(path = "pages/threads.html")]
pub struct ThreadsTemplate {
    pub topic: Topic,
    pub threads: Vec<Thread>,
}

#[derive(Template)]
#[template(path = "pages/new_topic.html")]
pub struct NewTopicTemplate {
    pub topic: Topic,
}

#[derive(Template)]
#[template(path = "pages/new_thread.html")]
pub struct NewThreadTemplate {
    pub thread: Thread,
    pub post: Post,
}

#[derive(Template)]
#[template(path = "pages/new_post.html")]
pub struct NewPostTemplate {
    pub thread: Thread,
    pub post: Post,
}

/// A post ready for display: body already converted to markup and the
/// poster's name resolved.
pub struct DisplayPost {
    pub body_html: String,
    pub user_name: String,
    pub posted_at: String,
}

#[derive(Template)]
#[template(path = "pages/one_thread.html")]
pub struct OneThreadTemplate {
    pub topic: Topic,
    pub thread: Thread,
    pub posts: Vec<DisplayPost>,
}

#[derive(Template)]
#[template(path = "pages/user_error.html")]
pub struct UserErrorTemplate {
    pub message: String,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        render_page(StatusCode::OK, &self.0)
    }
}

/// Render a view with the given status. Templates render into a buffer, so
/// a failure here has not written anything yet and becomes a single 500.
pub fn render_page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}
