use async_trait::async_trait;
use profilescope_common::model::{
    Id,
    comment::Comment,
    envelope::{CommentsPage, Envelope, PostsPage, UsersPage},
    post::{Post, PostMarker},
    user::{UserMarker, UserProfile},
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";
pub const SUGGESTION_POOL_SIZE: u32 = 30;

pub type Result<T, E = DirectoryError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Request to the directory failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Directory replied with {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("Directory response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Read-only view of the remote user directory.
///
/// Every call is a fresh round trip. Nothing is retried or cached.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// First profile whose username matches exactly, `None` when nobody does.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserProfile>>;

    /// A fixed-size page of profiles used as the autocomplete pool.
    async fn list_suggestion_candidates(&self) -> Result<Vec<UserProfile>>;

    async fn list_posts_for_user(&self, user_id: Id<UserMarker>) -> Result<Vec<Post>>;

    async fn list_comments_for_post(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<UserProfile>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Post>;
}

#[derive(Clone, Debug)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<R> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, ?query, "Querying directory");

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status { status, url });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| DirectoryError::Decode { url, source })
    }

    async fn get_page<P>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<P::Item>>
    where
        P: Envelope + DeserializeOwned,
    {
        let page: P = self.get(path, query).await?;

        let info = page.page_info();
        debug!(
            path,
            total = info.total,
            skip = info.skip,
            limit = info.limit,
            "Received page"
        );

        Ok(page.into_items())
    }
}

impl Default for DirectoryClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let users = self
            .get_page::<UsersPage>("/users/filter", &[("key", "username"), ("value", username)])
            .await?;

        Ok(users.into_iter().next())
    }

    async fn list_suggestion_candidates(&self) -> Result<Vec<UserProfile>> {
        let limit = SUGGESTION_POOL_SIZE.to_string();
        self.get_page::<UsersPage>("/users", &[("limit", limit.as_str())])
            .await
    }

    async fn list_posts_for_user(&self, user_id: Id<UserMarker>) -> Result<Vec<Post>> {
        self.get_page::<PostsPage>(&format!("/posts/user/{user_id}"), &[])
            .await
    }

    async fn list_comments_for_post(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        self.get_page::<CommentsPage>(&format!("/comments/post/{post_id}"), &[])
            .await
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<UserProfile> {
        self.get(&format!("/users/{user_id}"), &[]).await
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Post> {
        self.get(&format!("/posts/{post_id}"), &[]).await
    }
}
