//! Screen state of the search page.
//!
//! A [`SearchSession`] is never edited in place: every transition consumes the current value
//! and returns the next one. Transitions that answer an outstanding request take the
//! [`Generation`] the request was issued under and leave the session untouched when a newer
//! search (or a clear) has happened since.

use profilescope_client::DirectoryError;
use profilescope_common::{
    model::{
        Id,
        comment::Comment,
        post::{Post, PostMarker},
        user::UserProfile,
    },
    present::timeline::PostComments,
};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Please enter a username")]
    EmptyQuery,
    #[error("No user named {0}")]
    UserNotFound(String),
    #[error("Could not look up the user. Please try again.")]
    Lookup(#[source] DirectoryError),
}

/// Identifies one search. Bumped whenever the results on screen are thrown away.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    NotFound,
    Failed,
    Found,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct SearchSession {
    query: String,
    searched_for: String,
    loading: bool,
    error: String,
    user_not_found: bool,
    user: Option<UserProfile>,
    posts: Vec<Post>,
    comments: PostComments,
    candidates: Vec<UserProfile>,
    suggestions: Vec<UserProfile>,
    suggestions_visible: bool,
    generation: Generation,
}

impl SearchSession {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The trimmed username of the latest search, independent of later edits to the query.
    #[must_use]
    pub fn searched_for(&self) -> &str {
        &self.searched_for
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Empty when there is nothing to report.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    #[must_use]
    pub fn user_not_found(&self) -> bool {
        self.user_not_found
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn comments(&self) -> &PostComments {
        &self.comments
    }

    #[must_use]
    pub fn candidates(&self) -> &[UserProfile] {
        &self.candidates
    }

    #[must_use]
    pub fn suggestions(&self) -> &[UserProfile] {
        &self.suggestions
    }

    #[must_use]
    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        if self.loading {
            SearchPhase::Searching
        } else if !self.error.is_empty() {
            SearchPhase::Failed
        } else if self.user_not_found {
            SearchPhase::NotFound
        } else if self.user.is_some() {
            SearchPhase::Found
        } else {
            SearchPhase::Idle
        }
    }

    #[must_use]
    pub fn with_query(self, query: String) -> Self {
        Self { query, ..self }
    }

    /// Input was rejected before any request went out. Nothing else changes.
    #[must_use]
    pub fn rejected(self, error: &SearchError) -> Self {
        Self {
            error: error.to_string(),
            ..self
        }
    }

    /// Drops everything the previous search produced and enters the loading state.
    #[must_use]
    pub fn search_started(self) -> Self {
        let generation = self.generation.next();
        let searched_for = self.query.trim().to_owned();
        Self {
            searched_for,
            loading: true,
            generation,
            ..self.reset()
        }
    }

    #[must_use]
    pub fn user_not_found_for(self, generation: Generation) -> Self {
        if generation != self.generation {
            return self;
        }

        Self {
            user_not_found: true,
            loading: false,
            ..self
        }
    }

    /// The profile arrived; posts are still being fetched so loading stays on.
    #[must_use]
    pub fn user_found(self, generation: Generation, user: UserProfile) -> Self {
        if generation != self.generation {
            return self;
        }

        Self {
            user: Some(user),
            ..self
        }
    }

    #[must_use]
    pub fn search_failed(self, generation: Generation, error: &SearchError) -> Self {
        if generation != self.generation {
            return self;
        }

        Self {
            error: error.to_string(),
            loading: false,
            ..self
        }
    }

    #[must_use]
    pub fn posts_loaded(self, generation: Generation, posts: Vec<Post>) -> Self {
        if generation != self.generation {
            return self;
        }

        Self {
            posts,
            loading: false,
            ..self
        }
    }

    /// Stores the comments of one post. Answers for posts that are not on screen are dropped.
    #[must_use]
    pub fn comments_loaded(
        mut self,
        generation: Generation,
        post_id: Id<PostMarker>,
        comments: Vec<Comment>,
    ) -> Self {
        if generation != self.generation || !self.posts.iter().any(|post| post.id == post_id) {
            return self;
        }

        self.comments.insert(post_id, comments);
        self
    }

    /// Empties the query and all results. The candidate pool survives.
    #[must_use]
    pub fn cleared(self) -> Self {
        let generation = self.generation.next();
        Self {
            query: String::new(),
            searched_for: String::new(),
            loading: false,
            generation,
            ..self.reset()
        }
    }

    #[must_use]
    pub fn candidates_loaded(self, candidates: Vec<UserProfile>) -> Self {
        Self { candidates, ..self }
    }

    #[must_use]
    pub fn suggestions_shown(self, suggestions: Vec<UserProfile>) -> Self {
        Self {
            suggestions_visible: !suggestions.is_empty(),
            suggestions,
            ..self
        }
    }

    #[must_use]
    pub fn suggestions_hidden(self) -> Self {
        Self {
            suggestions_visible: false,
            ..self
        }
    }

    fn reset(self) -> Self {
        Self {
            user: None,
            posts: Vec::new(),
            comments: PostComments::new(),
            error: String::new(),
            user_not_found: false,
            ..self
        }
    }
}
