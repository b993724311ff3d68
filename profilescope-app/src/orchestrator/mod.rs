//! The search page's event loop.
//!
//! One task owns the [`SearchSession`] and handles one [`Event`] at a time. Directory requests
//! run as separate tasks and report back through the same queue, so their completions interleave
//! freely but never overlap with another handler.

pub mod suggest;

use crate::session::{Generation, SearchError, SearchSession};
use profilescope_client::{Directory, DirectoryError};
use profilescope_common::model::{
    Id,
    comment::Comment,
    post::{Post, PostMarker},
    user::{UserMarker, UserProfile},
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(200);

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct OrchestratorConfig {
    /// Quiet period before a typed term turns into suggestions.
    pub debounce: Duration,
    /// How long a hide request waits, so that a click on a suggestion still lands.
    pub hide_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            hide_delay: DEFAULT_HIDE_DELAY,
        }
    }
}

/// What the user can do on the search page.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Command {
    /// The search box now reads this text.
    Input(String),
    Submit,
    /// Pick the suggestion at this position of the visible list.
    Select(usize),
    Blur,
    Clear,
    LookupUser(Id<UserMarker>),
    LookupPost(Id<PostMarker>),
}

/// One-off answers that do not belong to the search session.
#[derive(Debug)]
pub enum Notice {
    User(Id<UserMarker>, Result<UserProfile, DirectoryError>),
    Post(Id<PostMarker>, Result<Post, DirectoryError>),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
struct HideToken(u64);

#[derive(Debug)]
enum Event {
    Command(Command),
    CandidatesLoaded(Result<Vec<UserProfile>, DirectoryError>),
    UserLookedUp {
        generation: Generation,
        username: String,
        result: Result<Option<UserProfile>, DirectoryError>,
    },
    PostsLoaded {
        generation: Generation,
        result: Result<Vec<Post>, DirectoryError>,
    },
    CommentsLoaded {
        generation: Generation,
        post_id: Id<PostMarker>,
        result: Result<Vec<Comment>, DirectoryError>,
    },
    HideElapsed(HideToken),
}

#[derive(Clone, Debug)]
pub struct CommandSender(UnboundedSender<Event>);

impl CommandSender {
    /// Returns `false` once the orchestrator has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.0.send(Event::Command(command)).is_ok()
    }
}

pub struct Spawned {
    pub commands: CommandSender,
    pub session: watch::Receiver<SearchSession>,
    pub notices: UnboundedReceiver<Notice>,
    pub task: JoinHandle<()>,
}

pub struct Orchestrator {
    directory: Arc<dyn Directory>,
    config: OrchestratorConfig,
    session: watch::Sender<SearchSession>,
    events: UnboundedSender<Event>,
    terms: UnboundedSender<String>,
    notices: UnboundedSender<Notice>,
    pending_hide: HideToken,
}

impl Orchestrator {
    /// Starts the event loop and the suggestion pipeline. Both stop when `shutdown` fires.
    pub fn spawn(
        directory: Arc<dyn Directory>,
        config: OrchestratorConfig,
        shutdown: CancellationToken,
    ) -> Spawned {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (terms_tx, terms_rx) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(SearchSession::default());

        tokio::spawn(suggest::debounce_terms(
            terms_rx,
            settled_tx,
            config.debounce,
            shutdown.clone(),
        ));

        let orchestrator = Self {
            directory,
            config,
            session: session_tx,
            events: events_tx.clone(),
            terms: terms_tx,
            notices: notices_tx,
            pending_hide: HideToken::default(),
        };
        let task = tokio::spawn(orchestrator.run(events_rx, settled_rx, shutdown));

        Spawned {
            commands: CommandSender(events_tx),
            session: session_rx,
            notices: notices_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut events: UnboundedReceiver<Event>,
        mut settled_terms: UnboundedReceiver<String>,
        shutdown: CancellationToken,
    ) {
        self.load_candidates();

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                Some(event) = events.recv() => self.handle(event),
                Some(term) = settled_terms.recv() => self.show_suggestions(&term),
            }
        }

        debug!("Search orchestrator stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.handle_command(command),
            Event::CandidatesLoaded(result) => self.candidates_loaded(result),
            Event::UserLookedUp {
                generation,
                username,
                result,
            } => self.user_looked_up(generation, username, result),
            Event::PostsLoaded { generation, result } => self.posts_loaded(generation, result),
            Event::CommentsLoaded {
                generation,
                post_id,
                result,
            } => self.comments_loaded(generation, post_id, result),
            Event::HideElapsed(token) => {
                if token == self.pending_hide {
                    self.apply(SearchSession::suggestions_hidden);
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Input(text) => self.input_changed(text),
            Command::Submit => self.submit_search(),
            Command::Select(index) => self.select_suggestion(index),
            Command::Blur => self.hide_suggestions_later(),
            Command::Clear => self.clear_search(),
            Command::LookupUser(user_id) => {
                let directory = Arc::clone(&self.directory);
                let notices = self.notices.clone();
                tokio::spawn(async move {
                    let result = directory.fetch_user(user_id).await;
                    let _ = notices.send(Notice::User(user_id, result));
                });
            }
            Command::LookupPost(post_id) => {
                let directory = Arc::clone(&self.directory);
                let notices = self.notices.clone();
                tokio::spawn(async move {
                    let result = directory.fetch_post(post_id).await;
                    let _ = notices.send(Notice::Post(post_id, result));
                });
            }
        }
    }

    fn apply(&self, transition: impl FnOnce(SearchSession) -> SearchSession) {
        let current = self.session.borrow().clone();
        self.session.send_replace(transition(current));
    }

    fn request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events.send(request.await);
        });
    }

    fn load_candidates(&self) {
        let directory = Arc::clone(&self.directory);
        self.request(async move {
            Event::CandidatesLoaded(directory.list_suggestion_candidates().await)
        });
    }

    fn candidates_loaded(&self, result: Result<Vec<UserProfile>, DirectoryError>) {
        match result {
            Ok(candidates) => {
                debug!(count = candidates.len(), "Suggestion candidates loaded");
                self.apply(|session| session.candidates_loaded(candidates));
            }
            Err(error) => warn!(%error, "Could not load suggestion candidates"),
        }
    }

    fn input_changed(&mut self, text: String) {
        let long_enough = text.chars().count() >= suggest::MIN_TERM_CHARS;
        self.apply(|session| session.with_query(text.clone()));

        if long_enough {
            let _ = self.terms.send(text);
        } else {
            self.hide_suggestions_later();
        }
    }

    fn show_suggestions(&mut self, term: &str) {
        let suggestions = suggest::filter_candidates(self.session.borrow().candidates(), term);
        debug!(%term, count = suggestions.len(), "Suggestions ready");

        if !suggestions.is_empty() {
            self.cancel_pending_hide();
        }
        self.apply(|session| session.suggestions_shown(suggestions));
    }

    fn hide_suggestions_later(&mut self) {
        self.pending_hide = HideToken(self.pending_hide.0.wrapping_add(1));

        let token = self.pending_hide;
        let delay = self.config.hide_delay;
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::HideElapsed(token));
        });
    }

    fn cancel_pending_hide(&mut self) {
        self.pending_hide = HideToken(self.pending_hide.0.wrapping_add(1));
    }

    fn select_suggestion(&mut self, index: usize) {
        let picked = {
            let session = self.session.borrow();
            if session.suggestions_visible() {
                session.suggestions().get(index).cloned()
            } else {
                None
            }
        };
        let Some(user) = picked else {
            debug!(index, "No visible suggestion at this position");
            return;
        };

        self.cancel_pending_hide();
        self.apply(|session| {
            session
                .with_query(user.username.into_inner())
                .suggestions_hidden()
        });
        self.submit_search();
    }

    fn clear_search(&mut self) {
        self.apply(SearchSession::cleared);
        self.hide_suggestions_later();
    }

    fn submit_search(&self) {
        let username = self.session.borrow().query().trim().to_owned();
        if username.is_empty() {
            debug!("Refusing to search for an empty username");
            self.apply(|session| session.rejected(&SearchError::EmptyQuery));
            return;
        }

        self.apply(SearchSession::search_started);
        let generation = self.session.borrow().generation();
        info!(%generation, %username, "Searching user");

        let directory = Arc::clone(&self.directory);
        self.request(async move {
            let result = directory.find_user_by_username(&username).await;
            Event::UserLookedUp {
                generation,
                username,
                result,
            }
        });
    }

    fn is_current(&self, generation: Generation) -> bool {
        let current = self.session.borrow().generation();
        if generation != current {
            debug!(%generation, %current, "Dropping answer for an abandoned search");
        }
        generation == current
    }

    fn user_looked_up(
        &self,
        generation: Generation,
        username: String,
        result: Result<Option<UserProfile>, DirectoryError>,
    ) {
        if !self.is_current(generation) {
            return;
        }

        match result {
            Ok(None) => {
                info!(error = %SearchError::UserNotFound(username), "Search finished");
                self.apply(|session| session.user_not_found_for(generation));
            }
            Ok(Some(user)) => {
                let user_id = user.id;
                info!(%user_id, "User found, loading posts");
                self.apply(|session| session.user_found(generation, user));

                let directory = Arc::clone(&self.directory);
                self.request(async move {
                    let result = directory.list_posts_for_user(user_id).await;
                    Event::PostsLoaded { generation, result }
                });
            }
            Err(error) => self.fail(generation, error),
        }
    }

    fn posts_loaded(&self, generation: Generation, result: Result<Vec<Post>, DirectoryError>) {
        if !self.is_current(generation) {
            return;
        }

        let posts = match result {
            Ok(posts) => posts,
            Err(error) => return self.fail(generation, error),
        };

        info!(count = posts.len(), "Posts loaded, fetching comments");
        let post_ids: Vec<Id<PostMarker>> = posts.iter().map(|post| post.id).collect();
        self.apply(|session| session.posts_loaded(generation, posts));

        for post_id in post_ids {
            let directory = Arc::clone(&self.directory);
            self.request(async move {
                let result = directory.list_comments_for_post(post_id).await;
                Event::CommentsLoaded {
                    generation,
                    post_id,
                    result,
                }
            });
        }
    }

    fn comments_loaded(
        &self,
        generation: Generation,
        post_id: Id<PostMarker>,
        result: Result<Vec<Comment>, DirectoryError>,
    ) {
        if !self.is_current(generation) {
            return;
        }

        let comments = result.unwrap_or_else(|error| {
            warn!(%post_id, %error, "Could not load comments, showing none");
            Vec::new()
        });
        self.apply(|session| session.comments_loaded(generation, post_id, comments));
    }

    fn fail(&self, generation: Generation, error: DirectoryError) {
        warn!(%generation, %error, "Search failed");
        let error = SearchError::Lookup(error);
        self.apply(|session| session.search_failed(generation, &error));
    }
}
