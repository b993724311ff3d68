//! Autocomplete: a debounced stream of search terms and the local filter it feeds.

use profilescope_common::model::user::UserProfile;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub const MAX_SUGGESTIONS: usize = 5;
pub const MIN_TERM_CHARS: usize = 2;

/// Profiles whose username, first name or last name contain `term`, ignoring case.
#[must_use]
pub fn filter_candidates(candidates: &[UserProfile], term: &str) -> Vec<UserProfile> {
    let term = term.to_lowercase();

    candidates
        .iter()
        .filter(|user| {
            user.username.get().to_lowercase().contains(&term)
                || user.first_name.to_lowercase().contains(&term)
                || user.last_name.to_lowercase().contains(&term)
        })
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Forwards a term from `terms` once no newer term arrived for `quiet`.
///
/// A settled term equal to the previously settled one is swallowed, as are terms shorter than
/// [`MIN_TERM_CHARS`].
pub async fn debounce_terms(
    mut terms: UnboundedReceiver<String>,
    settled: UnboundedSender<String>,
    quiet: Duration,
    shutdown: CancellationToken,
) {
    let mut previous: Option<String> = None;

    loop {
        let mut term = tokio::select! {
            () = shutdown.cancelled() => return,
            term = terms.recv() => match term {
                Some(term) => term,
                None => return,
            },
        };

        loop {
            tokio::select! {
                () = shutdown.cancelled() => return,
                newer = terms.recv() => match newer {
                    Some(newer) => term = newer,
                    None => return,
                },
                () = tokio::time::sleep(quiet) => break,
            }
        }

        if previous.as_deref() == Some(term.as_str()) {
            trace!(%term, "Term unchanged since last suggestion");
            continue;
        }
        previous = Some(term.clone());

        if term.chars().count() < MIN_TERM_CHARS {
            continue;
        }

        if settled.send(term).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::orchestrator::suggest::{debounce_terms, filter_candidates};
    use profilescope_common::model::{
        Id,
        user::{UserProfile, Username},
    };
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn candidate(id: u64, username: &str, first_name: &str, last_name: &str) -> UserProfile {
        UserProfile {
            id: Id::new(id),
            username: Username::new(username.into()).unwrap(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..UserProfile::default()
        }
    }

    #[test]
    fn matches_any_name_ignoring_case() {
        let pool = [
            candidate(1, "bret", "Leanne", "Graham"),
            candidate(2, "anne", "Ervin", "Howell"),
            candidate(3, "samantha", "Bob", "Smith"),
        ];

        let matches = filter_candidates(&pool, "b");
        let usernames: Vec<&str> = matches.iter().map(|user| user.username.get()).collect();
        assert_eq!(usernames, ["bret", "samantha"]);

        let matches = filter_candidates(&pool, "B");
        let ids: Vec<u64> = matches.iter().map(|user| user.id.get()).collect();
        assert_eq!(ids, [1, 3]);

        let matches = filter_candidates(&pool, "HOW");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].username.get(), "anne");
    }

    #[test]
    fn caps_at_five() {
        let pool: Vec<UserProfile> = (1..=8)
            .map(|id| candidate(id, &format!("bob{id}"), "x", "y"))
            .collect();

        let matches = filter_candidates(&pool, "bob");
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[0].id, Id::new(1));
        assert_eq!(matches[4].id, Id::new(5));
    }

    #[test]
    fn no_match_is_empty() {
        let pool = [candidate(1, "bret", "Leanne", "Graham")];
        assert!(filter_candidates(&pool, "zz").is_empty());
        assert!(filter_candidates(&[], "br").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_settled_distinct_terms_pass() {
        let (terms_tx, terms_rx) = mpsc::unbounded_channel();
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let quiet = Duration::from_millis(300);

        tokio::spawn(debounce_terms(
            terms_rx,
            settled_tx,
            quiet,
            shutdown.clone(),
        ));

        // Typed in quick succession: only the last one survives.
        terms_tx.send("al".to_owned()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        terms_tx.send("ali".to_owned()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        terms_tx.send("alic".to_owned()).unwrap();

        assert_eq!(settled_rx.recv().await.unwrap(), "alic");

        // Same term again after settling is swallowed, a new one passes.
        terms_tx.send("alic".to_owned()).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        terms_tx.send("x".to_owned()).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        terms_tx.send("bo".to_owned()).unwrap();

        assert_eq!(settled_rx.recv().await.unwrap(), "bo");
        assert!(settled_rx.try_recv().is_err());

        shutdown.cancel();
        assert!(settled_rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn term_is_held_back_during_quiet_window() {
        let (terms_tx, terms_rx) = mpsc::unbounded_channel();
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();

        tokio::spawn(debounce_terms(
            terms_rx,
            settled_tx,
            Duration::from_millis(300),
            CancellationToken::new(),
        ));

        terms_tx.send("bret".to_owned()).unwrap();
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(settled_rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(settled_rx.recv().await.unwrap(), "bret");
    }
}
