//! Line-based front end: reads commands from stdin and prints the session whenever it changes.

use crate::orchestrator::{Command, Notice, Spawned};
use crate::session::{SearchPhase, SearchSession};
use profilescope_common::{
    model::{Id, post::Post, user::UserProfile},
    present::{
        profile::{DateLocale, age_from_birth_date, format_birth_date},
        timeline::{abbreviate_number, comments_for, is_popular, like_percentage, total_reactions},
    },
};
use std::{fmt::Write as _, num::ParseIntError};
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    sync::mpsc::{self, UnboundedReceiver},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const HELP: &str = "\
commands:
  type <text>     edit the search box
  search [text]   search for the username in the box (or for <text>)
  pick <n>        choose suggestion number <n>
  blur            leave the search box
  clear           reset the page
  user <id>       look up a user by id
  post <id>       look up a post by id
  help            show this text
  quit            leave
";

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Action {
    Send(Vec<Command>),
    Help,
    Quit,
    Nothing,
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ParseLineError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("Not a number: {0}")]
    InvalidNumber(#[from] ParseIntError),
    #[error("Suggestions are numbered from 1")]
    ZeroSuggestion,
}

pub fn parse_line(line: &str) -> Result<Action, ParseLineError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (word, rest) = match line.trim_start().split_once(' ') {
        Some((word, rest)) => (word, Some(rest)),
        None => (line.trim(), None),
    };

    let argument = |name: &'static str| {
        rest.map(str::trim)
            .filter(|rest| !rest.is_empty())
            .ok_or(ParseLineError::MissingArgument(name))
    };

    let action = match word {
        "" => Action::Nothing,
        "type" => Action::Send(vec![Command::Input(rest.unwrap_or_default().to_owned())]),
        "search" => match rest {
            Some(text) => Action::Send(vec![Command::Input(text.to_owned()), Command::Submit]),
            None => Action::Send(vec![Command::Submit]),
        },
        "pick" => {
            let position: usize = argument("pick")?.parse()?;
            let index = position.checked_sub(1).ok_or(ParseLineError::ZeroSuggestion)?;
            Action::Send(vec![Command::Select(index)])
        }
        "blur" => Action::Send(vec![Command::Blur]),
        "clear" => Action::Send(vec![Command::Clear]),
        "user" => Action::Send(vec![Command::LookupUser(Id::new(
            argument("user")?.parse()?,
        ))]),
        "post" => Action::Send(vec![Command::LookupPost(Id::new(
            argument("post")?.parse()?,
        ))]),
        "help" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => return Err(ParseLineError::UnknownCommand(other.to_owned())),
    };

    Ok(action)
}

fn render_profile(out: &mut String, user: &UserProfile, locale: DateLocale) {
    let _ = writeln!(out, "== {} (@{}) ==", user.full_name(), user.username);
    let _ = writeln!(out, "email: {}", user.email);
    if let Some(phone) = &user.phone {
        let _ = writeln!(out, "phone: {phone}");
    }

    let age = user
        .birth_date
        .map(age_from_birth_date)
        .or_else(|| user.age.and_then(|age| i32::try_from(age).ok()));
    if let Some(age) = age {
        let _ = writeln!(out, "age: {age}");
    }
    if let Some(birth_date) = user.birth_date {
        let _ = writeln!(out, "born: {}", format_birth_date(birth_date, locale));
    }
    let _ = writeln!(out, "avatar: {}", user.image);
}

fn render_post(out: &mut String, post: &Post, session: &SearchSession) {
    let popular = if is_popular(post) { "  [popular]" } else { "" };
    let _ = writeln!(out, "[{}] {}{popular}", post.id, post.title);
    if !post.tags.is_empty() {
        let _ = writeln!(out, "  tags: {}", post.tags.join(", "));
    }
    let _ = writeln!(
        out,
        "  {} views, {} reactions, {}% likes",
        abbreviate_number(post.views),
        abbreviate_number(total_reactions(post)),
        like_percentage(post)
    );
    let _ = writeln!(out, "  {}", post.body);

    if !session.comments().contains_key(&post.id) {
        let _ = writeln!(out, "  comments: loading");
        return;
    }

    let comments = comments_for(session.comments(), post.id);
    let _ = writeln!(out, "  comments ({}):", comments.len());
    for comment in comments {
        let _ = writeln!(
            out,
            "    - {}: {} ({} likes)",
            comment.user.username,
            comment.body,
            abbreviate_number(comment.likes)
        );
    }
}

#[must_use]
pub fn render_session(session: &SearchSession, locale: DateLocale) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "search: {}", session.query());

    if session.suggestions_visible() {
        let _ = writeln!(out, "suggestions:");
        for (position, user) in session.suggestions().iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({})",
                position + 1,
                user.username,
                user.full_name()
            );
        }
    }

    match session.phase() {
        SearchPhase::Idle | SearchPhase::Found => {}
        SearchPhase::Searching => {
            let _ = writeln!(out, "loading...");
        }
        SearchPhase::NotFound => {
            let _ = writeln!(out, "no user named \"{}\"", session.searched_for());
        }
        SearchPhase::Failed => {
            let _ = writeln!(out, "error: {}", session.error());
        }
    }

    if let Some(user) = session.user() {
        render_profile(&mut out, user, locale);
    }

    if !session.loading() && session.user().is_some() {
        let _ = writeln!(out, "-- posts ({}) --", session.posts().len());
        for post in session.posts() {
            render_post(&mut out, post, session);
        }
    }

    out
}

#[must_use]
pub fn render_notice(notice: &Notice, locale: DateLocale) -> String {
    let mut out = String::new();
    match notice {
        Notice::User(_, Ok(user)) => render_profile(&mut out, user, locale),
        Notice::User(user_id, Err(error)) => {
            let _ = writeln!(out, "user {user_id}: {error}");
        }
        Notice::Post(_, Ok(post)) => {
            let _ = writeln!(out, "[{}] {} by user {}", post.id, post.title, post.user_id);
            let _ = writeln!(out, "  {}", post.body);
        }
        Notice::Post(post_id, Err(error)) => {
            let _ = writeln!(out, "post {post_id}: {error}");
        }
    }
    out
}

// Blocking stdin reads would keep the runtime from shutting down, so they get their own thread.
fn spawn_line_reader() -> UnboundedReceiver<std::io::Result<String>> {
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });
    lines_rx
}

/// Drives the orchestrator from stdin until `quit`, end of input, or `shutdown`.
pub async fn run(
    spawned: &mut Spawned,
    locale: DateLocale,
    shutdown: &CancellationToken,
) -> std::io::Result<()> {
    let mut lines = spawn_line_reader();
    let mut stdout = tokio::io::stdout();
    let mut last_frame = String::new();

    stdout.write_all(HELP.as_bytes()).await?;
    stdout.flush().await?;

    loop {
        let output = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.recv() => {
                let Some(line) = line else { break };
                let line = line?;
                match parse_line(&line) {
                    Ok(Action::Send(commands)) => {
                        if !commands.into_iter().all(|command| spawned.commands.send(command)) {
                            break;
                        }
                        continue;
                    }
                    Ok(Action::Help) => HELP.to_owned(),
                    Ok(Action::Quit) => break,
                    Ok(Action::Nothing) => continue,
                    Err(error) => format!("{error}\n"),
                }
            }
            changed = spawned.session.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = render_session(&spawned.session.borrow_and_update(), locale);
                if frame == last_frame {
                    continue;
                }
                last_frame.clone_from(&frame);
                frame
            }
            Some(notice) = spawned.notices.recv() => render_notice(&notice, locale),
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    debug!("Terminal closed");
    shutdown.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::orchestrator::{Command, Notice};
    use crate::session::SearchSession;
    use crate::terminal::{Action, ParseLineError, parse_line, render_notice, render_session};
    use profilescope_client::{DirectoryError, StatusCode};
    use profilescope_common::{
        model::{
            Id,
            comment::{Comment, Commenter},
            post::{Post, Reactions},
            user::{BirthDate, UserProfile, Username},
        },
        present::profile::DateLocale,
    };
    use time::macros::date;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_line("type al"),
            Ok(Action::Send(vec![Command::Input("al".into())]))
        );
        assert_eq!(
            parse_line("type"),
            Ok(Action::Send(vec![Command::Input(String::new())]))
        );
        assert_eq!(
            parse_line("search emilys"),
            Ok(Action::Send(vec![
                Command::Input("emilys".into()),
                Command::Submit
            ]))
        );
        assert_eq!(parse_line("search"), Ok(Action::Send(vec![Command::Submit])));
        assert_eq!(
            parse_line("pick 2"),
            Ok(Action::Send(vec![Command::Select(1)]))
        );
        assert_eq!(
            parse_line("user 5\n"),
            Ok(Action::Send(vec![Command::LookupUser(Id::new(5))]))
        );
        assert_eq!(
            parse_line("post 101"),
            Ok(Action::Send(vec![Command::LookupPost(Id::new(101))]))
        );
        assert_eq!(parse_line("clear"), Ok(Action::Send(vec![Command::Clear])));
        assert_eq!(parse_line("blur"), Ok(Action::Send(vec![Command::Blur])));
        assert_eq!(parse_line("  "), Ok(Action::Nothing));
        assert_eq!(parse_line("help"), Ok(Action::Help));
        assert_eq!(parse_line("quit"), Ok(Action::Quit));
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(
            parse_line("dance"),
            Err(ParseLineError::UnknownCommand("dance".into()))
        );
        assert_eq!(parse_line("pick"), Err(ParseLineError::MissingArgument("pick")));
        assert_eq!(parse_line("pick 0"), Err(ParseLineError::ZeroSuggestion));
        assert!(matches!(
            parse_line("user five"),
            Err(ParseLineError::InvalidNumber(_))
        ));
    }

    fn emily() -> UserProfile {
        UserProfile {
            id: Id::new(1),
            username: Username::new("emilys".into()).unwrap(),
            first_name: "Emily".into(),
            last_name: "Johnson".into(),
            email: "emily.johnson@x.dummyjson.com".into(),
            image: "https://dummyjson.com/icon/emilys/128".into(),
            age: Some(28),
            phone: Some("+81 965-431-3024".into()),
            birth_date: Some(BirthDate::new(date!(1996 - 05 - 30))),
        }
    }

    fn popular_post() -> Post {
        Post {
            id: Id::new(101),
            user_id: Id::new(1),
            title: "Hello".into(),
            body: "World".into(),
            tags: vec!["history".into(), "crime".into()],
            reactions: Reactions {
                likes: 150,
                dislikes: 50,
            },
            views: 1_500,
        }
    }

    #[test]
    fn renders_found_profile_with_posts() {
        let session = SearchSession::default()
            .with_query("emilys".into())
            .search_started();
        let generation = session.generation();
        let session = session
            .user_found(generation, emily())
            .posts_loaded(generation, vec![popular_post()]);

        let frame = render_session(&session, DateLocale::Spanish);
        assert!(frame.contains("== Emily Johnson (@emilys) =="));
        assert!(frame.contains("born: 30 de mayo de 1996"));
        assert!(frame.contains("[101] Hello  [popular]"));
        assert!(frame.contains("tags: history, crime"));
        assert!(frame.contains("1K views, 200 reactions, 75% likes"));
        assert!(frame.contains("comments: loading"));

        let session = session.comments_loaded(
            generation,
            Id::new(101),
            vec![Comment {
                id: Id::new(1),
                post_id: Id::new(101),
                body: "Nice".into(),
                likes: 3,
                user: Commenter {
                    id: Id::new(9),
                    username: Username::new("bob".into()).unwrap(),
                    full_name: "Bob Stone".into(),
                },
            }],
        );
        let frame = render_session(&session, DateLocale::English);
        assert!(frame.contains("born: May 30, 1996"));
        assert!(frame.contains("comments (1):"));
        assert!(frame.contains("- bob: Nice (3 likes)"));
    }

    #[test]
    fn renders_transient_states() {
        let searching = SearchSession::default()
            .with_query("x".into())
            .search_started();
        assert!(render_session(&searching, DateLocale::Spanish).contains("loading..."));

        let generation = searching.generation();
        let not_found = searching.user_not_found_for(generation);
        assert!(render_session(&not_found, DateLocale::Spanish).contains("no user named \"x\""));

        let retyped = render_session(&not_found.with_query("xyz".into()), DateLocale::Spanish);
        assert!(retyped.contains("search: xyz"));
        assert!(retyped.contains("no user named \"x\""));

        let suggested = SearchSession::default().suggestions_shown(vec![emily()]);
        let frame = render_session(&suggested, DateLocale::Spanish);
        assert!(frame.contains("suggestions:"));
        assert!(frame.contains("1. emilys (Emily Johnson)"));
    }

    #[test]
    fn renders_notices() {
        let failed = Notice::User(
            Id::new(404),
            Err(DirectoryError::Status {
                status: StatusCode::NOT_FOUND,
                url: "https://dummyjson.com/users/404".into(),
            }),
        );
        assert!(render_notice(&failed, DateLocale::English).starts_with("user 404: "));

        let post = Notice::Post(Id::new(101), Ok(popular_post()));
        assert!(render_notice(&post, DateLocale::English).contains("[101] Hello by user 1"));
    }
}
