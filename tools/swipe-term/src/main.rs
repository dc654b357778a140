use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use swipe_client::api::{ApiClient, Backend};
use swipe_client::chat::{ChannelStatus, ConversationRuntime, WsConnector};
use swipe_client::feed::{FeedEvent, FeedRuntime, FeedSettings, FeedStatus, Notice};
use swipe_client::session::{redirect_for, Route, Session};
use swipe_client::{ClientConfig, ClientError};
use swipe_common::message::Direction;
use swipe_common::profile::ProfilePatch;
use swipe_common::request::ReviewStatus;
use swipe_common::{Decision, ProfileCandidate, UserId};

/// Horizontal drag used by the `l` / `h` shortcuts.
const DRAG_DISTANCE: f64 = 150.0;

#[derive(Parser)]
#[command(name = "swipe-term", about = "Browse the discovery feed and chat from a terminal")]
struct Cli {
    /// Backend base URL (default: http://localhost:3000).
    #[arg(long, env = "SWIPE_BASE_URL")]
    base_url: Option<String>,

    /// Log in with this email before running the command.
    #[arg(long, env = "SWIPE_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "SWIPE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Candidates per feed page.
    #[arg(long)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Swipe through the feed: l / h drag, like / pass, r refresh, q quit.
    Feed,
    /// Chat with a connection. Each line is sent; /quit leaves.
    Chat { target: String },
    /// List accepted connections.
    Connections,
    /// List pending incoming requests.
    Requests,
    /// Accept or reject a pending request.
    Review {
        status: ReviewStatus,
        request_id: String,
    },
    /// Show the signed-in profile, or update it when any field is given.
    Profile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        about: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
        #[arg(long)]
        age: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swipe_client=info,swipe_term=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.base_url {
        Some(url) => ClientConfig::new(url)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(size) = cli.page_size {
        config = config.with_page_size(size);
    }
    tracing::debug!(base_url = %config.base_url, "using backend");

    let api = ApiClient::new(config).context("building HTTP client")?;
    let session = Session::new(api);

    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => {
            session.login(email, password).await.context("login failed")?;
        }
        _ => {
            session
                .load_profile()
                .await
                .context("not signed in; pass --email and --password")?;
        }
    }

    let result = match cli.command {
        Command::Feed => run_feed(&session).await,
        Command::Chat { target } => run_chat(&session, UserId::new(target)).await,
        Command::Connections => {
            for profile in session.api().connections().await? {
                println!("{}  {}", profile.id, describe(&profile));
            }
            Ok(())
        }
        Command::Requests => {
            for request in session.api().requests().await? {
                println!("{}  from {}", request.id, describe(&request.from_user_id));
            }
            Ok(())
        }
        Command::Review { status, request_id } => {
            session.api().review_request(status, &request_id).await?;
            println!("request {request_id} {status}");
            Ok(())
        }
        Command::Profile {
            first_name,
            last_name,
            about,
            photo_url,
            age,
        } => {
            let patch = ProfilePatch {
                first_name,
                last_name,
                about,
                photo_url,
                age,
                ..Default::default()
            };
            let user = if patch == ProfilePatch::default() {
                session.load_profile().await?
            } else {
                session.edit_profile(&patch).await?
            };
            println!("{} {} <{}>", user.first_name, user.last_name, user.email_id.unwrap_or_default());
            if let Some(about) = user.about {
                println!("{about}");
            }
            Ok(())
        }
    };

    if let Err(e) = &result {
        if let Some(client_err) = e.downcast_ref::<ClientError>() {
            if redirect_for(client_err, &Route::Feed) == Some(Route::Login) {
                eprintln!("session expired; log in again with --email / --password");
            }
        }
    }
    result
}

async fn run_feed(session: &Session) -> Result<()> {
    let api = session.api().clone();
    let settings = FeedSettings::from(api.config());
    let backend: Arc<dyn Backend> = Arc::new(api);
    let mut feed = FeedRuntime::new(backend, settings);
    let mut session_events = session.subscribe();

    feed.dispatch(FeedEvent::Mount);
    feed.settle().await;
    render_feed(&mut feed)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "q" => break,
                    "l" => drag(&mut feed, DRAG_DISTANCE),
                    "h" => drag(&mut feed, -DRAG_DISTANCE),
                    "like" => feed.dispatch(FeedEvent::Choose(Decision::Interested)),
                    "pass" => feed.dispatch(FeedEvent::Choose(Decision::Ignore)),
                    "r" => feed.dispatch(FeedEvent::Refresh),
                    "" => {}
                    other => eprintln!("unknown command {other:?}"),
                }
                render_feed(&mut feed)?;
            }
            applied = feed.next_completion(), if feed.has_pending() => {
                if applied {
                    render_feed(&mut feed)?;
                }
            }
            Ok(event) = session_events.recv() => feed.on_session_event(&event),
        }
    }
    Ok(())
}

fn drag(feed: &mut FeedRuntime, dx: f64) {
    feed.dispatch(FeedEvent::PointerDown { x: 0.0 });
    feed.dispatch(FeedEvent::PointerMove { x: dx });
    feed.dispatch(FeedEvent::PointerUp);
}

fn render_feed(feed: &mut FeedRuntime) -> Result<()> {
    for notice in feed.drain_notices() {
        match notice {
            Notice::DecisionFailed { message, .. } => eprintln!("! {message}"),
            Notice::AuthRequired => bail!(ClientError::AuthRequired),
        }
    }
    let c = feed.controller();
    match c.status() {
        FeedStatus::Loading => println!("loading..."),
        FeedStatus::AwaitingMore { .. } => println!("loading more profiles..."),
        FeedStatus::Exhausted => println!("no more profiles. r to refresh, q to quit"),
        FeedStatus::Active { .. } => {
            let (position, total) = c.progress();
            if let Some(profile) = c.current() {
                println!("[{position}/{total}] {}", describe(profile));
                if let Some(about) = &profile.about {
                    println!("    {about}");
                }
            }
            if let Some(next) = c.peek_next() {
                println!("    next up: {}", next.display_name());
            }
        }
    }
    Ok(())
}

async fn run_chat(session: &Session, target: UserId) -> Result<()> {
    let api = session.api().clone();
    let backend: Arc<dyn Backend> = Arc::new(api.clone());
    let mut chat = ConversationRuntime::new(backend, Arc::new(WsConnector::new(api)));
    let mut session_events = session.subscribe();
    chat.open(target.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = ChatView::default();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/quit" {
                    break;
                }
                chat.send(line)?;
            }
            _ = chat.next_event() => {
                view.render(&chat, &target);
                if chat.status() == ChannelStatus::Closed {
                    if let Some(e) = chat.controller().last_error() {
                        bail!("conversation closed: {e}");
                    }
                    break;
                }
            }
            Ok(event) = session_events.recv() => chat.on_session_event(&event),
        }
    }
    chat.close();
    Ok(())
}

/// What has already been printed for the conversation.
#[derive(Default)]
struct ChatView {
    status: Option<ChannelStatus>,
    history_shown: bool,
    shown: usize,
}

impl ChatView {
    fn render(&mut self, chat: &ConversationRuntime, target: &UserId) {
        let c = chat.controller();
        if self.status != Some(c.status()) {
            self.status = Some(c.status());
            eprintln!("[{:?}]", c.status());
        }
        // History lands in front of anything already shown; print the lot again.
        if c.history_loaded() && !self.history_shown {
            self.history_shown = true;
            self.shown = 0;
        }
        for message in &c.messages()[self.shown.min(c.messages().len())..] {
            match message.direction(target) {
                Direction::Incoming => println!("{target}> {}", message.text),
                Direction::Outgoing => println!("me> {}", message.text),
            }
        }
        self.shown = c.messages().len();
    }
}

fn describe(profile: &ProfileCandidate) -> String {
    let mut out = profile.display_name();
    if let Some(age) = profile.age {
        out.push_str(&format!(", {age}"));
    }
    if let Some(gender) = &profile.gender {
        out.push_str(&format!(", {gender}"));
    }
    out
}
