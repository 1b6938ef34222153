use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use raydio_core::{
    bootstrap::load_config,
    logging,
    memory::{InMemorySdk, RecordingNotifier},
    models::{BroadcasterId, Language, Livestream, StreamId, UserId},
    platform::ControlIntent,
};
use raydio_livestream::{LivestreamListModel, Screen, ScreenRouter, Session, SessionHost};

#[derive(Parser, Debug)]
#[command(name = "raydio")]
#[command(about = "Raydio livestream player against an in-memory SDK", long_about = None)]
struct Args {
    /// Config file (YAML/TOML/JSON)
    #[arg(long, env = "RAYDIO_CONFIG_PATH")]
    config: Option<String>,

    /// Index of the livestream to play, across all groups
    #[arg(long, default_value = "0")]
    livestream_index: usize,

    /// Listener id used by the SDK
    #[arg(long, env = "RAYDIO_USER_ID", default_value = "listener")]
    user_id: String,

    /// Keep playing until Ctrl+C instead of running the recovery walkthrough
    #[arg(long)]
    hold: bool,
}

fn livestream(id: &str, broadcaster: &str, title: &str, language: Language) -> Livestream {
    Livestream {
        id: StreamId::from(id),
        broadcaster_id: BroadcasterId::from(broadcaster),
        title: title.to_string(),
        language,
        started_at: Utc::now(),
    }
}

fn seed_catalogue(sdk: &InMemorySdk) {
    sdk.catalogue.set_remote(vec![
        livestream("final-de", "kommentator-1", "Final", Language::new("de", "Deutsch")),
        livestream("final-en", "commentator-2", "Final", Language::new("en", "English")),
        livestream("semi-fr", "commentateur-3", "Semi-final", Language::new("fr", "Français")),
    ]);
}

/// Walk the session through every recovery path, then stop it the way the
/// notification button does.
async fn walkthrough(sdk: &InMemorySdk, host: &SessionHost, session: &Session, package: &str) {
    let livestream = sdk
        .catalogue
        .loaded()
        .into_iter()
        .find(|l| &l.broadcaster_id == session.broadcaster_id());

    tokio::time::sleep(Duration::from_secs(3)).await;

    info!("Dropping the client connection, first two reconnects fail");
    sdk.connection.script_reconnect([false, false]);
    sdk.connection.drop_connection();
    tokio::time::sleep(Duration::from_secs(6)).await;
    info!(phase = ?session.phase(), "After client recovery");

    if let Some(livestream) = livestream {
        info!("Broadcaster drops out for three seconds");
        sdk.catalogue.end(&livestream.broadcaster_id);
        tokio::time::sleep(Duration::from_secs(3)).await;
        sdk.catalogue.go_live(livestream);
        tokio::time::sleep(Duration::from_secs(3)).await;
        info!(phase = ?session.phase(), diagnostics = ?session.diagnostics(), "After streamer recovery");
    }

    info!("Sending stop listen intent");
    host.control_bus().send(ControlIntent::stop_listen(package));
    session.terminated().await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!(club_id = config.sdk.club_id, "Raydio player starting...");

    // 3. Build the SDK
    let sdk = InMemorySdk::builder(UserId::from(args.user_id.as_str()))
        .connect_delay(Duration::from_millis(500))
        .build();
    seed_catalogue(&sdk);
    let raydio = sdk.sdk();

    // 4. Session host, screens
    let notifier = Arc::new(RecordingNotifier::new());
    let host = Arc::new(SessionHost::new(raydio.clone(), notifier, &config));
    let router = ScreenRouter::new(Arc::clone(&raydio.connection));

    router
        .subscribe()
        .wait_for(|screen| *screen == Some(Screen::Livestreams))
        .await?;
    info!("Connected, loading livestreams");

    let list = LivestreamListModel::new(&raydio, Arc::clone(&host));
    let ui = list
        .subscribe()
        .wait_for(|state| !state.is_loading && !state.groups.is_empty())
        .await?
        .clone();

    for group in &ui.groups {
        let languages: Vec<_> = group
            .livestreams
            .iter()
            .map(|l| l.language.native.as_str())
            .collect();
        info!(title = %group.title, ?languages, "Livestream group");
    }

    // 5. Pick a livestream like a user would: group first, then language
    let (group, selected) = ui.livestream_at(args.livestream_index)?;

    list.on_group_clicked(group).await;
    let session = list.on_livestream_clicked(selected).await?;
    list.on_bottom_sheet_dismissed();
    info!(session_id = %session.id(), stream_id = %selected.id, "Playing");

    let mut play_states = host.play_state().subscribe();
    tokio::spawn(async move {
        while play_states.changed().await.is_ok() {
            let play_state = play_states.borrow_and_update().clone();
            info!(?play_state, "Play state");
        }
    });

    // 6. Run until the session ends or Ctrl+C
    let package = config.notifications.package_name.clone();
    tokio::select! {
        () = async {
            if args.hold {
                session.terminated().await;
            } else {
                walkthrough(&sdk, &host, &session, &package).await;
            }
        } => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, stopping playback");
            host.stop().await;
        }
    }

    session.join().await;
    info!(end_reason = ?session.end_reason(), "Playback session ended");
    Ok(())
}
