use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use deskbell_core::{
    CoreConfig, EventBus, EventFeedClient, FileStorage, FrappeClient, NotificationApi, NotificationSync, RodioPlayer,
    SilentPlayer, SoundControl, SoundPlayer, SyncOptions,
};
use serde_json::json;

use super::render::{render_snapshot, to_json, OutputFormat};

/// Long enough for the cue to finish before the process exits
const TEST_SOUND_LINGER: Duration = Duration::from_millis(1500);

/// A parsed command, independent of the argument parser
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Fetch and print the notification list
    List { options: SyncOptions },
    /// Print only the unread count
    Unread { options: SyncOptions },
    /// Mark one notification read
    MarkRead { id: String, options: SyncOptions },
    /// Mark every notification read
    MarkAllRead { options: SyncOptions },
    /// Stay mounted and reprint on every change
    Watch {
        options: SyncOptions,
        feed_addr: Option<String>,
    },
    Mute,
    Unmute,
    ToggleMute,
    TestSound,
}

/// Load config from `explicit`, else the default path if it exists, else defaults.
/// `DESKBELL_*` environment variables are applied last.
pub fn resolve_config(explicit: Option<&Path>) -> Result<CoreConfig> {
    let mut config = match explicit {
        Some(path) => CoreConfig::load(path)?,
        None => match CoreConfig::default_path().filter(|p| p.exists()) {
            Some(path) => CoreConfig::load(&path)?,
            None => CoreConfig::default(),
        },
    };
    config.apply_env();
    Ok(config)
}

/// Mute state persisted under the data dir; silent if no usable sound file
pub fn build_sound(config: &CoreConfig) -> SoundControl {
    let storage = Arc::new(FileStorage::new(&config.data_dir));

    let player: Arc<dyn SoundPlayer> = match &config.sound_file {
        Some(path) => match RodioPlayer::new(path) {
            Ok(player) => Arc::new(player),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Sound unavailable, continuing silently");
                Arc::new(SilentPlayer)
            }
        },
        None => Arc::new(SilentPlayer),
    };

    SoundControl::new(storage, player)
}

fn is_sound_command(command: &CliCommand) -> bool {
    matches!(
        command,
        CliCommand::Mute | CliCommand::Unmute | CliCommand::ToggleMute | CliCommand::TestSound
    )
}

fn mute_output(muted: bool, format: OutputFormat) -> Result<String> {
    if format.is_json() {
        return to_json(&json!({ "muted": muted }), format);
    }
    Ok(if muted { "Notification sound muted" } else { "Notification sound unmuted" }.to_string())
}

/// Commands that only touch the local mute flag and player
async fn sound_command(command: &CliCommand, sound: &SoundControl, format: OutputFormat) -> Result<String> {
    match command {
        CliCommand::Mute => {
            sound.set_mute(true);
            mute_output(true, format)
        }
        CliCommand::Unmute => {
            sound.set_mute(false);
            mute_output(false, format)
        }
        CliCommand::ToggleMute => mute_output(sound.toggle_mute(), format),
        CliCommand::TestSound if sound.is_muted() => {
            if format.is_json() {
                to_json(&json!({ "played": false, "muted": true }), format)
            } else {
                Ok("Notification sound is muted, not played".to_string())
            }
        }
        CliCommand::TestSound => {
            sound.test_sound();
            tokio::time::sleep(TEST_SOUND_LINGER).await;
            if format.is_json() {
                to_json(&json!({ "played": true, "muted": false }), format)
            } else {
                Ok("Played test sound".to_string())
            }
        }
        other => bail!("{:?} is not a sound command", other),
    }
}

async fn mounted(
    options: SyncOptions,
    api: &Arc<dyn NotificationApi>,
    sound: &SoundControl,
    events: &EventBus,
) -> NotificationSync {
    NotificationSync::mount(options, api.clone(), sound.clone(), events).await
}

/// Run a one-shot command and return what should be printed.
///
/// `Watch` is long-running and handled by [`watch`].
pub async fn execute(
    command: CliCommand,
    api: Arc<dyn NotificationApi>,
    sound: SoundControl,
    format: OutputFormat,
) -> Result<String> {
    let events = EventBus::new();

    let output = match command {
        CliCommand::List { options } => {
            let sync = mounted(options, &api, &sound, &events).await;
            let snapshot = sync.snapshot();
            sync.teardown();
            if format.is_json() {
                to_json(&snapshot, format)?
            } else {
                render_snapshot(&snapshot)
            }
        }
        CliCommand::Unread { options } => {
            let sync = mounted(options, &api, &sound, &events).await;
            let snapshot = sync.snapshot();
            sync.teardown();
            if let Some(error) = snapshot.error {
                bail!("Failed to fetch notifications: {}", error);
            }
            if format.is_json() {
                to_json(&json!({ "unread": snapshot.unread_count }), format)?
            } else {
                snapshot.unread_count.to_string()
            }
        }
        CliCommand::MarkRead { id, options } => {
            let sync = mounted(options, &api, &sound, &events).await;
            let written = sync.mark_as_read(&id).await;
            let snapshot = sync.snapshot();
            sync.teardown();

            written.with_context(|| format!("Failed to mark {} as read", id))?;
            if format.is_json() {
                to_json(&json!({ "id": id, "read": true, "unread": snapshot.unread_count }), format)?
            } else {
                format!("Marked {} as read ({} unread)", id, snapshot.unread_count)
            }
        }
        CliCommand::MarkAllRead { options } => {
            let sync = mounted(options, &api, &sound, &events).await;
            let written = sync.mark_all_as_read().await;
            let snapshot = sync.snapshot();
            sync.teardown();

            written.context("Failed to mark all notifications as read")?;
            if format.is_json() {
                to_json(&json!({ "unread": snapshot.unread_count }), format)?
            } else {
                "Marked all notifications as read".to_string()
            }
        }
        CliCommand::Mute | CliCommand::Unmute | CliCommand::ToggleMute | CliCommand::TestSound => {
            sound_command(&command, &sound, format).await?
        }
        CliCommand::Watch { .. } => bail!("watch is not a one-shot command"),
    };

    Ok(output)
}

/// Stay mounted, printing the list on every change until Ctrl-C
pub async fn watch(
    options: SyncOptions,
    feed_addr: Option<String>,
    config: &CoreConfig,
    api: Arc<dyn NotificationApi>,
    sound: SoundControl,
    format: OutputFormat,
) -> Result<()> {
    let events = EventBus::new();

    let feed = feed_addr.map(|addr| {
        tracing::info!(addr = %addr, "Starting realtime feed");
        EventFeedClient::new(addr, Duration::from_secs(config.reconnect_delay_secs)).spawn(events.clone())
    });
    if feed.is_none() {
        tracing::warn!("No realtime feed configured, list will only update on start");
    }

    let sync = NotificationSync::mount(options, api, sound, &events).await;
    let mut rx = sync.subscribe();

    loop {
        let snapshot = rx.borrow_and_update().clone();
        if !snapshot.is_loading {
            if format.is_json() {
                println!("{}", to_json(&snapshot, format)?);
            } else {
                println!("{}\n", render_snapshot(&snapshot));
            }
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    sync.teardown();
    if let Some(feed) = feed {
        feed.abort();
    }
    Ok(())
}

/// Wire up the live client and run `command`
pub async fn run(command: CliCommand, config: CoreConfig, format: OutputFormat) -> Result<()> {
    let sound = build_sound(&config);

    if is_sound_command(&command) {
        println!("{}", sound_command(&command, &sound, format).await?);
        return Ok(());
    }

    let api: Arc<dyn NotificationApi> =
        Arc::new(FrappeClient::from_config(&config).context("Failed to create API client")?);

    if let CliCommand::Watch { options, feed_addr } = command {
        let feed_addr = feed_addr.or_else(|| config.feed_addr.clone());
        return watch(options, feed_addr, &config, api, sound, format).await;
    }

    let output = execute(command, api, sound, format).await?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskbell_core::api::{DocListQuery, NotificationLogs};
    use deskbell_core::{LocalStorage, MemoryStorage, NotificationRecord, SyncError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSite {
        records: Mutex<Vec<NotificationRecord>>,
        fail_writes: AtomicBool,
    }

    impl FakeSite {
        fn with_unread(ids: &[&str]) -> Arc<Self> {
            let records = ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    serde_json::from_value(json!({
                        "name": id,
                        "type": "Alert",
                        "read": 0,
                        "modified": format!("2024-03-0{} 08:00:00", i + 1),
                        "subject": format!("Alert {}", id),
                        "from_user": "ops@example.com",
                    }))
                    .unwrap()
                })
                .collect();
            Arc::new(Self {
                records: Mutex::new(records),
                ..Self::default()
            })
        }

        fn check_write(&self) -> Result<(), SyncError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(SyncError::Api {
                    status: 403,
                    message: "Not permitted".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationApi for FakeSite {
        async fn get_notification_logs(&self, limit: usize) -> Result<NotificationLogs, SyncError> {
            Ok(NotificationLogs {
                notification_logs: self.records.lock().unwrap().iter().take(limit).cloned().collect(),
                user_info: Default::default(),
            })
        }

        async fn get_doc_list(&self, query: &DocListQuery) -> Result<Vec<NotificationRecord>, SyncError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().skip(query.start).take(query.limit).cloned().collect())
        }

        async fn mark_as_read(&self, id: &str) -> Result<(), SyncError> {
            self.check_write()?;
            for record in self.records.lock().unwrap().iter_mut().filter(|r| r.id == id) {
                record.read = true;
            }
            Ok(())
        }

        async fn mark_all_as_read(&self) -> Result<(), SyncError> {
            self.check_write()?;
            for record in self.records.lock().unwrap().iter_mut() {
                record.read = true;
            }
            Ok(())
        }
    }

    fn quiet_sound() -> (SoundControl, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SoundControl::new(storage.clone(), Arc::new(SilentPlayer)), storage)
    }

    #[tokio::test]
    async fn test_list_renders_text() {
        let site = FakeSite::with_unread(&["NL-1", "NL-2"]);
        let (sound, _) = quiet_sound();
        let out = execute(
            CliCommand::List {
                options: SyncOptions::default(),
            },
            site,
            sound,
            OutputFormat::Text,
        )
        .await
        .unwrap();

        assert!(out.contains("NL-1"));
        assert!(out.ends_with("2 unread"));
    }

    #[tokio::test]
    async fn test_unread_json() {
        let site = FakeSite::with_unread(&["NL-1", "NL-2", "NL-3"]);
        let (sound, _) = quiet_sound();
        let out = execute(
            CliCommand::Unread {
                options: SyncOptions::default(),
            },
            site,
            sound,
            OutputFormat::Json,
        )
        .await
        .unwrap();
        assert_eq!(out, r#"{"unread":3}"#);
    }

    #[tokio::test]
    async fn test_mark_read_updates_site() {
        let site = FakeSite::with_unread(&["NL-1", "NL-2"]);
        let (sound, _) = quiet_sound();
        let out = execute(
            CliCommand::MarkRead {
                id: "NL-1".to_string(),
                options: SyncOptions::default(),
            },
            site.clone(),
            sound,
            OutputFormat::Text,
        )
        .await
        .unwrap();

        assert_eq!(out, "Marked NL-1 as read (1 unread)");
        assert!(site.records.lock().unwrap().iter().any(|r| r.id == "NL-1" && r.read));
    }

    #[tokio::test]
    async fn test_mark_read_rejected_for_unlisted_id() {
        let site = FakeSite::with_unread(&[]);
        site.fail_writes.store(true, Ordering::SeqCst);
        let (sound, _) = quiet_sound();
        let result = execute(
            CliCommand::MarkRead {
                id: "NL-OLD".to_string(),
                options: SyncOptions::default(),
            },
            site,
            sound,
            OutputFormat::Text,
        )
        .await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to mark NL-OLD as read"));
    }

    #[tokio::test]
    async fn test_mark_all_read_rejected_on_empty_list() {
        let site = FakeSite::with_unread(&[]);
        site.fail_writes.store(true, Ordering::SeqCst);
        let (sound, _) = quiet_sound();
        let result = execute(
            CliCommand::MarkAllRead {
                options: SyncOptions::default(),
            },
            site,
            sound,
            OutputFormat::Json,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_test_sound_reports_mute() {
        let (sound, _) = quiet_sound();
        sound.set_mute(true);

        let out = execute(CliCommand::TestSound, FakeSite::with_unread(&[]), sound.clone(), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, "Notification sound is muted, not played");

        let out = execute(CliCommand::TestSound, FakeSite::with_unread(&[]), sound, OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(out, r#"{"muted":true,"played":false}"#);
    }

    #[tokio::test]
    async fn test_mark_read_reports_rejected_write() {
        let site = FakeSite::with_unread(&["NL-1"]);
        site.fail_writes.store(true, Ordering::SeqCst);
        let (sound, _) = quiet_sound();
        let result = execute(
            CliCommand::MarkRead {
                id: "NL-1".to_string(),
                options: SyncOptions::default(),
            },
            site,
            sound,
            OutputFormat::Text,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let site = FakeSite::with_unread(&["NL-1", "NL-2"]);
        let (sound, _) = quiet_sound();
        let out = execute(
            CliCommand::MarkAllRead {
                options: SyncOptions::default(),
            },
            site.clone(),
            sound,
            OutputFormat::Json,
        )
        .await
        .unwrap();
        assert_eq!(out, r#"{"unread":0}"#);
        assert!(site.records.lock().unwrap().iter().all(|r| r.read));
    }

    #[tokio::test]
    async fn test_mute_commands_persist() {
        let site = FakeSite::with_unread(&[]);
        let (sound, storage) = quiet_sound();

        let out = execute(CliCommand::Mute, site.clone(), sound.clone(), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, "Notification sound muted");
        assert_eq!(storage.get_item("notifications-muted").as_deref(), Some("true"));

        let out = execute(CliCommand::ToggleMute, site, sound, OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(out, r#"{"muted":false}"#);
        assert_eq!(storage.get_item("notifications-muted").as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_watch_is_not_one_shot() {
        let (sound, _) = quiet_sound();
        let result = execute(
            CliCommand::Watch {
                options: SyncOptions::default(),
                feed_addr: None,
            },
            FakeSite::with_unread(&[]),
            sound,
            OutputFormat::Text,
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"siteUrl": "https://erp.example.com", "feedAddr": "127.0.0.1:9100"}"#).unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        assert_eq!(config.feed_addr.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn test_resolve_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn test_build_sound_falls_back_to_silence() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config.sound_file = Some(dir.path().join("missing.mp3"));

        let sound = build_sound(&config);
        assert!(!sound.is_muted());
        sound.test_sound();
    }
}
