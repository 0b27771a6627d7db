use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use deskbell_cli::cli::{resolve_config, run, CliCommand, OutputFormat};
use deskbell_core::constants::DEFAULT_LIMIT;
use deskbell_core::tracing_setup::init_tracing;
use deskbell_core::{ReadFilter, SyncOptions, TypeFilter};

#[derive(Parser)]
#[command(name = "deskbell")]
#[command(about = "Notification inbox for a Frappe site")]
struct Cli {
    /// Path to JSON config file (siteUrl, apiKey, apiSecret, ...)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, short)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FetchArgs {
    /// Maximum number of notifications to fetch
    #[arg(long, short = 'n', default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Use the filtered document list instead of the notification log endpoint
    #[arg(long)]
    paginated: bool,

    /// Offset into the filtered list (paginated only)
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Notification type: all, mention, assignment, share, alert, energy-point
    #[arg(long = "type", default_value = "all")]
    type_filter: TypeFilter,

    /// Read state: all, read, unread
    #[arg(long = "read", default_value = "all")]
    read_filter: ReadFilter,
}

impl FetchArgs {
    fn into_options(self) -> SyncOptions {
        let options = if self.paginated {
            SyncOptions::paginated(self.limit, self.start)
        } else {
            SyncOptions::simple(self.limit)
        };
        options
            .with_type_filter(self.type_filter)
            .with_read_filter(self.read_filter)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List notifications
    List(FetchArgs),

    /// Print the unread count
    Unread(FetchArgs),

    /// Mark one notification as read
    Read {
        /// Notification log name
        id: String,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Mark all notifications as read
    ReadAll(FetchArgs),

    /// Keep the list open and reprint it as realtime events arrive
    Watch {
        #[command(flatten)]
        fetch: FetchArgs,
        /// Play the notification sound on new notifications
        #[arg(long)]
        sound: bool,
        /// Realtime feed address (host:port), overrides the config file
        #[arg(long)]
        feed: Option<String>,
    },

    /// Mute the notification sound
    Mute,

    /// Unmute the notification sound
    Unmute,

    /// Flip the notification sound mute flag
    ToggleMute,

    /// Play the notification sound once; does nothing while muted
    TestSound,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let command = match cli.command {
        Commands::List(fetch) => CliCommand::List {
            options: fetch.into_options(),
        },
        Commands::Unread(fetch) => CliCommand::Unread {
            options: fetch.into_options(),
        },
        Commands::Read { id, fetch } => CliCommand::MarkRead {
            id,
            options: fetch.into_options(),
        },
        Commands::ReadAll(fetch) => CliCommand::MarkAllRead {
            options: fetch.into_options(),
        },
        Commands::Watch { fetch, sound, feed } => CliCommand::Watch {
            options: fetch.into_options().with_sound(sound),
            feed_addr: feed,
        },
        Commands::Mute => CliCommand::Mute,
        Commands::Unmute => CliCommand::Unmute,
        Commands::ToggleMute => CliCommand::ToggleMute,
        Commands::TestSound => CliCommand::TestSound,
    };

    let format = OutputFormat::from_flags(cli.json, cli.pretty);
    if let Err(e) = run(command, config, format).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
