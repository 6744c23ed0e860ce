use anyhow::Result;
use clap::{Parser, Subcommand};

use tradejournal::backup::LifecycleEvent;
use tradejournal::cli::{
    handle_backup_command, handle_delete, handle_get, handle_recover, handle_save,
    handle_snapshot_command, BackupCommands, SnapshotCommands,
};
use tradejournal::config::{paths::JournalPaths, settings::Settings};
use tradejournal::services::JournalCore;

#[derive(Parser)]
#[command(
    name = "tradejournal",
    author = "Kaylee Beyene",
    version,
    about = "Redundant local backup and recovery for trading journal data",
    long_about = "tradejournal keeps journal data in named storage slots and protects \
                  every write with per-key rolling backups and a periodic full \
                  snapshot of all tracked slots."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Save a JSON value to a slot, backing up the previous write
    Save {
        /// Slot key
        key: String,
        /// JSON value
        value: String,
    },

    /// Print a slot, falling back to its backup
    Get {
        /// Slot key
        key: String,
    },

    /// Print the most recent backup of a slot
    Recover {
        /// Slot key
        key: String,
    },

    /// Delete a slot and all of its backups
    Delete {
        /// Slot key
        key: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Per-key backup commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Full snapshot commands
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Initialize paths and settings
    let paths = JournalPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing tradejournal at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Tracked slot prefixes:");
            for prefix in &settings.backup.tracked_prefixes {
                println!("  - {}*", prefix);
            }
            println!();
            println!("Run 'tradejournal save <key> <json>' to store data.");
            return Ok(());
        }
        Some(Commands::Config) => {
            println!("tradejournal Configuration");
            println!("==========================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Slots directory:   {}", paths.slots_dir().display());
            println!("Exports directory: {}", paths.exports_dir().display());
            println!("Initialized:       {}", paths.is_initialized());
            println!();
            println!("Settings:");
            println!("  Backup retention:  {}", settings.backup.retention_count);
            println!("  Tracked prefixes:  {}", settings.backup.tracked_prefixes.join(", "));
            println!("  Snapshot debounce: {}ms", settings.snapshot.debounce_ms);
            println!("  Snapshot cooldown: {}ms", settings.snapshot.cooldown_ms);
            println!("  Snapshot interval: {}s", settings.snapshot.interval_secs);
            match settings.storage.quota_bytes {
                Some(quota) => println!("  Storage quota:     {} bytes", quota),
                None => println!("  Storage quota:     unlimited"),
            }
            return Ok(());
        }
        None => {
            println!("tradejournal - Redundant backups for trading journal data");
            println!();
            println!("Run 'tradejournal --help' for usage information.");
            return Ok(());
        }
        Some(_) => {}
    }

    // The timer takes its own teardown snapshot on stop
    let timer_teardown = matches!(
        cli.command,
        Some(Commands::Snapshot(SnapshotCommands::Watch { .. }))
    );

    let core = JournalCore::open(&paths, &settings)?;
    core.snapshotter.initialize();

    let result = match cli.command {
        Some(Commands::Save { key, value }) => handle_save(&core, &key, &value),
        Some(Commands::Get { key }) => handle_get(&core, &key),
        Some(Commands::Recover { key }) => handle_recover(&core, &key),
        Some(Commands::Delete { key, force }) => handle_delete(&core, &key, force),
        Some(Commands::Backup(cmd)) => handle_backup_command(&core, cmd),
        Some(Commands::Snapshot(cmd)) => handle_snapshot_command(&core, &paths, &settings, cmd),
        Some(Commands::Init) | Some(Commands::Config) | None => Ok(()),
    };

    // Process teardown: also covers a write-triggered snapshot that cannot
    // wait out its debounce, and deletes or restores that never request one
    if !timer_teardown {
        core.snapshotter.handle_lifecycle(LifecycleEvent::Teardown);
    }

    result?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
