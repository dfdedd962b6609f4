use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use locker_core::{
    auth, export, gallery, upload, Account, AuthState, MediaFilter, Severity, StorageMeter,
    UploadCandidate, UserStore, Uuid, DEFAULT_PASSWORD, DEFAULT_USERNAME,
};

#[derive(Parser)]
#[command(
    name = "locker-rs-cli",
    version,
    about = "Personal media locker - store, browse and export images and videos"
)]
struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in as an account
    Login { username: String, password: String },

    /// Log out of the active session
    Logout,

    /// Show the active session and storage usage
    Status,

    /// Upload image and video files to the logged-in account
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List stored media
    List {
        /// Filter by type: all, image or video
        #[arg(long, default_value = "all")]
        filter: MediaFilter,
    },

    /// Delete one item by id
    Delete {
        id: Uuid,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Download one item by id
    Download {
        id: Uuid,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Export all media of the logged-in account as a zip archive
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show storage usage
    Storage,

    /// Account administration
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create an account
    Create { username: String, password: String },

    /// List account names
    List,

    /// Delete an account and all of its media
    Delete { username: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("no platform data directory available, pass --data-dir")?
            .join("locker-rs"),
    };

    let mut store = UserStore::load(&data_dir)?;
    if store.seed_default()? {
        eprintln!(
            "Seeded default account: username \"{}\" with password \"{}\". \
             Create more with: locker-rs-cli user create",
            DEFAULT_USERNAME, DEFAULT_PASSWORD
        );
    }

    match cli.command {
        Command::Login { username, password } => {
            auth::login(&store, &username, &password)?;
            println!("Logged in as {}", username);
            if let Some(account) = store.account(&username) {
                println!("{}", meter_line(account));
            }
        }

        Command::Logout => {
            auth::logout(&data_dir)?;
            println!("Logged out");
        }

        Command::Status => match auth::resume(&data_dir) {
            AuthState::LoggedIn(username) => {
                println!("Logged in as {}", username);
                if let Some(account) = store.account(&username) {
                    println!("{}", meter_line(account));
                }
            }
            AuthState::LoggedOut => println!("Logged out"),
        },

        Command::Upload { files } => {
            let username = require_login(&data_dir)?;
            let mut candidates = Vec::with_capacity(files.len());
            for path in &files {
                candidates.push(UploadCandidate::from_path(path)?);
            }

            let bar = ProgressBar::new(files.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40}] {pos}/{len} {msg}")
                    .unwrap(),
            );
            let tick = bar.clone();

            let report = {
                let account = account_mut(&mut store, &username)?;
                upload::upload_batch(account, &candidates, &move |_stage, current, total, msg| {
                    tick.set_length(total);
                    tick.set_position(current);
                    tick.set_message(msg.to_string());
                })?
            };
            bar.finish_and_clear();
            store.save()?;

            println!("Stored {} file(s)", report.stored);
            for skip in &report.skipped {
                eprintln!(
                    "Skipped {} ({}): {}",
                    skip.name,
                    locker_core::format_file_size(skip.size),
                    skip.reason
                );
            }
            println!("{}", meter_line(account_ref(&store, &username)?));
        }

        Command::List { filter } => {
            let username = require_login(&data_dir)?;
            let account = account_ref(&store, &username)?;
            let items = gallery::filter_media(account, filter);
            if items.is_empty() {
                println!("No media items found. Upload some files to get started.");
            } else {
                for item in items {
                    println!(
                        "{}  {:<5}  {:>10}  {}  {}",
                        item.id,
                        item.kind.to_string(),
                        item.formatted_size,
                        item.upload_date.format("%Y-%m-%d"),
                        item.name
                    );
                }
            }
        }

        Command::Delete { id, yes } => {
            let username = require_login(&data_dir)?;
            let removed = {
                let account = account_mut(&mut store, &username)?;
                let Some(item) = account.find_item(id) else {
                    println!("No item with id {}", id);
                    return Ok(());
                };
                if !yes && !confirm(&format!("Delete {}?", item.name)) {
                    println!("Aborted");
                    return Ok(());
                }
                account.remove_item(id)
            };
            if let Some(item) = removed {
                store.save()?;
                println!("Deleted {} ({} freed)", item.name, item.formatted_size);
                println!("{}", meter_line(account_ref(&store, &username)?));
            }
        }

        Command::Download { id, output } => {
            let username = require_login(&data_dir)?;
            let account = account_ref(&store, &username)?;
            match account.find_item(id) {
                Some(item) => {
                    let dest = export::write_item(item, &output)?;
                    println!("Wrote {}", dest.display());
                }
                None => println!("No item with id {}", id),
            }
        }

        Command::Export { output } => {
            let username = require_login(&data_dir)?;
            let account = account_ref(&store, &username)?;

            let bar = ProgressBar::new(account.media.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40}] {pos}/{len} {msg}")
                    .unwrap(),
            );
            let tick = bar.clone();

            let result = export::export_archive(
                &username,
                account,
                &output,
                &move |_stage, current, _total, msg| {
                    tick.set_position(current);
                    tick.set_message(msg.to_string());
                },
            )?;
            bar.finish_and_clear();

            match result {
                Some(path) => println!("Wrote {}", path.display()),
                None => println!("No media items to export."),
            }
        }

        Command::Storage => {
            let username = require_login(&data_dir)?;
            println!("{}", meter_line(account_ref(&store, &username)?));
        }

        Command::User(command) => match command {
            UserCommand::Create { username, password } => {
                store.create_account(&username, &password)?;
                println!("User {} created", username);
            }
            UserCommand::List => {
                for name in store.usernames() {
                    println!("{}", name);
                }
            }
            UserCommand::Delete { username } => {
                store.delete_account(&username)?;
                println!("User {} deleted", username);
            }
        },
    }

    Ok(())
}

fn require_login(data_dir: &Path) -> anyhow::Result<String> {
    match auth::resume(data_dir) {
        AuthState::LoggedIn(username) => Ok(username),
        AuthState::LoggedOut => anyhow::bail!("not logged in, run `locker-rs-cli login` first"),
    }
}

fn account_ref<'a>(store: &'a UserStore, username: &str) -> anyhow::Result<&'a Account> {
    store
        .account(username)
        .with_context(|| format!("account {} not found", username))
}

fn account_mut<'a>(store: &'a mut UserStore, username: &str) -> anyhow::Result<&'a mut Account> {
    store
        .account_mut(username)
        .with_context(|| format!("account {} not found", username))
}

fn meter_line(account: &Account) -> String {
    let meter = StorageMeter::for_account(account);
    let band = match meter.severity() {
        Severity::Normal => "",
        Severity::Warning => " [warning]",
        Severity::Critical => " [critical]",
    };
    format!("{}{}", meter, band)
}

fn confirm(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}
