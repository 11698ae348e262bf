//! `shpd` — terminal frontend for the Shepherd password vault daemon.
//!
//! A thin view layer: every command resynchronizes the session from the
//! daemon, runs one state-machine operation, and renders the result.
//! All vault logic lives in `shepherd-core`; all cryptography lives in
//! the daemon.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rand::Rng;

use shepherd_api::{Entry, HttpBackend, Listing};
use shepherd_core::browse::{compose_create_path, sort_listing};
use shepherd_core::{Session, SessionError, SessionState};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// Alphabet used by the password generator — letters, digits, and the
// handful of symbols every backend accepts.
const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

// ── CLI structure ────────────────────────────────────────────────────

/// shpd — browse, unlock, and search your Shepherd vault.
#[derive(Parser)]
#[command(
    name = "shpd",
    version,
    about = "shpd CLI — client for the Shepherd password vault daemon",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         SHPD_ADDR           Daemon address (default: http://127.0.0.1:8100)\n  \
         SHPD_TIMEOUT_SECS   Request timeout in seconds (default: 10)\n\n\
         {DIM}Examples:{RESET}\n  \
         shpd browse ~\n  \
         shpd create --dir ~/vaults --file-name personal --name \"Personal\"\n  \
         shpd open ~/vaults/personal.shpd && shpd unlock\n  \
         shpd list mail"
    ),
)]
struct Cli {
    /// Shepherd daemon address.
    #[arg(long, env = "SHPD_ADDR", default_value = "http://127.0.0.1:8100")]
    addr: String,

    /// Request timeout in seconds.
    #[arg(long, env = "SHPD_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a vault is open and unlocked.
    Status,
    /// List a directory (directories first, then vault files).
    Browse {
        /// Directory to list. The daemon expands `~`.
        #[arg(default_value = "~")]
        path: String,
    },
    /// Create a new vault and unlock it.
    Create {
        /// Full path for the new vault file.
        path: Option<String>,
        /// Directory to place the vault in (alternative to PATH).
        #[arg(long, conflicts_with = "path")]
        dir: Option<String>,
        /// File name inside --dir; `.shpd` is appended if missing.
        #[arg(long, requires = "dir")]
        file_name: Option<String>,
        /// Vault display name.
        #[arg(long, default_value = "My Vault")]
        name: String,
        /// Master password. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Open an existing vault (stays locked until `unlock`).
    Open {
        /// Path to the vault file.
        path: String,
    },
    /// Verify the master password and load the entries.
    Unlock {
        /// Master password. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Close the vault and forget all decrypted state.
    Close,
    /// List entries, optionally filtered by a search query.
    List {
        /// Case-insensitive substring matched against name and username.
        query: Option<String>,
    },
    /// Show one entry in full.
    Show {
        /// Entry index as printed by `list`.
        index: usize,
        /// Print the password instead of masking it.
        #[arg(long)]
        reveal: bool,
    },
    /// Add a new entry.
    Add {
        /// Entry name.
        name: String,
        /// Account username.
        #[arg(long, default_value = "")]
        username: String,
        /// Entry password. Prompted for when omitted (unless --generate).
        #[arg(long)]
        password: Option<String>,
        /// Generate the password instead of prompting.
        #[arg(long, conflicts_with = "password")]
        generate: bool,
        /// Associated URL.
        #[arg(long, default_value = "")]
        url: String,
        /// Free-form notes.
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Overwrite fields of an existing entry.
    Edit {
        /// Entry index as printed by `list`.
        index: usize,
        /// New entry name.
        #[arg(long)]
        name: Option<String>,
        /// New username.
        #[arg(long)]
        username: Option<String>,
        /// New password.
        #[arg(long)]
        password: Option<String>,
        /// New URL.
        #[arg(long)]
        url: Option<String>,
        /// New notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an entry.
    Rm {
        /// Entry index as printed by `list`.
        index: usize,
    },
    /// Generate a random password (no daemon needed).
    Gen {
        /// Password length.
        #[arg(long, default_value = "20")]
        length: usize,
    },
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // The generator is purely local — no transport, no session.
    if let Commands::Gen { length } = &cli.command {
        println!("{}", generate_password(*length));
        return Ok(());
    }

    tracing::debug!(addr = %cli.addr, timeout_secs = cli.timeout_secs, "connecting to daemon");
    let backend = HttpBackend::new(&cli.addr, Duration::from_secs(cli.timeout_secs))
        .context("failed to construct HTTP client")?;
    let mut session = Session::new(backend);

    // The daemon holds the authoritative open/unlocked state; adopt it
    // before enforcing any local guard.
    session.resync().await.map_err(display)?;

    match cli.command {
        Commands::Status => cmd_status(&session),
        Commands::Browse { path } => cmd_browse(&session, &path).await,
        Commands::Create {
            path,
            dir,
            file_name,
            name,
            password,
        } => cmd_create(&mut session, path, dir, file_name, &name, password).await,
        Commands::Open { path } => cmd_open(&mut session, &path).await,
        Commands::Unlock { password } => cmd_unlock(&mut session, password).await,
        Commands::Close => cmd_close(&mut session).await,
        Commands::List { query } => cmd_list(&mut session, query.as_deref()).await,
        Commands::Show { index, reveal } => cmd_show(&mut session, index, reveal).await,
        Commands::Add {
            name,
            username,
            password,
            generate,
            url,
            notes,
        } => cmd_add(&mut session, name, username, password, generate, url, notes).await,
        Commands::Edit {
            index,
            name,
            username,
            password,
            url,
            notes,
        } => cmd_edit(&mut session, index, name, username, password, url, notes).await,
        Commands::Rm { index } => cmd_rm(&mut session, index).await,
        Commands::Gen { .. } => Ok(()),
    }
}

/// Collapse a session error to its user-facing message. Transport
/// detail has already been logged by the transport layer.
fn display(err: SessionError) -> anyhow::Error {
    anyhow!(err.display_message())
}

// ── Commands ─────────────────────────────────────────────────────────

fn cmd_status(session: &Session<HttpBackend>) -> Result<()> {
    header("🔐", "Vault Status");
    match session.state() {
        SessionState::Closed => {
            kv_line("Vault", &format!("{DIM}none open{RESET}"));
        }
        SessionState::OpenLocked { name, entry_count } => {
            kv_line("Vault", &display_name(name));
            kv_line("State", &format!("{YELLOW}{BOLD}locked{RESET}"));
            kv_line("Entries", &entry_count.to_string());
        }
        SessionState::OpenUnlocked { name, entry_count } => {
            kv_line("Vault", &display_name(name));
            kv_line("State", &format!("{GREEN}{BOLD}unlocked{RESET}"));
            kv_line("Entries", &entry_count.to_string());
        }
    }
    println!();
    Ok(())
}

async fn cmd_browse(session: &Session<HttpBackend>, path: &str) -> Result<()> {
    let Listing { path, mut items } = session.browse(path).await.map_err(display)?;
    sort_listing(&mut items);

    header("📁", &path);
    if items.is_empty() {
        println!("  {DIM}(empty){RESET}");
    }
    for item in &items {
        let icon = if item.is_dir { "📁" } else { "🔐" };
        println!("  {icon} {BOLD}{}{RESET}  {DIM}{}{RESET}", item.name, item.path);
    }
    println!();
    Ok(())
}

async fn cmd_create(
    session: &mut Session<HttpBackend>,
    path: Option<String>,
    dir: Option<String>,
    file_name: Option<String>,
    name: &str,
    password: Option<String>,
) -> Result<()> {
    let path = match (path, dir) {
        (Some(p), _) => p,
        (None, Some(d)) => compose_create_path(&d, file_name.as_deref().unwrap_or("")),
        (None, None) => anyhow::bail!("give either PATH or --dir"),
    };

    let password = ask_password(password, "Master password: ")?;
    session.create(&path, &password, name).await.map_err(display)?;

    println!();
    println!("  {GREEN}{BOLD}✓{RESET} Vault {BOLD}{name}{RESET} created at {path}");
    println!();
    Ok(())
}

async fn cmd_open(session: &mut Session<HttpBackend>, path: &str) -> Result<()> {
    session.open(path).await.map_err(display)?;

    if let SessionState::OpenLocked { name, entry_count } = session.state() {
        println!();
        println!(
            "  {GREEN}{BOLD}✓{RESET} Opened {BOLD}{}{RESET} ({entry_count} entries) — {YELLOW}locked{RESET}",
            display_name(name)
        );
        println!("  {DIM}Run `shpd unlock` to access entries.{RESET}");
        println!();
    }
    Ok(())
}

async fn cmd_unlock(
    session: &mut Session<HttpBackend>,
    password: Option<String>,
) -> Result<()> {
    let password = ask_password(password, "Master password: ")?;
    session.unlock(&password).await.map_err(display)?;

    let count = session.cache().map_or(0, shepherd_core::EntryCache::len);
    println!();
    println!("  {GREEN}{BOLD}✓ Vault unlocked{RESET} — {count} entries loaded");
    println!();
    Ok(())
}

async fn cmd_close(session: &mut Session<HttpBackend>) -> Result<()> {
    session.close().await.map_err(display)?;
    println!();
    println!("  {GREEN}{BOLD}✓{RESET} Vault closed");
    println!();
    Ok(())
}

async fn cmd_list(session: &mut Session<HttpBackend>, query: Option<&str>) -> Result<()> {
    session.reload().await.map_err(display)?;

    // Indices are backend-order positions, not positions within the
    // filtered hits — they feed straight into `show`/`edit`/`rm`.
    let hits = session.filter_indexed(query.unwrap_or(""));
    header("🗂", &format!("{} entries", hits.len()));
    for (index, entry) in &hits {
        let username = if entry.username.is_empty() {
            format!("{DIM}-{RESET}")
        } else {
            entry.username.clone()
        };
        println!("  {DIM}{index:>3}{RESET}  {BOLD}{}{RESET}  {username}", entry.name);
    }
    if hits.is_empty() {
        println!("  {DIM}(no matches){RESET}");
    }
    println!();
    Ok(())
}

async fn cmd_show(
    session: &mut Session<HttpBackend>,
    index: usize,
    reveal: bool,
) -> Result<()> {
    session.reload().await.map_err(display)?;
    let entry = entry_at(session, index)?;

    header("🔑", &entry.name);
    kv_line("Username", &or_dash(&entry.username));
    if reveal {
        kv_line("Password", &entry.password);
    } else {
        kv_line("Password", &format!("{DIM}••••••••  (--reveal to print){RESET}"));
    }
    kv_line("URL", &or_dash(&entry.url));
    kv_line("Notes", &or_dash(&entry.notes));
    println!();
    Ok(())
}

async fn cmd_add(
    session: &mut Session<HttpBackend>,
    name: String,
    username: String,
    password: Option<String>,
    generate: bool,
    url: String,
    notes: String,
) -> Result<()> {
    let password = if generate {
        generate_password(20)
    } else {
        ask_password(password, "Entry password: ")?
    };

    let entry = Entry {
        name,
        username,
        password,
        url,
        notes,
    };
    session.add_entry(&entry).await.map_err(display)?;

    let count = session.cache().map_or(0, shepherd_core::EntryCache::len);
    println!();
    println!("  {GREEN}{BOLD}✓{RESET} Entry {BOLD}{}{RESET} added ({count} total)", entry.name);
    println!();
    Ok(())
}

async fn cmd_edit(
    session: &mut Session<HttpBackend>,
    index: usize,
    name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    url: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    session.reload().await.map_err(display)?;
    let current = entry_at(session, index)?;

    let updated = Entry {
        name: name.unwrap_or(current.name),
        username: username.unwrap_or(current.username),
        password: password.unwrap_or(current.password),
        url: url.unwrap_or(current.url),
        notes: notes.unwrap_or(current.notes),
    };
    session.modify_entry(index, &updated).await.map_err(display)?;

    println!();
    println!("  {GREEN}{BOLD}✓{RESET} Entry {index} updated");
    println!();
    Ok(())
}

async fn cmd_rm(session: &mut Session<HttpBackend>, index: usize) -> Result<()> {
    session.delete_entry(index).await.map_err(display)?;

    let count = session.cache().map_or(0, shepherd_core::EntryCache::len);
    println!();
    println!("  {GREEN}{BOLD}✓{RESET} Entry {index} deleted ({count} remaining)");
    println!();
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn entry_at(session: &Session<HttpBackend>, index: usize) -> Result<Entry> {
    session
        .cache()
        .and_then(|c| c.entries().get(index))
        .cloned()
        .with_context(|| format!("no entry at index {index} — see `shpd list`"))
}

fn ask_password(given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(p) => Ok(p),
        None => rpassword::prompt_password(prompt).context("failed to read password"),
    }
}

fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_ALPHABET.len());
            char::from(PASSWORD_ALPHABET[idx])
        })
        .collect()
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        format!("{DIM}(unnamed){RESET}")
    } else {
        name.to_owned()
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_owned()
    } else {
        value.to_owned()
    }
}

fn header(icon: &str, title: &str) {
    println!();
    println!("  {icon} {CYAN}{BOLD}{title}{RESET}");
    println!();
}

fn kv_line(label: &str, value: &str) {
    println!("  {DIM}{label}:{RESET}  {value}");
}
