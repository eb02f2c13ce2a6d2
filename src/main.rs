//! CLI entry point for `gmaildump`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use gmaildump::api::client::GmailClient;
use gmaildump::auth;
use gmaildump::config::{self, Config};
use gmaildump::extract::batch::{extract_address, AddressReport, ExtractOptions};

#[derive(Parser)]
#[command(
    name = "gmaildump",
    version,
    about = "Export Gmail messages to local HTML files, grouped by correspondent address"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract messages for every configured address
    Extract {
        /// Also download attachments
        #[arg(short, long)]
        attachments: bool,
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Address list file (defaults to the configured one)
        #[arg(long)]
        addresses: Option<PathBuf>,
    },
    /// Write a sample address list file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Check credentials, token, and address list
    Validate,
    /// Guided first-time setup
    Setup,
    /// Delete the cached token (and optionally the credentials file)
    ResetAuth {
        /// Also delete the credentials file
        #[arg(long)]
        credentials: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let cfg = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => cfg.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &cfg);

    match cli.command {
        Commands::Extract {
            attachments,
            output,
            addresses,
        } => cmd_extract(&cfg, attachments, output, addresses),
        Commands::Init { force } => cmd_init(&cfg, force),
        Commands::Validate => cmd_validate(&cfg),
        Commands::Setup => cmd_setup(&cfg),
        Commands::ResetAuth { credentials } => cmd_reset_auth(&cfg, credentials),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, cfg: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(cfg);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "gmaildump.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Run extraction over every configured address.
fn cmd_extract(
    cfg: &Config,
    attachments: bool,
    output: Option<PathBuf>,
    addresses: Option<PathBuf>,
) -> anyhow::Result<()> {
    let addresses_path = addresses.unwrap_or_else(|| cfg.paths.addresses_file.clone());
    let addresses = gmaildump::addresses::load_addresses(&addresses_path)?;

    println!("  Loaded {} unique address(es):", addresses.len());
    for address in &addresses {
        println!("    - {address}");
    }

    let token = auth::authenticate(
        &cfg.paths.credentials_file,
        &cfg.paths.token_file,
        cfg.http.timeout_secs,
        print_auth_url,
    )?;
    let client = GmailClient::new(token.access_token, cfg.http.timeout_secs)?;

    let opts = ExtractOptions {
        output_root: output.unwrap_or_else(|| cfg.paths.output_dir.clone()),
        download_attachments: attachments,
        date_format: cfg.general.date_format.clone(),
    };

    let start = Instant::now();
    let mut reports: Vec<AddressReport> = Vec::new();
    let mut without_matches = 0usize;
    let mut failed_addresses = 0usize;

    for address in &addresses {
        println!();
        println!("  Searching messages exchanged with {address}");

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Extracting [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let result = extract_address(
            &client,
            address,
            &opts,
            Some(&|current, total| {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            }),
        );
        pb.finish_and_clear();

        match result {
            Ok(Some(report)) => {
                if report.failed > 0 {
                    println!(
                        "  Exported {}/{} message(s), {} failed",
                        report.exported, report.found, report.failed
                    );
                } else {
                    println!("  Exported {} message(s)", report.exported);
                }
                reports.push(report);
            }
            Ok(None) => {
                println!("  No messages found");
                without_matches += 1;
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Address extraction failed");
                println!("  Failed: {e}");
                failed_addresses += 1;
            }
        }
    }

    print_run_summary(
        &reports,
        without_matches,
        failed_addresses,
        start.elapsed(),
        &opts.output_root,
    );
    Ok(())
}

/// Print the end-of-run summary table.
fn print_run_summary(
    reports: &[AddressReport],
    without_matches: usize,
    failed_addresses: usize,
    elapsed: std::time::Duration,
    output_root: &Path,
) {
    use humansize::{format_size, BINARY};

    let exported: usize = reports.iter().map(|r| r.exported).sum();
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    let attachments: usize = reports.iter().map(|r| r.attachments_saved).sum();

    println!();
    println!("  Extraction complete:");
    println!("  {:<25} {}", "Addresses with matches", reports.len());
    println!("  {:<25} {}", "Addresses without", without_matches);
    if failed_addresses > 0 {
        println!("  {:<25} {}", "Addresses failed", failed_addresses);
    }
    println!("  {:<25} {}", "Messages exported", exported);
    if failed > 0 {
        println!("  {:<25} {}", "Messages failed", failed);
    }
    println!("  {:<25} {}", "Attachments saved", attachments);
    if output_root.exists() {
        println!(
            "  {:<25} {}",
            "Output size",
            format_size(dir_size(output_root), BINARY)
        );
    }
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!("  {:<25} {}", "Output directory", output_root.display());
    println!();
}

/// Total size in bytes of everything under `path`.
fn dir_size(path: &Path) -> u64 {
    let mut total = 0;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let p = entry.path();
            if p.is_dir() {
                total += dir_size(&p);
            } else if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
    }
    total
}

const SAMPLE_ADDRESSES: &str = "\
# One email address per line. Lines starting with '#' are ignored.
# A message matches when the address appears in From, To, or Cc.
#
# alice@example.com
# billing@suppliers.example
";

/// Write a sample address list file.
fn cmd_init(cfg: &Config, force: bool) -> anyhow::Result<()> {
    let path = &cfg.paths.addresses_file;
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(path, SAMPLE_ADDRESSES)?;
    println!("  Wrote sample address list to {}", path.display());
    println!("  Add your addresses, then run 'gmaildump extract'");
    Ok(())
}

/// Report the state of credentials, token, and address list.
fn cmd_validate(cfg: &Config) -> anyhow::Result<()> {
    println!();
    println!("  Checking setup:");

    let mut ready = true;

    match auth::credentials::load_credentials(&cfg.paths.credentials_file) {
        Ok(_) => println!("  {:<15} ok", "Credentials"),
        Err(e) => {
            ready = false;
            println!("  {:<15} {e}", "Credentials");
        }
    }

    match auth::token::StoredToken::load(&cfg.paths.token_file) {
        Ok(token) if !token.is_expired() => println!("  {:<15} valid", "Token"),
        Ok(_) => println!("  {:<15} expired (refreshed on next run)", "Token"),
        Err(_) => println!("  {:<15} missing (browser sign-in on next run)", "Token"),
    }

    match gmaildump::addresses::load_addresses(&cfg.paths.addresses_file) {
        Ok(list) => println!("  {:<15} {} address(es)", "Address list", list.len()),
        Err(e) => {
            ready = false;
            println!("  {:<15} {e}", "Address list");
        }
    }

    println!(
        "  {:<15} {}",
        "Log file",
        config::log_file_path(cfg).display()
    );

    println!();
    if ready {
        println!("  Ready. Run 'gmaildump extract' to start.");
    } else {
        println!("  Not ready. Run 'gmaildump setup' for guided configuration.");
    }
    println!();
    Ok(())
}

/// Guided first-time setup: credentials, authorization, connectivity check.
fn cmd_setup(cfg: &Config) -> anyhow::Result<()> {
    println!();
    println!("  Gmail API setup");
    println!();
    println!("  1. Go to https://console.cloud.google.com/");
    println!("  2. Create a project (or pick one) and enable the Gmail API");
    println!("  3. Configure the OAuth consent screen and add yourself as a test user");
    println!("  4. Create OAuth client credentials of type 'Desktop app'");
    println!(
        "  5. Download the JSON and save it as {}",
        cfg.paths.credentials_file.display()
    );
    println!();
    println!("  Press Enter once the file is in place...");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    auth::credentials::load_credentials(&cfg.paths.credentials_file)?;
    println!("  Credentials file looks good");

    let token = auth::authenticate(
        &cfg.paths.credentials_file,
        &cfg.paths.token_file,
        cfg.http.timeout_secs,
        print_auth_url,
    )?;
    let client = GmailClient::new(token.access_token, cfg.http.timeout_secs)?;
    let profile = client.profile()?;

    println!();
    println!(
        "  Connected as {} ({} messages in mailbox)",
        profile.email_address, profile.messages_total
    );

    if !cfg.paths.addresses_file.exists() {
        println!();
        println!(
            "  Next: run 'gmaildump init' to create {}",
            cfg.paths.addresses_file.display()
        );
    }
    Ok(())
}

/// Delete cached authentication state.
fn cmd_reset_auth(cfg: &Config, credentials: bool) -> anyhow::Result<()> {
    remove_reporting(&cfg.paths.token_file, "Token");
    if credentials {
        remove_reporting(&cfg.paths.credentials_file, "Credentials");
    }
    Ok(())
}

fn remove_reporting(path: &Path, label: &str) {
    match std::fs::remove_file(path) {
        Ok(()) => println!("  {label} deleted: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("  {label} not present: {}", path.display());
        }
        Err(e) => println!("  Could not delete {}: {e}", path.display()),
    }
}

fn print_auth_url(url: &str) {
    println!();
    println!("  Open this URL in your browser and grant read-only access:");
    println!();
    println!("    {url}");
    println!();
    println!("  Waiting for the browser redirect...");
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "gmaildump", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
