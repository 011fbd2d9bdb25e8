use clap::{CommandFactory, Parser, Subcommand};
use diff_overlay::{Config, OverlayError, SessionError, Workspace};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "diff-overlay")]
#[command(about = "Review working-tree hunks and accept or reject them one at a time")]
struct Cli {
    /// Repository the files belong to
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Configuration file (defaults to .diff-overlay.toml in the repository)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the pending hunks of a file as an overlay
    Show { file: PathBuf },
    /// Keep a hunk as it is (1-based index)
    Accept {
        file: PathBuf,
        #[arg(default_value_t = 1)]
        index: usize,
    },
    /// Revert a hunk to its previous text (1-based index)
    Reject {
        file: PathBuf,
        #[arg(default_value_t = 1)]
        index: usize,
    },
    /// Keep every hunk of a file
    AcceptAll { file: PathBuf },
    /// Revert every hunk of a file
    RejectAll { file: PathBuf },
    /// Decide hunks interactively, reading commands from stdin
    Review { file: PathBuf },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
    /// Print the man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diff-overlay", &mut io::stdout());
            return Ok(());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(&cli.repo, cli.config.as_deref())?;
    let mut workspace = Workspace::new(&cli.repo, config);

    match cli.command {
        Commands::Show { file } => {
            workspace.open(&file)?;
            print!("{}", workspace.view(&file)?);
        }
        Commands::Accept { file, index } => {
            decide(&mut workspace, &file, |ws, f| {
                ws.session_mut().accept_hunk(f, index)
            })?;
        }
        Commands::Reject { file, index } => {
            decide(&mut workspace, &file, |ws, f| {
                ws.session_mut().reject_hunk(f, index)
            })?;
        }
        Commands::AcceptAll { file } => {
            decide(&mut workspace, &file, |ws, f| ws.session_mut().accept_all(f))?;
        }
        Commands::RejectAll { file } => {
            decide(&mut workspace, &file, |ws, f| ws.session_mut().reject_all(f))?;
        }
        Commands::Review { file } => review(&mut workspace, &file)?,
        Commands::Completions { .. } | Commands::Man => {}
    }

    Ok(())
}

/// Open `file`, apply one decision, write the buffer back and print what is
/// left
fn decide<F>(workspace: &mut Workspace, file: &Path, decision: F) -> Result<(), OverlayError>
where
    F: FnOnce(&mut Workspace, &Path) -> Result<(), SessionError>,
{
    workspace.open(file)?;
    decision(workspace, file)?;
    workspace.save(file)?;
    print_remaining(workspace, file)
}

fn print_remaining(workspace: &Workspace, file: &Path) -> Result<(), OverlayError> {
    match workspace.session().hunk_count(file) {
        0 => println!("{}: no pending hunks", file.display()),
        _ => print!("{}", workspace.view(file)?),
    }
    Ok(())
}

const REVIEW_HELP: &str = "commands: a [N] accept, r [N] reject, A accept all, R reject all, s show, q write and quit";

/// Interactive loop; the buffer is written back when input ends or on `q`
fn review(workspace: &mut Workspace, file: &Path) -> Result<(), OverlayError> {
    workspace.open(file)?;
    print!("{}", workspace.view(file)?);
    println!("{}", REVIEW_HELP);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");
        let index = match words.next().map(str::parse::<usize>) {
            None => Ok(1),
            Some(parsed) => parsed,
        };

        let session = workspace.session_mut();
        let result = match (command, index) {
            ("q", _) => break,
            ("s", _) => Ok(()),
            ("a", Ok(index)) => session.accept_hunk(file, index),
            ("r", Ok(index)) => session.reject_hunk(file, index),
            ("A", _) => session.accept_all(file),
            ("R", _) => session.reject_all(file),
            ("a" | "r", Err(_)) => {
                println!("expected a hunk number");
                continue;
            }
            _ => {
                println!("{}", REVIEW_HELP);
                continue;
            }
        };

        if let Err(e) = result {
            tracing::warn!("{}", e);
        }
        if workspace.session().hunk_count(file) == 0 {
            break;
        }
        print_remaining(workspace, file)?;
    }

    workspace.save(file)?;
    print_remaining(workspace, file)
}
