use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hopper_core::config::{load_config, resolve_hopper_home, TitleSettings};
use hopper_core::skills::install_skills;
use hopper_core::titler::title_generator;
use hopper_core::{Item, ItemStore, ListFilter};
use hopper_render::{
    format_duration, render_init_report, render_item_detail, render_item_list,
};

#[derive(Parser)]
#[command(name = "hopper", version, about = "Personal work queue")]
struct Cli {
    /// Store directory (defaults to ~/.hopper)
    #[arg(long, global = true, env = "HOPPER_HOME")]
    home: Option<PathBuf>,
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install agent skill files into the current directory
    Init,
    #[command(flatten)]
    Queue(QueueCommand),
}

/// Subcommands that operate on the item store.
#[derive(Subcommand)]
enum QueueCommand {
    /// Add a work item; reads stdin when no description is given
    Add(AddArgs),
    /// Show full details of an item
    Show { id: String },
    /// List queued and in-progress items
    List(ListArgs),
    /// Claim the oldest queued item
    Claim {
        #[arg(long)]
        agent: Option<String>,
    },
    /// Complete a claimed item
    Complete {
        token: String,
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Cancel a queued item
    Cancel { id: String },
    /// Return an in-progress item to the queue
    Requeue {
        id: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        agent: Option<String>,
    },
}

#[derive(Args)]
struct AddArgs {
    description: Option<String>,
    /// Working directory for the task
    #[arg(long)]
    dir: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    /// Include completed and cancelled items
    #[arg(long, conflicts_with = "completed")]
    all: bool,
    /// Show only completed items
    #[arg(long)]
    completed: bool,
}

impl ListArgs {
    fn filter(&self) -> ListFilter {
        if self.all {
            ListFilter::All
        } else if self.completed {
            ListFilter::Completed
        } else {
            ListFilter::Active
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HOPPER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Init => init(json),
        Command::Queue(command) => {
            let home = match cli.home {
                Some(home) => home,
                None => resolve_hopper_home()?,
            };
            run_queue_command(command, &home, json)
        }
    }
}

fn init(json: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    debug!(project = %cwd.display(), "installing skills");
    let report = install_skills(&cwd, hopper_core::version())?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", render_init_report(&report));
    }
    Ok(())
}

fn run_queue_command(command: QueueCommand, home: &Path, json: bool) -> Result<()> {
    let store = ItemStore::new(home);
    debug!(home = %store.dir().display(), "opened item store");
    match command {
        QueueCommand::Add(args) => {
            let description = read_description(args.description)?;
            let config = load_config(home);
            let titler = title_generator(&TitleSettings::from_env(&config.title));
            let title = titler.generate_title(&description);
            debug!(title = %title, "generated title");
            let mut item = Item::new(title, description);
            item.working_dir = args.dir.filter(|dir| !dir.is_empty());
            let item = store.add(item)?;
            if json {
                print_json(&item)?;
            } else {
                println!("Added: {}", item.title);
            }
        }
        QueueCommand::Show { id } => {
            let item = store.find(&id)?;
            if json {
                print_json(&item)?;
            } else {
                println!("{}", render_item_detail(&item));
            }
        }
        QueueCommand::List(args) => {
            let items = store.list(args.filter());
            if json {
                print_json(&items)?;
            } else {
                println!("{}", render_item_list(&items));
            }
        }
        QueueCommand::Claim { agent } => {
            let item = store
                .claim_next(agent.as_deref())?
                .ok_or_else(|| anyhow!("No queued items available."))?;
            if json {
                print_json(&item)?;
            } else {
                println!("Claimed: {}", item.title);
                let token = item.claim_token.as_deref().unwrap_or_default();
                println!("Token:   {token}");
            }
        }
        QueueCommand::Complete {
            token,
            result,
            agent,
        } => {
            let item = store.complete(&token, agent.as_deref(), result.as_deref())?;
            if json {
                print_json(&item)?;
            } else {
                let duration = match (item.claimed_at, item.completed_at) {
                    (Some(start), Some(end)) => format_duration(start, end),
                    _ => "unknown".to_string(),
                };
                println!("Completed: {} ({})", item.title, duration);
            }
        }
        QueueCommand::Cancel { id } => {
            let item = store.cancel(&id)?;
            if json {
                print_json(&item)?;
            } else {
                println!("Cancelled: {}", item.title);
            }
        }
        QueueCommand::Requeue { id, reason, agent } => {
            let item = store.requeue(&id, &reason, agent.as_deref())?;
            if json {
                print_json(&item)?;
            } else {
                println!("Requeued: {}", item.title);
            }
        }
    }
    Ok(())
}

fn read_description(arg: Option<String>) -> Result<String> {
    let mut description = arg.unwrap_or_default().trim().to_string();
    if description.is_empty() && !std::io::stdin().is_terminal() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read description from stdin")?;
        description = buf.trim().to_string();
    }
    if description.is_empty() {
        bail!("Usage: hopper add <description>\n  or:  echo \"description\" | hopper add");
    }
    Ok(description)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
