//! kg-chat: terminal front end for the knowledge-graph chat backend.
//! Resolves the backend from flags, env and config, sends one question (from
//! arguments, a preset, or stdin) and prints the answer. `--interactive` keeps
//! a prompt open for repeated questions.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kg_chat_client::config::{self, Defaults};
use kg_chat_client::render::{self, Channel, RenderOptions, Rendered};
use kg_chat_client::{BackendClient, ClientOptions, HealthCache, Outcome, Session, EXAMPLE_QUESTIONS};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kg-chat", version, about = "Ask the e-commerce knowledge graph backend")]
struct Cli {
    /// Config file (defaults to $KG_CHAT_CONFIG or ~/.kg-chat/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides $BACKEND_URL)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Endpoint path (overrides $BACKEND_PATH)
    #[arg(long, value_name = "PATH")]
    path: Option<String>,

    /// Check the backend before asking
    #[arg(long)]
    health: bool,

    /// Ask preset question N (see --list-examples)
    #[arg(long, value_name = "N")]
    example: Option<usize>,

    /// Print the preset questions and exit
    #[arg(long)]
    list_examples: bool,

    /// Keep a prompt open for repeated questions
    #[arg(short, long)]
    interactive: bool,

    /// Print the full backend payload after the answer
    #[arg(long)]
    show_payload: bool,

    /// Question text; read from stdin when omitted
    question: Vec<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_examples {
        for (i, q) in EXAMPLE_QUESTIONS.iter().enumerate() {
            println!("{}. {}", i + 1, q);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = match config::resolve_config_path(cli.config.as_deref()) {
        Some(path) => config::load_or_default(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::Config::default(),
    };

    let mut defaults = Defaults::from_env_and_config(&cfg);
    if let Some(url) = &cli.backend_url {
        defaults.base_url = url.clone();
    }
    if let Some(path) = &cli.path {
        defaults.path = path.clone();
    }

    let client = BackendClient::new(ClientOptions::from(&cfg)).context("failed to build HTTP client")?;
    let mut session = Session::new(client, HealthCache::new(cfg.health_ttl()), defaults);
    let opts = RenderOptions {
        show_payload: cli.show_payload,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    if cli.interactive {
        return interactive(&rt, &mut session, opts);
    }

    let mut healthy = true;
    if cli.health {
        let status = rt.block_on(session.health());
        healthy = status.healthy;
        emit(&render::render_health(&status));
    }

    let question = match cli.example {
        Some(n) => match n.checked_sub(1).and_then(|i| session.apply_example(i)) {
            Some(q) => q.to_string(),
            None => anyhow::bail!(
                "no preset question {} (choose 1-{})",
                n,
                EXAMPLE_QUESTIONS.len()
            ),
        },
        None if !cli.question.is_empty() => cli.question.join(" "),
        // Health-only invocation.
        None if cli.health => {
            return Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read question from stdin")?;
            line
        }
    };
    session.set_question(question);

    let outcome = rt.block_on(session.submit());
    let rendered = render::render_outcome(&outcome, opts);
    emit(&rendered);
    session.acknowledge();

    Ok(match (&outcome, rendered.channel) {
        (Outcome::Answered(_), Channel::Out) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn emit(rendered: &Rendered) {
    match rendered.channel {
        Channel::Out => println!("{}", rendered.text.trim_end()),
        Channel::Warn => eprintln!("Warning: {}", rendered.text.trim_end()),
        Channel::Err => eprintln!("Error: {}", rendered.text.trim_end()),
    }
}

const HELP: &str = "\
Commands:
  :url <URL>      set the backend base URL
  :path <PATH>    set the endpoint path
  :examples       list preset questions
  :example <N>    ask preset question N
  :health         check the backend (cached for a short while)
  :help           show this help
  :quit           leave
Anything else is sent as a question.";

/// Blocking stdin loop; each command drives the runtime only for its own request.
fn interactive(rt: &Runtime, session: &mut Session, opts: RenderOptions) -> Result<ExitCode> {
    println!("kg-chat: ask the knowledge graph. Type :help for commands.");
    let status = rt.block_on(session.health());
    emit(&render::render_health(&status));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("failed to read from stdin")?;
        let input = line.trim();

        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (input, ""),
        };
        match cmd {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":help" => println!("{}", HELP),
            ":url" => {
                session.set_backend_url(arg);
                let cfg = session.config();
                if cfg.is_configured() {
                    println!("Backend URL: {}", cfg.base_url);
                } else {
                    println!("Backend URL cleared.");
                }
            }
            ":path" => {
                session.set_path(arg);
                println!("Endpoint path: {}", session.config().path);
            }
            ":examples" => {
                for (i, q) in EXAMPLE_QUESTIONS.iter().enumerate() {
                    println!("{}. {}", i + 1, q);
                }
            }
            ":health" => {
                let status = rt.block_on(session.health());
                emit(&render::render_health(&status));
            }
            ":example" => {
                let picked = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| session.apply_example(i));
                match picked {
                    Some(q) => {
                        println!("Question: {}", q);
                        ask(rt, session, opts);
                    }
                    None => eprintln!(
                        "Warning: choose a preset between 1 and {}",
                        EXAMPLE_QUESTIONS.len()
                    ),
                }
            }
            _ if cmd.starts_with(':') => {
                eprintln!("Warning: unknown command {} (try :help)", cmd);
            }
            _ => {
                session.set_question(input);
                ask(rt, session, opts);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn ask(rt: &Runtime, session: &mut Session, opts: RenderOptions) {
    let outcome = rt.block_on(session.submit());
    emit(&render::render_outcome(&outcome, opts));
    session.acknowledge();
}
