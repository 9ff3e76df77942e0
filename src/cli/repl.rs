//! Interactive session
//!
//! Each request runs on a background task. Its status lines come back
//! through a [`ChannelSink`] and are printed while the task runs.

use anyhow::{Context, Result};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::commands::{build_agent, connect, print_models};
use crate::engine::{Agent, ChannelSink, StatusLevel, StatusLine, WorkspaceFs};
use crate::llm::OllamaBackend;
use crate::{Config, ExitCode, RequestOutcome};

const HELP: &str = "\
Commands:
  /help            Show this help
  /models          List installed models
  /model [name]    Show or switch the model
  /dir [path]      Show or change the output directory
  /pwd             Show the output directory
  /list            List files in the output directory
  /verbose         Toggle verbose output
  /raw             Show the last raw response
  /config          Show the effective configuration
  /clear           Clear the screen
  /quit, /exit, /q Leave

Anything else is sent to the model as a request.";

/// One line of input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Models,
    Model(Option<String>),
    Dir(Option<String>),
    Pwd,
    List,
    Verbose,
    Raw,
    Config,
    Clear,
    Quit,
    /// Blank line
    Empty,
    Unknown(String),
    Request(String),
}

impl ReplCommand {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Request(line.to_string());
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim().to_string()).filter(|a| !a.is_empty())),
            None => (line, None),
        };
        match name {
            "/help" => Self::Help,
            "/models" => Self::Models,
            "/model" => Self::Model(arg),
            "/dir" => Self::Dir(arg),
            "/pwd" => Self::Pwd,
            "/list" => Self::List,
            "/verbose" => Self::Verbose,
            "/raw" => Self::Raw,
            "/config" => Self::Config,
            "/clear" => Self::Clear,
            "/quit" | "/exit" | "/q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

struct Session<'a> {
    config: &'a Config,
    backend: Arc<OllamaBackend>,
    /// Out only while a request runs
    agent: Option<Agent>,
}

/// `codedrop chat`
pub(crate) async fn execute_chat(config: &Config) -> Result<ExitCode> {
    let backend = Arc::new(connect(config).await?);
    let model = backend.model().to_string();
    let agent = build_agent(config, backend.clone(), &model)?;

    println!("codedrop - model: {model}");
    println!("Output directory: {}", agent.working_dir().display());
    println!("Type /help for commands.\n");

    let mut session = Session {
        config,
        backend,
        agent: Some(agent),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        if !session.handle(ReplCommand::parse(&line)).await? {
            break;
        }
    }

    println!("Goodbye!");
    Ok(ExitCode::SUCCESS)
}

impl Session<'_> {
    fn agent(&mut self) -> Result<&mut Agent> {
        self.agent.as_mut().context("agent lost after a failed request")
    }

    /// Returns false when the session should end.
    async fn handle(&mut self, command: ReplCommand) -> Result<bool> {
        match command {
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Empty => {}
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Models => match self.backend.list_models().await {
                Ok(models) => print_models(&models, self.agent()?.model()),
                Err(e) => eprintln!("Error: {e}"),
            },
            ReplCommand::Model(None) => println!("Current model: {}", self.agent()?.model()),
            ReplCommand::Model(Some(name)) => {
                self.agent()?.set_model(name.clone());
                println!("Switched to model: {name}");
            }
            ReplCommand::Dir(None) | ReplCommand::Pwd => {
                println!("Output directory: {}", self.agent()?.working_dir().display());
            }
            ReplCommand::Dir(Some(path)) => {
                match WorkspaceFs::open(&path, self.config.defaults.allow_links) {
                    Ok(store) => {
                        let agent = self.agent()?;
                        agent.set_store(Box::new(store));
                        println!("Output directory: {}", agent.working_dir().display());
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            ReplCommand::List => {
                let names = self.agent()?.store().list_files("");
                if names.is_empty() {
                    println!("(empty)");
                }
                for name in names {
                    println!("  {name}");
                }
            }
            ReplCommand::Verbose => {
                let agent = self.agent()?;
                agent.set_verbose(!agent.verbose());
                let state = if agent.verbose() { "on" } else { "off" };
                println!("Verbose mode: {state}");
            }
            ReplCommand::Raw => {
                let last = self.agent()?.last_response();
                if last.is_empty() {
                    println!("No response yet.");
                } else {
                    println!("{last}");
                }
            }
            ReplCommand::Config => {
                for line in self.config.describe() {
                    println!("  {line}");
                }
            }
            ReplCommand::Clear => {
                execute!(std::io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
                    .context("Failed to clear screen")?;
            }
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {name}. Type /help for commands.");
            }
            ReplCommand::Request(text) => {
                let agent = self.agent.take().context("agent lost after a failed request")?;
                let (agent, _outcome) = run_in_background(agent, text).await?;
                self.agent = Some(agent);
            }
        }
        Ok(true)
    }
}

/// Run one request on a task, printing its status lines as they arrive.
async fn run_in_background(mut agent: Agent, request: String) -> Result<(Agent, RequestOutcome)> {
    let (sink, mut rx) = ChannelSink::new();
    agent.set_status_sink(Arc::new(sink));

    let mut task = tokio::spawn(async move {
        let outcome = agent.process_request(&request).await;
        (agent, outcome)
    });

    let joined = loop {
        tokio::select! {
            Some(line) = rx.recv() => print_line(&line),
            joined = &mut task => break joined,
        }
    };
    while let Ok(line) = rx.try_recv() {
        print_line(&line);
    }

    joined.context("request task failed")
}

fn print_line(line: &StatusLine) {
    match line.level {
        StatusLevel::Info => println!("{line}"),
        StatusLevel::Error => eprintln!("{line}"),
    }
}
