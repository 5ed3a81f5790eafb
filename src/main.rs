use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dialoguer::Password;
use log::error;
use repolens::{
    config::Config, logging, settings, tree::sort_for_display, Assistant, CredentialStore,
    FileCredentialStore, GitHubClient, Notice, NoticeLevel, OpenAiAssistant, Role, Session,
    TreeNode,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository URL to open at startup
    #[arg(short, long)]
    url: Option<String>,

    /// Config file (defaults to <config_dir>/repolens/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset (unknown values mean info)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load()?,
    };
    config.validate().context("invalid configuration")?;

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(config.credentials_path()?));
    let assistant = Arc::new(OpenAiAssistant::new(
        config.assistant.clone(),
        credentials.clone(),
    )?);
    let session = Session::new(
        Arc::new(GitHubClient::new(config.github.clone())?),
        assistant.clone(),
    );

    print_banner();
    if let Some(url) = cli.url {
        open(&session, &url).await;
    }

    loop {
        print!("{} ", "repolens>".bright_green());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();
        match command {
            "q" | "quit" | "exit" => break,
            "h" | "help" | "?" => print_help(),
            "open" => open(&session, rest).await,
            "tree" => print_tree(&session).await,
            "select" => {
                if !session.select_path(rest).await {
                    println!("{}", format!("No such path: {}", rest).yellow());
                }
                print_notices(&session).await;
                print_file(&session).await;
            }
            "show" => print_file(&session).await,
            "key" => {
                let input = Password::new().with_prompt("OpenAI API key").interact();
                set_api_key(assistant.as_ref(), credentials.as_ref(), input).await;
            }
            "forget-key" => {
                if let Err(e) = settings::clear_api_key(credentials.as_ref()) {
                    error!("Failed to remove API key: {}", e);
                }
            }
            "ask" => ask(&session, rest).await,
            _ => ask(&session, input).await,
        }
    }

    Ok(())
}

fn print_banner() {
    println!("\n{}", "repolens".bright_green().bold());
    println!("{}", "Browse a GitHub repository and ask about its files".bright_blue());
    println!("{}\n", "Type 'help' for commands".bright_yellow());
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  {}  load a repository", "open <url>".bright_white().bold());
    println!("  {}        show the file tree", "tree".bright_white().bold());
    println!("  {} view a file", "select <path>".bright_white().bold());
    println!("  {}        show the selected file again", "show".bright_white().bold());
    println!(
        "  {}  ask about the selected file (bare text works too)",
        "ask <text>".bright_white().bold()
    );
    println!("  {}         set the assistant API key", "key".bright_white().bold());
    println!("  {}  remove the stored API key", "forget-key".bright_white().bold());
    println!("  {}        leave", "quit".bright_white().bold());
}

async fn open(session: &Session, url: &str) {
    println!("{}", format!("Loading {}...", url).bright_cyan());
    session.submit_repository(url).await;
    print_notices(session).await;
    let state = session.snapshot().await;
    match state.last_error {
        Some(e) => println!("{}", e.red()),
        None => print_tree(session).await,
    }
}

async fn print_notices(session: &Session) {
    for Notice { level, text } in session.take_notices().await {
        match level {
            NoticeLevel::Success => println!("{}", text.green()),
            NoticeLevel::Error => println!("{}", text.red()),
        }
    }
}

async fn print_tree(session: &Session) {
    let mut tree = session.snapshot().await.tree;
    if tree.is_empty() {
        println!("{}", "No repository loaded".yellow());
        return;
    }
    sort_for_display(&mut tree);
    for node in &tree {
        print_node(node, 0);
    }
}

fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.is_directory() {
        println!("{}{}/", indent, node.name().bright_yellow());
        for child in node.children() {
            print_node(child, depth + 1);
        }
    } else {
        println!("{}{}", indent, node.name().bright_blue());
    }
}

async fn print_file(session: &Session) {
    let state = session.snapshot().await;
    match (state.selected_path, state.selected_content) {
        (Some(path), Some(content)) => {
            println!("{}", format!("── {} ──", path).bright_white().bold());
            for (number, line) in content.lines().enumerate() {
                println!("{} {}", format!("{:>5}", number + 1).dimmed(), line);
            }
        }
        (Some(path), None) => println!("{}", format!("{} has no content loaded", path).yellow()),
        _ => println!("{}", "No file selected".yellow()),
    }
}

/// Saves a key read from the prompt; a failed prompt leaves the loop running
async fn set_api_key(
    assistant: &dyn Assistant,
    credentials: &dyn CredentialStore,
    input: io::Result<String>,
) -> bool {
    let key = match input {
        Ok(key) => key,
        Err(e) => {
            error!("Failed to read API key: {}", e);
            return false;
        }
    };
    match settings::save_api_key(assistant, credentials, &key).await {
        Ok(()) => {
            println!("{}", "API key saved successfully".green());
            true
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            false
        }
    }
}

async fn ask(session: &Session, text: &str) {
    let before = session.snapshot().await.transcript.len();
    println!("{}", "Thinking...".dimmed());
    session.send_message(text).await;
    print_notices(session).await;

    let state = session.snapshot().await;
    for message in state.transcript.iter().skip(before) {
        if message.role == Role::Assistant {
            println!("{}\n", message.content);
        }
    }
}
