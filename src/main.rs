//! # TroGiang — Teaching Assistant CLI
//!
//! Teachers create classes and index documents as topics; students ask
//! questions answered from those documents.
//!
//! Usage:
//!   trogiang class create 10A1
//!   trogiang topic add 10A1 "Tế bào" --file te-bao.txt
//!   trogiang ask 10A1 "Tế bào" "Ti thể có chức năng gì?"

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trogiang_classroom::{ClassRegistry, Classroom};
use trogiang_core::config::TroGiangConfig;
use trogiang_core::error::TroGiangError;
use trogiang_knowledge::KnowledgeStore;

#[derive(Parser)]
#[command(
    name = "trogiang",
    version,
    about = "📚 TroGiang — AI teaching assistant over class documents"
)]
struct Cli {
    /// Config file (default: ~/.trogiang/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage classes
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },
    /// Manage students
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },
    /// Manage topics
    Topic {
        #[command(subcommand)]
        action: TopicAction,
    },
    /// Ask a question about a topic
    Ask {
        class: String,
        topic: String,
        question: Vec<String>,
        /// Print the passages given to the model
        #[arg(long)]
        show_context: bool,
    },
    /// Knowledge store statistics
    Stats,
    /// Inspect or create the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List supported providers
    Providers,
}

#[derive(Subcommand)]
enum ClassAction {
    /// Create a class
    Create { code: String },
    /// List classes
    List,
    /// Show a class's students and topics
    Show { code: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init,
}

#[derive(Subcommand)]
enum StudentAction {
    /// Enroll a student in a class
    Add { class: String, name: String },
}

#[derive(Subcommand)]
enum TopicAction {
    /// Index a document as a new topic
    Add {
        class: String,
        name: String,
        /// Document to index (.txt, .md, .pdf or .docx)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List a class's topics
    List { class: String },
}

fn load_config(cli: &Cli) -> Result<TroGiangConfig> {
    let mut config = match &cli.config {
        Some(path) if path.exists() => TroGiangConfig::load_from(path)?,
        Some(path) => {
            tracing::warn!("⚠️ {} not found, using defaults", path.display());
            TroGiangConfig::default()
        }
        None => TroGiangConfig::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = shellexpand::tilde(dir).to_string();
    }
    Ok(config)
}

fn open_registry(config: &TroGiangConfig) -> Result<ClassRegistry> {
    Ok(ClassRegistry::new(&Classroom::registry_dir(config))?)
}

fn open_store(config: &TroGiangConfig) -> Result<KnowledgeStore> {
    Ok(KnowledgeStore::open(&Classroom::store_path(config))?)
}

/// Only commands that embed or answer need the model providers.
fn open_classroom(config: &TroGiangConfig) -> Result<Classroom> {
    let embedder = trogiang_providers::create_embedder(&config.embedding)?;
    let answerer = trogiang_providers::create_answerer(&config.llm)?;
    Ok(Classroom::open(config, embedder, answerer)?)
}

/// Turn a missing class/topic into a hint instead of a bare error.
fn explain(err: TroGiangError, class: &str) -> anyhow::Error {
    if err.is_not_found() {
        anyhow::anyhow!(
            "❓ {err}\n   See `trogiang class list` and `trogiang topic list {class}`."
        )
    } else {
        err.into()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "trogiang=debug" } else { "trogiang=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    tracing::debug!(
        "Data dir: {}, embedding: {}/{}, llm: {}/{}",
        config.data_path().display(),
        config.embedding.provider,
        config.embedding.model,
        config.llm.provider,
        config.llm.model
    );

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init => {
                let path = cli.config.clone().unwrap_or_else(TroGiangConfig::default_path);
                if path.exists() {
                    println!("⚠️  Config already exists at {}", path.display());
                } else {
                    config.save_to(&path)?;
                    println!("✅ Wrote {}", path.display());
                }
            }
        },
        Command::Providers => {
            for name in trogiang_providers::available_providers() {
                println!("{name}");
            }
        }
        Command::Class { action } => {
            let registry = open_registry(&config)?;
            match action {
                ClassAction::Create { code } => {
                    let info = registry.create_class(&code)?;
                    if info.class_code != code {
                        println!("ℹ️  Class code normalized to {}", info.class_code);
                    }
                    println!("✅ Created class {}", info.class_code);
                }
                ClassAction::List => {
                    let codes = registry.list_classes()?;
                    if codes.is_empty() {
                        println!("No classes yet.");
                    }
                    for code in codes {
                        println!("{code}");
                    }
                }
                ClassAction::Show { code } => {
                    let info = registry.require(&code)?;
                    println!("{}", serde_json::to_string_pretty(&info)?);
                }
            }
        }
        Command::Student { action } => {
            let registry = open_registry(&config)?;
            match action {
                StudentAction::Add { class, name } => {
                    if registry.add_student(&class, &name)? {
                        println!("✅ Added {name} to {class}");
                    } else {
                        println!("⚠️  {name} is already in {class}");
                    }
                }
            }
        }
        Command::Topic { action } => match action {
            TopicAction::Add { class, name, file } => {
                let room = open_classroom(&config)?;
                let (entry, report) = room
                    .create_topic_from_file(&class, &name, &file)
                    .await
                    .map_err(|e| explain(e, &class))?;
                println!(
                    "✅ Topic '{}' ({}) indexed: {} chunks, {} words",
                    entry.name, entry.file, report.chunk_count, report.word_count
                );
            }
            TopicAction::List { class } => {
                let info = open_registry(&config)?
                    .require(&class)
                    .map_err(|e| explain(e, &class))?;
                let indexed = open_store(&config)?.list_topics(&info.class_code)?;
                if info.topics.is_empty() {
                    println!("No topics in {} yet.", info.class_code);
                }
                for topic in info.topics {
                    let mark = if indexed.contains(&topic.file) { "✅" } else { "⚠️ " };
                    println!("{mark} {}\t{}", topic.file, topic.name);
                }
            }
        },
        Command::Stats => {
            let classes = open_registry(&config)?.list_classes()?;
            let stats = open_store(&config)?.stats()?;
            println!("📊 Classes: {}", classes.len());
            println!("   Topics:  {}", stats.topics);
            println!("   Chunks:  {}", stats.chunks);
        }
        Command::Ask { class, topic, question, show_context } => {
            let room = open_classroom(&config)?;
            let question = question.join(" ");
            let answer = room
                .ask(&class, &topic, &question)
                .await
                .map_err(|e| explain(e, &class))?;
            if answer.degraded {
                tracing::warn!("⚠️ Model unavailable, showing fallback answer");
            }
            if show_context {
                for (i, passage) in answer.context.iter().enumerate() {
                    println!("[{}] {passage}", i + 1);
                }
                println!();
            }
            println!("🎓 {}", answer.text);
        }
    }

    Ok(())
}
