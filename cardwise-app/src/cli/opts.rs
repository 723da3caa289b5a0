use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "cardwise", version, about = "Cardwise: flashcards with SM-2 scheduling")]
pub struct Cli {
    /// Snapshot file (defaults to the app data dir)
    #[arg(long, env = "CARDWISE_STORE")]
    pub store: Option<PathBuf>,

    /// How many previous snapshots to keep
    #[arg(long, default_value_t = cardwise_json::DEFAULT_MAX_BACKUPS)]
    pub backups: usize,

    /// Log filter written to stderr, e.g. `debug` or `cardwise_core=debug`
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Quiz every card of a deck in random order
    Quiz { deck: String },
    /// Review all cards due today
    Review,
    /// Review one card
    ReviewCard { deck: String, number: usize },
    /// List cards due today
    Due,
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add { name: Option<String> },
    List,
    Rename { deck: String, name: Option<String> },
    Rm {
        deck: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardFields),
    List {
        deck: String,
        #[arg(long)]
        query: Option<String>,
    },
    Edit(CardEdit),
    Rm {
        deck: String,
        number: usize,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardFields {
    pub deck: String,
    #[arg(long)]
    pub prompt: Option<String>,
    /// Accepted answers, comma-separated
    #[arg(long)]
    pub answers: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub deck: String,
    /// Card number as shown by `card list`
    pub number: usize,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long)]
    pub answers: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv {
        path: PathBuf,
        #[arg(long)]
        deck: Option<String>,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    Json { path: PathBuf },
    Csv {
        path: PathBuf,
        #[arg(long)]
        deck: Option<String>,
    },
}
