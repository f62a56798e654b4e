mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flashquiz_lib::flashcards::import::Delimiter;
use flashquiz_lib::flashcards::StudyMode;

#[derive(Parser)]
#[command(name = "flashquiz-cli", about = "Study flashcards from the terminal", version)]
struct Cli {
    /// Base URL of the user-service
    #[arg(long, global = true, env = "FLASHQUIZ_USER_URL", default_value = "http://localhost:3002")]
    user_url: String,

    /// Base URL of the auth-service
    #[arg(long, global = true, env = "FLASHQUIZ_AUTH_URL", default_value = "http://localhost:3001")]
    auth_url: String,

    /// Session token (default: the one saved by `login`)
    #[arg(long, global = true, env = "FLASHQUIZ_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    Flashcard,
    Match,
    Quiz,
    Test,
}

impl From<ModeArg> for StudyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Flashcard => StudyMode::Flashcard,
            ModeArg::Match => StudyMode::Match,
            ModeArg::Quiz => StudyMode::Quiz,
            ModeArg::Test => StudyMode::Test,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Log in and save the session token
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// List your flashcard sets
    Sets,

    /// Create a flashcard set
    CreateSet {
        title: String,
    },

    /// Delete a set with its cards and study history
    DeleteSet {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },

    /// List the cards in a set
    Cards {
        /// Set title (case-insensitive prefix match) or id
        set: String,
    },

    /// Add one card to a set
    AddCard {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        front: String,
        back: String,
    },

    /// Change a card's text or memorized flag
    EditCard {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        /// Card id or position as shown by `cards`
        card: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        memorized: Option<bool>,
    },

    /// Delete one card
    DeleteCard {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        /// Card id or position as shown by `cards`
        card: String,
    },

    /// Import cards from delimited text, one card per line
    Import {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        /// Text file to read ("-" for stdin)
        file: PathBuf,
        /// tab, comma, semicolon, or any other separator string
        #[arg(long, default_value = "tab")]
        delimiter: Delimiter,
    },

    /// Study a set interactively
    Study {
        /// Set title (case-insensitive prefix match) or id
        set: String,
        #[arg(long, value_enum, default_value = "flashcard")]
        mode: ModeArg,
    },

    /// Show past study sessions
    History,

    /// Show the profile the user-service keeps for you
    Profile,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Command::Login { email, password } => {
            commands::login::run(&cli.auth_url, &email, password, &cli.format).await?;
        }
        Command::Sets => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::sets::run_list(&app, &cli.format, use_color).await?;
        }
        Command::CreateSet { title } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::sets::run_create(&app, &title, &cli.format).await?;
        }
        Command::DeleteSet { set, yes } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::sets::run_delete(&app, &set, yes).await?;
        }
        Command::Cards { set } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::cards::run_list(&app, &set, &cli.format, use_color).await?;
        }
        Command::AddCard { set, front, back } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::cards::run_add(&app, &set, &front, &back, &cli.format).await?;
        }
        Command::EditCard {
            set,
            card,
            front,
            back,
            memorized,
        } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            let edit = commands::cards::CardEdit {
                front,
                back,
                memorized,
            };
            commands::cards::run_edit(&app, &set, &card, edit, &cli.format).await?;
        }
        Command::DeleteCard { set, card } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::cards::run_delete(&app, &set, &card).await?;
        }
        Command::Import { set, file, delimiter } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::import::run(&app, &set, &file, &delimiter, &cli.format).await?;
        }
        Command::Study { set, mode } => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::study::run(&app, &set, mode.into(), use_color).await?;
        }
        Command::History => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::history::run(&app, &cli.format, use_color).await?;
        }
        Command::Profile => {
            let app = app::App::new(&cli.user_url, cli.token)?;
            commands::profile::run(&app, &cli.format).await?;
        }
    }

    Ok(())
}
