use clap::Parser;
use log::{debug, error, LevelFilter};
use recipe_ingest::{IngestConfig, IngestError, RecipeIngest};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "recipe-ingest")]
#[command(about = "Turn recipe text into a Markdown note in your vault", long_about = None)]
struct Cli {
    /// Recipe text; read from --file or stdin when omitted
    text: Option<String>,

    /// Read the recipe text from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Vault root directory (default: vault.path from configuration)
    #[arg(short = 'o', long)]
    vault: Option<PathBuf>,

    /// Recipes directory inside the vault
    #[arg(long)]
    recipes_dir: Option<String>,

    /// Ollama endpoint, e.g. http://localhost:11434
    #[arg(short = 'l', long)]
    endpoint: Option<String>,

    /// Model identifier, e.g. llama3.1:8b
    #[arg(short, long)]
    model: Option<String>,

    /// Source URL recorded in the frontmatter
    #[arg(long)]
    url: Option<String>,

    /// Replace an existing recipe if its ingredients match exactly
    #[arg(long)]
    overwrite: bool,

    /// Print the Markdown instead of saving it
    #[arg(long)]
    preview: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match IngestConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", IngestError::from(e));
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, cli.verbose);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &IngestConfig, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::Info)
    };
    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn run(cli: Cli, config: IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(cli.text, cli.file.as_ref())?;
    debug!("Read {} characters of input", text.len());

    let mut builder = RecipeIngest::builder()
        .config(config)
        .text(text)
        .overwrite(cli.overwrite);

    if let Some(vault) = cli.vault {
        builder = builder.vault(vault);
    }
    if let Some(dir) = cli.recipes_dir {
        builder = builder.recipes_dir(dir);
    }
    if let Some(endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(url) = cli.url {
        builder = builder.source_url(url);
    }
    if cli.preview {
        builder = builder.preview_only();
    }

    let result = builder.build().await?;

    match &result.file_path {
        Some(path) => println!("{}", path.display()),
        None => {
            print!("{}", result.markdown);
            if result.is_duplicate {
                let verdict = if result.duplicate_ingredients_match {
                    "ingredients match, --overwrite would update it"
                } else {
                    "ingredients differ, --overwrite would be refused"
                };
                eprintln!("Note: '{}' already exists ({})", result.recipe.title(), verdict);
            }
        }
    }
    Ok(())
}

fn read_input(text: Option<String>, file: Option<&PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err("No recipe text given. Pass it as an argument, with --file, or on stdin.".into());
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text)?;
    Ok(text)
}
