use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use log::LevelFilter;

use evschema_cli::{
    commands::{CommandHandler, ComposeArgs},
    ctx::{AppContext, PathConfig},
};

#[derive(Parser)]
#[command(name = "evschema")]
#[command(version)]
#[command(about = "Compose tracking events from event schemas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog bundle file
    #[arg(long, short, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Engine configuration file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List root schemas and their event types
    Schemas,
    /// Compose an event from selection operations
    Compose {
        /// Schema key, e.g. `event`
        #[arg(long, short)]
        schema: String,
        /// Schema version, latest by default
        #[arg(long)]
        version: Option<String>,
        /// Event type to pre-select
        #[arg(long = "type", short)]
        type_name: Option<String>,
        /// Select a field by dotted path
        #[arg(long)]
        select: Vec<String>,
        /// Deselect a field by dotted path
        #[arg(long)]
        deselect: Vec<String>,
        /// Pick a value, e.g. `object=Article`
        #[arg(long)]
        value: Vec<String>,
        /// Write the event to this file as well
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show root fields grouped into categories
    Categories {
        /// Schema key, e.g. `event`
        #[arg(long, short)]
        schema: String,
        /// Schema version, latest by default
        #[arg(long)]
        version: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let ctx = AppContext::load(PathConfig {
        catalog: cli.catalog,
        config: cli.config,
    })
    .await?;

    match cli.command {
        Commands::Schemas => CommandHandler::handle_schemas(&ctx).await?,
        Commands::Compose {
            schema,
            version,
            type_name,
            select,
            deselect,
            value,
            output,
        } => {
            let actions = matches
                .subcommand_matches("compose")
                .map(ordered_actions)
                .unwrap_or_default();
            log::debug!(
                "{} select, {} deselect and {} value operations",
                select.len(),
                deselect.len(),
                value.len()
            );
            let args = ComposeArgs {
                schema,
                version,
                type_name,
                actions,
                output,
            };
            CommandHandler::handle_compose(&ctx, args).await?
        }
        Commands::Categories { schema, version } => {
            CommandHandler::handle_categories(&ctx, &schema, version.as_deref()).await?
        }
    }
    Ok(())
}

/// Turns the operation flags into action text in the order they appeared on
/// the command line.
fn ordered_actions(matches: &ArgMatches) -> Vec<String> {
    let mut actions: Vec<(usize, String)> = Vec::new();
    for verb in ["select", "deselect", "value"] {
        let (Some(indices), Some(values)) =
            (matches.indices_of(verb), matches.get_many::<String>(verb))
        else {
            continue;
        };
        for (index, value) in indices.zip(values) {
            actions.push((index, format!("{verb} {value}")));
        }
    }
    actions.sort_by_key(|(index, _)| *index);
    actions.into_iter().map(|(_, action)| action).collect()
}
