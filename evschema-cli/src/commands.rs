//! Command handlers.
//!
//! Each subcommand loads what it needs from the [`AppContext`], drives the
//! engine and prints the outcome.

use std::{collections::BTreeMap, fmt::Write, path::PathBuf};

use anyhow::Result;
use colored::Colorize;
use evschema::{
    ComposeRequest, compose,
    data::{
        Field, Schema,
        action::Action,
        catalog::fetch_schema_summaries,
        categories::FieldCategories,
        session::Session,
    },
    write_event,
};

use crate::ctx::AppContext;

/// Arguments of the `compose` command.
#[derive(Debug, Default, Clone)]
pub struct ComposeArgs {
    pub schema: String,
    pub version: Option<String>,
    pub type_name: Option<String>,
    /// Operations in the order they were given.
    pub actions: Vec<String>,
    /// Also write the event here.
    pub output: Option<PathBuf>,
}

/// Handler for the evschema subcommands.
pub struct CommandHandler;

impl CommandHandler {
    /// Lists the root schemas with their type variants. Highlighted variants
    /// are marked with `*`.
    pub async fn handle_schemas(ctx: &AppContext) -> Result<()> {
        let summaries = fetch_schema_summaries(ctx.catalog.as_ref(), &ctx.config).await?;
        if summaries.is_empty() {
            bail!("catalog does not publish every root schema");
        }
        print!("{}", render_summaries(&summaries));
        Ok(())
    }

    /// Opens a session, applies the operations and prints the event.
    ///
    /// # Errors
    ///
    /// Returns an error if an operation cannot be parsed or the schema cannot
    /// be opened.
    pub async fn handle_compose(ctx: &AppContext, args: ComposeArgs) -> Result<()> {
        let actions = args
            .actions
            .iter()
            .map(|a| a.parse::<Action>())
            .collect::<Result<Vec<_>, _>>()?;
        let request = ComposeRequest {
            key: args.schema,
            version: args.version,
            type_name: args.type_name,
            actions,
        };
        info!("composing `{}` with {} actions", request.key, request.actions.len());

        let session = compose(ctx.catalog.clone(), ctx.config.clone(), &request).await?;
        let event = session.event();
        println!("{}", serde_json::to_string_pretty(&event)?);

        if let Some(output) = args.output {
            write_event(&output, &event).await?;
            println!(
                "{}",
                format!("Event saved to {}", output.display()).green()
            );
        }
        Ok(())
    }

    /// Prints the root fields of a schema grouped into categories.
    pub async fn handle_categories(
        ctx: &AppContext,
        schema: &str,
        version: Option<&str>,
    ) -> Result<()> {
        let session = Session::open(
            ctx.catalog.clone(),
            ctx.config.clone(),
            schema,
            version,
            None,
        )
        .await?;
        print!("{}", render_categories(&session.categories()));
        Ok(())
    }
}

/// Human readable listing of root schema summaries.
pub fn render_summaries(summaries: &BTreeMap<String, Schema>) -> String {
    let mut out = String::new();
    for (key, schema) in summaries {
        let _ = writeln!(
            out,
            "{} {}",
            key.bold(),
            format!("v{} ({})", schema.version, schema.id).dimmed()
        );
        if !schema.title.is_empty() {
            let _ = writeln!(out, "  {}", schema.title);
        }
        for variant in &schema.type_list {
            if variant.highlighted == Some(true) {
                let _ = writeln!(out, "  * {}", variant.name.yellow());
            } else {
                let _ = writeln!(out, "    {}", variant.name);
            }
        }
    }
    out
}

/// Human readable listing of field categories.
pub fn render_categories(categories: &FieldCategories<'_>) -> String {
    let mut out = String::new();
    for (title, fields) in [
        ("main", &categories.main),
        ("additional", &categories.additional),
        ("technical", &categories.technical),
    ] {
        let _ = writeln!(out, "{}", title.bold().cyan());
        for field in fields.iter() {
            let _ = writeln!(out, "  {}", describe(field));
        }
    }
    out
}

fn describe(field: &Field) -> String {
    let mut line = field.name.clone();
    if field.required {
        line.push_str(" (required)");
    }
    if let Some(description) = &field.description {
        let _ = write!(line, " - {description}");
    }
    line
}
