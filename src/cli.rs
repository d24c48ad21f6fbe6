//! # Command Line Interface
//!
//! Non-interactive commands over the schema service:
//!
//! ```bash
//! dirschema objectclass inetOrgPerson
//! dirschema attributetype mail --json
//! dirschema --environment production purge-caches --yes
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;

use crate::{
    config::Config,
    logger,
    schema::{AttributeTypeDefinition, AttributeUsage, ClassReport, SchemaService},
    Error, Result,
};

const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Parser, Debug)]
#[command(name = "dirschema")]
#[command(version, about = "Resolve directory schema inheritance and attributes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Specify the environment [default: development]
    #[arg(short, long, global = true)]
    environment: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show an object class with its ancestors and effective attributes
    #[command(name = "objectclass")]
    ObjectClass {
        /// Name or OID of the object class
        name: String,
    },
    /// Show an attribute type definition
    #[command(name = "attributetype")]
    AttributeType {
        /// Name or OID of the attribute type
        name: String,
    },
    /// Remove every cached resolution
    PurgeCaches {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

/// Parses the process arguments, runs the command and returns its outcome.
///
/// # Errors
///
/// Fails when configuration, the schema source or the cache cannot be loaded,
/// when the requested element is not defined, or when the directory is
/// unavailable.
pub async fn main() -> Result<()> {
    run(Cli::parse()).await
}

/// Runs an already parsed command line.
///
/// # Errors
///
/// See [`main`].
pub async fn run(cli: Cli) -> Result<()> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    let config = Config::new(&environment)?;
    logger::init(&config.logger)?;

    let result = execute(&cli, &config).await;
    if let Err(err) = &result {
        error!(error = %err, environment, "command failed");
    }
    result
}

async fn execute(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::PurgeCaches { yes: false } => Err(Error::string(
            "refusing to purge caches without --yes",
        )),
        Commands::PurgeCaches { yes: true } => {
            let service = SchemaService::from_config(config).await?;
            service.purge_caches().await?;
            println!("{}", "caches purged".green());
            Ok(())
        }
        Commands::ObjectClass { name } => {
            let service = SchemaService::from_config(config).await?;
            let report = service
                .describe_object_class(name)
                .await?
                .ok_or_else(|| Error::Message(format!("object class `{name}` is not defined")))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_class(&report));
            }
            Ok(())
        }
        Commands::AttributeType { name } => {
            let service = SchemaService::from_config(config).await?;
            let definition = service
                .attribute_type(name)
                .await?
                .ok_or_else(|| Error::Message(format!("attribute type `{name}` is not defined")))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&definition)?);
            } else {
                print!("{}", render_attribute(&definition));
            }
            Ok(())
        }
    }
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".dimmed().to_string()
    } else {
        items.join(", ")
    }
}

fn render_class(report: &ClassReport) -> String {
    let definition = &report.definition;
    let mut out = format!("{}\n", definition.name().bold());
    if let Some(oid) = definition.oid() {
        out.push_str(&format!("  oid:        {oid}\n"));
    }
    if let Some(description) = definition.description() {
        out.push_str(&format!("  desc:       {description}\n"));
    }
    if let Some(kind) = definition.kind() {
        out.push_str(&format!("  kind:       {kind:?}\n"));
    }
    if definition.is_obsolete() {
        out.push_str(&format!("  {}\n", "obsolete".yellow()));
    }
    out.push_str(&format!("  ancestors:  {}\n", render_list(&report.ancestors)));
    out.push_str(&format!(
        "  must:       {}\n",
        render_list(report.attributes.required())
    ));
    out.push_str(&format!(
        "  may:        {}\n",
        render_list(report.attributes.optional())
    ));
    out.push_str(&format!("  raw:        {}\n", report.raw.dimmed()));
    out
}

fn render_attribute(definition: &AttributeTypeDefinition) -> String {
    let mut out = format!("{}\n", definition.name().bold());
    let fields = [
        ("oid", definition.oid()),
        ("desc", definition.description()),
        ("sup", definition.superior()),
        ("equality", definition.equality()),
        ("ordering", definition.ordering()),
        ("substr", definition.substring()),
        ("syntax", definition.syntax()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("  {label:<11} {value}\n"));
        }
    }
    let cardinality = if definition.is_single_valued() {
        "single-valued"
    } else {
        "multi-valued"
    };
    out.push_str(&format!("  {:<11} {cardinality}\n", "values"));
    if definition.usage() != AttributeUsage::UserApplications {
        out.push_str(&format!("  {:<11} {:?}\n", "usage", definition.usage()));
    }
    let flags = [
        ("collective", definition.is_collective()),
        ("no-user-modification", !definition.is_user_modifiable()),
        ("obsolete", definition.is_obsolete()),
    ];
    for (flag, set) in flags {
        if set {
            out.push_str(&format!("  {}\n", flag.yellow()));
        }
    }
    out
}
