//! Formwork CLI
//!
//! Unified command-line interface for:
//! - Migrating directories of instance documents between schema versions
//! - Migrating directories of template directories between schema versions
//! - Listing the registered transitions
//!
//! Each transition is also available on its own, so a single step can be
//! re-run the way the original one-shot migrations were.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use formwork_migrate::{
    instance_chain, template_chain, transition_catalog, InstanceV070ToV080,
    InstanceV070ToV080AddTypes, InstanceV090ToV091, TemplateV070ToV080, TemplateV090ToV091,
};
use formwork_store::{DocumentCodec, HoconCodec, JsonCodec};

mod instances;
mod templates;

#[derive(Parser)]
#[command(name = "formwork")]
#[command(
    author,
    version,
    about = "Formwork: schema migrations for job templates and instances"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a directory of instance documents (`*.json`).
    Instances {
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Migrate a directory of template directories (`template.json` +
    /// `template.conf`).
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// List the registered schema transitions.
    List,
}

#[derive(Subcommand)]
enum InstanceCommands {
    /// Add descriptors for referenced variables and rename dashed parameters.
    #[command(name = "0.7.0-to-0.8.0")]
    V070ToV080 {
        /// Directory of instance documents
        instance_dir: PathBuf,
    },

    /// Backfill descriptor types with a default type tag.
    #[command(name = "0.7.0-to-0.8.0-add-types")]
    V070ToV080AddTypes {
        /// Directory of instance documents
        instance_dir: PathBuf,
        /// Type tag for descriptors that have none
        parameter_type: String,
    },

    /// Wrap bare-string descriptor types into records.
    #[command(name = "0.9.0-to-0.9.1")]
    V090ToV091 {
        /// Directory of instance documents
        instance_dir: PathBuf,
    },

    /// Run every instance transition from a starting version onward.
    Chain {
        /// Directory of instance documents
        instance_dir: PathBuf,
        /// Schema version the documents are at now
        #[arg(long = "from")]
        from_version: String,
        /// Type tag for transitions that backfill types
        #[arg(long)]
        parameter_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add typed descriptors for referenced variables and rename dashed
    /// parameters.
    #[command(name = "0.7.0-to-0.8.0")]
    V070ToV080 {
        /// Directory of template directories
        template_dir: PathBuf,
        /// Type tag for descriptors that have none
        parameter_type: String,
        /// Configuration format to write back
        #[arg(value_enum)]
        output_format: OutputFormat,
    },

    /// Wrap bare-string descriptor types into records.
    #[command(name = "0.9.0-to-0.9.1")]
    V090ToV091 {
        /// Directory of template directories
        template_dir: PathBuf,
        /// Configuration format to write back
        #[arg(value_enum)]
        output_format: OutputFormat,
    },

    /// Run every template transition from a starting version onward.
    Chain {
        /// Directory of template directories
        template_dir: PathBuf,
        /// Configuration format to write back
        #[arg(value_enum)]
        output_format: OutputFormat,
        /// Schema version the templates are at now
        #[arg(long = "from")]
        from_version: String,
        /// Type tag for transitions that backfill types
        #[arg(long)]
        parameter_type: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Hocon,
}

impl OutputFormat {
    fn codec(self) -> Box<dyn DocumentCodec> {
        match self {
            OutputFormat::Json => Box::new(JsonCodec::pretty()),
            OutputFormat::Hocon => Box::new(HoconCodec),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Instances { command } => match command {
            InstanceCommands::V070ToV080 { instance_dir } => {
                instances::run(&instance_dir, &[Box::new(InstanceV070ToV080)])?;
            }
            InstanceCommands::V070ToV080AddTypes {
                instance_dir,
                parameter_type,
            } => {
                instances::run(
                    &instance_dir,
                    &[Box::new(InstanceV070ToV080AddTypes { parameter_type })],
                )?;
            }
            InstanceCommands::V090ToV091 { instance_dir } => {
                instances::run(&instance_dir, &[Box::new(InstanceV090ToV091)])?;
            }
            InstanceCommands::Chain {
                instance_dir,
                from_version,
                parameter_type,
            } => {
                let chain = instance_chain(&from_version, parameter_type.as_deref())?;
                if chain.is_empty() {
                    bail!("no instance transition starts at or after version {from_version}");
                }
                instances::run(&instance_dir, &chain)?;
            }
        },
        Commands::Templates { command } => match command {
            TemplateCommands::V070ToV080 {
                template_dir,
                parameter_type,
                output_format,
            } => {
                templates::run(
                    &template_dir,
                    &[Box::new(TemplateV070ToV080 { parameter_type })],
                    output_format,
                )?;
            }
            TemplateCommands::V090ToV091 {
                template_dir,
                output_format,
            } => {
                templates::run(&template_dir, &[Box::new(TemplateV090ToV091)], output_format)?;
            }
            TemplateCommands::Chain {
                template_dir,
                output_format,
                from_version,
                parameter_type,
            } => {
                let chain = template_chain(&from_version, parameter_type.as_deref())?;
                if chain.is_empty() {
                    bail!("no template transition starts at or after version {from_version}");
                }
                templates::run(&template_dir, &chain, output_format)?;
            }
        },
        Commands::List => cmd_list(),
    }
    Ok(())
}

fn cmd_list() {
    for info in transition_catalog() {
        let needs_tag = if info.needs_parameter_type {
            " (needs a parameter type)"
        } else {
            ""
        };
        println!(
            "{} {} -> {} [{}]{}",
            info.name.cyan().bold(),
            info.from_version,
            info.to_version,
            info.artifact,
            needs_tag
        );
        println!("  {}", info.description);
    }
}
