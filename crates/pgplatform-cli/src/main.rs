//! pgplatform CLI
//!
//! Prints PostgreSQL DDL and catalog queries for JSON table descriptions
//! and diffs. SQL goes to stdout, logs to stderr.

mod input;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use pgplatform_core::{
    CatalogObject, ColumnDescriptor, PostgresPlatform, TableDescriptor, TableDiff,
};

use crate::input::{load_config, read_json, render_statements};

/// PostgreSQL DDL compiler and catalog query builder.
#[derive(Parser)]
#[command(name = "pgplatform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON platform configuration file.
    #[arg(short, long, env = "PGPLATFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Encode boolean literals as 'true'/'false' (otherwise 1/0).
    #[arg(long, env = "PGPLATFORM_BOOLEAN_STRINGS")]
    boolean_strings: Option<bool>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a table diff into ALTER statements.
    Alter {
        /// JSON file holding the table diff.
        #[arg(short, long)]
        diff: PathBuf,
    },

    /// Generate the statements creating a table.
    CreateTable {
        /// JSON file holding the table description.
        #[arg(short, long)]
        table: PathBuf,
    },

    /// Print a catalog introspection query.
    Catalog {
        /// Kind of object to list.
        #[arg(value_enum)]
        object: ObjectArg,

        /// Table for column, index, constraint and foreign key listings.
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Show the logical type of a native type spelling.
    MapType {
        /// Native spelling, e.g. `int4` or `character varying(20)`.
        spelling: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObjectArg {
    Databases,
    Namespaces,
    Sequences,
    Tables,
    Views,
    Columns,
    Indexes,
    Constraints,
    ForeignKeys,
}

impl From<ObjectArg> for CatalogObject {
    fn from(arg: ObjectArg) -> Self {
        match arg {
            ObjectArg::Databases => Self::Databases,
            ObjectArg::Namespaces => Self::Namespaces,
            ObjectArg::Sequences => Self::Sequences,
            ObjectArg::Tables => Self::Tables,
            ObjectArg::Views => Self::Views,
            ObjectArg::Columns => Self::Columns,
            ObjectArg::Indexes => Self::Indexes,
            ObjectArg::Constraints => Self::Constraints,
            ObjectArg::ForeignKeys => Self::ForeignKeys,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref(), cli.boolean_strings)?;
    let platform = PostgresPlatform::new(config)?;

    match cli.command {
        Commands::Alter { diff } => {
            let diff: TableDiff = read_json(&diff)?;
            if diff.is_empty() {
                info!(table = %diff.name, "Diff carries no changes.");
            }
            let sql = platform.alter_table_sql(&diff)?;
            print!("{}", render_statements(&sql));
        }

        Commands::CreateTable { table } => {
            let table: TableDescriptor = read_json(&table)?;
            let sql = platform.create_table_sql(&table)?;
            print!("{}", render_statements(&sql));
        }

        Commands::Catalog { object, table } => {
            let sql = platform.catalog_query(CatalogObject::from(object), table.as_deref())?;
            print!("{}", render_statements(&[sql]));
        }

        Commands::MapType { spelling } => {
            let logical = platform.logical_type(&spelling)?;
            debug!(%spelling, %logical, "mapped native spelling");
            let declaration = platform.type_declaration(&ColumnDescriptor::new("c", logical));
            println!("{logical}\t{declaration}");
        }
    }

    Ok(())
}
