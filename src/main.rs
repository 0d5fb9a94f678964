use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::Level;

use table_filters::generator::{ModelCatalog, ModelGenerator};
use table_filters::installer::{AutoConfirm, InstallConfig, Installer, PromptConfirm, StepOutcome};
use table_filters::{
    DynamicResource, FieldKind, FilterConfig, FilterableResource, FormSchema, Params, RecordSet,
    SearchForm, SqlQuery,
};

/// Column filters for list pages: apply, inspect, scaffold and install.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file (param key, debounce delay, highlight class)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a JSON array of records with a query string
    Filter {
        /// JSON file holding an array of objects
        #[arg(long)]
        records: PathBuf,
        /// Comma separated allow-list of filterable columns
        #[arg(long, value_delimiter = ',')]
        allow: Vec<String>,
        /// Query string, e.g. 'filters[name]=al'
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Print the SQL a query string produces for a table
    Sql {
        #[arg(long)]
        table: String,
        #[arg(long, value_delimiter = ',')]
        allow: Vec<String>,
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Show the search form built from a query string
    Form {
        #[arg(long, default_value = "")]
        query: String,
        /// Extra text fields the form should know about
        #[arg(long)]
        declare: Vec<String>,
    },
    /// Write draft controller and view code for a model
    Generate {
        #[arg(long)]
        model: String,
        #[arg(long)]
        parent: String,
        /// `name:form_helper`, repeatable
        #[arg(long = "field")]
        fields: Vec<String>,
        /// JSON catalog of models and their columns
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        app_root: PathBuf,
    },
    /// Copy the bundled templates into an application
    Install {
        #[arg(long, default_value = ".")]
        app_root: PathBuf,
        /// JSON file overriding the controller patch location
        #[arg(long)]
        install_config: Option<PathBuf>,
        /// Overwrite existing files without asking
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> table_filters::Result<()> {
    let config = match &args.config {
        Some(path) => FilterConfig::from_path(path)?,
        None => FilterConfig::default(),
    };

    match args.command {
        Command::Filter { records, allow, query } => {
            let raw = std::fs::read_to_string(&records)
                .map_err(|e| table_filters::FilterError::Io { path: records, source: e })?;
            let set = RecordSet::from_json(serde_json::from_str(&raw)?)?;
            let resource = DynamicResource::new("records", allow);
            let out = resource.before_index(set, &Params::from_query(&query), &config);
            print_json(&out.into_value())
        }
        Command::Sql { table, allow, query } => {
            let resource = DynamicResource::new(table.clone(), allow);
            let sql = resource.before_index(SqlQuery::new(table), &Params::from_query(&query), &config);
            print_json(&json!({"sql": sql.to_sql(), "params": sql.params()}))
        }
        Command::Form { query, declare } => {
            let params = Params::from_query(&query);
            let schema = declare
                .into_iter()
                .fold(FormSchema::new(), |schema, name| schema.with_field(name, FieldKind::Text));
            let form = match params.nested(&config.param_key) {
                Some(submitted) => SearchForm::from_params(schema, submitted),
                None => SearchForm::with_schema(schema, Vec::<(String, String)>::new()),
            };
            print_json(&form.to_json())
        }
        Command::Generate { model, parent, fields, catalog, app_root } => {
            let catalog = match catalog {
                Some(path) => ModelCatalog::from_path(&path)?,
                None => ModelCatalog::default(),
            };
            let report = ModelGenerator::new(model, parent, app_root)
                .with_field_specs(fields)
                .with_catalog(catalog)
                .with_config(config)
                .generate()?;
            for warning in &report.warnings {
                println!("Warning: {warning}");
            }
            println!("  Controller code: {}", report.controller_path.display());
            println!("  View code: {}", report.view_path.display());
            if !report.custom_partial_fields.is_empty() {
                println!("  Custom partial needed for: {}", report.custom_partial_fields.join(", "));
            }
            println!();
            println!("Integration instructions:");
            for line in &report.instructions {
                println!("{line}");
            }
            Ok(())
        }
        Command::Install { app_root, install_config, yes } => {
            let install_config = match install_config {
                Some(path) => InstallConfig::from_path(&path)?,
                None => InstallConfig::default(),
            };
            let report = if yes {
                Installer::new(app_root, AutoConfirm(true))
                    .with_config(install_config)
                    .install()
            } else {
                let prompt = PromptConfirm::new(BufReader::new(io::stdin()), io::stdout());
                Installer::new(app_root, prompt).with_config(install_config).install()
            };
            for (step, outcome) in &report.steps {
                match outcome {
                    StepOutcome::Copied(path) => println!("Copied {step} to {}", path.display()),
                    StepOutcome::Declined(path) => println!("Skipped {step}: kept {}", path.display()),
                    StepOutcome::Patched(path) => println!("Patched {}", path.display()),
                    StepOutcome::AlreadyPatched(path) => {
                        println!("{} already includes the filters, skipping", path.display())
                    }
                    StepOutcome::Failed(msg) => println!("Could not install {step}: {msg}"),
                }
            }
            println!("Installation complete.");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> table_filters::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
