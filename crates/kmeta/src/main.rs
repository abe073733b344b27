use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tempfile::NamedTempFile;
use kmeta_core::render::{PlaceholderRenderer, Template, TemplateRenderer, GENDRIVER};
use kmeta_core::schema::schema;
use kmeta_core::{KmetaResult, MetadataBuilder, SymbolDump};
use kmeta_utils::{debug, info, init_logging_with_level, LogFormat, LogLevel};

/// Generates kernel introspection driver headers from Windows kernel symbol dumps.
#[derive(Parser, Debug)]
#[command(name = "kmeta")]
#[command(version)]
#[command(about = "Generates kernel introspection driver headers from Windows kernel symbol dumps", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty or json); overrides KMETA_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Also write logs to a dated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Resolve a symbol dump and render a header from it
    Generate
    {
        /// Path to the JSON symbol dump of the kernel
        dump: PathBuf,
        /// Built-in template name or path to a template file
        #[arg(short, long, default_value = GENDRIVER)]
        template: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved metadata table
    Inspect
    {
        /// Path to the JSON symbol dump of the kernel
        dump: PathBuf,
        /// Show the table before fallback rules and version extensions run
        #[arg(long, default_value_t = false)]
        raw: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = InspectFormat::Table)]
        format: InspectFormat,
    },
    /// List every key a record can contain and when it is present
    Schema,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InspectFormat
{
    Table,
    Json,
}

fn main()
{
    let cli = Cli::parse();

    let format = cli.log_format.unwrap_or_else(LogFormat::from_env);
    let logging = match init_logging_with_level(cli.log_level, format, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = logging.log_file() {
        debug!("Logging to {}", path.display());
    }

    let writes_output = matches!(cli.command, Commands::Generate { .. });
    let result = run_command(cli.command);
    drop(logging);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if writes_output {
            eprintln!("No output was written.");
        }
        process::exit(1);
    }
}

fn run_command(command: Commands) -> KmetaResult<()>
{
    match command {
        Commands::Generate {
            dump,
            template,
            output,
        } => {
            info!("Generating {} from {}", template, dump.display());
            let dump = SymbolDump::from_path(&dump)?;
            let record = MetadataBuilder::new(&dump).build()?;

            let template = Template::load(&template)?;
            let rendered = PlaceholderRenderer::new().render(&template, &record)?;

            match output {
                Some(path) => {
                    write_output(&path, &rendered)?;
                    info!("Wrote {}", path.display());
                }
                None => io::stdout().write_all(rendered.as_bytes())?,
            }
            Ok(())
        }
        Commands::Inspect { dump, raw, format } => {
            let dump = SymbolDump::from_path(&dump)?;
            let builder = MetadataBuilder::new(&dump);
            let record = if raw { builder.build_base()? } else { builder.build()? };

            match format {
                InspectFormat::Table => {
                    if raw {
                        println!("# before fallback rules and version extensions");
                    }
                    print!("{record}");
                }
                InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
            }
            Ok(())
        }
        Commands::Schema => {
            print_schema();
            Ok(())
        }
    }
}

/// Write through a temporary file in the target directory so a failed write leaves nothing behind
fn write_output(path: &Path, contents: &str) -> KmetaResult<()>
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn print_schema()
{
    let entries = schema();
    let key_width = entries.iter().map(|e| e.key.len()).max().unwrap_or_default();
    let source_width = entries.iter().map(|e| e.source.len()).max().unwrap_or_default();

    for entry in entries {
        println!(
            "{:<key_width$}  {:<source_width$}  {}",
            entry.key, entry.source, entry.presence
        );
    }
}
