//! StackQL Docgen CLI
//!
//! Command-line interface for normalizing request body schemas and
//! generating resource documentation pages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use stackql_docgen::{
    assemble_page, load_document, manifest_yaml, Normalizer, PageOptions, ResourceDescriptor,
    ResourceMetadata, ServiceDocument, StaticMetadata,
};

#[derive(Parser)]
#[command(name = "stackql-docgen")]
#[command(about = "Normalize request body schemas and generate StackQL resource docs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten allOf/anyOf/oneOf and drop read-only properties
    Normalize {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Keep readOnly properties
        #[arg(long)]
        keep_read_only: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the field manifest for a request body schema
    Manifest {
        /// Request body schema file (JSON or YAML)
        schema: PathBuf,

        /// Resource name for the manifest root
        #[arg(long, short)]
        resource: String,

        /// Required parameter, listed ahead of body fields (repeatable)
        #[arg(long = "param", short)]
        params: Vec<String>,
    },

    /// Generate documentation pages for one resource or the whole service
    Page {
        /// StackQL service document (YAML or JSON)
        service_doc: PathBuf,

        /// Resource to document
        #[arg(long, short, required_unless_present = "all", conflicts_with = "all")]
        resource: Option<String>,

        /// Document every resource in the service
        #[arg(long, requires = "out_dir")]
        all: bool,

        /// Directory for `--all` pages, one `<resource>/index.md` each
        #[arg(long, requires = "all")]
        out_dir: Option<PathBuf>,

        /// Captured DESCRIBE/SHOW METHODS rows, keyed by resource name
        #[arg(long)]
        metadata: PathBuf,

        /// Provider name (e.g. google)
        #[arg(long)]
        provider: String,

        /// Service name (default: service document file stem)
        #[arg(long)]
        service: Option<String>,

        /// Emit only the examples, without front matter and tables
        #[arg(long)]
        examples_only: bool,

        /// Output file (stdout if not specified)
        #[arg(long, conflicts_with = "all")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize {
            schema,
            keep_read_only,
            output,
            pretty,
        } => run_normalize(&schema, keep_read_only, output.as_deref(), pretty),

        Commands::Manifest {
            schema,
            resource,
            params,
        } => run_manifest(&schema, &resource, &params),

        Commands::Page {
            service_doc,
            resource,
            all: _,
            out_dir,
            metadata,
            provider,
            service,
            examples_only,
            output,
        } => run_page(PageArgs {
            service_doc,
            resource,
            out_dir,
            metadata,
            provider,
            service,
            examples_only,
            output,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_normalize(
    schema_path: &Path,
    keep_read_only: bool,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), u8> {
    let schema = load(schema_path)?;

    let normalizer = Normalizer::with_document(&schema);
    let normalized = if keep_read_only {
        normalizer.normalize(&schema)
    } else {
        normalizer.canonicalize(&schema)
    };

    let json_output = if pretty {
        serde_json::to_string_pretty(&normalized)
    } else {
        serde_json::to_string(&normalized)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    write_output(output, &json_output)
}

fn run_manifest(schema_path: &Path, resource: &str, params: &[String]) -> Result<(), u8> {
    let schema = load(schema_path)?;
    let body = Normalizer::with_document(&schema).canonicalize(&schema);

    let yaml = manifest_yaml(resource, params, Some(&body)).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    print!("{}", yaml);
    Ok(())
}

struct PageArgs {
    service_doc: PathBuf,
    resource: Option<String>,
    out_dir: Option<PathBuf>,
    metadata: PathBuf,
    provider: String,
    service: Option<String>,
    examples_only: bool,
    output: Option<PathBuf>,
}

fn run_page(args: PageArgs) -> Result<(), u8> {
    let PageArgs {
        service_doc,
        resource,
        out_dir,
        metadata,
        provider,
        service,
        examples_only,
        output,
    } = args;

    let service = service.unwrap_or_else(|| {
        service_doc
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    });

    let document = load(&service_doc)?;
    let catalog = ServiceDocument::from_value(document, provider, service);

    let rows = StaticMetadata::load(&metadata).map_err(|e| {
        eprintln!("Error loading metadata: {}", e);
        e.exit_code() as u8
    })?;
    let options = PageOptions::new().include_tables(!examples_only);

    match (resource, out_dir) {
        (Some(resource), _) => {
            let descriptor = catalog.resource(&resource).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            let content = render_page(&descriptor, &rows, &options);
            write_output(output.as_deref(), &content)
        }
        (None, Some(out_dir)) => {
            let descriptors = catalog.resources().map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            for descriptor in &descriptors {
                let dir = out_dir.join(descriptor.name());
                std::fs::create_dir_all(&dir).map_err(|e| {
                    eprintln!("Error creating {}: {}", dir.display(), e);
                    3u8
                })?;
                let content = render_page(descriptor, &rows, &options);
                write_output(Some(dir.join("index.md").as_path()), &content)?;
            }
            eprintln!("Wrote {} pages to {}", descriptors.len(), out_dir.display());
            Ok(())
        }
        (None, None) => {
            eprintln!("Error: either --resource or --all with --out-dir is required");
            Err(2)
        }
    }
}

fn render_page(descriptor: &ResourceDescriptor, rows: &StaticMetadata, options: &PageOptions) -> String {
    let metadata = ResourceMetadata::gather(rows, descriptor);
    let page = assemble_page(descriptor, &metadata, options);

    for skipped in &page.skipped {
        eprintln!("Warning: skipped {}", skipped);
    }
    page.content
}

fn load(path: &Path) -> Result<Value, u8> {
    load_document(path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), u8> {
    match output {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
