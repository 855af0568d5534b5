use clap::{Parser, Subcommand};
use kestrel::{config, output, resolve};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kestrel")]
#[command(about = "Content engine for static sites")]
#[command(long_about = "\
Content engine for static sites

Resolves Markdown + YAML content against content type schemas and runs it
through pipelines, producing JSON render contexts for a template engine.

Project structure:

  site/
  ├── kestrel.toml                 # Project config (optional)
  ├── contents/
  │   ├── [home]/index.md          # Bracketed names never reach the slug → \"\"
  │   ├── blog/
  │   │   ├── [01]hello/index.md   # slug \"blog/hello\", id \"hello\"
  │   │   │   └── assets/          # Listed as the item's assets
  │   │   └── page/{{post.pagination}}/index.md   # Iterator template
  │   └── authors/jane/index.yml   # Data-only item
  ├── types/post.yml               # Content type: paths, properties, relations
  └── pipelines/html.yml           # Filter rules, iterators, scopes, queries

Content type resolution (first match wins):
  explicit `type:` in front matter → `paths` prefix → `default: true` type

Run 'kestrel gen-config' to generate a documented kestrel.toml.")]
#[command(version)]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and resolve the project without writing anything
    Check,
    /// Resolve pipelines and list their contents
    Resolve {
        /// Only resolve this pipeline
        #[arg(long)]
        pipeline: Option<String>,
    },
    /// Write the render contexts of one pipeline as JSON
    Dump {
        /// Pipeline to dump
        #[arg(long)]
        pipeline: String,
        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock kestrel.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.project.display());
            let project = load(&cli)?;
            output::print_project(&project);
            println!();
            let resolution = resolve::resolve(&project, None, now())?;
            output::print_resolution(&resolution, false);
            println!("==> Project is valid");
        }
        Command::Resolve { ref pipeline } => {
            let project = load(&cli)?;
            let resolution = resolve::resolve(&project, pipeline.as_deref(), now())?;
            output::print_resolution(&resolution, true);
        }
        Command::Dump {
            ref pipeline,
            output: ref out,
        } => {
            let project = load(&cli)?;
            let resolution = resolve::resolve(&project, Some(pipeline.as_str()), now())?;
            let resolved = resolution
                .pipeline(pipeline)
                .ok_or_else(|| resolve::ResolveError::UnknownPipeline(pipeline.clone()))?;
            let json = serde_json::to_string_pretty(resolved)?;
            match out {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, json)?;
                    eprintln!("Wrote {} contexts to {}", resolved.contents.len(), path.display());
                }
                None => println!("{}", json),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the project, sizing the rayon pool from its config first.
fn load(cli: &Cli) -> Result<resolve::Project, Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.project)?;
    init_thread_pool(&config.processing);
    Ok(resolve::load_project_with(&cli.project, config)?)
}

/// `RUST_LOG` wins; otherwise warnings, raised by `-v`.
fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("kestrel={level}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}
