use clap::{ArgAction, Parser, Subcommand};
use kdzkit::archive::{ExtractOptions, KdzArchive, DEFAULT_OUTPUT_DIR};
use kdzkit::extract::DEFAULT_CHUNK_SIZE;
use kdzkit::KdzError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kdz", version, about = "LG KDZ firmware container extractor")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the partitions in a KDZ file
    List {
        input: PathBuf,
        /// Print the partition list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract all partitions, or a single one with --single
    Extract {
        input: PathBuf,
        #[arg(short = 'd', long = "dir", visible_alias = "out", short_alias = 'o',
              default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
        /// Extract only the partition with this index
        #[arg(short, long)]
        single: Option<usize>,
        /// Copy buffer size in KiB
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE / 1024)]
        chunk_size: usize,
        /// Open one read handle per partition and extract concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// Show container layout details
    Info {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let kdz = KdzArchive::open(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(kdz.list())?);
                return Ok(());
            }
            println!("KDZ Partition List (format {})", kdz.version());
            println!("{}", "=".repeat(40));
            for (idx, p) in kdz.list().iter().enumerate() {
                println!("{idx:2} : {} ({} bytes)", p.name, p.length);
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, output_dir, single, chunk_size, parallel } => {
            let mut kdz = KdzArchive::open(&input)?;
            let opts = ExtractOptions {
                output_dir,
                chunk_size: chunk_size.max(1) * 1024,
                parallel,
                ..ExtractOptions::default()
            };

            match single {
                Some(index) => {
                    println!("Extracting single partition from {} file", kdz.version());
                    match kdz.extract_single(index, &opts) {
                        Ok(path) => println!("  extracted  {}", path.display()),
                        Err(KdzError::IndexOutOfRange { .. }) => {
                            eprintln!("Segment {index} is out of range!");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                None => {
                    println!("Extracting all partitions from {} file", kdz.version());
                    let summary = kdz.extract_all(&opts)?;
                    for path in &summary.payloads {
                        println!("  extracted  {}", path.display());
                    }
                    if let Some(path) = &summary.extras {
                        println!("  extras     {}", path.display());
                    }
                    if let Some(path) = &summary.manifest {
                        println!("  manifest   {}", path.display());
                    }
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let kdz  = KdzArchive::open(&input)?;
            let meta = kdz.metadata();

            println!("── KDZ Container ────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Format         {}", kdz.version());
            println!("  Magic          {}", hex::encode(kdz.version().magic()));
            println!("  Partitions     {}", kdz.list().len());
            println!("  Terminator     {:?}", kdz.reader().terminator());
            println!("  Header end     {} B", meta.header_end);
            println!("  Data start     {} B", meta.data_start);
            match meta.extra {
                Some(span) => println!("  Extra data     {}..{} ({} B)", span.start, span.end, span.len()),
                None       => println!("  Extra data     none"),
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "kdzkit=warn",
        1 => "kdzkit=info",
        _ => "kdzkit=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
