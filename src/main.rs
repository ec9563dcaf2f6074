//! facegen-swap - FaceGen template matching and provisioning

use anyhow::Result;
use clap::{Parser, Subcommand};
use facegen_swap::config::{PatchLists, PatcherConfig, DEFAULT_FLUSH_THRESHOLD};
use facegen_swap::patcher::Patcher;
use facegen_swap::records::FormKey;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facegen-swap")]
#[command(version)]
#[command(about = "Assigns female face templates to NPCs and stages their FaceGen files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Match templates and copy FaceGen for every eligible NPC
    Run {
        /// Load order snapshot (JSON)
        #[arg(short, long, env = "FACEGEN_SNAPSHOT")]
        snapshot: PathBuf,

        /// Game Data directory
        #[arg(short, long, env = "FACEGEN_DATA")]
        data: PathBuf,

        /// Output mod directory for copied FaceGen
        #[arg(short, long)]
        output: PathBuf,

        /// Directory holding races.txt, parts.txt, blacklist.txt and "target mods.txt"
        #[arg(short, long, env = "FACEGEN_LISTS")]
        lists: PathBuf,

        /// Where to write the patched overrides (default: <output>/facegen_swap_patch.json)
        #[arg(long)]
        patch_out: Option<PathBuf>,

        /// Write a JSON diagnostics report
        #[arg(long)]
        report: Option<PathBuf>,

        /// RNG seed for reproducible template selection
        #[arg(long)]
        seed: Option<u64>,

        /// Copy operations queued before each batch flush
        #[arg(long, default_value_t = DEFAULT_FLUSH_THRESHOLD)]
        flush_threshold: usize,

        /// Keyword marking patched NPCs (XXXXXX:Plugin.esp)
        #[arg(long)]
        marker: Option<FormKey>,

        /// Plan copies without writing FaceGen files
        #[arg(long)]
        dry_run: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Print the parsed configuration lists
    Lists {
        /// Directory holding the lists
        #[arg(short, long, env = "FACEGEN_LISTS")]
        lists: PathBuf,
    },

    /// Report FaceGen coverage of the template candidates without matching
    Probe {
        /// Load order snapshot (JSON)
        #[arg(short, long, env = "FACEGEN_SNAPSHOT")]
        snapshot: PathBuf,

        /// Game Data directory
        #[arg(short, long, env = "FACEGEN_DATA")]
        data: PathBuf,

        /// Directory holding the lists
        #[arg(short, long, env = "FACEGEN_LISTS")]
        lists: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(if cli.verbose {
                    "facegen_swap=debug".parse()?
                } else {
                    "facegen_swap=warn".parse()?
                }),
            )
            .init();
    }

    match cli.command {
        Commands::Run {
            snapshot,
            data,
            output,
            lists,
            patch_out,
            report,
            seed,
            flush_threshold,
            marker,
            dry_run,
            no_progress,
        } => {
            let mut config = PatcherConfig::new(snapshot, data, output, lists);
            if let Some(path) = patch_out {
                config.patch_out = path;
            }
            if let Some(marker) = marker {
                config.marker = marker;
            }
            config.report_out = report;
            config.seed = seed;
            config.flush_threshold = flush_threshold;
            config.dry_run = dry_run;
            config.show_progress = !no_progress;

            let patcher = Patcher::new(config)?;
            let (_, report) = patcher.run()?;
            report.print_summary();

            if report.unpatched.is_empty() {
                println!("\nPatching complete!");
            } else {
                println!(
                    "\nPatching complete with {} unpatched NPCs.",
                    report.unpatched.len()
                );
            }
        }

        Commands::Lists { lists } => {
            let lists = PatchLists::load(&lists)?;

            println!("Races ({}):", lists.races().len());
            for race in lists.races() {
                println!("  {}", race);
            }

            println!("\nParts ({}):", lists.parts().len());
            for part in lists.parts().ordered() {
                println!("  {} ({:?})", part.signature(), part);
            }

            let blacklist = lists.blacklist();
            println!("\nBlacklisted plugins ({}):", blacklist.len());
            for plugin in blacklist {
                println!("  {}", plugin);
            }

            match lists.target_mods() {
                Some(mods) => {
                    println!("\nTarget plugins ({}):", mods.len());
                    for plugin in mods {
                        println!("  {}", plugin);
                    }
                }
                None => println!("\nTarget plugins: entire load order"),
            }
        }

        Commands::Probe {
            snapshot,
            data,
            lists,
        } => {
            let output = std::env::temp_dir().join("facegen-swap-probe");
            let config = PatcherConfig::new(snapshot, data, output, lists);
            let patcher = Patcher::new(config)?;

            println!("\nAdmitted templates per race:");
            let stats = patcher.probe();

            println!("\n=== FaceGen Coverage ===");
            println!("Candidates:  {}", stats.candidates);
            println!("Complete:    {}", stats.complete);
            println!("Admitted:    {} across {} races", stats.admitted, stats.races);
        }
    }

    Ok(())
}
