use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use reliefkit::{
    init_logging, Config, GenerationMode, Job, JobOutcome, JobQueue, ReliefEnhancement,
    SettingsPersistence, TargetSize,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML or JSON). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an image into a relief-carving program
    Generate {
        /// Source image
        image: PathBuf,

        /// Output program path
        #[arg(short, long)]
        output: PathBuf,

        /// How heights are derived from the image
        #[arg(long, value_enum, default_value_t = ModeArg::Color)]
        mode: ModeArg,

        /// Total depth for binary mode (mm, negative is below the surface)
        #[arg(long, allow_hyphen_values = true)]
        depth: Option<f64>,

        /// Deepest cut for grayscale mode (mm)
        #[arg(long)]
        relief_depth: Option<f64>,

        /// Grayscale pre-processing
        #[arg(long, value_enum, default_value_t = EnhanceArg::Standard)]
        enhance: EnhanceArg,

        /// Output width (mm)
        #[arg(long)]
        width_mm: Option<f64>,

        /// Output height (mm); keeps the aspect ratio when omitted
        #[arg(long)]
        height_mm: Option<f64>,
    },

    /// Report machining statistics for a program
    Analyze {
        /// Program to analyze
        program: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration (format by extension)
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Color,
    Grayscale,
    Binary,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EnhanceArg {
    None,
    Standard,
    Inverted,
    Aggressive,
}

impl From<EnhanceArg> for ReliefEnhancement {
    fn from(value: EnhanceArg) -> Self {
        match value {
            EnhanceArg::None => ReliefEnhancement::None,
            EnhanceArg::Standard => ReliefEnhancement::Standard,
            EnhanceArg::Inverted => ReliefEnhancement::InvertedRelief,
            EnhanceArg::Aggressive => ReliefEnhancement::AggressiveContrast,
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::load_or_default(path).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { path } = &args.command {
        let persistence = SettingsPersistence::new();
        persistence
            .save_to_file(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.log)?;
    tracing::debug!("reliefkit {} ({})", reliefkit::VERSION, reliefkit::BUILD_DATE);

    let job = match args.command {
        Command::Generate {
            image,
            output,
            mode,
            depth,
            relief_depth,
            enhance,
            width_mm,
            height_mm,
        } => {
            let mode = match mode {
                ModeArg::Color => GenerationMode::Color,
                ModeArg::Grayscale => GenerationMode::Grayscale {
                    max_depth: relief_depth.unwrap_or(config.generator.relief_depth),
                    enhancement: enhance.into(),
                },
                ModeArg::Binary => GenerationMode::Binary {
                    total_depth: depth.unwrap_or(config.generator.total_depth),
                },
            };
            Job::Generate {
                image,
                output: Some(output),
                mode,
                size: TargetSize::new(width_mm, height_mm),
            }
        }
        Command::Analyze { program, json } => {
            let ticket = JobQueue::new(config, 1).submit(Job::Analyze { program });
            return match ticket.wait().await? {
                JobOutcome::Analyzed(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print!("{}", report);
                    }
                    Ok(())
                }
                JobOutcome::Failed(reason) => Err(anyhow::anyhow!(reason)),
                JobOutcome::Generated { .. } => Err(anyhow::anyhow!("unexpected job result")),
            };
        }
        Command::InitConfig { .. } => return Ok(()),
    };

    let ticket = JobQueue::new(config, 1).submit(job);
    match ticket.wait().await? {
        JobOutcome::Generated { plan, output } => {
            let target = output
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "Wrote {} ({} cuts, {} rapids, {} pass(es))",
                target,
                plan.cut_count(),
                plan.rapid_count(),
                plan.passes()
            );
            Ok(())
        }
        JobOutcome::Failed(reason) => Err(anyhow::anyhow!(reason)),
        JobOutcome::Analyzed(_) => Err(anyhow::anyhow!("unexpected job result")),
    }
}
