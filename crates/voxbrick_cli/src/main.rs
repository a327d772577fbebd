//! voxbrick: convert dense volumes into multiresolution AMR bricks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use voxbrick_core::{
    load_config, load_raw, make_amr_with_context, read_amr, write_amr, AmrConfig, BuildContext,
    DenseGrid, GravitySpheres, PaddingPolicy, VoxelType,
};
use voxbrick_math::IVec3;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Sample type of a RAW input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SampleType {
    #[value(aliases = ["byte", "uint8"])]
    Uchar,
    #[value(alias = "uint16")]
    Ushort,
    #[value(alias = "float32")]
    Float,
    #[value(alias = "float64")]
    Double,
}

impl From<SampleType> for VoxelType {
    fn from(sample: SampleType) -> Self {
        match sample {
            SampleType::Uchar => VoxelType::UChar,
            SampleType::Ushort => VoxelType::UShort,
            SampleType::Float => VoxelType::Float,
            SampleType::Double => VoxelType::Double,
        }
    }
}

#[derive(Parser)]
#[command(name = "voxbrick")]
#[command(version)]
#[command(about = "Build multiresolution (AMR) brick hierarchies from dense volumes")]
#[command(long_about = "
Creates an adaptive mesh refinement (AMR) representation of structured volume data.

The input volume is used as the finest refinement level. Every coarser level is
the block average of the level above it. Blocks whose values vary by no more than
the threshold are dropped from all but the coarsest level, simulating the regions
an adaptive simulation would not have refined.

Example usage:
  voxbrick convert volume.raw --voxel-type float --dims 256 256 256 --output volume_amr
  voxbrick generate --dims 128 --output spheres
  voxbrick inspect volume_amr
")]
struct Cli {
    /// Set logging level (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a RAW volume to AMR files
    Convert {
        /// Structured volume in binary brick-of-data format
        input: PathBuf,

        /// Sample type of the RAW file
        #[arg(long, value_enum, ignore_case = true, default_value_t = SampleType::Float)]
        voxel_type: SampleType,

        /// Grid dimensions of the input volume
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
        dims: Vec<i32>,

        #[command(flatten)]
        amr: AmrArgs,

        /// Basename for the .info, .data and .osp output files
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a gravity-spheres test volume and convert it to AMR files
    Generate {
        /// Edge length of the cubic volume
        #[arg(long, default_value_t = 128)]
        dims: i32,

        /// Number of point masses
        #[arg(long, default_value_t = 10)]
        points: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[command(flatten)]
        amr: AmrArgs,

        /// Basename for the .info, .data and .osp output files
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print a summary of existing AMR files
    Inspect {
        /// Basename of the .info/.data pair
        base: PathBuf,
    },
}

/// AMR parameters shared by `convert` and `generate`.
#[derive(Args)]
struct AmrArgs {
    /// JSON file with AMR parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of refinement levels to simulate
    #[arg(long)]
    levels: Option<u32>,

    /// Edge length of every block, in cells
    #[arg(long)]
    block_size: Option<u32>,

    /// Cell count ratio between adjacent levels
    #[arg(long)]
    refinement: Option<u32>,

    /// Variance threshold for keeping a block above level 0
    #[arg(long)]
    threshold: Option<f32>,

    /// Zero-pad inputs that are not a multiple of the finest level size
    #[arg(long)]
    pad: bool,
}

impl AmrArgs {
    /// Start from `base` (or the config file), then apply flag overrides.
    fn resolve(&self, base: AmrConfig) -> Result<AmrConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => base,
        };

        if let Some(levels) = self.levels {
            config.num_levels = levels;
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(refinement) = self.refinement {
            config.refinement_factor = refinement;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if self.pad {
            config.padding = PaddingPolicy::ZeroFill;
        }

        config.validate().context("Invalid AMR parameters")?;
        Ok(config)
    }
}

fn build_and_write(grid: &DenseGrid, config: &AmrConfig, output: &Path) -> Result<()> {
    let ctx = BuildContext::new();
    let (mut volume, report) =
        make_amr_with_context(grid, config, &ctx).context("Failed to build AMR hierarchy")?;
    volume.sort_canonical();

    log::info!(
        "Kept {} bricks, removed {} across {} levels",
        report.total_kept(),
        report.total_pruned(),
        report.levels.len()
    );

    write_amr(output, &volume)
        .with_context(|| format!("Failed to write AMR files for {}", output.display()))?;
    Ok(())
}

fn inspect(base: &Path) -> Result<()> {
    let volume =
        read_amr(base).with_context(|| format!("Failed to read AMR files {}", base.display()))?;
    let range = volume.value_range();

    println!("=== AMR volume: {} ===", base.display());
    println!("Bricks: {}", volume.len());
    println!("Brick size: {}", volume.block_size);
    println!("Levels: {}", volume.num_levels());
    if !range.is_empty() {
        println!("Value range: [{}, {}]", range.lower, range.upper);
    }

    println!("\n--- Levels ---");
    for (level, width) in volume.cell_widths.iter().enumerate() {
        println!(
            "  [{}] cell width {} - {} bricks",
            level,
            width,
            volume.count_at_level(level as i32)
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = cli.log_level {
        logger.filter_level(level.into());
    } else if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    match cli.command {
        Commands::Convert {
            input,
            voxel_type,
            dims,
            amr,
            output,
        } => {
            let voxel_type = VoxelType::from(voxel_type);
            let dims = IVec3::new(dims[0], dims[1], dims[2]);
            let config = amr.resolve(AmrConfig::default())?;

            log::info!("Converting {} ({} {})", input.display(), dims, voxel_type);
            let grid = load_raw(&input, voxel_type, dims)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            build_and_write(&grid, &config, &output)?;
        }
        Commands::Generate {
            dims,
            points,
            seed,
            amr,
            output,
        } => {
            let config = amr.resolve(GravitySpheres::amr_config())?;
            let spheres = GravitySpheres::new(IVec3::splat(dims), points, seed);

            log::info!(
                "Generating gravity spheres volume {}^3 with {} points",
                dims,
                points
            );
            let grid = spheres
                .generate()
                .context("Failed to generate volume")?;
            build_and_write(&grid, &config, &output)?;
        }
        Commands::Inspect { base } => inspect(&base)?,
    }

    Ok(())
}
