use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

use cardmosaic::{
    BackgroundMode, BatchDriver, BatchInputs, BoxClipping, CancelToken, CardIdParserChain,
    DatasetManifest, LayoutMode, MosaicConfig, PixelSize, RunMode, TransformMode,
};

#[derive(Parser, Debug)]
#[command(name = "cardmosaic", version)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate layouts and labels.
    Generate(GenerateArgs),
    /// Draw the boxes of a label file onto its image.
    Annotate(AnnotateArgs),
    /// Write the procedural backdrops into a folder.
    Backgrounds(BackgroundsArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// `all`, or LAYOUT (1-3) [BACKGROUND (0-2) [TRANSFORM (0-1)]].
    #[arg(num_args = 0..=3, value_name = "MODE")]
    modes: Vec<String>,

    /// JSON configuration; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder of card crops.
    #[arg(long)]
    cards: Option<PathBuf>,

    /// Folder of decoy cards for mosaic backdrops.
    #[arg(long)]
    fillers: Option<PathBuf>,

    /// Folder of photos for local backdrops.
    #[arg(long)]
    backgrounds: Option<PathBuf>,

    /// Card manifest CSV (`Set #`, `Name`).
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Dataset output folder.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Images per combination in `all` mode.
    #[arg(long)]
    variations: Option<u32>,

    /// Skip jobs numbered below this (resume an interrupted run).
    #[arg(long)]
    start_index: Option<u64>,

    /// What to do with boxes that leave the canvas.
    #[arg(long, value_enum)]
    clip_boxes: Option<ClipChoice>,

    /// Render jobs in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Layout image.
    #[arg(long)]
    image: PathBuf,

    /// YOLO label file for the image.
    #[arg(long)]
    label: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// `data.yaml` used to name classes in the log.
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BackgroundsArgs {
    /// Output folder.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Seed for the noise backdrop.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClipChoice {
    Keep,
    Clip,
    Drop,
}

impl From<ClipChoice> for BoxClipping {
    fn from(value: ClipChoice) -> Self {
        match value {
            ClipChoice::Keep => BoxClipping::Keep,
            ClipChoice::Clip => BoxClipping::Clip,
            ClipChoice::Drop => BoxClipping::Drop,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Annotate(args) => cmd_annotate(args),
        Command::Backgrounds(args) => cmd_backgrounds(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_run_mode(modes: &[String]) -> anyhow::Result<RunMode> {
    if modes.first().is_some_and(|m| m.eq_ignore_ascii_case("all")) {
        anyhow::ensure!(modes.len() == 1, "`all` takes no further modes");
        return Ok(RunMode::All);
    }
    let index = |pos: usize, default: u8| -> anyhow::Result<u8> {
        match modes.get(pos) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("mode '{raw}' is not a number")),
            None => Ok(default),
        }
    };
    Ok(RunMode::Single {
        layout_mode: LayoutMode::from_index(index(0, 1)?)?,
        background_mode: BackgroundMode::from_index(index(1, 0)?)?,
        transform_mode: TransformMode::from_index(index(2, 0)?)?,
    })
}

fn build_config(args: &GenerateArgs) -> anyhow::Result<MosaicConfig> {
    let mut config = match &args.config {
        Some(path) => MosaicConfig::from_json_path(path)?,
        None => MosaicConfig::default(),
    };
    let paths = &mut config.paths;
    for (flag, slot) in [
        (&args.cards, &mut paths.cards_dir),
        (&args.fillers, &mut paths.fillers_dir),
        (&args.backgrounds, &mut paths.backgrounds_dir),
        (&args.manifest, &mut paths.manifest),
        (&args.out, &mut paths.output_dir),
    ] {
        if let Some(value) = flag {
            *slot = value.clone();
        }
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(v) = args.variations {
        config.variations = v;
    }
    if let Some(i) = args.start_index {
        config.start_index = i;
    }
    if let Some(c) = args.clip_boxes {
        config.clipping = c.into();
    }
    if args.parallel {
        config.threading.parallel = true;
    }
    if args.threads.is_some() {
        config.threading.threads = args.threads;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mode = parse_run_mode(&args.modes)?;
    let config = build_config(&args)?;

    let inputs = BatchInputs::load(&config, &CardIdParserChain::default())?;

    let cancel = CancelToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || {
        handle.cancel();
    })
    .context("install Ctrl+C handler")?;

    let report = BatchDriver::new(&config, &inputs)
        .with_cancel(cancel)
        .run(mode)?;
    report.log();

    if report.cancelled {
        eprintln!(
            "interrupted; resume with --seed {} --start-index {}",
            report.run_seed, report.next_index
        );
    } else {
        eprintln!("wrote {}", config.paths.output_dir.display());
    }
    Ok(())
}

fn cmd_annotate(args: AnnotateArgs) -> anyhow::Result<()> {
    let names = args
        .data
        .as_deref()
        .map(DatasetManifest::read)
        .transpose()?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let summary =
        cardmosaic::render::annotate_file(&args.image, &args.label, &args.out, names.as_ref())?;
    tracing::info!(drawn = summary.drawn, skipped = summary.skipped, "preview rendered");
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_backgrounds(args: BackgroundsArgs) -> anyhow::Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let size = PixelSize::new(args.width, args.height);
    let written = cardmosaic::render::write_backdrops(&args.out, size, &mut rng)?;
    eprintln!("wrote {} backdrops to {}", written.len(), args.out.display());
    Ok(())
}
