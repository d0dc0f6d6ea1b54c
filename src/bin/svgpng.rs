use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "svgpng", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate PNG derivatives of an SVG at every configured size.
    Generate(GenerateArgs),
    /// Print the resolved box for one size against a fullsize raster.
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Size catalog JSON (`{"name": {"width": W, "height": H, "crop": bool}, ...}`).
    /// Defaults to the stock thumbnail/medium/medium_large/large sizes.
    #[arg(long)]
    sizes: Option<PathBuf>,

    /// Output directory. Defaults to the directory of the input.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also write attachment metadata JSON to this path.
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Refuse to replace existing output files.
    #[arg(long)]
    no_overwrite: bool,

    /// Load system fonts for `<text>` rendering.
    #[arg(long)]
    system_fonts: bool,

    /// Rasterizer backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Resvg)]
    backend: BackendChoice,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Target width (0 = unconstrained).
    #[arg(long, default_value_t = 0)]
    width: u32,

    /// Target height (0 = unconstrained).
    #[arg(long, default_value_t = 0)]
    height: u32,

    /// Fill the box and crop the excess instead of fitting inside it.
    #[arg(long)]
    crop: bool,

    /// Fullsize raster width.
    #[arg(long)]
    full_width: u32,

    /// Fullsize raster height.
    #[arg(long)]
    full_height: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Resvg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Resolve(args) => cmd_resolve(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("svg") => svgpng::SVG_MIME,
        Some("png") => svgpng::PNG_MIME,
        _ => "application/octet-stream",
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mime = mime_for_path(&args.in_path);
    if !svgpng::is_svg_mime(mime) {
        anyhow::bail!(
            "'{}' is not an SVG (detected {mime})",
            args.in_path.display()
        );
    }

    let sizes = match &args.sizes {
        Some(path) => svgpng::SizeCatalog::from_json_file(path)?,
        None => svgpng::SizeCatalog::defaults(),
    };

    let settings = svgpng::RasterSettings {
        clear_rgba: None,
        system_fonts: args.system_fonts,
    };
    let kind = match args.backend {
        BackendChoice::Resvg => svgpng::RasterizerKind::Resvg,
    };
    let generator = svgpng::DerivativeGenerator::with_kind(kind, &settings)?;

    let source = svgpng::VectorDocument::from_path(&args.in_path)?;
    let mut store = match &args.out_dir {
        Some(dir) => svgpng::FsArtifactStore::new(dir),
        None => svgpng::FsArtifactStore::beside(&args.in_path),
    }
    .with_overwrite(!args.no_overwrite);

    let result = generator
        .generate(&source, &sizes, &mut store)
        .with_context(|| format!("generate derivatives of '{}'", args.in_path.display()))?;

    if let Some(meta_path) = &args.metadata {
        let meta = svgpng::AttachmentMetadata::from_generation(&result, source.base())?;
        if let Some(parent) = meta_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create metadata dir '{}'", parent.display()))?;
        }
        let f = std::fs::File::create(meta_path)
            .with_context(|| format!("create '{}'", meta_path.display()))?;
        serde_json::to_writer_pretty(f, &meta)
            .with_context(|| format!("write metadata '{}'", meta_path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    for name in &result.unscaled {
        eprintln!("warning: '{name}' was rasterized unscaled (source has no usable width/height)");
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let spec = svgpng::SizeSpec::new(args.width, args.height, args.crop);
    let fullsize = svgpng::Dims::new(args.full_width, args.full_height);
    let resolved = svgpng::resolve(&spec, fullsize)?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
