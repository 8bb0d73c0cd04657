use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use sha2::Digest as _;

use lottie_flipbook::encode::embed::decode_data_uri;
use lottie_flipbook::export::serialize::{compression_ratio, parse, serialize, serialize_pretty};

#[derive(Parser, Debug)]
#[command(name = "flipbook", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a video into a Lottie JSON document (requires `ffmpeg` on PATH).
    Convert(ConvertArgs),
    /// Validate a Lottie flipbook document and print a summary.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input video file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Output directory; the file gets a timestamped name.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Refuse to replace an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// JSON file with conversion parameters; flags below override it.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Sampling frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Uniform downscale factor in (0, 1].
    #[arg(long)]
    scale: Option<f64>,

    /// Maximum number of frames kept.
    #[arg(long)]
    max_frames: Option<u32>,

    /// Image quality in (0, 1]; 1 embeds frames untouched.
    #[arg(long)]
    quality: Option<f64>,

    /// Embedded image format for lossy quality.
    #[arg(long, value_enum, default_value_t = FormatChoice::Jpeg)]
    format: FormatChoice,

    /// Encode this many frames at a time in parallel.
    #[arg(long)]
    window: Option<usize>,

    /// Override rayon worker threads (windowed mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Document name (`nm`).
    #[arg(long)]
    name: Option<String>,

    /// Keep ffmpeg staging directories for debugging.
    #[arg(long, default_value_t = false)]
    keep_staging: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Lottie JSON document.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn conversion_params(args: &ConvertArgs) -> anyhow::Result<lottie_flipbook::ConversionParams> {
    let mut params = match &args.params {
        Some(p) => lottie_flipbook::ConversionParams::from_json_file(p)?,
        None => lottie_flipbook::ConversionParams::default(),
    };
    if let Some(v) = args.fps {
        params.target_frame_rate = v;
    }
    if let Some(v) = args.scale {
        params.scale_factor = v;
    }
    if let Some(v) = args.max_frames {
        params.max_frames = v;
    }
    if let Some(v) = args.quality {
        params.image_quality = v;
    }
    Ok(params)
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let params = conversion_params(&args)?;
    let video = std::fs::read(&args.in_path)
        .with_context(|| format!("read video '{}'", args.in_path.display()))?;

    let input_name = match args.in_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("input.{ext}"),
        None => "input.mp4".to_string(),
    };
    let source = lottie_flipbook::FfmpegFrameSource::new(lottie_flipbook::FfmpegSourceOpts {
        input_name,
        keep_staging: args.keep_staging,
        ..lottie_flipbook::FfmpegSourceOpts::default()
    });

    let mut opts = lottie_flipbook::ConverterOpts {
        mime: match args.format {
            FormatChoice::Png => lottie_flipbook::MimeKind::Png,
            FormatChoice::Jpeg => lottie_flipbook::MimeKind::Jpeg,
        },
        ..lottie_flipbook::ConverterOpts::default()
    };
    if let Some(window) = args.window {
        opts.threading = lottie_flipbook::EncodeThreading::Windowed {
            window,
            threads: args.threads,
        };
    }
    if let Some(name) = &args.name {
        opts.document_name = name.clone();
    }

    let converter = lottie_flipbook::Converter::new(source, opts);
    let (doc, stats) = converter.run_with_stats(
        &video,
        &params,
        &mut lottie_flipbook::LogProgress,
        &lottie_flipbook::CancelToken::new(),
    )?;

    let mut target = match (&args.out, &args.out_dir) {
        (Some(path), _) => lottie_flipbook::FilePersist::to_path(path),
        (None, Some(dir)) => lottie_flipbook::FilePersist::into_dir(dir),
        (None, None) => lottie_flipbook::FilePersist::into_dir("."),
    }
    .with_overwrite(!args.no_overwrite);
    let report = converter.export(&mut target)?;

    let written = std::fs::read(&report.location)
        .with_context(|| format!("re-read '{}'", report.location.display()))?;
    if stats.truncated() {
        eprintln!(
            "note: kept {} of {} extracted frames",
            stats.frames_kept, stats.frames_extracted
        );
    }
    eprintln!("wrote {}", report.location.display());
    eprintln!(
        "  frames:      {} ({}x{} @ {} fps, {:.2}s)",
        doc.out_point,
        doc.width,
        doc.height,
        lottie_flipbook::format_number(doc.frame_rate),
        doc.duration_secs()
    );
    eprintln!("  size:        {}", human_size(report.bytes));
    eprintln!(
        "  quality:     {}",
        lottie_flipbook::format_number(params.validate()?.image_quality)
    );
    eprintln!(
        "  compression: {:.1}% smaller than indented",
        report.compression_ratio_percent
    );
    eprintln!("  sha256:      {}", sha256_hex(&written));
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let text = read_text(&args.in_path)?;
    let doc = parse(&text).with_context(|| "parse Lottie JSON")?;
    doc.validate()?;

    let compact = serialize(&doc)?;
    let pretty = serialize_pretty(&doc)?;
    println!("name:     {}", doc.name);
    println!("version:  {}", doc.version);
    println!("canvas:   {}x{}", doc.width, doc.height);
    println!(
        "frames:   {} @ {} fps ({:.2}s)",
        doc.frame_count(),
        lottie_flipbook::format_number(doc.frame_rate),
        doc.duration_secs()
    );
    println!("assets:   {}", doc.assets.len());
    let mut mimes: BTreeMap<String, usize> = BTreeMap::new();
    for asset in &doc.assets {
        let (mime, _) = decode_data_uri(&asset.data)
            .with_context(|| format!("asset '{}'", asset.id))?;
        *mimes.entry(mime).or_default() += 1;
    }
    for (mime, count) in &mimes {
        println!("  {mime}: {count}");
    }
    println!("compact:  {}", human_size(compact.len()));
    println!(
        "savings:  {:.1}% vs indented",
        compression_ratio(&pretty, &compact)
    );
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn human_size(bytes: usize) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb >= 1024.0 {
        format!("{:.2} MB ({bytes} bytes)", kb / 1024.0)
    } else {
        format!("{kb:.2} KB ({bytes} bytes)")
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
