//! pptxrender - render .pptx presentations to images from the command line

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};

use pptx_raster::Presentation;
use pptx_raster::render::{OutputFormat, RenderOptions};

#[derive(Parser)]
#[command(
    name = "pptxrender",
    version,
    about = "Render PowerPoint slides to raster images"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every slide to an image file
    Render {
        /// Input .pptx file
        input: PathBuf,

        /// Output width in pixels; height follows the slide aspect
        #[arg(short, long)]
        width: u32,

        /// Output directory (created if missing)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output encoding
        #[arg(short, long, value_enum, default_value = "png")]
        format: Format,

        /// Dots per inch used for font sizing
        #[arg(long, default_value = "96")]
        dpi: f32,

        /// Write a render-report JSON manifest next to the images
        #[arg(long)]
        manifest: bool,
    },
    /// Print presentation metadata
    Info {
        /// Input .pptx file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .parse_filters(&cli.log_level)
        .init();

    let result = match cli.command {
        Commands::Render {
            input,
            width,
            output,
            format,
            dpi,
            manifest,
        } => run_render(&input, width, &output, format, dpi, manifest),
        Commands::Info { input } => run_info(&input),
    };

    if let Err(err) = result {
        eprintln!("✗ Error: {err:#}");
        std::process::exit(1);
    }
}

fn run_render(
    input: &PathBuf,
    width: u32,
    output: &PathBuf,
    format: Format,
    dpi: f32,
    manifest: bool,
) -> anyhow::Result<()> {
    if width == 0 {
        bail!("--width must be positive");
    }
    let pres =
        Presentation::open(input).with_context(|| format!("opening {}", input.display()))?;

    std::fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;

    let (out_format, extension) = match format {
        Format::Png => (OutputFormat::Png, "png"),
        Format::Jpeg => (OutputFormat::Jpeg, "jpg"),
    };
    let options = RenderOptions::new(width).format(out_format).dpi(dpi);
    let report = pres.render(&options);

    for slide in &report.slides {
        if slide.success {
            let path = output.join(format!("slide-{}.{extension}", slide.slide_number));
            std::fs::write(&path, &slide.image_data)
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "✓ slide {} -> {} ({}x{})",
                slide.slide_number,
                path.display(),
                slide.width,
                slide.height
            );
        } else {
            eprintln!(
                "✗ slide {} failed: {}",
                slide.slide_number,
                slide.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if manifest {
        let path = output.join("render-report.json");
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Manifest: {}", path.display());
    }

    if report.successful_slides != report.total_slides {
        bail!(
            "{} of {} slides failed",
            report.total_slides - report.successful_slides,
            report.total_slides
        );
    }
    Ok(())
}

fn run_info(input: &PathBuf) -> anyhow::Result<()> {
    let pres =
        Presentation::open(input).with_context(|| format!("opening {}", input.display()))?;
    let info = pres.info();
    let (cx, cy) = pres.slide_size();

    println!("File: {}", input.display());
    println!("  Slides: {}", pres.slide_count());
    println!(
        "  Slide size: {}x{} EMU ({:.2}\" x {:.2}\")",
        cx,
        cy,
        cx as f64 / 914_400.0,
        cy as f64 / 914_400.0
    );
    if let Some(title) = &info.title {
        println!("  Title: {title}");
    }
    if let Some(creator) = &info.creator {
        println!("  Creator: {creator}");
    }
    if let Some(modified) = &info.modified {
        println!("  Modified: {modified}");
    }
    if let Some(revision) = info.revision {
        println!("  Revision: {revision}");
    }
    Ok(())
}
