use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use csdat_terrain::normalize;
use csdat_terrain::sector;
use csdat_terrain::session::{SessionConfig, TerrainSession};

#[derive(Parser, Debug)]
#[command(name = "csdat_terrain")]
#[command(about = "Import and export terrain heightmaps from CSDAT sector files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct GridArgs {
    /// Directory containing sd<index>.csdat files
    #[arg(long)]
    dir: PathBuf,

    /// Number of sectors in X direction
    #[arg(long, default_value = "8")]
    sectors_x: usize,

    /// Number of sectors in Y direction
    #[arg(long, default_value = "8")]
    sectors_y: usize,

    /// Side length of each sector's elevation grid
    #[arg(long, default_value = "65")]
    grid_size: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load sector files and write an editable heightmap image
    Import {
        #[command(flatten)]
        grid: GridArgs,

        /// Output heightmap image (8-bit RGBA PNG)
        #[arg(long, default_value = "heightmap.png")]
        output: PathBuf,

        /// Write a session manifest next to the image
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Write an edited heightmap image back into the sector files
    Export {
        #[command(flatten)]
        grid: GridArgs,

        /// The edited heightmap image
        #[arg(long)]
        image: PathBuf,
    },

    /// Scan a sector directory and report its contents
    Info {
        #[command(flatten)]
        grid: GridArgs,
    },
}

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Command::Import {
            grid,
            output,
            manifest,
        } => run_import(&grid, &output, manifest),
        Command::Export { grid, image } => run_export(&grid, &image),
        Command::Info { grid } => run_info(&grid),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn session_config(grid: &GridArgs) -> SessionConfig {
    SessionConfig {
        sectors_x: grid.sectors_x,
        sectors_y: grid.sectors_y,
        grid_size: grid.grid_size,
    }
}

/// Import a sector directory, printing scan warnings along the way.
fn load_session(grid: &GridArgs) -> Result<TerrainSession, Box<dyn Error>> {
    println!("Loading sectors from {}", grid.dir.display());
    let (session, summary) = TerrainSession::import(&grid.dir, session_config(grid))?;

    for (index, shadowed) in &summary.duplicates {
        println!(
            "  warning: duplicate sector index {} ({} shadowed)",
            index,
            shadowed.display()
        );
    }
    for (index, reason) in &summary.skipped {
        println!("  warning: skipped sector {}: {}", index, reason);
    }
    println!(
        "Loaded {} sectors ({}x{} grid, {}x{} samples each)",
        summary.loaded,
        grid.sectors_x,
        grid.sectors_y,
        grid.grid_size,
        grid.grid_size
    );

    Ok(session)
}

fn run_import(
    grid: &GridArgs,
    output: &PathBuf,
    manifest: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let session = load_session(grid)?;

    let mosaic = session.mosaic();
    let (image, _) = normalize::to_display(&mosaic, true);
    normalize::quantize(&image).save(output)?;

    let (width, height) = session.display_dimensions(true);
    match session.elevation_range() {
        Some((min, max)) => println!(
            "Wrote {} ({}x{}), elevation range {:.3} to {:.3}",
            output.display(),
            width,
            height,
            min,
            max
        ),
        None => println!("Wrote {} ({}x{})", output.display(), width, height),
    }

    if let Some(path) = manifest {
        session.manifest().save(&path)?;
        println!("Wrote manifest {}", path.display());
    }

    Ok(())
}

fn run_export(grid: &GridArgs, image_path: &PathBuf) -> Result<(), Box<dyn Error>> {
    // Reload the sector set: export needs the original bytes for the
    // opaque regions and a fresh elevation range, never values cached
    // at import time.
    let session = load_session(grid)?;

    let edited = image::open(image_path)?.to_rgba8();
    let edited = normalize::dequantize(&edited);

    let (min, max) = session
        .elevation_range()
        .ok_or("no sectors loaded, nothing to export against")?;

    println!("Writing edited heightmap back to {}", grid.dir.display());
    let report = session.export_image(&edited, min, max, true)?;

    for (index, reason) in &report.failed {
        println!("  warning: failed to write sector {}: {}", index, reason);
    }
    println!(
        "Export complete: {} written, {} failed",
        report.written,
        report.failed.len()
    );

    Ok(())
}

fn run_info(grid: &GridArgs) -> Result<(), Box<dyn Error>> {
    let session = load_session(grid)?;

    let indices = session.loaded_indices();
    let expected = grid.sectors_x * grid.sectors_y;
    let missing: Vec<usize> = (0..expected).filter(|i| !indices.contains(i)).collect();

    println!("Directory: {}", session.directory().display());
    println!("Sectors loaded: {} of {}", indices.len(), expected);
    if !missing.is_empty() {
        println!("Missing sector indices: {:?}", missing);
    }

    let (width, height) = session.display_dimensions(true);
    println!("Heightmap resolution: {}x{}", width, height);
    println!(
        "Sector file size: at least {} bytes each",
        sector::min_file_len(grid.grid_size)
    );

    match session.elevation_range() {
        Some((min, max)) => println!("Elevation range: {:.3} to {:.3}", min, max),
        None => println!("Elevation range: n/a"),
    }

    Ok(())
}
