use clap::{Parser, ValueEnum};
use fire_spread_core::{
    Biome, EnergyDistribution, FireSpreadError, Grid, Landscape, LandscapeConfig, Pixel,
    PropagationBackend,
};
use tracing_subscriber::EnvFilter;

/// Landscape preset used to sample fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// One biome, every pixel flammable
    Uniform,
    /// Developed core surrounded by grass and forest
    Wui,
}

/// Headless wildfire spread demo
#[derive(Parser, Debug)]
#[command(name = "fire-spread-demo")]
#[command(about = "Energy-kernel wildfire spread demo", long_about = None)]
struct Args {
    /// Landscape height in pixels
    #[arg(long, default_value_t = 200)]
    height: usize,

    /// Landscape width in pixels
    #[arg(long, default_value_t = 200)]
    width: usize,

    /// Field sampling preset
    #[arg(short, long, value_enum, default_value_t = Preset::Wui)]
    preset: Preset,

    /// Radius of the developed core in pixels (wui preset)
    #[arg(long, default_value_t = 40.0)]
    urban_radius: f64,

    /// Activation energy for the uniform preset
    #[arg(long, default_value_t = 0.05)]
    activation: f64,

    /// Released energy for the uniform preset
    #[arg(long, default_value_t = 1.0)]
    release: f64,

    /// RNG seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Burn generations with the Rayon backend
    #[arg(long)]
    parallel: bool,

    /// Ignition row (default: landscape centre)
    #[arg(long)]
    ignite_y: Option<usize>,

    /// Ignition column (default: landscape centre)
    #[arg(long)]
    ignite_x: Option<usize>,

    /// Number of flammable pixels to ignite around the ignition point
    #[arg(short = 'i', long, default_value_t = 4)]
    ignite_count: usize,

    /// Report interval in iterations
    #[arg(short, long, default_value_t = 10)]
    report_interval: usize,

    /// Run validation scenarios
    #[arg(short, long)]
    validate: bool,
}

/// Developed core (biome 0) around the map centre, wildland (biome 1) outside
fn synthetic_biomes(height: usize, width: usize, urban_radius: f64) -> Grid<Biome> {
    let cy = height as f64 / 2.0;
    let cx = width as f64 / 2.0;
    Grid::from_fn(height, width, |p| {
        let dy = p.y as f64 - cy;
        let dx = p.x as f64 - cx;
        Biome::from((dy * dy + dx * dx).sqrt() > urban_radius)
    })
}

fn main() -> Result<(), FireSpreadError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("=== Fire Spread Demo ===\n");

    let mut config = match args.preset {
        Preset::Uniform => LandscapeConfig::uniform(
            EnergyDistribution::Constant {
                value: args.activation,
            },
            EnergyDistribution::Constant {
                value: args.release,
            },
        ),
        Preset::Wui => LandscapeConfig::wildland_urban_interface(),
    };
    config.seed = args.seed;
    if args.parallel {
        config.backend = PropagationBackend::Parallel;
    }

    let biomes = match args.preset {
        Preset::Uniform => Grid::new(args.height, args.width),
        Preset::Wui => synthetic_biomes(args.height, args.width, args.urban_radius),
    };

    let mut landscape = Landscape::from_config(biomes, &config)?;
    println!(
        "Created {}x{} landscape ({:?} preset, {:?} backend)",
        args.height, args.width, args.preset, config.backend
    );

    landscape.reset()?;
    let total = args.height * args.width;
    let stats = landscape.stats();
    println!(
        "Inflammable pixels: {} of {} ({:.1}%)",
        stats.inflammable,
        total,
        100.0 * stats.inflammable as f64 / total.max(1) as f64
    );

    let point = Pixel::new(
        args.ignite_y.unwrap_or(args.height / 2),
        args.ignite_x.unwrap_or(args.width / 2),
    );
    let ignited = landscape.ignite_near(point, args.ignite_count)?;
    println!(
        "\nIgnited {} pixel(s) near ({}, {})...\n",
        ignited, point.y, point.x
    );

    println!("Iteration | Burning | Burned | Generation");
    println!("----------|---------|--------|-----------");

    while landscape.iterate()? {
        if landscape.iterations() % args.report_interval.max(1) == 0 {
            let stats = landscape.stats();
            println!(
                "{:9} | {:7} | {:6} | {:10}",
                stats.iterations, stats.pending, stats.burned, stats.generations
            );
        }
    }

    let stats = landscape.stats();
    println!("\n=== Simulation Complete ===");
    println!("Iterations: {}", stats.iterations);
    println!("Generations: {}", stats.generations);
    println!(
        "Burned pixels: {} ({:.1}% of flammable area)",
        stats.burned,
        100.0 * stats.burned_fraction(total)
    );
    let mut by_landcover: Vec<_> = stats.burned_by_landcover.iter().collect();
    by_landcover.sort();
    for (landcover, count) in by_landcover {
        println!("   Landcover {}: {} pixels", landcover, count);
    }

    if args.validate {
        run_validation_tests()?;
    }
    Ok(())
}

fn constant(value: f64) -> EnergyDistribution {
    EnergyDistribution::Constant { value }
}

fn run_validation_tests() -> Result<(), FireSpreadError> {
    println!("\n=== Running Validation Tests ===\n");

    // Test 1: nothing spreads past a very high activation energy
    println!("Test 1: High Activation Containment");
    let config = LandscapeConfig::uniform(constant(1000.0), constant(1.0)).with_seed(0);
    let mut landscape = Landscape::from_config(Grid::new(5, 5), &config)?;
    let stats = landscape.run(&[Pixel::new(2, 2)])?;
    println!("  Burned pixels: {}", stats.burned);
    if stats.burned == 1 {
        println!("  PASS: Only the ignition point burned");
    } else {
        println!("  FAIL: Expected a single burned pixel");
    }

    // Test 2: zero activation burns the whole 5x5 in generation 2
    println!("\nTest 2: Single Generation Burn-Out");
    let config = LandscapeConfig::uniform(constant(0.0), constant(1.0)).with_seed(0);
    let mut landscape = Landscape::from_config(Grid::new(5, 5), &config)?;
    let stats = landscape.run(&[Pixel::new(2, 2)])?;
    let second = landscape.generation().count(|g| g == 2);
    println!("  Generation 2 pixels: {}", second);
    if second == 24 && stats.generations == 2 {
        println!("  PASS: Every neighbour ignited in one generation");
    } else {
        println!("  FAIL: Expected 24 pixels in generation 2");
    }

    // Test 3: parallel backend reproduces the sequential run
    println!("\nTest 3: Backend Equivalence");
    let biomes = synthetic_biomes(64, 64, 12.0);
    let config = LandscapeConfig::wildland_urban_interface().with_seed(7);
    let mut sequential = Landscape::from_config(biomes.clone(), &config)?;
    let mut parallel = Landscape::from_config(
        biomes,
        &config.with_backend(PropagationBackend::Parallel),
    )?;
    let ignition = [Pixel::new(2, 2), Pixel::new(60, 60)];
    let seq_stats = sequential.run(&ignition)?;
    let par_stats = parallel.run(&ignition)?;
    println!(
        "  Sequential burned: {}, parallel burned: {}",
        seq_stats.burned, par_stats.burned
    );
    if seq_stats == par_stats && sequential.generation() == parallel.generation() {
        println!("  PASS: Identical burn maps");
    } else {
        println!("  FAIL: Backends diverged");
    }

    println!("\n=== Validation Complete ===");
    Ok(())
}
