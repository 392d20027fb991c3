use clap::{Parser, ValueEnum};
use levelset_core::{
    AlignedBox, Ball, BoundingBox, LevelSetConfig, LevelSetProbe, MultiLevel, Shape,
    SphAdaptation, Vec2d,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShapeKind {
    /// Disc of the given radius
    Circle,
    /// Rectangle with half extents `radius × 0.6 radius`
    Rectangle,
}

/// Multi-resolution level set demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "levelset-demo")]
#[command(about = "Adaptive narrow-band level set demo", long_about = None)]
struct Args {
    /// Shape to embed
    #[arg(short, long, value_enum, default_value_t = ShapeKind::Circle)]
    shape: ShapeKind,

    /// Shape size (circle radius or rectangle half width)
    #[arg(short, long, default_value_t = 1.0)]
    radius: f64,

    /// Data spacing of the coarsest level
    #[arg(short, long, default_value_t = 0.05)]
    data_spacing: f64,

    /// Number of levels, each at half the spacing of the previous one
    #[arg(short, long, default_value_t = 2)]
    levels: usize,

    /// Padding cells around the shape bounds
    #[arg(short, long, default_value_t = 4)]
    buffer_width: usize,

    /// Reinitialization sub-steps per interface cleaning
    #[arg(long, default_value_t = 50)]
    reinitialization_steps: usize,

    /// Skip interface cleaning
    #[arg(long)]
    no_clean: bool,

    /// Number of probe positions along the positive x axis
    #[arg(short, long, default_value_t = 9)]
    probes: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("=== Level Set Demo ===\n");

    let shape: Arc<dyn Shape<2>> = match args.shape {
        ShapeKind::Circle => Arc::new(Ball::new(Vec2d::zeros(), args.radius)),
        ShapeKind::Rectangle => Arc::new(AlignedBox::new(
            Vec2d::zeros(),
            Vec2d::new(args.radius, 0.6 * args.radius),
        )),
    };
    let bounds: BoundingBox<2> = shape.bounds();
    println!(
        "Shape: {:?}, bounds [{:.2}, {:.2}] x [{:.2}, {:.2}]",
        args.shape, bounds.lower[0], bounds.upper[0], bounds.lower[1], bounds.upper[1]
    );

    let adaptation = match SphAdaptation::wendland::<2>(args.data_spacing) {
        Ok(adaptation) => Arc::new(adaptation),
        Err(e) => {
            eprintln!("Invalid particle resolution: {e}");
            std::process::exit(1);
        }
    };
    let config = LevelSetConfig {
        buffer_width: args.buffer_width,
        reinitialization_steps: args.reinitialization_steps,
        ..Default::default()
    };

    let start = Instant::now();
    let mut levels = match MultiLevel::new(
        &bounds,
        args.data_spacing,
        args.levels,
        shape,
        adaptation,
        config,
    ) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Level set construction failed: {e}");
            std::process::exit(1);
        }
    };
    info!("Construction took {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);

    println!("\n--- Levels ---");
    for (index, level) in levels.levels().iter().enumerate() {
        println!(
            "Level {}: spacing {:.4}, ratio {:.2}, cells {:?}, core {}, inner {}",
            index,
            level.data_spacing(),
            level.resolution_ratio(),
            level.number_of_cells(),
            level.core_package_count(),
            level.inner_package_count()
        );
    }

    if !args.no_clean {
        let start = Instant::now();
        levels.clean_interface(1.0);
        info!("Interface cleaning took {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    report_probes(&levels, &args);
}

/// Print probes along the positive x axis, from the center out past the surface
fn report_probes(levels: &dyn LevelSetProbe<2>, args: &Args) {
    println!("\n--- Probes ---");
    println!(
        "{:>8} {:>10} {:>18} {:>10} {:>8}",
        "x", "phi", "normal", "kernel", "bounded"
    );
    let count = args.probes.max(2);
    for i in 0..count {
        let x = 1.5 * args.radius * i as f64 / (count - 1) as f64;
        let position = Vec2d::new(x, 0.0);
        let phi = levels.probe_signed_distance(&position);
        let normal = levels.probe_normal_direction(&position);
        let kernel = levels.probe_kernel_integral(&position, 1.0);
        println!(
            "{:>8.3} {:>10.4} ({:>7.3}, {:>7.3}) {:>10.4} {:>8}",
            x,
            phi,
            normal[0],
            normal[1],
            kernel,
            levels.probe_is_within_mesh_bound(&position)
        );
    }
}
