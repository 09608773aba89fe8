use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;

use cityscape::assets::AssetRegistry;
use cityscape::city::{map, render_map, render_span_map, ChunkSummary, CityResolver};
use cityscape::coords::DimensionId;
use cityscape::error::Result;
use cityscape::profile::Profile;
use cityscape::world::{DimensionContext, GridHighways, GridSphereLayout, PredefinedCity, ScatteredExplosions};

#[derive(Parser, Debug)]
#[command(name = "cityscape")]
#[command(about = "Resolve and inspect procedural city chunks")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Dimension id
    #[arg(long, default_value = "0")]
    dimension: u32,

    /// Profile JSON file (built-in defaults if not specified)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Directory with an assets.json overriding the built-in assets
    #[arg(long)]
    assets: Option<PathBuf>,

    /// World style name
    #[arg(long, default_value = "standard")]
    world_style: String,

    /// Predefined buildings and streets (JSON)
    #[arg(long)]
    predefined: Option<PathBuf>,

    /// Center chunk X
    #[arg(short, long, default_value = "0")]
    x: i32,

    /// Center chunk Z
    #[arg(short, long, default_value = "0")]
    z: i32,

    /// Radius of the map in chunks
    #[arg(short, long, default_value = "16")]
    radius: i32,

    /// Draw bridges, corridors and stairs over the map
    #[arg(long)]
    spans: bool,

    /// Print the center chunk as JSON instead of a map
    #[arg(long)]
    describe: bool,

    /// Spacing of a highway grid in chunks (no highways if not specified)
    #[arg(long)]
    highway_spacing: Option<i32>,

    /// City level the highway grid runs at
    #[arg(long, default_value = "0")]
    highway_level: i32,

    /// Cell size of a city sphere grid in chunks (space landscapes)
    #[arg(long)]
    sphere_cell: Option<i32>,

    /// Sphere radius in blocks
    #[arg(long, default_value = "200")]
    sphere_radius: f32,

    /// Chance per chunk of an explosion center
    #[arg(long)]
    explosions: Option<f32>,
}

fn build_context(args: &Args, seed: u64) -> Result<DimensionContext> {
    let profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };
    let assets = match &args.assets {
        Some(dir) => AssetRegistry::load_from(dir)?,
        None => AssetRegistry::defaults(),
    };
    let dimension = DimensionId(args.dimension);

    let mut builder = DimensionContext::builder(seed)
        .dimension(dimension)
        .profile(profile)
        .assets(Rc::new(assets))
        .world_style(&args.world_style);

    if let Some(path) = &args.predefined {
        match PredefinedCity::load(path) {
            Ok(city) if city.dimension == dimension => builder = builder.predefined(Box::new(city)),
            Ok(city) => log::warn!(
                "{} is for dimension {}, ignoring it for dimension {}",
                path.display(),
                city.dimension.0,
                dimension.0
            ),
            Err(e) => log::warn!("failed to load {}: {}", path.display(), e),
        }
    }
    if let Some(spacing) = args.highway_spacing {
        builder = builder.transit(Box::new(GridHighways {
            spacing,
            level: args.highway_level,
        }));
    }
    if let Some(cell) = args.sphere_cell {
        builder = builder.spheres(Box::new(GridSphereLayout::new(cell, args.sphere_radius)));
    }
    if let Some(chance) = args.explosions {
        builder = builder.damage(Box::new(ScatteredExplosions::new(seed, chance)));
    }
    builder.build()
}

fn run(args: &Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Resolving city with seed {}", seed);

    let resolver = CityResolver::new(build_context(args, seed)?);

    if args.describe {
        let d = resolver.descriptor(resolver.context().coord(args.x, args.z))?;
        let summary = ChunkSummary::from_chunk(&d)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Seed {} | chunks ({}, {}) radius {}",
            seed, args.x, args.z, args.radius
        );
        let rendered = if args.spans {
            render_span_map(&resolver, args.x, args.z, args.radius)?
        } else {
            render_map(&resolver, args.x, args.z, args.radius)?
        };
        print!("{}", rendered);
        println!();
        print!("{}", map::map_legend());
    }

    log::debug!("{}", resolver.stats().summary());
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
