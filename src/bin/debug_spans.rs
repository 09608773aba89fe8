//! Debug tool for comparing span settings side by side
//! Writes span maps of the same region under different profiles to a text file

use std::fmt::Write as _;
use std::fs;

use cityscape::city::{map, render_span_map, CityResolver};
use cityscape::profile::Profile;
use cityscape::world::DimensionContext;

const SEED: u64 = 42;
const RADIUS: i32 = 24;
const OUTPUT: &str = "debug_spans.txt";

fn main() {
    env_logger::init();
    println!("Generating span comparison...");

    let variants: Vec<(&str, Box<dyn Fn(&mut Profile)>)> = vec![
        ("1. Default Profile", Box::new(|_p: &mut Profile| {})),
        ("2. No Bridges", Box::new(|p: &mut Profile| p.bridge_chance = 0.0)),
        ("3. Bridges Everywhere", Box::new(|p: &mut Profile| p.bridge_chance = 1.0)),
        ("4. Corridors Everywhere", Box::new(|p: &mut Profile| {
            p.corridor_chance = 1.0;
            p.building_min_cellars = 1;
        })),
        ("5. Dense City", Box::new(|p: &mut Profile| {
            p.city_threshold = 0.1;
            p.building_chance = 0.6;
        })),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "Seed {} | radius {}", SEED, RADIUS);
    out.push_str(&map::map_legend());

    for (name, tweak) in &variants {
        let mut profile = Profile::default();
        tweak(&mut profile);
        let ctx = match DimensionContext::builder(SEED).profile(profile).build() {
            Ok(ctx) => ctx,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                continue;
            }
        };
        let resolver = CityResolver::new(ctx);
        match render_span_map(&resolver, 0, 0, RADIUS) {
            Ok(rendered) => {
                let _ = writeln!(out, "\n=== {} ===", name);
                out.push_str(&rendered);
                println!("  {} ({})", name, resolver.stats().summary());
            }
            Err(e) => eprintln!("{}: {}", name, e),
        }
    }

    match fs::write(OUTPUT, out) {
        Ok(()) => println!("Saved {}", OUTPUT),
        Err(e) => eprintln!("Failed to write {}: {}", OUTPUT, e),
    }
}
