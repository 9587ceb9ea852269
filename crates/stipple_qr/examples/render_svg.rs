//! Render Demo
//!
//! Renders a synthetic 25×25 symbol with a style file and writes SVG and PNG
//! output next to each other.
//!
//! Run with: cargo run -p stipple_qr --example render_svg -- [style.toml] [asset-dir] [out-stem]

use std::error::Error;
use std::fs;

use stipple_qr::{
    finder_centers, DirectoryAssets, ModuleGrid, RandomSource, Renderer, SeededRandom,
    StyleConfig,
};

const SIZE: usize = 25;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let style = match args.next() {
        Some(path) => StyleConfig::load_from_file(path)?,
        None => StyleConfig::default(),
    };
    let assets = DirectoryAssets::new(args.next().unwrap_or_else(|| ".".to_string()));
    let stem = args.next().unwrap_or_else(|| "stipple".to_string());

    let renderer = Renderer::new(&style, &assets)?;
    let rendering = renderer.render(&demo_symbol(), &mut SeededRandom::new(42))?;

    fs::write(format!("{stem}.svg"), rendering.to_svg())?;
    let image = rendering.rasterize(512)?;
    let (width, height) = image.dimensions();
    image::save_buffer(
        format!("{stem}.png"),
        &image.pixels,
        width,
        height,
        image::ColorType::Rgba8,
    )?;

    tracing::info!(
        primitives = rendering.primitives.len(),
        "wrote {stem}.svg and {stem}.png"
    );
    Ok(())
}

/// Finder patterns, timing lines and seeded noise
fn demo_symbol() -> ModuleGrid {
    let mut rng = SeededRandom::new(7);
    let mut dark: Vec<Vec<bool>> = (0..SIZE)
        .map(|_| (0..SIZE).map(|_| rng.next_u32() % 3 != 0).collect())
        .collect();

    for i in 0..SIZE {
        dark[6][i] = i % 2 == 0;
        dark[i][6] = i % 2 == 0;
    }
    for (cx, cy) in finder_centers(SIZE) {
        for y in cy.saturating_sub(4)..(cy + 5).min(SIZE) {
            for x in cx.saturating_sub(4)..(cx + 5).min(SIZE) {
                let ring = x.abs_diff(cx).max(y.abs_diff(cy));
                dark[y][x] = ring <= 1 || ring == 3;
            }
        }
    }

    // Every row has SIZE modules, so the grid is square
    match ModuleGrid::with_finder_patterns(dark) {
        Ok(grid) => grid,
        Err(err) => unreachable!("demo symbol is square: {err}"),
    }
}
