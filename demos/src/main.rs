//! A small demo: some colored text, a spinning-cube sprite and, if a
//! `page.png` exists in the asset directory, a multi-cell page image.
//!
//! Usage: `runic-demo <font.ttf> [asset-dir]`

use std::path::PathBuf;

use runic_core::{CharSpec, Color, ImgSpec, Mesh, MeshSpec, RenderProps, mesh::unit_cube};
use runic_wgpu::{Config, Frontend, assets::ObjSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let font_path = args.next().ok_or("usage: runic-demo <font.ttf> [asset-dir]")?;
    let font_data = std::fs::read(&font_path)?;
    let asset_dir = args.next().map(PathBuf::from).unwrap_or_else(|| ".".into());

    // A model.obj in the asset directory replaces the built-in cube.
    let mut mesh = Mesh::new();
    if mesh.load(&mut ObjSource::new(&asset_dir), "model.obj").is_err() {
        mesh = unit_cube();
    }

    let mut frontend = Frontend::new(Config {
        title: "runic demo".into(),
        font_data: Some(font_data),
        cols: 24,
        rows: 12,
        asset_dir,
        ..Config::default()
    })?;

    let screen = frontend.screen_mut();
    let amber = RenderProps::default().with_color(Color::from_rgb(255, 210, 120));
    for (i, ch) in "runic".chars().enumerate() {
        screen.set_char(1, 2 + i, CharSpec::new(ch).with_props(amber))?;
    }
    screen.set_mesh(3, 2, MeshSpec::new(mesh).with_footprint(4, 4))?;

    // A missing page draws nothing (and logs a warning) rather than failing.
    screen.set_img(3, 9, ImgSpec::new("page.png").with_footprint(6, 6))?;

    log::info!("starting demo with font {font_path}");
    frontend.run()?;
    Ok(())
}
