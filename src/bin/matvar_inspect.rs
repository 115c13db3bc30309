//! Material variation inspector: normalizes a config and prints what the
//! renderer would receive.
//!
//! Usage: cargo run --bin matvar_inspect -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Variation config JSON (default: empty object)
//!   --root <ROOT>        Preset root, `wall` or `surface` (default: wall)
//!   --tiles <JSON>       Footprint tiles, e.g. '[[0,0],[1,0]]' (default: [])
//!   --salt <SALT>        Seed salt (default: "building")
//!   --style <ID>         Style id mixed into the seed (default: "")
//!   --height-min <H>     Bottom of the building in world units (default: 0)
//!   --height-max <H>     Top of the building in world units (default: 1)
//!   --seed-offset <F>    Extra noise offset (default: 0)
//!   --emit <WHAT>        config | uniforms | vertex | fragment | all (default: all)
//!   --strict             Fail when the template lacks an injection anchor

use serde_json::{json, Value};

use matvar::core::{Error, Result};
use matvar::material::{Material, ProgramCache, ShaderTemplate, TextureMaps};
use matvar::shader::inject_material_variation;
use matvar::variation::config::load_config_file;
use matvar::variation::seed::tiles_from_value;
use matvar::variation::{
    compute_seed_from_tiles, MaterialVariationSystem, SeedOptions, UniformInputs, VariationRoot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    Config,
    Uniforms,
    Vertex,
    Fragment,
    All,
}

impl Emit {
    fn parse(text: &str) -> Result<Self> {
        match text {
            "config" => Ok(Self::Config),
            "uniforms" => Ok(Self::Uniforms),
            "vertex" => Ok(Self::Vertex),
            "fragment" => Ok(Self::Fragment),
            "all" => Ok(Self::All),
            other => Err(Error::InvalidArgument(format!("unknown --emit value '{other}'"))),
        }
    }

    fn includes(self, other: Emit) -> bool {
        self == Emit::All || self == other
    }
}

fn main() {
    matvar::core::logging::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let input = match parse_str_arg(&args, "--config") {
        Some(path) => load_config_file(path)?,
        None => json!({}),
    };
    let root = match parse_str_arg(&args, "--root") {
        Some(text) => serde_json::from_value::<VariationRoot>(Value::String(text.to_lowercase()))
            .map_err(|_| Error::InvalidArgument(format!("unknown --root value '{text}'")))?,
        None => VariationRoot::default(),
    };
    let tiles = match parse_str_arg(&args, "--tiles") {
        Some(text) => tiles_from_value(&serde_json::from_str(&text)?),
        None => Vec::new(),
    };
    let salt = parse_str_arg(&args, "--salt").unwrap_or_else(|| "building".to_string());
    let style = parse_str_arg(&args, "--style").unwrap_or_default();
    let height_min = parse_f32_arg(&args, "--height-min").unwrap_or(0.0);
    let height_max = parse_f32_arg(&args, "--height-max").unwrap_or(1.0);
    let seed_offset = parse_f32_arg(&args, "--seed-offset").unwrap_or(0.0);
    let emit = match parse_str_arg(&args, "--emit") {
        Some(text) => Emit::parse(&text)?,
        None => Emit::All,
    };
    let strict = args.iter().any(|a| a == "--strict");

    let seed = compute_seed_from_tiles(&tiles, &SeedOptions::salt(&salt).with_style(&style));
    let inputs = UniformInputs::new(seed)
        .with_heights(height_min, height_max)
        .with_seed_offset(seed_offset);
    log::info!("{} tiles, root {root:?}, seed {seed:#010x}", tiles.len());

    let system = MaterialVariationSystem::new();
    let mut material = Material::new("inspect").with_maps(TextureMaps::all());
    let uses_corner = system.attach(&mut material, &input, root, inputs);
    if uses_corner {
        log::info!("mesh must provide the corner distance attribute");
    }

    let mut probe = ShaderTemplate::standard().instantiate(&material);
    let report = inject_material_variation(&mut probe);
    log::info!(
        "injection {:?}: {} slots applied, {} texture lookups rewritten",
        report.status,
        report.applied.len(),
        report.rewritten_call_sites
    );
    if strict {
        report.into_result()?;
    }

    let mut cache = ProgramCache::default();
    let program = cache.prepare(&mut material);

    let Some(binding) = material.user_data.mat_var.as_ref() else {
        return Err(Error::InvalidArgument("variation binding was not attached".to_string()));
    };

    if emit.includes(Emit::Config) {
        println!("{}", serde_json::to_string_pretty(&binding.config.to_value())?);
    }
    if emit.includes(Emit::Uniforms) {
        let uniforms = binding.uniforms.borrow();
        for (name, vectors) in uniforms.named_vectors() {
            for (i, v) in vectors.iter().enumerate() {
                println!("{name}[{i}] = ({:.6}, {:.6}, {:.6}, {:.6})", v.x, v.y, v.z, v.w);
            }
        }
    }
    if emit.includes(Emit::Vertex) {
        println!("{}", program.vertex_shader);
    }
    if emit.includes(Emit::Fragment) {
        println!("{}", program.fragment_shader);
    }

    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
