use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use phongview_assets::MeshData;
use phongview_render::{DebugTextRenderer, Renderer, Scene, SceneConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phongview-cli", about = "CLI tool for phongview scenes and assets")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a mesh and print its statistics
    InspectMesh {
        /// OBJ, glTF or GLB file
        path: PathBuf,
    },
    /// Load and validate a scene configuration
    CheckConfig {
        /// YAML or JSON scene file
        path: PathBuf,
    },
    /// Print the frame plan seen from the configured camera
    Plan {
        /// Scene file; the built-in scene when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Advance the animation by this many seconds first
        #[arg(long, default_value = "0")]
        time: f32,
    },
    /// Print the built-in scene as YAML
    DefaultConfig,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading scene config");
            SceneConfig::load(path)
                .with_context(|| format!("loading scene config {}", path.display()))
        }
        None => {
            tracing::debug!("using built-in scene");
            Ok(SceneConfig::default())
        }
    }
}

fn mesh_report(mesh: &MeshData) -> String {
    let mut out = format!(
        "mesh: {}\nvertices: {}\ntriangles: {}\nnormals: {}\nuvs: {}\n",
        mesh.name,
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.has_normals(),
        mesh.has_uvs()
    );
    if let Some((min, max)) = mesh.bounds() {
        out.push_str(&format!(
            "bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})\n",
            min.x, min.y, min.z, max.x, max.y, max.z
        ));
    }
    out
}

fn plan_report(config: SceneConfig, time: f32) -> String {
    let sky = config.skybox.is_some();
    let view = config.camera.render_view();
    let mut scene = Scene::new(config);
    scene.update(time);
    tracing::debug!(
        objects = scene.objects().len(),
        sky,
        angle = scene.angle(),
        "planning frame"
    );
    DebugTextRenderer::with_sky(sky).render(&scene, &view)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
    tracing::debug!("phongview-cli v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Info => {
            println!("phongview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", phongview_assets::crate_info());
            println!("render: {}", phongview_render::crate_info());
            println!("input: {}", phongview_input::crate_info());
        }
        Commands::InspectMesh { path } => {
            let mesh = phongview_assets::load_mesh(&path)
                .with_context(|| format!("loading mesh {}", path.display()))?;
            print!("{}", mesh_report(&mesh));
        }
        Commands::CheckConfig { path } => {
            let config = load_config(Some(&path))?;
            println!(
                "{}: OK ({} objects, skybox: {}, effect: {})",
                path.display(),
                config.objects.len(),
                config.skybox.is_some(),
                config.post.effect.name()
            );
        }
        Commands::Plan { config, time } => {
            let config = load_config(config.as_deref())?;
            print!("{}", plan_report(config, time));
        }
        Commands::DefaultConfig => {
            print!("{}", SceneConfig::default().to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_report_lists_counts() {
        let report = mesh_report(&phongview_assets::cube(2.0));
        assert!(report.contains("vertices: 24"));
        assert!(report.contains("triangles: 12"));
        assert!(report.contains("bounds: (-1.000, -1.000, -1.000) .. (1.000, 1.000, 1.000)"));
    }

    #[test]
    fn default_plan_has_every_pass() {
        let report = plan_report(SceneConfig::default(), 0.0);
        assert!(report.contains("Objects: 3"));
        assert!(report.contains("[opaque]"));
        assert!(report.contains("[transparent]"));
        assert!(report.contains("glass_cube"));
        assert!(!report.contains("[sky]"));
    }

    #[test]
    fn no_config_path_uses_builtin_scene() {
        assert_eq!(load_config(None).unwrap(), SceneConfig::default());
    }

    #[test]
    fn missing_config_reports_path() {
        let err = load_config(Some(Path::new("no/such/scene.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("no/such/scene.yaml"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["phongview-cli", "plan", "--time", "1.5"]).unwrap();
        assert!(matches!(cli.command, Commands::Plan { time, config: None } if time == 1.5));
        assert!(Cli::try_parse_from(["phongview-cli", "inspect-mesh"]).is_err());
    }
}
