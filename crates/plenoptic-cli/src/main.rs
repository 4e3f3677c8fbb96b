use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plenoptic_pipeline::capture::{
    CaptureProblem, step_finalize_render, step_prepare_scene, step_start_render,
    step_write_metadata,
};
use plenoptic_pipeline::config::SceneConfig;
use plenoptic_pipeline::io::convert_ply_to_opencv;
use plenoptic_pipeline::render::RenderOutcome;
use plenoptic_pipeline::resample::{DEFAULT_POINT_COUNT, resample_dataset_dir};
use plenoptic_pipeline::session::DatasetSession;
use plenoptic_pipeline::split::split_dataset_dir;
use plenoptic_pipeline::standalone::StandaloneHost;
use plenoptic_pipeline::tracks::{compute_vertex_tracks, write_vertex_tracks};

/// Plenoptic multi-view dataset generation and post-processing.
#[derive(Debug, Parser)]
#[command(author, version, about = "Multi-view dataset generation for dynamic NeRF and 3DGS")]
struct Args {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place cameras in a scene and write the dataset metadata.
    Generate {
        /// Path to a standalone scene JSON file.
        #[arg(long)]
        scene: PathBuf,
        /// Optional path to a JSON SceneConfig. Defaults are used if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Save the capture session to this file.
        #[arg(long)]
        session: Option<PathBuf>,
        /// Also run the render steps and sort any frames found into `ims/`.
        #[arg(long)]
        render: bool,
    },
    /// Split meta.json into train_meta.json and test_meta.json.
    Split {
        /// Dataset folder containing meta.json.
        #[arg(long)]
        dataset: PathBuf,
        /// Comma-separated test camera indices.
        #[arg(long, value_delimiter = ',', required = true)]
        test: Vec<usize>,
    },
    /// Resample points3d.ply into a dense initial point cloud.
    Resample {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long, default_value_t = DEFAULT_POINT_COUNT)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Rewrite an ASCII PLY file in place in the OpenCV convention.
    ConvertPly { path: PathBuf },
    /// Record world-space vertex trajectories of every mesh.
    Tracks {
        #[arg(long)]
        scene: PathBuf,
        #[arg(long)]
        first: i64,
        #[arg(long)]
        last: i64,
        #[arg(long)]
        output: PathBuf,
    },
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn run_generate(
    scene_path: &Path,
    config_path: Option<&Path>,
    session_path: Option<&Path>,
    render: bool,
) -> Result<String> {
    let mut host = StandaloneHost::from_file(scene_path)?;
    let config = match config_path {
        Some(path) => load_json_file::<SceneConfig>(path)?,
        None => SceneConfig::default(),
    };

    let mut session = DatasetSession::<CaptureProblem>::new();
    session.set_config(config)?;
    step_prepare_scene(&mut session, &mut host, None)?;
    step_write_metadata(&mut session, &mut host, None)?;
    if render {
        step_start_render(&mut session, &mut host)?;
        step_finalize_render(&mut session, &mut host, RenderOutcome::Completed)?;
    }
    if let Some(path) = session_path {
        session.save(path)?;
        log::info!("session saved to {}", path.display());
    }

    let export = session.export()?;
    Ok(serde_json::to_string_pretty(&export)?)
}

fn run_split(dataset: &Path, test: &[usize]) -> Result<String> {
    let (train, test) = split_dataset_dir(dataset, test)?;
    let cameras = |m: &plenoptic_pipeline::metadata::MetaJson| {
        m.cam_id.first().cloned().unwrap_or_default()
    };
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "train": cameras(&train),
        "test": cameras(&test),
    }))?)
}

fn run_tracks(scene: &Path, first: i64, last: i64, output: &Path) -> Result<usize> {
    let host = StandaloneHost::from_file(scene)?;
    let tracks = compute_vertex_tracks(&host, first, last)?;
    write_vertex_tracks(output, &tracks)?;
    Ok(tracks.values().map(|v| v.len()).sum())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Generate {
            scene,
            config,
            session,
            render,
        } => {
            let json = run_generate(&scene, config.as_deref(), session.as_deref(), render)?;
            println!("{json}");
        }
        Command::Split { dataset, test } => {
            println!("{}", run_split(&dataset, &test)?);
        }
        Command::Resample {
            dataset,
            count,
            seed,
        } => {
            let cloud = resample_dataset_dir(&dataset, count, seed)?;
            println!("resampled {} points", cloud.len());
        }
        Command::ConvertPly { path } => {
            let geometry = convert_ply_to_opencv(&path)?;
            println!(
                "converted {} vertices in {}",
                geometry.num_vertices(),
                path.display()
            );
        }
        Command::Tracks {
            scene,
            first,
            last,
            output,
        } => {
            let count = run_tracks(&scene, first, last, &output)?;
            println!("wrote {count} vertex tracks to {}", output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenoptic_core::{CameraLens, GeometrySnapshot, Pt3};
    use plenoptic_pipeline::capture::CaptureExport;
    use plenoptic_pipeline::host::HostCamera;
    use plenoptic_pipeline::standalone::{SceneObject, StandaloneScene};
    use tempfile::NamedTempFile;

    fn write_json<T: serde::Serialize>(value: &T, path: &Path) {
        serde_json::to_writer_pretty(fs::File::create(path).unwrap(), value).unwrap();
    }

    fn scene() -> StandaloneScene {
        StandaloneScene {
            camera: Some(HostCamera {
                name: "Camera".into(),
                lens: CameraLens::default(),
            }),
            objects: vec![SceneObject {
                name: "Tri".into(),
                geometry: GeometrySnapshot {
                    positions: vec![
                        Pt3::new(0.0, 0.0, 0.0),
                        Pt3::new(1.0, 0.0, 0.0),
                        Pt3::new(0.0, 1.0, 0.0),
                    ],
                    faces: vec![vec![0, 1, 2]],
                    ..GeometrySnapshot::default()
                },
                ..SceneObject::default()
            }],
            ..StandaloneScene::default()
        }
    }

    #[test]
    fn args_parse_subcommands() {
        let args = Args::try_parse_from(["plenoptic", "-v", "split", "--dataset", "d", "--test", "1,3"])
            .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Split { test, .. } => assert_eq!(test, vec![1, 3]),
            other => panic!("unexpected command {other:?}"),
        }

        let args = Args::try_parse_from(["plenoptic", "resample", "--dataset", "d"]).unwrap();
        match args.command {
            Command::Resample { count, seed, .. } => {
                assert_eq!(count, DEFAULT_POINT_COUNT);
                assert_eq!(seed, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["plenoptic", "split", "--dataset", "d"]).is_err());
    }

    #[test]
    fn generate_then_split_and_resample() {
        let dir = tempfile::tempdir().unwrap();
        let scene_file = NamedTempFile::new_in(dir.path()).unwrap();
        let config_file = NamedTempFile::new_in(dir.path()).unwrap();
        write_json(&scene(), scene_file.path());
        let config = SceneConfig {
            save_path: dir.path().display().to_string(),
            dataset_name: "tri".into(),
            camera_count: 4,
            first_frame: 1,
            last_frame: 2,
            export_splats: true,
            ..SceneConfig::default()
        };
        write_json(&config, config_file.path());
        let session_path = dir.path().join("session.json");

        let json = run_generate(
            scene_file.path(),
            Some(config_file.path()),
            Some(&session_path),
            true,
        )
        .expect("generate should succeed");
        let export: CaptureExport = serde_json::from_str(&json).unwrap();
        assert_eq!(export.num_cameras, 4);
        assert_eq!(export.num_frames, 2);
        assert_eq!(export.images_moved, 0);
        assert!(session_path.is_file());

        let dataset = dir.path().join("tri");
        let split = run_split(&dataset, &[0, 2]).unwrap();
        let split: serde_json::Value = serde_json::from_str(&split).unwrap();
        assert_eq!(split["train"], serde_json::json!([1, 3]));

        let cloud = resample_dataset_dir(&dataset, 100, 5).unwrap();
        assert_eq!(cloud.len(), 100);
    }

    #[test]
    fn tracks_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("scene.json");
        write_json(&scene(), &scene_path);
        let output = dir.path().join("tracks.json");

        let count = run_tracks(&scene_path, 1, 3, &output).unwrap();
        assert_eq!(count, 3);
        assert!(output.is_file());
        assert!(run_tracks(&scene_path, 3, 1, &output).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_json_file::<SceneConfig>(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }
}
