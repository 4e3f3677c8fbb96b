//! Golden-angle capture of a single quad, followed by post-processing.
//!
//! This example runs the whole dataset workflow without a renderer:
//! 1. Build an in-memory scene with a template camera and one mesh
//! 2. Place 24 cameras on a hemisphere and write the metadata
//! 3. Split the cameras into train/test sets
//! 4. Resample the exported geometry into a dense point cloud
//!
//! Run with: `cargo run -p plenoptic --example turntable`

use anyhow::Result;
use plenoptic::capture::{step_prepare_scene, step_write_metadata};
use plenoptic::dataset::{resample_dataset_dir, split_dataset_dir};
use plenoptic::host::{HostCamera, SceneObject, StandaloneScene};
use plenoptic::prelude::*;

fn main() -> Result<()> {
    println!("=== Golden-angle turntable ===\n");

    let floor = GeometrySnapshot {
        positions: vec![
            Pt3::new(-1.0, -1.0, 0.0),
            Pt3::new(1.0, -1.0, 0.0),
            Pt3::new(1.0, 1.0, 0.0),
            Pt3::new(-1.0, 1.0, 0.0),
        ],
        colors: Some(vec![[180, 180, 180]; 4]),
        faces: vec![vec![0, 1, 2, 3]],
        ..GeometrySnapshot::default()
    };
    let mut host = StandaloneHost::new(StandaloneScene {
        camera: Some(HostCamera {
            name: "Camera".into(),
            lens: CameraLens::default(),
        }),
        render: RenderSettings {
            resolution_x: 800,
            resolution_y: 800,
            ..RenderSettings::default()
        },
        objects: vec![SceneObject {
            name: "Floor".into(),
            geometry: floor,
            ..SceneObject::default()
        }],
        ..StandaloneScene::default()
    });

    let out = tempfile::tempdir()?;
    let mut session = DatasetSession::<CaptureProblem>::with_description("turntable");
    session.update_config(|c| {
        c.save_path = out.path().display().to_string();
        c.dataset_name = "turntable".into();
        c.camera_count = 24;
        c.first_frame = 1;
        c.last_frame = 1;
        c.hemisphere_only = true;
        c.distribution = Distribution::GoldenAngle;
        c.sphere.radius = 3.0;
        c.export_splats = true;
        c.write_log = true;
    })?;

    step_prepare_scene(&mut session, &mut host, None)?;
    step_write_metadata(&mut session, &mut host, None)?;

    let export = session.export()?;
    println!("Dataset: {}", export.dataset_dir.display());
    println!(
        "  {} frame(s) x {} cameras, fl=({:.2}, {:.2})",
        export.num_frames, export.num_cameras, export.fl_x, export.fl_y
    );
    for file in &export.files {
        println!("  wrote {}", file.display());
    }

    let test: Vec<usize> = (0..24).step_by(6).collect();
    let (train, test) = split_dataset_dir(&export.dataset_dir, &test)?;
    println!(
        "\nSplit: {} train / {} test cameras",
        train.cam_id[0].len(),
        test.cam_id[0].len()
    );

    let cloud = resample_dataset_dir(&export.dataset_dir, 10_000, 0)?;
    println!("Dense cloud: {} points", cloud.len());

    println!("\nSession log:");
    for entry in &session.log {
        println!(
            "  {} [{}] {}",
            entry.operation,
            if entry.success { "ok" } else { "failed" },
            entry.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
