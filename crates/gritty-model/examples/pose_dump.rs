//! Loads a GLTF model, builds the runtime model and prints its draw
//! ranges and an evaluated pose. Useful as a smoke test for exported
//! rigs without spinning up a renderer.

use std::{env, process};

use gritty_asset::loader::gltf::load_gltf;
use gritty_model::model::AnimatedModel;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: pose_dump <model.gltf|model.glb> [seconds]");
        process::exit(2);
    };
    let seconds: f32 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_default();

    let scene = match load_gltf(&path) {
        Ok(scene) => scene,
        Err(error) => {
            eprintln!("Failed to load {}: {}", path, error);
            process::exit(1);
        }
    };
    println!(
        "{}: {} meshes, {} materials, {} clips",
        path,
        scene.meshes.len(),
        scene.materials.len(),
        scene.animations.len()
    );

    let model = match AnimatedModel::from_scene(scene) {
        Ok(model) => model,
        Err(error) => {
            eprintln!("Failed to build model from {}: {}", path, error);
            process::exit(1);
        }
    };
    println!("{} bones", model.bone_count());
    for (index, range) in model.draw_ranges().iter().enumerate() {
        println!(
            "submesh {}: base_vertex={} base_index={} indices={} material={:?}",
            index, range.base_vertex, range.base_index, range.index_count, range.material_index
        );
    }

    for (bone, matrix) in model.evaluate_pose(seconds).iter().enumerate() {
        let (_, _, translation) = matrix.to_scale_rotation_translation();
        println!("bone {:3}: translation {:?}", bone, translation);
    }
}
