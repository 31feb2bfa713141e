use argh::FromArgs;
use std::path::PathBuf;

use parallax::features::{
    BruteForceMatcher, Device, FeatureMatcher, OnnxExtractorBuilder, OnnxMatcherBuilder,
};
use parallax::image::io::read_image_any_rgb8;
use parallax::odometry::{OdometryConfig, TwoViewOdometry};
use parallax::pose::{PinholeIntrinsics, RansacParams};
use parallax::viz;

/// Two-view visual odometry: extract learned features from two images,
/// match them, recover the relative camera pose and log the matches to
/// Rerun.
#[derive(FromArgs)]
struct Args {
    /// path to the first image
    #[argh(option, default = "PathBuf::from(\"img1.jpg\")")]
    image0: PathBuf,

    /// path to the second image
    #[argh(option, default = "PathBuf::from(\"img2.jpg\")")]
    image1: PathBuf,

    /// path to the keypoint extractor ONNX export
    #[argh(option, short = 'e')]
    extractor: PathBuf,

    /// path to the matcher ONNX export; not needed with --brute-force
    #[argh(option, short = 'm')]
    matcher: Option<PathBuf>,

    /// match descriptors by brute force instead of the learned matcher
    #[argh(switch)]
    brute_force: bool,

    /// keypoint ceiling per image
    #[argh(option, default = "2048")]
    max_keypoints: usize,

    /// RANSAC inlier threshold in pixels
    #[argh(option, default = "1.0")]
    threshold: f64,

    /// RANSAC seed for reproducible runs
    #[argh(option)]
    seed: Option<u64>,

    /// path to the ONNX Runtime dylib; defaults to the ORT_DYLIB_PATH
    /// environment variable
    #[argh(option)]
    ort_dylib_path: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    // point the runtime at the ONNX Runtime dylib
    if let Some(dylib_path) = &args.ort_dylib_path {
        std::env::set_var("ORT_DYLIB_PATH", dylib_path);
    }

    let device = Device::auto();
    println!("Running on device: {device}");

    // fail fast on missing inputs before loading any model
    println!("Loading images...");
    let image0 = read_image_any_rgb8(&args.image0)?;
    let image1 = read_image_any_rgb8(&args.image1)?;

    println!("Loading extractor and matcher models...");
    let detector = OnnxExtractorBuilder::new(args.extractor)
        .with_max_keypoints(args.max_keypoints)
        .with_device(device)
        .build()?;

    let matcher: Box<dyn FeatureMatcher> = if args.brute_force {
        Box::new(BruteForceMatcher::new())
    } else {
        let model_path = args
            .matcher
            .ok_or("--matcher is required unless --brute-force is set")?;
        Box::new(
            OnnxMatcherBuilder::new(model_path)
                .with_device(device)
                .build()?,
        )
    };

    let config = OdometryConfig {
        intrinsics: PinholeIntrinsics::from_image_size(image0.width(), image0.height()),
        ransac: RansacParams {
            threshold: args.threshold,
            random_seed: args.seed.or(Some(0)),
            ..Default::default()
        },
    };

    let pipeline = TwoViewOdometry::new(Box::new(detector), matcher, config);
    let result = pipeline.run(&image0, &image1)?;

    println!(
        "Found {} matches ({} inliers).",
        result.matches.len(),
        result.num_inliers()
    );

    println!("\n---------------------------------");
    println!("Visual Odometry Result:");
    println!("Rotation Matrix (R):");
    let rows = result.pose.rotation.transpose().to_cols_array();
    for row in rows.chunks_exact(3) {
        println!("  [{:>10.6} {:>10.6} {:>10.6}]", row[0], row[1], row[2]);
    }
    let t = result.pose.translation;
    println!("Translation Direction (t): [{:.6} {:.6} {:.6}]", t.x, t.y, t.z);
    println!("---------------------------------");

    println!("Visualizing matches...");
    let pts0: Vec<[f32; 2]> = result
        .points0
        .iter()
        .map(|p| [p.x as f32, p.y as f32])
        .collect();
    let pts1: Vec<[f32; 2]> = result
        .points1
        .iter()
        .map(|p| [p.x as f32, p.y as f32])
        .collect();

    let rec = rerun::RecordingStreamBuilder::new("Parallax Two-View Odometry").spawn()?;
    viz::log_matches(&rec, "matches", &image0, &image1, &pts0, &pts1)?;

    Ok(())
}
