use image::{Luma, GrayImage, Rgb, RgbImage};
use reliefkit::{
    Config, GenerationMode, Job, JobOutcome, JobQueue, ProgramAnalyzer, TargetSize,
};
use reliefkit::jobs::run_job;

#[test]
fn test_generated_program_analyzes_consistently() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("relief.png");
    let program_path = dir.path().join("relief.gcode");

    let mut img = RgbImage::from_pixel(5, 3, Rgb([255, 255, 255]));
    img.put_pixel(2, 1, Rgb([0, 0, 0]));
    img.save(&image_path).unwrap();

    let config = Config::default();
    let outcome = run_job(
        &config,
        Job::Generate {
            image: image_path,
            output: Some(program_path.clone()),
            mode: GenerationMode::Color,
            size: TargetSize::default(),
        },
    );
    let plan = match outcome {
        JobOutcome::Generated { plan, .. } => plan,
        other => panic!("unexpected outcome: {:?}", other),
    };

    let report = ProgramAnalyzer::new(config.analyzer.clone())
        .analyze_file(&program_path)
        .unwrap();

    assert_eq!(report.summary.cut_moves, plan.cut_count());
    assert_eq!(report.summary.cut_moves, 15);
    // header safety move, origin, two row changes, footer retract and origin
    assert_eq!(report.summary.rapid_moves, plan.rapid_count());
    assert_eq!(report.summary.rapid_moves, 6);
    assert_eq!(report.heights.min, -6.0);
    assert_eq!(report.heights.max, 5.0);
    assert_eq!(report.bounds.x_max, 4.0);
    assert_eq!(report.bounds.y_max, 2.0);
    assert_eq!(report.feeds.max, 3000.0);
    assert_eq!(report.summary.g_word_counts.get("G17"), Some(&1));
}

#[tokio::test]
async fn test_binary_job_through_queue() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("mask.png");
    let program_path = dir.path().join("mask.gcode");

    let mut img = GrayImage::from_pixel(4, 2, Luma([255]));
    img.put_pixel(0, 0, Luma([0]));
    img.put_pixel(1, 0, Luma([0]));
    img.save(&image_path).unwrap();

    let queue = JobQueue::new(Config::default(), 2);
    let generate = queue.submit(Job::Generate {
        image: image_path,
        output: Some(program_path.clone()),
        mode: GenerationMode::Binary { total_depth: -3.0 },
        size: TargetSize::default(),
    });
    assert!(matches!(
        generate.wait().await.unwrap(),
        JobOutcome::Generated { .. }
    ));

    let analyze = queue.submit(Job::Analyze {
        program: program_path,
    });
    match analyze.wait().await.unwrap() {
        JobOutcome::Analyzed(report) => {
            // two passes (-2, -3), two cells each
            assert_eq!(report.summary.cut_moves, 4);
            assert_eq!(report.heights.min, -3.0);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_missing_image_job_fails() {
    let outcome = run_job(
        &Config::default(),
        Job::Generate {
            image: "/no/such/image.png".into(),
            output: None,
            mode: GenerationMode::Color,
            size: TargetSize::default(),
        },
    );
    assert!(outcome.is_failure());
}
