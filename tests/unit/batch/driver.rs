use image::{Rgb, RgbImage, Rgba, RgbaImage};

use super::*;
use crate::dataset::CardId;
use crate::foundation::core::PixelSize;

fn sprite(name: &str, id: Option<&str>, color: [u8; 4]) -> CardSprite {
    CardSprite::new(
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(14, 19, Rgba(color))),
        name.into(),
        id.map(CardId::from_token),
    )
}

fn inputs(cards: usize) -> BatchInputs {
    let sprites = (0..cards)
        .map(|i| {
            let id = (i + 1).to_string();
            sprite(&format!("card_{id:0>3}_.png"), Some(id.as_str()), [0, 0, 200, 255])
        })
        .collect();
    let fillers = vec![sprite("fake.png", None, [200, 0, 0, 255])];
    let class_map = ClassMap::from_rows([("1/5", "Alpha"), ("2/5", "Beta"), ("3/5", "Gamma")]).unwrap();
    BatchInputs::new(SpritePool::from_sprites(sprites), SpritePool::from_sprites(fillers), class_map)
        .unwrap()
}

fn small_config(out: &Path) -> MosaicConfig {
    let mut cfg = MosaicConfig::default();
    cfg.canvas = PixelSize::new(192, 108);
    cfg.sprite = PixelSize::new(14, 19);
    cfg.tiling.tile = PixelSize::new(14, 19);
    cfg.grid.margin = 2;
    cfg.group_size = 2;
    cfg.variations = 1;
    cfg.seed = Some(1234);
    cfg.paths.output_dir = out.to_path_buf();
    cfg.paths.backgrounds_dir = out.join("no-such-dir");
    cfg.paths.web_cache_dir = out.join("web");
    cfg
}

struct NoNetwork;

impl PhotoSource for NoNetwork {
    fn fetch(&self) -> MosaicResult<Vec<u8>> {
        Err(MosaicError::validation("offline"))
    }
}

const GRID_MOSAIC_PLANAR: RunMode = RunMode::Single {
    layout_mode: LayoutMode::Grid,
    background_mode: BackgroundMode::Mosaic,
    transform_mode: TransformMode::Planar,
};

#[test]
fn single_mode_partitions_the_pool() {
    let jobs = plan_jobs(GRID_MOSAIC_PLANAR, 5, 2, 50, 7);
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs.iter().map(|j| j.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    let mut seen: Vec<usize> = jobs.iter().flat_map(|j| j.cards.clone()).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(jobs[2].cards.len(), 1);
}

#[test]
fn all_mode_sweeps_every_combination() {
    let jobs = plan_jobs(RunMode::All, 4, 8, 2, 7);
    assert_eq!(jobs.len(), 3 * 3 * 2 * 2);
    assert!(jobs.iter().all(|j| j.cards.len() == 8 && j.cards.iter().all(|&c| c < 4)));
    assert_eq!(jobs[0].layout_mode, LayoutMode::Grid);
    assert_eq!(jobs[0].background_mode, BackgroundMode::Mosaic);
    assert_eq!(jobs[0].transform_mode, TransformMode::Planar);
    assert_eq!(jobs[2].transform_mode, TransformMode::Perspective);
    let last = jobs.last().unwrap();
    assert_eq!(last.index, 36);
    assert_eq!(last.layout_mode, LayoutMode::Random);
    assert_eq!(last.background_mode, BackgroundMode::Web);
}

#[test]
fn planning_depends_only_on_seed() {
    assert_eq!(plan_jobs(RunMode::All, 10, 8, 3, 5), plan_jobs(RunMode::All, 10, 8, 3, 5));
    assert_ne!(plan_jobs(RunMode::All, 10, 8, 3, 5), plan_jobs(RunMode::All, 10, 8, 3, 6));
}

#[test]
fn empty_pools_are_fatal() {
    let map = ClassMap::from_rows([("1", "Alpha")]).unwrap();
    let card = SpritePool::from_sprites(vec![sprite("a.png", None, [0; 4])]);
    assert!(BatchInputs::new(SpritePool::default(), card.clone(), map.clone()).is_err());
    assert!(BatchInputs::new(card, SpritePool::default(), map).is_err());
}

#[test]
fn run_writes_pairs_and_manifest() {
    let out = tempfile::tempdir().unwrap();
    let cfg = small_config(out.path());
    let inputs = inputs(3);

    let report = BatchDriver::new(&cfg, &inputs).run(GRID_MOSAIC_PLANAR).unwrap();

    assert_eq!(report.jobs_planned, 2);
    assert_eq!(report.jobs_written, 2);
    assert_eq!(report.annotations_written, 3);
    assert_eq!(report.next_index, 3);
    assert!(!report.cancelled);
    for stem in ["layout_001", "layout_002"] {
        let img = image::open(out.path().join("images").join(format!("{stem}.png"))).unwrap();
        assert_eq!((img.width(), img.height()), (192, 108));
        let label = std::fs::read_to_string(out.path().join("labels").join(format!("{stem}.txt"))).unwrap();
        assert!(!label.ends_with('\n'));
    }
    let manifest = DatasetManifest::read(&out.path().join("data.yaml")).unwrap();
    assert_eq!(manifest.nc, 4);
    assert_eq!(manifest.names, vec!["unused", "Alpha", "Beta", "Gamma"]);
    let leftovers = std::fs::read_dir(out.path().join("images"))
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let seq_out = tempfile::tempdir().unwrap();
    let par_out = tempfile::tempdir().unwrap();
    let inputs = inputs(3);
    let mode = RunMode::All;

    let seq_cfg = small_config(seq_out.path());
    let mut par_cfg = small_config(par_out.path());
    par_cfg.threading.parallel = true;
    par_cfg.threading.threads = Some(3);
    par_cfg.threading.chunk_size = 5;

    let a = BatchDriver::new(&seq_cfg, &inputs).with_photo_source(NoNetwork).run(mode).unwrap();
    let b = BatchDriver::new(&par_cfg, &inputs).with_photo_source(NoNetwork).run(mode).unwrap();
    assert_eq!(a.jobs_written, 18);
    assert_eq!(a.jobs_written, b.jobs_written);
    assert_eq!(a.annotations_written, b.annotations_written);
    assert_eq!(a.background_fallbacks, b.background_fallbacks);

    for index in 1..=18 {
        let stem = layout_stem(index);
        let read = |root: &Path, sub: &str, ext: &str| {
            std::fs::read(root.join(sub).join(format!("{stem}.{ext}"))).unwrap()
        };
        assert_eq!(read(seq_out.path(), "labels", "txt"), read(par_out.path(), "labels", "txt"), "{stem}");
        let sa = image::open(seq_out.path().join("images").join(format!("{stem}.png"))).unwrap().to_rgb8();
        let sb = image::open(par_out.path().join("images").join(format!("{stem}.png"))).unwrap().to_rgb8();
        assert_eq!(sa, sb, "{stem}");
    }
}

#[test]
fn web_backdrops_fall_back_to_white_and_are_counted() {
    let out = tempfile::tempdir().unwrap();
    let cfg = small_config(out.path());
    let inputs = inputs(2);
    let mode = RunMode::Single {
        layout_mode: LayoutMode::Random,
        background_mode: BackgroundMode::Web,
        transform_mode: TransformMode::Planar,
    };
    let report = BatchDriver::new(&cfg, &inputs).with_photo_source(NoNetwork).run(mode).unwrap();
    assert_eq!(report.jobs_written, 1);
    assert_eq!(report.background_fallbacks, 1);
    let img = image::open(out.path().join("images/layout_001.png")).unwrap().to_rgb8();
    let white = img.pixels().filter(|p| **p == Rgb([255, 255, 255])).count();
    assert!(white > img.pixels().count() / 2);
}

#[test]
fn cancelled_run_writes_nothing_and_reports_resume_point() {
    let out = tempfile::tempdir().unwrap();
    let cfg = small_config(out.path());
    let inputs = inputs(3);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = BatchDriver::new(&cfg, &inputs)
        .with_cancel(cancel)
        .run(GRID_MOSAIC_PLANAR)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.jobs_written, 0);
    assert_eq!(report.next_index, 1);
    assert_eq!(std::fs::read_dir(out.path().join("images")).unwrap().count(), 0);
}

#[test]
fn resumed_run_reproduces_the_tail() {
    let full_out = tempfile::tempdir().unwrap();
    let resumed_out = tempfile::tempdir().unwrap();
    let inputs = inputs(3);

    let full_cfg = small_config(full_out.path());
    let mut resumed_cfg = small_config(resumed_out.path());
    resumed_cfg.start_index = 2;

    BatchDriver::new(&full_cfg, &inputs).run(GRID_MOSAIC_PLANAR).unwrap();
    let report = BatchDriver::new(&resumed_cfg, &inputs).run(GRID_MOSAIC_PLANAR).unwrap();

    assert_eq!(report.jobs_resumed_past, 1);
    assert_eq!(report.jobs_written, 1);
    assert!(!resumed_out.path().join("images/layout_001.png").exists());
    let a = image::open(full_out.path().join("images/layout_002.png")).unwrap().to_rgb8();
    let b = image::open(resumed_out.path().join("images/layout_002.png")).unwrap().to_rgb8();
    assert_eq!(a, b);
}

#[test]
fn write_pair_leaves_complete_files_only() {
    let out = tempfile::tempdir().unwrap();
    let dirs = OutputDirs::create(out.path()).unwrap();
    let output = LayoutOutput {
        canvas: RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])),
        annotations: Vec::new(),
        stats: LayoutStats::default(),
    };
    write_pair(&dirs, 7, &output).unwrap();
    assert!(out.path().join("images/layout_007.png").exists());
    assert_eq!(std::fs::read_to_string(out.path().join("labels/layout_007.txt")).unwrap(), "");
    assert_eq!(std::fs::read_dir(out.path().join("images")).unwrap().count(), 1);
}

#[test]
fn thread_pool_honours_requested_size() {
    assert_eq!(build_thread_pool(Some(2)).unwrap().current_num_threads(), 2);
    assert!(build_thread_pool(None).unwrap().current_num_threads() >= 1);
}
