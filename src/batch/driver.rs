use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::ImageFormat;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use crate::assets::{CardSprite, SpritePool};
use crate::batch::{cancel::CancelToken, config::MosaicConfig, report::BatchReport};
use crate::dataset::{CardIdParserChain, ClassMap, DatasetManifest, render_label_file};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::foundation::math::job_seed;
use crate::layout::{
    LayoutEngine, LayoutJob, LayoutMode, LayoutOutput, LayoutStats, TransformMode,
};
use crate::render::{BackgroundMode, BackgroundSynthesizer, HttpPhotoSource, PhotoSource};

/// Which jobs a run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Partition the shuffled card pool into groups, one image per group.
    Single {
        /// Layout strategy.
        layout_mode: LayoutMode,
        /// Background strategy.
        background_mode: BackgroundMode,
        /// Transform strategy.
        transform_mode: TransformMode,
    },
    /// Every layout × background × transform combination, `variations` images each,
    /// with groups sampled independently per image.
    All,
}

impl RunMode {
    fn may_fetch(self) -> bool {
        match self {
            Self::Single {
                background_mode, ..
            } => background_mode == BackgroundMode::Web,
            Self::All => true,
        }
    }
}

/// One scheduled image: indices into the card pool plus the modes to render with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedJob {
    /// Output index, starting at 1.
    pub index: u64,
    /// Positions in the card pool; repeats are possible in the full sweep.
    pub cards: Vec<usize>,
    /// Layout used for this image.
    pub layout_mode: LayoutMode,
    /// Backdrop used for this image.
    pub background_mode: BackgroundMode,
    /// Card transform used for this image.
    pub transform_mode: TransformMode,
}

/// Lays out every job of a run, numbered from 1.
///
/// Planning draws from its own stream (the one for index 0, which no job uses), so the
/// plan depends only on the run seed.
pub fn plan_jobs(
    mode: RunMode,
    pool_len: usize,
    group_size: usize,
    variations: u32,
    run_seed: u64,
) -> Vec<PlannedJob> {
    let mut rng = StdRng::seed_from_u64(job_seed(run_seed, 0));
    let group_size = group_size.max(1);
    let mut jobs = Vec::new();
    match mode {
        RunMode::Single {
            layout_mode,
            background_mode,
            transform_mode,
        } => {
            let mut order: Vec<usize> = (0..pool_len).collect();
            order.shuffle(&mut rng);
            for (i, chunk) in order.chunks(group_size).enumerate() {
                jobs.push(PlannedJob {
                    index: i as u64 + 1,
                    cards: chunk.to_vec(),
                    layout_mode,
                    background_mode,
                    transform_mode,
                });
            }
        }
        RunMode::All => {
            if pool_len == 0 {
                return jobs;
            }
            for layout_mode in LayoutMode::ALL {
                for background_mode in BackgroundMode::ALL {
                    for transform_mode in TransformMode::ALL {
                        for _ in 0..variations {
                            let cards = (0..group_size)
                                .map(|_| rng.gen_range(0..pool_len))
                                .collect();
                            jobs.push(PlannedJob {
                                index: jobs.len() as u64 + 1,
                                cards,
                                layout_mode,
                                background_mode,
                                transform_mode,
                            });
                        }
                    }
                }
            }
        }
    }
    jobs
}

/// Decoded inputs shared read-only by every job.
#[derive(Clone, Debug)]
pub struct BatchInputs {
    /// Training cards.
    pub cards: SpritePool,
    /// Decoy cards for mosaic backdrops.
    pub fillers: SpritePool,
    /// Card id to class mapping.
    pub class_map: ClassMap,
}

impl BatchInputs {
    /// Fails when either pool is empty; no job could succeed without them.
    pub fn new(
        cards: SpritePool,
        fillers: SpritePool,
        class_map: ClassMap,
    ) -> MosaicResult<Self> {
        if cards.is_empty() {
            return Err(MosaicError::validation("no readable card images found"));
        }
        if fillers.is_empty() {
            return Err(MosaicError::validation("no readable filler images found"));
        }
        Ok(Self {
            cards,
            fillers,
            class_map,
        })
    }

    /// Reads the manifest and both sprite folders named in `config`.
    pub fn load(config: &MosaicConfig, parsers: &CardIdParserChain) -> MosaicResult<Self> {
        let paths = &config.paths;
        let class_map = ClassMap::from_csv_path(&paths.manifest)?;
        tracing::info!(
            manifest = %paths.manifest.display(),
            cards = class_map.len(),
            classes = class_map.class_count(),
            "class map loaded"
        );
        let cards = SpritePool::load_cards(&paths.cards_dir, config.sprite, parsers)?;
        let fillers = SpritePool::load_fillers(&paths.fillers_dir, config.sprite)?;
        Self::new(cards, fillers, class_map)
    }
}

struct OutputDirs {
    root: PathBuf,
    images: PathBuf,
    labels: PathBuf,
}

impl OutputDirs {
    fn create(root: &Path) -> MosaicResult<Self> {
        let dirs = Self {
            root: root.to_path_buf(),
            images: root.join("images"),
            labels: root.join("labels"),
        };
        for dir in [&dirs.images, &dirs.labels] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output dir '{}'", dir.display()))?;
        }
        Ok(dirs)
    }
}

/// Runs planned jobs and writes the dataset.
pub struct BatchDriver<'a> {
    config: &'a MosaicConfig,
    inputs: &'a BatchInputs,
    cancel: CancelToken,
    photo_source: Option<Box<dyn PhotoSource + 'a>>,
}

impl<'a> BatchDriver<'a> {
    /// Driver with a fresh cancel token and the default HTTP photo source.
    pub fn new(config: &'a MosaicConfig, inputs: &'a BatchInputs) -> Self {
        Self {
            config,
            inputs,
            cancel: CancelToken::new(),
            photo_source: None,
        }
    }

    /// Shares `cancel` with the caller, e.g. a Ctrl+C handler.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the HTTP source used for web backdrops.
    pub fn with_photo_source(mut self, source: impl PhotoSource + 'a) -> Self {
        self.photo_source = Some(Box::new(source));
        self
    }

    /// Plans and renders every job, then writes `data.yaml`.
    pub fn run(mut self, mode: RunMode) -> MosaicResult<BatchReport> {
        let config = self.config;
        config.validate()?;

        let run_seed = config.seed.unwrap_or_else(rand::random);
        let dirs = OutputDirs::create(&config.paths.output_dir)?;

        let mut synth =
            BackgroundSynthesizer::new(config.canvas, &self.inputs.fillers, config.tiling)
                .with_local_dir(&config.paths.backgrounds_dir)
                .with_web_cache_dir(&config.paths.web_cache_dir);
        if let Some(source) = self.photo_source.take() {
            synth = synth.with_web_source(source);
        } else if mode.may_fetch() {
            synth = synth.with_web_source(HttpPhotoSource::new(
                config.web.url.clone(),
                config.web.timeout(),
            )?);
        }
        let engine = LayoutEngine::new(
            config.grid,
            config.placement,
            config.clipping,
            &self.inputs.class_map,
            &synth,
        )?;

        let planned = plan_jobs(
            mode,
            self.inputs.cards.len(),
            config.group_size,
            config.variations,
            run_seed,
        );
        let mut report = BatchReport {
            run_seed,
            jobs_planned: planned.len() as u64,
            sprites_skipped: (self.inputs.cards.skipped() + self.inputs.fillers.skipped()) as u64,
            ..BatchReport::default()
        };
        let (skipped, jobs): (Vec<_>, Vec<_>) = planned
            .into_iter()
            .partition(|j| j.index < config.start_index);
        report.jobs_resumed_past = skipped.len() as u64;

        tracing::info!(
            run_seed,
            mode = ?mode,
            jobs = jobs.len(),
            start_index = config.start_index,
            parallel = config.threading.parallel,
            "starting batch"
        );

        let first_unrun = if config.threading.parallel {
            self.run_parallel(&engine, &jobs, run_seed, &dirs, &mut report)?
        } else {
            self.run_sequential(&engine, &jobs, run_seed, &dirs, &mut report)?
        };

        report.cancelled = first_unrun.is_some();
        report.next_index =
            first_unrun.unwrap_or_else(|| (report.jobs_planned + 1).max(config.start_index));

        let manifest_path = dirs.root.join("data.yaml");
        DatasetManifest::from_class_map(&self.inputs.class_map).write(&manifest_path)?;
        tracing::info!(path = %manifest_path.display(), "dataset manifest written");

        Ok(report)
    }

    fn run_sequential(
        &self,
        engine: &LayoutEngine<'_>,
        jobs: &[PlannedJob],
        run_seed: u64,
        dirs: &OutputDirs,
        report: &mut BatchReport,
    ) -> MosaicResult<Option<u64>> {
        for job in jobs {
            if self.cancel.is_cancelled() {
                tracing::warn!(index = job.index, "batch cancelled");
                return Ok(Some(job.index));
            }
            let stats = self.run_job(engine, job, run_seed, dirs)?;
            report.absorb(&stats);
        }
        Ok(None)
    }

    fn run_parallel(
        &self,
        engine: &LayoutEngine<'_>,
        jobs: &[PlannedJob],
        run_seed: u64,
        dirs: &OutputDirs,
        report: &mut BatchReport,
    ) -> MosaicResult<Option<u64>> {
        let pool = build_thread_pool(self.config.threading.threads)?;
        let chunk_size = self.config.threading.chunk_size.max(1);
        let mut first_unrun = None;

        for chunk in jobs.chunks(chunk_size) {
            if self.cancel.is_cancelled() {
                first_unrun = chunk.first().map(|j| j.index);
                break;
            }
            let results = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|job| -> MosaicResult<Option<LayoutStats>> {
                        if self.cancel.is_cancelled() {
                            return Ok(None);
                        }
                        self.run_job(engine, job, run_seed, dirs).map(Some)
                    })
                    .collect::<Vec<_>>()
            });
            for (job, result) in chunk.iter().zip(results) {
                match result? {
                    Some(stats) => report.absorb(&stats),
                    None => {
                        first_unrun.get_or_insert(job.index);
                    }
                }
            }
            if first_unrun.is_some() {
                tracing::warn!(index = ?first_unrun, "batch cancelled");
                break;
            }
        }
        Ok(first_unrun)
    }

    #[tracing::instrument(skip(self, engine, job, run_seed, dirs), fields(index = job.index))]
    fn run_job(
        &self,
        engine: &LayoutEngine<'_>,
        job: &PlannedJob,
        run_seed: u64,
        dirs: &OutputDirs,
    ) -> MosaicResult<LayoutStats> {
        let sprites = self.inputs.cards.sprites();
        let group: Vec<&CardSprite> = job.cards.iter().filter_map(|&i| sprites.get(i)).collect();
        let layout_job = LayoutJob {
            index: job.index,
            group,
            layout_mode: job.layout_mode,
            background_mode: job.background_mode,
            transform_mode: job.transform_mode,
        };
        let mut rng = StdRng::seed_from_u64(job_seed(run_seed, job.index));
        let output = engine.build_layout(&layout_job, &mut rng)?;
        write_pair(dirs, job.index, &output)?;
        tracing::debug!(
            layout = job.layout_mode.index(),
            background = job.background_mode.index(),
            transform = job.transform_mode.index(),
            annotations = output.annotations.len(),
            "layout written"
        );
        Ok(output.stats)
    }
}

/// File stem shared by an image and its label.
pub fn layout_stem(index: u64) -> String {
    format!("layout_{index:03}")
}

/// Writes both files under temporary names, then renames the label before the image
/// so a visible image always has its label.
fn write_pair(dirs: &OutputDirs, index: u64, output: &LayoutOutput) -> MosaicResult<()> {
    let stem = layout_stem(index);
    let image_path = dirs.images.join(format!("{stem}.png"));
    let label_path = dirs.labels.join(format!("{stem}.txt"));
    let mut image_tmp = TempFileGuard(Some(dirs.images.join(format!(".{stem}.png.tmp"))));
    let mut label_tmp = TempFileGuard(Some(dirs.labels.join(format!(".{stem}.txt.tmp"))));

    if let Some(tmp) = image_tmp.0.as_deref() {
        output
            .canvas
            .save_with_format(tmp, ImageFormat::Png)
            .with_context(|| format!("write image '{}'", tmp.display()))?;
    }
    if let Some(tmp) = label_tmp.0.as_deref() {
        std::fs::write(tmp, render_label_file(&output.annotations))
            .with_context(|| format!("write label '{}'", tmp.display()))?;
    }

    for (guard, dest) in [(&mut label_tmp, &label_path), (&mut image_tmp, &image_path)] {
        if let Some(tmp) = guard.0.as_deref() {
            std::fs::rename(tmp, dest)
                .with_context(|| format!("rename '{}' to '{}'", tmp.display(), dest.display()))?;
        }
        guard.0 = None;
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> MosaicResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().context("build rayon thread pool")?;
    Ok(pool)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/driver.rs"]
mod tests;
