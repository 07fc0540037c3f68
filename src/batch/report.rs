use crate::layout::LayoutStats;

/// Aggregated counters for a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Seed every job seed was derived from.
    pub run_seed: u64,
    /// Jobs the run was asked for, including ones skipped for resumption.
    pub jobs_planned: u64,
    /// Image/label pairs written.
    pub jobs_written: u64,
    /// Jobs below the start index that were not rendered.
    pub jobs_resumed_past: u64,
    /// Label lines written.
    pub annotations_written: u64,
    /// Cards composited without a label.
    pub unlabeled_placements: u64,
    /// Sprite files that could not be decoded at load.
    pub sprites_skipped: u64,
    /// Cards skipped because their perspective was degenerate.
    pub degenerate_transforms: u64,
    /// Jobs whose photo backdrop fell back to white.
    pub background_fallbacks: u64,
    /// Boxes clamped to the canvas.
    pub boxes_clipped: u64,
    /// Boxes omitted at the canvas edge.
    pub boxes_dropped: u64,
    /// Index the next job would have had; pass it as the start index to resume.
    pub next_index: u64,
    /// The run stopped early on a cancel request.
    pub cancelled: bool,
}

impl BatchReport {
    pub(crate) fn absorb(&mut self, stats: &LayoutStats) {
        self.jobs_written += 1;
        self.annotations_written += stats.annotated;
        self.unlabeled_placements += stats.unlabeled;
        self.degenerate_transforms += stats.degenerate;
        self.boxes_clipped += stats.clipped;
        self.boxes_dropped += stats.dropped;
        if stats.background_fallback {
            self.background_fallbacks += 1;
        }
    }

    /// Emits the report as one structured log event.
    pub fn log(&self) {
        tracing::info!(
            run_seed = self.run_seed,
            planned = self.jobs_planned,
            written = self.jobs_written,
            resumed_past = self.jobs_resumed_past,
            annotations = self.annotations_written,
            unlabeled = self.unlabeled_placements,
            sprites_skipped = self.sprites_skipped,
            degenerate = self.degenerate_transforms,
            background_fallbacks = self.background_fallbacks,
            clipped = self.boxes_clipped,
            dropped = self.boxes_dropped,
            next_index = self.next_index,
            cancelled = self.cancelled,
            "batch finished"
        );
    }
}
