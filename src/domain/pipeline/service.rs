use super::error::PipelineError;
use super::layout::RunLayout;
use crate::domain::assembly::{AudioAssembler, MergeOutcome};
use crate::domain::news::{parse_news, render_news, render_show_notes, NewsItem, NewsSource, ScriptWriter};
use crate::domain::script::{speaker_counts, DialogueUnit, ScriptParser};
use crate::domain::shared::{missing_indices, scan_segments, SegmentFile};
use crate::domain::synthesis::JobOrchestrator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// News, show notes, script, audio and merge
    Full,
    /// Stop once the script is written and parsed
    ScriptOnly,
    /// Regenerate the script from an existing news list
    ScriptFromNews,
    /// Regenerate the show notes from an existing news list
    ShowNotes,
    /// Segments from the existing script, no merge
    SynthesisOnly,
    /// Segments from the existing script, then merge
    AudioOnly,
    /// Merge whatever segments exist
    MergeOnly,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Episode date, `%Y-%m-%d`
    pub date: String,
    pub mode: PipelineMode,
    pub rss_url: Option<String>,
    /// Reuse `news.txt` instead of fetching the feed
    pub skip_fetch: bool,
    /// Unit indices (0-based) to synthesize again, replacing their segments
    pub indices: Vec<usize>,
}

impl PipelineRequest {
    pub fn new(date: impl Into<String>, mode: PipelineMode) -> Self {
        Self {
            date: date.into(),
            mode,
            rss_url: None,
            skip_fetch: false,
            indices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Clip prepended to every episode
    pub intro_path: Option<PathBuf>,
    /// Merge even when segments are missing
    pub allow_gaps: bool,
    /// Rebuild merged outputs even when they already exist
    pub overwrite: bool,
    pub news_limit: usize,
    pub default_rss_url: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            intro_path: None,
            allow_gaps: false,
            overwrite: false,
            news_limit: 10,
            default_rss_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue_units: Option<usize>,
    pub synthesized: usize,
    pub skipped: usize,
    /// Unit indices that produced no segment
    pub failed: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub segments: usize,
    /// The output already existed and was kept
    pub skipped: bool,
    pub with_intro: bool,
}

/// Sequences news, script, synthesis and assembly for one episode date.
///
/// Every stage treats files already on disk as finished work, so an
/// interrupted run can be resumed by running the same mode again.
pub struct PipelineDriver {
    output_root: PathBuf,
    parser: ScriptParser,
    assembler: AudioAssembler,
    orchestrator: Option<JobOrchestrator>,
    news_source: Option<Arc<dyn NewsSource>>,
    script_writer: Option<Arc<dyn ScriptWriter>>,
    options: PipelineOptions,
}

impl PipelineDriver {
    pub fn new(output_root: PathBuf, assembler: AudioAssembler, options: PipelineOptions) -> Self {
        Self {
            output_root,
            parser: ScriptParser::default(),
            assembler,
            orchestrator: None,
            news_source: None,
            script_writer: None,
            options,
        }
    }

    pub fn with_parser(mut self, parser: ScriptParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: JobOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn with_news_source(mut self, news_source: Arc<dyn NewsSource>) -> Self {
        self.news_source = Some(news_source);
        self
    }

    pub fn with_script_writer(mut self, script_writer: Arc<dyn ScriptWriter>) -> Self {
        self.script_writer = Some(script_writer);
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn layout(&self, date: &str) -> RunLayout {
        RunLayout::new(&self.output_root, date)
    }

    pub fn assembler(&self) -> &AudioAssembler {
        &self.assembler
    }

    /// Name of the TTS provider, if synthesis is available
    pub fn provider(&self) -> Option<&'static str> {
        self.orchestrator.as_ref().map(|o| o.provider())
    }

    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineSummary, PipelineError> {
        let layout = self.layout(&request.date);
        tokio::fs::create_dir_all(layout.dir()).await?;

        tracing::info!(
            date = %request.date,
            mode = ?request.mode,
            dir = %layout.dir().display(),
            "Starting pipeline"
        );

        let mut summary = PipelineSummary {
            date: request.date.clone(),
            ..Default::default()
        };

        match request.mode {
            PipelineMode::ShowNotes => {
                let news = self.read_news(&layout).await?;
                summary.news_items = Some(news.len());
                self.write_show_notes(&layout, &news).await?;
            }
            PipelineMode::ScriptFromNews => {
                let news = self.read_news(&layout).await?;
                summary.news_items = Some(news.len());
                let units = self.generate_script(&layout, &news).await?;
                summary.dialogue_units = Some(units.len());
            }
            PipelineMode::ScriptOnly => {
                let news = self.obtain_news(&layout, request).await?;
                summary.news_items = Some(news.len());
                self.write_show_notes(&layout, &news).await?;
                let units = self.generate_script(&layout, &news).await?;
                summary.dialogue_units = Some(units.len());
            }
            PipelineMode::Full => {
                let news = self.obtain_news(&layout, request).await?;
                summary.news_items = Some(news.len());
                self.write_show_notes(&layout, &news).await?;

                let units = if !self.options.overwrite && path_exists(&layout.script_path()).await {
                    tracing::info!(path = %layout.script_path().display(), "Script exists, reusing it");
                    self.load_units(&layout).await?
                } else {
                    self.generate_script(&layout, &news).await?
                };
                summary.dialogue_units = Some(units.len());

                self.synthesize(&layout, units, request, &mut summary, true).await?;
            }
            PipelineMode::SynthesisOnly | PipelineMode::AudioOnly => {
                let units = self.load_units(&layout).await?;
                summary.dialogue_units = Some(units.len());
                let merge = request.mode == PipelineMode::AudioOnly;
                self.synthesize(&layout, units, request, &mut summary, merge).await?;
            }
            PipelineMode::MergeOnly => {
                let units = if path_exists(&layout.script_path()).await {
                    Some(self.load_units(&layout).await?)
                } else {
                    None
                };
                summary.merge = Some(self.assemble(&layout, units.as_deref(), false).await?);
            }
        }

        tracing::info!(
            date = %summary.date,
            news_items = ?summary.news_items,
            dialogue_units = ?summary.dialogue_units,
            synthesized = summary.synthesized,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            output = ?summary.merge.as_ref().map(|m| m.output.display().to_string()),
            "Pipeline finished"
        );

        Ok(summary)
    }

    /// Units of the episode's script, or `None` when no script exists yet
    pub async fn episode_units(&self, date: &str) -> Result<Option<Vec<DialogueUnit>>, PipelineError> {
        let path = self.layout(date).script_path();
        if !path_exists(&path).await {
            return Ok(None);
        }
        Ok(Some(self.parser.parse_file(&path).await?))
    }

    async fn obtain_news(
        &self,
        layout: &RunLayout,
        request: &PipelineRequest,
    ) -> Result<Vec<NewsItem>, PipelineError> {
        if request.skip_fetch {
            tracing::info!(path = %layout.news_path().display(), "Skipping fetch, using existing news");
            return self.read_news(layout).await;
        }

        let source = self
            .news_source
            .as_ref()
            .ok_or(PipelineError::Configuration("news source"))?;
        let feed_url = request
            .rss_url
            .as_deref()
            .unwrap_or(&self.options.default_rss_url);
        if feed_url.trim().is_empty() {
            return Err(PipelineError::Configuration("RSS URL"));
        }

        let items = source
            .fetch(feed_url, self.options.news_limit)
            .await
            .map_err(PipelineError::News)?;
        tokio::fs::write(layout.news_path(), render_news(&items)).await?;

        tracing::info!(items = items.len(), path = %layout.news_path().display(), "Saved news");
        Ok(items)
    }

    async fn read_news(&self, layout: &RunLayout) -> Result<Vec<NewsItem>, PipelineError> {
        let path = layout.news_path();
        if !path_exists(&path).await {
            return Err(PipelineError::MissingNews(path));
        }
        let text = tokio::fs::read_to_string(&path).await?;
        Ok(parse_news(&text))
    }

    async fn write_show_notes(&self, layout: &RunLayout, news: &[NewsItem]) -> Result<(), PipelineError> {
        let path = layout.show_notes_path();
        tokio::fs::write(&path, render_show_notes(layout.date(), news)).await?;
        tracing::info!(path = %path.display(), "Saved show notes");
        Ok(())
    }

    async fn generate_script(
        &self,
        layout: &RunLayout,
        news: &[NewsItem],
    ) -> Result<Vec<DialogueUnit>, PipelineError> {
        let writer = self
            .script_writer
            .as_ref()
            .ok_or(PipelineError::Configuration("script writer"))?;

        let script = writer
            .write_script(news)
            .await
            .map_err(PipelineError::ScriptWriter)?;
        let script_path = layout.script_path();
        let previous = if path_exists(&script_path).await {
            Some(self.parser.parse_file(&script_path).await?)
        } else {
            None
        };

        tokio::fs::write(&script_path, &script).await?;
        tracing::info!(chars = script.chars().count(), path = %script_path.display(), "Saved script");

        let units = self.parser.parse(&script);
        if previous.as_deref() != Some(units.as_slice()) {
            discard_audio(layout).await?;
        }
        if units.is_empty() {
            return Err(PipelineError::EmptyScript(script_path));
        }
        log_speakers(&units);

        tokio::fs::write(layout.dialogues_path(), serde_json::to_vec_pretty(&units)?).await?;
        Ok(units)
    }

    async fn load_units(&self, layout: &RunLayout) -> Result<Vec<DialogueUnit>, PipelineError> {
        let path = layout.script_path();
        if !path_exists(&path).await {
            return Err(PipelineError::MissingScript(path));
        }

        let units = self.parser.parse_file(&path).await?;
        if units.is_empty() {
            return Err(PipelineError::EmptyScript(path));
        }
        log_speakers(&units);
        Ok(units)
    }

    async fn synthesize(
        &self,
        layout: &RunLayout,
        units: Vec<DialogueUnit>,
        request: &PipelineRequest,
        summary: &mut PipelineSummary,
        merge: bool,
    ) -> Result<(), PipelineError> {
        let orchestrator = self
            .orchestrator
            .as_ref()
            .ok_or(PipelineError::Configuration("TTS provider"))?;

        let selected = self.select_units(layout, &units, &request.indices).await?;
        let report = orchestrator.run(selected, &layout.splits_dir()).await?;

        summary.synthesized = report.succeeded_count();
        summary.skipped = report.skipped.len();
        summary.failed = report.failed_indices();

        if merge {
            let fresh = !report.segments.is_empty();
            summary.merge = Some(self.assemble(layout, Some(&units), fresh).await?);
        }
        Ok(())
    }

    /// With explicit indices, drops every other unit and deletes the
    /// existing segments of the selected ones so they are synthesized again
    async fn select_units(
        &self,
        layout: &RunLayout,
        units: &[DialogueUnit],
        indices: &[usize],
    ) -> Result<Vec<DialogueUnit>, PipelineError> {
        if indices.is_empty() {
            return Ok(units.to_vec());
        }

        let wanted: HashSet<usize> = indices.iter().copied().collect();
        let selected: Vec<DialogueUnit> = units
            .iter()
            .filter(|unit| wanted.contains(&unit.index))
            .cloned()
            .collect();

        let known: HashSet<usize> = selected.iter().map(|unit| unit.index).collect();
        let unknown: Vec<usize> = wanted.difference(&known).copied().collect();
        if !unknown.is_empty() {
            tracing::warn!(indices = ?unknown, units = units.len(), "Ignoring indices outside the script");
        }

        for unit in &selected {
            let segment = SegmentFile::for_unit(&layout.splits_dir(), unit.index);
            if segment.exists().await {
                tokio::fs::remove_file(&segment.path).await?;
                tracing::info!(path = %segment.path.display(), "Removed segment for regeneration");
            }
        }
        if !selected.is_empty() {
            discard_merged(layout).await?;
        }

        Ok(selected)
    }

    async fn assemble(
        &self,
        layout: &RunLayout,
        units: Option<&[DialogueUnit]>,
        fresh_segments: bool,
    ) -> Result<MergeSummary, PipelineError> {
        let splits = layout.splits_dir();
        let scanned = if path_exists(&splits).await {
            scan_segments(&splits).await?
        } else {
            Vec::new()
        };

        let (expected, segments): (Vec<usize>, Vec<SegmentFile>) = match units {
            Some(units) => {
                let expected: HashSet<usize> = units.iter().map(|unit| unit.index).collect();
                let (kept, stray): (Vec<SegmentFile>, Vec<SegmentFile>) = scanned
                    .into_iter()
                    .partition(|segment| expected.contains(&segment.index));
                if !stray.is_empty() {
                    tracing::warn!(count = stray.len(), "Ignoring segments not in the script");
                }
                (expected.into_iter().collect(), kept)
            }
            None => {
                let expected = scanned
                    .last()
                    .map(|segment| (0..=segment.index).collect())
                    .unwrap_or_default();
                (expected, scanned)
            }
        };

        let missing = missing_indices(expected, &segments);
        if !missing.is_empty() {
            let parts: Vec<usize> = missing.iter().map(|index| index + 1).collect();
            if !self.options.allow_gaps {
                return Err(PipelineError::MissingSegments { parts });
            }
            tracing::warn!(parts = ?parts, "Merging with missing segments");
        }

        let paths: Vec<PathBuf> = segments.into_iter().map(|segment| segment.path).collect();
        let skip_if_exists = !self.options.overwrite && !fresh_segments;
        let output = layout.final_audio_path();

        let mut intro = self.options.intro_path.as_deref();
        if let Some(path) = intro {
            if !path_exists(path).await {
                tracing::warn!(path = %path.display(), "Intro not found, merging without it");
                intro = None;
            }
        }

        let (outcome, with_intro) = match intro {
            Some(intro) => {
                let body = layout.body_path();
                let body_outcome = self.assembler.merge(&paths, &body, skip_if_exists).await?;
                let keep_final = skip_if_exists && body_outcome == MergeOutcome::Skipped;
                let outcome = self
                    .assembler
                    .merge_with_intro(intro, &body, &output, keep_final)
                    .await?;
                (outcome, true)
            }
            None => (self.assembler.merge(&paths, &output, skip_if_exists).await?, false),
        };

        Ok(MergeSummary {
            output,
            segments: paths.len(),
            skipped: outcome == MergeOutcome::Skipped,
            with_intro,
        })
    }
}

fn log_speakers(units: &[DialogueUnit]) {
    for (speaker, count) in speaker_counts(units) {
        tracing::info!(speaker = speaker.display_name(), lines = count, "Dialogue lines");
    }
}

/// Segments and merged files no longer match the script
async fn discard_audio(layout: &RunLayout) -> Result<(), PipelineError> {
    let splits = layout.splits_dir();
    if path_exists(&splits).await {
        tokio::fs::remove_dir_all(&splits).await?;
        tracing::info!(path = %splits.display(), "Script changed, removed old segments");
    }
    discard_merged(layout).await
}

/// Merged files no longer match the segments
async fn discard_merged(layout: &RunLayout) -> Result<(), PipelineError> {
    for path in [layout.body_path(), layout.final_audio_path()] {
        if path_exists(&path).await {
            tokio::fs::remove_file(&path).await?;
            tracing::info!(path = %path.display(), "Removed stale merged audio");
        }
    }
    Ok(())
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
