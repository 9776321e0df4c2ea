//! Bar charts comparing one simulated property across materials.
//!
//! Every render batch is stamped with the Unix time it started at. File names
//! embed that stamp so a browser never serves a stale image for a metric that
//! was re-rendered. Artifacts are never removed by the renderer.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use once_cell::sync::OnceCell;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, RenderError};

/// Property a chart compares across materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Simulated hardness.
    Hardness,
    /// Simulated moisture resistance.
    MoistureResistance,
    /// Simulated tensile strength.
    TensileStrength,
}

impl Metric {
    /// Every metric, in the order charts are produced.
    pub const ALL: [Metric; 3] = [
        Metric::Hardness,
        Metric::MoistureResistance,
        Metric::TensileStrength,
    ];

    /// Identifier used in requests, responses and file names.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Metric::Hardness => "hardness",
            Metric::MoistureResistance => "moisture_resistance",
            Metric::TensileStrength => "tensile_strength",
        }
    }

    /// Chart title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Metric::Hardness => "Simulated Hardness",
            Metric::MoistureResistance => "Simulated Moisture Resistance (%)",
            Metric::TensileStrength => "Simulated Tensile Strength (MPa)",
        }
    }

    /// Label of the value axis.
    #[must_use]
    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::Hardness => "Hardness Value",
            Metric::MoistureResistance => "Moisture Resistance (%)",
            Metric::TensileStrength => "Tensile Strength (MPa)",
        }
    }

    /// Bar fill colour.
    #[must_use]
    pub fn colour(self) -> RGBColor {
        match self {
            // skyblue
            Metric::Hardness => RGBColor(135, 206, 235),
            // lightgreen
            Metric::MoistureResistance => RGBColor(144, 238, 144),
            // salmon
            Metric::TensileStrength => RGBColor(250, 128, 114),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.key() == key)
            .ok_or_else(|| EngineError::UnknownMetric(key.to_string()))
    }
}

/// Values of one metric keyed by material name, in insertion order.
///
/// # Examples
/// ```
/// use woodsim::ResultSet;
///
/// let mut results = ResultSet::new();
/// results.insert("Pine", 482.9);
/// results.insert("Oak", 676.1);
/// results.insert("Pine", 490.0);
/// assert_eq!(results.len(), 2);
/// assert_eq!(results.get("Pine"), Some(490.0));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    /// Material and value pairs; each material appears once.
    entries: Vec<(String, f64)>,
}

impl ResultSet {
    /// Create an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `material`, replacing an earlier value in place.
    pub fn insert(&mut self, material: impl Into<String>, value: f64) {
        let material = material.into();
        match self.entries.iter_mut().find(|(name, _)| *name == material) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((material, value)),
        }
    }

    /// Value recorded for `material`.
    #[must_use]
    pub fn get(&self, material: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == material)
            .map(|(_, value)| *value)
    }

    /// Material and value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no values are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Range of the value axis: always includes zero, leaves headroom above the
    /// tallest bar and never collapses to a single point.
    fn value_range(&self) -> (f64, f64) {
        let (low, high) = self
            .entries
            .iter()
            .fold((0.0_f64, 0.0_f64), |(low, high), (_, value)| {
                (low.min(*value), high.max(*value))
            });
        if low == high {
            return (0.0, 1.0);
        }
        (low * 1.1, high * 1.1)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut results = ResultSet::new();
        for (material, value) in iter {
            results.insert(material, value);
        }
        results
    }
}

/// Result sets to be charted together, one per metric.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotBatch {
    /// Result set per metric.
    sets: BTreeMap<Metric, ResultSet>,
}

impl PlotBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the results for `metric`, replacing any earlier set.
    #[must_use]
    pub fn with(mut self, metric: Metric, results: ResultSet) -> Self {
        self.insert(metric, results);
        self
    }

    /// Add the results for `metric`, replacing any earlier set.
    pub fn insert(&mut self, metric: Metric, results: ResultSet) {
        self.sets.insert(metric, results);
    }

    /// Metrics whose result sets hold at least one value.
    pub fn populated(&self) -> impl Iterator<Item = (Metric, &ResultSet)> {
        self.sets
            .iter()
            .filter(|(_, results)| !results.is_empty())
            .map(|(metric, results)| (*metric, results))
    }
}

/// Identity shared by every artifact of one render batch.
///
/// `sequence` is zero unless an earlier batch of the same renderer already used
/// `seconds`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityToken {
    /// Unix time of the batch in seconds.
    pub seconds: u64,
    /// Disambiguator for batches started within the same second.
    pub sequence: u32,
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sequence == 0 {
            write!(f, "{}", self.seconds)
        } else {
            write!(f, "{}_{}", self.seconds, self.sequence)
        }
    }
}

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    /// Seconds elapsed since the Unix epoch.
    fn unix_seconds(&self) -> u64;
}

/// [`Clock`] backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// Hands out strictly increasing identity tokens.
#[derive(Debug, Default)]
struct BatchClock {
    /// Token of the previous batch.
    last: Option<IdentityToken>,
}

impl BatchClock {
    /// Token for a batch starting at `now`. A clock reading at or before the
    /// previous batch reuses its seconds with the next sequence number.
    fn next(&mut self, now: u64) -> IdentityToken {
        let token = match self.last {
            Some(last) if now <= last.seconds => IdentityToken {
                seconds: last.seconds,
                sequence: last.sequence + 1,
            },
            _ => IdentityToken {
                seconds: now,
                sequence: 0,
            },
        };
        self.last = Some(token);
        token
    }
}

/// Where and how large charts are written.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSettings {
    /// Directory receiving the PNG files.
    pub artifact_dir: PathBuf,
    /// URL prefix under which `artifact_dir` is served.
    pub url_prefix: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// TrueType font for titles and labels. Common system locations are tried
    /// when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("static_simulation"),
            url_prefix: "/static_simulation".to_string(),
            width: 800,
            height: 600,
            font_path: None,
        }
    }
}

/// A chart written by [`ChartRenderer::render`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChartArtifact {
    /// Metric the chart shows.
    pub metric: Metric,
    /// Location of the PNG file.
    pub path: PathBuf,
    /// URL the file is served under.
    pub url: String,
    /// Identity of the batch the chart belongs to.
    pub identity: IdentityToken,
}

/// Fonts tried when no font path is configured.
const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Whether a font is registered with the drawing backend. Registration is
/// process wide and happens once.
static FONT_READY: OnceCell<bool> = OnceCell::new();

/// Register the first readable font under the `sans-serif` family.
fn register_chart_font(preferred: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = preferred
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONTS.into_iter().map(PathBuf::from));
        for candidate in candidates {
            let Ok(bytes) = fs::read(&candidate) else {
                continue;
            };
            // The backend keeps a reference for the rest of the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font("sans-serif", FontStyle::Normal, bytes).is_ok() {
                info!("chart text uses {}", candidate.display());
                return true;
            }
        }
        warn!("no usable font found; charts are drawn without titles or labels");
        false
    })
}

/// Draws bar charts into the artifact directory.
///
/// Batches are serialised: a second caller waits until the first batch has been
/// written. Each chart owns its drawing area only for the duration of its own
/// render.
pub struct ChartRenderer {
    /// Output location and image size.
    settings: ChartSettings,
    /// Time source for identity tokens.
    clock: Arc<dyn Clock>,
    /// Serialises batches and remembers the previous token.
    batches: Mutex<BatchClock>,
    /// Whether titles and labels can be drawn.
    text: bool,
}

impl fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("settings", &self.settings)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl ChartRenderer {
    /// Create a renderer that stamps batches with the system time.
    #[must_use]
    pub fn new(settings: ChartSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a renderer with an explicit time source.
    #[must_use]
    pub fn with_clock(settings: ChartSettings, clock: Arc<dyn Clock>) -> Self {
        let text = register_chart_font(settings.font_path.as_deref());
        info!(
            "chart artifacts accumulate in {} and are never removed",
            settings.artifact_dir.display()
        );
        Self {
            settings,
            clock,
            batches: Mutex::new(BatchClock::default()),
            text,
        }
    }

    /// Output settings.
    #[must_use]
    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    /// Render a chart for every populated metric of `batch`.
    ///
    /// All charts of the batch share one [`IdentityToken`]. Empty or absent
    /// result sets are skipped; a batch with nothing to draw writes no files and
    /// consumes no token.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ArtifactDirectory`] when the output directory cannot
    /// be created and [`RenderError::Drawing`] when a chart cannot be drawn or
    /// encoded.
    pub fn render(
        &self,
        batch: &PlotBatch,
    ) -> Result<BTreeMap<Metric, ChartArtifact>, RenderError> {
        let mut artifacts = BTreeMap::new();
        if batch.populated().next().is_none() {
            return Ok(artifacts);
        }

        // A panic in an earlier batch cannot leave the clock half updated.
        let mut batches = self.batches.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = &self.settings.artifact_dir;
        fs::create_dir_all(dir).map_err(|source| RenderError::ArtifactDirectory {
            path: dir.clone(),
            source,
        })?;

        let identity = batches.next(self.clock.unix_seconds());
        for (metric, results) in batch.populated() {
            let file_name = format!("{}_plot_{identity}.png", metric.key());
            let path = dir.join(&file_name);
            self.draw(metric, results, &path)
                .map_err(|err| RenderError::Drawing {
                    metric,
                    message: err.to_string(),
                })?;
            let url = format!("{}/{file_name}", self.settings.url_prefix.trim_end_matches('/'));
            info!("rendered {metric} chart to {}", path.display());
            artifacts.insert(
                metric,
                ChartArtifact {
                    metric,
                    path,
                    url,
                    identity,
                },
            );
        }
        Ok(artifacts)
    }

    /// Draw one bar per material and encode the chart to `path`.
    fn draw(&self, metric: Metric, results: &ResultSet, path: &Path) -> Result<(), Box<dyn Error>> {
        let root = BitMapBackend::new(path, (self.settings.width, self.settings.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let (low, high) = results.value_range();
        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.text {
            builder
                .caption(metric.title(), ("sans-serif", 24))
                .x_label_area_size(40)
                .y_label_area_size(70);
        }
        let mut chart = builder.build_cartesian_2d(bar_slots(results.len()), low..high)?;

        if self.text {
            let names: Vec<&str> = results.iter().map(|(name, _)| name).collect();
            let material_label = |x: &f64| bar_label(&names, *x);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(names.len())
                .x_label_formatter(&material_label)
                .y_desc(metric.axis_label())
                .draw()?;
        }

        chart.draw_series(results.iter().enumerate().map(|(index, (_, value))| {
            let centre = index as f64;
            Rectangle::new(
                [(centre - BAR_HALF_WIDTH, 0.0), (centre + BAR_HALF_WIDTH, value)],
                metric.colour().filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    }
}

/// Half the width of a bar in slot units.
const BAR_HALF_WIDTH: f64 = 0.4;

/// Horizontal extent of a chart with `bars` bars: one unit-wide slot per bar,
/// centred on the bar's index.
fn bar_slots(bars: usize) -> Range<f64> {
    -0.5..bars.max(1) as f64 - 0.5
}

/// Material name for an axis position, or nothing between bar centres.
fn bar_label(names: &[&str], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1.0e-6 || nearest < 0.0 {
        return String::new();
    }
    names
        .get(nearest as usize)
        .map_or_else(String::new, |name| (*name).to_string())
}

/// Build a [`PlotBatch`] from loosely typed result mappings.
///
/// Every value is coerced like a property input; the first value that fails
/// rejects the whole batch and names its field as `<metric>.<material>`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] for a value that is not a finite real
/// number.
pub fn batch_from_json<'a, I>(sets: I) -> Result<PlotBatch, EngineError>
where
    I: IntoIterator<Item = (Metric, &'a serde_json::Map<String, serde_json::Value>)>,
{
    let mut batch = PlotBatch::new();
    for (metric, raw) in sets {
        let mut results = ResultSet::new();
        for (material, value) in raw {
            let field = format!("{metric}.{material}");
            results.insert(material.clone(), crate::properties::coerce_real(&field, Some(value))?);
        }
        batch.insert(metric, results);
    }
    Ok(batch)
}
