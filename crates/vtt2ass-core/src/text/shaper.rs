//! rustybuzz-backed text metrics
//!
//! Fonts are read from disk once and kept as owned bytes in a
//! [`FontStore`]. Shaping parses a borrowed `rustybuzz::Face` per call,
//! which only reads table offsets, and shaped cluster widths are cached
//! per `(font, size, text)`.
//!
//! Font size follows the "real dimension" convention of ASS renderers:
//! a size of N pixels maps the OS/2 Windows ascent plus descent (or the
//! typographic metrics, or the bounding box) onto N pixels.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use rustybuzz::ttf_parser;
use tracing::{debug, info};

use super::TextMetrics;
use crate::layout::utf8_cluster_count;
use crate::{CoreError, CoreResult, TextExtents};

/// Shaped results kept before the cache is flushed
const SHAPE_CACHE_LIMIT: usize = 4096;

// =============================================================================
// Font Data
// =============================================================================

/// An owned font file with the metrics needed for scaling
#[derive(Debug)]
pub struct FontData {
    bytes: Vec<u8>,
    /// Font units that map onto the nominal font size
    real_dimension: f64,
    family_name: String,
}

impl FontData {
    /// Parses font bytes; `fallback_name` is used when the font has no
    /// usable name record
    pub fn from_bytes(bytes: Vec<u8>, fallback_name: &str) -> Result<Self, String> {
        let (real_dimension, family_name) = {
            let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| e.to_string())?;
            let dim = real_dimension(&face)
                .ok_or_else(|| "font has no usable vertical metrics".to_string())?;
            let name = family_name(&face).unwrap_or_else(|| fallback_name.to_string());
            (dim, name)
        };

        Ok(Self {
            bytes,
            real_dimension,
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Pixels per font unit at `size`
    pub fn scale(&self, size: f64) -> f64 {
        size / self.real_dimension
    }

    fn face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.bytes, 0)
    }
}

fn real_dimension(face: &ttf_parser::Face<'_>) -> Option<f64> {
    if let Some(os2) = face.tables().os2 {
        let dim = i32::from(os2.windows_ascender()) + i32::from(os2.windows_descender()).abs();
        if dim > 0 {
            return Some(f64::from(dim));
        }
    }

    let typo = i32::from(face.ascender()) - i32::from(face.descender());
    if typo > 0 {
        return Some(f64::from(typo));
    }

    let bbox = face.global_bounding_box();
    let height = i32::from(bbox.y_max) - i32::from(bbox.y_min);
    (height > 0).then(|| f64::from(height))
}

fn family_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    let lookup = |id: u16| {
        face.names()
            .into_iter()
            .filter(|name| name.name_id == id && name.is_unicode())
            .find_map(|name| decode_utf16_be(name.name))
            .filter(|s| !s.trim().is_empty())
    };

    lookup(ttf_parser::name_id::FULL_NAME)
        .or_else(|| lookup(ttf_parser::name_id::POST_SCRIPT_NAME))
        .or_else(|| lookup(ttf_parser::name_id::FAMILY))
}

/// Decodes a Unicode-platform name record (UTF-16BE)
fn decode_utf16_be(bytes: &[u8]) -> Option<String> {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

// =============================================================================
// Font Store
// =============================================================================

/// Fonts loaded so far, keyed by the path they were loaded from
#[derive(Debug, Default)]
pub struct FontStore {
    fonts: RwLock<HashMap<String, Arc<FontData>>>,
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key the font at `path` is stored under
    pub fn key_for(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    /// Loads a font file, or returns the already loaded copy
    pub fn load(&self, path: &Path) -> CoreResult<Arc<FontData>> {
        let key = Self::key_for(path);
        if let Some(font) = self.get(&key) {
            return Ok(font);
        }

        let load_err = |reason: String| CoreError::FontLoadFailed {
            path: key.clone(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| load_err(e.to_string()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        let font = Arc::new(FontData::from_bytes(bytes, &stem).map_err(load_err)?);

        info!("Loaded font '{}' from {}", font.family_name(), key);

        let mut fonts = self.fonts.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have raced us here; keep the first copy
        let font = fonts.entry(key).or_insert(font).clone();
        Ok(font)
    }

    pub fn get(&self, key: &str) -> Option<Arc<FontData>> {
        self.fonts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Shaping Metrics
// =============================================================================

type ShapeKey = (String, u64, String);

/// Text metrics from real fonts shaped with rustybuzz.
///
/// Ligatures and kerning are disabled so that every character keeps its
/// own cluster for justification.
#[derive(Debug, Default)]
pub struct ShapingMetrics {
    store: FontStore,
    shaped: RwLock<HashMap<ShapeKey, Arc<Vec<f64>>>>,
}

impl ShapingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates metrics with one font preloaded; returns the key to pass
    /// as `font` in later calls
    pub fn with_font(path: &Path) -> CoreResult<(Self, String)> {
        let metrics = Self::new();
        metrics.store.load(path)?;
        Ok((metrics, FontStore::key_for(path)))
    }

    pub fn store(&self) -> &FontStore {
        &self.store
    }

    fn font(&self, font: &str) -> CoreResult<Arc<FontData>> {
        match self.store.get(font) {
            Some(data) => Ok(data),
            None => self
                .store
                .load(Path::new(font))
                .map_err(|e| CoreError::ShapingError(e.to_string())),
        }
    }

    fn shaped_clusters(&self, font: &str, text: &str, size: f64) -> CoreResult<Arc<Vec<f64>>> {
        let key: ShapeKey = (font.to_string(), size.to_bits(), text.to_string());
        if let Some(hit) = self
            .shaped
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(hit.clone());
        }

        let data = self.font(font)?;
        let widths = Arc::new(shape_clusters(&data, text, size)?);

        let mut cache = self.shaped.write().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= SHAPE_CACHE_LIMIT {
            debug!("Flushing shaping cache ({} entries)", cache.len());
            cache.clear();
        }
        cache.insert(key, widths.clone());
        Ok(widths)
    }
}

fn shaping_features() -> [rustybuzz::Feature; 3] {
    let off = |tag: &[u8; 4]| rustybuzz::Feature::new(ttf_parser::Tag::from_bytes(tag), 0, ..);
    [off(b"liga"), off(b"clig"), off(b"kern")]
}

fn shape_clusters(font: &FontData, text: &str, size: f64) -> CoreResult<Vec<f64>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let face = font.face().ok_or_else(|| {
        CoreError::ShapingError(format!("cannot open font '{}'", font.family_name()))
    })?;
    let scale = font.scale(size);

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    let glyphs = rustybuzz::shape(&face, &shaping_features(), buffer);

    let mut widths: Vec<f64> = Vec::new();
    let mut current = None;
    for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
        let advance = f64::from(pos.x_advance) * scale;
        match widths.last_mut() {
            Some(width) if current == Some(info.cluster) => *width += advance,
            _ => {
                widths.push(advance);
                current = Some(info.cluster);
            }
        }
    }

    Ok(widths)
}

impl TextMetrics for ShapingMetrics {
    fn shape(
        &self,
        font: &str,
        text: &str,
        size: f64,
        letter_spacing: f64,
    ) -> CoreResult<TextExtents> {
        let clusters = self.shaped_clusters(font, text, size)?;
        let advance: f64 = clusters.iter().sum();
        // Spacing follows the character count, not the shaped clusters,
        // so a combining mark still receives its own gap
        let spacing = utf8_cluster_count(text) as f64 * letter_spacing;
        Ok(TextExtents::new(advance + spacing, size))
    }

    fn cluster_widths(&self, font: &str, text: &str, size: f64) -> CoreResult<Vec<f64>> {
        Ok(self.shaped_clusters(font, text, size)?.as_ref().clone())
    }

    fn family_name(&self, font: &str) -> Option<String> {
        self.store.get(font).map(|f| f.family_name().to_string())
    }
}
