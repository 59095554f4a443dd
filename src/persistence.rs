use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::sync::domain::{LngLat, Viewport};

pub const VIEW_KEY: &str = "vehicleMap";
pub const STYLE_KEY: &str = "map-style";
pub const DEFAULT_STYLE: &str = "alidade_smooth";

/// Last map position, stored as `"<zoom>/<lat>/<lng>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedView {
    pub zoom: f64,
    pub lat: f64,
    pub lng: f64,
}

impl SavedView {
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let center = viewport.center();
        Self {
            zoom: viewport.zoom,
            lat: center.lat,
            lng: center.lng,
        }
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }
}

impl fmt::Display for SavedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.lat, self.lng)
    }
}

impl FromStr for SavedView {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [zoom, lat, lng] = parts.as_slice() else {
            bail!("expected zoom/lat/lng, got {:?}", s);
        };
        Ok(Self {
            zoom: zoom.parse()?,
            lat: lat.parse()?,
            lng: lng.parse()?,
        })
    }
}

/// Best-effort key/value preference file.
///
/// Unreadable or malformed files read as empty, and failed writes are
/// logged and dropped. Keys this crate does not know are kept on write.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved viewport, if one was stored and parses.
    pub fn load_view(&self) -> Option<SavedView> {
        let raw = self.read().remove(VIEW_KEY)?;
        let raw = raw.as_str()?;
        match raw.parse() {
            Ok(view) => Some(view),
            Err(err) => {
                log::debug!("[PREFS] ignoring saved view {:?}: {}", raw, err);
                None
            }
        }
    }

    pub fn load_style(&self) -> String {
        self.read()
            .get(STYLE_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STYLE)
            .to_string()
    }

    pub fn save_view(&self, view: &SavedView) {
        self.save(VIEW_KEY, view.to_string());
    }

    pub fn save_style(&self, style: &str) {
        self.save(STYLE_KEY, style.to_string());
    }

    fn save(&self, key: &str, value: String) {
        match self.write(key, value) {
            Ok(()) => log::trace!("[PREFS] saved {}", key),
            Err(err) => log::debug!("[PREFS] could not save {}: {:#}", key, err),
        }
    }

    fn read(&self) -> Map<String, Value> {
        match self.try_read() {
            Ok(map) => map,
            Err(err) => {
                log::trace!("[PREFS] {}: {:#}", self.path.display(), err);
                Map::new()
            }
        }
    }

    fn try_read(&self) -> Result<Map<String, Value>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, key: &str, value: String) -> Result<()> {
        let mut map = self.read();
        map.insert(key.to_string(), Value::String(value));

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&map)?)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
