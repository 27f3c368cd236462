use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;
use voxelhooks_scripting::{addons::AddonSettings, HostSettings};
use voxelhooks_world::{GrowthDropSettings, ShulkerSettings};

pub const DEFAULT_CONFIG_PATH: &str = "config/addons.toml";

/// Headless host configuration (`config/addons.toml`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AddonConfig {
    /// Seed of the host random source.
    pub seed: u64,
    pub host: HostSection,
    pub growth: GrowthDropSettings,
    pub shulker: ShulkerSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSection {
    /// Ticks between block component ticks.
    pub component_tick_interval: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            component_tick_interval: 1,
        }
    }
}

impl AddonConfig {
    /// Load configuration from `path`, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                if path == Path::new(DEFAULT_CONFIG_PATH)
                    && err.kind() == std::io::ErrorKind::NotFound
                {
                    warn!("Add-on config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                return Self::default();
            }
        };

        match toml::from_str::<AddonConfig>(&contents) {
            Ok(mut cfg) => {
                cfg.sanitize(path);
                cfg
            }
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn host_settings(&self) -> HostSettings {
        HostSettings {
            component_tick_interval: self.host.component_tick_interval,
            seed: self.seed,
        }
    }

    pub fn addon_settings(&self) -> AddonSettings {
        AddonSettings {
            growth: self.growth.clone(),
            shulker: self.shulker.clone(),
            recipes: None,
        }
    }

    // Chances outside [0, 1], non-finite distances and inverted height bands are pulled back into range.
    fn sanitize(&mut self, path: &Path) {
        let clamp_chance = |name: &str, value: &mut f64| {
            if !(0.0..=1.0).contains(&*value) || value.is_nan() {
                warn!("{}: {name} = {value} is not a probability; clamping", path.display());
                *value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
            }
        };
        clamp_chance("growth.drop_chance", &mut self.growth.drop_chance);
        clamp_chance("shulker.respawn_chance", &mut self.shulker.respawn_chance);

        let defaults = ShulkerSettings::default();
        let shulker = &mut self.shulker;
        for (name, value, fallback) in [
            ("shulker.min_y", &mut shulker.min_y, defaults.min_y),
            ("shulker.max_y", &mut shulker.max_y, defaults.max_y),
            ("shulker.check_range", &mut shulker.check_range, defaults.check_range),
            ("shulker.cluster_radius", &mut shulker.cluster_radius, defaults.cluster_radius),
        ] {
            if !value.is_finite() {
                warn!("{}: {name} = {value} is not finite; using {fallback}", path.display());
                *value = fallback;
            }
        }

        if self.shulker.min_y > self.shulker.max_y {
            warn!(
                "{}: shulker.min_y is above shulker.max_y; swapping",
                path.display()
            );
            std::mem::swap(&mut self.shulker.min_y, &mut self.shulker.max_y);
        }
        if self.host.component_tick_interval == 0 {
            warn!("{}: host.component_tick_interval = 0; using 1", path.display());
            self.host.component_tick_interval = 1;
        }
    }
}
