use anyhow::Context;
use bevy::prelude::*;
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

use crate::chest::components::LootTable;
use crate::currency::components::CurrencyTier;
use crate::data::schema::EquipmentCategory;
use crate::inventory::grid::GridLayout;

pub const CONFIG_PATH: &str = "assets/config/game.toml";

/// 全局配置（assets/config/game.toml）
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub scene: String,
    pub inventory: GridLayout,
    pub quick_access: QuickAccessConfig,
    pub save: SaveConfig,
    /// 从高到低排列
    pub currency: Vec<CurrencyTier>,
    pub shop: ShopConfig,
    pub chests: Vec<ChestConfig>,
    pub pickups: Vec<PickupConfig>,
    pub scene_objects: Vec<SceneObjectConfig>,
    pub slot_watchers: Vec<SlotWatcherConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scene: "Main".into(),
            inventory: GridLayout { rows: 4, columns: 5, total_slots: 20 },
            quick_access: QuickAccessConfig::default(),
            save: SaveConfig::default(),
            currency: vec![
                CurrencyTier::new("Gold", 0),
                CurrencyTier::new("Silver", 100),
                CurrencyTier::new("Copper", 100),
            ],
            shop: ShopConfig::default(),
            chests: Vec::new(),
            pickups: Vec::new(),
            scene_objects: Vec::new(),
            slot_watchers: Vec::new(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// 读不到就用默认值，不让游戏因为配置崩掉
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("配置加载失败，使用默认配置: {e:#}");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuickAccessConfig {
    pub total_slots: usize,
}

impl Default for QuickAccessConfig {
    fn default() -> Self {
        Self { total_slots: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub path: PathBuf,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("saves/game_save.json") }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub name: String,
    pub sell_percentage: f32,
    pub items: Vec<ShopItemConfig>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self { name: "Shop".into(), sell_percentage: 0.75, items: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopItemConfig {
    pub item: String,
    #[serde(default)] pub quantity: u32,
    #[serde(default)] pub infinite: bool,
    /// 缺省时用物品的 base_price
    #[serde(default)] pub price: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChestConfig {
    pub name: String,
    #[serde(default = "chest_layout")] pub layout: GridLayout,
    #[serde(default)] pub position: [f32; 3],
    #[serde(default = "open_angle")] pub open_angle: [f32; 3],
    #[serde(default = "animation_duration")] pub animation_duration: f32,
    #[serde(default)] pub same_key_to_close: bool,
    #[serde(default)] pub open_sound: Option<String>,
    #[serde(default)] pub close_sound: Option<String>,
    #[serde(default)] pub toggle_objects: Vec<String>,
    #[serde(default)] pub loot: LootTable,
}

fn chest_layout() -> GridLayout {
    GridLayout { rows: 4, columns: 5, total_slots: 20 }
}

fn open_angle() -> [f32; 3] {
    [0.0, 0.0, 90.0]
}

fn animation_duration() -> f32 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum PickupConfig {
    Item {
        item: String,
        #[serde(default = "one")] quantity: u32,
        #[serde(default)] position: [f32; 3],
    },
    Currency {
        amounts: Vec<CurrencyAmountConfig>,
        #[serde(default)] position: [f32; 3],
    },
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyAmountConfig {
    pub currency: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneObjectConfig {
    pub path: String,
    #[serde(default)] pub position: [f32; 3],
}

/// 某类装备穿上时隐藏 disable、显示 enable
#[derive(Debug, Clone, Deserialize)]
pub struct SlotWatcherConfig {
    pub category: EquipmentCategory,
    #[serde(default)] pub disable: Vec<String>,
    #[serde(default)] pub enable: Vec<String>,
}

/// 当前场景名（存档用）
#[derive(Resource, Debug, Clone, Default)]
pub struct CurrentScene(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let config = GameConfig::parse(
            r#"
            scene = "Village"

            [inventory]
            rows = 2
            columns = 5
            total_slots = 22

            [[currency]]
            name = "Gold"
            conversion_rate = 0

            [[currency]]
            name = "Copper"
            conversion_rate = 100
            amount = 40

            [[chests]]
            name = "Cellar"

            [[pickups]]
            kind = "Item"
            item = "apple"
            "#,
        )
        .unwrap();

        assert_eq!(config.scene, "Village");
        assert_eq!(config.inventory.total_slots, 22);
        assert_eq!(config.quick_access.total_slots, 10);
        assert_eq!(config.currency.len(), 2);
        assert_eq!(config.currency[1].amount, 40);
        assert_eq!(config.chests[0].layout.total_slots, 20);
        assert!((config.chests[0].animation_duration - 0.5).abs() < f32::EPSILON);
        assert!(matches!(config.pickups[0], PickupConfig::Item { quantity: 1, .. }));
        assert!((config.shop.sell_percentage - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_file_is_an_error_but_load_or_default_survives() {
        assert!(GameConfig::load("does/not/exist.toml").is_err());
        let config = GameConfig::load_or_default("does/not/exist.toml");
        assert_eq!(config.currency.len(), 3);
    }
}
