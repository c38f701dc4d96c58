use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::character::components::PlayerStatus;
use crate::core::events::PresentationCue;
use crate::currency::components::{CurrencyData, CurrencyLedger};
use crate::data::catalog::ItemCatalog;
use crate::equipment::components::{EquipContext, Equipment};
use crate::inventory::grid::{SavedStack, SlotGrid};
use crate::quick_access::components::QuickAccessBar;

/// 当前存档格式版本；没有 version 字段的旧存档按 0 处理
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChestSaveData {
    pub chest_name: String,
    pub items: Vec<SavedStack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObjectState {
    pub name_path: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub is_active: bool,
}

impl SceneObjectState {
    pub fn capture(path: &str, transform: &Transform, visibility: &Visibility) -> Self {
        Self {
            name_path: path.to_string(),
            position: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
            is_active: *visibility != Visibility::Hidden,
        }
    }

    pub fn apply(&self, transform: &mut Transform, visibility: &mut Visibility) {
        transform.translation = Vec3::from_array(self.position);
        transform.rotation = Quat::from_array(self.rotation).normalize();
        *visibility = if self.is_active { Visibility::Inherited } else { Visibility::Hidden };
    }
}

/// 存档文件（JSON，camelCase）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSaveData {
    #[serde(default)]
    pub version: u32,
    pub inventory_items: Vec<SavedStack>,
    pub equipment_items: Vec<SavedStack>,
    pub quick_access_items: Vec<SavedStack>,
    #[serde(default)]
    pub chest_items: Vec<ChestSaveData>,
    pub currency_amounts: Vec<CurrencyData>,
    pub player_position: [f32; 3],
    pub current_scene: String,
    pub player_status: PlayerStatus,
    /// None 表示存档时没有场景物体管理，读档时不动场景
    #[serde(default)]
    pub scene_object_states: Option<Vec<SceneObjectState>>,
}

impl GameSaveData {
    /// 玩家身上的部分；箱子、位置、场景物体由调用方补上
    pub fn capture(
        backpack: &SlotGrid,
        equipment: &Equipment,
        quick: &QuickAccessBar,
        ledger: &CurrencyLedger,
        status: &PlayerStatus,
    ) -> Self {
        Self {
            version: SAVE_VERSION,
            inventory_items: backpack.snapshot(),
            equipment_items: equipment.snapshot(),
            quick_access_items: quick.snapshot(),
            chest_items: Vec::new(),
            currency_amounts: ledger.snapshot(),
            player_position: [0.0; 3],
            current_scene: String::new(),
            player_status: status.clone(),
            scene_object_states: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file not found: {0}")]
    NotFound(PathBuf),
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// 读档时要改写的玩家状态
pub struct PlayerState<'a> {
    pub backpack: &'a mut SlotGrid,
    pub equipment: &'a mut Equipment,
    pub quick: &'a mut QuickAccessBar,
    pub ledger: &'a mut CurrencyLedger,
    pub status: &'a mut PlayerStatus,
    pub cues: &'a mut Vec<PresentationCue>,
}

impl PlayerState<'_> {
    /// 清空后按存档恢复；属性最后整体覆盖。返回跳过的条目名
    pub fn restore(&mut self, data: &GameSaveData, catalog: &ItemCatalog) -> Vec<String> {
        self.equipment.clear(self.status, self.cues);
        self.backpack.clear();
        self.quick.grid.clear();

        let mut skipped = self.backpack.restore(&data.inventory_items, catalog);
        let mut ctx = EquipContext {
            backpack: &mut *self.backpack,
            status: &mut *self.status,
            cues: &mut *self.cues,
        };
        skipped.extend(self.equipment.restore(&data.equipment_items, catalog, &mut ctx));
        skipped.extend(self.quick.restore(&data.quick_access_items, catalog));
        skipped.extend(self.ledger.restore(&data.currency_amounts));
        *self.status = data.player_status.clone();
        skipped
    }
}

/// 存档文件位置
#[derive(Resource, Debug, Clone)]
pub struct SaveLoadManager {
    pub path: PathBuf,
}

impl SaveLoadManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, data: &GameSaveData) -> Result<(), SaveError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;
        info!("游戏已保存到 {}", self.path.display());
        Ok(())
    }

    /// 先完整读出并校验，失败时不改任何状态
    pub fn read(&self) -> Result<GameSaveData, SaveError> {
        if !self.path.exists() {
            error!("存档不存在: {}", self.path.display());
            return Err(SaveError::NotFound(self.path.clone()));
        }
        let json = std::fs::read_to_string(&self.path)?;
        let data: GameSaveData = serde_json::from_str(&json)?;
        if data.version > SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: data.version,
                supported: SAVE_VERSION,
            });
        }
        Ok(data)
    }
}

impl Default for SaveLoadManager {
    fn default() -> Self {
        Self::new("saves/game_save.json")
    }
}

/// 需要存档的场景物体；path 是它在场景里的层级路径
#[derive(Component, Debug, Clone)]
pub struct SceneObject {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::components::CurrencyTier;
    use crate::data::catalog::fixtures;
    use crate::inventory::grid::GridLayout;
    use tempfile::TempDir;

    struct Rig {
        backpack: SlotGrid,
        equipment: Equipment,
        quick: QuickAccessBar,
        ledger: CurrencyLedger,
        status: PlayerStatus,
        cues: Vec<PresentationCue>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                backpack: SlotGrid::new(GridLayout { rows: 4, columns: 5, total_slots: 20 }),
                equipment: Equipment::default(),
                quick: QuickAccessBar::new(10),
                ledger: CurrencyLedger::new(vec![
                    CurrencyTier::new("Gold", 0),
                    CurrencyTier::new("Silver", 100),
                    CurrencyTier::new("Copper", 100),
                ]),
                status: PlayerStatus::default(),
                cues: Vec::new(),
            }
        }

        fn capture(&self) -> GameSaveData {
            GameSaveData::capture(
                &self.backpack,
                &self.equipment,
                &self.quick,
                &self.ledger,
                &self.status,
            )
        }

        fn state(&mut self) -> PlayerState<'_> {
            PlayerState {
                backpack: &mut self.backpack,
                equipment: &mut self.equipment,
                quick: &mut self.quick,
                ledger: &mut self.ledger,
                status: &mut self.status,
                cues: &mut self.cues,
            }
        }
    }

    #[test]
    fn save_then_load_reconstructs_state() {
        let catalog = fixtures::catalog();
        let mut rig = Rig::new();
        rig.backpack.add(&fixtures::item(&catalog, "potion"), 3).unwrap();
        rig.backpack.add(&fixtures::item(&catalog, "sword"), 1).unwrap();
        let mut ctx = EquipContext {
            backpack: &mut rig.backpack,
            status: &mut rig.status,
            cues: &mut rig.cues,
        };
        rig.equipment.equip(&fixtures::item(&catalog, "helmet"), &mut ctx).unwrap();
        rig.ledger.add_currency("Gold", 1).unwrap();
        rig.ledger.add_currency("Copper", 50).unwrap();
        rig.status.health = 42;

        let dir = TempDir::new().unwrap();
        let manager = SaveLoadManager::new(dir.path().join("nested/game_save.json"));
        let saved = rig.capture();
        manager.write(&saved).unwrap();

        let mut fresh = Rig::new();
        fresh.backpack.add(&fixtures::item(&catalog, "arrow"), 9).unwrap();
        let data = manager.read().unwrap();
        let skipped = fresh.state().restore(&data, &catalog);

        assert!(skipped.is_empty());
        assert_eq!(fresh.capture(), saved);
        assert_eq!(fresh.status, rig.status);
        assert_eq!(fresh.ledger.get_amount("Gold"), 1);
        assert_eq!(fresh.ledger.get_amount("Copper"), 50);
    }

    #[test]
    fn legacy_save_resolves_by_name_and_skips_unknown() {
        let catalog = fixtures::catalog();
        let json = r#"{
            "inventoryItems": [
                {"itemName": "Health Potion", "quantity": 2},
                {"itemName": "Old Relic", "quantity": 1}
            ],
            "equipmentItems": [{"itemName": "HELMET", "quantity": 1}],
            "quickAccessItems": [],
            "chestItems": [{"chestName": "Cellar", "items": []}],
            "currencyAmounts": [{"name": "Silver", "amount": 7}],
            "playerPosition": [1.0, 0.0, 2.0],
            "currentScene": "Main",
            "playerStatus": {
                "health": 80, "stamina": 50, "mana": 50, "strength": 10,
                "agility": 10, "intelligence": 10, "attack": 10, "defense": 13,
                "block": 10, "maxHealth": 100, "maxMana": 100, "maxStamina": 100,
                "speed": 10, "dexterity": 10, "luck": 10
            }
        }"#;
        let dir = TempDir::new().unwrap();
        let manager = SaveLoadManager::new(dir.path().join("game_save.json"));
        std::fs::write(manager.path(), json).unwrap();

        let data = manager.read().unwrap();
        assert_eq!(data.version, 0);
        assert!(data.scene_object_states.is_none());

        let mut rig = Rig::new();
        let skipped = rig.state().restore(&data, &catalog);
        assert_eq!(skipped, vec!["Old Relic".to_string()]);
        assert_eq!(rig.backpack.count_of(fixtures::item(&catalog, "potion").item_id()), 2);
        assert!(rig.equipment.is_equipped(fixtures::item(&catalog, "helmet").item_id()));
        assert_eq!(rig.status.health, 80);
        assert_eq!(rig.status.defense, 13);
    }

    #[test]
    fn bad_files_fail_without_touching_state() {
        let dir = TempDir::new().unwrap();
        let manager = SaveLoadManager::new(dir.path().join("game_save.json"));
        assert!(matches!(manager.read(), Err(SaveError::NotFound(_))));

        std::fs::write(manager.path(), "{ not json").unwrap();
        assert!(matches!(manager.read(), Err(SaveError::Json(_))));

        let mut data = Rig::new().capture();
        data.version = SAVE_VERSION + 1;
        manager.write(&data).unwrap();
        assert!(matches!(
            manager.read(),
            Err(SaveError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn scene_object_state_round_trip() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_y(1.0));
        let state = SceneObjectState::capture("Props/Barrel", &transform, &Visibility::Hidden);
        assert!(!state.is_active);

        let mut t = Transform::default();
        let mut v = Visibility::Visible;
        state.apply(&mut t, &mut v);
        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        assert!(t.rotation.abs_diff_eq(transform.rotation, 1e-5));
        assert_eq!(v, Visibility::Hidden);
    }
}
