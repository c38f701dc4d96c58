use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::schema::{ItemEntry, ItemId};

/// 运行时只读的物品目录，由 items.ron 构建
#[derive(Resource, Default, Debug, Clone)]
pub struct ItemCatalog {
    items: Vec<Arc<ItemEntry>>,
    by_id: HashMap<ItemId, usize>,
}

impl ItemCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = ItemEntry>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    pub fn insert(&mut self, entry: ItemEntry) {
        let id = entry.item_id();
        let entry = Arc::new(entry);
        if let Some(&idx) = self.by_id.get(&id) {
            warn!("物品 ID '{}' 重复，后者覆盖前者", entry.id);
            self.items[idx] = entry;
        } else {
            self.by_id.insert(id, self.items.len());
            self.items.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemEntry>> {
        self.items.iter()
    }

    pub fn get(&self, id: ItemId) -> Option<&Arc<ItemEntry>> {
        self.by_id.get(&id).map(|&idx| &self.items[idx])
    }

    /// 按字符串 id 查找（忽略大小写）
    pub fn by_key(&self, key: &str) -> Option<&Arc<ItemEntry>> {
        self.get(ItemId::from_key(key))
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<ItemEntry>> {
        self.items.iter().find(|e| e.name == name)
    }

    /// 命令行用：id / uuid / 名称 三种写法都认
    pub fn lookup(&self, token: &str) -> Option<&Arc<ItemEntry>> {
        self.by_key(token).or_else(|| {
            self.items.iter().find(|e| {
                e.name.eq_ignore_ascii_case(token) || e.item_id().to_string() == token
            })
        })
    }

    /// 存档里的引用：先按稳定 ID，找不到再按显示名
    pub fn resolve(&self, id: Option<ItemId>, name: &str) -> Option<&Arc<ItemEntry>> {
        id.and_then(|id| self.get(id)).or_else(|| self.by_name(name))
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::data::schema::*;

    pub fn potion() -> ItemEntry {
        ItemEntry {
            id: "potion".into(),
            name: "Health Potion".into(),
            stackable: true,
            max_stack: 5,
            item_type: ItemType::Consumable,
            base_price: 10,
            currency: "Copper".into(),
            stats: vec![ItemStat { stat: StatKind::Health, value: 20 }],
            ..Default::default()
        }
    }

    pub fn arrow() -> ItemEntry {
        ItemEntry {
            id: "arrow".into(),
            name: "Arrow".into(),
            stackable: true,
            max_stack: 20,
            base_price: 1,
            ..Default::default()
        }
    }

    pub fn gear(
        id: &str,
        category: EquipmentCategory,
        stats: Vec<ItemStat>,
    ) -> ItemEntry {
        ItemEntry {
            id: id.into(),
            name: id.to_uppercase(),
            item_type: ItemType::Equipment,
            equipment_category: Some(category),
            stats,
            base_price: 5,
            currency: "Silver".into(),
            ..Default::default()
        }
    }

    pub fn helmet() -> ItemEntry {
        gear(
            "helmet",
            EquipmentCategory::Helmet,
            vec![ItemStat { stat: StatKind::Defense, value: 3 }],
        )
    }

    pub fn ring(id: &str) -> ItemEntry {
        gear(id, EquipmentCategory::Rings, vec![ItemStat { stat: StatKind::Luck, value: 1 }])
    }

    pub fn sword() -> ItemEntry {
        ItemEntry {
            main_hand: true,
            ..gear(
                "sword",
                EquipmentCategory::Weapon,
                vec![ItemStat { stat: StatKind::Attack, value: 5 }],
            )
        }
    }

    pub fn shield() -> ItemEntry {
        ItemEntry {
            off_hand: true,
            sounds: ItemSounds { on_equip: Some("shield_up".into()), ..Default::default() },
            ..gear(
                "shield",
                EquipmentCategory::Weapon,
                vec![ItemStat { stat: StatKind::Block, value: 4 }],
            )
        }
    }

    pub fn greatsword() -> ItemEntry {
        ItemEntry {
            weapon_type: WeaponType::TwoHand,
            attachments: vec![BoneAttachment {
                bone: "hand_r".into(),
                prefab: "greatsword_mesh".into(),
                position: [0.0; 3],
                rotation: [0.0; 3],
                scale: [1.0; 3],
            }],
            ..gear(
                "greatsword",
                EquipmentCategory::Weapon,
                vec![ItemStat { stat: StatKind::Attack, value: 12 }],
            )
        }
    }

    pub fn catalog() -> ItemCatalog {
        ItemCatalog::from_entries([
            potion(),
            arrow(),
            helmet(),
            ring("ring_a"),
            ring("ring_b"),
            sword(),
            shield(),
            greatsword(),
        ])
    }

    pub fn item(catalog: &ItemCatalog, key: &str) -> Arc<ItemEntry> {
        catalog.by_key(key).cloned().expect("fixture item")
    }
}
