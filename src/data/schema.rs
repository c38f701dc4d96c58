use bevy::asset::Asset;
use bevy::reflect::TypePath;
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

/// 物品稳定 ID：由静态表里的字符串 id 生成的 v5 UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn from_key(key: &str) -> Self {
        // 固定 namespace + id 字节，保证同一 id 每次得到同一值
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.to_ascii_lowercase().as_bytes()))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemType {
    Consumable,
    Equipment,
    Currency,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentCategory {
    Weapon,
    Helmet,
    Torso,
    Gloves,
    Shoulder,
    Boots,
    Pants,
    Rings,
    Necklace,
    Belt,
    Earrings,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponType {
    #[default]
    OneHand,
    TwoHand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Attack,
    Defense,
    Block,
    Intelligence,
    Health,
    MaxHealth,
    Mana,
    MaxMana,
    Stamina,
    MaxStamina,
    Speed,
    Agility,
    Strength,
    Dexterity,
    Luck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStat {
    pub stat: StatKind,
    pub value: i32,
}

/// 装备时挂到骨骼上的模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneAttachment {
    pub bone: String,
    pub prefab: String,
    #[serde(default)] pub position: [f32; 3],
    #[serde(default)] pub rotation: [f32; 3],
    #[serde(default = "unit_scale")] pub scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// 装备/卸下时切换某个父节点下哪些子物体可见
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiblingToggle {
    pub parent: String,
    #[serde(default)] pub enable_on_equip: Vec<String>,
    #[serde(default)] pub enable_on_unequip: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSounds {
    #[serde(default)] pub pickup: Option<String>,
    #[serde(default)] pub on_equip: Option<String>,
    #[serde(default)] pub on_unequip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub id:   String,
    pub name: String,
    #[serde(default)] pub description: String,
    #[serde(default)] pub stackable: bool,
    #[serde(default = "one")] pub max_stack: u32,
    #[serde(default)] pub item_type: ItemType,
    #[serde(default)] pub equipment_category: Option<EquipmentCategory>,
    #[serde(default)] pub weapon_type: WeaponType,
    #[serde(default)] pub main_hand: bool,
    #[serde(default)] pub off_hand: bool,
    #[serde(default = "one_u64")] pub base_price: u64,
    #[serde(default = "default_currency")] pub currency: String,
    #[serde(default)] pub stats: Vec<ItemStat>,
    #[serde(default)] pub attachments: Vec<BoneAttachment>,
    #[serde(default)] pub sibling_toggles: Vec<SiblingToggle>,
    #[serde(default)] pub sounds: ItemSounds,
}

fn one() -> u32 {
    1
}

fn one_u64() -> u64 {
    1
}

fn default_currency() -> String {
    "Copper".into()
}

impl Default for ItemEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            stackable: false,
            max_stack: 1,
            item_type: ItemType::Other,
            equipment_category: None,
            weapon_type: WeaponType::OneHand,
            main_hand: false,
            off_hand: false,
            base_price: 1,
            currency: default_currency(),
            stats: Vec::new(),
            attachments: Vec::new(),
            sibling_toggles: Vec::new(),
            sounds: ItemSounds::default(),
        }
    }
}

impl ItemEntry {
    pub fn item_id(&self) -> ItemId {
        ItemId::from_key(&self.id)
    }

    /// 单格最大堆叠数；不可堆叠的物品恒为 1
    pub fn max_stack_size(&self) -> u32 {
        if self.stackable { self.max_stack.max(1) } else { 1 }
    }

    pub fn is_two_handed(&self) -> bool {
        self.equipment_category == Some(EquipmentCategory::Weapon)
            && self.weapon_type == WeaponType::TwoHand
    }
}

#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct ItemList {
    pub items: Vec<ItemEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_is_stable_and_case_insensitive() {
        assert_eq!(ItemId::from_key("potion"), ItemId::from_key("Potion"));
        assert_ne!(ItemId::from_key("potion"), ItemId::from_key("sword"));
    }

    #[test]
    fn non_stackable_items_hold_one_per_slot() {
        let entry = ItemEntry { stackable: false, max_stack: 20, ..Default::default() };
        assert_eq!(entry.max_stack_size(), 1);

        let entry = ItemEntry { stackable: true, max_stack: 0, ..Default::default() };
        assert_eq!(entry.max_stack_size(), 1);
    }

    #[test]
    fn ron_entry_fills_defaults() {
        let list: ItemList = bevy::asset::ron::de::from_str(
            r#"(items: [(id: "apple", name: "Apple", stackable: true, max_stack: 10)])"#,
        )
        .unwrap();
        let apple = &list.items[0];
        assert_eq!(apple.max_stack_size(), 10);
        assert_eq!(apple.currency, "Copper");
        assert_eq!(apple.base_price, 1);
        assert!(apple.stats.is_empty());
    }
}
