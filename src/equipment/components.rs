use bevy::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::character::components::PlayerStatus;
use crate::core::events::PresentationCue;
use crate::data::catalog::ItemCatalog;
use crate::data::schema::{EquipmentCategory, ItemEntry, ItemId, ItemType};
use crate::inventory::grid::{ItemStack, SavedStack, SlotGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EquipSlot {
    Helmet,
    Shoulder,
    Torso,
    Pants,
    Gloves,
    Boots,
    Cloak,
    Neck,
    Earring,
    Ring1,
    Ring2,
    Belt,
    MainHand,
    OffHand,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 14] = [
        EquipSlot::Helmet,
        EquipSlot::Shoulder,
        EquipSlot::Torso,
        EquipSlot::Pants,
        EquipSlot::Gloves,
        EquipSlot::Boots,
        EquipSlot::Cloak,
        EquipSlot::Neck,
        EquipSlot::Earring,
        EquipSlot::Ring1,
        EquipSlot::Ring2,
        EquipSlot::Belt,
        EquipSlot::MainHand,
        EquipSlot::OffHand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EquipSlot::Helmet => "helmet",
            EquipSlot::Shoulder => "shoulder",
            EquipSlot::Torso => "torso",
            EquipSlot::Pants => "pants",
            EquipSlot::Gloves => "gloves",
            EquipSlot::Boots => "boots",
            EquipSlot::Cloak => "cloak",
            EquipSlot::Neck => "neck",
            EquipSlot::Earring => "earring",
            EquipSlot::Ring1 => "ring1",
            EquipSlot::Ring2 => "ring2",
            EquipSlot::Belt => "belt",
            EquipSlot::MainHand => "main",
            EquipSlot::OffHand => "off",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name().eq_ignore_ascii_case(s))
    }

    fn is_hand(self) -> bool {
        matches!(self, EquipSlot::MainHand | EquipSlot::OffHand)
    }
}

/// 双手武器同时占据主副手，用一个值表示，不会出现两边不一致
#[derive(Debug, Clone)]
pub enum Hands {
    Separate { main: Option<ItemStack>, off: Option<ItemStack> },
    TwoHanded(ItemStack),
}

impl Default for Hands {
    fn default() -> Self {
        Hands::Separate { main: None, off: None }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EquipError {
    #[error("{0} cannot be equipped")]
    NotEquippable(String),
    #[error("no equipment slot accepts {0}")]
    NoSlot(String),
    #[error("cannot equip off-hand {0} while a two-handed weapon is held")]
    OffHandBlocked(String),
    #[error("backpack has no room for {0}")]
    BackpackFull(String),
    #[error("{0} is not equipped")]
    NotEquipped(String),
}

/// 装备/卸下时要动到的外部状态
pub struct EquipContext<'a> {
    pub backpack: &'a mut SlotGrid,
    pub status: &'a mut PlayerStatus,
    pub cues: &'a mut Vec<PresentationCue>,
}

/// 玩家身上的装备
#[derive(Resource, Debug, Default, Clone)]
pub struct Equipment {
    armor: BTreeMap<EquipSlot, ItemStack>,
    hands: Hands,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<&ItemStack> {
        match (&self.hands, slot) {
            (Hands::TwoHanded(stack), EquipSlot::MainHand | EquipSlot::OffHand) => Some(stack),
            (Hands::Separate { main, .. }, EquipSlot::MainHand) => main.as_ref(),
            (Hands::Separate { off, .. }, EquipSlot::OffHand) => off.as_ref(),
            _ => self.armor.get(&slot),
        }
    }

    pub fn hands(&self) -> &Hands {
        &self.hands
    }

    /// 每件装备只出现一次（双手武器记在主手）
    pub fn equipped(&self) -> Vec<(EquipSlot, &ItemStack)> {
        let mut out: Vec<_> = self.armor.iter().map(|(s, stack)| (*s, stack)).collect();
        match &self.hands {
            Hands::TwoHanded(stack) => out.push((EquipSlot::MainHand, stack)),
            Hands::Separate { main, off } => {
                out.extend(main.iter().map(|s| (EquipSlot::MainHand, s)));
                out.extend(off.iter().map(|s| (EquipSlot::OffHand, s)));
            }
        }
        out
    }

    pub fn slot_of(&self, id: ItemId) -> Option<EquipSlot> {
        EquipSlot::ALL
            .into_iter()
            .find(|&slot| self.get(slot).is_some_and(|s| s.id() == id))
    }

    pub fn is_equipped(&self, id: ItemId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn category_equipped(&self, category: EquipmentCategory) -> bool {
        let any = |slots: &[EquipSlot]| slots.iter().any(|&s| self.get(s).is_some());
        match category {
            EquipmentCategory::Helmet => any(&[EquipSlot::Helmet]),
            EquipmentCategory::Shoulder => any(&[EquipSlot::Shoulder]),
            EquipmentCategory::Torso => any(&[EquipSlot::Torso]),
            EquipmentCategory::Pants => any(&[EquipSlot::Pants]),
            EquipmentCategory::Gloves => any(&[EquipSlot::Gloves]),
            EquipmentCategory::Boots => any(&[EquipSlot::Boots]),
            EquipmentCategory::Back => any(&[EquipSlot::Cloak]),
            EquipmentCategory::Necklace => any(&[EquipSlot::Neck]),
            EquipmentCategory::Earrings => any(&[EquipSlot::Earring]),
            EquipmentCategory::Belt => any(&[EquipSlot::Belt]),
            EquipmentCategory::Rings => any(&[EquipSlot::Ring1, EquipSlot::Ring2]),
            EquipmentCategory::Weapon => any(&[EquipSlot::MainHand, EquipSlot::OffHand]),
        }
    }

    /// 按类别决定目标槽；戒指优先空位，都满时默认戒指 1
    pub fn target_slot(&self, item: &ItemEntry) -> Option<EquipSlot> {
        let slot = match item.equipment_category? {
            EquipmentCategory::Helmet => EquipSlot::Helmet,
            EquipmentCategory::Shoulder => EquipSlot::Shoulder,
            EquipmentCategory::Torso => EquipSlot::Torso,
            EquipmentCategory::Pants => EquipSlot::Pants,
            EquipmentCategory::Gloves => EquipSlot::Gloves,
            EquipmentCategory::Boots => EquipSlot::Boots,
            EquipmentCategory::Back => EquipSlot::Cloak,
            EquipmentCategory::Necklace => EquipSlot::Neck,
            EquipmentCategory::Belt => EquipSlot::Belt,
            EquipmentCategory::Earrings => EquipSlot::Earring,
            EquipmentCategory::Rings => {
                if self.get(EquipSlot::Ring1).is_none() {
                    EquipSlot::Ring1
                } else if self.get(EquipSlot::Ring2).is_none() {
                    EquipSlot::Ring2
                } else {
                    EquipSlot::Ring1
                }
            }
            EquipmentCategory::Weapon => {
                if item.is_two_handed() || item.main_hand {
                    EquipSlot::MainHand
                } else if item.off_hand {
                    EquipSlot::OffHand
                } else {
                    return None;
                }
            }
        };
        Some(slot)
    }

    /// 穿上 item 之前必须先卸下的槽位
    fn displaced_by(&self, item: &ItemEntry, slot: EquipSlot) -> Vec<EquipSlot> {
        if !slot.is_hand() {
            return self.armor.contains_key(&slot).then_some(slot).into_iter().collect();
        }
        match (&self.hands, item.is_two_handed(), slot) {
            (Hands::TwoHanded(_), _, _) => vec![EquipSlot::MainHand],
            (Hands::Separate { main, off }, true, _) => {
                let mut out = Vec::new();
                if main.is_some() {
                    out.push(EquipSlot::MainHand);
                }
                if off.is_some() {
                    out.push(EquipSlot::OffHand);
                }
                out
            }
            (Hands::Separate { main, .. }, false, EquipSlot::MainHand) => {
                main.iter().map(|_| EquipSlot::MainHand).collect()
            }
            (Hands::Separate { off, .. }, false, _) => {
                off.iter().map(|_| EquipSlot::OffHand).collect()
            }
        }
    }

    pub fn equip(
        &mut self,
        item: &Arc<ItemEntry>,
        ctx: &mut EquipContext<'_>,
    ) -> Result<EquipSlot, EquipError> {
        if item.item_type != ItemType::Equipment {
            return Err(EquipError::NotEquippable(item.name.clone()));
        }
        let slot = self
            .target_slot(item)
            .ok_or_else(|| EquipError::NoSlot(item.name.clone()))?;

        if slot == EquipSlot::OffHand
            && !item.is_two_handed()
            && matches!(self.hands, Hands::TwoHanded(_))
        {
            error!("手持双手武器时不能装备副手物品 {}", item.name);
            return Err(EquipError::OffHandBlocked(item.name.clone()));
        }

        // 先确认被换下来的装备都能回到背包，再动状态
        let displaced = self.displaced_by(item, slot);
        let mut trial = ctx.backpack.clone();
        for &s in &displaced {
            if let Some(old) = self.get(s) {
                let fits = trial.can_accept(&old.proto, 1) && trial.add(&old.proto, 1).is_ok();
                if !fits {
                    return Err(EquipError::BackpackFull(old.proto.name.clone()));
                }
            }
        }
        for s in displaced {
            self.unequip_slot(s, ctx)?;
        }

        let stack = ItemStack::new(item.clone(), 1);
        if item.is_two_handed() {
            self.hands = Hands::TwoHanded(stack);
        } else if slot.is_hand() {
            self.set_hand(slot, stack);
        } else {
            self.armor.insert(slot, stack);
        }

        ctx.status.add_stats(&item.stats);
        if !item.attachments.is_empty() {
            ctx.cues.push(PresentationCue::AttachProps {
                item: item.item_id(),
                attachments: item.attachments.clone(),
            });
        }
        if !item.sibling_toggles.is_empty() {
            ctx.cues.push(PresentationCue::ToggleSiblings {
                toggles: item.sibling_toggles.clone(),
                equipped: true,
            });
        }
        if let Some(sound) = &item.sounds.on_equip {
            ctx.cues.push(PresentationCue::PlaySound(sound.clone()));
        }
        info!("已装备 {}: {}", slot.name(), item.name);
        Ok(slot)
    }

    fn set_hand(&mut self, slot: EquipSlot, stack: ItemStack) {
        if matches!(self.hands, Hands::TwoHanded(_)) {
            self.hands = Hands::default();
        }
        if let Hands::Separate { main, off } = &mut self.hands {
            match slot {
                EquipSlot::OffHand => *off = Some(stack),
                _ => *main = Some(stack),
            }
        }
    }

    fn clear_slot(&mut self, slot: EquipSlot) {
        if !slot.is_hand() {
            self.armor.remove(&slot);
        } else if matches!(self.hands, Hands::TwoHanded(_)) {
            self.hands = Hands::default();
        } else if let Hands::Separate { main, off } = &mut self.hands {
            match slot {
                EquipSlot::OffHand => *off = None,
                _ => *main = None,
            }
        }
    }

    /// 卸下某槽的装备并放回背包；背包放不下则什么都不改
    pub fn unequip_slot(
        &mut self,
        slot: EquipSlot,
        ctx: &mut EquipContext<'_>,
    ) -> Result<Arc<ItemEntry>, EquipError> {
        let item = self
            .get(slot)
            .map(|s| s.proto.clone())
            .ok_or_else(|| EquipError::NotEquipped(slot.name().to_string()))?;

        if !ctx.backpack.can_accept(&item, 1) {
            warn!("背包已满，无法卸下 {}", item.name);
            return Err(EquipError::BackpackFull(item.name.clone()));
        }
        ctx.backpack
            .add(&item, 1)
            .map_err(|_| EquipError::BackpackFull(item.name.clone()))?;

        self.clear_slot(slot);
        self.after_unequip(&item, ctx.status, ctx.cues);
        info!("已卸下 {}: {}", slot.name(), item.name);
        Ok(item)
    }

    pub fn unequip_item(
        &mut self,
        id: ItemId,
        ctx: &mut EquipContext<'_>,
    ) -> Result<Arc<ItemEntry>, EquipError> {
        let Some(slot) = self.slot_of(id) else {
            error!("物品 {id} 不在对应的装备槽里");
            return Err(EquipError::NotEquipped(id.to_string()));
        };
        self.unequip_slot(slot, ctx)
    }

    fn after_unequip(
        &self,
        item: &ItemEntry,
        status: &mut PlayerStatus,
        cues: &mut Vec<PresentationCue>,
    ) {
        status.remove_stats(&item.stats);
        if !item.attachments.is_empty() {
            cues.push(PresentationCue::DetachProps { item: item.item_id() });
        }
        if !item.sibling_toggles.is_empty() {
            cues.push(PresentationCue::ToggleSiblings {
                toggles: item.sibling_toggles.clone(),
                equipped: false,
            });
        }
        if let Some(sound) = &item.sounds.on_unequip {
            cues.push(PresentationCue::PlaySound(sound.clone()));
        }
    }

    /// 读档前清空：撤销属性加成，装备不回背包
    pub fn clear(&mut self, status: &mut PlayerStatus, cues: &mut Vec<PresentationCue>) {
        let items: Vec<Arc<ItemEntry>> =
            self.equipped().into_iter().map(|(_, s)| s.proto.clone()).collect();
        for item in &items {
            status.remove_stats(&item.stats);
            if !item.attachments.is_empty() {
                cues.push(PresentationCue::DetachProps { item: item.item_id() });
            }
        }
        self.armor.clear();
        self.hands = Hands::default();
    }

    pub fn snapshot(&self) -> Vec<SavedStack> {
        self.equipped()
            .into_iter()
            .map(|(_, s)| SavedStack { quantity: 1, ..SavedStack::from(s) })
            .collect()
    }

    pub fn restore(
        &mut self,
        saved: &[SavedStack],
        catalog: &ItemCatalog,
        ctx: &mut EquipContext<'_>,
    ) -> Vec<String> {
        let mut skipped = Vec::new();
        for entry in saved {
            let Some(item) = catalog.resolve(entry.item_id, &entry.item_name) else {
                warn!("存档装备 '{}' 不在物品表中，跳过", entry.item_name);
                skipped.push(entry.item_name.clone());
                continue;
            };
            if let Err(e) = self.equip(item, ctx) {
                warn!("恢复装备 {} 失败: {e}", entry.item_name);
                skipped.push(entry.item_name.clone());
            }
        }
        skipped
    }
}

/// 盯住某类装备，穿上/卸下时切换两组物体的显隐
#[derive(Component, Debug, Clone)]
pub struct SlotWatcher {
    pub category: EquipmentCategory,
    pub objects_to_disable: Vec<String>,
    pub objects_to_enable: Vec<String>,
    pub was_equipped: Option<bool>,
}

impl SlotWatcher {
    pub fn new(category: EquipmentCategory) -> Self {
        Self {
            category,
            objects_to_disable: Vec::new(),
            objects_to_enable: Vec::new(),
            was_equipped: None,
        }
    }

    pub fn observe(&mut self, equipped: bool) -> Vec<PresentationCue> {
        if self.was_equipped == Some(equipped) {
            return Vec::new();
        }
        self.was_equipped = Some(equipped);
        vec![
            PresentationCue::SetObjectsActive {
                names: self.objects_to_disable.clone(),
                active: !equipped,
            },
            PresentationCue::SetObjectsActive {
                names: self.objects_to_enable.clone(),
                active: equipped,
            },
        ]
    }
}
