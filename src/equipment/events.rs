use bevy::prelude::*;

use super::components::EquipSlot;

/// 把背包第 index 格的装备穿上，槽位由物品类别决定
#[derive(Event)]
pub struct EquipEvent {
    pub index: usize,   // 背包索引
}

#[derive(Event)]
pub struct UnequipEvent {
    pub slot: EquipSlot,
}

#[derive(Event)]
pub struct ListEquipmentEvent;
