use bevy::prelude::*;
use std::sync::Arc;
use thiserror::Error;

use super::grid::{GridLayout, SlotError, SlotGrid};
use crate::core::events::PresentationCue;
use crate::data::schema::{ItemEntry, ItemType};
use crate::equipment::components::{EquipContext, EquipError, EquipSlot, Equipment};

/// 玩家背包（挂在 Resource）
#[derive(Resource, Debug, Clone)]
pub struct Backpack {
    pub grid: SlotGrid,
}

impl Backpack {
    pub fn new(layout: GridLayout) -> Self {
        Self { grid: SlotGrid::new(layout) }
    }
}

impl Default for Backpack {
    fn default() -> Self {
        Self::new(GridLayout { rows: 4, columns: 5, total_slots: 20 })
    }
}

/// 场景里可拾取的物品
#[derive(Component, Debug, Clone)]
pub struct ItemPickup {
    pub item: String,
    pub quantity: u32,
}

/// 指向某个格子容器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridRef {
    Backpack,
    QuickAccess,
    Chest(String),
}

impl GridRef {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "bag" | "backpack" | "inventory" => GridRef::Backpack,
            "quick" | "bar" => GridRef::QuickAccess,
            _ => GridRef::Chest(s.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum UseOutcome {
    Consumed(Arc<ItemEntry>),
    Equipped(Arc<ItemEntry>, EquipSlot),
    Unequipped(Arc<ItemEntry>),
}

#[derive(Debug, Error)]
pub enum UseError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error(transparent)]
    Equip(#[from] EquipError),
    #[error("{0} cannot be used")]
    Unusable(String),
}

/// source 为 None 时就是背包自己
fn source_grid<'g>(
    source: &'g mut Option<&mut SlotGrid>,
    backpack: &'g mut SlotGrid,
) -> &'g mut SlotGrid {
    match source {
        Some(grid) => &mut **grid,
        None => backpack,
    }
}

/// 使用某格物品：消耗品生效并减一；装备已穿上则卸下，否则穿上并减一
pub fn use_slot(
    mut source: Option<&mut SlotGrid>,
    index: usize,
    equipment: &mut Equipment,
    ctx: &mut EquipContext<'_>,
) -> Result<UseOutcome, UseError> {
    let proto = {
        let grid = source_grid(&mut source, &mut *ctx.backpack);
        if !grid.in_range(index) {
            return Err(SlotError::OutOfRange(index).into());
        }
        grid.get(index)
            .map(|s| s.proto.clone())
            .ok_or(SlotError::EmptySlot(index))?
    };

    match proto.item_type {
        ItemType::Consumable => {
            source_grid(&mut source, &mut *ctx.backpack).remove_from_slot(index, 1)?;
            ctx.status.add_stats(&proto.stats);
            if let Some(sound) = &proto.sounds.on_equip {
                ctx.cues.push(PresentationCue::PlaySound(sound.clone()));
            }
            info!("使用了 {}", proto.name);
            Ok(UseOutcome::Consumed(proto))
        }
        ItemType::Equipment => {
            let id = proto.item_id();
            if equipment.is_equipped(id) {
                equipment.unequip_item(id, ctx)?;
                return Ok(UseOutcome::Unequipped(proto));
            }
            source_grid(&mut source, &mut *ctx.backpack).remove_from_slot(index, 1)?;
            match equipment.equip(&proto, ctx) {
                Ok(slot) => Ok(UseOutcome::Equipped(proto, slot)),
                Err(e) => {
                    let grid = source_grid(&mut source, &mut *ctx.backpack);
                    if let Err(back) = grid.add_to_slot(index, &proto, 1) {
                        warn!("{} 放回第 {index} 格失败: {back}", proto.name);
                    }
                    Err(e.into())
                }
            }
        }
        _ => Err(UseError::Unusable(proto.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::components::PlayerStatus;
    use crate::data::catalog::fixtures;

    #[test]
    fn consumable_heals_and_decrements() {
        let catalog = fixtures::catalog();
        let mut backpack = Backpack::new(GridLayout::single_row(3));
        backpack.grid.add(&fixtures::item(&catalog, "potion"), 2).unwrap();
        let mut equipment = Equipment::default();
        let mut status = PlayerStatus::default();
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };

        let outcome = use_slot(None, 0, &mut equipment, &mut ctx).unwrap();
        assert!(matches!(outcome, UseOutcome::Consumed(_)));
        assert_eq!(status.health, 70);
        assert_eq!(backpack.grid.get(0).map(|s| s.count), Some(1));
    }

    #[test]
    fn equipment_from_quick_bar_toggles() {
        let catalog = fixtures::catalog();
        let helmet = fixtures::item(&catalog, "helmet");
        let mut backpack = Backpack::new(GridLayout::single_row(3));
        let mut quick = SlotGrid::new(GridLayout::single_row(2));
        quick.add(&helmet, 1).unwrap();
        quick.add(&helmet, 1).unwrap();
        let mut equipment = Equipment::default();
        let mut status = PlayerStatus::default();
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };

        let first = use_slot(Some(&mut quick), 0, &mut equipment, &mut ctx).unwrap();
        assert!(matches!(first, UseOutcome::Equipped(_, EquipSlot::Helmet)));
        assert!(quick.get(0).is_none());

        // 第二顶同款头盔：已装备，所以是卸下
        let second = use_slot(Some(&mut quick), 1, &mut equipment, &mut ctx).unwrap();
        assert!(matches!(second, UseOutcome::Unequipped(_)));
        assert!(quick.get(1).is_some());
        assert_eq!(ctx.backpack.count_of(helmet.item_id()), 1);
    }

    #[test]
    fn failed_equip_puts_item_back() {
        let catalog = fixtures::catalog();
        let mut backpack = Backpack::new(GridLayout::single_row(3));
        backpack.grid.add(&fixtures::item(&catalog, "shield"), 1).unwrap();
        let mut equipment = Equipment::default();
        let mut status = PlayerStatus::default();
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };
        equipment
            .equip(&fixtures::item(&catalog, "greatsword"), &mut ctx)
            .unwrap();

        let err = use_slot(None, 0, &mut equipment, &mut ctx).unwrap_err();
        assert!(matches!(err, UseError::Equip(EquipError::OffHandBlocked(_))));
        assert_eq!(backpack.grid.get(0).map(|s| s.proto.id.as_str()), Some("shield"));
    }

    #[test]
    fn empty_and_plain_items_are_rejected() {
        let catalog = fixtures::catalog();
        let mut backpack = Backpack::new(GridLayout::single_row(2));
        backpack.grid.add(&fixtures::item(&catalog, "arrow"), 3).unwrap();
        let mut equipment = Equipment::default();
        let mut status = PlayerStatus::default();
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };

        assert!(matches!(
            use_slot(None, 1, &mut equipment, &mut ctx),
            Err(UseError::Slot(SlotError::EmptySlot(1)))
        ));
        assert!(matches!(
            use_slot(None, 0, &mut equipment, &mut ctx),
            Err(UseError::Unusable(_))
        ));
        assert_eq!(ctx.backpack.get(0).map(|s| s.count), Some(3));
    }
}
