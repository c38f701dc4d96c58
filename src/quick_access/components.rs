use bevy::prelude::*;
use std::sync::Arc;

use crate::data::catalog::ItemCatalog;
use crate::data::schema::ItemEntry;
use crate::inventory::grid::{AddReport, GridLayout, ItemStack, SavedStack, SlotError, SlotGrid};

/// 数字键快捷栏，单行
#[derive(Resource, Debug, Clone)]
pub struct QuickAccessBar {
    pub grid: SlotGrid,
}

impl Default for QuickAccessBar {
    fn default() -> Self {
        Self::new(10)
    }
}

impl QuickAccessBar {
    pub fn new(total_slots: usize) -> Self {
        Self { grid: SlotGrid::new(GridLayout::single_row(total_slots)) }
    }

    /// 整堆放进第一个空格，超过堆叠上限的部分丢弃
    pub fn add(&mut self, item: &Arc<ItemEntry>, quantity: u32) -> Result<AddReport, SlotError> {
        if self.grid.len() == 0 {
            return Err(SlotError::Uninitialized);
        }
        if quantity == 0 {
            return Err(SlotError::InvalidQuantity);
        }
        let Some(index) = self.grid.first_empty() else {
            warn!("快捷栏已满，无法放入 {}", item.name);
            return Ok(AddReport { added: 0, dropped: quantity });
        };
        let added = quantity.min(item.max_stack_size());
        self.grid.put(index, ItemStack::new(item.clone(), added))?;
        Ok(AddReport { added, dropped: quantity - added })
    }

    pub fn snapshot(&self) -> Vec<SavedStack> {
        self.grid.snapshot()
    }

    pub fn restore(&mut self, saved: &[SavedStack], catalog: &ItemCatalog) -> Vec<String> {
        self.grid.clear();
        let mut skipped = Vec::new();
        for entry in saved {
            let Some(item) = catalog.resolve(entry.item_id, &entry.item_name) else {
                warn!("快捷栏存档物品 '{}' 不在物品表中，跳过", entry.item_name);
                skipped.push(entry.item_name.clone());
                continue;
            };
            if let Err(e) = self.add(item, entry.quantity) {
                warn!("恢复快捷栏 {} 失败: {e}", entry.item_name);
                skipped.push(entry.item_name.clone());
            }
        }
        skipped
    }
}

/// 第 i 格对应的按键：1..9，第十格是 0
pub fn key_label(index: usize) -> Option<String> {
    match index {
        0..=8 => Some((index + 1).to_string()),
        9 => Some("0".to_string()),
        _ => None,
    }
}

pub const SLOT_KEYS: [KeyCode; 10] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::Digit0,
];
