//! 固定容量、分页显示的格子容器。背包、箱子、快捷栏都建立在它上面。

use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

use crate::data::catalog::ItemCatalog;
use crate::data::schema::{ItemEntry, ItemId};

/// 行 × 列为一页，总格数可以不是整页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: usize,
    pub columns: usize,
    pub total_slots: usize,
}

impl GridLayout {
    pub fn single_row(total_slots: usize) -> Self {
        Self { rows: 1, columns: total_slots, total_slots }
    }

    pub fn page_size(&self) -> usize {
        self.rows * self.columns
    }

    pub fn page_count(&self) -> usize {
        match self.page_size() {
            0 => 0,
            size => self.total_slots.div_ceil(size),
        }
    }
}

/// 运行时物品实例
#[derive(Clone, Debug)]
pub struct ItemStack {
    pub proto: Arc<ItemEntry>,
    pub count: u32,
}

impl ItemStack {
    pub fn new(proto: Arc<ItemEntry>, count: u32) -> Self {
        Self { proto, count }
    }

    pub fn id(&self) -> ItemId {
        self.proto.item_id()
    }

    pub fn room(&self) -> u32 {
        self.proto.max_stack_size().saturating_sub(self.count)
    }
}

/// 存档里的一格：(物品, 数量)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStack {
    #[serde(default)]
    pub item_id: Option<ItemId>,
    pub item_name: String,
    pub quantity: u32,
}

impl From<&ItemStack> for SavedStack {
    fn from(stack: &ItemStack) -> Self {
        Self {
            item_id: Some(stack.id()),
            item_name: stack.proto.name.clone(),
            quantity: stack.count,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("container has no slots")]
    Uninitialized,
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("slot index {0} is out of range")]
    OutOfRange(usize),
    #[error("slot {0} is empty")]
    EmptySlot(usize),
    #[error("slot {0} holds another item or is full")]
    SlotOccupied(usize),
    #[error("item {0} is not in this container")]
    NotFound(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddReport {
    pub added: u32,
    pub dropped: u32,
}

#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: Vec<Option<ItemStack>>,
    layout: GridLayout,
    current_page: usize,
}

impl SlotGrid {
    pub fn new(layout: GridLayout) -> Self {
        if layout.total_slots == 0 || layout.page_size() == 0 {
            warn!("格子容器配置为空: {layout:?}");
        }
        Self {
            slots: vec![None; layout.total_slots],
            layout,
            current_page: 0,
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn in_range(&self, index: usize) -> bool {
        index < self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// 所有非空格 (索引, 堆)
    pub fn stacks(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn count_of(&self, id: ItemId) -> u32 {
        self.stacks().filter(|(_, s)| s.id() == id).map(|(_, s)| s.count).sum()
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    fn check_ready(&self) -> Result<(), SlotError> {
        if self.slots.is_empty() {
            warn!("格子容器未初始化，操作被忽略");
            return Err(SlotError::Uninitialized);
        }
        Ok(())
    }

    /// 不改动状态，判断能否完整放下
    pub fn can_accept(&self, item: &ItemEntry, quantity: u32) -> bool {
        let id = item.item_id();
        let max = item.max_stack_size();
        let room: u64 = self
            .slots
            .iter()
            .map(|slot| match slot {
                None => max as u64,
                Some(s) if s.id() == id => s.room() as u64,
                Some(_) => 0,
            })
            .sum();
        room >= quantity as u64
    }

    /// 先补满已有同类堆，再按顺序占空格；放不下的部分丢弃并记录
    pub fn add(&mut self, item: &Arc<ItemEntry>, quantity: u32) -> Result<AddReport, SlotError> {
        self.check_ready()?;
        if quantity == 0 {
            return Err(SlotError::InvalidQuantity);
        }

        let id = item.item_id();
        let max = item.max_stack_size();
        let mut remaining = quantity;

        for stack in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if stack.id() == id && stack.count < max {
                let n = remaining.min(max - stack.count);
                stack.count += n;
                remaining -= n;
            }
        }

        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let n = remaining.min(max);
                *slot = Some(ItemStack::new(item.clone(), n));
                remaining -= n;
            }
        }

        if remaining > 0 {
            warn!("容器已满，丢弃 {} ×{}", item.name, remaining);
        }
        Ok(AddReport { added: quantity - remaining, dropped: remaining })
    }

    /// 指定格放入；返回没放下的数量
    pub fn add_to_slot(
        &mut self,
        index: usize,
        item: &Arc<ItemEntry>,
        quantity: u32,
    ) -> Result<u32, SlotError> {
        self.check_ready()?;
        if quantity == 0 {
            return Err(SlotError::InvalidQuantity);
        }
        let max = item.max_stack_size();
        let slot = self.slots.get_mut(index).ok_or(SlotError::OutOfRange(index))?;
        if let Some(stack) = slot.as_mut() {
            if stack.id() != item.item_id() || stack.count >= max {
                return Err(SlotError::SlotOccupied(index));
            }
            let n = quantity.min(max - stack.count);
            stack.count += n;
            return Ok(quantity - n);
        }
        let n = quantity.min(max);
        *slot = Some(ItemStack::new(item.clone(), n));
        Ok(quantity - n)
    }

    /// 优先从没满的同类堆里扣，其次任意同类堆；扣到 0 清空该格
    pub fn remove(&mut self, id: ItemId, quantity: u32) -> Result<u32, SlotError> {
        self.check_ready()?;
        if quantity == 0 {
            return Err(SlotError::InvalidQuantity);
        }
        let matches = |s: &Option<ItemStack>| s.as_ref().is_some_and(|s| s.id() == id);
        let index = self
            .slots
            .iter()
            .position(|s| matches(s) && s.as_ref().is_some_and(|s| s.room() > 0))
            .or_else(|| self.slots.iter().position(matches))
            .ok_or(SlotError::NotFound(id))?;
        self.remove_from_slot(index, quantity)
    }

    /// 返回实际扣掉的数量，永远不会扣成负数
    pub fn remove_from_slot(&mut self, index: usize, quantity: u32) -> Result<u32, SlotError> {
        self.check_ready()?;
        if quantity == 0 {
            return Err(SlotError::InvalidQuantity);
        }
        let slot = self.slots.get_mut(index).ok_or(SlotError::OutOfRange(index))?;
        let stack = slot.as_mut().ok_or(SlotError::EmptySlot(index))?;
        let removed = quantity.min(stack.count);
        stack.count -= removed;
        if stack.count == 0 {
            *slot = None;
        }
        Ok(removed)
    }

    pub fn take(&mut self, index: usize) -> Option<ItemStack> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// 把一堆物品丢到某格：同物品可堆叠就合并，否则交换。
    /// 返回被换出来的、或合并后剩下的那一堆。
    pub fn drop_stack(&mut self, index: usize, mut stack: ItemStack) -> Option<ItemStack> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Some(stack);
        };
        if let Some(target) = slot.as_mut() {
            if target.id() == stack.id() && stack.proto.stackable {
                let n = stack.count.min(target.room());
                target.count += n;
                stack.count -= n;
                return (stack.count > 0).then_some(stack);
            }
        }
        slot.replace(stack)
    }

    /// 放进空格；格子有东西则拒绝
    pub fn put(&mut self, index: usize, stack: ItemStack) -> Result<(), SlotError> {
        let slot = self.slots.get_mut(index).ok_or(SlotError::OutOfRange(index))?;
        if slot.is_some() {
            return Err(SlotError::SlotOccupied(index));
        }
        *slot = Some(stack);
        Ok(())
    }

    /// 同一容器内拖放
    pub fn move_within(&mut self, from: usize, to: usize) -> Result<(), SlotError> {
        if !self.in_range(to) {
            return Err(SlotError::OutOfRange(to));
        }
        if from == to {
            return Ok(());
        }
        let stack = self.take_checked(from)?;
        let bounced = self.drop_stack(to, stack);
        self.slots[from] = bounced;
        Ok(())
    }

    fn take_checked(&mut self, index: usize) -> Result<ItemStack, SlotError> {
        if !self.in_range(index) {
            return Err(SlotError::OutOfRange(index));
        }
        self.take(index).ok_or(SlotError::EmptySlot(index))
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    // ------------------------- 分页 -------------------------

    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.min(self.page_count().saturating_sub(1));
    }

    pub fn next_page(&mut self) -> bool {
        if self.has_next_page() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.has_previous_page() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page + 1 < self.page_count()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 0
    }

    pub fn visible_range(&self) -> Range<usize> {
        let size = self.layout.page_size();
        let start = (self.current_page * size).min(self.slots.len());
        let end = (start + size).min(self.slots.len());
        start..end
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible_range().contains(&index)
    }

    // ------------------------- 存档 -------------------------

    pub fn snapshot(&self) -> Vec<SavedStack> {
        self.stacks().map(|(_, s)| SavedStack::from(s)).collect()
    }

    /// 清空后按存档重新放入；目录里找不到的物品跳过，返回它们的名字
    pub fn restore(&mut self, saved: &[SavedStack], catalog: &ItemCatalog) -> Vec<String> {
        self.clear();
        let mut skipped = Vec::new();
        for entry in saved {
            let Some(item) = catalog.resolve(entry.item_id, &entry.item_name) else {
                warn!("存档物品 '{}' 不在物品表中，跳过", entry.item_name);
                skipped.push(entry.item_name.clone());
                continue;
            };
            if let Err(e) = self.add(item, entry.quantity) {
                warn!("恢复 {} 失败: {e}", entry.item_name);
                skipped.push(entry.item_name.clone());
            }
        }
        skipped
    }
}

/// 跨容器拖放（背包 ↔ 箱子 ↔ 快捷栏）
pub fn transfer(
    src: &mut SlotGrid,
    from: usize,
    dst: &mut SlotGrid,
    to: usize,
) -> Result<(), SlotError> {
    if !dst.in_range(to) {
        return Err(SlotError::OutOfRange(to));
    }
    let stack = src.take_checked(from)?;
    let bounced = dst.drop_stack(to, stack);
    src.slots[from] = bounced;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::fixtures;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn grid(total: usize) -> SlotGrid {
        SlotGrid::new(GridLayout { rows: 4, columns: 5, total_slots: total })
    }

    #[test]
    fn add_fills_partial_stacks_before_empty_slots() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        let arrow = fixtures::item(&catalog, "arrow");
        let mut g = grid(4);

        g.add(&potion, 3).unwrap();
        g.add(&arrow, 1).unwrap();
        let report = g.add(&potion, 4).unwrap();

        assert_eq!(report, AddReport { added: 4, dropped: 0 });
        assert_eq!(g.get(0).unwrap().count, 5);
        assert_eq!(g.get(1).unwrap().proto.id, "arrow");
        assert_eq!(g.get(2).unwrap().count, 2);
    }

    #[test]
    fn overflow_is_dropped_and_reported() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        let mut g = grid(2);

        let report = g.add(&potion, 13).unwrap();
        assert_eq!(report, AddReport { added: 10, dropped: 3 });
        assert_eq!(g.count_of(potion.item_id()), 10);
        assert!(!g.can_accept(&potion, 1));
    }

    #[test]
    fn invalid_input_leaves_grid_untouched() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");

        let mut g = grid(3);
        assert_eq!(g.add(&potion, 0), Err(SlotError::InvalidQuantity));
        assert!(g.is_empty());

        let mut empty = grid(0);
        assert_eq!(empty.add(&potion, 1), Err(SlotError::Uninitialized));
        assert_eq!(empty.remove(potion.item_id(), 1), Err(SlotError::Uninitialized));
        assert_eq!(empty.remove_from_slot(0, 1), Err(SlotError::Uninitialized));
        assert_eq!(empty.page_count(), 0);
        assert_eq!(empty.visible_range(), 0..0);
    }

    #[test]
    fn remove_prefers_partial_stack_and_clears_at_zero() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        let mut g = grid(4);
        g.add(&potion, 7).unwrap(); // 5 + 2

        assert_eq!(g.remove(potion.item_id(), 2), Ok(2));
        assert!(g.get(1).is_none());
        assert_eq!(g.get(0).unwrap().count, 5);

        // 超量只扣到 0
        assert_eq!(g.remove(potion.item_id(), 9), Ok(5));
        assert!(g.is_empty());
        assert_eq!(
            g.remove(potion.item_id(), 1),
            Err(SlotError::NotFound(potion.item_id()))
        );
    }

    #[test]
    fn pagination_bounds() {
        let g = grid(20);
        assert_eq!(g.page_count(), 1);
        assert!(!g.has_next_page());

        let mut g = grid(22);
        assert_eq!(g.page_count(), 2);
        assert!(!g.is_visible(20));
        assert!(g.next_page());
        assert!(g.is_visible(20));
        assert!(g.is_visible(21));
        assert!(!g.is_visible(19));
        assert_eq!(g.visible_range(), 20..22);
        assert!(!g.next_page());
        assert!(g.previous_page());
        assert!(!g.previous_page());

        g.set_page(99);
        assert_eq!(g.current_page(), 1);
    }

    #[test]
    fn drag_merges_same_item_and_swaps_otherwise() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        let arrow = fixtures::item(&catalog, "arrow");
        let mut g = grid(4);
        g.add_to_slot(0, &potion, 4).unwrap();
        g.add_to_slot(1, &potion, 3).unwrap();
        g.add_to_slot(2, &arrow, 6).unwrap();

        g.move_within(1, 0).unwrap();
        assert_eq!(g.get(0).unwrap().count, 5);
        assert_eq!(g.get(1).unwrap().count, 2);

        g.move_within(2, 0).unwrap();
        assert_eq!(g.get(0).unwrap().proto.id, "arrow");
        assert_eq!(g.get(2).unwrap().proto.id, "potion");

        assert_eq!(g.move_within(3, 0), Err(SlotError::EmptySlot(3)));
    }

    #[test]
    fn transfer_between_grids() {
        let catalog = fixtures::catalog();
        let arrow = fixtures::item(&catalog, "arrow");
        let mut chest = grid(2);
        let mut bag = grid(2);
        chest.add(&arrow, 15).unwrap();
        bag.add(&arrow, 10).unwrap();

        transfer(&mut chest, 0, &mut bag, 0).unwrap();
        assert_eq!(bag.get(0).unwrap().count, 20);
        assert_eq!(chest.get(0).unwrap().count, 5);

        transfer(&mut chest, 0, &mut bag, 1).unwrap();
        assert!(chest.is_empty());
        assert_eq!(bag.count_of(arrow.item_id()), 25);
    }

    #[test]
    fn snapshot_and_restore_skip_unknown_items() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        let mut g = grid(4);
        g.add(&potion, 3).unwrap();

        let mut saved = g.snapshot();
        saved.push(SavedStack { item_id: None, item_name: "Ghost".into(), quantity: 1 });

        let mut restored = grid(4);
        let skipped = restored.restore(&saved, &catalog);
        assert_eq!(skipped, vec!["Ghost".to_string()]);
        assert_eq!(restored.count_of(potion.item_id()), 3);
    }

    #[test]
    fn random_add_remove_never_breaks_slot_bounds() {
        let catalog = fixtures::catalog();
        let items = [fixtures::item(&catalog, "potion"), fixtures::item(&catalog, "arrow")];
        let mut g = grid(6);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let item = &items[rng.gen_range(0..items.len())];
            let qty = rng.gen_range(1..30);
            if rng.gen_bool(0.6) {
                g.add(item, qty).unwrap();
            } else {
                let _ = g.remove(item.item_id(), qty);
            }
            for (_, stack) in g.stacks() {
                assert!(stack.count > 0);
                assert!(stack.count <= stack.proto.max_stack_size());
            }
            for item in &items {
                assert!(g.count_of(item.item_id()) <= 6 * item.max_stack_size());
            }
        }
    }
}
