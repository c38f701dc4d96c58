use bevy::prelude::*;

use super::components::GridRef;

#[derive(Event)]
pub struct GiveItemEvent {
    pub id:    String,
    pub count: u32,
}

#[derive(Event)]
pub struct RemoveItemEvent {
    pub id:    String,
    pub count: u32,
}

#[derive(Event)]
pub struct ListInventoryEvent;   // 让 CLI 请求打印背包

/// 使用背包里某一格
#[derive(Event)]
pub struct UseItemEvent {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Next,
    Previous,
    Set(usize),
}

#[derive(Event)]
pub struct PageEvent {
    pub target: GridRef,
    pub action: PageAction,
}

/// 拖放：从一个容器的某格拖到另一个（或同一个）容器的某格
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from:       GridRef,
    pub from_index: usize,
    pub to:         GridRef,
    pub to_index:   usize,
}

/// 按名字拾取场景里的物品或钱
#[derive(Event)]
pub struct PickupEvent {
    pub name: String,
}

#[derive(Event)]
pub struct ListPickupsEvent;
