use bevy::prelude::*;

use super::components::ChestAction;

/// 打开/关闭某个箱子（交互键或命令行）
#[derive(Event, Debug, Clone)]
pub struct ChestCommand {
    pub chest: String,
    pub action: ChestAction,
}

#[derive(Event)]
pub struct ListChestsEvent;

#[derive(Event)]
pub struct ShowChestEvent {
    pub chest: String,
}
