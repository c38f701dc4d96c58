use bevy::prelude::*;

/// 使用快捷栏第 index 格（数字键或命令行）
#[derive(Event)]
pub struct UseQuickSlot {
    pub index: usize,
}

#[derive(Event)]
pub struct ListQuickEvent;
