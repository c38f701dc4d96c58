use bevy::prelude::*;

/// 显示属性事件（用于命令行）
#[derive(Event)]
pub struct ShowStats;
