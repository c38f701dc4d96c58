use bevy::prelude::*;

/// 存档到配置的路径
#[derive(Event)]
pub struct SaveGame;

/// 从配置的路径读档
#[derive(Event)]
pub struct LoadGame;
