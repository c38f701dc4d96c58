use super::{components::*, events::*};
use crate::character::components::{Player, PlayerStatus};
use crate::chest::components::Chest;
use crate::core::events::{LogEvent, PresentationCue, emit_cues};
use crate::core::resources::{CurrentScene, GameConfig};
use crate::currency::components::CurrencyLedger;
use crate::data::catalog::ItemCatalog;
use crate::equipment::components::Equipment;
use crate::inventory::components::Backpack;
use crate::quick_access::components::QuickAccessBar;
use bevy::prelude::*;

pub fn init_save_manager(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(SaveLoadManager::new(config.save.path.clone()));
}

/// 按配置摆放需要存档的场景物体
pub fn spawn_scene_objects(mut commands: Commands, config: Res<GameConfig>) {
    for cfg in &config.scene_objects {
        commands.spawn((
            Name::new(cfg.path.clone()),
            SceneObject { path: cfg.path.clone() },
            Transform::from_translation(Vec3::from_array(cfg.position)),
            Visibility::Inherited,
        ));
    }
}

pub fn save_game(
    mut ev_save: EventReader<SaveGame>,
    manager: Res<SaveLoadManager>,
    backpack: Res<Backpack>,
    equipment: Res<Equipment>,
    quick: Res<QuickAccessBar>,
    ledger: Res<CurrencyLedger>,
    scene: Res<CurrentScene>,
    player: Query<(&PlayerStatus, &Transform), With<Player>>,
    chests: Query<&Chest>,
    objects: Query<(&SceneObject, &Transform, &Visibility), Without<Player>>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_save.is_empty() {
        return;
    }
    ev_save.clear();

    let Ok((status, transform)) = player.single() else {
        ev_log.write(LogEvent("未找到玩家，无法存档".into()));
        return;
    };

    let mut data = GameSaveData::capture(&backpack.grid, &equipment, &quick, &ledger, status);
    data.player_position = transform.translation.to_array();
    data.current_scene = scene.0.clone();
    data.chest_items = chests
        .iter()
        .map(|c| ChestSaveData { chest_name: c.name.clone(), items: c.snapshot() })
        .collect();
    if !objects.is_empty() {
        data.scene_object_states = Some(
            objects
                .iter()
                .map(|(o, t, v)| SceneObjectState::capture(&o.path, t, v))
                .collect(),
        );
    }

    match manager.write(&data) {
        Ok(()) => ev_log.write(LogEvent(format!("已存档: {}", manager.path().display()))),
        Err(e) => ev_log.write(LogEvent(format!("存档失败: {e}"))),
    };
}

/// 读档：文件读取校验通过后才改动状态
pub fn load_game(
    mut commands: Commands,
    mut ev_load: EventReader<LoadGame>,
    manager: Res<SaveLoadManager>,
    catalog: Res<ItemCatalog>,
    mut backpack: ResMut<Backpack>,
    mut equipment: ResMut<Equipment>,
    mut quick: ResMut<QuickAccessBar>,
    mut ledger: ResMut<CurrencyLedger>,
    mut scene: ResMut<CurrentScene>,
    mut player: Query<(&mut PlayerStatus, &mut Transform), With<Player>>,
    mut chests: Query<&mut Chest>,
    mut objects: Query<(Entity, &SceneObject, &mut Transform, &mut Visibility), Without<Player>>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_load.is_empty() {
        return;
    }
    ev_load.clear();

    let data = match manager.read() {
        Ok(data) => data,
        Err(e) => {
            ev_log.write(LogEvent(format!("读档失败: {e}")));
            return;
        }
    };
    let Ok((mut status, mut transform)) = player.single_mut() else {
        ev_log.write(LogEvent("未找到玩家，无法读档".into()));
        return;
    };

    let mut cues = Vec::new();
    let mut skipped = PlayerState {
        backpack: &mut backpack.grid,
        equipment: &mut equipment,
        quick: &mut quick,
        ledger: &mut ledger,
        status: &mut status,
        cues: &mut cues,
    }
    .restore(&data, &catalog);
    transform.translation = Vec3::from_array(data.player_position);

    // 存档里没有的箱子保持原样
    for saved in &data.chest_items {
        match chests.iter_mut().find(|c| c.name == saved.chest_name) {
            Some(mut chest) => skipped.extend(chest.restore(&saved.items, &catalog)),
            None => warn!("存档中的箱子 {} 不在场景里", saved.chest_name),
        }
    }

    if let Some(states) = &data.scene_object_states {
        for (entity, object, mut t, mut v) in &mut objects {
            match states.iter().find(|s| s.name_path == object.path) {
                Some(state) => state.apply(&mut t, &mut v),
                None => {
                    info!("场景物体 {} 不在存档中，移除", object.path);
                    commands.entity(entity).despawn();
                }
            }
        }
    }

    if scene.0 != data.current_scene {
        info!("存档场景 {} 与当前场景 {} 不同", data.current_scene, scene.0);
        scene.0 = data.current_scene.clone();
    }

    emit_cues(&mut ev_cue, cues);
    if skipped.is_empty() {
        ev_log.write(LogEvent("读档完成".into()));
    } else {
        ev_log.write(LogEvent(format!("读档完成，跳过未知条目: {}", skipped.join(", "))));
    }
}
