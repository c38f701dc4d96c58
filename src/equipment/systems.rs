use super::{components::*, events::*};
use crate::character::components::{Player, PlayerStatus};
use crate::core::events::{LogEvent, PresentationCue, emit_cues};
use crate::core::resources::GameConfig;
use crate::inventory::{components::Backpack, events::ListInventoryEvent};
use bevy::prelude::*;

pub fn equip_item(
    mut ev_equip: EventReader<EquipEvent>,
    mut equip: ResMut<Equipment>,
    mut backpack: ResMut<Backpack>,
    mut player: Query<&mut PlayerStatus, With<Player>>,
    mut list_event: EventWriter<ListInventoryEvent>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut log_event: EventWriter<LogEvent>,
) {
    for ev in ev_equip.read() {
        // 先检查背包索引和物品
        let Some(item) = backpack.grid.get(ev.index).map(|s| s.proto.clone()) else {
            log_event.write(LogEvent(format!("背包第 {} 格为空或不存在", ev.index)));
            continue;
        };
        let Ok(mut status) = player.single_mut() else {
            log_event.write(LogEvent("未找到玩家".to_string()));
            continue;
        };

        // 先取出一件，失败时放回原格
        if let Err(e) = backpack.grid.remove_from_slot(ev.index, 1) {
            log_event.write(LogEvent(format!("无法取出 {}: {e}", item.name)));
            continue;
        }
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };
        match equip.equip(&item, &mut ctx) {
            Ok(slot) => {
                log_event.write(LogEvent(format!("已装备 {}: {}", slot.name(), item.name)));
                list_event.write(ListInventoryEvent);
            }
            Err(e) => {
                if let Err(back) = backpack.grid.add_to_slot(ev.index, &item, 1) {
                    warn!("{} 放回背包失败: {back}", item.name);
                }
                log_event.write(LogEvent(format!("无法装备 {}: {e}", item.name)));
            }
        }
        emit_cues(&mut ev_cue, cues);
    }
}

/// 卸下装备
pub fn unequip_item(
    mut ev_unequip: EventReader<UnequipEvent>,
    mut equip: ResMut<Equipment>,
    mut backpack: ResMut<Backpack>,
    mut player: Query<&mut PlayerStatus, With<Player>>,
    mut list_event: EventWriter<ListInventoryEvent>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut log_event: EventWriter<LogEvent>,
) {
    for ev in ev_unequip.read() {
        let Ok(mut status) = player.single_mut() else {
            log_event.write(LogEvent("未找到玩家".to_string()));
            continue;
        };
        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };
        match equip.unequip_slot(ev.slot, &mut ctx) {
            Ok(item) => {
                log_event.write(LogEvent(format!("已卸下 {}: {}", ev.slot.name(), item.name)));
                list_event.write(ListInventoryEvent);
            }
            Err(e) => {
                log_event.write(LogEvent(format!("无法卸下 {}: {e}", ev.slot.name())));
            }
        }
        emit_cues(&mut ev_cue, cues);
    }
}

pub fn print_equipment(
    mut ev_list: EventReader<ListEquipmentEvent>,
    equip: Res<Equipment>,
    mut log_event: EventWriter<LogEvent>,
) {
    if ev_list.is_empty() {
        return;
    }
    ev_list.clear();

    let mut lines = vec!["=== 装备 ===".to_string()];
    for slot in EquipSlot::ALL {
        let item = equip.get(slot).map_or("-", |s| s.proto.name.as_str());
        lines.push(format!("{:<9} {item}", slot.name()));
    }
    log_event.write(LogEvent(lines.join("\n")));
}

pub fn spawn_slot_watchers(mut commands: Commands, config: Res<GameConfig>) {
    for cfg in &config.slot_watchers {
        commands.spawn((
            Name::new(format!("watch_{:?}", cfg.category)),
            SlotWatcher {
                objects_to_disable: cfg.disable.clone(),
                objects_to_enable: cfg.enable.clone(),
                ..SlotWatcher::new(cfg.category)
            },
        ));
    }
}

/// 装备变化时切换对应物体的显隐
pub fn watch_slots(
    equip: Res<Equipment>,
    mut watchers: Query<&mut SlotWatcher>,
    mut ev_cue: EventWriter<PresentationCue>,
) {
    for mut watcher in &mut watchers {
        let equipped = equip.category_equipped(watcher.category);
        if watcher.was_equipped == Some(equipped) {
            continue;
        }
        let cues = watcher.observe(equipped);
        emit_cues(&mut ev_cue, cues);
    }
}
