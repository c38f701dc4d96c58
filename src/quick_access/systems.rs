use super::{components::*, events::*};
use crate::character::components::{Player, PlayerStatus};
use crate::core::events::{LogEvent, PresentationCue, emit_cues};
use crate::core::resources::GameConfig;
use crate::equipment::components::{EquipContext, Equipment};
use crate::inventory::components::{Backpack, UseOutcome, use_slot};
use bevy::prelude::*;

pub fn init_quick_access(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(QuickAccessBar::new(config.quick_access.total_slots));
}

/// 数字键 1..9、0 对应快捷栏前十格
pub fn poll_number_keys(
    keys: Res<ButtonInput<KeyCode>>,
    bar: Res<QuickAccessBar>,
    mut ev_use: EventWriter<UseQuickSlot>,
) {
    for (index, key) in SLOT_KEYS.iter().enumerate().take(bar.grid.len()) {
        if keys.just_pressed(*key) {
            ev_use.write(UseQuickSlot { index });
        }
    }
}

pub fn use_quick_slot(
    mut ev_use: EventReader<UseQuickSlot>,
    mut bar: ResMut<QuickAccessBar>,
    mut backpack: ResMut<Backpack>,
    mut equipment: ResMut<Equipment>,
    mut player: Query<&mut PlayerStatus, With<Player>>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_use.read() {
        if !bar.grid.in_range(ev.index) {
            error!("快捷栏索引无效: {}", ev.index);
            ev_log.write(LogEvent(format!("快捷栏没有第 {} 格", ev.index)));
            continue;
        }
        if bar.grid.get(ev.index).is_none() {
            warn!("快捷栏第 {} 格是空的", ev.index);
            ev_log.write(LogEvent(format!("快捷栏第 {} 格是空的", ev.index)));
            continue;
        }
        let Ok(mut status) = player.single_mut() else {
            ev_log.write(LogEvent("未找到玩家".to_string()));
            continue;
        };

        let mut cues = Vec::new();
        let mut ctx = EquipContext {
            backpack: &mut backpack.grid,
            status: &mut status,
            cues: &mut cues,
        };
        let msg = match use_slot(Some(&mut bar.grid), ev.index, &mut equipment, &mut ctx) {
            Ok(UseOutcome::Consumed(item)) => format!("使用了 {}", item.name),
            Ok(UseOutcome::Equipped(item, slot)) => format!("已装备 {}: {}", slot.name(), item.name),
            Ok(UseOutcome::Unequipped(item)) => format!("已卸下 {}", item.name),
            Err(e) => format!("无法使用: {e}"),
        };
        emit_cues(&mut ev_cue, cues);
        ev_log.write(LogEvent(msg));
    }
}

pub fn print_quick_access(
    mut ev_list: EventReader<ListQuickEvent>,
    bar: Res<QuickAccessBar>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_list.is_empty() {
        return;
    }
    ev_list.clear();

    let mut lines = vec!["=== 快捷栏 ===".to_string()];
    for index in 0..bar.grid.len() {
        let key = key_label(index).unwrap_or_else(|| "-".to_string());
        match bar.grid.get(index) {
            Some(s) => lines.push(format!("[{key}] {} ×{}", s.proto.name, s.count)),
            None => lines.push(format!("[{key}] (空)")),
        }
    }
    ev_log.write(LogEvent(lines.join("\n")));
}
