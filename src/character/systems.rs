use super::{components::*, events::*};
use crate::core::events::LogEvent;
use bevy::prelude::*;

/// 显示属性信息
pub fn show_stats(
    mut ev_show_stats: EventReader<ShowStats>,
    mut ev_log: EventWriter<LogEvent>,
    player_query: Query<&PlayerStatus, With<Player>>,
) {
    for _ in ev_show_stats.read() {
        let Ok(s) = player_query.single() else {
            ev_log.write(LogEvent("未找到角色属性".to_string()));
            continue;
        };
        ev_log.write(LogEvent(format!(
            "=== 角色属性 ===
生命值: {}/{}  法力: {}/{}  耐力: {}/{}
力量: {}  敏捷: {}  智力: {}
攻击: {}  防御: {}  格挡: {}
速度: {}  灵巧: {}  幸运: {}
================",
            s.health, s.max_health, s.mana, s.max_mana, s.stamina, s.max_stamina,
            s.strength, s.agility, s.intelligence,
            s.attack, s.defense, s.block,
            s.speed, s.dexterity, s.luck,
        )));
    }
}

/// 初始化玩家实体
pub fn spawn_player(mut commands: Commands) {
    commands.spawn((
        Player,
        Name::new("Player"),
        PlayerStatus::default(),
        Transform::default(),
    ));
}
