use super::{components::*, events::*};
use crate::character::components::Player;
use crate::core::events::{LogEvent, PresentationCue};
use crate::core::resources::GameConfig;
use crate::currency::components::CurrencyLedger;
use crate::data::catalog::ItemCatalog;
use bevy::prelude::*;

/// 玩家离箱子多近算"在范围内"
pub const INTERACT_RADIUS: f32 = 2.0;
pub const INTERACT_KEY: KeyCode = KeyCode::KeyE;

/// 按配置摆放箱子并装入初始物品
pub fn spawn_chests(mut commands: Commands, config: Res<GameConfig>, catalog: Res<ItemCatalog>) {
    let mut rng = rand::thread_rng();
    for cfg in &config.chests {
        let mut chest = Chest::new(cfg.name.clone(), cfg.layout, cfg.loot.clone());
        chest.fill(&catalog, &mut rng);

        let lid = commands
            .spawn((
                Name::new(format!("{}/Lid", cfg.name)),
                Transform::default(),
                LidAnimation::new(Quat::IDENTITY, cfg.open_angle, cfg.animation_duration),
            ))
            .id();
        let controller = ChestController {
            same_key_to_close: cfg.same_key_to_close,
            open_sound: cfg.open_sound.clone(),
            close_sound: cfg.close_sound.clone(),
            toggle_objects: cfg.toggle_objects.clone(),
            lid: Some(lid),
            ..default()
        };
        commands
            .spawn((
                Name::new(cfg.name.clone()),
                chest,
                controller,
                Transform::from_translation(Vec3::from_array(cfg.position)),
            ))
            .add_child(lid);
        info!("箱子 {} 已放置", cfg.name);
    }
}

pub fn poll_chest_key(
    keys: Res<ButtonInput<KeyCode>>,
    chests: Query<(&Chest, &ChestController)>,
    mut ev_cmd: EventWriter<ChestCommand>,
) {
    if !keys.just_pressed(INTERACT_KEY) {
        return;
    }
    for (chest, controller) in &chests {
        if let Some(action) = controller.on_key() {
            ev_cmd.write(ChestCommand { chest: chest.name.clone(), action });
        }
    }
}

/// 代替触发器：按距离更新 in_range，走远了自动关箱
pub fn update_chest_range(
    player: Query<&Transform, With<Player>>,
    mut chests: Query<(&Transform, &Chest, &mut ChestController)>,
    mut ev_cmd: EventWriter<ChestCommand>,
) {
    let Ok(player) = player.single() else {
        return;
    };
    for (transform, chest, mut controller) in &mut chests {
        let near = transform.translation.distance(player.translation) <= INTERACT_RADIUS;
        if near == controller.in_range {
            continue;
        }
        if let Some(action) = controller.set_in_range(near) {
            ev_cmd.write(ChestCommand { chest: chest.name.clone(), action });
        }
    }
}

pub fn apply_chest_commands(
    mut ev_cmd: EventReader<ChestCommand>,
    mut chests: Query<(&mut Chest, &mut ChestController)>,
    mut lids: Query<&mut LidAnimation>,
    mut ledger: ResMut<CurrencyLedger>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_cmd.read() {
        let Some((mut chest, mut controller)) =
            chests.iter_mut().find(|(c, _)| c.name.eq_ignore_ascii_case(&ev.chest))
        else {
            ev_log.write(LogEvent(format!("没有名为 {} 的箱子", ev.chest)));
            continue;
        };

        let opening = ev.action == ChestAction::Open;
        if controller.is_open == opening {
            ev_log.write(LogEvent(format!(
                "箱子 {} 已经{}",
                chest.name,
                if opening { "打开" } else { "关上" }
            )));
            continue;
        }
        controller.is_open = opening;

        ev_cue.write(PresentationCue::ChestPanel { chest: chest.name.clone(), visible: opening });
        if !controller.toggle_objects.is_empty() {
            ev_cue.write(PresentationCue::SetObjectsActive {
                names: controller.toggle_objects.clone(),
                active: opening,
            });
        }
        let sound = if opening { &controller.open_sound } else { &controller.close_sound };
        if let Some(sound) = sound {
            ev_cue.write(PresentationCue::PlaySound(sound.clone()));
        }
        if let Some(mut lid) = controller.lid.and_then(|e| lids.get_mut(e).ok()) {
            if opening { lid.open() } else { lid.close() }
        }

        if opening {
            for (currency, amount) in chest.dispense_currency(&mut rand::thread_rng()) {
                match ledger.add_currency(&currency, amount) {
                    Ok(()) => {
                        ev_log.write(LogEvent(format!("从箱子里找到 {amount} {currency}")));
                    }
                    Err(e) => warn!("箱子 {} 的货币无法入账: {e}", chest.name),
                }
            }
        }
        ev_log.write(LogEvent(format!(
            "{} 箱子 {}",
            if opening { "打开了" } else { "关上了" },
            chest.name
        )));
    }
}

/// 每帧推进盖子动画
pub fn animate_lids(time: Res<Time>, mut lids: Query<(&mut LidAnimation, &mut Transform)>) {
    for (mut lid, mut transform) in &mut lids {
        if !lid.is_animating() {
            continue;
        }
        lid.tick(time.delta_secs());
        transform.rotation = lid.rotation();
    }
}

pub fn list_chests(
    mut ev_list: EventReader<ListChestsEvent>,
    chests: Query<(&Chest, &ChestController)>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_list.is_empty() {
        return;
    }
    ev_list.clear();

    let mut lines = vec!["=== 箱子 ===".to_string()];
    for (chest, controller) in &chests {
        lines.push(format!(
            "{}  {}  {} 格, {} 页",
            chest.name,
            if controller.is_open { "开" } else { "关" },
            chest.grid.len(),
            chest.grid.page_count()
        ));
    }
    ev_log.write(LogEvent(lines.join("\n")));
}

pub fn show_chest(
    mut ev_show: EventReader<ShowChestEvent>,
    chests: Query<&Chest>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_show.read() {
        let Some(chest) = chests.iter().find(|c| c.name.eq_ignore_ascii_case(&ev.chest)) else {
            ev_log.write(LogEvent(format!("没有名为 {} 的箱子", ev.chest)));
            continue;
        };
        let grid = &chest.grid;
        let mut lines = vec![format!(
            "=== {} (第 {}/{} 页) ===",
            chest.name,
            grid.current_page() + 1,
            grid.page_count().max(1)
        )];
        for idx in grid.visible_range() {
            if let Some(s) = grid.get(idx) {
                lines.push(format!("[{idx}] {} ×{}", s.proto.name, s.count));
            }
        }
        if lines.len() == 1 {
            lines.push("  (empty)".to_string());
        }
        ev_log.write(LogEvent(lines.join("\n")));
    }
}
