use super::{components::*, events::*, grid::{SlotGrid, transfer}};
use crate::character::components::{Player, PlayerStatus};
use crate::chest::components::Chest;
use crate::core::events::{LogEvent, PresentationCue, emit_cues};
use crate::core::resources::{GameConfig, PickupConfig};
use crate::currency::components::CurrencyPickup;
use crate::data::catalog::ItemCatalog;
use crate::equipment::components::{EquipContext, Equipment};
use crate::quick_access::components::QuickAccessBar;
use bevy::prelude::*;

pub fn init_backpack(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(Backpack::new(config.inventory));
}

/// 处理"give"——往背包里塞物品
pub fn give_item(
    mut ev_give: EventReader<GiveItemEvent>,
    mut backpack: ResMut<Backpack>,
    catalog: Res<ItemCatalog>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_give.read() {
        let Some(proto) = catalog.lookup(&ev.id) else {
            warn!("不存在物品 ID {}", ev.id);
            ev_log.write(LogEvent(format!("不存在物品 {}", ev.id)));
            continue;
        };
        let msg = match backpack.grid.add(proto, ev.count) {
            Ok(r) if r.dropped > 0 => {
                format!("获得 {} ×{}，背包已满，丢弃 {}", proto.name, r.added, r.dropped)
            }
            Ok(r) => format!("获得 {} ×{}", proto.name, r.added),
            Err(e) => format!("无法获得 {}: {e}", proto.name),
        };
        ev_log.write(LogEvent(msg));
    }
}

pub fn remove_item(
    mut ev_remove: EventReader<RemoveItemEvent>,
    mut backpack: ResMut<Backpack>,
    catalog: Res<ItemCatalog>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_remove.read() {
        let Some(proto) = catalog.lookup(&ev.id) else {
            ev_log.write(LogEvent(format!("不存在物品 {}", ev.id)));
            continue;
        };
        let msg = match backpack.grid.remove(proto.item_id(), ev.count) {
            Ok(n) => format!("移除 {} ×{n}", proto.name),
            Err(e) => format!("无法移除 {}: {e}", proto.name),
        };
        ev_log.write(LogEvent(msg));
    }
}

fn render_page(title: &str, grid: &SlotGrid) -> String {
    let mut lines = vec![format!(
        "=== {title} (第 {}/{} 页) ===",
        grid.current_page() + 1,
        grid.page_count().max(1)
    )];
    for idx in grid.visible_range() {
        if let Some(stack) = grid.get(idx) {
            lines.push(format!(
                "[{idx}] {} ×{} (id={})",
                stack.proto.name, stack.count, stack.proto.id
            ));
        }
    }
    if lines.len() == 1 {
        lines.push("  (empty)".to_string());
    }
    lines.join("\n")
}

/// 打印背包当前页
pub fn print_inventory(
    mut ev_list: EventReader<ListInventoryEvent>,
    backpack: Res<Backpack>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_list.is_empty() {
        return;
    }
    ev_list.clear();
    ev_log.write(LogEvent(render_page("背包", &backpack.grid)));
}

/// 使用背包里的物品
pub fn use_item(
    mut ev_use: EventReader<UseItemEvent>,
    mut backpack: ResMut<Backpack>,
    mut equipment: ResMut<Equipment>,
    mut player: Query<&mut PlayerStatus, With<Player>>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_use.read() {
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
        let msg = match use_slot(None, ev.index, &mut equipment, &mut ctx) {
            Ok(UseOutcome::Consumed(item)) => format!("使用了 {}", item.name),
            Ok(UseOutcome::Equipped(item, slot)) => format!("已装备 {}: {}", slot.name(), item.name),
            Ok(UseOutcome::Unequipped(item)) => format!("已卸下 {}", item.name),
            Err(e) => format!("无法使用: {e}"),
        };
        emit_cues(&mut ev_cue, cues);
        ev_log.write(LogEvent(msg));
    }
}

/// 翻页；越界时停在首/末页
pub fn change_page(
    mut ev_page: EventReader<PageEvent>,
    mut backpack: ResMut<Backpack>,
    mut quick: ResMut<QuickAccessBar>,
    mut chests: Query<&mut Chest>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_page.read() {
        let apply = |grid: &mut SlotGrid| {
            match ev.action {
                PageAction::Next => {
                    grid.next_page();
                }
                PageAction::Previous => {
                    grid.previous_page();
                }
                PageAction::Set(page) => grid.set_page(page),
            }
        };
        let page = match &ev.target {
            GridRef::Backpack => {
                apply(&mut backpack.grid);
                Some(render_page("背包", &backpack.grid))
            }
            GridRef::QuickAccess => {
                apply(&mut quick.grid);
                Some(render_page("快捷栏", &quick.grid))
            }
            GridRef::Chest(name) => chests
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(|mut c| {
                    apply(&mut c.grid);
                    render_page(&c.name, &c.grid)
                }),
        };
        let msg = page.unwrap_or_else(|| format!("找不到容器 {:?}", ev.target));
        ev_log.write(LogEvent(msg));
    }
}

/// 拖放：同容器内移动，或在背包、快捷栏、箱子之间搬运
pub fn transfer_items(
    mut ev_transfer: EventReader<TransferEvent>,
    mut backpack: ResMut<Backpack>,
    mut quick: ResMut<QuickAccessBar>,
    mut chests: Query<(Entity, &mut Chest)>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_transfer.read() {
        let find = |name: &str, chests: &Query<(Entity, &mut Chest)>| {
            chests
                .iter()
                .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
                .map(|(e, _)| e)
        };
        let (from, to) = (ev.from_index, ev.to_index);
        let result: Result<(), String> = match (&ev.from, &ev.to) {
            (GridRef::Backpack, GridRef::Backpack) => {
                backpack.grid.move_within(from, to).map_err(|e| e.to_string())
            }
            (GridRef::QuickAccess, GridRef::QuickAccess) => {
                quick.grid.move_within(from, to).map_err(|e| e.to_string())
            }
            (GridRef::Backpack, GridRef::QuickAccess) => {
                transfer(&mut backpack.grid, from, &mut quick.grid, to).map_err(|e| e.to_string())
            }
            (GridRef::QuickAccess, GridRef::Backpack) => {
                transfer(&mut quick.grid, from, &mut backpack.grid, to).map_err(|e| e.to_string())
            }
            (GridRef::Chest(a), GridRef::Chest(b)) => {
                match (find(a, &chests), find(b, &chests)) {
                    (Some(x), Some(y)) if x == y => match chests.get_mut(x) {
                        Ok((_, mut c)) => c.grid.move_within(from, to).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    },
                    (Some(x), Some(y)) => match chests.get_many_mut([x, y]) {
                        Ok([(_, mut src), (_, mut dst)]) => {
                            transfer(&mut src.grid, from, &mut dst.grid, to).map_err(|e| e.to_string())
                        }
                        Err(e) => Err(e.to_string()),
                    },
                    _ => Err(format!("找不到箱子 {a} 或 {b}")),
                }
            }
            (GridRef::Chest(name), other) | (other, GridRef::Chest(name)) => {
                let chest_is_source = matches!(ev.from, GridRef::Chest(_));
                let Some(mut chest) = find(name, &chests).and_then(|e| chests.get_mut(e).ok()) else {
                    ev_log.write(LogEvent(format!("找不到箱子 {name}")));
                    continue;
                };
                let grid = match other {
                    GridRef::QuickAccess => &mut quick.grid,
                    _ => &mut backpack.grid,
                };
                let chest_grid = &mut chest.1.grid;
                let moved = if chest_is_source {
                    transfer(chest_grid, from, grid, to)
                } else {
                    transfer(grid, from, chest_grid, to)
                };
                moved.map_err(|e| e.to_string())
            }
        };
        let msg = match result {
            Ok(()) => format!("已移动 {:?}[{from}] → {:?}[{to}]", ev.from, ev.to),
            Err(e) => format!("移动失败: {e}"),
        };
        ev_log.write(LogEvent(msg));
    }
}

/// 按配置在场景里放置可拾取物
pub fn spawn_pickups(mut commands: Commands, config: Res<GameConfig>) {
    for (i, pickup) in config.pickups.iter().enumerate() {
        let name = Name::new(format!("pickup_{i}"));
        match pickup {
            PickupConfig::Item { item, quantity, position } => {
                commands.spawn((
                    name,
                    ItemPickup { item: item.clone(), quantity: *quantity },
                    Transform::from_translation(Vec3::from_array(*position)),
                ));
            }
            PickupConfig::Currency { amounts, position } => {
                commands.spawn((
                    name,
                    CurrencyPickup {
                        amounts: amounts.iter().map(|a| (a.currency.clone(), a.amount)).collect(),
                    },
                    Transform::from_translation(Vec3::from_array(*position)),
                ));
            }
        }
    }
}

/// 拾取物品；背包放不下的部分留在地上
pub fn collect_item(
    mut commands: Commands,
    mut ev_pickup: EventReader<PickupEvent>,
    mut backpack: ResMut<Backpack>,
    catalog: Res<ItemCatalog>,
    mut pickups: Query<(Entity, &Name, &mut ItemPickup)>,
    mut ev_cue: EventWriter<PresentationCue>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_pickup.read() {
        let Some((entity, name, mut pickup)) =
            pickups.iter_mut().find(|(_, name, _)| name.as_str() == ev.name)
        else {
            continue;
        };
        let Some(item) = catalog.lookup(&pickup.item) else {
            warn!("{name} 的物品 {} 不在物品表中", pickup.item);
            continue;
        };
        let report = match backpack.grid.add(item, pickup.quantity) {
            Ok(r) => r,
            Err(e) => {
                ev_log.write(LogEvent(format!("无法拾取 {}: {e}", item.name)));
                continue;
            }
        };
        if report.added == 0 {
            ev_log.write(LogEvent(format!("背包已满，无法拾取 {}", item.name)));
            continue;
        }
        if let Some(sound) = &item.sounds.pickup {
            ev_cue.write(PresentationCue::PlaySound(sound.clone()));
        }
        if report.dropped == 0 {
            commands.entity(entity).despawn();
        } else {
            pickup.quantity = report.dropped;
        }
        ev_log.write(LogEvent(format!("拾取 {} ×{}", item.name, report.added)));
    }
}

pub fn list_pickups(
    mut ev_list: EventReader<ListPickupsEvent>,
    items: Query<(&Name, &ItemPickup)>,
    coins: Query<(&Name, &CurrencyPickup)>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_list.is_empty() {
        return;
    }
    ev_list.clear();

    let mut lines = vec!["=== 地上的东西 ===".to_string()];
    lines.extend(items.iter().map(|(n, p)| format!("{n}: {} ×{}", p.item, p.quantity)));
    lines.extend(coins.iter().map(|(n, p)| {
        let amounts: Vec<_> = p.amounts.iter().map(|(c, a)| format!("{a} {c}")).collect();
        format!("{n}: {}", amounts.join(", "))
    }));
    if lines.len() == 1 {
        lines.push("  (nothing)".to_string());
    }
    ev_log.write(LogEvent(lines.join("\n")));
}
