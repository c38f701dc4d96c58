use super::{components::*, events::*};
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::inventory::events::PickupEvent;
use bevy::prelude::*;

/// 按配置建立钱包
pub fn init_ledger(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(CurrencyLedger::new(config.currency.clone()));
}

pub fn add_currency(
    mut ev_add: EventReader<AddCurrencyEvent>,
    mut ledger: ResMut<CurrencyLedger>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_add.read() {
        match ledger.add_currency(&ev.currency, ev.amount) {
            Ok(()) => ev_log.write(LogEvent(format!(
                "获得 {} {}，当前: {}",
                ev.amount,
                ev.currency,
                ledger.summary()
            ))),
            Err(e) => ev_log.write(LogEvent(format!("加钱失败: {e}"))),
        };
    }
}

pub fn show_currency(
    mut ev_show: EventReader<ShowCurrencyEvent>,
    ledger: Res<CurrencyLedger>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_show.is_empty() {
        return;
    }
    ev_show.clear();
    ev_log.write(LogEvent(format!("钱包: {}", ledger.summary())));
}

/// 捡起地上的钱
pub fn collect_currency(
    mut commands: Commands,
    mut ev_pickup: EventReader<PickupEvent>,
    mut ledger: ResMut<CurrencyLedger>,
    mut ev_log: EventWriter<LogEvent>,
    pickups: Query<(Entity, &Name, &CurrencyPickup)>,
) {
    for ev in ev_pickup.read() {
        let Some((entity, name, pickup)) =
            pickups.iter().find(|(_, name, _)| name.as_str() == ev.name)
        else {
            continue;
        };
        for (currency, amount) in &pickup.amounts {
            if let Err(e) = ledger.add_currency(currency, *amount) {
                warn!("{name} 中的货币无法入账: {e}");
            }
        }
        commands.entity(entity).despawn();
        ev_log.write(LogEvent(format!("拾取 {name}，当前: {}", ledger.summary())));
    }
}
