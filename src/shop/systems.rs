use super::{components::*, events::*};
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::currency::components::CurrencyLedger;
use crate::data::catalog::ItemCatalog;
use crate::inventory::components::Backpack;
use bevy::prelude::*;

/// 物品表加载完后再上架
pub fn init_shop(mut commands: Commands, config: Res<GameConfig>, catalog: Res<ItemCatalog>) {
    let shop = Shop::from_config(&config.shop, &catalog);
    info!("商店 {} 上架 {} 种商品", shop.name, shop.entries.len());
    commands.insert_resource(shop);
}

pub fn show_shop(
    mut ev_show: EventReader<ShowShopEvent>,
    shop: Res<Shop>,
    ledger: Res<CurrencyLedger>,
    backpack: Res<Backpack>,
    mut ev_log: EventWriter<LogEvent>,
) {
    if ev_show.is_empty() {
        return;
    }
    ev_show.clear();

    let mut lines = vec![format!("=== {} ===", shop.name)];
    for (idx, entry) in shop.entries.iter().enumerate() {
        let stock = match entry.stock {
            Stock::Infinite => "∞".to_string(),
            Stock::Limited(n) => n.to_string(),
        };
        lines.push(format!(
            "[{idx}] {}  {}  库存 {stock}",
            entry.item.name,
            shop.price_label(idx, &ledger)
        ));
    }
    let offers = shop.sell_offers(&backpack.grid);
    if !offers.is_empty() {
        lines.push(format!("--- 回收 ({:.0}%) ---", shop.sell_percentage() * 100.0));
        for (item, owned, price) in offers {
            lines.push(format!("{} ×{owned}  单价 {price} {}", item.name, item.currency));
        }
    }
    lines.push(format!("钱包: {}", ledger.summary()));
    ev_log.write(LogEvent(lines.join("\n")));
}

pub fn buy_item(
    mut ev_buy: EventReader<BuyEvent>,
    mut shop: ResMut<Shop>,
    mut backpack: ResMut<Backpack>,
    mut ledger: ResMut<CurrencyLedger>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_buy.read() {
        let msg = match shop.buy(ev.index, ev.quantity, &mut backpack.grid, &mut ledger) {
            Ok(n) => format!(
                "购买了 {} ×{n}，剩余: {}",
                shop.entries[ev.index].item.name,
                ledger.summary()
            ),
            Err(e) => format!("购买失败: {e}"),
        };
        ev_log.write(LogEvent(msg));
    }
}

pub fn sell_item(
    mut ev_sell: EventReader<SellEvent>,
    mut shop: ResMut<Shop>,
    mut backpack: ResMut<Backpack>,
    mut ledger: ResMut<CurrencyLedger>,
    catalog: Res<ItemCatalog>,
    mut ev_log: EventWriter<LogEvent>,
) {
    for ev in ev_sell.read() {
        let Some(item) = catalog.lookup(&ev.item) else {
            ev_log.write(LogEvent(format!("不存在物品 {}", ev.item)));
            continue;
        };
        let msg = match shop.sell(item.item_id(), ev.quantity, &mut backpack.grid, &mut ledger) {
            Ok((n, earned)) => format!(
                "卖出 {} ×{n}，获得 {earned} {}，当前: {}",
                item.name,
                item.currency,
                ledger.summary()
            ),
            Err(e) => format!("出售失败: {e}"),
        };
        ev_log.write(LogEvent(msg));
    }
}
