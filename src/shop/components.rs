use bevy::prelude::*;
use std::sync::Arc;
use thiserror::Error;

use crate::core::resources::ShopConfig;
use crate::currency::components::{CurrencyError, CurrencyLedger};
use crate::data::catalog::ItemCatalog;
use crate::data::schema::{ItemEntry, ItemId};
use crate::inventory::grid::SlotGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stock {
    Infinite,
    Limited(u32),
}

/// 货架上的一行；price 以物品自身的货币档位计
#[derive(Debug, Clone)]
pub struct ShopEntry {
    pub item: Arc<ItemEntry>,
    pub stock: Stock,
    pub price: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("shop has no entry #{0}")]
    UnknownEntry(usize),
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("backpack has no room for {0}")]
    InventoryFull(String),
    #[error("you do not own any {0}")]
    NotOwned(String),
    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// 回收比例以万分之一为单位保存，算价时只用整数
const BASIS_POINTS: u64 = 10_000;

#[derive(Resource, Debug, Clone, Default)]
pub struct Shop {
    pub name: String,
    sell_basis_points: u64,
    pub entries: Vec<ShopEntry>,
}

impl Shop {
    pub fn new(name: impl Into<String>, sell_percentage: f32, entries: Vec<ShopEntry>) -> Self {
        Self {
            name: name.into(),
            sell_basis_points: (f64::from(sell_percentage.clamp(0.0, 1.0)) * BASIS_POINTS as f64)
                .round() as u64,
            entries,
        }
    }

    /// 按配置上架；物品表里没有的条目跳过
    pub fn from_config(config: &ShopConfig, catalog: &ItemCatalog) -> Self {
        let entries = config
            .items
            .iter()
            .filter_map(|cfg| {
                let Some(item) = catalog.lookup(&cfg.item) else {
                    warn!("商店 {} 的商品 {} 不在物品表中", config.name, cfg.item);
                    return None;
                };
                Some(ShopEntry {
                    item: item.clone(),
                    stock: if cfg.infinite { Stock::Infinite } else { Stock::Limited(cfg.quantity) },
                    price: cfg.price.unwrap_or(item.base_price),
                })
            })
            .collect();
        Self::new(config.name.clone(), config.sell_percentage, entries)
    }

    pub fn sell_percentage(&self) -> f32 {
        self.sell_basis_points as f32 / BASIS_POINTS as f32
    }

    fn entry_index(&self, id: ItemId) -> Option<usize> {
        self.entries.iter().position(|e| e.item.item_id() == id)
    }

    /// 买 quantity 件（有限库存时截到库存量），返回实际买到的数量
    pub fn buy(
        &mut self,
        index: usize,
        quantity: u32,
        backpack: &mut SlotGrid,
        ledger: &mut CurrencyLedger,
    ) -> Result<u32, ShopError> {
        let entry = self.entries.get(index).ok_or(ShopError::UnknownEntry(index))?;
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let quantity = match entry.stock {
            Stock::Limited(0) => return Err(ShopError::OutOfStock(entry.item.name.clone())),
            Stock::Limited(n) => quantity.min(n),
            Stock::Infinite => quantity,
        };
        if !backpack.can_accept(&entry.item, quantity) {
            warn!("背包放不下 {} ×{quantity}", entry.item.name);
            return Err(ShopError::InventoryFull(entry.item.name.clone()));
        }

        let cost = ledger.to_lowest(entry.price.saturating_mul(quantity as u64), &entry.item.currency)?;
        ledger.spend_lowest(cost)?;
        let item = entry.item.clone();
        backpack
            .add(&item, quantity)
            .map_err(|_| ShopError::InventoryFull(item.name.clone()))?;

        if let Stock::Limited(n) = &mut self.entries[index].stock {
            *n -= quantity;
        }
        info!("购买 {} ×{quantity}，花费 {}", item.name, ledger.format_lowest(cost));
        Ok(quantity)
    }

    /// 回收单价 = floor(价格 × 回收比例)，按物品自身档位计
    pub fn sell_price(&self, item: &ItemEntry) -> u64 {
        let price = self
            .entry_index(item.item_id())
            .map_or(item.base_price, |i| self.entries[i].price);
        price.saturating_mul(self.sell_basis_points) / BASIS_POINTS
    }

    /// 卖掉最多 quantity 件，返回 (卖出数量, 入账金额)
    pub fn sell(
        &mut self,
        id: ItemId,
        quantity: u32,
        backpack: &mut SlotGrid,
        ledger: &mut CurrencyLedger,
    ) -> Result<(u32, u64), ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let Some(item) = backpack
            .stacks()
            .find(|(_, s)| s.id() == id)
            .map(|(_, s)| s.proto.clone())
        else {
            warn!("背包里没有要卖的物品 {id}");
            return Err(ShopError::NotOwned(id.to_string()));
        };
        // 先确认能入账，避免物品扣了钱却进不来
        ledger.can_credit(&item.currency)?;

        let quantity = quantity.min(backpack.count_of(id));
        for _ in 0..quantity {
            if let Err(e) = backpack.remove(id, 1) {
                warn!("卖出 {} 时扣除失败: {e}", item.name);
            }
        }
        let earned = self.sell_price(&item).saturating_mul(quantity as u64);
        if earned > 0 {
            ledger.add_currency(&item.currency, earned)?;
        }
        self.restock(id, quantity);
        info!("卖出 {} ×{quantity}，获得 {earned} {}", item.name, item.currency);
        Ok((quantity, earned))
    }

    /// 有限库存的商品补货；无限库存和非本店商品不变
    pub fn restock(&mut self, id: ItemId, quantity: u32) {
        if let Some(i) = self.entry_index(id) {
            if let Stock::Limited(n) = &mut self.entries[i].stock {
                *n = n.saturating_add(quantity);
            }
        }
    }

    /// 卖出列表：先是本店收购的商品，再是背包里其他物品，各出现一次
    pub fn sell_offers(&self, backpack: &SlotGrid) -> Vec<(Arc<ItemEntry>, u32, u64)> {
        let mut offers: Vec<(Arc<ItemEntry>, u32, u64)> = Vec::new();
        let curated = self.entries.iter().map(|e| e.item.clone());
        let others = backpack.stacks().map(|(_, s)| s.proto.clone());
        for item in curated.chain(others) {
            let id = item.item_id();
            let owned = backpack.count_of(id);
            if owned == 0 || offers.iter().any(|(o, _, _)| o.item_id() == id) {
                continue;
            }
            let price = self.sell_price(&item);
            offers.push((item, owned, price));
        }
        offers
    }

    pub fn price_label(&self, index: usize, ledger: &CurrencyLedger) -> String {
        let Some(entry) = self.entries.get(index) else {
            return String::new();
        };
        match ledger.to_lowest(entry.price, &entry.item.currency) {
            Ok(lowest) => ledger.format_lowest(lowest),
            Err(_) => format!("{} {}", entry.price, entry.item.currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::components::CurrencyTier;
    use crate::data::catalog::fixtures;
    use crate::inventory::grid::GridLayout;

    fn ledger() -> CurrencyLedger {
        CurrencyLedger::new(vec![
            CurrencyTier::new("Gold", 0),
            CurrencyTier::new("Silver", 100),
            CurrencyTier::new("Copper", 100),
        ])
    }

    fn shop(catalog: &ItemCatalog) -> Shop {
        Shop::new(
            "General Store",
            0.75,
            vec![
                ShopEntry {
                    item: fixtures::item(catalog, "helmet"),
                    stock: Stock::Limited(2),
                    price: 5,
                },
                ShopEntry {
                    item: fixtures::item(catalog, "potion"),
                    stock: Stock::Infinite,
                    price: 10,
                },
            ],
        )
    }

    #[test]
    fn exact_funds_buy_and_short_funds_fail() {
        let catalog = fixtures::catalog();
        let mut shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(4));

        let mut poor = ledger();
        poor.add_currency("Silver", 4).unwrap();
        let err = shop.buy(0, 1, &mut backpack, &mut poor).unwrap_err();
        assert!(matches!(err, ShopError::Currency(CurrencyError::InsufficientFunds { .. })));
        assert_eq!(poor.get_amount("Silver"), 4);
        assert!(backpack.is_empty());
        assert_eq!(shop.entries[0].stock, Stock::Limited(2));

        let mut wallet = ledger();
        wallet.add_currency("Silver", 5).unwrap();
        assert_eq!(shop.buy(0, 1, &mut backpack, &mut wallet), Ok(1));
        assert_eq!(wallet.get_amount("Silver"), 0);
        assert_eq!(wallet.total_in_lowest(), 0);
        assert_eq!(shop.entries[0].stock, Stock::Limited(1));
    }

    #[test]
    fn limited_stock_clamps_and_runs_out() {
        let catalog = fixtures::catalog();
        let mut shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(4));
        let mut wallet = ledger();
        wallet.add_currency("Gold", 1).unwrap();

        assert_eq!(shop.buy(0, 5, &mut backpack, &mut wallet), Ok(2));
        assert_eq!(wallet.get_amount("Silver"), 90);
        assert!(matches!(shop.buy(0, 1, &mut backpack, &mut wallet), Err(ShopError::OutOfStock(_))));
        assert_eq!(shop.buy(7, 1, &mut backpack, &mut wallet), Err(ShopError::UnknownEntry(7)));
    }

    #[test]
    fn full_backpack_is_checked_before_paying() {
        let catalog = fixtures::catalog();
        let mut shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(1));
        backpack.add(&fixtures::item(&catalog, "arrow"), 1).unwrap();
        let mut wallet = ledger();
        wallet.add_currency("Silver", 10).unwrap();

        assert!(matches!(shop.buy(1, 1, &mut backpack, &mut wallet), Err(ShopError::InventoryFull(_))));
        assert_eq!(wallet.get_amount("Silver"), 10);
    }

    #[test]
    fn selling_restocks_and_never_profits() {
        let catalog = fixtures::catalog();
        let mut shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(4));
        let mut wallet = ledger();
        wallet.add_currency("Silver", 5).unwrap();
        shop.buy(0, 1, &mut backpack, &mut wallet).unwrap();

        let helmet = fixtures::item(&catalog, "helmet").item_id();
        // floor(5 × 0.75) = 3 Silver
        assert_eq!(shop.sell(helmet, 3, &mut backpack, &mut wallet), Ok((1, 3)));
        assert_eq!(wallet.get_amount("Silver"), 3);
        assert_eq!(shop.entries[0].stock, Stock::Limited(2));
        assert!(wallet.total_in_lowest() < 500);

        assert!(matches!(shop.sell(helmet, 1, &mut backpack, &mut wallet), Err(ShopError::NotOwned(_))));
    }

    #[test]
    fn offers_list_curated_then_other_items() {
        let catalog = fixtures::catalog();
        let shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(4));
        backpack.add(&fixtures::item(&catalog, "arrow"), 4).unwrap();
        backpack.add(&fixtures::item(&catalog, "potion"), 6).unwrap();

        let offers = shop.sell_offers(&backpack);
        let names: Vec<_> = offers.iter().map(|(i, n, p)| (i.id.as_str(), *n, *p)).collect();
        // potion: floor(10 × 0.75) = 7；arrow 不在货架上: floor(1 × 0.75) = 0
        assert_eq!(names, vec![("potion", 6, 7), ("arrow", 4, 0)]);
    }

    #[test]
    fn price_label_uses_tiers() {
        let catalog = fixtures::catalog();
        let shop = shop(&catalog);
        assert_eq!(shop.price_label(0, &ledger()), "5 Silver");
        assert_eq!(shop.price_label(1, &ledger()), "10 Copper");
        assert_eq!(Shop::new("x", 3.0, Vec::new()).sell_percentage(), 1.0);
    }

    #[test]
    fn sell_price_floors_inexact_percentages() {
        let catalog = fixtures::catalog();
        let potion = fixtures::item(&catalog, "potion");
        // floor(10 × 0.7) = 7，floor(10 × 0.9) = 9，floor(10 × 0.35) = 3
        assert_eq!(Shop::new("s", 0.7, Vec::new()).sell_price(&potion), 7);
        assert_eq!(Shop::new("s", 0.9, Vec::new()).sell_price(&potion), 9);
        assert_eq!(Shop::new("s", 0.35, Vec::new()).sell_price(&potion), 3);
        assert_eq!(Shop::new("s", 0.0, Vec::new()).sell_price(&potion), 0);
    }

    #[test]
    fn uncreditable_tier_keeps_items() {
        let catalog = fixtures::catalog();
        let mut shop = shop(&catalog);
        let mut backpack = SlotGrid::new(GridLayout::single_row(4));
        let potion = fixtures::item(&catalog, "potion");
        backpack.add(&potion, 3).unwrap();
        let mut broken = CurrencyLedger::new(vec![
            CurrencyTier::new("Gold", 0),
            CurrencyTier::new("Copper", 0),
        ]);

        let err = shop.sell(potion.item_id(), 3, &mut backpack, &mut broken).unwrap_err();
        assert_eq!(err, ShopError::Currency(CurrencyError::InvalidRate("Copper".into())));
        assert_eq!(backpack.count_of(potion.item_id()), 3);
        assert_eq!(broken.get_amount("Copper"), 0);
        assert_eq!(shop.entries[1].stock, Stock::Infinite);
    }
}
