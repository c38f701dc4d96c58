use bevy::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use serde_derive::Deserialize;

use crate::data::catalog::ItemCatalog;
use crate::inventory::grid::{GridLayout, SavedStack, SlotGrid};

#[derive(Debug, Clone, Deserialize)]
pub struct LootItem {
    pub item: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

/// quantity 次独立掷骰，每次以 drop_probability 掉一件
#[derive(Debug, Clone, Deserialize)]
pub struct RandomLoot {
    pub item: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default = "certain")]
    pub drop_probability: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyRange {
    pub currency: String,
    pub min: u64,
    pub max: u64,
}

fn one() -> u32 {
    1
}

fn certain() -> f32 {
    1.0
}

/// 箱子的初始内容：固定列表，或随机掉落 + 首次打开时给钱
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LootTable {
    pub items: Vec<LootItem>,
    pub randomize: bool,
    pub min_drops: u32,
    pub max_drops: u32,
    pub random_items: Vec<RandomLoot>,
    pub random_currency: Vec<CurrencyRange>,
}

impl Default for LootTable {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            randomize: false,
            min_drops: 1,
            max_drops: 5,
            random_items: Vec::new(),
            random_currency: Vec::new(),
        }
    }
}

impl LootTable {
    /// 生成 (物品 key, 数量)；随机模式下每件数量为 1，总件数落在 [min_drops, max_drops]
    pub fn roll_items(&self, rng: &mut impl Rng) -> Vec<(String, u32)> {
        if !self.randomize {
            return self
                .items
                .iter()
                .filter(|e| e.quantity > 0)
                .map(|e| (e.item.clone(), e.quantity))
                .collect();
        }

        let mut prepared: Vec<&str> = Vec::new();
        for entry in &self.random_items {
            let p = entry.drop_probability.clamp(0.0, 1.0) as f64;
            for _ in 0..entry.quantity {
                if rng.gen_bool(p) {
                    prepared.push(&entry.item);
                }
            }
        }

        let lo = self.min_drops.min(self.max_drops) as usize;
        let hi = self.min_drops.max(self.max_drops) as usize;
        let target = rng.gen_range(lo..=hi);
        if prepared.len() > target {
            prepared.shuffle(rng);
            prepared.truncate(target);
        } else {
            while prepared.len() < target {
                let Some(entry) = self.random_items.choose(rng) else {
                    break;
                };
                prepared.push(&entry.item);
            }
        }
        prepared.into_iter().map(|k| (k.to_string(), 1)).collect()
    }

    pub fn roll_currency(&self, rng: &mut impl Rng) -> Vec<(String, u64)> {
        if !self.randomize {
            return Vec::new();
        }
        self.random_currency
            .iter()
            .filter(|c| !c.currency.is_empty() && c.max >= c.min)
            .map(|c| (c.currency.clone(), rng.gen_range(c.min..=c.max)))
            .collect()
    }
}

/// 场景里的箱子；name 是存档键
#[derive(Component, Debug, Clone)]
pub struct Chest {
    pub name: String,
    pub grid: SlotGrid,
    pub loot: LootTable,
    pub currency_dispensed: bool,
}

impl Chest {
    pub fn new(name: impl Into<String>, layout: GridLayout, loot: LootTable) -> Self {
        Self {
            name: name.into(),
            grid: SlotGrid::new(layout),
            loot,
            currency_dispensed: false,
        }
    }

    /// 按掉落表装入初始物品，返回物品表里找不到的 key
    pub fn fill(&mut self, catalog: &ItemCatalog, rng: &mut impl Rng) -> Vec<String> {
        let mut missing = Vec::new();
        for (key, quantity) in self.loot.roll_items(rng) {
            match catalog.lookup(&key) {
                Some(item) => {
                    if let Err(e) = self.grid.add(item, quantity) {
                        warn!("箱子 {} 装入 {key} 失败: {e}", self.name);
                    }
                }
                None => {
                    warn!("箱子 {} 的掉落物 {key} 不在物品表中", self.name);
                    missing.push(key);
                }
            }
        }
        missing
    }

    /// 只在第一次打开时给钱
    pub fn dispense_currency(&mut self, rng: &mut impl Rng) -> Vec<(String, u64)> {
        if !self.loot.randomize || self.currency_dispensed {
            return Vec::new();
        }
        self.currency_dispensed = true;
        self.loot.roll_currency(rng)
    }

    pub fn snapshot(&self) -> Vec<SavedStack> {
        self.grid.snapshot()
    }

    pub fn restore(&mut self, saved: &[SavedStack], catalog: &ItemCatalog) -> Vec<String> {
        self.grid.restore(saved, catalog)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestAction {
    Open,
    Close,
}

/// 交互状态：玩家是否在附近、是否已打开
#[derive(Component, Debug, Clone, Default)]
pub struct ChestController {
    pub in_range: bool,
    pub same_key_to_close: bool,
    pub is_open: bool,
    pub open_sound: Option<String>,
    pub close_sound: Option<String>,
    pub toggle_objects: Vec<String>,
    pub lid: Option<Entity>,
}

impl ChestController {
    /// 按下交互键
    pub fn on_key(&self) -> Option<ChestAction> {
        match (self.in_range, self.is_open) {
            (false, _) => None,
            (true, false) => Some(ChestAction::Open),
            (true, true) => self.same_key_to_close.then_some(ChestAction::Close),
        }
    }

    pub fn set_in_range(&mut self, in_range: bool) -> Option<ChestAction> {
        let left = self.in_range && !in_range;
        self.in_range = in_range;
        (left && self.is_open).then_some(ChestAction::Close)
    }
}

/// 盖子动画状态机；进度是朝当前目标走了多少
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LidState {
    Closed,
    Opening(f32),
    Open,
    Closing(f32),
}

#[derive(Component, Debug, Clone)]
pub struct LidAnimation {
    pub state: LidState,
    pub duration: f32,
    pub closed: Quat,
    pub open: Quat,
}

impl LidAnimation {
    pub fn new(closed: Quat, open_angle: [f32; 3], duration: f32) -> Self {
        let [x, y, z] = open_angle.map(f32::to_radians);
        Self {
            state: LidState::Closed,
            duration,
            closed,
            open: closed * Quat::from_euler(EulerRot::XYZ, x, y, z),
        }
    }

    /// 中途反向时保持开合程度连续
    pub fn open(&mut self) {
        self.state = match self.state {
            LidState::Closed => LidState::Opening(0.0),
            LidState::Closing(p) => LidState::Opening(1.0 - p),
            other => other,
        };
    }

    pub fn close(&mut self) {
        self.state = match self.state {
            LidState::Open => LidState::Closing(0.0),
            LidState::Opening(p) => LidState::Closing(1.0 - p),
            other => other,
        };
    }

    pub fn tick(&mut self, dt: f32) {
        let step = if self.duration <= 0.0 { 1.0 } else { dt / self.duration };
        self.state = match self.state {
            LidState::Opening(p) if p + step >= 1.0 => LidState::Open,
            LidState::Opening(p) => LidState::Opening(p + step),
            LidState::Closing(p) if p + step >= 1.0 => LidState::Closed,
            LidState::Closing(p) => LidState::Closing(p + step),
            settled => settled,
        };
    }

    /// 0 = 关, 1 = 开
    pub fn openness(&self) -> f32 {
        match self.state {
            LidState::Closed => 0.0,
            LidState::Open => 1.0,
            LidState::Opening(p) => p,
            LidState::Closing(p) => 1.0 - p,
        }
    }

    pub fn rotation(&self) -> Quat {
        self.closed.slerp(self.open, self.openness())
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, LidState::Opening(_) | LidState::Closing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::fixtures;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn random_table() -> LootTable {
        LootTable {
            randomize: true,
            min_drops: 2,
            max_drops: 4,
            random_items: vec![
                RandomLoot { item: "potion".into(), quantity: 10, drop_probability: 0.5 },
                RandomLoot { item: "arrow".into(), quantity: 3, drop_probability: 0.0 },
            ],
            random_currency: vec![
                CurrencyRange { currency: "Copper".into(), min: 5, max: 9 },
                CurrencyRange { currency: "Silver".into(), min: 3, max: 1 },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn manual_loot_is_used_as_is() {
        let table = LootTable {
            items: vec![
                LootItem { item: "arrow".into(), quantity: 25 },
                LootItem { item: "potion".into(), quantity: 0 },
            ],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(table.roll_items(&mut rng), vec![("arrow".to_string(), 25)]);
        assert!(table.roll_currency(&mut rng).is_empty());
    }

    #[test]
    fn random_drop_count_stays_in_bounds() {
        let table = random_table();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drops = table.roll_items(&mut rng);
            assert!((2..=4).contains(&drops.len()), "seed {seed}: {}", drops.len());
            assert!(drops.iter().all(|(_, q)| *q == 1));
        }
    }

    #[test]
    fn currency_is_dispensed_once() {
        let mut chest = Chest::new("Cellar", GridLayout::single_row(4), random_table());
        let mut rng = StdRng::seed_from_u64(7);
        let first = chest.dispense_currency(&mut rng);
        assert_eq!(first.len(), 1);
        assert!((5..=9).contains(&first[0].1));
        assert!(chest.dispense_currency(&mut rng).is_empty());
    }

    #[test]
    fn fill_reports_unknown_items() {
        let table = LootTable {
            items: vec![
                LootItem { item: "potion".into(), quantity: 7 },
                LootItem { item: "dragon_egg".into(), quantity: 1 },
            ],
            ..Default::default()
        };
        let mut chest = Chest::new("Cellar", GridLayout::single_row(4), table);
        let catalog = fixtures::catalog();
        let missing = chest.fill(&catalog, &mut StdRng::seed_from_u64(0));
        assert_eq!(missing, vec!["dragon_egg".to_string()]);
        // 堆叠上限 5，分成两格
        assert_eq!(chest.grid.get(0).map(|s| s.count), Some(5));
        assert_eq!(chest.grid.get(1).map(|s| s.count), Some(2));
    }

    #[test]
    fn controller_key_and_range_rules() {
        let mut c = ChestController::default();
        assert_eq!(c.on_key(), None);
        assert_eq!(c.set_in_range(true), None);
        assert_eq!(c.on_key(), Some(ChestAction::Open));
        c.is_open = true;
        assert_eq!(c.on_key(), None);
        c.same_key_to_close = true;
        assert_eq!(c.on_key(), Some(ChestAction::Close));
        assert_eq!(c.set_in_range(false), Some(ChestAction::Close));
    }

    #[test]
    fn lid_reverses_without_jumping() {
        let mut lid = LidAnimation::new(Quat::IDENTITY, [0.0, 0.0, 90.0], 1.0);
        lid.open();
        lid.tick(0.25);
        assert!((lid.openness() - 0.25).abs() < 1e-5);

        lid.close();
        assert!((lid.openness() - 0.25).abs() < 1e-5);
        assert!(lid.is_animating());
        lid.tick(0.5);
        assert_eq!(lid.state, LidState::Closed);

        lid.open();
        for _ in 0..10 {
            lid.tick(0.2);
        }
        assert_eq!(lid.state, LidState::Open);
        assert_eq!(lid.openness(), 1.0);
        assert!(lid.rotation().abs_diff_eq(lid.open, 1e-5));
    }
}
