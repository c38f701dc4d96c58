use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

/// 一档货币；conversion_rate 是多少个本档换一个上一档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTier {
    pub name: String,
    pub conversion_rate: u64,
    #[serde(default)]
    pub amount: u64,
}

impl CurrencyTier {
    pub fn new(name: impl Into<String>, conversion_rate: u64) -> Self {
        Self { name: name.into(), conversion_rate, amount: 0 }
    }
}

/// 存档里的 (档位名, 数量)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyData {
    pub name: String,
    pub amount: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("unknown currency tier '{0}'")]
    UnknownTier(String),
    #[error("currency tier '{0}' has no conversion rate")]
    InvalidRate(String),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
}

/// 玩家钱包。档位从高到低排列，低档满 rate 向上进位，最高档不封顶
#[derive(Resource, Debug, Clone, Default)]
pub struct CurrencyLedger {
    tiers: Vec<CurrencyTier>,
}

impl CurrencyLedger {
    pub fn new(tiers: Vec<CurrencyTier>) -> Self {
        if tiers.is_empty() {
            warn!("未配置任何货币档位，钱包功能不可用");
        }
        Self { tiers }
    }

    pub fn tiers(&self) -> &[CurrencyTier] {
        &self.tiers
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn lowest_name(&self) -> Option<&str> {
        self.tiers.last().map(|t| t.name.as_str())
    }

    /// 检查能否往该档位入账，规则与 add_currency 相同，不改动钱包
    pub fn can_credit(&self, name: &str) -> Result<usize, CurrencyError> {
        let Some(index) = self.index_of(name) else {
            warn!("未知货币: {name}");
            return Err(CurrencyError::UnknownTier(name.to_string()));
        };
        if index > 0 && self.tiers[index].conversion_rate == 0 {
            warn!("货币 {name} 的兑换率无效");
            return Err(CurrencyError::InvalidRate(name.to_string()));
        }
        Ok(index)
    }

    pub fn add_currency(&mut self, name: &str, amount: u64) -> Result<(), CurrencyError> {
        let mut index = self.can_credit(name)?;

        let mut carry = amount;
        loop {
            let tier = &mut self.tiers[index];
            let rate = tier.conversion_rate;
            // 最高档或兑换率缺失的档位直接累加，不再进位
            if index == 0 || rate == 0 {
                tier.amount = tier.amount.saturating_add(carry);
                break;
            }
            let total = tier.amount.saturating_add(carry);
            tier.amount = total % rate;
            carry = total / rate;
            if carry == 0 {
                break;
            }
            index -= 1;
        }
        Ok(())
    }

    pub fn get_amount(&self, name: &str) -> u64 {
        self.index_of(name).map_or(0, |i| self.tiers[i].amount)
    }

    /// factor[i] = 第 i 档折合多少个最低档
    pub fn factors(&self) -> Vec<u64> {
        let mut factors = vec![1u64; self.tiers.len()];
        for i in (0..self.tiers.len().saturating_sub(1)).rev() {
            let rate = self.tiers[i + 1].conversion_rate.max(1);
            factors[i] = factors[i + 1].saturating_mul(rate);
        }
        factors
    }

    pub fn total_in_lowest(&self) -> u64 {
        self.tiers
            .iter()
            .zip(self.factors())
            .fold(0u64, |acc, (t, f)| acc.saturating_add(t.amount.saturating_mul(f)))
    }

    pub fn to_lowest(&self, amount: u64, tier: &str) -> Result<u64, CurrencyError> {
        let index = self
            .index_of(tier)
            .ok_or_else(|| CurrencyError::UnknownTier(tier.to_string()))?;
        Ok(amount.saturating_mul(self.factors()[index]))
    }

    /// 按最低档总额从高到低贪心拆分，覆盖当前各档
    pub fn set_from_lowest(&mut self, total: u64) {
        let factors = self.factors();
        let mut remainder = total;
        for (tier, factor) in self.tiers.iter_mut().zip(factors) {
            tier.amount = remainder / factor;
            remainder %= factor;
        }
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.total_in_lowest() >= cost
    }

    pub fn spend_lowest(&mut self, cost: u64) -> Result<(), CurrencyError> {
        let available = self.total_in_lowest();
        if available < cost {
            warn!("钱不够: 需要 {cost}，只有 {available}");
            return Err(CurrencyError::InsufficientFunds { needed: cost, available });
        }
        self.set_from_lowest(available - cost);
        Ok(())
    }

    /// "1 Gold 5 Silver"；0 时显示最低档
    pub fn format_lowest(&self, total: u64) -> String {
        let mut parts = Vec::new();
        let mut remainder = total;
        for (tier, factor) in self.tiers.iter().zip(self.factors()) {
            let count = remainder / factor;
            remainder %= factor;
            if count > 0 {
                parts.push(format!("{count} {}", tier.name));
            }
        }
        match (parts.is_empty(), self.lowest_name()) {
            (true, Some(lowest)) => format!("0 {lowest}"),
            _ => parts.join(" "),
        }
    }

    pub fn summary(&self) -> String {
        self.tiers
            .iter()
            .map(|t| format!("{} {}", t.amount, t.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn snapshot(&self) -> Vec<CurrencyData> {
        self.tiers
            .iter()
            .map(|t| CurrencyData { name: t.name.clone(), amount: t.amount })
            .collect()
    }

    /// 按名字覆盖；存档里没有的档位保持原值，未知档位跳过
    pub fn restore(&mut self, saved: &[CurrencyData]) -> Vec<String> {
        let mut skipped = Vec::new();
        for entry in saved {
            match self.index_of(&entry.name) {
                Some(i) => self.tiers[i].amount = entry.amount,
                None => {
                    warn!("存档中的货币 '{}' 未配置，跳过", entry.name);
                    skipped.push(entry.name.clone());
                }
            }
        }
        skipped
    }
}

/// 场景里可拾取的一堆钱
#[derive(Component, Debug, Clone)]
pub struct CurrencyPickup {
    pub amounts: Vec<(String, u64)>,
}
