use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::data::schema::{ItemStat, StatKind};

/// 玩家标记组件
#[derive(Component)]
pub struct Player;

/// 角色属性组件；同时也是存档里 playerStatus 的格式
#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub health: i32,
    pub stamina: i32,
    pub mana: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub attack: i32,
    pub defense: i32,
    pub block: i32,
    pub max_health: i32,
    pub max_mana: i32,
    pub max_stamina: i32,
    pub speed: i32,
    pub dexterity: i32,
    pub luck: i32,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            health: 50,
            stamina: 50,
            mana: 50,
            strength: 10,
            agility: 10,
            intelligence: 10,
            attack: 10,
            defense: 10,
            block: 10,
            max_health: 100,
            max_mana: 100,
            max_stamina: 100,
            speed: 10,
            dexterity: 10,
            luck: 10,
        }
    }
}

impl PlayerStatus {
    pub fn get(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Block => self.block,
            StatKind::Intelligence => self.intelligence,
            StatKind::Health => self.health,
            StatKind::MaxHealth => self.max_health,
            StatKind::Mana => self.mana,
            StatKind::MaxMana => self.max_mana,
            StatKind::Stamina => self.stamina,
            StatKind::MaxStamina => self.max_stamina,
            StatKind::Speed => self.speed,
            StatKind::Agility => self.agility,
            StatKind::Strength => self.strength,
            StatKind::Dexterity => self.dexterity,
            StatKind::Luck => self.luck,
        }
    }

    /// 当前值不超过上限；改上限时顺带压低当前值
    pub fn add_stat(&mut self, stat: StatKind, value: i32) {
        match stat {
            StatKind::Health => self.health = self.health.saturating_add(value).min(self.max_health),
            StatKind::Mana => self.mana = self.mana.saturating_add(value).min(self.max_mana),
            StatKind::Stamina => self.stamina = self.stamina.saturating_add(value).min(self.max_stamina),
            StatKind::MaxHealth => {
                self.max_health = self.max_health.saturating_add(value);
                self.health = self.health.min(self.max_health);
            }
            StatKind::MaxMana => {
                self.max_mana = self.max_mana.saturating_add(value);
                self.mana = self.mana.min(self.max_mana);
            }
            StatKind::MaxStamina => {
                self.max_stamina = self.max_stamina.saturating_add(value);
                self.stamina = self.stamina.min(self.max_stamina);
            }
            other => {
                let v = self.plain_mut(other);
                *v = v.saturating_add(value);
            }
        }
    }

    /// 当前值不低于 0
    pub fn remove_stat(&mut self, stat: StatKind, value: i32) {
        match stat {
            StatKind::Health => self.health = self.health.saturating_sub(value).max(0),
            StatKind::Mana => self.mana = self.mana.saturating_sub(value).max(0),
            StatKind::Stamina => self.stamina = self.stamina.saturating_sub(value).max(0),
            StatKind::MaxHealth => {
                self.max_health = self.max_health.saturating_sub(value);
                self.health = self.health.min(self.max_health);
            }
            StatKind::MaxMana => {
                self.max_mana = self.max_mana.saturating_sub(value);
                self.mana = self.mana.min(self.max_mana);
            }
            StatKind::MaxStamina => {
                self.max_stamina = self.max_stamina.saturating_sub(value);
                self.stamina = self.stamina.min(self.max_stamina);
            }
            other => {
                let v = self.plain_mut(other);
                *v = v.saturating_sub(value);
            }
        }
    }

    pub fn add_stats(&mut self, stats: &[ItemStat]) {
        for s in stats {
            self.add_stat(s.stat, s.value);
        }
    }

    pub fn remove_stats(&mut self, stats: &[ItemStat]) {
        for s in stats {
            self.remove_stat(s.stat, s.value);
        }
        self.health = self.health.min(self.max_health);
        self.mana = self.mana.min(self.max_mana);
        self.stamina = self.stamina.min(self.max_stamina);
    }

    /// 没有上限约束的属性
    fn plain_mut(&mut self, stat: StatKind) -> &mut i32 {
        match stat {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::Block => &mut self.block,
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::Speed => &mut self.speed,
            StatKind::Agility => &mut self.agility,
            StatKind::Strength => &mut self.strength,
            StatKind::Dexterity => &mut self.dexterity,
            StatKind::Luck => &mut self.luck,
            StatKind::Health => &mut self.health,
            StatKind::MaxHealth => &mut self.max_health,
            StatKind::Mana => &mut self.mana,
            StatKind::MaxMana => &mut self.max_mana,
            StatKind::Stamina => &mut self.stamina,
            StatKind::MaxStamina => &mut self.max_stamina,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_capped_by_max() {
        let mut s = PlayerStatus::default();
        s.add_stat(StatKind::Health, 80);
        assert_eq!(s.health, 100);
        s.remove_stat(StatKind::Health, 500);
        assert_eq!(s.health, 0);
    }

    #[test]
    fn lowering_max_clamps_current() {
        let mut s = PlayerStatus { mana: 90, ..Default::default() };
        s.add_stat(StatKind::MaxMana, -30);
        assert_eq!(s.max_mana, 70);
        assert_eq!(s.mana, 70);
    }

    #[test]
    fn add_then_remove_restores_plain_stats() {
        let mut s = PlayerStatus::default();
        let before = s.clone();
        let stats = [
            ItemStat { stat: StatKind::Attack, value: 5 },
            ItemStat { stat: StatKind::Luck, value: 2 },
            ItemStat { stat: StatKind::MaxHealth, value: 20 },
        ];
        s.add_stats(&stats);
        assert_eq!(s.get(StatKind::Attack), 15);
        assert_eq!(s.max_health, 120);
        s.remove_stats(&stats);
        assert_eq!(s, before);
    }

    #[test]
    fn extreme_values_saturate() {
        let mut s = PlayerStatus::default();
        s.add_stat(StatKind::Attack, i32::MAX);
        s.add_stat(StatKind::Attack, i32::MAX);
        assert_eq!(s.attack, i32::MAX);

        s.add_stat(StatKind::MaxHealth, i32::MAX);
        s.add_stat(StatKind::Health, i32::MAX);
        assert_eq!(s.max_health, i32::MAX);
        assert_eq!(s.health, i32::MAX);

        s.remove_stat(StatKind::Luck, i32::MAX);
        s.remove_stat(StatKind::Luck, i32::MAX);
        assert_eq!(s.luck, i32::MIN);
        s.remove_stat(StatKind::Health, i32::MIN);
        assert_eq!(s.health, i32::MAX);
    }
}
