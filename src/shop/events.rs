use bevy::prelude::*;

#[derive(Event)]
pub struct ShowShopEvent;

#[derive(Event)]
pub struct BuyEvent {
    pub index: usize,
    pub quantity: u32,
}

/// item 可以是 key、名字或 uuid
#[derive(Event)]
pub struct SellEvent {
    pub item: String,
    pub quantity: u32,
}
