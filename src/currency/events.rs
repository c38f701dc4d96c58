use bevy::prelude::*;

#[derive(Event)]
pub struct AddCurrencyEvent {
    pub currency: String,
    pub amount: u64,
}

#[derive(Event)]
pub struct ShowCurrencyEvent;
