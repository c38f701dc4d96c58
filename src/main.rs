use bevy::prelude::*;

mod character;
mod chest;
mod core;
mod currency;
mod data;
mod equipment;
mod interface;
mod inventory;
mod quick_access;
mod save;
mod shop;

use core::CorePlugin;
use interface::debug_cli::DebugCliPlugin;
use crate::core::states;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                visible: false,
                ..default()
            }),   // 不可见窗口，实现“无 UI”
            ..default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(DebugCliPlugin)
        .add_plugins(data::DataPlugin)
        .add_plugins(character::CharacterPlugin)
        .add_plugins(inventory::InventoryPlugin)
        .add_plugins(equipment::EquipmentPlugin)
        .add_plugins(quick_access::QuickAccessPlugin)
        .add_plugins(currency::CurrencyPlugin)
        .add_plugins(chest::ChestPlugin)
        .add_plugins(shop::ShopPlugin)
        .add_plugins(save::SavePlugin)
        .add_systems(Update, forward_log_event) // 简单打印
        .add_systems(Startup, |mut next: ResMut<NextState<states::AppState>>| {
            next.set(states::AppState::Loading);
        })
        .run();
}

fn forward_log_event(mut reader: EventReader<core::events::LogEvent>) {
    for e in reader.read() {
        println!("> {}", e.0);
    }
}
