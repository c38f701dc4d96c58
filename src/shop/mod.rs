pub mod components;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::*;
use events::*;
use systems::*;

pub struct ShopPlugin;

impl Plugin for ShopPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Shop>()
            .add_event::<ShowShopEvent>()
            .add_event::<BuyEvent>()
            .add_event::<SellEvent>()
            .add_systems(OnEnter(AppState::InGame), init_shop)
            .add_systems(
                Update,
                (show_shop, buy_item, sell_item).run_if(in_state(AppState::InGame)),
            );
    }
}
