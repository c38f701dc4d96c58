pub mod components;
pub mod events;
pub mod grid;
mod systems;

use bevy::prelude::*;
use crate::core::states::AppState;
use components::*;
use events::*;
use systems::*;

pub struct InventoryPlugin;
impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<Backpack>()
            .add_event::<GiveItemEvent>()
            .add_event::<RemoveItemEvent>()
            .add_event::<ListInventoryEvent>()
            .add_event::<UseItemEvent>()
            .add_event::<PageEvent>()
            .add_event::<TransferEvent>()
            .add_event::<PickupEvent>()
            .add_event::<ListPickupsEvent>()
            .add_systems(Startup, init_backpack)
            .add_systems(OnEnter(AppState::InGame), spawn_pickups)
            .add_systems(
                Update,
                (
                    give_item,
                    remove_item,
                    use_item,
                    transfer_items,
                    change_page,
                    collect_item,
                    list_pickups,
                    print_inventory,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
