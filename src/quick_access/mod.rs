pub mod components;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::*;
use events::*;
use systems::*;

pub struct QuickAccessPlugin;

impl Plugin for QuickAccessPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<QuickAccessBar>()
            .add_event::<UseQuickSlot>()
            .add_event::<ListQuickEvent>()
            .add_systems(Startup, init_quick_access)
            .add_systems(
                Update,
                (poll_number_keys, use_quick_slot, print_quick_access)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
