pub mod components;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::*;
use events::*;
use systems::*;

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveLoadManager>()
            .add_event::<SaveGame>()
            .add_event::<LoadGame>()
            .add_systems(Startup, init_save_manager)
            .add_systems(OnEnter(AppState::InGame), spawn_scene_objects)
            .add_systems(
                Update,
                (save_game, load_game)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
