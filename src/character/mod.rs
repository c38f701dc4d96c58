pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_event::<ShowStats>()
            // 在游戏开始时生成玩家
            .add_systems(OnEnter(AppState::InGame), spawn_player)
            .add_systems(Update, show_stats.run_if(in_state(AppState::InGame)));
    }
}
