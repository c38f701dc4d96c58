pub mod components;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::*;
use events::*;
use systems::*;

pub struct CurrencyPlugin;

impl Plugin for CurrencyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CurrencyLedger>()
            .add_event::<AddCurrencyEvent>()
            .add_event::<ShowCurrencyEvent>()
            .add_systems(Startup, init_ledger)
            .add_systems(
                Update,
                (add_currency, show_currency, collect_currency).run_if(in_state(AppState::InGame)),
            );
    }
}
