pub mod components;
pub mod events;
mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct ChestPlugin;

impl Plugin for ChestPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ChestCommand>()
            .add_event::<ListChestsEvent>()
            .add_event::<ShowChestEvent>()
            .add_systems(OnEnter(AppState::InGame), spawn_chests)
            .add_systems(
                Update,
                (
                    (poll_chest_key, update_chest_range, apply_chest_commands, animate_lids).chain(),
                    list_chests,
                    show_chest,
                )
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::components::*;
    use super::*;
    use crate::core::events::{LogEvent, PresentationCue};
    use crate::currency::components::{CurrencyLedger, CurrencyTier};
    use crate::inventory::grid::GridLayout;

    #[test]
    fn open_command_runs_through_schedule() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<ChestCommand>()
            .add_event::<PresentationCue>()
            .add_event::<LogEvent>()
            .insert_resource(CurrencyLedger::new(vec![
                CurrencyTier::new("Silver", 0),
                CurrencyTier::new("Copper", 100),
            ]))
            .add_systems(Update, (apply_chest_commands, animate_lids).chain());

        let loot = LootTable {
            randomize: true,
            min_drops: 0,
            max_drops: 0,
            random_currency: vec![CurrencyRange { currency: "Copper".into(), min: 150, max: 150 }],
            ..Default::default()
        };
        let lid = app
            .world_mut()
            .spawn((Transform::default(), LidAnimation::new(Quat::IDENTITY, [0.0, 0.0, 90.0], 0.5)))
            .id();
        let chest = app
            .world_mut()
            .spawn((
                Chest::new("Cellar", GridLayout::single_row(4), loot),
                ChestController { lid: Some(lid), ..Default::default() },
            ))
            .id();

        app.world_mut().send_event(ChestCommand { chest: "cellar".into(), action: ChestAction::Open });
        app.update();

        let world = app.world();
        assert!(world.get::<ChestController>(chest).is_some_and(|c| c.is_open));
        assert!(world.get::<Chest>(chest).is_some_and(|c| c.currency_dispensed));
        assert!(world.get::<LidAnimation>(lid).is_some_and(|l| l.state != LidState::Closed));
        let ledger = world.resource::<CurrencyLedger>();
        assert_eq!(ledger.get_amount("Silver"), 1);
        assert_eq!(ledger.get_amount("Copper"), 50);
    }
}
