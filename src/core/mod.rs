use bevy::prelude::*;

pub mod events;
pub mod resources;
pub mod states;

/// 核心插件：注册全局资源 / 事件 / 状态
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        use states::AppState;

        let config = resources::GameConfig::load_or_default(resources::CONFIG_PATH);
        let scene = resources::CurrentScene(config.scene.clone());

        // 插件首次载入时，插入初始 State
        app
            .init_state::<AppState>()
            .add_event::<events::LogEvent>()
            .add_event::<events::PresentationCue>()
            .insert_resource(config)
            .insert_resource(scene)
            .add_systems(Update, events::trace_cues);
    }
}
