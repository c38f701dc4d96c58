pub mod catalog;
pub mod loader;
pub mod schema;

use bevy::prelude::*;
use catalog::ItemCatalog;
use schema::ItemList;
use crate::core::states::AppState;

// --------------------------- 资源 ---------------------------
#[derive(Resource, Default)]
pub struct ItemAssets {
    pub handle: Option<Handle<ItemList>>,
}

// --------------------------- 插件 ---------------------------
pub struct DataPlugin;
impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app
            // 注册资产类型 & Loader
            .init_asset::<ItemList>()
            .register_asset_loader(loader::RonItemLoader)
            // 注册资源
            .init_resource::<ItemAssets>()
            .init_resource::<ItemCatalog>()
            // Loading 流程
            .add_systems(OnEnter(AppState::Loading), start_loading)
            .add_systems(
                Update,
                check_loaded.run_if(in_state(AppState::Loading)),
            );
    }
}

// --------------------------- 系统 ---------------------------
fn start_loading(
    mut item_assets: ResMut<ItemAssets>,
    asset_server: Res<AssetServer>,
) {
    let handle: Handle<ItemList> = asset_server.load("data/items.ron");
    item_assets.handle = Some(handle);
}

fn check_loaded(
    mut next: ResMut<NextState<AppState>>,
    mut catalog: ResMut<ItemCatalog>,
    item_assets: Res<ItemAssets>,
    lists: Res<Assets<ItemList>>,
) {
    if let Some(h) = &item_assets.handle {
        if let Some(list) = lists.get(h) {
            *catalog = ItemCatalog::from_entries(list.items.iter().cloned());
            info!("✔ Items loaded: {}", catalog.len());
            next.set(AppState::InGame);
        }
    }
}
