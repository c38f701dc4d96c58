//! 文字 CLI：读取 stdin → 解析命令 → 转成各模块的事件

use bevy::app::AppExit;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::character::events::ShowStats;
use crate::chest::components::ChestAction;
use crate::chest::events::{ChestCommand, ListChestsEvent, ShowChestEvent};
use crate::core::{events::LogEvent, states::AppState};
use crate::currency::events::{AddCurrencyEvent, ShowCurrencyEvent};
use crate::data::catalog::ItemCatalog;
use crate::equipment::components::EquipSlot;
use crate::equipment::events::{EquipEvent, ListEquipmentEvent, UnequipEvent};
use crate::inventory::components::GridRef;
use crate::inventory::events::*;
use crate::quick_access::events::{ListQuickEvent, UseQuickSlot};
use crate::save::events::{LoadGame, SaveGame};
use crate::shop::events::{BuyEvent, SellEvent, ShowShopEvent};

static CLI_BUFFER: Lazy<Arc<Mutex<VecDeque<String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(VecDeque::new())));

const HELP: &str = "命令列表:
  help                         查看帮助
  status                       查看当前状态
  exit / quit                  退出程序
  items [token]                列出物品 / 按 id、uuid、名称查询
  give <id> [count]            给予物品
  remove <id> [count]          从背包移除物品
  inventory                    查看背包
  page <bag|quick|箱子> <next|prev|n>  翻页
  use <index>                  使用背包物品
  equip <index>                装备背包物品
  unequip <slot>               卸下装备
  equipment                    查看装备
  quick                        查看快捷栏
  q <n>                        使用快捷栏第 n 格（1..0）
  bind <index> <slot>          背包物品拖到快捷栏
  move <from> <i> <to> <j>     任意两个容器之间拖放
  currency                     查看钱包
  addcur <currency> <amount>   加钱
  shop                         查看商店
  buy <index> [count]          购买
  sell <id> [count]            出售
  chests                       列出箱子
  open <chest> / close <chest> 开关箱子
  chest <chest>                查看箱子内容
  take <chest> <i> [j]         从箱子拿到背包
  store <chest> <i> [j]        从背包放进箱子
  pickups                      列出地上的东西
  pickup <name>                捡起
  stats                        查看属性
  save / load                  存档 / 读档
";

/// 插件入口
pub struct DebugCliPlugin;
impl Plugin for DebugCliPlugin {
    fn build(&self, app: &mut App) {
        {
            let buffer = CLI_BUFFER.clone();
            std::thread::spawn(move || {
                use std::io::{self, BufRead};
                let stdin = io::stdin();
                for line in stdin.lock().lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push_back(line.to_string());
                    }
                }
            });
        }
        app
            // 事件：原始输入行
            .add_event::<CliLine>()
            // 每帧从 buffer 取出所有命令行写入事件
            .add_systems(Update, read_stdin)
            // 仅在 InGame 处理命令
            .add_systems(
                Update,
                execute_cli_commands.run_if(in_state(AppState::InGame)),
            );
    }
}

/* ---------------------------- 事件与枚举 ---------------------------- */

/// 终端敲的一整行
#[derive(Event)]
struct CliLine(String);

/// 我们支持的命令
#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Status,
    Exit,
    Items(Option<String>), // None=全部；Some(token)=按 id/uuid/name 查询
    Give { id: String, count: u32 },
    Remove { id: String, count: u32 },
    Inventory,
    Page { target: GridRef, action: PageAction },
    Use(usize),
    Equip(usize),
    Unequip(EquipSlot),
    Equipment,
    Quick,
    QuickUse(usize),
    Move(TransferEvent),
    Currency,
    AddCurrency { currency: String, amount: u64 },
    Shop,
    Buy { index: usize, quantity: u32 },
    Sell { item: String, quantity: u32 },
    Chests,
    Chest(String, ChestAction),
    ShowChest(String),
    Pickups,
    Pickup(String),
    Stats,
    Save,
    Load,
    Invalid(String),
    Unsupported(String),
}

/// 物品 / 装备 / 快捷栏相关的事件出口
#[derive(SystemParam)]
struct ItemWriters<'w> {
    give: EventWriter<'w, GiveItemEvent>,
    remove: EventWriter<'w, RemoveItemEvent>,
    list: EventWriter<'w, ListInventoryEvent>,
    page: EventWriter<'w, PageEvent>,
    use_item: EventWriter<'w, UseItemEvent>,
    transfer: EventWriter<'w, TransferEvent>,
    equip: EventWriter<'w, EquipEvent>,
    unequip: EventWriter<'w, UnequipEvent>,
    equipment: EventWriter<'w, ListEquipmentEvent>,
    quick: EventWriter<'w, ListQuickEvent>,
    quick_use: EventWriter<'w, UseQuickSlot>,
    pickup: EventWriter<'w, PickupEvent>,
    pickups: EventWriter<'w, ListPickupsEvent>,
}

/// 钱 / 商店 / 箱子 / 存档相关的事件出口
#[derive(SystemParam)]
struct WorldWriters<'w> {
    currency: EventWriter<'w, ShowCurrencyEvent>,
    add_currency: EventWriter<'w, AddCurrencyEvent>,
    shop: EventWriter<'w, ShowShopEvent>,
    buy: EventWriter<'w, BuyEvent>,
    sell: EventWriter<'w, SellEvent>,
    chests: EventWriter<'w, ListChestsEvent>,
    chest: EventWriter<'w, ChestCommand>,
    show_chest: EventWriter<'w, ShowChestEvent>,
    stats: EventWriter<'w, ShowStats>,
    save: EventWriter<'w, SaveGame>,
    load: EventWriter<'w, LoadGame>,
}

/* ---------------------------- 读取 stdin ---------------------------- */

fn read_stdin(mut writer: EventWriter<CliLine>) {
    let Ok(mut buffer) = CLI_BUFFER.lock() else {
        return;
    };
    while let Some(line) = buffer.pop_front() {
        writer.write(CliLine(line));
    }
}

/* ---------------------------- 命令执行 ---------------------------- */

fn execute_cli_commands(
    mut line_reader: EventReader<CliLine>,
    mut app_exit: EventWriter<AppExit>,
    mut log: EventWriter<LogEvent>,
    state: Res<State<AppState>>,
    catalog: Res<ItemCatalog>,
    mut items: ItemWriters,
    mut world: WorldWriters,
) {
    for CliLine(input) in line_reader.read() {
        match parse_command(input) {
            Command::Help => {
                log.write(LogEvent(HELP.into()));
            }

            Command::Status => {
                log.write(LogEvent(format!(
                    "State: {:?}, Items Loaded: {}",
                    state.get(),
                    catalog.len()
                )));
            }

            Command::Exit => {
                log.write(LogEvent("Bye~".into()));
                app_exit.write(AppExit::Success);
            }

            Command::Items(None) => {
                for entry in catalog.iter() {
                    log.write(LogEvent(format!(
                        "{} | {} | {}",
                        entry.item_id(),
                        entry.id,
                        entry.name
                    )));
                }
            }

            Command::Items(Some(token)) => match catalog.lookup(&token) {
                Some(e) => {
                    let stats = e
                        .stats
                        .iter()
                        .map(|s| format!("{:?}{:+}", s.stat, s.value))
                        .collect::<Vec<_>>()
                        .join(" ");
                    log.write(LogEvent(format!(
                        "==================================================
UUID  : {}
ID    : {}
Name  : {}
Type  : {:?}
Stack : {}
Price : {} {}
Stats : {}
==================================================",
                        e.item_id(),
                        e.id,
                        e.name,
                        e.item_type,
                        e.max_stack_size(),
                        e.base_price,
                        e.currency,
                        stats
                    )));
                }
                None => {
                    log.write(LogEvent("未找到匹配物品".into()));
                }
            },

            Command::Give { id, count } => {
                items.give.write(GiveItemEvent { id, count });
            }
            Command::Remove { id, count } => {
                items.remove.write(RemoveItemEvent { id, count });
            }
            Command::Inventory => {
                items.list.write(ListInventoryEvent);
            }
            Command::Page { target, action } => {
                items.page.write(PageEvent { target, action });
            }
            Command::Use(index) => {
                items.use_item.write(UseItemEvent { index });
            }
            Command::Equip(index) => {
                items.equip.write(EquipEvent { index });
            }
            Command::Unequip(slot) => {
                items.unequip.write(UnequipEvent { slot });
            }
            Command::Equipment => {
                items.equipment.write(ListEquipmentEvent);
            }
            Command::Quick => {
                items.quick.write(ListQuickEvent);
            }
            Command::QuickUse(index) => {
                items.quick_use.write(UseQuickSlot { index });
            }
            Command::Move(ev) => {
                items.transfer.write(ev);
            }
            Command::Pickups => {
                items.pickups.write(ListPickupsEvent);
            }
            Command::Pickup(name) => {
                items.pickup.write(PickupEvent { name });
            }

            Command::Currency => {
                world.currency.write(ShowCurrencyEvent);
            }
            Command::AddCurrency { currency, amount } => {
                world.add_currency.write(AddCurrencyEvent { currency, amount });
            }
            Command::Shop => {
                world.shop.write(ShowShopEvent);
            }
            Command::Buy { index, quantity } => {
                world.buy.write(BuyEvent { index, quantity });
            }
            Command::Sell { item, quantity } => {
                world.sell.write(SellEvent { item, quantity });
            }
            Command::Chests => {
                world.chests.write(ListChestsEvent);
            }
            Command::Chest(chest, action) => {
                world.chest.write(ChestCommand { chest, action });
            }
            Command::ShowChest(chest) => {
                world.show_chest.write(ShowChestEvent { chest });
            }
            Command::Stats => {
                world.stats.write(ShowStats);
            }
            Command::Save => {
                world.save.write(SaveGame);
            }
            Command::Load => {
                world.load.write(LoadGame);
            }

            Command::Invalid(usage) => {
                log.write(LogEvent(format!("用法: {usage}")));
            }
            Command::Unsupported(cmd) => {
                log.write(LogEvent(format!("不支持的命令: {cmd}")));
            }
        }
    }
}

/* ---------------------------- 工具函数 ---------------------------- */

fn parse_command(input: &str) -> Command {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args: Vec<&str> = parts.collect();
    let arg = |i: usize| args.get(i).copied();
    let index = |i: usize| arg(i).and_then(|s| s.parse::<usize>().ok());
    let count = |i: usize| arg(i).map_or(Some(1), |s| s.parse::<u32>().ok());

    match cmd.as_str() {
        "help" | "h" | "?" => Command::Help,
        "status" | "s" => Command::Status,
        "exit" | "quit" => Command::Exit,
        "items" | "item" | "i" => Command::Items(arg(0).map(str::to_string)),
        "give" | "remove" => match (arg(0), count(1)) {
            (Some(id), Some(count)) if cmd == "give" => Command::Give { id: id.into(), count },
            (Some(id), Some(count)) => Command::Remove { id: id.into(), count },
            _ => Command::Invalid(format!("{cmd} <id> [count]")),
        },
        "inventory" | "inv" => Command::Inventory,
        "page" => {
            let action = match arg(1) {
                Some("next" | "n") => Some(PageAction::Next),
                Some("prev" | "previous" | "p") => Some(PageAction::Previous),
                Some(n) => n.parse().ok().map(PageAction::Set),
                None => None,
            };
            match (arg(0), action) {
                (Some(target), Some(action)) => Command::Page { target: GridRef::parse(target), action },
                _ => Command::Invalid("page <bag|quick|箱子名> <next|prev|页码>".into()),
            }
        }
        "use" => index(0).map_or(Command::Invalid("use <index>".into()), Command::Use),
        "equip" => index(0).map_or(Command::Invalid("equip <index>".into()), Command::Equip),
        "unequip" => arg(0)
            .and_then(EquipSlot::parse)
            .map_or(Command::Invalid("unequip <slot>".into()), Command::Unequip),
        "equipment" | "eq" => Command::Equipment,
        "quick" => Command::Quick,
        // 第十格对应按键 0
        "q" => match index(0) {
            Some(0) => Command::QuickUse(9),
            Some(n) => Command::QuickUse(n - 1),
            None => Command::Invalid("q <1..9|0>".into()),
        },
        "bind" => match (index(0), index(1)) {
            (Some(from), Some(to)) => Command::Move(TransferEvent {
                from: GridRef::Backpack,
                from_index: from,
                to: GridRef::QuickAccess,
                to_index: to,
            }),
            _ => Command::Invalid("bind <背包格> <快捷栏格>".into()),
        },
        "move" | "mv" => match (arg(0), index(1), arg(2), index(3)) {
            (Some(from), Some(from_index), Some(to), Some(to_index)) => Command::Move(TransferEvent {
                from: GridRef::parse(from),
                from_index,
                to: GridRef::parse(to),
                to_index,
            }),
            _ => Command::Invalid("move <from> <i> <to> <j>".into()),
        },
        "take" | "store" => match (arg(0), index(1)) {
            (Some(chest), Some(i)) => {
                let j = index(2).unwrap_or(i);
                let chest = GridRef::Chest(chest.to_string());
                let (from, to) = if cmd == "take" {
                    (chest, GridRef::Backpack)
                } else {
                    (GridRef::Backpack, chest)
                };
                Command::Move(TransferEvent { from, from_index: i, to, to_index: j })
            }
            _ => Command::Invalid(format!("{cmd} <chest> <i> [j]")),
        },
        "currency" | "wallet" => Command::Currency,
        "addcur" => match (arg(0), arg(1).and_then(|s| s.parse().ok())) {
            (Some(currency), Some(amount)) => Command::AddCurrency { currency: currency.into(), amount },
            _ => Command::Invalid("addcur <currency> <amount>".into()),
        },
        "shop" => Command::Shop,
        "buy" => match (index(0), count(1)) {
            (Some(index), Some(quantity)) => Command::Buy { index, quantity },
            _ => Command::Invalid("buy <index> [count]".into()),
        },
        "sell" => match (arg(0), count(1)) {
            (Some(item), Some(quantity)) => Command::Sell { item: item.into(), quantity },
            _ => Command::Invalid("sell <id> [count]".into()),
        },
        "chests" => Command::Chests,
        "open" | "close" => match arg(0) {
            Some(chest) => {
                let action = if cmd == "open" { ChestAction::Open } else { ChestAction::Close };
                Command::Chest(chest.into(), action)
            }
            None => Command::Invalid(format!("{cmd} <chest>")),
        },
        "chest" => arg(0).map_or(Command::Invalid("chest <chest>".into()), |c| {
            Command::ShowChest(c.into())
        }),
        "pickups" => Command::Pickups,
        "pickup" => arg(0).map_or(Command::Invalid("pickup <name>".into()), |n| {
            Command::Pickup(n.into())
        }),
        "stats" => Command::Stats,
        "save" => Command::Save,
        "load" => Command::Load,
        other => Command::Unsupported(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_with_default_of_one() {
        assert_eq!(parse_command("give potion"), Command::Give { id: "potion".into(), count: 1 });
        assert_eq!(parse_command("GIVE arrow 15"), Command::Give { id: "arrow".into(), count: 15 });
        assert!(matches!(parse_command("give arrow lots"), Command::Invalid(_)));
        assert!(matches!(parse_command("give"), Command::Invalid(_)));
    }

    #[test]
    fn quick_slot_keys_map_zero_to_tenth() {
        assert_eq!(parse_command("q 1"), Command::QuickUse(0));
        assert_eq!(parse_command("q 0"), Command::QuickUse(9));
    }

    #[test]
    fn chest_transfers_default_to_same_index() {
        assert_eq!(
            parse_command("take Cellar 2"),
            Command::Move(TransferEvent {
                from: GridRef::Chest("Cellar".into()),
                from_index: 2,
                to: GridRef::Backpack,
                to_index: 2,
            })
        );
        assert_eq!(
            parse_command("page quick next"),
            Command::Page { target: GridRef::QuickAccess, action: PageAction::Next }
        );
        assert_eq!(parse_command("unequip ring2"), Command::Unequip(EquipSlot::Ring2));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(parse_command("dance"), Command::Unsupported("dance".into()));
    }
}
