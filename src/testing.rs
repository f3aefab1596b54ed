//! Shared fixtures for unit tests: a small item catalog, one trader and
//! helpers to build characters around a 10x10 stash.

use crate::catalog::handbook::{PriceTable, DOLLARS, EUROS, ROUBLES};
use crate::catalog::items::{GridTemplate, ItemCatalog, ItemProps, ItemTemplate};
use crate::catalog::traders::{Assort, BarterLine, Trader, TraderBase};
use crate::catalog::Catalog;
use crate::entities::character::Character;
use crate::entities::inventory::{Inventory, STASH_GRID};
use crate::entities::item::{GridLocation, InventoryItem, ItemId, ItemLocation, Rotation};
use crate::inventory::state::CharacterState;
use std::collections::HashMap;

pub const STASH: &str = "tpl-stash";
pub const EQUIPMENT: &str = "tpl-equipment";
pub const BANDAGE: &str = "tpl-bandage";
pub const BOX_2X2: &str = "tpl-box";
pub const AMMO: &str = "tpl-ammo";
pub const MAGAZINE: &str = "tpl-magazine";
pub const RIFLE: &str = "tpl-rifle";
pub const STOCK: &str = "tpl-stock";

fn template(id: &str, props: ItemProps) -> ItemTemplate {
    ItemTemplate::new(id, id.trim_start_matches("tpl-"), props)
}

fn items() -> ItemCatalog {
    let mut catalog = ItemCatalog::default();
    let templates = [
        template(
            STASH,
            ItemProps {
                width: 10,
                height: 10,
                grids: vec![GridTemplate::new(STASH_GRID, 10, 10)],
                ..ItemProps::default()
            },
        ),
        template(EQUIPMENT, ItemProps::default()),
        template(BANDAGE, ItemProps::default()),
        template(
            BOX_2X2,
            ItemProps {
                width: 2,
                height: 2,
                grids: vec![GridTemplate::new("main", 2, 2)],
                ..ItemProps::default()
            },
        ),
        template(
            AMMO,
            ItemProps {
                stack_max_size: 60,
                ..ItemProps::default()
            },
        ),
        template(MAGAZINE, ItemProps::default()),
        template(
            RIFLE,
            ItemProps {
                width: 4,
                foldable: true,
                size_reduce_right: 1,
                examine_experience: 25,
                ..ItemProps::default()
            },
        ),
        template(
            STOCK,
            ItemProps {
                extra_size_left: 1,
                ..ItemProps::default()
            },
        ),
        template(
            ROUBLES,
            ItemProps {
                stack_max_size: 500_000,
                ..ItemProps::default()
            },
        ),
        template(
            DOLLARS,
            ItemProps {
                stack_max_size: 50_000,
                ..ItemProps::default()
            },
        ),
        template(
            EUROS,
            ItemProps {
                stack_max_size: 50_000,
                ..ItemProps::default()
            },
        ),
    ];
    for template in templates {
        catalog.insert(template).expect("fixture template");
    }
    catalog
}

fn prices() -> PriceTable {
    let mut prices = PriceTable::default();
    for (tpl, price) in [
        (ROUBLES, 1),
        (DOLLARS, 120),
        (EUROS, 130),
        (BANDAGE, 600),
        (AMMO, 50),
        (RIFLE, 20_000),
        (BOX_2X2, 5_000),
    ] {
        prices.insert(tpl, price);
    }
    prices
}

fn offer(id: &str, tpl: &str) -> InventoryItem {
    InventoryItem::new(ItemId::from(id), tpl).with_parent(&ItemId::from("hideout"), STASH_GRID)
}

fn prapor() -> Trader {
    let mut stock = offer("offer-stock", STOCK);
    stock.parent_id = Some(ItemId::from("offer-rifle"));
    stock.slot_id = Some("mod_stock".to_string());
    let items = vec![
        offer("offer-bandage", BANDAGE).with_stack(9_999_999),
        offer("offer-box", BOX_2X2),
        offer("offer-ammo", AMMO).with_stack(9_999_999),
        offer("offer-rifle", RIFLE),
        stock,
        offer("offer-bare-rifle", RIFLE),
    ];
    let mut barter_scheme = HashMap::new();
    for (id, price) in [
        ("offer-bandage", 600.0),
        ("offer-box", 5_000.0),
        ("offer-ammo", 50.0),
        ("offer-rifle", 20_000.0),
        ("offer-bare-rifle", 18_000.0),
    ] {
        barter_scheme.insert(
            id.to_string(),
            vec![vec![BarterLine {
                tpl: ROUBLES.to_string(),
                count: price,
            }]],
        );
    }
    Trader {
        base: TraderBase {
            id: "prapor".to_string(),
            nickname: "Prapor".to_string(),
            currency: "RUB".to_string(),
        },
        assort: Assort {
            items,
            barter_scheme,
        },
    }
}

pub fn catalog() -> Catalog {
    Catalog::new(items(), prices(), vec![prapor()])
}

/// A character whose inventory holds the stash, the equipment root and then
/// `extra` in order.
pub fn character_with(extra: Vec<InventoryItem>) -> Character {
    let stash = InventoryItem::new(ItemId::from("stash"), STASH);
    let equipment = InventoryItem::new(ItemId::from("equipment"), EQUIPMENT);
    let mut inventory = Inventory::new(stash, equipment);
    inventory.items.extend(extra);
    Character::new("pmc", inventory)
}

pub fn stash_item(id: &str, tpl: &str, x: u16, y: u16) -> InventoryItem {
    InventoryItem::new(ItemId::from(id), tpl)
        .with_parent(&ItemId::from("stash"), STASH_GRID)
        .with_location(ItemLocation::Grid(GridLocation::new(x, y, Rotation::Horizontal)))
}

pub fn money(id: &str, tpl: &str, count: u32, x: u16, y: u16) -> InventoryItem {
    stash_item(id, tpl, x, y).with_stack(count)
}

pub fn state_with(catalog: &Catalog, extra: Vec<InventoryItem>) -> CharacterState {
    CharacterState::load(character_with(extra), catalog.items()).expect("fixture state")
}
