use crate::actions::{ActionContext, BuyOrder, SchemeItem, SellOrder};
use crate::catalog::handbook::is_currency;
use crate::catalog::traders::Trader;
use crate::entities::inventory::{ChildIndex, STASH_GRID};
use crate::entities::item::{GridLocation, InventoryItem, ItemId, ItemLocation, Rotation};
use crate::error::InventoryError;
use crate::inventory::cache::ContainerKey;
use crate::inventory::changes::ProfileChanges;
use crate::inventory::footprint::{self, Footprint};
use crate::inventory::placement::find_free_slot;
use crate::inventory::state::CharacterState;
use crate::telemetry::logging::TRADE_TARGET;
use std::collections::{HashMap, HashSet};

/// Paid value may fall short of the price by float noise from currency
/// conversion.
const PRICE_TOLERANCE: f64 = 1e-6;

/// Splits `total` into full stacks of `max` followed by the remainder,
/// yielding them one at a time.
pub fn decompose_stacks(total: u32, max: u32) -> impl Iterator<Item = u32> {
    let max = max.max(1);
    let remainder = total % max;
    std::iter::repeat(max)
        .take((total / max) as usize)
        .chain((remainder > 0).then_some(remainder))
}

fn stash_key(state: &CharacterState) -> ContainerKey {
    ContainerKey::new(&state.character().inventory.stash, STASH_GRID)
}

/// First free stash position for `size`, trying the horizontal layout before
/// the vertical one.
fn find_stash_location(
    state: &CharacterState,
    item: &ItemId,
    size: Footprint,
) -> Result<GridLocation, InventoryError> {
    let key = stash_key(state);
    let grid = state
        .cache()
        .grid(&key)
        .ok_or_else(|| InventoryError::InvalidAction(format!("stash {} has no grid", key.parent)))?;
    if let Some(placement) = find_free_slot(grid, size.height, size.width) {
        return Ok(GridLocation::new(placement.x, placement.y, Rotation::Horizontal));
    }
    if let Some(placement) = find_free_slot(grid, size.width, size.height) {
        return Ok(GridLocation::new(placement.x, placement.y, Rotation::Vertical));
    }
    Err(InventoryError::NoSpace(item.clone()))
}

/// Copies an offer graph under fresh ids, keeping the parent links inside the
/// graph and hanging the root into the stash.
fn instantiate_offer(
    ctx: ActionContext<'_>,
    state: &CharacterState,
    graph: &[InventoryItem],
) -> Vec<InventoryItem> {
    let remapped: HashMap<&ItemId, ItemId> = graph
        .iter()
        .map(|item| (&item.id, ctx.ids.next_id()))
        .collect();
    let stash = state.character().inventory.stash.clone();
    graph
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let mut copy = item.clone();
            copy.id = remapped[&item.id].clone();
            if position == 0 {
                copy.parent_id = Some(stash.clone());
                copy.slot_id = Some(STASH_GRID.to_string());
            } else if let Some(parent) = item.parent_id.as_ref().and_then(|parent| remapped.get(parent)) {
                copy.parent_id = Some(parent.clone());
            }
            copy
        })
        .collect()
}

pub fn buy_from_trader(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    order: &BuyOrder,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    if order.count == 0 {
        return Err(InventoryError::InvalidAction("cannot buy zero items".to_string()));
    }
    let trader = ctx.catalog.trader(&order.tid)?;
    let currency = ctx.catalog.trader_currency(trader)?;
    let graph = trader
        .assort
        .offer_graph(&order.item_id)
        .ok_or_else(|| InventoryError::ItemNotFound(order.item_id.clone()))?;
    let scheme = trader
        .assort
        .scheme(&order.item_id, order.scheme_id)
        .ok_or_else(|| {
            InventoryError::InvalidAction(format!(
                "offer {} has no payment scheme {}",
                order.item_id, order.scheme_id
            ))
        })?;
    let price: f64 = scheme
        .iter()
        .map(|line| {
            let units = (line.count * f64::from(order.count)).ceil().min(f64::from(u32::MAX));
            ctx.catalog.value_in(&line.tpl, units as u32, currency)
        })
        .sum();
    let max = ctx.catalog.template(&graph[0].tpl)?.stack_max();
    let size = footprint::measure(ctx.catalog.items(), &ChildIndex::build(&graph), &graph[0].id)?;

    let mut bought = HashSet::new();
    for stack in decompose_stacks(order.count, max) {
        let mut copies = instantiate_offer(ctx, state, &graph);
        let root_id = copies[0].id.clone();
        let location = find_stash_location(state, &root_id, size)?;
        let root = &mut copies[0];
        root.location = Some(ItemLocation::Grid(location));
        if max > 1 {
            root.set_stack_count(stack);
        } else if let Some(upd) = root.upd.as_mut() {
            upd.stack_objects_count = None;
        }
        let ids: Vec<ItemId> = copies.iter().map(|copy| copy.id.clone()).collect();
        for copy in copies {
            changes.new_item(&copy);
            state.push_item(copy, ctx.catalog.items())?;
        }
        for id in ids {
            state.place_footprint(&id, ctx.catalog.items())?;
            bought.insert(id);
        }
    }

    // Lines naming an item inside another paid item go with that item.
    let listed: HashSet<ItemId> = order.scheme_items.iter().map(|line| line.id.clone()).collect();
    let mut carried = HashMap::new();
    for line in &order.scheme_items {
        if state.has_ancestor_in(&line.id, &listed) {
            carried.insert(line.id.clone(), state.item(&line.id)?.tpl.clone());
        }
    }

    let mut sales = 0.0;
    for line in &order.scheme_items {
        let tpl = match carried.get(&line.id) {
            Some(tpl) => tpl.clone(),
            None => pay(ctx, state, line, &bought, changes)?,
        };
        sales += ctx.catalog.value_in(&tpl, line.count, currency);
    }
    if price - sales > PRICE_TOLERANCE {
        return Err(InventoryError::InsufficientFunds {
            currency: currency.to_string(),
            missing: (price - sales).ceil() as u32,
        });
    }
    record_sales(state, trader, sales, changes);
    log::info!(
        target: TRADE_TARGET,
        "{} bought {} x {} from {} for {} in trader currency",
        state.character().id,
        order.count,
        graph[0].tpl,
        trader.base.nickname,
        sales
    );
    Ok(())
}

/// Takes `line.count` units out of the named stack, spilling over to the
/// character's other stacks of the same template in list order. Returns the
/// template paid with.
fn pay(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    line: &SchemeItem,
    excluded: &HashSet<ItemId>,
    changes: &mut ProfileChanges,
) -> Result<String, InventoryError> {
    let named = state.item(&line.id)?;
    if state.character().inventory.is_root(&line.id) || excluded.contains(&line.id) {
        return Err(InventoryError::InvalidAction(format!(
            "{} cannot be used as payment",
            line.id
        )));
    }
    let tpl = named.tpl.clone();
    let inventory = &state.character().inventory;
    let mut candidates = vec![line.id.clone()];
    candidates.extend(
        state
            .items()
            .iter()
            .filter(|item| {
                item.tpl == tpl
                    && item.id != line.id
                    && !inventory.is_root(&item.id)
                    && !excluded.contains(&item.id)
            })
            .map(|item| item.id.clone()),
    );

    let mut remaining = line.count;
    for id in candidates {
        if remaining == 0 {
            break;
        }
        if !state.contains(&id) {
            continue;
        }
        let units = state.item(&id)?.stack_count();
        if units > remaining {
            let item = state.item_mut(&id)?;
            item.set_stack_count(units - remaining);
            changes.changed_item(item);
            remaining = 0;
        } else {
            let removed = state.remove_family(&id, ctx.catalog.items())?;
            changes.deleted_family(&removed);
            remaining -= units;
        }
    }
    if remaining > 0 {
        return Err(InventoryError::InsufficientFunds {
            currency: tpl,
            missing: remaining,
        });
    }
    log::debug!(
        target: TRADE_TARGET,
        "{} x {} taken as {}",
        line.count,
        tpl,
        if is_currency(&tpl) { "money" } else { "barter" }
    );
    Ok(tpl)
}

fn record_sales(state: &mut CharacterState, trader: &Trader, amount: f64, changes: &mut ProfileChanges) {
    let relation = state.character_mut().trader_relation_mut(trader.id());
    relation.sales_sum += amount;
    changes.trader_relation(trader.id(), relation);
}

fn sells_part_of_stack(item: &InventoryItem, count: u32) -> bool {
    item.is_stack() && count > 0 && count < item.stack_count()
}

pub fn sell_to_trader(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    order: &SellOrder,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let trader = ctx.catalog.trader(&order.tid)?;
    let currency = ctx.catalog.trader_currency(trader)?;
    let currency_template = ctx.catalog.template(currency)?;
    let max = currency_template.stack_max();

    let mut sold = HashSet::new();
    let mut whole = HashSet::new();
    for entry in &order.items {
        let item = state.item(&entry.id)?;
        if state.character().inventory.is_root(&entry.id) {
            return Err(InventoryError::InvalidAction(format!(
                "inventory root {} cannot be sold",
                entry.id
            )));
        }
        if !sells_part_of_stack(item, entry.count) {
            whole.insert(entry.id.clone());
        }
        sold.extend(state.family(&entry.id));
    }

    let mut remaining = order.price;
    let top_ups: Vec<ItemId> = state
        .items()
        .iter()
        .filter(|item| item.tpl == currency && !sold.contains(&item.id) && item.stack_count() < max)
        .map(|item| item.id.clone())
        .collect();
    for id in top_ups {
        if remaining == 0 {
            break;
        }
        let item = state.item_mut(&id)?;
        let added = (max - item.stack_count()).min(remaining);
        item.set_stack_count(item.stack_count() + added);
        changes.changed_item(item);
        remaining -= added;
    }

    let size = Footprint::new(
        currency_template.props.width.max(1),
        currency_template.props.height.max(1),
    );
    let stash = state.character().inventory.stash.clone();
    for amount in decompose_stacks(remaining, max) {
        let id = ctx.ids.next_id();
        let location = find_stash_location(state, &id, size)?;
        let proceeds = InventoryItem::new(id.clone(), currency)
            .with_parent(&stash, STASH_GRID)
            .with_location(ItemLocation::Grid(location))
            .with_stack(amount);
        changes.new_item(&proceeds);
        state.push_item(proceeds, ctx.catalog.items())?;
        state.place_footprint(&id, ctx.catalog.items())?;
    }

    for entry in &order.items {
        // Entries inside another sold item leave with it.
        if !state.contains(&entry.id) || state.has_ancestor_in(&entry.id, &whole) {
            continue;
        }
        let item = state.item(&entry.id)?;
        if whole.contains(&entry.id) || !sells_part_of_stack(item, entry.count) {
            let removed = state.remove_family(&entry.id, ctx.catalog.items())?;
            changes.deleted_family(&removed);
        } else {
            let item = state.item_mut(&entry.id)?;
            item.set_stack_count(item.stack_count() - entry.count);
            changes.changed_item(item);
        }
    }

    record_sales(state, trader, f64::from(order.price), changes);
    log::info!(
        target: TRADE_TARGET,
        "{} sold {} items to {} for {}",
        state.character().id,
        order.items.len(),
        trader.base.nickname,
        order.price
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{apply, Action};
    use crate::catalog::handbook::{DOLLARS, ROUBLES};
    use crate::catalog::Catalog;
    use crate::ids::ObjectIdGenerator;
    use crate::inventory::grid::Cell;
    use crate::testing;
    use serde_json::json;

    fn run(
        catalog: &Catalog,
        state: &mut CharacterState,
        payload: serde_json::Value,
    ) -> Result<ProfileChanges, InventoryError> {
        let ids = ObjectIdGenerator::with_seed(9);
        let ctx = ActionContext { catalog, ids: &ids };
        let action = Action::decode(payload).expect("decode");
        let mut changes = ProfileChanges::new("pmc");
        apply(ctx, state, &action, &mut changes)?;
        Ok(changes)
    }

    fn buy(offer: &str, count: u32, payment: &[(&str, u32)]) -> serde_json::Value {
        let scheme: Vec<_> = payment
            .iter()
            .map(|(id, count)| json!({"id": id, "count": count}))
            .collect();
        json!({"Action": "TradingConfirm", "type": "buy_from_trader", "tid": "prapor",
               "item_id": offer, "count": count, "scheme_id": 0, "scheme_items": scheme})
    }

    fn stash_grid(state: &CharacterState) -> &crate::inventory::grid::ContainerGrid {
        state.cache().grid(&stash_key(state)).expect("stash grid")
    }

    fn stacks(total: u32, max: u32) -> Vec<u32> {
        decompose_stacks(total, max).collect()
    }

    #[test]
    fn decomposition_fills_stacks_then_remainder() {
        assert_eq!(stacks(20000, 9999), vec![9999, 9999, 2]);
        assert_eq!(stacks(60, 60), vec![60]);
        assert_eq!(stacks(5, 1), vec![1; 5]);
        assert_eq!(stacks(7, 0), vec![1; 7]);
        assert!(stacks(0, 10).is_empty());
        let parts = stacks(123_457, 500);
        assert_eq!(parts.iter().sum::<u32>(), 123_457);
        assert!(parts.iter().all(|part| *part > 0 && *part <= 500));
        assert_eq!(decompose_stacks(u32::MAX, 1).take(3).count(), 3);
    }

    #[test]
    fn buying_two_boxes_places_both_in_empty_stash() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let changes = run(&catalog, &mut state, buy("offer-box", 2, &[("cash", 10_000)])).expect("buy");

        let roots: Vec<&InventoryItem> = changes
            .items
            .new
            .iter()
            .filter(|item| item.slot_id.as_deref() == Some(STASH_GRID))
            .collect();
        assert_eq!(roots.len(), 2);
        let first = roots[0].grid_location().expect("first");
        let second = roots[1].grid_location().expect("second");
        assert_eq!((first.x, first.y), (0, 0));
        assert_eq!((second.x, second.y), (2, 0));
        assert!(roots.iter().all(|item| !item.is_stack()));
        assert_eq!(stash_grid(&state).occupied_cells(), 9);
        assert_eq!(state.item(&ItemId::from("cash")).expect("cash").stack_count(), 90_000);
        assert_eq!(changes.trader_relations["prapor"].sales_sum, 10_000.0);
        for root in roots {
            assert!(state
                .cache()
                .has_grid(&ContainerKey::new(&root.id, "main")));
        }
    }

    #[test]
    fn stackable_purchase_is_split_into_stacks() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let changes = run(&catalog, &mut state, buy("offer-ammo", 130, &[("cash", 6_500)])).expect("buy");
        let counts: Vec<u32> = changes.items.new.iter().map(|item| item.stack_count()).collect();
        assert_eq!(counts, vec![60, 60, 10]);
    }

    #[test]
    fn offer_children_get_remapped_parents() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let changes = run(&catalog, &mut state, buy("offer-rifle", 1, &[("cash", 20_000)])).expect("buy");
        assert_eq!(changes.items.new.len(), 2);
        let root = &changes.items.new[0];
        let part = &changes.items.new[1];
        assert_ne!(root.id, ItemId::from("offer-rifle"));
        assert_eq!(part.parent_id.as_ref(), Some(&root.id));
        assert_eq!(part.slot_id.as_deref(), Some("mod_stock"));
        // rifle 4x1 plus a stock with one extra column on the left
        assert_eq!(state.cache().entry(&root.id).expect("entry").width, 5);
    }

    #[test]
    fn full_stash_rolls_back_whole_purchase() {
        let catalog = testing::catalog();
        let mut items = vec![testing::money("cash", ROUBLES, 100_000, 9, 9)];
        for y in 0..10u16 {
            for x in 0..10u16 {
                if (x, y) != (9, 9) && !(x >= 2 && y == 0) {
                    items.push(testing::stash_item(&format!("filler-{x}-{y}"), testing::BANDAGE, x, y));
                }
            }
        }
        let mut state = testing::state_with(&catalog, items);
        let before = state.items().to_vec();
        let occupied = stash_grid(&state).occupied_cells();

        let err = run(&catalog, &mut state, buy("offer-box", 1, &[("cash", 5_000)])).expect_err("no room");
        assert!(matches!(err, InventoryError::NoSpace(_)));
        assert_eq!(state.items(), before.as_slice());
        assert_eq!(stash_grid(&state).occupied_cells(), occupied);
        assert!(state.character().traders_info.is_empty());
    }

    #[test]
    fn long_item_falls_back_to_vertical() {
        let catalog = testing::catalog();
        let mut items = vec![testing::money("cash", ROUBLES, 100_000, 9, 9)];
        for y in 0..10u16 {
            for x in 0..10u16 {
                if !(x == 4 && y < 4) && (x, y) != (9, 9) {
                    items.push(testing::stash_item(&format!("f{x}-{y}"), testing::BANDAGE, x, y));
                }
            }
        }
        let mut state = testing::state_with(&catalog, items);
        let changes = run(&catalog, &mut state, buy("offer-bare-rifle", 1, &[("cash", 18_000)])).expect("buy");
        let location = changes.items.new[0].grid_location().expect("location");
        assert_eq!((location.x, location.y, location.r), (4, 0, Rotation::Vertical));
        assert_eq!(stash_grid(&state).owner(Cell::new(4, 3)), Some(&changes.items.new[0].id));
    }

    #[test]
    fn insufficient_funds_rolls_back() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 1_000, 9, 9)]);
        let before = state.items().to_vec();
        let err = run(&catalog, &mut state, buy("offer-box", 1, &[("cash", 5_000)])).expect_err("poor");
        assert_eq!(
            err,
            InventoryError::InsufficientFunds {
                currency: ROUBLES.to_string(),
                missing: 4_000
            }
        );
        assert_eq!(state.items(), before.as_slice());
        assert_eq!(stash_grid(&state).occupied_cells(), 1);
    }

    #[test]
    fn paying_less_than_the_offer_price_rolls_back() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let before = state.items().to_vec();
        let err = run(&catalog, &mut state, buy("offer-rifle", 1, &[("cash", 1)])).expect_err("underpaid");
        assert_eq!(
            err,
            InventoryError::InsufficientFunds {
                currency: ROUBLES.to_string(),
                missing: 19_999
            }
        );
        assert_eq!(state.items(), before.as_slice());
        assert!(state.character().traders_info.is_empty());

        let err = run(&catalog, &mut state, buy("offer-box", 3, &[("cash", 10_000)])).expect_err("short by one box");
        assert!(matches!(err, InventoryError::InsufficientFunds { missing: 5_000, .. }));
    }

    #[test]
    fn unknown_payment_scheme_is_rejected() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let mut payload = buy("offer-box", 1, &[("cash", 5_000)]);
        payload["scheme_id"] = json!(4);
        let err = run(&catalog, &mut state, payload).expect_err("no such scheme");
        assert!(matches!(err, InventoryError::InvalidAction(_)));
        assert_eq!(state.item(&ItemId::from("cash")).expect("cash").stack_count(), 100_000);
    }

    #[test]
    fn huge_order_of_single_items_runs_out_of_room() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("cash", ROUBLES, 100_000, 9, 9)]);
        let err = run(&catalog, &mut state, buy("offer-box", u32::MAX, &[("cash", 100_000)]))
            .expect_err("stash fills up");
        assert!(matches!(err, InventoryError::NoSpace(_)));
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn paying_with_a_container_takes_its_contents_along() {
        let catalog = testing::catalog();
        let inner = InventoryItem::new(ItemId::from("inner"), testing::BANDAGE)
            .with_parent(&ItemId::from("box"), "main")
            .with_location(ItemLocation::Grid(GridLocation::new(0, 0, Rotation::Horizontal)));
        let mut state = testing::state_with(
            &catalog,
            vec![testing::stash_item("box", testing::BOX_2X2, 8, 8), inner],
        );
        let changes = run(&catalog, &mut state, buy("offer-bandage", 1, &[("inner", 1), ("box", 1)]))
            .expect("barter");
        assert_eq!(changes.items.del, vec![crate::entities::item::DeletedItem { id: ItemId::from("box") }]);
        assert!(changes.items.change.is_empty());
        assert!(!state.contains(&ItemId::from("inner")));
        assert_eq!(changes.trader_relations["prapor"].sales_sum, 5_600.0);
    }

    #[test]
    fn payment_spills_over_to_other_stacks() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(
            &catalog,
            vec![
                testing::money("cash1", ROUBLES, 500, 8, 9),
                testing::money("cash2", ROUBLES, 1_000, 9, 9),
            ],
        );
        let changes = run(&catalog, &mut state, buy("offer-bandage", 1, &[("cash1", 1_200)])).expect("buy");
        assert!(state.item(&ItemId::from("cash1")).is_err());
        assert_eq!(state.item(&ItemId::from("cash2")).expect("cash2").stack_count(), 300);
        assert_eq!(changes.items.del.len(), 1);
        assert_eq!(changes.items.change.len(), 1);
    }

    #[test]
    fn barter_payment_counts_handbook_value() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::stash_item("med", testing::BANDAGE, 9, 9)]);
        let changes = run(&catalog, &mut state, buy("offer-ammo", 1, &[("med", 1)])).expect("barter");
        assert!(state.item(&ItemId::from("med")).is_err());
        assert_eq!(changes.trader_relations["prapor"].sales_sum, 600.0);
    }

    #[test]
    fn foreign_currency_payment_converts_to_trader_currency() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::money("usd", DOLLARS, 100, 9, 9)]);
        let changes = run(&catalog, &mut state, buy("offer-bandage", 1, &[("usd", 5)])).expect("buy");
        assert_eq!(changes.trader_relations["prapor"].sales_sum, 600.0);
        assert_eq!(state.item(&ItemId::from("usd")).expect("usd").stack_count(), 95);
    }

    #[test]
    fn sell_tops_up_existing_stack_then_mints_new_one() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(
            &catalog,
            vec![
                testing::money("cash", ROUBLES, 499_000, 9, 9),
                testing::stash_item("med", testing::BANDAGE, 0, 0),
            ],
        );
        let changes = run(
            &catalog,
            &mut state,
            json!({"Action": "TradingConfirm", "type": "sell_to_trader", "tid": "prapor",
                   "items": [{"id": "med", "count": 1, "scheme_id": 0}], "price": 3_000}),
        )
        .expect("sell");
        assert_eq!(state.item(&ItemId::from("cash")).expect("cash").stack_count(), 500_000);
        assert_eq!(changes.items.new.len(), 1);
        assert_eq!(changes.items.new[0].stack_count(), 2_000);
        assert_eq!(changes.items.new[0].tpl, ROUBLES);
        assert_eq!(changes.items.del[0].id, ItemId::from("med"));
        assert_eq!(state.character().traders_info["prapor"].sales_sum, 3_000.0);
        // proceeds are placed before the sold bandage leaves (0, 0)
        let location = changes.items.new[0].grid_location().expect("location");
        assert_eq!((location.x, location.y), (1, 0));
    }

    #[test]
    fn selling_part_of_a_stack_decrements_it() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(
            &catalog,
            vec![
                testing::money("cash", ROUBLES, 10, 9, 9),
                testing::money("ammo", testing::AMMO, 50, 0, 0),
            ],
        );
        let changes = run(
            &catalog,
            &mut state,
            json!({"Action": "TradingConfirm", "type": "sell_to_trader", "tid": "prapor",
                   "items": [{"id": "ammo", "count": 20, "scheme_id": 0}], "price": 400}),
        )
        .expect("sell");
        assert_eq!(state.item(&ItemId::from("ammo")).expect("ammo").stack_count(), 30);
        assert_eq!(state.item(&ItemId::from("cash")).expect("cash").stack_count(), 410);
        assert!(changes.items.del.is_empty());
    }

    fn box_holding_ammo() -> Vec<InventoryItem> {
        let ammo = InventoryItem::new(ItemId::from("inner"), testing::AMMO)
            .with_parent(&ItemId::from("box"), "main")
            .with_location(ItemLocation::Grid(GridLocation::new(0, 0, Rotation::Horizontal)))
            .with_stack(50);
        vec![testing::stash_item("box", testing::BOX_2X2, 0, 0), ammo]
    }

    fn sell(items: serde_json::Value, price: u32) -> serde_json::Value {
        json!({"Action": "TradingConfirm", "type": "sell_to_trader", "tid": "prapor",
               "items": items, "price": price})
    }

    #[test]
    fn selling_a_container_and_its_contents_deletes_the_container_once() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, box_holding_ammo());
        let changes = run(
            &catalog,
            &mut state,
            sell(json!([{"id": "inner", "count": 50}, {"id": "box", "count": 1}]), 7_500),
        )
        .expect("sell");
        assert_eq!(changes.items.del, vec![crate::entities::item::DeletedItem { id: ItemId::from("box") }]);
        assert!(changes.items.change.is_empty());
        assert_eq!(changes.items.new.len(), 1);
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn partial_stack_inside_a_sold_container_goes_with_it() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, box_holding_ammo());
        let changes = run(
            &catalog,
            &mut state,
            sell(json!([{"id": "inner", "count": 20}, {"id": "box", "count": 1}]), 6_000),
        )
        .expect("sell");
        assert_eq!(changes.items.del.len(), 1);
        assert!(changes.items.change.iter().all(|item| item.id != ItemId::from("inner")));
        assert!(!state.contains(&ItemId::from("inner")));
        assert!(CharacterState::load(state.character().clone(), catalog.items()).is_ok());
    }

    #[test]
    fn sold_currency_is_not_credited() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(
            &catalog,
            vec![testing::money("cash", ROUBLES, 100, 0, 0)],
        );
        let changes = run(
            &catalog,
            &mut state,
            json!({"Action": "TradingConfirm", "type": "sell_to_trader", "tid": "prapor",
                   "items": [{"id": "cash", "count": 100, "scheme_id": 0}], "price": 100}),
        )
        .expect("sell");
        assert!(state.item(&ItemId::from("cash")).is_err());
        assert_eq!(changes.items.new.len(), 1);
        assert_eq!(changes.items.new[0].stack_count(), 100);
    }

    #[test]
    fn unknown_trader_is_reported() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![]);
        let err = run(
            &catalog,
            &mut state,
            json!({"Action": "TradingConfirm", "type": "sell_to_trader", "tid": "fence",
                   "items": [], "price": 1}),
        )
        .expect_err("unknown trader");
        assert_eq!(err, InventoryError::TraderNotFound("fence".to_string()));
    }
}
