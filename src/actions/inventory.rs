use crate::actions::{
    ActionContext, ApplyInventoryChangesAction, BindAction, ExamineAction, FoldAction,
    MergeAction, MoveAction, MoveTo, ReadEncyclopediaAction, RemoveAction, SplitAction,
    SwapAction, TagAction, ToggleAction, TransferAction,
};
use crate::entities::item::{is_counting_slot, Foldable, ItemId, ItemLocation, Tag, Togglable};
use crate::error::InventoryError;
use crate::inventory::changes::ProfileChanges;
use crate::inventory::state::CharacterState;

fn ensure_movable(state: &CharacterState, id: &ItemId) -> Result<(), InventoryError> {
    state.item(id)?;
    if state.character().inventory.is_root(id) {
        return Err(InventoryError::InvalidAction(format!(
            "inventory root {} cannot be moved",
            id
        )));
    }
    Ok(())
}

/// Rewrites parent, slot and location of `id`. Footprints are the caller's
/// business.
fn relocate(
    state: &mut CharacterState,
    id: &ItemId,
    parent: &ItemId,
    slot: &str,
    location: Option<ItemLocation>,
) -> Result<(), InventoryError> {
    if !state.contains(parent) {
        return Err(InventoryError::ItemNotFound(parent.clone()));
    }
    if parent == id || state.is_descendant(id, parent) {
        return Err(InventoryError::InvalidAction(format!(
            "cannot place {} inside itself",
            id
        )));
    }
    let location = if is_counting_slot(slot) {
        let siblings = state
            .items()
            .iter()
            .filter(|item| item.id != *id && item.in_slot(parent, slot))
            .count();
        Some(ItemLocation::Counter(siblings as u32))
    } else {
        location
    };
    let item = state.item_mut(id)?;
    item.parent_id = Some(parent.clone());
    item.slot_id = Some(slot.to_string());
    item.location = location;
    Ok(())
}

fn relocate_to(state: &mut CharacterState, id: &ItemId, to: &MoveTo) -> Result<(), InventoryError> {
    relocate(
        state,
        id,
        &to.id,
        &to.container,
        to.location.map(ItemLocation::Grid),
    )
}

/// Refits the grid items `id` left and joined, so attached parts count
/// toward the footprint of whatever now carries them.
fn refit_around(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    old_parent: Option<ItemId>,
    id: &ItemId,
) -> Result<(), InventoryError> {
    if let Some(old_parent) = old_parent {
        state.refit(&old_parent, ctx.catalog.items())?;
    }
    if let Some(new_parent) = state.item(id)?.parent_id.clone() {
        state.refit(&new_parent, ctx.catalog.items())?;
    }
    Ok(())
}

pub fn move_item(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &MoveAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    ensure_movable(state, &action.item)?;
    let old_parent = state.item(&action.item)?.parent_id.clone();
    state.clear_footprint(&action.item);
    relocate_to(state, &action.item, &action.to)?;
    state.place_footprint(&action.item, ctx.catalog.items())?;
    refit_around(ctx, state, old_parent, &action.item)?;
    changes.changed_item(state.item(&action.item)?);
    Ok(())
}

pub fn swap(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &SwapAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    if action.item == action.item2 {
        return Err(InventoryError::InvalidAction(format!(
            "cannot swap {} with itself",
            action.item
        )));
    }
    ensure_movable(state, &action.item)?;
    ensure_movable(state, &action.item2)?;
    let old_parent = state.item(&action.item)?.parent_id.clone();
    let old_parent2 = state.item(&action.item2)?.parent_id.clone();
    state.clear_footprint(&action.item);
    state.clear_footprint(&action.item2);
    relocate_to(state, &action.item, &action.to)?;
    relocate_to(state, &action.item2, &action.to2)?;
    state.place_footprint(&action.item, ctx.catalog.items())?;
    state.place_footprint(&action.item2, ctx.catalog.items())?;
    refit_around(ctx, state, old_parent, &action.item)?;
    refit_around(ctx, state, old_parent2, &action.item2)?;
    changes.changed_item(state.item(&action.item)?);
    changes.changed_item(state.item(&action.item2)?);
    Ok(())
}

pub fn split(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &SplitAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let source = state.item(&action.split_item)?.clone();
    let stack = source.stack_count();
    if action.count == 0 || action.count >= stack {
        return Err(InventoryError::InvalidAction(format!(
            "cannot split {} off a stack of {}",
            action.count, stack
        )));
    }
    let new_id = match &action.new_item {
        Some(id) if state.contains(id) => {
            return Err(InventoryError::InvalidAction(format!(
                "item id {} already in use",
                id
            )))
        }
        Some(id) => id.clone(),
        None => ctx.ids.next_id(),
    };

    let remaining = stack - action.count;
    state.item_mut(&action.split_item)?.set_stack_count(remaining);

    let mut clone = source;
    clone.id = new_id.clone();
    clone.location = None;
    clone.set_stack_count(action.count);
    state.push_item(clone, ctx.catalog.items())?;
    relocate_to(state, &new_id, &action.container)?;
    state.place_footprint(&new_id, ctx.catalog.items())?;
    refit_around(ctx, state, None, &new_id)?;

    changes.new_item(state.item(&new_id)?);
    changes.changed_item(state.item(&action.split_item)?);
    Ok(())
}

fn ensure_same_stackable(
    ctx: ActionContext<'_>,
    state: &CharacterState,
    source: &ItemId,
    target: &ItemId,
) -> Result<u32, InventoryError> {
    if source == target {
        return Err(InventoryError::InvalidAction(format!(
            "cannot combine {} with itself",
            source
        )));
    }
    let source_item = state.item(source)?;
    let target_item = state.item(target)?;
    if source_item.tpl != target_item.tpl {
        return Err(InventoryError::InvalidAction(format!(
            "{} and {} have different templates",
            source, target
        )));
    }
    let max = ctx.catalog.template(&target_item.tpl)?.stack_max();
    if max <= 1 {
        return Err(InventoryError::InvalidAction(format!(
            "{} does not stack",
            target_item.tpl
        )));
    }
    Ok(max)
}

pub fn merge(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &MergeAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let max = ensure_same_stackable(ctx, state, &action.item, &action.with)?;
    let total = state.item(&action.item)?.stack_count() + state.item(&action.with)?.stack_count();
    if total > max {
        return Err(InventoryError::InvalidAction(format!(
            "merged stack of {} exceeds {}",
            total, max
        )));
    }
    state.item_mut(&action.with)?.set_stack_count(total);
    let removed = state.remove_family(&action.item, ctx.catalog.items())?;
    changes.deleted_family(&removed);
    changes.changed_item(state.item(&action.with)?);
    Ok(())
}

pub fn transfer(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &TransferAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let max = ensure_same_stackable(ctx, state, &action.item, &action.with)?;
    let available = state.item(&action.item)?.stack_count();
    if action.count == 0 || action.count > available {
        return Err(InventoryError::InvalidAction(format!(
            "cannot transfer {} out of a stack of {}",
            action.count, available
        )));
    }
    if action.count == available {
        let merge_action = MergeAction {
            item: action.item.clone(),
            with: action.with.clone(),
        };
        return merge(ctx, state, &merge_action, changes);
    }
    let total = state.item(&action.with)?.stack_count() + action.count;
    if total > max {
        return Err(InventoryError::InvalidAction(format!(
            "transferred stack of {} exceeds {}",
            total, max
        )));
    }
    state
        .item_mut(&action.item)?
        .set_stack_count(available - action.count);
    state.item_mut(&action.with)?.set_stack_count(total);
    changes.changed_item(state.item(&action.item)?);
    changes.changed_item(state.item(&action.with)?);
    Ok(())
}

pub fn remove(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &RemoveAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let removed = state.remove_family(&action.item, ctx.catalog.items())?;
    log::debug!("removed {} items under {}", removed.len(), action.item);
    changes.deleted_family(&removed);
    Ok(())
}

pub fn fold(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &FoldAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let tpl = state.item(&action.item)?.tpl.clone();
    if !ctx.catalog.template(&tpl)?.props.foldable {
        return Err(InventoryError::InvalidAction(format!(
            "{} cannot be folded",
            tpl
        )));
    }
    state.clear_footprint(&action.item);
    state.item_mut(&action.item)?.upd_mut().foldable = Some(Foldable {
        folded: action.value,
    });
    state.place_footprint(&action.item, ctx.catalog.items())?;
    changes.changed_item(state.item(&action.item)?);
    Ok(())
}

pub fn tag(
    state: &mut CharacterState,
    action: &TagAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let item = state.item_mut(&action.item)?;
    item.upd_mut().tag = Some(Tag {
        name: action.tag_name.clone(),
        color: action.tag_color.clone(),
    });
    changes.changed_item(item);
    Ok(())
}

pub fn toggle(
    state: &mut CharacterState,
    action: &ToggleAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let item = state.item_mut(&action.item)?;
    item.upd_mut().togglable = Some(Togglable { on: action.value });
    changes.changed_item(item);
    Ok(())
}

pub fn bind(state: &mut CharacterState, action: &BindAction) -> Result<(), InventoryError> {
    state.item(&action.item)?;
    state
        .character_mut()
        .inventory
        .toggle_binding(&action.index, &action.item);
    Ok(())
}

pub fn examine(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &ExamineAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let tpl = match &action.from_owner {
        None => state.item(&ItemId::new(action.item.as_str()))?.tpl.clone(),
        Some(owner) => match owner.kind.as_str() {
            "Trader" => ctx
                .catalog
                .trader(&owner.id)?
                .assort
                .offer_template(&ItemId::new(action.item.as_str()))
                .map(str::to_string)
                .ok_or_else(|| InventoryError::ItemNotFound(ItemId::new(action.item.as_str())))?,
            "HideoutUpgrade" | "HideoutProduction" | "ScavCase" => action.item.clone(),
            other => {
                return Err(InventoryError::InvalidAction(format!(
                    "examining items of {} is not supported",
                    other
                )))
            }
        },
    };
    let experience = ctx.catalog.template(&tpl)?.props.examine_experience;
    let character = state.character_mut();
    character.encyclopedia.insert(tpl.clone(), true);
    character.info.experience += experience;
    changes.encyclopedia.insert(tpl, true);
    changes.experience = Some(character.info.experience);
    Ok(())
}

pub fn read_encyclopedia(
    state: &mut CharacterState,
    action: &ReadEncyclopediaAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    let character = state.character_mut();
    for id in &action.ids {
        character.encyclopedia.insert(id.clone(), true);
        changes.encyclopedia.insert(id.clone(), true);
    }
    Ok(())
}

/// Client-side auto sort: every listed item is relocated first, then all
/// footprints are laid out again so intermediate overlaps do not matter.
pub fn apply_inventory_changes(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &ApplyInventoryChangesAction,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    for changed in &action.changed_items {
        ensure_movable(state, &changed.id)?;
        relocate(
            state,
            &changed.id,
            &changed.parent_id,
            &changed.slot_id,
            changed.location,
        )?;
    }
    state.relayout(ctx.catalog.items())?;
    for changed in &action.changed_items {
        changes.changed_item(state.item(&changed.id)?);
    }
    Ok(())
}
