use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        ItemId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

pub type TemplateId = String;

/// Slots whose children are addressed by insertion order instead of grid cells.
pub const COUNTING_SLOTS: [&str; 1] = ["cartridges"];

pub fn is_counting_slot(slot: &str) -> bool {
    COUNTING_SLOTS.contains(&slot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Horizontal,
    Vertical,
}

impl Rotation {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim() {
            "Horizontal" | "0" => Some(Rotation::Horizontal),
            "Vertical" | "1" => Some(Rotation::Vertical),
            _ => None,
        }
    }

    pub fn from_number(value: u64) -> Option<Self> {
        match value {
            0 => Some(Rotation::Horizontal),
            1 => Some(Rotation::Vertical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Horizontal => "Horizontal",
            Rotation::Vertical => "Vertical",
        }
    }

    pub fn is_vertical(self) -> bool {
        self == Rotation::Vertical
    }
}

impl Serialize for Rotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct RotationVisitor;

impl<'de> Visitor<'de> for RotationVisitor {
    type Value = Rotation;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"Horizontal\", \"Vertical\", \"0\", \"1\", 0 or 1")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Rotation, E> {
        Rotation::from_wire(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Rotation, E> {
        Rotation::from_number(value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Rotation, E> {
        u64::try_from(value)
            .ok()
            .and_then(Rotation::from_number)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Rotation, E> {
        if value == 0.0 {
            Ok(Rotation::Horizontal)
        } else if value == 1.0 {
            Ok(Rotation::Vertical)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RotationVisitor)
    }
}

struct CoordinateVisitor;

impl<'de> Visitor<'de> for CoordinateVisitor {
    type Value = u16;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a whole grid coordinate between 0 and 65535")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u16, E> {
        u16::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<u16, E> {
        u16::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<u16, E> {
        if value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value) {
            Ok(value as u16)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }
}

/// Clients write coordinates as integers or as integral floats.
fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    deserializer.deserialize_any(CoordinateVisitor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLocation {
    #[serde(deserialize_with = "coordinate")]
    pub x: u16,
    #[serde(deserialize_with = "coordinate")]
    pub y: u16,
    #[serde(default)]
    pub r: Rotation,
    #[serde(rename = "isSearched", default)]
    pub is_searched: bool,
}

impl GridLocation {
    pub fn new(x: u16, y: u16, r: Rotation) -> Self {
        Self {
            x,
            y,
            r,
            is_searched: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemLocation {
    Counter(u32),
    Grid(GridLocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Foldable {
    pub folded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Togglable {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repairable {
    pub max_durability: f64,
    pub durability: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_objects_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foldable: Option<Foldable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub togglable: Option<Togglable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repairable: Option<Repairable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(rename = "_tpl")]
    pub tpl: TemplateId,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    #[serde(rename = "slotId", default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ItemLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<ItemUpdate>,
}

impl InventoryItem {
    pub fn new(id: ItemId, tpl: impl Into<TemplateId>) -> Self {
        Self {
            id,
            tpl: tpl.into(),
            parent_id: None,
            slot_id: None,
            location: None,
            upd: None,
        }
    }

    pub fn with_parent(mut self, parent: &ItemId, slot: &str) -> Self {
        self.parent_id = Some(parent.clone());
        self.slot_id = Some(slot.to_string());
        self
    }

    pub fn with_location(mut self, location: ItemLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_stack(mut self, count: u32) -> Self {
        self.set_stack_count(count);
        self
    }

    /// Stack size, or 1 for items that carry no stack counter.
    pub fn stack_count(&self) -> u32 {
        self.upd
            .as_ref()
            .and_then(|upd| upd.stack_objects_count)
            .unwrap_or(1)
    }

    pub fn is_stack(&self) -> bool {
        self.upd
            .as_ref()
            .is_some_and(|upd| upd.stack_objects_count.is_some())
    }

    pub fn set_stack_count(&mut self, count: u32) {
        self.upd_mut().stack_objects_count = Some(count);
    }

    pub fn upd_mut(&mut self) -> &mut ItemUpdate {
        self.upd.get_or_insert_with(ItemUpdate::default)
    }

    pub fn grid_location(&self) -> Option<GridLocation> {
        match self.location {
            Some(ItemLocation::Grid(location)) => Some(location),
            _ => None,
        }
    }

    pub fn is_folded(&self) -> bool {
        self.upd
            .as_ref()
            .and_then(|upd| upd.foldable)
            .is_some_and(|foldable| foldable.folded)
    }

    pub fn is_child_of(&self, parent: &ItemId) -> bool {
        self.parent_id.as_ref() == Some(parent)
    }

    pub fn in_slot(&self, parent: &ItemId, slot: &str) -> bool {
        self.is_child_of(parent) && self.slot_id.as_deref() == Some(slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
}
