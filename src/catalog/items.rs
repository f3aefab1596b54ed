use crate::entities::item::TemplateId;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GridProps {
    #[serde(rename = "cellsH", default)]
    pub cells_h: u16,
    #[serde(rename = "cellsV", default)]
    pub cells_v: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridTemplate {
    #[serde(rename = "_name")]
    pub name: String,
    #[serde(rename = "_props", default)]
    pub props: GridProps,
}

impl GridTemplate {
    pub fn new(name: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            name: name.into(),
            props: GridProps {
                cells_h: width,
                cells_v: height,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemProps {
    pub width: u16,
    pub height: u16,
    pub stack_max_size: u32,
    pub extra_size_left: u16,
    pub extra_size_right: u16,
    pub extra_size_up: u16,
    pub extra_size_down: u16,
    pub extra_size_force_add: bool,
    pub foldable: bool,
    pub size_reduce_right: u16,
    pub grids: Vec<GridTemplate>,
    pub examine_experience: i64,
}

impl Default for ItemProps {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            stack_max_size: 1,
            extra_size_left: 0,
            extra_size_right: 0,
            extra_size_up: 0,
            extra_size_down: 0,
            extra_size_force_add: false,
            foldable: false,
            size_reduce_right: 0,
            grids: Vec::new(),
            examine_experience: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemTemplate {
    #[serde(rename = "_id")]
    pub id: TemplateId,
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_parent", default)]
    pub parent: String,
    #[serde(rename = "_type", default)]
    pub kind: String,
    #[serde(rename = "_props", default)]
    pub props: ItemProps,
}

impl ItemTemplate {
    pub fn new(id: impl Into<TemplateId>, name: impl Into<String>, props: ItemProps) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: String::new(),
            kind: "Item".to_string(),
            props,
        }
    }

    /// Largest stack the template allows; never below one.
    pub fn stack_max(&self) -> u32 {
        self.props.stack_max_size.max(1)
    }

    pub fn grid(&self, name: &str) -> Option<&GridTemplate> {
        self.props.grids.iter().find(|grid| grid.name == name)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ItemCatalog {
    templates: HashMap<TemplateId, ItemTemplate>,
}

impl ItemCatalog {
    pub fn from_map(templates: HashMap<TemplateId, ItemTemplate>) -> Self {
        Self { templates }
    }

    pub fn get(&self, id: &str) -> Option<&ItemTemplate> {
        self.templates.get(id)
    }

    pub fn insert(&mut self, template: ItemTemplate) -> Result<(), String> {
        if self.templates.contains_key(&template.id) {
            return Err(format!("item template {} already exists", template.id));
        }
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
