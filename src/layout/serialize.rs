//! Layout records for the saved document
//!
//! Items and anchors are written as arrays and refer to each other by index
//! into those arrays; `-1` means "none".

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::model::{Orientation, Rect, RegionId, Size};

use super::{Anchor, AnchorGroup, AnchorId, AnchorType, Item, ItemContent, ItemId, SplitterLayout};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitterLayoutRecord {
    pub size: Size,
    pub min_size: Size,
    pub items: Vec<ItemRecord>,
    pub anchors: Vec<AnchorRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemRecord {
    pub is_placeholder: bool,
    pub geometry: Rect,
    pub min_size: Size,
    pub size_hint: Size,
    /// Region shown by the item; empty for placeholders
    pub region_id: String,
    pub left_index: i32,
    pub top_index: i32,
    pub right_index: i32,
    pub bottom_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnchorRecord {
    #[serde(rename = "type")]
    pub anchor_type: i32,
    pub orientation: Orientation,
    pub position: i32,
    pub position_percentage: f64,
    pub side1_items: Vec<i32>,
    pub side2_items: Vec<i32>,
    pub index_from: i32,
    pub index_to: i32,
    pub index_followee: i32,
}

impl Default for AnchorRecord {
    fn default() -> Self {
        Self {
            anchor_type: 0,
            orientation: Orientation::Vertical,
            position: 0,
            position_percentage: 0.0,
            side1_items: Vec::new(),
            side2_items: Vec::new(),
            index_from: -1,
            index_to: -1,
            index_followee: -1,
        }
    }
}

fn to_index<K: Ord>(map: &BTreeMap<K, i32>, key: Option<K>) -> i32 {
    key.and_then(|k| map.get(&k).copied()).unwrap_or(-1)
}

fn lookup<T: Copy>(table: &[T], index: i32, what: &str) -> Result<T> {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i).copied())
        .with_context(|| format!("{} index {} out of range", what, index))
}

fn lookup_optional<T: Copy>(table: &[T], index: i32, what: &str) -> Result<Option<T>> {
    if index < 0 {
        return Ok(None);
    }
    lookup(table, index, what).map(Some)
}

impl SplitterLayoutRecord {
    /// Check every cross reference without building anything
    pub fn validate(&self) -> Result<()> {
        if self.anchors.len() < 4 {
            bail!("layout has {} anchors, at least 4 needed", self.anchors.len());
        }

        let mut statics = BTreeMap::new();
        for (index, saved) in self.anchors.iter().enumerate() {
            let anchor_type = AnchorType::from_code(saved.anchor_type)
                .with_context(|| format!("anchor {} has unknown type {}", index, saved.anchor_type))?;
            if let Some(orientation) = anchor_type.orientation() {
                if orientation != saved.orientation {
                    bail!("static anchor {} has the wrong orientation", index);
                }
                if statics.insert(anchor_type, index).is_some() {
                    bail!("duplicate static anchor of type {}", saved.anchor_type);
                }
            }
        }
        for ty in [
            AnchorType::LeftStatic,
            AnchorType::TopStatic,
            AnchorType::RightStatic,
            AnchorType::BottomStatic,
        ] {
            if !statics.contains_key(&ty) {
                bail!("layout has no {:?} anchor", ty);
            }
        }

        let anchor_count = self.anchors.len();
        let item_count = self.items.len();
        for (index, saved) in self.items.iter().enumerate() {
            for (what, value) in [
                ("left", saved.left_index),
                ("top", saved.top_index),
                ("right", saved.right_index),
                ("bottom", saved.bottom_index),
            ] {
                check_index(value, anchor_count, false)
                    .with_context(|| format!("item {} {} anchor", index, what))?;
            }
        }
        for (index, saved) in self.anchors.iter().enumerate() {
            for item in saved.side1_items.iter().chain(&saved.side2_items) {
                check_index(*item, item_count, false).with_context(|| format!("anchor {} item", index))?;
            }
            for (what, value) in [
                ("from", saved.index_from),
                ("to", saved.index_to),
                ("followee", saved.index_followee),
            ] {
                check_index(value, anchor_count, true).with_context(|| format!("anchor {} {}", index, what))?;
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Invalid layout record: {:#}", e);
                false
            }
        }
    }
}

fn check_index(index: i32, len: usize, optional: bool) -> Result<()> {
    if optional && index == -1 {
        return Ok(());
    }
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(()),
        _ => bail!("index {} out of range", index),
    }
}

impl SplitterLayout {
    pub fn serialize(&self) -> SplitterLayoutRecord {
        let item_index: BTreeMap<ItemId, i32> = self
            .items
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, i as i32))
            .collect();
        let anchor_index: BTreeMap<AnchorId, i32> = self
            .anchors
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, i as i32))
            .collect();

        let items = self
            .items
            .values()
            .map(|item| ItemRecord {
                is_placeholder: item.is_placeholder(),
                geometry: self.item_geometry(item.id).unwrap_or_default(),
                min_size: item.min_size,
                size_hint: item.size_hint,
                region_id: item.region().map(|r| r.to_string()).unwrap_or_default(),
                left_index: to_index(&anchor_index, Some(item.group.left)),
                top_index: to_index(&anchor_index, Some(item.group.top)),
                right_index: to_index(&anchor_index, Some(item.group.right)),
                bottom_index: to_index(&anchor_index, Some(item.group.bottom)),
            })
            .collect();

        let anchors = self
            .anchors
            .values()
            .map(|anchor| AnchorRecord {
                anchor_type: anchor.anchor_type.code(),
                orientation: anchor.orientation,
                position: anchor.position,
                position_percentage: anchor.position_percentage,
                side1_items: anchor
                    .side1
                    .iter()
                    .map(|i| to_index(&item_index, Some(*i)))
                    .collect(),
                side2_items: anchor
                    .side2
                    .iter()
                    .map(|i| to_index(&item_index, Some(*i)))
                    .collect(),
                index_from: to_index(&anchor_index, anchor.from),
                index_to: to_index(&anchor_index, anchor.to),
                index_followee: to_index(&anchor_index, anchor.followee),
            })
            .collect();

        SplitterLayoutRecord {
            size: self.size,
            min_size: self.min_size,
            items,
            anchors,
        }
    }

    /// Rebuild a layout from a record
    ///
    /// `resolve` maps a saved region id to the live region and its current
    /// minimum size. Items whose region can't be resolved come back as
    /// placeholders.
    pub fn deserialize<F>(record: &SplitterLayoutRecord, config: LayoutConfig, mut resolve: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<(RegionId, Size)>,
    {
        record.validate()?;

        let mut layout = SplitterLayout::new(record.size, config);
        layout.anchors.clear();
        layout.next_anchor_id = 0;

        let anchor_ids: Vec<AnchorId> = (0..record.anchors.len())
            .map(|i| AnchorId(i as u64))
            .collect();
        let item_ids: Vec<ItemId> = (0..record.items.len()).map(|i| ItemId(i as u64)).collect();
        layout.next_anchor_id = anchor_ids.len() as u64;
        layout.next_item_id = item_ids.len() as u64;

        // First pass: the anchors themselves
        let mut statics: BTreeMap<AnchorType, AnchorId> = BTreeMap::new();
        for (index, saved) in record.anchors.iter().enumerate() {
            let anchor_type = AnchorType::from_code(saved.anchor_type)
                .with_context(|| format!("anchor {} has unknown type {}", index, saved.anchor_type))?;
            if let Some(orientation) = anchor_type.orientation() {
                if orientation != saved.orientation {
                    bail!("static anchor {} has the wrong orientation", index);
                }
                if statics.insert(anchor_type, anchor_ids[index]).is_some() {
                    bail!("duplicate static anchor of type {}", saved.anchor_type);
                }
            }
            let mut anchor = Anchor::new(anchor_ids[index], saved.orientation, anchor_type);
            anchor.position = saved.position;
            anchor.position_percentage = saved.position_percentage;
            layout.anchors.insert(anchor.id, anchor);
        }

        let static_of = |ty: AnchorType| {
            statics
                .get(&ty)
                .copied()
                .with_context(|| format!("layout has no {:?} anchor", ty))
        };
        layout.static_group = AnchorGroup {
            left: static_of(AnchorType::LeftStatic)?,
            top: static_of(AnchorType::TopStatic)?,
            right: static_of(AnchorType::RightStatic)?,
            bottom: static_of(AnchorType::BottomStatic)?,
        };

        // Second pass: items, then the cross references
        for (index, saved) in record.items.iter().enumerate() {
            let group = AnchorGroup {
                left: lookup(&anchor_ids, saved.left_index, "item left anchor")?,
                top: lookup(&anchor_ids, saved.top_index, "item top anchor")?,
                right: lookup(&anchor_ids, saved.right_index, "item right anchor")?,
                bottom: lookup(&anchor_ids, saved.bottom_index, "item bottom anchor")?,
            };

            let (content, min_size) = if saved.is_placeholder {
                (ItemContent::Placeholder, saved.min_size)
            } else {
                match resolve(&saved.region_id) {
                    Some((region, min_size)) => (ItemContent::Region(region), min_size),
                    None => {
                        tracing::warn!(
                            "Region '{}' of item {} is unknown, keeping a placeholder",
                            saved.region_id,
                            index
                        );
                        (ItemContent::Placeholder, saved.min_size)
                    }
                }
            };

            let mut item = Item::new(item_ids[index], content, group, min_size);
            item.size_hint = saved.size_hint;
            layout.items.insert(item.id, item);
        }

        for (index, saved) in record.anchors.iter().enumerate() {
            let side1 = saved
                .side1_items
                .iter()
                .map(|i| lookup(&item_ids, *i, "anchor side 1 item"))
                .collect::<Result<Vec<_>>>()?;
            let side2 = saved
                .side2_items
                .iter()
                .map(|i| lookup(&item_ids, *i, "anchor side 2 item"))
                .collect::<Result<Vec<_>>>()?;
            let from = lookup_optional(&anchor_ids, saved.index_from, "anchor from")?;
            let to = lookup_optional(&anchor_ids, saved.index_to, "anchor to")?;
            let followee = lookup_optional(&anchor_ids, saved.index_followee, "anchor followee")?;

            if let Some(anchor) = layout.anchors.get_mut(&anchor_ids[index]) {
                anchor.side1 = side1;
                anchor.side2 = side2;
                anchor.from = from;
                anchor.to = to;
                anchor.followee = followee;
            }
        }

        layout.events.clear();
        layout.update_size_constraints();
        layout.ensure_anchors_bounded(None);
        layout.events.clear();

        let issues = layout.sanity_issues();
        if !issues.is_empty() {
            tracing::warn!("Restored layout has {} sanity issues", issues.len());
            for issue in &issues {
                tracing::debug!("  {}", issue);
            }
        }

        Ok(layout)
    }
}
