//! Collision detection, compaction and collision displacement.
//!
//! Compaction scans items in a fixed order (`(y, x)` for vertical, `(x, y)`
//! for horizontal) and floats each one towards the compaction edge, never
//! past an item that was already placed. Static items are placed first and
//! never move.

use crate::error::GridError;
use crate::model::{CompactType, GridConfig, GridItem, Layout, layout_bottom, position_of};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Whether two items overlap. Touching edges do not count, and an item never
/// collides with itself.
pub fn collides(a: &GridItem, b: &GridItem) -> bool {
    a.id != b.id && a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

/// First item of `layout` colliding with `item`.
pub fn first_collision<'a>(layout: &'a [GridItem], item: &GridItem) -> Option<&'a GridItem> {
    layout.iter().find(|other| collides(item, other))
}

/// Whether any two items of the layout collide.
pub fn has_overlaps(layout: &[GridItem]) -> bool {
    layout
        .iter()
        .enumerate()
        .any(|(i, a)| layout[i + 1..].iter().any(|b| collides(a, b)))
}

/// Indices of the layout in compaction scan order (stable).
pub fn scan_order(layout: &[GridItem], compact_type: Option<CompactType>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layout.len()).collect();
    match compact_type {
        Some(CompactType::Vertical) => order.sort_by(|&a, &b| row_col(&layout[a], &layout[b])),
        Some(CompactType::Horizontal) => order.sort_by(|&a, &b| col_row(&layout[a], &layout[b])),
        None => {}
    }
    order
}

fn row_col(a: &GridItem, b: &GridItem) -> Ordering {
    a.y.cmp(&b.y).then(a.x.cmp(&b.x))
}

fn col_row(a: &GridItem, b: &GridItem) -> Ordering {
    a.x.cmp(&b.x).then(a.y.cmp(&b.y))
}

/// Keep an item horizontally inside `[0, cols)`.
pub fn correct_bounds(item: &GridItem, cols: i32) -> GridItem {
    let mut item = item.clone();
    if item.is_static {
        return item;
    }
    item.w = item.w.min(cols);
    if item.x + item.w > cols {
        item.x = cols - item.w;
    }
    item.x = item.x.max(0);
    item.y = item.y.max(0);
    item
}

/// Compact a layout.
///
/// Items are first clamped into the columns. With `None` nothing else moves.
/// The output keeps the input order.
pub fn compact(layout: &[GridItem], compact_type: Option<CompactType>, cols: i32) -> Layout {
    let cols = cols.max(1);
    let mut out: Layout = layout.iter().map(|item| correct_bounds(item, cols)).collect();
    let Some(compact_type) = compact_type else {
        return out;
    };

    let mut placed: Vec<GridItem> = out.iter().filter(|item| item.is_static).cloned().collect();
    for index in scan_order(&out, Some(compact_type)) {
        if out[index].is_static {
            continue;
        }
        let item = compact_item(&placed, out[index].clone(), compact_type, cols);
        placed.push(item.clone());
        out[index] = item;
    }
    out
}

fn fits_at(placed: &[GridItem], item: &GridItem, x: i32, y: i32) -> bool {
    let shifted = GridItem { x, y, ..item.clone() };
    first_collision(placed, &shifted).is_none()
}

fn compact_item(placed: &[GridItem], mut item: GridItem, compact_type: CompactType, cols: i32) -> GridItem {
    match compact_type {
        CompactType::Vertical => {
            item.y = item.y.max(0).min(layout_bottom(placed));
            while item.y > 0 && fits_at(placed, &item, item.x, item.y - 1) {
                item.y -= 1;
            }
            while let Some(blocker) = first_collision(placed, &item) {
                item.y = blocker.bottom();
            }
        }
        CompactType::Horizontal => loop {
            while item.x > 0 && fits_at(placed, &item, item.x - 1, item.y) {
                item.x -= 1;
            }
            let Some(blocker) = first_collision(placed, &item) else {
                break;
            };
            item.x = blocker.right();
            if item.x + item.w > cols {
                item.x = (cols - item.w).max(0);
                item.y += 1;
            }
        },
    }
    item
}

/// Outcome of [`resolve_collisions`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved and re-compacted layout.
    pub layout: Layout,
    /// Non-fatal problems met while displacing items.
    pub warnings: Vec<GridError>,
}

/// Place `candidate` (an item of `layout`, identified by id) at its new
/// geometry and resolve the collisions it causes.
///
/// With `prevent_collision` the candidate walks from its previous geometry
/// towards the requested one and stops on the last free step; otherwise
/// colliding items are displaced (recursively) and the layout re-compacted.
/// The candidate itself is never displaced. Static items always block.
pub fn resolve_collisions(candidate: &GridItem, layout: &[GridItem], config: &GridConfig) -> Resolution {
    let cols = config.cols.max(1);
    let mut out = layout.to_vec();
    let index = match position_of(&out, &candidate.id) {
        Some(index) => index,
        None => {
            out.push(candidate.clone());
            out.len() - 1
        }
    };
    let previous = out[index].clone();
    let mut warnings = Vec::new();

    let hits_static = out
        .iter()
        .any(|other| other.is_static && collides(candidate, other));

    if config.prevent_collision || hits_static {
        out[index] = walk_until_blocked(&previous, candidate, &out);
    } else {
        out[index] = candidate.clone();
        let mut chain = HashSet::from([candidate.id.clone()]);
        displace_colliders(&mut out, index, config, cols, true, &mut chain, &mut warnings);
    }

    Resolution {
        layout: compact(&out, config.compact_type, cols),
        warnings,
    }
}

/// Step from `from` to `to` one cell at a time (all four coordinates
/// interpolated) and return the last step that collides with nothing.
fn walk_until_blocked(from: &GridItem, to: &GridItem, layout: &[GridItem]) -> GridItem {
    let steps = [to.x - from.x, to.y - from.y, to.w - from.w, to.h - from.h]
        .iter()
        .map(|d| d.abs())
        .max()
        .unwrap_or(0);

    let mut last_free = from.clone();
    for step in 1..=steps {
        let t = f64::from(step) / f64::from(steps);
        let lerp = |a: i32, b: i32| a + (f64::from(b - a) * t).round() as i32;
        let next = GridItem {
            x: lerp(from.x, to.x),
            y: lerp(from.y, to.y),
            w: lerp(from.w, to.w),
            h: lerp(from.h, to.h),
            ..to.clone()
        };
        if first_collision(layout, &next).is_some() {
            log::debug!("Item {} blocked at step {step}/{steps}", to.id);
            break;
        }
        last_free = next;
    }
    last_free
}

fn displace_colliders(
    layout: &mut Layout,
    mover: usize,
    config: &GridConfig,
    cols: i32,
    direct: bool,
    chain: &mut HashSet<String>,
    warnings: &mut Vec<GridError>,
) {
    let moving = layout[mover].clone();
    let mut colliders: Vec<usize> = (0..layout.len())
        .filter(|&i| i != mover && !layout[i].is_static && collides(&moving, &layout[i]))
        .collect();
    colliders.sort_by(|&a, &b| match config.compact_type {
        Some(CompactType::Horizontal) => col_row(&layout[a], &layout[b]),
        _ => row_col(&layout[a], &layout[b]),
    });

    for index in colliders {
        // An earlier push in this loop may already have cleared it.
        if !collides(&layout[mover], &layout[index]) {
            continue;
        }
        if chain.contains(&layout[index].id) {
            log::warn!("Displacement cycle at item {}", layout[index].id);
            warnings.push(GridError::DisplacementCycle(layout[index].id.clone()));
            continue;
        }

        if direct {
            if let Some(slot) = free_slot_before(layout, index, &moving, config) {
                log::debug!("Moving {} ahead of {}", layout[index].id, moving.id);
                layout[index] = slot;
                continue;
            }
        }

        let mut pushed = layout[index].clone();
        match config.compact_type {
            Some(CompactType::Horizontal) if moving.right() + pushed.w <= cols => {
                pushed.x = moving.right();
            }
            _ => pushed.y = moving.bottom(),
        }
        clear_statics(layout, &mut pushed, config, cols);
        log::debug!(
            "Displacing {} to ({}, {}) away from {}",
            pushed.id,
            pushed.x,
            pushed.y,
            moving.id
        );
        layout[index] = pushed;

        chain.insert(layout[index].id.clone());
        displace_colliders(layout, index, config, cols, false, chain, warnings);
        chain.remove(&layout[index].id);
    }
}

/// Move a displaced item past every static item it landed on.
fn clear_statics(layout: &[GridItem], item: &mut GridItem, config: &GridConfig, cols: i32) {
    while let Some(wall) = layout
        .iter()
        .find(|other| other.is_static && collides(item, other))
    {
        match config.compact_type {
            Some(CompactType::Horizontal) if wall.right() + item.w <= cols => item.x = wall.right(),
            _ => item.y = wall.bottom(),
        }
    }
}

/// For an item hit directly by the candidate, the slot just above (or left
/// of) the candidate, when it is free.
fn free_slot_before(layout: &[GridItem], index: usize, candidate: &GridItem, config: &GridConfig) -> Option<GridItem> {
    let item = &layout[index];
    let slot = match config.compact_type {
        Some(CompactType::Horizontal) => GridItem {
            x: candidate.x - item.w,
            ..item.clone()
        },
        _ => GridItem {
            y: candidate.y - item.h,
            ..item.clone()
        },
    };
    if slot.x < 0 || slot.y < 0 {
        return None;
    }
    first_collision(layout, &slot).is_none().then_some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, x: i32, y: i32, w: i32, h: i32) -> GridItem {
        GridItem::new(id, x, y, w, h)
    }

    fn pos(layout: &[GridItem], id: &str) -> (i32, i32) {
        let item = layout.iter().find(|i| i.id == id).unwrap();
        (item.x, item.y)
    }

    #[test]
    fn test_collides_open_intervals() {
        let a = item("a", 0, 0, 2, 2);
        assert!(collides(&a, &item("b", 1, 1, 2, 2)));
        assert!(!collides(&a, &item("b", 2, 0, 1, 1)));
        assert!(!collides(&a, &item("b", 0, 2, 1, 1)));
        assert!(!collides(&a, &item("a", 0, 0, 2, 2)));
    }

    #[test]
    fn test_vertical_compaction_floats_up() {
        let layout = vec![item("a", 0, 3, 2, 1), item("b", 0, 7, 2, 2), item("c", 2, 5, 1, 1)];
        let out = compact(&layout, Some(CompactType::Vertical), 4);
        assert_eq!(pos(&out, "a"), (0, 0));
        assert_eq!(pos(&out, "b"), (0, 1));
        assert_eq!(pos(&out, "c"), (2, 0));
        assert_eq!(out.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_vertical_compaction_never_jumps_obstacles() {
        let layout = vec![
            item("wall", 0, 0, 4, 1).with_static(true),
            item("a", 1, 4, 1, 1),
        ];
        let out = compact(&layout, Some(CompactType::Vertical), 4);
        assert_eq!(pos(&out, "wall"), (0, 0));
        assert_eq!(pos(&out, "a"), (1, 1));
    }

    #[test]
    fn test_vertical_compaction_resolves_overlap() {
        let layout = vec![item("a", 0, 0, 2, 2), item("b", 1, 1, 2, 2)];
        let out = compact(&layout, Some(CompactType::Vertical), 4);
        assert_eq!(pos(&out, "b"), (1, 2));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_horizontal_compaction_floats_left() {
        let layout = vec![item("a", 3, 0, 1, 1), item("b", 5, 0, 1, 1), item("c", 4, 1, 2, 1)];
        let out = compact(&layout, Some(CompactType::Horizontal), 6);
        assert_eq!(pos(&out, "a"), (0, 0));
        assert_eq!(pos(&out, "b"), (1, 0));
        assert_eq!(pos(&out, "c"), (0, 1));
    }

    #[test]
    fn test_horizontal_compaction_wraps_to_next_row() {
        let layout = vec![item("a", 0, 0, 3, 1), item("b", 1, 0, 2, 1)];
        let out = compact(&layout, Some(CompactType::Horizontal), 4);
        assert_eq!(pos(&out, "a"), (0, 0));
        assert_eq!(pos(&out, "b"), (0, 1));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_no_compaction_only_clamps() {
        let layout = vec![item("a", 5, 9, 2, 1), item("b", 0, 3, 8, 1)];
        let out = compact(&layout, None, 6);
        assert_eq!(pos(&out, "a"), (4, 9));
        assert_eq!(out[1].w, 6);
        assert_eq!(pos(&out, "b"), (0, 3));
    }

    #[test]
    fn test_compact_is_idempotent_example() {
        let layout = vec![
            item("a", 2, 5, 2, 3),
            item("b", 0, 1, 3, 1),
            item("c", 1, 0, 1, 4),
            item("d", 3, 2, 1, 1),
        ];
        for kind in [Some(CompactType::Vertical), Some(CompactType::Horizontal), None] {
            let once = compact(&layout, kind, 4);
            assert_eq!(compact(&once, kind, 4), once);
        }
    }

    #[test]
    fn test_resolve_pushes_collider_down() {
        let config = GridConfig::new(4);
        let layout = vec![item("1", 0, 0, 2, 2), item("2", 2, 0, 2, 2)];
        let candidate = item("1", 2, 0, 2, 2);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "1"), (2, 0));
        assert_eq!(pos(&out, "2"), (2, 2));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_resolve_cascades() {
        let config = GridConfig::new(2).with_compact_type(None);
        let layout = vec![item("a", 0, 3, 2, 1), item("b", 0, 0, 2, 2), item("c", 0, 2, 2, 1)];
        let candidate = item("a", 0, 1, 2, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "a"), (0, 1));
        assert_eq!(pos(&out, "b"), (0, 2));
        assert_eq!(pos(&out, "c"), (0, 4));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_resolve_moves_collider_above_when_free() {
        let config = GridConfig::new(2).with_compact_type(None);
        let layout = vec![item("a", 0, 5, 2, 1), item("b", 0, 3, 2, 1)];
        let candidate = item("a", 0, 3, 2, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "b"), (0, 2));
        assert_eq!(pos(&out, "a"), (0, 3));
    }

    #[test]
    fn test_resolve_prevent_collision_stops_before_obstacle() {
        let config = GridConfig::new(6).with_compact_type(None).with_prevent_collision(true);
        let layout = vec![item("a", 0, 0, 1, 1), item("b", 3, 0, 1, 1)];
        let candidate = item("a", 5, 0, 1, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "a"), (2, 0));
        assert_eq!(pos(&out, "b"), (3, 0));
    }

    #[test]
    fn test_resolve_static_blocks() {
        let config = GridConfig::new(4).with_compact_type(None);
        let layout = vec![item("a", 0, 0, 1, 1), item("s", 1, 0, 1, 1).with_static(true)];
        let candidate = item("a", 1, 0, 1, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "a"), (0, 0));
        assert_eq!(pos(&out, "s"), (1, 0));
    }

    #[test]
    fn test_resolve_horizontal_push() {
        let config = GridConfig::new(6).with_compact_type(Some(CompactType::Horizontal));
        let layout = vec![item("a", 4, 0, 1, 1), item("b", 0, 0, 2, 1)];
        let candidate = item("a", 0, 0, 1, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "a"), (0, 0));
        assert_eq!(pos(&out, "b"), (1, 0));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_push_steps_over_static_without_compaction() {
        let config = GridConfig::new(2).with_compact_type(None);
        let layout = vec![
            item("c", 0, 0, 1, 1),
            item("a", 1, 0, 1, 1),
            item("b", 0, 1, 1, 1),
            item("s", 0, 2, 1, 1).with_static(true),
        ];
        let candidate = item("a", 0, 1, 1, 1);
        let out = resolve_collisions(&candidate, &layout, &config).layout;
        assert_eq!(pos(&out, "a"), (0, 1));
        assert_eq!(pos(&out, "b"), (0, 3));
        assert_eq!(pos(&out, "s"), (0, 2));
        assert!(!has_overlaps(&out));
    }

    #[test]
    fn test_horizontal_push_steps_right_of_static() {
        let config = GridConfig::new(4).with_compact_type(Some(CompactType::Horizontal));
        let mut pushed = item("b", 1, 0, 1, 1);
        let layout = vec![item("s", 1, 0, 1, 1).with_static(true)];
        clear_statics(&layout, &mut pushed, &config, 4);
        assert_eq!((pushed.x, pushed.y), (2, 0));

        let mut wide = item("w", 1, 0, 3, 1);
        clear_statics(&layout, &mut wide, &config, 4);
        assert_eq!((wide.x, wide.y), (1, 1));
    }

    #[test]
    fn test_displacement_cycle_is_reported() {
        // The push chain r -> a -> b wraps b down onto r.
        let config = GridConfig::new(3).with_compact_type(Some(CompactType::Horizontal));
        let layout = vec![item("r", 0, 5, 1, 3), item("a", 0, 0, 2, 1), item("b", 0, 0, 2, 1)];
        let candidate = item("r", 0, 0, 1, 3);
        let resolution = resolve_collisions(&candidate, &layout, &config);
        assert!(resolution.warnings.contains(&GridError::DisplacementCycle("r".into())));
        assert_eq!(pos(&resolution.layout, "r"), (0, 0));
        assert!(!has_overlaps(&resolution.layout));
    }
}
