use crate::config::Rect;

pub const PLAYER_HITBOX: f32 = 40.0;
pub const PLAYER_FOOT_OFFSET: f32 = 10.0;
pub const PROJECTILE_SIZE: f32 = 8.0;
pub const MOVE_BOX: f32 = 20.0;

/// Strict axis-aligned overlap of the box against any wall. Touching edges do
/// not count.
pub fn box_overlap(x: f32, y: f32, width: f32, height: f32, walls: &[Rect]) -> bool {
    walls.iter().any(|wall| {
        x < wall.x + wall.width
            && x + width > wall.x
            && y < wall.y + wall.height
            && y + height > wall.y
    })
}

/// True when the box lies fully inside the border. Boundary positions are valid.
pub fn within_border(x: f32, y: f32, width: f32, height: f32, border: &Rect) -> bool {
    x >= border.x
        && x <= border.x + border.width - width
        && y >= border.y
        && y <= border.y + border.height - height
}

/// Per-axis proximity used by every pickup: both axis distances must be under
/// the threshold.
pub fn within_reach(ax: f32, ay: f32, bx: f32, by: f32, threshold: f32) -> bool {
    (ax - bx).abs() < threshold && (ay - by).abs() < threshold
}

/// Projectile box against the player's hitbox, with the bottom of the player
/// box raised so shots at the feet miss.
pub fn projectile_hits_player(px: f32, py: f32, player_x: f32, player_y: f32) -> bool {
    let half = PLAYER_HITBOX / 2.0;
    let player_left = player_x - half;
    let player_right = player_x + half;
    let player_top = player_y - half;
    let player_bottom = player_y + half - PLAYER_FOOT_OFFSET;

    let proj_half = PROJECTILE_SIZE / 2.0;
    let proj_left = px - proj_half;
    let proj_right = px + proj_half;
    let proj_top = py - proj_half;
    let proj_bottom = py + proj_half;

    !(player_left > proj_right
        || player_right < proj_left
        || player_top > proj_bottom
        || player_bottom < proj_top)
}

/// The centred movement box a player occupies when checked against walls.
pub fn movement_box_hits_wall(x: f32, y: f32, walls: &[Rect]) -> bool {
    let half = MOVE_BOX / 2.0;
    box_overlap(x - half, y - half, MOVE_BOX, MOVE_BOX, walls)
}

pub fn projectile_hits_wall(x: f32, y: f32, walls: &[Rect]) -> bool {
    let half = PROJECTILE_SIZE / 2.0;
    box_overlap(x - half, y - half, PROJECTILE_SIZE, PROJECTILE_SIZE, walls)
}
