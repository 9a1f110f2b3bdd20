//! Linear algebra types for the local tangent-plane frame
//!
//! Two frames are in play:
//! - ENU: East-North-Up meters relative to the origin fix
//! - AR world: gravity-and-heading aligned render frame, x = east,
//!   y = up, z = south (right-handed, camera looks down -z)

use nalgebra::{Matrix4, Vector3};

// ===== Frame vectors =====
pub type EnuVec = Vector3<f64>;
pub type WorldVec = Vector3<f64>;

// ===== Rigid transform placed on a rendered object =====
pub type WorldTransform = Matrix4<f64>;

/// ENU (e, n, u) -> AR world (e, u, -n)
pub fn enu_to_world(enu: &EnuVec) -> WorldVec {
    WorldVec::new(enu.x, enu.z, -enu.y)
}

/// AR world (x, y, z) -> ENU (x, -z, y)
pub fn world_to_enu(world: &WorldVec) -> EnuVec {
    EnuVec::new(world.x, -world.z, world.y)
}

/// Translation column of a homogeneous transform
pub fn position_from_transform(transform: &WorldTransform) -> WorldVec {
    WorldVec::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)])
}
