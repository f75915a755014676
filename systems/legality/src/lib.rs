#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure move legality rules for the Pipe Loop walker.
//!
//! A move is legal when it does not reverse the walker, stays inside the
//! grid, and lands either on an empty cell or on the origin. The functions in
//! this crate never mutate anything, so repeated calls with the same view and
//! walker always agree.

use pipe_loop_core::{CellCoord, Direction, GridView, MoveRejection, WalkerSnapshot};

/// Validates a candidate move, returning the destination cell when it is legal.
pub fn check(
    view: GridView<'_>,
    walker: WalkerSnapshot,
    action: Direction,
) -> Result<CellCoord, MoveRejection> {
    if action == walker.direction.opposite() {
        return Err(MoveRejection::Reversal);
    }

    let (columns, rows) = view.dimensions();
    let destination = walker
        .cell
        .step(action, columns, rows)
        .ok_or(MoveRejection::OutOfBounds)?;

    // The origin is only ever re-entered to close the loop.
    if destination.is_origin() {
        return Ok(destination);
    }

    match view.tile(destination) {
        Ok(tile) if tile.is_empty() => Ok(destination),
        Ok(_) => Err(MoveRejection::Occupied),
        Err(_) => Err(MoveRejection::OutOfBounds),
    }
}

/// Reports whether `action` is a legal move for the walker.
#[must_use]
pub fn is_legal(view: GridView<'_>, walker: WalkerSnapshot, action: Direction) -> bool {
    check(view, walker, action).is_ok()
}

/// Collects every legal move in [`Direction::ALL`] order.
///
/// The reverse of the walker's direction is never a candidate, so at most
/// three directions are returned.
#[must_use]
pub fn legal_actions(view: GridView<'_>, walker: WalkerSnapshot) -> Vec<Direction> {
    walker
        .direction
        .candidates()
        .filter(|action| is_legal(view, walker, *action))
        .collect()
}
