use crate::config::GatePolicy;
use crate::frames::store::FrameStore;

/// Whether the frame at `position` may activate now.
///
/// The entry frame always may. Any other frame depends only on its immediate predecessor, and a
/// predecessor skipped for lack of an element binding never holds it back.
pub fn can_activate(store: &FrameStore, policy: GatePolicy, position: usize) -> bool {
    if position == 0 {
        return true;
    }
    let Some(prev) = store.get(position - 1) else {
        return false;
    };
    if prev.is_skipped() {
        return position < store.len();
    }
    match policy {
        GatePolicy::InactiveOrComplete => !prev.is_active() || prev.is_animation_complete(),
        GatePolicy::CompleteOnly => prev.is_active() && prev.is_animation_complete(),
    }
}
