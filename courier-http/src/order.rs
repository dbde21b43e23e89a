//! Priority ordering shared by interceptors, call adapters and converters.

/// Runs before everything else.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Runs after everything else; the default priority.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Stable sort by priority: lower first, ties keep declaration order.
pub(crate) fn sort_by_order<T: ?Sized>(items: &mut [std::sync::Arc<T>], order: impl Fn(&T) -> i32) {
    items.sort_by_key(|item| order(item.as_ref()));
}
