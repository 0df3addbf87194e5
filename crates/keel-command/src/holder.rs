//! Deferred binding between commands of one transaction.

use std::{cell::RefCell, fmt, rc::Rc};

/// A write-once cell shared by the commands of a macro.
///
/// A producing command writes the value during execution; commands later in
/// the same macro read it. Until then [`has_value`](Self::has_value) is false
/// and validators should defer their judgment to execution time.
///
/// Clones share the same cell.
///
/// # Examples
///
/// ```
/// use keel_command::ElementHolder;
///
/// let produced: ElementHolder<u32> = ElementHolder::new();
/// let consumer = produced.clone();
///
/// assert!(!consumer.has_value());
/// produced.set(7);
/// assert_eq!(consumer.value(), 7);
/// ```
pub struct ElementHolder<T> {
    cell: Rc<RefCell<Option<T>>>,
}

impl<T> ElementHolder<T> {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self {
            cell: Rc::new(RefCell::new(None)),
        }
    }

    /// Creates a holder that is already populated.
    pub fn with_value(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Some(value))),
        }
    }

    pub fn has_value(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Stores the produced value.
    ///
    /// Producers write once; redo writes the same value again.
    pub fn set(&self, value: T)
    where
        T: PartialEq + fmt::Debug,
    {
        let mut slot = self.cell.borrow_mut();
        debug_assert!(
            slot.as_ref().is_none_or(|current| *current == value),
            "element holder rebound from {:?} to {value:?}",
            slot.as_ref()
        );
        *slot = Some(value);
    }

    /// Returns `true` if both holders share the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Clone> ElementHolder<T> {
    /// Returns the value if it has been produced.
    pub fn get(&self) -> Option<T> {
        self.cell.borrow().clone()
    }

    /// Returns the produced value.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been produced yet. Commands only call this after
    /// their mandatory arguments were checked.
    pub fn value(&self) -> T {
        self.get()
            .unwrap_or_else(|| panic!("element holder read before its value was produced"))
    }
}

impl<T> Clone for ElementHolder<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> Default for ElementHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ElementHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.cell.borrow() {
            Some(value) => f.debug_tuple("ElementHolder").field(value).finish(),
            None => f.write_str("ElementHolder(<unset>)"),
        }
    }
}

impl<T> From<T> for ElementHolder<T> {
    fn from(value: T) -> Self {
        Self::with_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_cell() {
        let holder = ElementHolder::new();
        let shared = holder.clone();

        holder.set(3_u32);

        assert!(shared.has_value());
        assert_eq!(shared.get(), Some(3));
        assert!(holder.ptr_eq(&shared));
    }

    #[test]
    fn test_from_value_is_populated() {
        let holder = ElementHolder::from("Person");

        assert!(holder.has_value());
        assert_eq!(holder.value(), "Person");
    }

    #[test]
    fn test_setting_same_value_again_is_allowed() {
        let holder = ElementHolder::new();

        holder.set(1_u32);
        holder.set(1_u32);

        assert_eq!(holder.value(), 1);
    }

    #[test]
    #[should_panic(expected = "read before its value was produced")]
    fn test_value_panics_when_unset() {
        let holder: ElementHolder<u32> = ElementHolder::new();
        holder.value();
    }

    #[test]
    fn test_debug_shows_unset() {
        let holder: ElementHolder<u32> = ElementHolder::new();

        assert_eq!(format!("{holder:?}"), "ElementHolder(<unset>)");
    }
}
