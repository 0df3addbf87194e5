//! Confirmation of dependent elements before a deletion is assembled.

use keel_command::DependencyMap;

/// Decides whether a deletion goes ahead once its dependents are known.
///
/// The implementation may flip the include flag of individual dependents.
/// Returning `false` cancels the operation before anything is mutated.
pub trait Confirm {
    fn confirm(&mut self, dependencies: &mut DependencyMap) -> bool;
}

/// Accepts every dependency map as resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl Confirm for AcceptDefaults {
    fn confirm(&mut self, _dependencies: &mut DependencyMap) -> bool {
        true
    }
}

impl<F> Confirm for F
where
    F: FnMut(&mut DependencyMap) -> bool,
{
    fn confirm(&mut self, dependencies: &mut DependencyMap) -> bool {
        self(dependencies)
    }
}
