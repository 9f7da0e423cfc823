//! Joint collaborator consumed by bodies

use crate::engine::EngineBodies;
use crate::space::Space;
use std::sync::Arc;

/// A joint attached to one or more bodies.
///
/// The joint owns its engine constraint. Bodies only tell it when that
/// constraint has to be rebuilt or torn down. Both hooks run while the
/// body storage is already locked, so implementations must go through
/// `bodies` instead of the space's guards.
pub trait Joint: Send + Sync {
    /// Recreate the engine constraint after a body joined a space
    fn rebuild(&self, space: &Arc<Space>, bodies: &mut EngineBodies);

    /// Destroy the engine constraint before a body leaves its space
    fn destroy(&self);
}
