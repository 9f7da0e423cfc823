//! Snapshot and rollback of a space's dynamic body state
//!
//! Every [`StateRecorder::save_state`] appends one bincode frame to the
//! buffer; [`StateRecorder::restore_state`] consumes frames in the same
//! order.

use crate::error::{BodyError, Result};
use crate::id::BodyId;
use crate::space::Space;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RecordedBody {
    id: BodyId,
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    active: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Frame {
    bodies: Vec<RecordedBody>,
}

/// Records and restores body state of a space
#[derive(Debug, Default)]
pub struct StateRecorder {
    data: Vec<u8>,
    read_position: usize,
    failed: bool,
    validating: bool,
}

impl StateRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder reading from previously saved bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// In validating mode, restoring compares against the live state
    /// instead of overwriting it
    pub fn set_validating(&mut self, validating: bool) {
        self.validating = validating;
    }

    /// Whether restoring only validates
    pub fn is_validating(&self) -> bool {
        self.validating
    }

    /// Recorded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether every frame has been consumed
    pub fn is_eof(&self) -> bool {
        self.read_position >= self.data.len()
    }

    /// Whether reading a frame failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Read from the first frame again
    pub fn rewind(&mut self) {
        self.read_position = 0;
        self.failed = false;
    }

    /// Drop every frame
    pub fn clear(&mut self) {
        self.data.clear();
        self.rewind();
    }

    /// Append the state of every body in `space`
    pub fn save_state(&mut self, space: &Space) -> Result<()> {
        let frame = {
            let bodies = space.read_bodies();
            Frame {
                bodies: bodies
                    .iter()
                    .map(|(id, body)| RecordedBody {
                        id,
                        position: body.position(),
                        rotation: body.rotation(),
                        linear_velocity: body.linear_velocity(),
                        angular_velocity: body.angular_velocity(),
                        active: body.is_active(),
                    })
                    .collect(),
            }
        };

        bincode::serialize_into(&mut self.data, &frame).map_err(|err| BodyError::Serialization(err.to_string()))
    }

    /// Restore the next recorded frame into `space`.
    ///
    /// Returns `false` when there is nothing left to read, reading failed,
    /// a recorded body no longer exists, or (when validating) the live
    /// state differs from the recording.
    pub fn restore_state(&mut self, space: &Space) -> bool {
        if self.is_eof() || self.failed {
            return false;
        }

        let mut cursor = Cursor::new(&self.data[self.read_position..]);
        let frame: Frame = match bincode::deserialize_from(&mut cursor) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Failed to read recorded state: {}", err);
                self.failed = true;
                return false;
            }
        };
        self.read_position += cursor.position() as usize;

        let mut bodies = space.write_bodies();
        let mut matches = true;

        for recorded in &frame.bodies {
            let Some(body) = bodies.get_mut(recorded.id) else {
                log::warn!("Recorded body {:?} no longer exists", recorded.id);
                matches = false;
                continue;
            };

            if self.validating {
                let live = RecordedBody {
                    id: recorded.id,
                    position: body.position(),
                    rotation: body.rotation(),
                    linear_velocity: body.linear_velocity(),
                    angular_velocity: body.angular_velocity(),
                    active: body.is_active(),
                };

                if live != *recorded {
                    log::debug!("State of {:?} differs from the recording", recorded.id);
                    matches = false;
                }
                continue;
            }

            if recorded.active {
                body.activate();
            } else {
                body.deactivate();
            }

            body.set_position_and_rotation(recorded.position, recorded.rotation);
            body.set_linear_velocity(recorded.linear_velocity);
            body.set_angular_velocity(recorded.angular_velocity);
        }

        matches
    }
}
