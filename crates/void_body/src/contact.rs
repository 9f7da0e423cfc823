//! Bounded per-step contact recording

use crate::id::ObjectId;
use glam::Vec3;

/// A contact reported for a body during the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Penetration depth
    pub depth: f32,
    /// Index of the body's own shape
    pub shape_index: i32,
    /// Index of the other body's shape
    pub collider_shape_index: i32,
    /// The other body
    pub collider_id: ObjectId,
    /// Contact normal in world space
    pub normal: Vec3,
    /// Contact point on this body in world space
    pub position: Vec3,
    /// Contact point on the other body in world space
    pub collider_position: Vec3,
    /// Velocity of the other body at the contact point
    pub collider_velocity: Vec3,
    /// Impulse applied at this contact
    pub impulse: Vec3,
}

impl Contact {
    /// Contact with the given depth against `collider_id`, all vectors zero
    pub fn new(collider_id: ObjectId, depth: f32) -> Self {
        Self {
            depth,
            shape_index: 0,
            collider_shape_index: 0,
            collider_id,
            normal: Vec3::ZERO,
            position: Vec3::ZERO,
            collider_position: Vec3::ZERO,
            collider_velocity: Vec3::ZERO,
            impulse: Vec3::ZERO,
        }
    }
}

/// Storage reserved up front; larger buffers grow on demand
const PREALLOCATED_CONTACTS: usize = 16;

/// Holds the deepest contacts seen since the last reset.
///
/// Once full, a new contact replaces the shallowest stored one, and only if
/// it is strictly deeper.
#[derive(Debug, Clone, Default)]
pub struct ContactBuffer {
    contacts: Vec<Contact>,
    max_contacts: usize,
}

impl ContactBuffer {
    /// Create a buffer holding at most `max_contacts`
    pub fn new(max_contacts: usize) -> Self {
        Self {
            contacts: Vec::with_capacity(max_contacts.min(PREALLOCATED_CONTACTS)),
            max_contacts,
        }
    }

    /// Configured capacity
    pub fn max_contacts(&self) -> usize {
        self.max_contacts
    }

    /// Change the capacity, dropping the excess contacts
    pub fn set_max_contacts(&mut self, max_contacts: usize) {
        self.max_contacts = max_contacts;
        self.contacts.truncate(max_contacts);
    }

    /// Record a contact. Returns whether it was stored.
    pub fn add(&mut self, contact: Contact) -> bool {
        if self.max_contacts == 0 {
            return false;
        }

        if self.contacts.len() < self.max_contacts {
            self.contacts.push(contact);
            return true;
        }

        let shallowest = self
            .contacts
            .iter_mut()
            .reduce(|lhs, rhs| if rhs.depth < lhs.depth { rhs } else { lhs });

        match shallowest {
            Some(slot) if slot.depth < contact.depth => {
                *slot = contact;
                true
            }
            _ => false,
        }
    }

    /// Forget every stored contact
    pub fn reset(&mut self) {
        self.contacts.clear();
    }

    /// Number of stored contacts
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether no contact is stored
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Stored contacts in insertion order (modulo replacements)
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contact at `index`
    pub fn get(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }
}
