//! Fixed-capacity contact manifold
//!
//! Accumulates up to four contact points for a single collider pair and
//! offers the aggregate views a solver or gameplay code typically wants.
//! This subsystem only detects contacts; turning a manifold into impulses
//! belongs to an external solver.

use crate::foundation::math::Vec3;
use crate::geometry::narrow_phase::Contact;

/// Maximum number of contact points retained per pair
pub const MAX_CONTACTS: usize = 4;

/// A single point in a contact manifold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// World-space contact point
    pub point: Vec3,
    /// Unit contact normal
    pub normal: Vec3,
    /// Penetration depth at this point (>= 0)
    pub penetration: f32,
}

impl From<Contact> for ContactPoint {
    fn from(contact: Contact) -> Self {
        Self {
            point: contact.point,
            normal: contact.normal,
            penetration: contact.penetration,
        }
    }
}

/// Up to four contacts accumulated for one collider pair
///
/// Appends past capacity are silently dropped: the first four contacts win,
/// there is no importance ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactManifold {
    points: [Option<ContactPoint>; MAX_CONTACTS],
    count: usize,
}

impl ContactManifold {
    /// Create an empty manifold
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a contact while capacity remains; excess contacts are dropped
    pub fn add_contact(&mut self, contact: ContactPoint) {
        if self.count < MAX_CONTACTS {
            self.points[self.count] = Some(contact);
            self.count += 1;
        }
    }

    /// Number of stored contacts (never exceeds [`MAX_CONTACTS`])
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check whether the manifold holds no contacts
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop all stored contacts
    pub fn clear(&mut self) {
        self.points = [None; MAX_CONTACTS];
        self.count = 0;
    }

    /// Iterate the stored contacts in insertion order
    pub fn contacts(&self) -> impl Iterator<Item = &ContactPoint> {
        self.points[..self.count].iter().flatten()
    }

    /// Average of all contact points, or `None` when empty
    pub fn average_point(&self) -> Option<Vec3> {
        if self.count == 0 {
            return None;
        }
        let sum: Vec3 = self.contacts().map(|c| c.point).sum();
        Some(sum / self.count as f32)
    }

    /// Average penetration depth, or `None` when empty
    pub fn average_penetration(&self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        let sum: f32 = self.contacts().map(|c| c.penetration).sum();
        Some(sum / self.count as f32)
    }

    /// The contact with maximum penetration; ties resolve to the earliest
    /// inserted point
    pub fn deepest_contact(&self) -> Option<&ContactPoint> {
        let mut deepest: Option<&ContactPoint> = None;
        for contact in self.contacts() {
            match deepest {
                Some(current) if contact.penetration <= current.penetration => {}
                _ => deepest = Some(contact),
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contact(y: f32, penetration: f32) -> ContactPoint {
        ContactPoint {
            point: Vec3::new(0.0, y, 0.0),
            normal: Vec3::y(),
            penetration,
        }
    }

    #[test]
    fn test_capacity_first_four_win() {
        let mut manifold = ContactManifold::new();
        for i in 0..6 {
            manifold.add_contact(contact(i as f32, 0.1));
        }
        assert_eq!(manifold.len(), MAX_CONTACTS);
        // The dropped contacts are the fifth and sixth
        let ys: Vec<f32> = manifold.contacts().map(|c| c.point.y).collect();
        assert_eq!(ys, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_average_point_and_penetration() {
        let mut manifold = ContactManifold::new();
        manifold.add_contact(contact(0.0, 0.2));
        manifold.add_contact(contact(2.0, 0.4));
        assert_eq!(manifold.average_point(), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_relative_eq!(manifold.average_penetration().unwrap(), 0.3);
    }

    #[test]
    fn test_empty_aggregates_are_none() {
        let manifold = ContactManifold::new();
        assert!(manifold.is_empty());
        assert!(manifold.average_point().is_none());
        assert!(manifold.average_penetration().is_none());
        assert!(manifold.deepest_contact().is_none());
    }

    #[test]
    fn test_deepest_contact_tie_keeps_first() {
        let mut manifold = ContactManifold::new();
        manifold.add_contact(contact(1.0, 0.5));
        manifold.add_contact(contact(2.0, 0.5)); // Same depth, inserted later
        manifold.add_contact(contact(3.0, 0.1));
        let deepest = manifold.deepest_contact().unwrap();
        assert_eq!(deepest.point.y, 1.0);
    }

    #[test]
    fn test_clear() {
        let mut manifold = ContactManifold::new();
        manifold.add_contact(contact(0.0, 0.1));
        manifold.clear();
        assert!(manifold.is_empty());
        assert_eq!(manifold.contacts().count(), 0);
    }
}
