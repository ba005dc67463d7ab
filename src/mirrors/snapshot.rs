//! Replicated state of a mirror.

use bevy_math::{Quat, Vec3};
use bevy_transform::prelude::*;
use serde::{Deserialize, Serialize};

use super::*;

/// The authored properties and pose of a [Mirror], as sent over the network or saved.
///
/// Missing fields decode to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "default_clip_offset")]
    pub clip_offset: f32,
    #[serde(default = "default_material")]
    pub material: String,
}

fn identity_rotation() -> [f32; 4] {
    Quat::IDENTITY.to_array()
}

fn default_clip_offset() -> f32 {
    DEFAULT_CLIP_OFFSET
}

fn default_material() -> String {
    DEFAULT_MIRROR_MATERIAL.to_owned()
}

impl MirrorSnapshot {
    pub fn capture(mirror: &Mirror, transform: &Transform) -> Self {
        Self {
            translation: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
            clip_offset: mirror.clip_offset,
            material: mirror.material.clone(),
        }
    }

    /// The normalized rotation, an error for a zero or non-finite quaternion.
    pub fn rotation(&self) -> Result<Quat> {
        let rotation = Quat::from_array(self.rotation);
        let length = rotation.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return Err(MirrorError::InvalidRotation(self.rotation));
        }
        Ok(rotation / length)
    }

    /// Writes the snapshot into the mirror, the scale of `transform` is kept.
    ///
    /// Nothing is written if the rotation is invalid.
    pub fn apply(&self, mirror: &mut Mirror, transform: &mut Transform) -> Result<()> {
        transform.rotation = self.rotation()?;
        transform.translation = Vec3::from_array(self.translation);
        mirror.clip_offset = self.clip_offset;
        mirror.material.clone_from(&self.material);
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a snapshot, rejecting invalid rotations.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(bytes)?;
        snapshot.rotation()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_pose_and_properties() {
        let mirror = Mirror {
            clip_offset: -2.5,
            material: "materials/bathroom.vmat".to_owned(),
        };
        let transform = Transform::from_xyz(1., 2., 3.).with_rotation(Quat::from_rotation_y(0.5));
        let bytes = MirrorSnapshot::capture(&mirror, &transform).encode().unwrap();

        let mut received = Mirror::default();
        let mut received_transform = Transform::default();
        MirrorSnapshot::decode(&bytes)
            .unwrap()
            .apply(&mut received, &mut received_transform)
            .unwrap();

        assert_eq!(received, mirror);
        assert!(received_transform.translation.abs_diff_eq(transform.translation, 1e-6));
        assert!(received_transform.rotation.abs_diff_eq(transform.rotation, 1e-6));
    }

    #[test]
    fn missing_properties_use_defaults() {
        let snapshot = MirrorSnapshot::decode(br#"{"translation":[0.0,1.0,0.0]}"#).unwrap();
        assert_eq!(snapshot.clip_offset, DEFAULT_CLIP_OFFSET);
        assert_eq!(snapshot.material, DEFAULT_MIRROR_MATERIAL);
        assert_eq!(snapshot.rotation, Quat::IDENTITY.to_array());
    }

    #[test]
    fn degenerate_rotation_is_rejected() {
        assert!(matches!(
            MirrorSnapshot::decode(br#"{"rotation":[0,0,0,0]}"#),
            Err(MirrorError::InvalidRotation(_))
        ));

        let snapshot = MirrorSnapshot {
            rotation: [f32::NAN, 0., 0., 1.],
            ..MirrorSnapshot::capture(&Mirror::default(), &Transform::default())
        };
        let mut mirror = Mirror {
            clip_offset: -3.0,
            ..Mirror::default()
        };
        let mut transform = Transform::from_xyz(1., 2., 3.);
        assert!(snapshot.apply(&mut mirror, &mut transform).is_err());
        assert_eq!(transform, Transform::from_xyz(1., 2., 3.));
        assert_eq!(mirror.clip_offset, -3.0);
    }

    #[test]
    fn unnormalized_rotation_is_normalized() {
        let snapshot = MirrorSnapshot::decode(br#"{"rotation":[0,0,0,2]}"#).unwrap();
        assert_eq!(snapshot.rotation().unwrap(), Quat::IDENTITY);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            MirrorSnapshot::decode(b"not json"),
            Err(MirrorError::Snapshot(_))
        ));
    }
}
