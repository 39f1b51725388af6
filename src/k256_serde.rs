//! Strict (de)serialization for secp256k1 scalars and points.
//!
//! Scalars travel as 32 big-endian bytes and must be canonical: an encoding
//! at or above the curve order is rejected rather than reduced. Points
//! travel SEC1-compressed (33 bytes) and must decode to a point on the
//! curve other than the identity.

use k256::elliptic_curve::{
    consts::U33, generic_array::GenericArray, group::GroupEncoding, sec1::FromEncodedPoint,
    PrimeField,
};
use serde::{de, de::Error, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::{
    api::{MtaError, MtaResult},
    octets::FS_POINT,
};

#[derive(Clone, Debug, PartialEq, Zeroize)]
pub struct Scalar(k256::Scalar);

impl Scalar {
    /// 32-byte big-endian encoding
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }
}

impl AsRef<k256::Scalar> for Scalar {
    fn as_ref(&self) -> &k256::Scalar {
        &self.0
    }
}

impl From<k256::Scalar> for Scalar {
    fn from(s: k256::Scalar) -> Self {
        Scalar(s)
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;

        // from_repr fails on any integer at or above the curve order,
        // so exactly one encoding per scalar survives
        let scalar: Option<k256::Scalar> = k256::Scalar::from_repr(bytes.into()).into();

        scalar
            .map(Scalar)
            .ok_or_else(|| D::Error::custom("scalar bytes not canonical mod the curve order"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectivePoint(k256::ProjectivePoint);

impl ProjectivePoint {
    /// Returns a SEC1-encoded compressed curve point.
    pub fn to_bytes(&self) -> [u8; 33] {
        point_to_bytes(&self.0)
    }

    /// Decode from a SEC1-encoded compressed curve point.
    /// Rejects off-curve encodings and the point at infinity.
    pub fn from_bytes(bytes: &[u8]) -> MtaResult<Self> {
        point_from_bytes(bytes).map(Self)
    }
}

impl AsRef<k256::ProjectivePoint> for ProjectivePoint {
    fn as_ref(&self) -> &k256::ProjectivePoint {
        &self.0
    }
}

impl From<k256::ProjectivePoint> for ProjectivePoint {
    fn from(p: k256::ProjectivePoint) -> Self {
        ProjectivePoint(p)
    }
}

impl From<&k256::ProjectivePoint> for ProjectivePoint {
    fn from(p: &k256::ProjectivePoint) -> Self {
        ProjectivePoint(*p)
    }
}

impl Serialize for ProjectivePoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for ProjectivePoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_bytes(PointVisitor)
    }
}

struct PointVisitor;

impl<'de> Visitor<'de> for PointVisitor {
    type Value = ProjectivePoint;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a SEC1 compressed secp256k1 point")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        point_from_bytes(v)
            .map(ProjectivePoint)
            .map_err(|_| E::custom("bytes do not encode a usable secp256k1 point"))
    }
}

/// SEC1 compressed encoding of `p`
pub fn point_to_bytes(p: &k256::ProjectivePoint) -> [u8; 33] {
    let encoded: GenericArray<u8, U33> = p.to_affine().to_bytes();

    let mut bytes = [0u8; 33];
    bytes.copy_from_slice(&encoded);
    bytes
}

/// Strict ingest of a SEC1 compressed point: exactly `FS_POINT` bytes, on
/// the curve, not the identity.
pub fn point_from_bytes(bytes: &[u8]) -> MtaResult<k256::ProjectivePoint> {
    if bytes.len() != FS_POINT {
        return Err(MtaError::InvalidEcp);
    }
    let encoded = k256::EncodedPoint::from_bytes(bytes).map_err(|_| MtaError::InvalidEcp)?;
    let point: Option<k256::ProjectivePoint> =
        k256::ProjectivePoint::from_encoded_point(&encoded).into();
    let point = point.ok_or(MtaError::InvalidEcp)?;
    if point == k256::ProjectivePoint::IDENTITY {
        return Err(MtaError::InvalidEcp);
    }
    Ok(point)
}
