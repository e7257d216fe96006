use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use clearway_core::{TileRecord, TILE_SIDE};
use thiserror::Error;

use crate::SaveFile;

const LAYOUT_DOMAIN: &str = "clearway";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the grid side and encoded tiles.
pub const LAYOUT_HEADER: &str = "clearway:v1";
/// Delimiter used to separate the prefix, grid side and payload.
const FIELD_DELIMITER: char = ':';

/// Single-line layout encoding suitable for clipboard transfer.
///
/// The text reads `clearway:v1:<side>:<payload>` where the payload is the
/// unpadded base64 of the bincode-encoded tile list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutString(String);

impl LayoutString {
    /// Encodes the layout into its transfer string.
    pub fn encode(save: &SaveFile) -> Result<Self, LayoutTransferError> {
        let bytes = bincode::serialize(&save.tiles).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(bytes);
        Ok(Self(format!("{LAYOUT_HEADER}:{}:{encoded}", save.side)))
    }

    /// Decodes a layout from the provided transfer string.
    pub fn decode(value: &str) -> Result<SaveFile, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let side = parts.next().ok_or(LayoutTransferError::MissingSide)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let side = parse_side(side)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let tiles: Vec<TileRecord> =
            bincode::deserialize(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        if let Some(tile) = tiles.iter().find(|tile| !tile.fits(side)) {
            return Err(LayoutTransferError::TileOutOfBounds {
                tile_x: tile.tile_x,
                tile_y: tile.tile_y,
            });
        }

        Ok(SaveFile { side, tiles })
    }
}

impl std::fmt::Display for LayoutString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur while encoding or decoding layout transfer strings.
#[derive(Debug, Error)]
pub enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The grid side segment was missing.
    #[error("layout string is missing the grid side")]
    MissingSide,
    /// The payload segment was missing.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The prefix segment named another format.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment named an unknown revision.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid side was not a positive multiple of the tile side.
    #[error("could not use grid side '{0}'")]
    InvalidSide(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The tile list could not be (de)serialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] bincode::Error),
    /// A tile lies outside the grid named by the string.
    #[error("tile ({tile_x}, {tile_y}) lies outside the layout grid")]
    TileOutOfBounds {
        /// Tile column of the offending record.
        tile_x: u32,
        /// Tile row of the offending record.
        tile_y: u32,
    },
}

fn parse_side(side: &str) -> Result<u32, LayoutTransferError> {
    let parsed = side
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidSide(side.to_owned()))?;

    if parsed == 0 || parsed % TILE_SIDE != 0 {
        return Err(LayoutTransferError::InvalidSide(side.to_owned()));
    }

    Ok(parsed)
}
